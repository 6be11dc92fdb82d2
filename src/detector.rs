use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::DynamicImage;
use image::imageops::{self, FilterType};
use log::{debug, trace};
use rustface::{ImageData, Model};

use crate::error::{ClassifierError, FormatError};
use crate::grid::PixelGrid;
use crate::grouping::{GROUP_EPS, group_rectangles};

/// Smallest window edge the SeetaFace engine accepts.
pub const ENGINE_MIN_FACE_SIZE: u32 = 20;

/// Edge of the window the engine classifies at scale 1.0.
const ENGINE_WINDOW: u32 = 40;

/// Smallest pyramid step the engine accepts; the next level falls below the
/// engine's minimum scale, leaving only the native one.
const SINGLE_LEVEL_PYRAMID: f32 = 0.01;

const SLIDE_WINDOW_STEP: u32 = 4;

/// An axis-aligned face rectangle in pixel coordinates.
///
/// `(x, y)` is the top-left corner. The rectangle may extend past the image
/// it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedFace {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DetectedFace {
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Intersection over union with `other`, 0.0 when either is empty.
    pub fn iou(&self, other: &DetectedFace) -> f32 {
        let left = self.x.max(other.x);
        let right = self.right().min(other.right());
        let top = self.y.max(other.y);
        let bottom = self.bottom().min(other.bottom());

        let intersection = i64::from((right - left).max(0)) * i64::from((bottom - top).max(0));
        let union = self.area() + other.area() - intersection;
        if union <= 0 {
            return 0.0;
        }
        intersection as f32 / union as f32
    }

    pub fn to_xywh(&self) -> (i32, i32, i32, i32) {
        (self.x, self.y, self.width, self.height)
    }
}

/// Knobs handed to the classifier for one detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Geometric step between successive window sizes. Closer to 1.0 looks at
    /// more sizes: more hits, more work.
    pub scale_factor: f32,
    /// Overlapping candidate windows a detection needs beyond its own. Low
    /// values admit false positives, high values drop real faces.
    pub min_neighbors: u32,
    /// Smallest window edge searched, in pixels.
    pub min_size: u32,
    /// Largest window edge searched, in pixels. `None` means the short side
    /// of the image.
    pub max_size: Option<u32>,
    /// Engine score a single window needs to count as a candidate.
    pub score_threshold: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 4,
            min_size: ENGINE_MIN_FACE_SIZE,
            max_size: None,
            score_threshold: 2.0,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let invalid = |msg: String| Err(ClassifierError::InvalidParameter(msg));

        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return invalid(format!(
                "scale factor must be greater than 1.0, got {}",
                self.scale_factor
            ));
        }
        if self.min_size < ENGINE_MIN_FACE_SIZE {
            return invalid(format!(
                "minimum size must be at least {}, got {}",
                ENGINE_MIN_FACE_SIZE, self.min_size
            ));
        }
        if let Some(max_size) = self.max_size {
            if max_size < self.min_size {
                return invalid(format!(
                    "maximum size {} is below minimum size {}",
                    max_size, self.min_size
                ));
            }
        }
        if !self.score_threshold.is_finite() || self.score_threshold <= 0.0 {
            return invalid(format!(
                "score threshold must be positive, got {}",
                self.score_threshold
            ));
        }
        Ok(())
    }
}

/// A loaded, pre-trained face classifier.
///
/// The pipeline only ever sees this trait, so the detection backend can be
/// swapped or stubbed without touching the orchestration.
pub trait FaceClassifier {
    /// Finds faces in `grid`. The result may be empty and has no defined
    /// order.
    fn detect(
        &self,
        grid: &PixelGrid,
        params: &DetectionParams,
    ) -> Result<Vec<DetectedFace>, ClassifierError>;
}

/// SeetaFace frontal-face cascade, run through `rustface`.
pub struct SeetaClassifier {
    model: Model,
}

impl SeetaClassifier {
    /// Loads a serialized SeetaFace model (e.g. `seeta_fd_frontal_v1.0.bin`).
    pub fn from_path(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::NotFound(path.to_path_buf()));
        }
        let corrupt = |source| ClassifierError::Corrupt {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(corrupt)?;
        let model = rustface::read_model(BufReader::new(file)).map_err(corrupt)?;
        debug!("Loaded SeetaFace model from {:?}", path);

        Ok(Self { model })
    }
}

impl SeetaClassifier {
    /// Raw candidate windows pooled over every window size, before the
    /// neighbour consensus.
    ///
    /// Each size gets its own engine pass over a copy of the image resized
    /// so that the engine's native window covers `size` source pixels. The
    /// engine's own pyramid is pinned to that single level, so one face
    /// contributes at most one window per size, however large the image.
    pub fn candidates(
        &self,
        grid: &PixelGrid,
        params: &DetectionParams,
    ) -> Result<Vec<DetectedFace>, ClassifierError> {
        params.validate()?;

        let gray = DynamicImage::ImageRgb8(grid.to_rgb_image()?).into_luma8();
        let (width, height) = gray.dimensions();
        let largest = params
            .max_size
            .map_or(width.min(height), |max_size| max_size.min(width.min(height)));

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_score_thresh(params.score_threshold);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);
        detector.set_min_face_size(ENGINE_WINDOW);
        detector.set_max_face_size(ENGINE_WINDOW);
        detector.set_pyramid_scale_factor(SINGLE_LEVEL_PYRAMID);

        let mut candidates = Vec::new();
        for size in window_sizes(params.min_size, largest, params.scale_factor) {
            let ratio = ENGINE_WINDOW as f32 / size as f32;
            let scaled_width = ((width as f32 * ratio).round() as u32).max(ENGINE_WINDOW);
            let scaled_height = ((height as f32 * ratio).round() as u32).max(ENGINE_WINDOW);
            let scaled = imageops::resize(&gray, scaled_width, scaled_height, FilterType::Triangle);

            let mut image_data = ImageData::new(scaled.as_raw(), scaled_width, scaled_height);
            let hits: Vec<DetectedFace> = detector
                .detect(&mut image_data)
                .iter()
                .map(|face| {
                    let bbox = face.bbox();
                    DetectedFace {
                        x: bbox.x(),
                        y: bbox.y(),
                        width: bbox.width() as i32,
                        height: bbox.height() as i32,
                    }
                })
                .collect();

            let pass = single_scale_hits(
                &hits,
                width as f32 / scaled_width as f32,
                height as f32 / scaled_height as f32,
            );
            trace!("Window size {}: {} of {} hits kept", size, pass.len(), hits.len());
            candidates.extend(pass);
        }

        Ok(candidates)
    }
}

impl FaceClassifier for SeetaClassifier {
    fn detect(
        &self,
        grid: &PixelGrid,
        params: &DetectionParams,
    ) -> Result<Vec<DetectedFace>, ClassifierError> {
        let candidates = self.candidates(grid, params)?;
        let faces = group_rectangles(&candidates, params.min_neighbors, GROUP_EPS);
        debug!(
            "Grouped {} candidate windows into {} faces (min neighbors {})",
            candidates.len(),
            faces.len(),
            params.min_neighbors
        );
        Ok(faces)
    }
}

/// Keeps the hits of one engine pass that belong to its native window size,
/// maps them back to source coordinates and drops exact repeats.
///
/// Hits twice the native window or larger come from a coarser level than
/// the pass is meant to cover.
fn single_scale_hits(hits: &[DetectedFace], scale_x: f32, scale_y: f32) -> Vec<DetectedFace> {
    let limit = 2 * ENGINE_WINDOW as i32;
    let mut kept: Vec<DetectedFace> = Vec::with_capacity(hits.len());
    for hit in hits.iter().filter(|hit| hit.width < limit && hit.height < limit) {
        let mapped = DetectedFace {
            x: (hit.x as f32 * scale_x).round() as i32,
            y: (hit.y as f32 * scale_y).round() as i32,
            width: (hit.width as f32 * scale_x).round() as i32,
            height: (hit.height as f32 * scale_y).round() as i32,
        };
        if !kept.contains(&mapped) {
            kept.push(mapped);
        }
    }
    kept
}

/// Window edges `min, min·s, min·s², …` up to `max`, rounded and deduplicated.
fn window_sizes(min_size: u32, max_size: u32, scale_factor: f32) -> Vec<u32> {
    let mut sizes: Vec<u32> = Vec::new();
    let mut size = min_size as f32;
    while size.round() as u32 <= max_size {
        let rounded = size.round() as u32;
        if sizes.last() != Some(&rounded) {
            sizes.push(rounded);
        }
        size *= scale_factor;
    }
    sizes
}

fn ensure_detectable(grid: &PixelGrid) -> Result<(), ClassifierError> {
    grid.ensure_three_channels()?;
    if grid.height() == 0 || grid.width() == 0 {
        return Err(FormatError::Dimensions {
            height: grid.height(),
            width: grid.width(),
        }
        .into());
    }
    Ok(())
}

/// Finds faces in `grid` with `classifier`.
///
/// Parameters and grid shape are checked here so every backend sees the same
/// preconditions.
pub fn locate_faces(
    grid: &PixelGrid,
    classifier: &dyn FaceClassifier,
    params: &DetectionParams,
) -> Result<Vec<DetectedFace>, ClassifierError> {
    params.validate()?;
    ensure_detectable(grid)?;

    let faces = classifier.detect(grid, params)?;
    debug!(
        "Located {} faces (scale factor {}, min neighbors {})",
        faces.len(),
        params.scale_factor,
        params.min_neighbors
    );
    Ok(faces)
}

// Factory function to create classifiers by name
pub fn create_classifier(
    name: &str,
    model_path: &Path,
) -> Result<Box<dyn FaceClassifier>, ClassifierError> {
    match name.to_lowercase().as_str() {
        "rustface" | "seeta" => Ok(Box::new(SeetaClassifier::from_path(model_path)?)),
        _ => Err(ClassifierError::InvalidParameter(format!(
            "unknown classifier: {}",
            name
        ))),
    }
}
