use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::annotate::{Stroke, annotate};
use crate::color::reorder_channels;
use crate::detector::{DetectedFace, DetectionParams, FaceClassifier, locate_faces};
use crate::error::PipelineError;
use crate::grid::PixelGrid;
use crate::loader::load_image;
use crate::render::Renderer;

/// The annotated frame of one run together with the faces drawn on it.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub frame: PixelGrid,
    pub faces: Vec<DetectedFace>,
}

/// Single-image pipeline: load → reorder → locate → annotate → render.
///
/// Every step runs once; the first failure aborts the run.
pub struct Pipeline {
    classifier: Box<dyn FaceClassifier>,
    renderer: Box<dyn Renderer>,
    params: DetectionParams,
    stroke: Stroke,
}

impl Pipeline {
    pub fn new(classifier: Box<dyn FaceClassifier>, renderer: Box<dyn Renderer>) -> Self {
        Self {
            classifier,
            renderer,
            params: DetectionParams::default(),
            stroke: Stroke::default(),
        }
    }

    pub fn params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = stroke;
        self
    }

    /// Runs every step except rendering and returns the annotated frame.
    pub fn process(&self, image_path: &Path) -> Result<Annotated, PipelineError> {
        let start = Instant::now();

        let grid = load_image(image_path)?;
        info!(
            "Loaded {:?} ({}x{})",
            image_path,
            grid.width(),
            grid.height()
        );

        let grid = reorder_channels(grid)?;
        debug!("Reordered channels to {:?}", grid.order());

        let faces = locate_faces(&grid, self.classifier.as_ref(), &self.params)?;
        info!("Detected {} faces", faces.len());
        for face in &faces {
            debug!("Face at {:?}", face.to_xywh());
        }

        let frame = annotate(grid, &faces, &self.stroke)?;
        debug!("Annotated frame in {:.2?}", start.elapsed());

        Ok(Annotated { frame, faces })
    }

    /// Runs the full pipeline and renders the annotated frame.
    pub fn run(&mut self, image_path: &Path) -> Result<Vec<DetectedFace>, PipelineError> {
        let Annotated { frame, faces } = self.process(image_path)?;
        self.renderer.render(&frame)?;
        Ok(faces)
    }
}
