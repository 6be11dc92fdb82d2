use std::path::PathBuf;

use image::ImageOutputFormat;
use log::{debug, info};

use crate::error::RenderError;
use crate::grid::{ChannelOrder, PixelGrid};

/// Presents a finished RGB frame to the user.
pub trait Renderer {
    fn render(&mut self, frame: &PixelGrid) -> Result<(), RenderError>;
}

fn ensure_renderable(frame: &PixelGrid) -> Result<(), RenderError> {
    frame.ensure_three_channels()?;
    frame.ensure_order(ChannelOrder::Rgb)?;
    Ok(())
}

/// Shows the frame in the platform's default image viewer.
///
/// The frame is encoded as PNG into a temporary file that is left behind for
/// the viewer to read; the path of the last frame shown is kept.
#[derive(Debug, Default)]
pub struct SystemViewer {
    last_shown: Option<PathBuf>,
}

impl SystemViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_shown(&self) -> Option<&PathBuf> {
        self.last_shown.as_ref()
    }
}

impl Renderer for SystemViewer {
    fn render(&mut self, frame: &PixelGrid) -> Result<(), RenderError> {
        ensure_renderable(frame)?;
        let image = frame.to_rgb_image()?;

        let mut file = tempfile::Builder::new()
            .prefix("face_marker-")
            .suffix(".png")
            .tempfile()?;
        image.write_to(file.as_file_mut(), ImageOutputFormat::Png)?;
        let (_, path) = file.keep().map_err(|err| err.error)?;
        debug!("Wrote frame to {:?}", path);

        open::that(&path).map_err(|source| RenderError::Launch {
            path: path.clone(),
            source,
        })?;
        info!("Opened {:?} in the system image viewer", path);

        self.last_shown = Some(path);
        Ok(())
    }
}

/// Accepts any renderable frame and shows nothing. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &PixelGrid) -> Result<(), RenderError> {
        ensure_renderable(frame)
    }
}
