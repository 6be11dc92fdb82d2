use std::path::PathBuf;

use thiserror::Error;

use crate::grid::ChannelOrder;

/// Failure to turn an image file into a pixel grid.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to read image {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}: {reason}")]
    Undecodable { path: PathBuf, reason: String },
}

/// A grid whose shape or channel order does not fit the requested step.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected 3 channels, got {0}")]
    ChannelCount(usize),

    #[error("grid dimensions {height}x{width} do not fit an image")]
    Dimensions { height: usize, width: usize },

    #[error("expected {expected:?} channel order, got {actual:?}")]
    ChannelOrder {
        expected: ChannelOrder,
        actual: ChannelOrder,
    },
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier model not found: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to load classifier model {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid detection parameter: {0}")]
    InvalidParameter(String),

    #[error("grid is incompatible with the classifier: {0}")]
    IncompatibleGrid(#[from] FormatError),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("display I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch image viewer for {path:?}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
