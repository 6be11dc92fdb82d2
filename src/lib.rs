pub mod annotate;
pub mod color;
pub mod detector;
pub mod error;
pub mod grid;
pub mod grouping;
pub mod loader;
pub mod pipeline;
pub mod render;

// Re-export commonly used items
pub use annotate::{Stroke, annotate};
pub use color::{reorder_channels, to_rgb};
pub use detector::{
    DetectedFace, DetectionParams, FaceClassifier, SeetaClassifier, create_classifier,
    locate_faces,
};
pub use error::{ClassifierError, FormatError, LoadError, PipelineError, RenderError};
pub use grid::{ChannelOrder, PixelGrid};
pub use loader::{load_image, load_image_from_memory};
pub use pipeline::{Annotated, Pipeline};
pub use render::{NullRenderer, Renderer, SystemViewer};
