use anyhow::{Context, Result};
use clap::Parser;
use face_marker::detector::ENGINE_MIN_FACE_SIZE;
use face_marker::{
    DetectionParams, NullRenderer, Pipeline, Renderer, SystemViewer, create_classifier,
};
use log::{info, warn};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Detect faces in an image and show them boxed in red")]
struct Args {
    /// Image to search for faces
    #[clap(value_parser)]
    image: PathBuf,

    /// Pre-trained classifier model (e.g. seeta_fd_frontal_v1.0.bin)
    #[clap(short, long, value_parser)]
    model: PathBuf,

    /// Classifier backend to load the model with
    #[clap(long, default_value = "rustface")]
    classifier: String,

    /// Step between successive window sizes (must be > 1.0)
    #[clap(short, long, default_value = "1.1")]
    scale_factor: f32,

    /// Overlapping candidate windows required to accept a face
    #[clap(short = 'n', long, default_value = "4")]
    min_neighbors: u32,

    /// Smallest face edge to search for (px)
    #[clap(long, default_value_t = ENGINE_MIN_FACE_SIZE)]
    min_size: u32,

    /// Largest face edge to search for (px)
    #[clap(long)]
    max_size: Option<u32>,

    /// Score a single window needs to count as a candidate
    #[clap(long, default_value = "2.0")]
    score_threshold: f64,

    /// Skip displaying the annotated image
    #[clap(long)]
    headless: bool,
}

/// Main program logic
fn run(args: Args) -> Result<()> {
    // Initialize logger
    env_logger::init();

    info!("Loading {} classifier from {:?}", args.classifier, args.model);
    let classifier = create_classifier(&args.classifier, &args.model)
        .context("Failed to load face classifier")?;

    let renderer: Box<dyn Renderer> = if args.headless {
        Box::new(NullRenderer)
    } else {
        Box::new(SystemViewer::new())
    };

    let params = DetectionParams {
        scale_factor: args.scale_factor,
        min_neighbors: args.min_neighbors,
        min_size: args.min_size,
        max_size: args.max_size,
        score_threshold: args.score_threshold,
    };

    let mut pipeline = Pipeline::new(classifier, renderer).params(params);
    let faces = pipeline
        .run(&args.image)
        .with_context(|| format!("Failed to process image: {:?}", args.image))?;

    if faces.is_empty() {
        warn!("No faces found in {:?}", args.image);
    }
    for face in &faces {
        println!("{} {} {} {}", face.x, face.y, face.width, face.height);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(args)
}
