use clap::Parser;
use env_logger::Env;
use eye_state::camera::mirror;
use eye_state::classifier::DEFAULT_SMOOTHING_WINDOW;
use eye_state::{DetectionParams, EyeStateTracker, TrackerConfig};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs};
use std::path::PathBuf;

/// Run eye state detection once on an image file.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Image to analyze.
    image: PathBuf,

    /// Write the annotated image here instead of showing it.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Mirror the image first, like camera frames are.
    #[clap(long)]
    mirror: bool,

    /// Face cascade, defaults to the one shipped with OpenCV.
    #[clap(long)]
    face_cascade: Option<PathBuf>,

    /// Eye cascade, defaults to the one shipped with OpenCV.
    #[clap(long)]
    eye_cascade: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();

    let mut frame = imgcodecs::imread_def(&args.image.to_string_lossy())?;
    if frame.empty() {
        anyhow::bail!("Failed to read image {:?}", args.image);
    }
    if args.mirror {
        frame = mirror(&frame)?;
    }

    // a single observation is all the smoothing a still image gets
    let config = TrackerConfig {
        smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        detection: DetectionParams {
            face_cascade: args.face_cascade.clone(),
            eye_cascade: args.eye_cascade.clone(),
            ..Default::default()
        },
    };
    let mut tracker = EyeStateTracker::new(&config)?;
    let (annotated, faces) = tracker.process_frame(&frame)?;

    log::info!("faces: {}", faces.len());
    for face in &faces {
        let sides: Vec<String> = face.labels.iter().map(|eye| eye.side.to_string()).collect();
        log::info!(
            "face at {:?}: {} eye(s) found, {} [{}]",
            face.face,
            face.eyes.len(),
            face.state,
            sides.join(", ")
        );
    }

    match &args.output {
        Some(output) => {
            let params: opencv::core::Vector<i32> = Default::default();
            if !imgcodecs::imwrite(&output.to_string_lossy(), &annotated, &params)? {
                anyhow::bail!("Failed to write {:?}", output);
            }
            log::info!("Wrote {:?}", output);
        }
        None => {
            let window = "eye state";
            highgui::named_window_def(window)?;
            highgui::imshow(window, &annotated)?;
            highgui::wait_key(0)?;
        }
    }

    Ok(())
}
