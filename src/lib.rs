//! Live eye state detection on top of OpenCV Haar cascades.
//!
//! Frames come from a [`CameraSource`], faces and eyes are found by the
//! [`CascadeDetector`], and the number of eyes per face is smoothed by the
//! [`EyeStateClassifier`] into an [`EyeState`]. A [`CaptureSession`] runs all
//! of that on its own thread and hands annotated frames to the UI.

pub mod annotate;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod region;
pub mod session;
pub mod tracker;

pub use camera::CameraSource;
pub use classifier::{EyeState, EyeStateClassifier};
pub use config::{CaptureConfig, DetectionParams, TrackerConfig};
pub use detector::CascadeDetector;
pub use error::EyeStateError;
pub use region::{EyeSide, LabeledEye, Region};
pub use session::{CaptureSession, RenderedFrame, SessionEnd, SessionOutcome};
pub use tracker::{EyeStateTracker, FaceReport};
