use thiserror::Error;

#[derive(Error, Debug)]
pub enum EyeStateError {
    #[error("Unable to open camera {index}")]
    CameraUnavailable { index: i32 },
    #[error("Cascade classifier at {path:?} is empty")]
    CascadeNotLoaded { path: String },
    #[error("Capture thread panicked")]
    CaptureThreadPanicked,
}
