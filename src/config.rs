use crate::classifier::DEFAULT_SMOOTHING_WINDOW;
use opencv::core::Size;
use opencv::objdetect;
use std::path::PathBuf;

/// How the camera is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub device_index: i32,
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    /// Frames the driver may queue. 1 keeps frames fresh.
    pub buffer_size: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
            fps: 30.0,
            buffer_size: 1,
        }
    }
}

/// Parameters for one `detect_multi_scale` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub flags: i32,
    pub min_size: Size,
    /// Zero means unbounded.
    pub max_size: Size,
}

impl CascadeParams {
    pub fn face() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            flags: objdetect::CASCADE_SCALE_IMAGE,
            min_size: Size::new(100, 100),
            max_size: Size::new(0, 0),
        }
    }

    pub fn eye() -> Self {
        Self {
            scale_factor: 1.05,
            min_neighbors: 8,
            flags: 0,
            min_size: Size::new(20, 20),
            max_size: Size::new(80, 80),
        }
    }
}

/// Where the cascades come from and how they are run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    /// Explicit model path, otherwise looked up in the OpenCV data directory.
    pub face_cascade: Option<PathBuf>,
    pub eye_cascade: Option<PathBuf>,
    pub face: CascadeParams,
    pub eye: CascadeParams,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            face_cascade: None,
            eye_cascade: None,
            face: CascadeParams::face(),
            eye: CascadeParams::eye(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub smoothing_window: usize,
    pub detection: DetectionParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            detection: DetectionParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_camera_setup() {
        let capture = CaptureConfig::default();
        assert_eq!((capture.width, capture.height), (640, 480));
        assert_eq!(capture.fps, 30.0);
        assert_eq!(capture.buffer_size, 1);
    }

    #[test]
    fn cascade_defaults() {
        let params = DetectionParams::default();
        assert_eq!(params.face.min_neighbors, 5);
        assert_eq!(params.face.min_size, Size::new(100, 100));
        assert_eq!(params.eye.scale_factor, 1.05);
        assert_eq!(params.eye.max_size, Size::new(80, 80));
        assert!(params.face_cascade.is_none());
    }
}
