use crate::config::CaptureConfig;
use crate::error::EyeStateError;
use opencv::prelude::*;
use opencv::{core, videoio};

/// Camera opened for one capture session. Released on drop.
pub struct CameraSource {
    capture: videoio::VideoCapture,
}

impl CameraSource {
    pub fn new(config: &CaptureConfig) -> anyhow::Result<Self> {
        let mut capture = videoio::VideoCapture::new(config.device_index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(EyeStateError::CameraUnavailable {
                index: config.device_index,
            }
            .into());
        }

        // drivers are free to ignore these
        let requested = [
            (videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.width)),
            (videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.height)),
            (videoio::CAP_PROP_FPS, config.fps),
            (videoio::CAP_PROP_BUFFERSIZE, f64::from(config.buffer_size)),
        ];
        for (property, value) in requested {
            if !capture.set(property, value)? {
                log::debug!("Camera ignored property {} = {}", property, value);
            }
        }

        log::info!(
            "Opened camera {} at {}x{}",
            config.device_index,
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?
        );
        Ok(Self { capture })
    }

    /// Next frame mirrored horizontally, or `None` once the stream stops.
    pub fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(mirror(&frame)?))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            log::warn!("Failed to release camera: {:?}", err);
        }
    }
}

pub fn mirror(frame: &Mat) -> anyhow::Result<Mat> {
    let mut mirrored = Mat::default();
    core::flip(frame, &mut mirrored, 1)?;
    Ok(mirrored)
}
