use crate::camera::CameraSource;
use crate::config::CaptureConfig;
use crate::error::EyeStateError;
use crate::tracker::{EyeStateTracker, FaceReport};
use opencv::prelude::*;
use opencv::{core, imgcodecs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Anything frames can be pulled from.
pub trait FrameSource {
    /// `None` ends the session.
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>>;
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> anyhow::Result<Option<Mat>> {
        CameraSource::next_frame(self)
    }
}

/// Turns a captured frame into an annotated one.
pub trait FrameProcessor {
    /// Called once when a session starts.
    fn reset(&mut self);
    fn process(&mut self, frame: &Mat) -> anyhow::Result<(Mat, Vec<FaceReport>)>;
}

impl FrameProcessor for EyeStateTracker {
    fn reset(&mut self) {
        EyeStateTracker::reset(self);
    }

    fn process(&mut self, frame: &Mat) -> anyhow::Result<(Mat, Vec<FaceReport>)> {
        self.process_frame(frame)
    }
}

/// One annotated frame handed from the capture thread to the UI.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Counts from 1 within a session.
    pub sequence: u64,
    /// BMP encoded BGR image.
    pub encoded: Vec<u8>,
    pub faces: Vec<FaceReport>,
}

impl RenderedFrame {
    pub fn decode(&self) -> anyhow::Result<Mat> {
        let buffer = core::Vector::<u8>::from_slice(&self.encoded);
        let frame = imgcodecs::imdecode(&buffer, imgcodecs::IMREAD_COLOR)?;
        Ok(frame)
    }
}

pub fn encode_frame(frame: &Mat) -> anyhow::Result<Vec<u8>> {
    let mut buffer: core::Vector<u8> = Default::default();
    imgcodecs::imencode_def(".bmp", frame, &mut buffer)?;
    Ok(buffer.to_vec())
}

#[derive(Debug)]
pub enum SessionEnd {
    /// Stop was requested.
    Stopped,
    /// The source stopped producing frames.
    StreamEnded,
    Failed(anyhow::Error),
}

/// What a finished capture thread hands back.
pub struct SessionOutcome<P> {
    pub processor: P,
    pub end: SessionEnd,
}

type Mailbox = Option<Arc<RenderedFrame>>;

/// A running capture thread.
///
/// The thread owns the frame source and the processor; the owner of the
/// session only sees the latest rendered frame.
pub struct CaptureSession<P> {
    stop: Arc<AtomicBool>,
    frames: watch::Receiver<Mailbox>,
    last_sequence: u64,
    handle: Option<JoinHandle<SessionOutcome<P>>>,
}

impl CaptureSession<EyeStateTracker> {
    /// Open the camera on a new thread and run `tracker` on every frame.
    pub fn start(tracker: EyeStateTracker, config: CaptureConfig) -> anyhow::Result<Self> {
        let fps = config.fps;
        Self::spawn(move || CameraSource::new(&config), tracker, fps)
    }
}

impl<P> CaptureSession<P>
where
    P: FrameProcessor + Send + 'static,
{
    /// `open` runs on the capture thread, so a slow device open doesn't block the caller.
    pub fn spawn<S, F>(open: F, processor: P, fps: f64) -> anyhow::Result<Self>
    where
        S: FrameSource,
        F: FnOnce() -> anyhow::Result<S> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, frames) = watch::channel(None);
        let interval = Duration::from_secs_f64(1.0 / fps.max(1.0));

        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("capture".to_owned())
            .spawn(move || run_capture(open, processor, interval, &thread_stop, &sender))?;

        Ok(Self {
            stop,
            frames,
            last_sequence: 0,
            handle: Some(handle),
        })
    }
}

impl<P> CaptureSession<P> {
    /// The newest frame if it wasn't returned before.
    /// Still works after the capture thread has exited.
    pub fn latest_frame(&mut self) -> Option<Arc<RenderedFrame>> {
        let latest = Option::clone(&self.frames.borrow())?;
        if latest.sequence <= self.last_sequence {
            return None;
        }
        self.last_sequence = latest.sequence;
        Some(latest)
    }

    /// The capture thread exited by itself or was stopped.
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Ask the capture thread to stop without waiting for it.
    ///
    /// The thread notices at the top of its next iteration, so it can take up
    /// to one frame interval (or the rest of a slow device open) to exit.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the capture thread and take back the processor.
    ///
    /// Blocks until the thread exits; call it once `is_finished` is true when
    /// on the UI thread.
    pub fn join(mut self) -> Result<SessionOutcome<P>, EyeStateError> {
        let handle = self
            .handle
            .take()
            .ok_or(EyeStateError::CaptureThreadPanicked)?;
        handle
            .join()
            .map_err(|_| EyeStateError::CaptureThreadPanicked)
    }

    /// `request_stop` then `join`.
    pub fn stop(self) -> Result<SessionOutcome<P>, EyeStateError> {
        self.request_stop();
        self.join()
    }
}

impl<P> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        self.request_stop();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !handle.is_finished() {
            // detached, it exits on its own once it sees the flag
            log::debug!("Capture thread still running, not waiting for it");
            return;
        }
        if handle.join().is_err() {
            log::error!("Capture thread panicked");
        }
    }
}

fn run_capture<S, P, F>(
    open: F,
    mut processor: P,
    interval: Duration,
    stop: &AtomicBool,
    frames: &watch::Sender<Mailbox>,
) -> SessionOutcome<P>
where
    S: FrameSource,
    P: FrameProcessor,
    F: FnOnce() -> anyhow::Result<S>,
{
    processor.reset();
    let end = match open() {
        Ok(mut source) => match capture_loop(&mut source, &mut processor, interval, stop, frames)
        {
            Ok(end) => end,
            Err(err) => SessionEnd::Failed(err),
        },
        Err(err) => SessionEnd::Failed(err),
    };
    log::debug!("Capture thread exiting: {:?}", end);
    SessionOutcome { processor, end }
}

fn capture_loop<S, P>(
    source: &mut S,
    processor: &mut P,
    interval: Duration,
    stop: &AtomicBool,
    frames: &watch::Sender<Mailbox>,
) -> anyhow::Result<SessionEnd>
where
    S: FrameSource,
    P: FrameProcessor,
{
    let mut sequence = 0;
    while !stop.load(Ordering::Relaxed) {
        let started = Instant::now();
        let Some(frame) = source.next_frame()? else {
            return Ok(SessionEnd::StreamEnded);
        };

        let (annotated, faces) = processor.process(&frame)?;
        sequence += 1;
        let rendered = RenderedFrame {
            sequence,
            encoded: encode_frame(&annotated)?,
            faces,
        };
        frames.send_replace(Some(Arc::new(rendered)));

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
    Ok(SessionEnd::Stopped)
}
