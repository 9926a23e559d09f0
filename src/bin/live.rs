use clap::Parser;
use env_logger::Env;
use eye_state::annotate::{draw_status_bar, fit_to};
use eye_state::classifier::DEFAULT_SMOOTHING_WINDOW;
use eye_state::{
    CaptureConfig, CaptureSession, DetectionParams, EyeState, EyeStateError, EyeStateTracker,
    SessionEnd, SessionOutcome, TrackerConfig,
};
use opencv::core::{self, Mat, Scalar};
use opencv::highgui;
use opencv::prelude::*;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const WINDOW: &str = "Eye State Detection";
const KEY_ESCAPE: i32 = 27;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,

    /// Requested frame width.
    #[clap(long, default_value_t = 640)]
    width: i32,

    /// Requested frame height.
    #[clap(long, default_value_t = 480)]
    height: i32,

    /// Requested frame rate, also the processing cadence.
    #[clap(long, default_value_t = 30.0)]
    fps: f64,

    /// Frames averaged for the eye state, 1 to 2048.
    #[clap(long, default_value_t = DEFAULT_SMOOTHING_WINDOW)]
    smoothing_window: usize,

    /// Face cascade, defaults to the one shipped with OpenCV.
    #[clap(long)]
    face_cascade: Option<PathBuf>,

    /// Eye cascade, defaults to the one shipped with OpenCV.
    #[clap(long)]
    eye_cascade: Option<PathBuf>,
}

impl Args {
    fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            device_index: self.camera,
            width: self.width,
            height: self.height,
            fps: self.fps,
            ..Default::default()
        }
    }

    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            smoothing_window: self.smoothing_window,
            detection: DetectionParams {
                face_cascade: self.face_cascade.clone(),
                eye_cascade: self.eye_cascade.clone(),
                ..Default::default()
            },
        }
    }
}

/// Window state. Either idle holding the tracker or running a session that owns it.
///
/// A stopped session waits in `stopping` until its thread exits; the window
/// never blocks on it.
struct App {
    capture: CaptureConfig,
    tracker_config: TrackerConfig,
    tracker: Option<EyeStateTracker>,
    session: Option<CaptureSession<EyeStateTracker>>,
    stopping: Option<CaptureSession<EyeStateTracker>>,
    last_frame: Option<Mat>,
    last_state: Option<EyeState>,
    status: String,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let tracker_config = args.tracker_config();
        let tracker = EyeStateTracker::new(&tracker_config)?;
        Ok(Self {
            capture: args.capture_config(),
            tracker_config,
            tracker: Some(tracker),
            session: None,
            stopping: None,
            last_frame: None,
            last_state: None,
            status: "Camera is OFF".to_owned(),
        })
    }

    fn toggle(&mut self) -> anyhow::Result<()> {
        if self.session.is_some() {
            self.stop_capture();
            Ok(())
        } else if self.stopping.is_some() {
            log::info!("Camera is still closing");
            Ok(())
        } else {
            self.start_capture()
        }
    }

    fn start_capture(&mut self) -> anyhow::Result<()> {
        let tracker = match self.tracker.take() {
            Some(tracker) => tracker,
            None => EyeStateTracker::new(&self.tracker_config)?,
        };
        self.session = Some(CaptureSession::start(tracker, self.capture.clone())?);
        self.last_state = None;
        self.status = "Camera is ON - Detecting eyes...".to_owned();
        log::info!("Camera {} started", self.capture.device_index);
        Ok(())
    }

    fn stop_capture(&mut self) {
        if let Some(session) = self.session.take() {
            session.request_stop();
            self.stopping = Some(session);
            self.last_frame = None;
            self.status = "Camera is OFF".to_owned();
        }
    }

    fn finish(&mut self, outcome: Result<SessionOutcome<EyeStateTracker>, EyeStateError>) {
        self.last_frame = None;
        self.status = "Camera is OFF".to_owned();
        let SessionOutcome { processor, end } = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("{}", err);
                return;
            }
        };
        self.tracker = Some(processor);

        match end {
            SessionEnd::Stopped => log::info!("Camera stopped"),
            SessionEnd::StreamEnded => log::info!("Camera stream ended"),
            SessionEnd::Failed(err) => {
                log::error!("Capture failed: {:?}", err);
                self.status = match err.downcast_ref::<EyeStateError>() {
                    Some(EyeStateError::CameraUnavailable { index }) => {
                        format!("Camera is OFF - failed to open camera {}", index)
                    }
                    _ => "Camera is OFF - capture failed".to_owned(),
                };
            }
        }
    }

    /// Pick up the newest frame and reclaim sessions whose thread has exited.
    fn tick(&mut self) {
        if self.stopping.as_ref().is_some_and(|session| session.is_finished()) {
            if let Some(session) = self.stopping.take() {
                self.finish(session.join());
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(rendered) = session.latest_frame() {
            match rendered.decode() {
                Ok(frame) => self.last_frame = Some(frame),
                Err(err) => log::warn!("Dropping frame {}: {:?}", rendered.sequence, err),
            }
            let state = rendered.faces.first().map(|face| face.state);
            if state != self.last_state {
                match state {
                    Some(state) => log::info!("Eyes {}", state),
                    None => log::debug!("No face in view"),
                }
                self.last_state = state;
            }
        }

        if session.is_finished() {
            if let Some(session) = self.session.take() {
                self.finish(session.join());
            }
        }
    }

    /// Stop capture on exit, giving the thread a moment to release the camera.
    fn shutdown(&mut self) {
        self.stop_capture();
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while self.stopping.is_some() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            self.tick();
        }
        if self.stopping.is_some() {
            log::warn!("Capture thread did not exit in {:?}", SHUTDOWN_GRACE);
        }
    }

    fn render(&self) -> anyhow::Result<Mat> {
        let mut frame = match &self.last_frame {
            Some(frame) => frame.clone(),
            None => Mat::new_rows_cols_with_default(
                self.capture.height,
                self.capture.width,
                core::CV_8UC3,
                Scalar::all(0.0),
            )?,
        };
        if frame.cols() != self.capture.width || frame.rows() != self.capture.height {
            frame = fit_to(&frame, self.capture.width, self.capture.height)?;
        }
        draw_status_bar(&mut frame, &self.status)?;
        Ok(frame)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();

    let mut app = App::new(&args)?;

    highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
    log::info!("Press space to toggle the camera, q to quit");

    loop {
        app.tick();
        highgui::imshow(WINDOW, &app.render()?)?;

        let key = highgui::wait_key(10)?;
        if key == i32::from(b' ') || key == i32::from(b'c') {
            app.toggle()?;
        } else if key == i32::from(b'q') || key == KEY_ESCAPE {
            break;
        }

        // window closed
        if highgui::get_window_property(WINDOW, highgui::WND_PROP_VISIBLE)? < 1.0 {
            break;
        }
    }

    app.shutdown();
    highgui::destroy_all_windows()?;
    Ok(())
}
