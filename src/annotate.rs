use crate::classifier::EyeState;
use crate::tracker::FaceReport;
use opencv::core::{Mat, Point, Rect, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;

const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

fn bgr(b: f64, g: f64, r: f64) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

fn state_color(state: EyeState) -> Scalar {
    match state {
        EyeState::BothClosed => bgr(0.0, 0.0, 255.0),
        EyeState::OneEyeOpen => bgr(0.0, 165.0, 255.0),
        EyeState::BothOpen => bgr(0.0, 255.0, 0.0),
    }
}

fn put_text(
    frame: &mut Mat,
    text: &str,
    origin: Point,
    scale: f64,
    color: Scalar,
) -> opencv::Result<()> {
    imgproc::put_text(
        frame,
        text,
        origin,
        FONT,
        scale,
        color,
        2,
        imgproc::LINE_8,
        false,
    )
}

/// Face box, smoothed state and the eyes that are open.
pub fn draw_face(frame: &mut Mat, report: &FaceReport) -> opencv::Result<()> {
    let face = report.face;
    imgproc::rectangle(
        frame,
        face.into(),
        bgr(255.0, 0.0, 0.0),
        2,
        imgproc::LINE_8,
        0,
    )?;
    put_text(
        frame,
        report.state.headline(),
        Point::new(face.x, face.y - 10),
        0.8,
        state_color(report.state),
    )?;

    let green = bgr(0.0, 255.0, 0.0);
    for eye in &report.labels {
        imgproc::rectangle(frame, eye.region.into(), green, 2, imgproc::LINE_8, 0)?;
        put_text(
            frame,
            &format!("{} Eye: OPEN", eye.side),
            Point::new(eye.region.x, eye.region.y - 10),
            0.6,
            green,
        )?;
    }
    Ok(())
}

/// Status line along the bottom edge.
pub fn draw_status_bar(frame: &mut Mat, status: &str) -> opencv::Result<()> {
    let height = 28;
    let rows = frame.rows();
    let cols = frame.cols();
    if rows < height {
        return Ok(());
    }
    imgproc::rectangle(
        frame,
        Rect::new(0, rows - height, cols, height),
        bgr(0.0, 0.0, 0.0),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        frame,
        status,
        Point::new(8, rows - 9),
        FONT,
        0.55,
        bgr(255.0, 255.0, 255.0),
        1,
        imgproc::LINE_AA,
        false,
    )
}

/// Scale a frame to the display size.
pub fn fit_to(frame: &Mat, width: i32, height: i32) -> opencv::Result<Mat> {
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(width, height),
        0.0,
        0.0,
        imgproc::INTER_LANCZOS4,
    )?;
    Ok(resized)
}
