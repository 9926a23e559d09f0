use crate::config::{CascadeParams, DetectionParams};
use crate::error::EyeStateError;
use crate::region::Region;
use opencv::prelude::*;
use opencv::{core, imgproc, objdetect, types};
use std::path::Path;

const FACE_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";
const EYE_CASCADE: &str = "haarcascades/haarcascade_eye.xml";

/// Pretrained Haar cascades for faces and for eyes within a face.
pub struct CascadeDetector {
    face: objdetect::CascadeClassifier,
    eye: objdetect::CascadeClassifier,
    face_params: CascadeParams,
    eye_params: CascadeParams,
}

impl CascadeDetector {
    pub fn new(params: &DetectionParams) -> anyhow::Result<Self> {
        let face = load_cascade(params.face_cascade.as_deref(), FACE_CASCADE)?;
        let eye = load_cascade(params.eye_cascade.as_deref(), EYE_CASCADE)?;
        Ok(Self {
            face,
            eye,
            face_params: params.face,
            eye_params: params.eye,
        })
    }

    /// Faces in an equalized grayscale frame.
    pub fn detect_faces(&mut self, gray: &Mat) -> anyhow::Result<Vec<Region>> {
        detect(&mut self.face, gray, &self.face_params)
    }

    /// Eye candidates in the eye band of `face`, relative to the band origin.
    pub fn detect_eyes(&mut self, gray: &Mat, face: Region) -> anyhow::Result<Vec<Region>> {
        let band = face.eye_band();
        if band.width <= 0 || band.height <= 0 {
            return Ok(Vec::new());
        }
        let roi = Mat::roi(gray, band.into())?;
        detect(&mut self.eye, &roi, &self.eye_params)
    }
}

fn load_cascade(
    explicit: Option<&Path>,
    default: &str,
) -> anyhow::Result<objdetect::CascadeClassifier> {
    let path = match explicit {
        Some(path) => path.to_string_lossy().into_owned(),
        None => core::find_file_def(default)?,
    };
    let classifier = objdetect::CascadeClassifier::new(&path)?;
    if classifier.empty()? {
        return Err(EyeStateError::CascadeNotLoaded { path }.into());
    }
    log::debug!("Loaded cascade {}", path);
    Ok(classifier)
}

fn detect(
    classifier: &mut objdetect::CascadeClassifier,
    image: &Mat,
    params: &CascadeParams,
) -> anyhow::Result<Vec<Region>> {
    let mut found = types::VectorOfRect::new();
    classifier.detect_multi_scale(
        image,
        &mut found,
        params.scale_factor,
        params.min_neighbors,
        params.flags,
        params.min_size,
        params.max_size,
    )?;
    Ok(found.into_iter().map(Region::from).collect())
}

/// Grayscale with equalized histogram, which holds up better under uneven lighting.
pub fn prepare_grayscale(frame: &Mat) -> anyhow::Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    let mut equalized = Mat::default();
    imgproc::equalize_hist(&gray, &mut equalized)?;
    Ok(equalized)
}
