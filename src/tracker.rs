use crate::annotate;
use crate::classifier::{EyeState, EyeStateClassifier};
use crate::config::TrackerConfig;
use crate::detector::{prepare_grayscale, CascadeDetector};
use crate::region::{label_eyes, select_eyes, LabeledEye, Region};
use opencv::prelude::*;

/// What was found on one face in one frame. Regions are in frame coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceReport {
    pub face: Region,
    /// Selected eyes, left to right.
    pub eyes: Vec<Region>,
    pub state: EyeState,
    pub labels: Vec<LabeledEye>,
}

/// Detection plus smoothing for a stream of mirrored frames.
pub struct EyeStateTracker {
    detector: CascadeDetector,
    classifier: EyeStateClassifier,
}

impl EyeStateTracker {
    pub fn new(config: &TrackerConfig) -> anyhow::Result<Self> {
        let detector = CascadeDetector::new(&config.detection)?;
        Ok(Self {
            detector,
            classifier: EyeStateClassifier::new(config.smoothing_window),
        })
    }

    /// Forget observations from an earlier session.
    pub fn reset(&mut self) {
        self.classifier.reset();
    }

    pub fn analyze(&mut self, frame: &Mat) -> anyhow::Result<Vec<FaceReport>> {
        let gray = prepare_grayscale(frame)?;
        let faces = self.detector.detect_faces(&gray)?;

        let mut reports = Vec::with_capacity(faces.len());
        for face in faces {
            let candidates = self.detector.detect_eyes(&gray, face)?;
            reports.push(assess_face(&mut self.classifier, face, &candidates));
        }
        Ok(reports)
    }

    /// Annotated copy of `frame` with what was found on it.
    pub fn process_frame(&mut self, frame: &Mat) -> anyhow::Result<(Mat, Vec<FaceReport>)> {
        let mut debug_frame = frame.clone();
        let reports = self.analyze(frame)?;
        for report in &reports {
            annotate::draw_face(&mut debug_frame, report)?;
        }
        Ok((debug_frame, reports))
    }
}

/// Select eyes among the band relative `candidates`, feed the count to the
/// classifier and label what is open.
///
/// Every face feeds the same classifier, one observation per face per frame.
pub fn assess_face(
    classifier: &mut EyeStateClassifier,
    face: Region,
    candidates: &[Region],
) -> FaceReport {
    let band = face.eye_band();
    let eyes = select_eyes(candidates);
    let state = classifier.update(eyes.len());

    let to_frame = |region: Region| region.offset(band.x, band.y);
    let labels = label_eyes(state, &eyes, face.width)
        .into_iter()
        .map(|eye| LabeledEye {
            region: to_frame(eye.region),
            side: eye.side,
        })
        .collect();

    FaceReport {
        face,
        eyes: eyes.into_iter().map(to_frame).collect(),
        state,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::EyeSide;

    #[test]
    fn eyes_are_moved_into_frame_coordinates() {
        let mut classifier = EyeStateClassifier::default();
        let face = Region::new(100, 40, 200, 200);
        let candidates = [Region::new(120, 10, 40, 40), Region::new(30, 12, 40, 40)];

        let report = assess_face(&mut classifier, face, &candidates);

        assert_eq!(report.state, EyeState::BothOpen);
        assert_eq!(
            report.eyes,
            vec![Region::new(130, 82, 40, 40), Region::new(220, 80, 40, 40)]
        );
        assert_eq!(report.labels.len(), 2);
        assert_eq!(report.labels[0].side, EyeSide::Left);
        assert_eq!(report.labels[0].region, Region::new(130, 82, 40, 40));
        assert_eq!(report.labels[1].side, EyeSide::Right);
    }

    #[test]
    fn smoothing_holds_state_through_a_missed_frame() {
        let mut classifier = EyeStateClassifier::default();
        let face = Region::new(0, 0, 200, 200);
        let both = [Region::new(20, 10, 40, 40), Region::new(120, 10, 40, 40)];
        for _ in 0..5 {
            assess_face(&mut classifier, face, &both);
        }

        let report = assess_face(&mut classifier, face, &[]);
        assert_eq!(report.state, EyeState::BothOpen);
        assert!(report.eyes.is_empty());
        assert!(report.labels.is_empty());
    }

    #[test]
    fn one_open_eye_is_labelled_from_midpoint() {
        let mut classifier = EyeStateClassifier::default();
        let face = Region::new(50, 50, 200, 200);
        let report = assess_face(&mut classifier, face, &[Region::new(130, 5, 30, 30)]);

        assert_eq!(report.state, EyeState::OneEyeOpen);
        assert_eq!(report.labels.len(), 1);
        assert_eq!(report.labels[0].side, EyeSide::Right);
        assert_eq!(report.labels[0].region, Region::new(180, 85, 30, 30));
    }

    #[test]
    fn extra_candidates_are_dropped_before_counting() {
        let mut classifier = EyeStateClassifier::default();
        let face = Region::new(0, 0, 200, 200);
        let candidates = [
            Region::new(10, 0, 5, 10),
            Region::new(150, 0, 30, 30),
            Region::new(40, 0, 20, 15),
            Region::new(60, 0, 25, 34),
        ];
        let report = assess_face(&mut classifier, face, &candidates);
        assert_eq!(report.eyes.len(), 2);
        assert_eq!(classifier.history().collect::<Vec<_>>(), vec![2]);
    }
}
