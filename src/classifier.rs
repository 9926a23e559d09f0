use crate::region::MAX_EYES;
use std::collections::VecDeque;
use std::fmt;

/// Frames averaged by default.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
/// Longest history kept, about a minute of frames at 30 fps.
pub const MAX_SMOOTHING_WINDOW: usize = 2048;

/// Mean eye count below which both eyes count as closed.
const CLOSED_BELOW: f64 = 0.5;
/// Mean eye count below which only one eye counts as open.
const ONE_OPEN_BELOW: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    BothClosed,
    OneEyeOpen,
    BothOpen,
}

impl EyeState {
    pub fn from_mean(mean: f64) -> Self {
        if mean < CLOSED_BELOW {
            EyeState::BothClosed
        } else if mean < ONE_OPEN_BELOW {
            EyeState::OneEyeOpen
        } else {
            EyeState::BothOpen
        }
    }

    /// Text drawn above the face.
    pub fn headline(&self) -> &'static str {
        match self {
            EyeState::BothClosed => "Both Eyes: CLOSED",
            EyeState::OneEyeOpen => "One Eye Detected",
            EyeState::BothOpen => "Both Eyes: OPEN",
        }
    }
}

impl fmt::Display for EyeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeState::BothClosed => write!(f, "both closed"),
            EyeState::OneEyeOpen => write!(f, "one eye open"),
            EyeState::BothOpen => write!(f, "both open"),
        }
    }
}

/// Moving average over the last few per-frame eye counts.
///
/// Single frames where the cascade misses an eye (or finds an extra one)
/// only shift the mean a little, so the reported state doesn't flicker.
/// Not shared between threads; the capture thread owns it.
#[derive(Debug, Clone)]
pub struct EyeStateClassifier {
    history: VecDeque<u8>,
    window: usize,
}

impl Default for EyeStateClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_WINDOW)
    }
}

impl EyeStateClassifier {
    /// The window is clamped to `1..=MAX_SMOOTHING_WINDOW`.
    pub fn new(window: usize) -> Self {
        let window = window.clamp(1, MAX_SMOOTHING_WINDOW);
        Self {
            history: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    /// Record the number of eyes found on a face this frame.
    pub fn observe(&mut self, count: usize) {
        let count = count.min(MAX_EYES) as u8;
        self.history.push_back(count);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
    }

    /// Observe and classify in one step, for the per-frame path.
    pub fn update(&mut self, count: usize) -> EyeState {
        self.observe(count);
        EyeState::from_mean(self.sum() / self.history.len() as f64)
    }

    fn sum(&self) -> f64 {
        self.history.iter().map(|&count| f64::from(count)).sum()
    }

    /// `None` until something was observed.
    pub fn mean(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.sum() / self.history.len() as f64)
    }

    pub fn classify(&self) -> Option<EyeState> {
        self.mean().map(EyeState::from_mean)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = u8> + '_ {
        self.history.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier_with(counts: &[usize]) -> EyeStateClassifier {
        let mut classifier = EyeStateClassifier::default();
        for &count in counts {
            classifier.observe(count);
        }
        classifier
    }

    #[test]
    fn thresholds() {
        assert_eq!(EyeState::from_mean(0.0), EyeState::BothClosed);
        assert_eq!(EyeState::from_mean(0.49), EyeState::BothClosed);
        assert_eq!(EyeState::from_mean(0.5), EyeState::OneEyeOpen);
        assert_eq!(EyeState::from_mean(1.49), EyeState::OneEyeOpen);
        assert_eq!(EyeState::from_mean(1.5), EyeState::BothOpen);
        assert_eq!(EyeState::from_mean(2.0), EyeState::BothOpen);
    }

    #[test]
    fn empty_is_not_classified() {
        let classifier = EyeStateClassifier::default();
        assert!(classifier.is_empty());
        assert_eq!(classifier.mean(), None);
        assert_eq!(classifier.classify(), None);
    }

    #[test]
    fn counts_above_two_are_capped() {
        let classifier = classifier_with(&[5, 3]);
        assert_eq!(classifier.history().collect::<Vec<_>>(), vec![2, 2]);
        assert_eq!(classifier.classify(), Some(EyeState::BothOpen));
    }

    #[test]
    fn zero_window_holds_one_value() {
        let mut classifier = EyeStateClassifier::new(0);
        assert_eq!(classifier.window(), 1);
        classifier.observe(2);
        classifier.observe(0);
        assert_eq!(classifier.history().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn huge_window_is_clamped() {
        let mut classifier = EyeStateClassifier::new(usize::MAX);
        assert_eq!(classifier.window(), MAX_SMOOTHING_WINDOW);
        for _ in 0..MAX_SMOOTHING_WINDOW + 3 {
            classifier.observe(1);
        }
        assert_eq!(classifier.len(), MAX_SMOOTHING_WINDOW);
    }

    #[test]
    fn single_dropout_does_not_flip_state() {
        let mut classifier = classifier_with(&[2, 2, 2, 2, 2]);
        classifier.observe(0);
        // [2, 2, 2, 2, 0] -> 1.6
        assert_eq!(classifier.classify(), Some(EyeState::BothOpen));
        classifier.observe(0);
        // [2, 2, 2, 0, 0] -> 1.2
        assert_eq!(classifier.classify(), Some(EyeState::OneEyeOpen));
    }

    #[test]
    fn update_matches_observe_then_classify() {
        let mut stepwise = classifier_with(&[1, 2]);
        let mut combined = stepwise.clone();
        stepwise.observe(0);
        assert_eq!(combined.update(0), EyeState::OneEyeOpen);
        assert_eq!(stepwise.classify(), Some(EyeState::OneEyeOpen));
    }

    #[test]
    fn headlines() {
        assert_eq!(EyeState::BothClosed.headline(), "Both Eyes: CLOSED");
        assert_eq!(EyeState::OneEyeOpen.headline(), "One Eye Detected");
        assert_eq!(EyeState::BothOpen.headline(), "Both Eyes: OPEN");
    }
}
