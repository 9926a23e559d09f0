use eye_state::region::{label_eyes, select_eyes};
use eye_state::{EyeSide, EyeState, EyeStateClassifier, Region};

fn filled(counts: &[usize]) -> EyeStateClassifier {
    let mut classifier = EyeStateClassifier::default();
    for &count in counts {
        classifier.observe(count);
    }
    classifier
}

#[test]
fn history_keeps_last_five_in_order() {
    let mut classifier = EyeStateClassifier::default();
    let inputs = [0, 1, 2, 2, 1, 0, 0, 2, 1, 1, 2, 0];
    for (seen, &count) in inputs.iter().enumerate() {
        classifier.observe(count);
        assert!(classifier.len() <= 5);
        assert_eq!(classifier.len(), (seen + 1).min(5));
    }
    let expected: Vec<u8> = inputs[inputs.len() - 5..]
        .iter()
        .map(|&count| count as u8)
        .collect();
    assert_eq!(classifier.history().collect::<Vec<_>>(), expected);
}

#[test]
fn uniform_histories() {
    assert_eq!(filled(&[2, 2, 2, 2, 2]).classify(), Some(EyeState::BothOpen));
    assert_eq!(filled(&[0, 0, 0, 0, 0]).classify(), Some(EyeState::BothClosed));
    assert_eq!(filled(&[1, 1, 1, 1, 1]).classify(), Some(EyeState::OneEyeOpen));
}

#[test]
fn mixed_histories_near_thresholds() {
    let closed = filled(&[0, 1, 0, 1, 0]);
    assert_eq!(closed.mean(), Some(0.4));
    assert_eq!(closed.classify(), Some(EyeState::BothClosed));

    assert_eq!(filled(&[1, 1, 1, 1, 2]).classify(), Some(EyeState::OneEyeOpen));
    assert_eq!(filled(&[2, 2, 1, 2, 2]).classify(), Some(EyeState::BothOpen));
}

#[test]
fn larger_window() {
    let mut classifier = EyeStateClassifier::new(10);
    for _ in 0..10 {
        classifier.observe(2);
    }
    for _ in 0..4 {
        classifier.observe(0);
    }
    // six twos, four zeros
    assert_eq!(classifier.len(), 10);
    assert_eq!(classifier.classify(), Some(EyeState::OneEyeOpen));
}

#[test]
fn reset_forgets_previous_session() {
    let mut classifier = filled(&[2, 2, 2, 2, 2, 2, 2]);
    classifier.reset();
    assert!(classifier.is_empty());
    assert_eq!(classifier.classify(), None);

    classifier.observe(0);
    assert_eq!(classifier.classify(), Some(EyeState::BothClosed));
}

#[test]
fn four_candidates_keep_the_two_largest() {
    // areas 50, 900, 300, 850
    let candidates = [
        Region::new(40, 3, 10, 5),
        Region::new(90, 0, 30, 30),
        Region::new(10, 2, 15, 20),
        Region::new(5, 1, 34, 25),
    ];
    let eyes = select_eyes(&candidates);
    assert_eq!(eyes.len(), 2);
    assert_eq!(eyes[0].area(), 850);
    assert_eq!(eyes[1].area(), 900);
    assert!(eyes[0].x < eyes[1].x);
}

#[test]
fn single_eye_label_follows_face_midpoint() {
    let face_width = 120;
    let left = label_eyes(EyeState::OneEyeOpen, &[Region::new(59, 0, 20, 20)], face_width);
    assert_eq!(left[0].side, EyeSide::Left);

    let right = label_eyes(EyeState::OneEyeOpen, &[Region::new(60, 0, 20, 20)], face_width);
    assert_eq!(right[0].side, EyeSide::Right);
}
