use crate::classifier::EyeState;
use opencv::core::Rect;
use std::fmt;

/// Most eye regions kept per face.
pub const MAX_EYES: usize = 2;

/// Axis aligned rectangle in frame (or band) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Shift by the origin of the region this one was detected in.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// The band of a face region searched for eyes: 15% to 60% of the face height.
    pub fn eye_band(&self) -> Self {
        let top = (f64::from(self.height) * 0.15) as i32;
        let height = (f64::from(self.height) * 0.45) as i32;
        Self::new(self.x, self.y + top, self.width, height)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }
}

impl From<Region> for Rect {
    fn from(region: Region) -> Self {
        Rect::new(region.x, region.y, region.width, region.height)
    }
}

/// Which of the user's eyes a region is.
///
/// Frames are mirrored before detection, so the region closer to the left
/// edge of the image is the user's left eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    /// Side of a single eye relative to the horizontal midpoint of the face.
    /// `eye_x` is relative to the face's left edge.
    pub fn from_position(eye_x: i32, face_width: i32) -> Self {
        if f64::from(eye_x) < f64::from(face_width) / 2.0 {
            EyeSide::Left
        } else {
            EyeSide::Right
        }
    }
}

impl fmt::Display for EyeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EyeSide::Left => write!(f, "Left"),
            EyeSide::Right => write!(f, "Right"),
        }
    }
}

/// Keep at most two eye candidates, ordered left to right.
///
/// When there are more than two the two with the largest area win. Small
/// detections are usually eyebrows or glasses frames.
pub fn select_eyes(candidates: &[Region]) -> Vec<Region> {
    let mut eyes = candidates.to_vec();
    eyes.sort_by_key(|eye| eye.x);
    if eyes.len() > MAX_EYES {
        // stable sort keeps the left-most of equal areas
        eyes.sort_by_key(|eye| std::cmp::Reverse(eye.area()));
        eyes.truncate(MAX_EYES);
        eyes.sort_by_key(|eye| eye.x);
    }
    eyes
}

/// An eye region with the side it was judged to be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledEye {
    pub region: Region,
    pub side: EyeSide,
}

/// Label this frame's selected eyes (already ordered left to right) for a
/// smoothed state.
///
/// Nothing is labelled while both eyes are closed. With one eye open only the
/// first region is used and its side comes from the face midpoint. With both
/// open the left-most region is `Left` and the next `Right`; a lone region
/// falls back to the midpoint rule.
pub fn label_eyes(state: EyeState, eyes: &[Region], face_width: i32) -> Vec<LabeledEye> {
    let by_midpoint = |region: &Region| LabeledEye {
        region: *region,
        side: EyeSide::from_position(region.x, face_width),
    };
    match (state, eyes) {
        (EyeState::BothClosed, _) | (_, []) => Vec::new(),
        (EyeState::OneEyeOpen, [first, ..]) | (EyeState::BothOpen, [first]) => {
            vec![by_midpoint(first)]
        }
        (EyeState::BothOpen, [left, right, ..]) => vec![
            LabeledEye {
                region: *left,
                side: EyeSide::Left,
            },
            LabeledEye {
                region: *right,
                side: EyeSide::Right,
            },
        ],
    }
}
