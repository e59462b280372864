//! The yawning heuristic: mouth openness as an inner-lip distance ratio.

use std::fmt;

use crate::landmarks::{
    Landmarks, INNER_LIP_BOTTOM, INNER_LIP_LEFT, INNER_LIP_RIGHT, INNER_LIP_TOP,
};

/// Mouth-opening ratio above which a face counts as yawning.
pub const YAWN_RATIO_LIMIT: f32 = 0.35;

/// Verdict for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YawnStatus {
    Yawning,
    Ok,
    NoDetect,
}

impl YawnStatus {
    /// The on-screen label.
    pub fn label(self) -> &'static str {
        match self {
            YawnStatus::Yawning => "Yawning!",
            YawnStatus::Ok => "Ok!",
            YawnStatus::NoDetect => "No Detect!",
        }
    }
}

impl fmt::Display for YawnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mouth openness: the vertical gap between the inner-lip midpoints divided
/// by the horizontal gap between the inner mouth corners.
pub fn mouth_ratio(landmarks: &Landmarks) -> f32 {
    let (_, top_y) = landmarks.point(INNER_LIP_TOP);
    let (_, bottom_y) = landmarks.point(INNER_LIP_BOTTOM);
    let (left_x, _) = landmarks.point(INNER_LIP_LEFT);
    let (right_x, _) = landmarks.point(INNER_LIP_RIGHT);

    (bottom_y - top_y) as f32 / (right_x - left_x) as f32
}

/// Apply the yawning threshold. Only a ratio strictly greater than
/// [`YAWN_RATIO_LIMIT`] counts as yawning.
pub fn classify(ratio: f32) -> YawnStatus {
    if ratio > YAWN_RATIO_LIMIT {
        YawnStatus::Yawning
    } else {
        YawnStatus::Ok
    }
}
