//! The 68-point facial landmark set.
//!
//! Indices follow the iBUG 68 annotation scheme the pretrained models are
//! trained against, so a landmark's meaning is fixed by its position.

use std::ops::Range;

use crate::geometry::Shape;

pub const LANDMARK_COUNT: usize = 68;

// Region index ranges.
pub const JAW: Range<usize> = 0..17;
pub const RIGHT_BROW: Range<usize> = 17..22;
pub const LEFT_BROW: Range<usize> = 22..27;
pub const NOSE: Range<usize> = 27..36;
pub const RIGHT_EYE: Range<usize> = 36..42;
pub const LEFT_EYE: Range<usize> = 42..48;
pub const OUTER_LIP: Range<usize> = 48..60;
pub const INNER_LIP: Range<usize> = 60..68;

// Inner-lip points the yawning ratio reads.
pub const INNER_LIP_LEFT: usize = 60;
pub const INNER_LIP_TOP: usize = 62;
pub const INNER_LIP_RIGHT: usize = 64;
pub const INNER_LIP_BOTTOM: usize = 66;

/// Landmarks for one face, in integer pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    points: [(i32, i32); LANDMARK_COUNT],
}

impl Landmarks {
    pub fn new(points: [(i32, i32); LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Round a predicted shape to pixel landmarks.
    ///
    /// Returns `None` when the shape does not carry exactly 68 points,
    /// which means the loaded model is not a 68-point predictor.
    pub fn from_shape(shape: &Shape) -> Option<Self> {
        if shape.len() != LANDMARK_COUNT {
            return None;
        }
        let mut points = [(0, 0); LANDMARK_COUNT];
        for (slot, p) in points.iter_mut().zip(shape.points.iter()) {
            *slot = (p.x.round() as i32, p.y.round() as i32);
        }
        Some(Self { points })
    }

    pub fn point(&self, idx: usize) -> (i32, i32) {
        self.points[idx]
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// The eight inner-lip points (indices 60..68).
    pub fn inner_lip(&self) -> &[(i32, i32)] {
        &self.points[INNER_LIP]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn regions_tile_the_index_space() {
        let regions = [
            JAW, RIGHT_BROW, LEFT_BROW, NOSE, RIGHT_EYE, LEFT_EYE, OUTER_LIP, INNER_LIP,
        ];

        let mut next = 0;
        for region in regions {
            assert_eq!(region.start, next);
            next = region.end;
        }
        assert_eq!(next, LANDMARK_COUNT);
    }

    #[test]
    fn from_shape_rounds_to_nearest_pixel() {
        let mut points = vec![Point::zero(); LANDMARK_COUNT];
        points[0] = Point::new(10.4, 10.5);
        points[1] = Point::new(-0.6, 99.49);
        let shape = Shape::new(points);

        let lm = Landmarks::from_shape(&shape).unwrap();
        assert_eq!(lm.point(0), (10, 11));
        assert_eq!(lm.point(1), (-1, 99));
    }

    #[test]
    fn from_shape_rejects_other_landmark_counts() {
        let five = Shape::new(vec![Point::zero(); 5]);
        assert!(Landmarks::from_shape(&five).is_none());
    }

    #[test]
    fn inner_lip_slice_matches_indices() {
        let mut points = [(0, 0); LANDMARK_COUNT];
        for (i, p) in points.iter_mut().enumerate() {
            *p = (i as i32, 0);
        }
        let lm = Landmarks::new(points);

        let inner = lm.inner_lip();
        assert_eq!(inner.len(), 8);
        assert_eq!(inner[0], (60, 0));
        assert_eq!(inner[7], (67, 0));
        assert_eq!(lm.point(INNER_LIP_TOP), (62, 0));
        assert_eq!(lm.point(INNER_LIP_BOTTOM), (66, 0));
    }
}
