//! Least-squares similarity alignment between landmark shapes.
//!
//! Each cascade stage aligns the model's mean shape to the current shape
//! estimate so that the learned feature offsets rotate and scale with the
//! face. Only rotation, uniform scale, and translation are recovered.

use crate::geometry::{Point, Shape};

/// A 2D similarity transform `p -> m * p + t`.
///
/// `m` is a scaled rotation matrix, so the transform preserves angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    pub m: [[f32; 2]; 2],
    pub t: Point,
}

impl SimilarityTransform {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0], [0.0, 1.0]],
            t: Point::zero(),
        }
    }

    /// Least-squares similarity transform taking `from` onto `to`.
    ///
    /// Solves for the scaled rotation `[[a, -b], [b, a]]` and translation
    /// minimizing the summed squared residual over corresponding points.
    /// With centered point sets the optimum has the closed form
    /// `a = sum(f . t) / sum(|f|^2)` and `b = sum(f x t) / sum(|f|^2)`.
    /// Degenerate inputs (all points coincident) yield the identity.
    pub fn between(from: &Shape, to: &Shape) -> Self {
        debug_assert_eq!(from.len(), to.len());
        if from.is_empty() {
            return Self::identity();
        }

        let mean_from = from.mean();
        let mean_to = to.mean();

        let mut dot = 0.0f32;
        let mut cross = 0.0f32;
        let mut norm = 0.0f32;
        for (f, t) in from.points.iter().zip(to.points.iter()) {
            let f = *f - mean_from;
            let t = *t - mean_to;
            dot += f.x * t.x + f.y * t.y;
            cross += f.x * t.y - f.y * t.x;
            norm += f.x * f.x + f.y * f.y;
        }
        if norm == 0.0 {
            return Self::identity();
        }

        let a = dot / norm;
        let b = cross / norm;
        let m = [[a, -b], [b, a]];
        let rotated_mean = Point::new(
            m[0][0] * mean_from.x + m[0][1] * mean_from.y,
            m[1][0] * mean_from.x + m[1][1] * mean_from.y,
        );
        let t = mean_to - rotated_mean;

        Self { m, t }
    }

    /// Apply only the linear part (rotation and scale), ignoring translation.
    ///
    /// Feature offsets are displacement vectors, so they rotate and scale
    /// with the shape but do not translate.
    pub fn rotate(&self, p: Point) -> Point {
        Point::new(
            self.m[0][0] * p.x + self.m[0][1] * p.y,
            self.m[1][0] * p.x + self.m[1][1] * p.y,
        )
    }

    /// Apply the full transform.
    pub fn apply(&self, p: Point) -> Point {
        self.rotate(p) + self.t
    }
}
