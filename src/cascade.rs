use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Shape};

/// A split node comparing the difference of two sampled pixel intensities.
///
/// `idx1` and `idx2` index into the owning stage's feature table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Split {
    pub idx1: u32,
    pub idx2: u32,
    pub threshold: f32,
}

/// A regression tree stored as an implicit complete binary tree.
///
/// `splits[0]` is the root and node `i` branches to `2i+1` / `2i+2`; an
/// index past the split array addresses a leaf, so leaf `k` sits at node
/// `splits.len() + k`. A tree with `n` splits carries `n + 1` leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub splits: Vec<Split>,
    pub leaves: Vec<Shape>,
}

impl RegressionTree {
    /// Walk the tree over a stage's feature table and return the leaf delta.
    ///
    /// Upstream convention: a difference strictly greater than the threshold
    /// takes the left branch.
    pub fn walk(&self, features: &[f32]) -> &Shape {
        let mut node = 0usize;
        while node < self.splits.len() {
            let split = &self.splits[node];
            let diff = features[split.idx1 as usize] - features[split.idx2 as usize];
            node = if diff > split.threshold {
                2 * node + 1
            } else {
                2 * node + 2
            };
        }
        &self.leaves[node - self.splits.len()]
    }
}

/// One cascade level: its regression trees plus the feature sampling table.
///
/// `anchors[i]` names the landmark anchoring feature `i`, and `offsets[i]`
/// is the displacement from that landmark in the mean shape's unit
/// coordinates. Every tree in the stage reads from the same table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeStage {
    pub trees: Vec<RegressionTree>,
    pub anchors: Vec<u32>,
    pub offsets: Vec<Point>,
}

impl CascadeStage {
    pub fn feature_count(&self) -> usize {
        self.anchors.len()
    }
}
