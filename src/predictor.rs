use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::align::SimilarityTransform;
use crate::cascade::CascadeStage;
use crate::error::{Error, Result};
use crate::geometry::{FaceBox, Point, Shape};

/// An ensemble-of-regression-trees shape predictor.
///
/// The model is a mean shape plus a cascade of stages. Evaluation starts
/// from the mean shape in the face box's unit coordinates; each stage
/// samples sparse pixel intensities around the current estimate, walks its
/// trees on intensity differences, and accumulates the chosen leaf deltas.
/// The finished shape is mapped back to image pixels.
///
/// ```ignore
/// let predictor = ShapePredictor::from_path("shape_predictor_68_face_landmarks.dat")?;
/// let shape = predictor.predict(&gray, &face);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapePredictor {
    mean_shape: Shape,
    stages: Vec<CascadeStage>,
}

impl ShapePredictor {
    /// Assemble a predictor, checking the structural invariants the
    /// evaluator relies on. Violations are `Error::InvalidModel`.
    pub fn new(mean_shape: Shape, stages: Vec<CascadeStage>) -> Result<Self> {
        let n = mean_shape.len();
        if n == 0 {
            return Err(Error::InvalidModel("mean shape is empty".into()));
        }
        if stages.is_empty() {
            return Err(Error::InvalidModel(
                "cascade must have at least one stage".into(),
            ));
        }

        for (i, stage) in stages.iter().enumerate() {
            if stage.anchors.len() != stage.offsets.len() {
                return Err(Error::InvalidModel(format!(
                    "stage {}: {} anchors but {} offsets",
                    i,
                    stage.anchors.len(),
                    stage.offsets.len()
                )));
            }
            if let Some(bad) = stage.anchors.iter().find(|&&a| a as usize >= n) {
                return Err(Error::InvalidModel(format!(
                    "stage {}: anchor index {} out of range for {} landmarks",
                    i, bad, n
                )));
            }
            let features = stage.feature_count() as u32;
            for tree in &stage.trees {
                if tree.leaves.len() != tree.splits.len() + 1 {
                    return Err(Error::InvalidModel(format!(
                        "stage {}: tree has {} splits but {} leaves",
                        i,
                        tree.splits.len(),
                        tree.leaves.len()
                    )));
                }
                if tree
                    .splits
                    .iter()
                    .any(|s| s.idx1 >= features || s.idx2 >= features)
                {
                    return Err(Error::InvalidModel(format!(
                        "stage {}: split references a feature beyond table size {}",
                        i, features
                    )));
                }
                if let Some(leaf) = tree.leaves.iter().find(|l| l.len() != n) {
                    return Err(Error::InvalidModel(format!(
                        "stage {}: leaf has {} points, expected {}",
                        i,
                        leaf.len(),
                        n
                    )));
                }
            }
        }

        Ok(Self { mean_shape, stages })
    }

    pub fn landmark_count(&self) -> usize {
        self.mean_shape.len()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn mean_shape(&self) -> &Shape {
        &self.mean_shape
    }

    pub fn stages(&self) -> &[CascadeStage] {
        &self.stages
    }

    /// Predict landmark positions for a face, in image pixel coordinates.
    pub fn predict(&self, image: &GrayImage, face: &FaceBox) -> Shape {
        let mut current = self.mean_shape.clone();

        for stage in &self.stages {
            // Align the mean shape onto the current estimate so the learned
            // offsets follow the face's in-plane rotation and scale.
            let tform = SimilarityTransform::between(&self.mean_shape, &current);
            let features = sample_features(stage, image, face, &current, &tform);
            for tree in &stage.trees {
                current += tree.walk(&features);
            }
        }

        Shape::new(current.points.iter().map(|p| face.from_unit(*p)).collect())
    }

    /// Load a predictor from either the upstream `.dat` / `.dat.bz2`
    /// serialization or the native cache written by [`save`](Self::save),
    /// dispatching on the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("dat") | Some("bz2") => crate::dlib::load_dat(path),
            _ => Self::load(path),
        }
    }

    /// Load a natively encoded predictor.
    ///
    /// The decoded structure is checked as in [`new`](Self::new); a file
    /// that decodes but fails validation is `Error::InvalidModel`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let decoded: Self = bincode::deserialize(&bytes)?;
        Self::new(decoded.mean_shape, decoded.stages)
    }

    /// Save the predictor in the native encoding.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}

fn sample_features(
    stage: &CascadeStage,
    image: &GrayImage,
    face: &FaceBox,
    current: &Shape,
    tform: &SimilarityTransform,
) -> Vec<f32> {
    let mut features = Vec::with_capacity(stage.feature_count());
    for (anchor, offset) in stage.anchors.iter().zip(stage.offsets.iter()) {
        let unit = current[*anchor as usize] + tform.rotate(*offset);
        features.push(intensity_at(image, face.from_unit(unit)));
    }
    features
}

/// Nearest-pixel intensity; positions outside the image read as 0, matching
/// the upstream evaluator.
fn intensity_at(image: &GrayImage, p: Point) -> f32 {
    let x = p.x.round() as i64;
    let y = p.y.round() as i64;
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        return 0.0;
    }
    f32::from(image.get_pixel(x as u32, y as u32)[0])
}

/// Approximate iBUG 68-point mean face in unit coordinates.
///
/// Stands in for a trained initial shape in tests and examples; a real
/// model ships its own mean shape.
pub fn mean_face_68() -> Shape {
    let coords: [(f32, f32); 68] = [
        // Jaw (0-16)
        (0.08, 0.34),
        (0.09, 0.44),
        (0.11, 0.54),
        (0.13, 0.64),
        (0.17, 0.73),
        (0.23, 0.81),
        (0.31, 0.87),
        (0.40, 0.91),
        (0.50, 0.92),
        (0.60, 0.91),
        (0.69, 0.87),
        (0.77, 0.81),
        (0.83, 0.73),
        (0.87, 0.64),
        (0.89, 0.54),
        (0.91, 0.44),
        (0.92, 0.34),
        // Right eyebrow (17-21)
        (0.18, 0.25),
        (0.24, 0.21),
        (0.31, 0.20),
        (0.38, 0.22),
        (0.44, 0.25),
        // Left eyebrow (22-26)
        (0.56, 0.25),
        (0.62, 0.22),
        (0.69, 0.20),
        (0.76, 0.21),
        (0.82, 0.25),
        // Nose bridge (27-30)
        (0.50, 0.31),
        (0.50, 0.39),
        (0.50, 0.46),
        (0.50, 0.53),
        // Nose base (31-35)
        (0.42, 0.57),
        (0.46, 0.59),
        (0.50, 0.60),
        (0.54, 0.59),
        (0.58, 0.57),
        // Right eye (36-41)
        (0.23, 0.33),
        (0.27, 0.30),
        (0.33, 0.30),
        (0.37, 0.33),
        (0.33, 0.36),
        (0.27, 0.36),
        // Left eye (42-47)
        (0.63, 0.33),
        (0.67, 0.30),
        (0.73, 0.30),
        (0.77, 0.33),
        (0.73, 0.36),
        (0.67, 0.36),
        // Outer lip (48-59)
        (0.35, 0.725),
        (0.40, 0.695),
        (0.46, 0.680),
        (0.50, 0.685),
        (0.54, 0.680),
        (0.60, 0.695),
        (0.65, 0.725),
        (0.60, 0.755),
        (0.54, 0.770),
        (0.50, 0.775),
        (0.46, 0.770),
        (0.40, 0.755),
        // Inner lip (60-67)
        (0.40, 0.720),
        (0.45, 0.708),
        (0.50, 0.705),
        (0.55, 0.708),
        (0.60, 0.720),
        (0.55, 0.732),
        (0.50, 0.735),
        (0.45, 0.732),
    ];

    Shape::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{RegressionTree, Split};

    fn zero_stage(n: usize) -> CascadeStage {
        CascadeStage {
            trees: vec![RegressionTree {
                splits: Vec::new(),
                leaves: vec![Shape::new(vec![Point::zero(); n])],
            }],
            anchors: Vec::new(),
            offsets: Vec::new(),
        }
    }

    #[test]
    fn zero_delta_cascade_returns_scaled_mean_shape() {
        let mean = mean_face_68();
        let model = ShapePredictor::new(mean.clone(), vec![zero_stage(68)]).unwrap();
        assert_eq!(model.landmark_count(), 68);
        assert_eq!(model.stage_count(), 1);

        let image = GrayImage::from_fn(400, 400, |x, y| image::Luma([((x + y) % 256) as u8]));
        let face = FaceBox::new(100.0, 100.0, 200.0, 200.0);
        let shape = model.predict(&image, &face);

        assert_eq!(shape.len(), 68);
        for (got, unit) in shape.points.iter().zip(mean.points.iter()) {
            let want = face.from_unit(*unit);
            assert!((got.x - want.x).abs() < 1e-4);
            assert!((got.y - want.y).abs() < 1e-4);
        }
    }

    #[test]
    fn split_selects_leaf_from_image_intensities() {
        let mean = Shape::new(vec![Point::new(0.25, 0.5), Point::new(0.75, 0.5)]);
        let stage = CascadeStage {
            trees: vec![RegressionTree {
                splits: vec![Split {
                    idx1: 0,
                    idx2: 1,
                    threshold: 0.0,
                }],
                leaves: vec![
                    Shape::new(vec![Point::new(0.1, 0.0), Point::zero()]),
                    Shape::new(vec![Point::new(-0.1, 0.0), Point::zero()]),
                ],
            }],
            anchors: vec![0, 1],
            offsets: vec![Point::zero(), Point::zero()],
        };
        let model = ShapePredictor::new(mean, vec![stage]).unwrap();
        let face = FaceBox::new(0.0, 0.0, 100.0, 100.0);

        // Intensity rises with x: feature 0 (x=25) < feature 1 (x=75),
        // so the difference is negative and the right leaf applies.
        let rising = GrayImage::from_fn(100, 100, |x, _| image::Luma([x as u8]));
        let shape = model.predict(&rising, &face);
        assert!((shape[0].x - 15.0).abs() < 1e-3);

        // Reversed gradient takes the left branch.
        let falling = GrayImage::from_fn(100, 100, |x, _| image::Luma([(99 - x) as u8]));
        let shape = model.predict(&falling, &face);
        assert!((shape[0].x - 35.0).abs() < 1e-3);
    }

    #[test]
    fn samples_outside_image_read_zero() {
        let mean = Shape::new(vec![Point::new(0.5, 0.5), Point::new(3.0, 3.0)]);
        let stage = CascadeStage {
            trees: vec![RegressionTree {
                splits: vec![Split {
                    idx1: 0,
                    idx2: 1,
                    threshold: 0.0,
                }],
                leaves: vec![
                    Shape::new(vec![Point::new(0.0, 0.25), Point::zero()]),
                    Shape::new(vec![Point::new(0.0, -0.25), Point::zero()]),
                ],
            }],
            anchors: vec![0, 1],
            offsets: vec![Point::zero(), Point::zero()],
        };
        let model = ShapePredictor::new(mean, vec![stage]).unwrap();
        let face = FaceBox::new(0.0, 0.0, 100.0, 100.0);

        // Landmark 1 maps far outside the 100x100 image and reads 0, so the
        // difference is 128 - 0 > 0 and the left leaf applies.
        let flat = GrayImage::from_fn(100, 100, |_, _| image::Luma([128]));
        let shape = model.predict(&flat, &face);
        assert!((shape[0].y - 75.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_empty_cascade() {
        let err = ShapePredictor::new(mean_face_68(), Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn rejects_anchor_out_of_range() {
        let mut stage = zero_stage(68);
        stage.anchors = vec![68];
        stage.offsets = vec![Point::zero()];
        let err = ShapePredictor::new(mean_face_68(), vec![stage]).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn rejects_leaf_count_mismatch() {
        let mut stage = zero_stage(68);
        stage.trees[0].splits.push(Split {
            idx1: 0,
            idx2: 0,
            threshold: 0.0,
        });
        stage.anchors = vec![0];
        stage.offsets = vec![Point::zero()];
        let err = ShapePredictor::new(mean_face_68(), vec![stage]).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn save_and_load_round_trip() {
        let model = ShapePredictor::new(mean_face_68(), vec![zero_stage(68)]).unwrap();

        let path = std::env::temp_dir().join("yawncam_predictor_roundtrip.bin");
        model.save(&path).unwrap();
        let loaded = ShapePredictor::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.landmark_count(), model.landmark_count());
        assert_eq!(loaded.stage_count(), model.stage_count());
        assert_eq!(loaded.mean_shape(), model.mean_shape());
    }

    #[test]
    fn load_rejects_invalid_native_model() {
        // Decodes cleanly, but the anchor points past the two landmarks;
        // evaluating it would index out of bounds.
        let mut stage = zero_stage(2);
        stage.anchors = vec![99];
        stage.offsets = vec![Point::zero()];
        let broken = ShapePredictor {
            mean_shape: Shape::new(vec![Point::zero(); 2]),
            stages: vec![stage],
        };

        let path = std::env::temp_dir().join("yawncam_predictor_invalid.bin");
        broken.save(&path).unwrap();
        let err = ShapePredictor::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, Error::InvalidModel(_)));
    }
}
