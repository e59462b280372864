//! # yawncam
//!
//! Watches a camera feed and decides, frame by frame, whether the person in
//! view is yawning.
//!
//! Each frame runs a fixed pipeline:
//!
//! 1. detect faces with the SeetaFace frontal detector,
//! 2. when exactly one face is present, extract the 68 iBUG landmarks with
//!    an ensemble-of-regression-trees shape predictor loaded from the
//!    pretrained dlib `.dat` model,
//! 3. reduce the inner lip to a single openness ratio and compare it
//!    against [`YAWN_RATIO_LIMIT`],
//! 4. draw the verdict and lip markers onto the frame.
//!
//! The predictor implements the evaluation side of "One Millisecond Face
//! Alignment with an Ensemble of Regression Trees" (Kazemi & Sullivan,
//! 2014): starting from the model's mean shape, each cascade stage samples
//! sparse pixel intensity differences at shape-relative positions and
//! accumulates the regression-tree deltas they select.
//!
//! ## Quick start
//!
//! ```rust
//! use yawncam::{
//!     classify, mean_face_68, mouth_ratio, CascadeStage, FaceBox, Landmarks, Point,
//!     RegressionTree, Shape, ShapePredictor, YawnStatus,
//! };
//!
//! // A trained model normally comes from disk:
//! //   let predictor = ShapePredictor::from_path("shape_predictor_68_face_landmarks.dat")?;
//! // This stand-in keeps every landmark on the mean face.
//! let stage = CascadeStage {
//!     trees: vec![RegressionTree {
//!         splits: Vec::new(),
//!         leaves: vec![Shape::new(vec![Point::zero(); 68])],
//!     }],
//!     anchors: Vec::new(),
//!     offsets: Vec::new(),
//! };
//! let predictor = ShapePredictor::new(mean_face_68(), vec![stage]).unwrap();
//!
//! let frame = image::GrayImage::from_fn(640, 480, |x, y| image::Luma([((x + y) % 256) as u8]));
//! let face = FaceBox::new(200.0, 120.0, 240.0, 240.0);
//!
//! let shape = predictor.predict(&frame, &face);
//! let landmarks = Landmarks::from_shape(&shape).unwrap();
//! assert_eq!(classify(mouth_ratio(&landmarks)), YawnStatus::Ok);
//! ```
//!
//! Binaries: `yawncam` analyzes a single image file, `yawncam-live` runs
//! the camera monitor, and `yawncam-convert` inspects model files and
//! writes the native model cache.

pub mod dlib;
pub mod landmarks;

mod align;
mod analyzer;
#[cfg(feature = "live")]
mod camera;
mod cascade;
mod detect;
mod error;
mod geometry;
mod overlay;
mod predictor;
mod yawn;

pub use align::SimilarityTransform;
pub use analyzer::{Analysis, YawnAnalyzer};
#[cfg(feature = "live")]
pub use camera::CameraStream;
pub use cascade::{CascadeStage, RegressionTree, Split};
pub use detect::{single_face, FaceDetector, DEFAULT_MIN_FACE_SIZE};
pub use error::{Error, Result};
pub use geometry::{FaceBox, Point, Shape};
pub use landmarks::Landmarks;
pub use overlay::{mark_inner_lip, outline_face, LIP_MARKER_RADIUS};
pub use predictor::{mean_face_68, ShapePredictor};
pub use yawn::{classify, mouth_ratio, YawnStatus, YAWN_RATIO_LIMIT};
