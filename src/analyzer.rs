//! Per-frame analysis: detection, landmark extraction, classification.

use std::path::Path;

use image::GrayImage;
use log::info;

use crate::detect::{single_face, FaceDetector};
use crate::error::{Error, Result};
use crate::geometry::FaceBox;
use crate::landmarks::{Landmarks, LANDMARK_COUNT};
use crate::predictor::ShapePredictor;
use crate::yawn::{classify, mouth_ratio, YawnStatus};

/// Everything derived from one frame.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Raw detection count, before the single-face gate.
    pub faces: usize,
    /// The accepted face box, present iff exactly one face was detected.
    pub face: Option<FaceBox>,
    pub landmarks: Option<Landmarks>,
    pub ratio: Option<f32>,
    pub status: YawnStatus,
}

/// Detector and shape predictor bundled for frame-by-frame use.
///
/// Both models load once at startup; per-frame calls only borrow the frame.
pub struct YawnAnalyzer {
    detector: FaceDetector,
    predictor: ShapePredictor,
}

impl YawnAnalyzer {
    /// Bundle an already-loaded detector and predictor.
    ///
    /// The predictor must be a 68-point model, since the yawning ratio
    /// reads fixed inner-lip indices.
    pub fn new(detector: FaceDetector, predictor: ShapePredictor) -> Result<Self> {
        if predictor.landmark_count() != LANDMARK_COUNT {
            return Err(Error::InvalidModel(format!(
                "expected a {}-point landmark model, found {} points",
                LANDMARK_COUNT,
                predictor.landmark_count()
            )));
        }
        Ok(Self {
            detector,
            predictor,
        })
    }

    /// Load both models from disk.
    pub fn from_files<P, Q>(
        detector_path: P,
        predictor_path: Q,
        min_face_size: u32,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let detector = FaceDetector::from_file(detector_path, min_face_size)?;
        let predictor = ShapePredictor::from_path(predictor_path.as_ref())?;
        info!(
            "models ready: {} landmarks, {} cascade stages",
            predictor.landmark_count(),
            predictor.stage_count()
        );
        Self::new(detector, predictor)
    }

    /// Landmarks for the frame, present iff exactly one face is detected.
    ///
    /// Zero faces or several faces yield `None`; neither is an error.
    pub fn landmarks(&mut self, gray: &GrayImage) -> Option<Landmarks> {
        self.analyze(gray).landmarks
    }

    /// Run the full pipeline on one frame.
    pub fn analyze(&mut self, gray: &GrayImage) -> Analysis {
        let faces = self.detector.detect(gray);
        let face = single_face(&faces).copied();
        let landmarks = face
            .and_then(|face| Landmarks::from_shape(&self.predictor.predict(gray, &face)));

        match landmarks {
            Some(lm) => {
                let ratio = mouth_ratio(&lm);
                Analysis {
                    faces: faces.len(),
                    face,
                    landmarks: Some(lm),
                    ratio: Some(ratio),
                    status: classify(ratio),
                }
            }
            None => Analysis {
                faces: faces.len(),
                face,
                landmarks: None,
                ratio: None,
                status: YawnStatus::NoDetect,
            },
        }
    }
}
