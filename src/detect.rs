//! Face detection via the SeetaFace frontal detector.

use std::path::Path;

use image::GrayImage;
use log::debug;
use rustface::{Detector, ImageData};

use crate::error::{Error, Result};
use crate::geometry::FaceBox;

/// Default minimum detectable face size in pixels.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 20;

/// Frontal face detector over grayscale frames.
pub struct FaceDetector {
    inner: Box<dyn Detector>,
}

impl FaceDetector {
    /// Load the detector model and apply the detection tuning.
    pub fn from_file<P: AsRef<Path>>(path: P, min_face_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Detector(format!("non-UTF-8 path {:?}", path)))?;
        let mut inner = rustface::create_detector(path_str)
            .map_err(|e| Error::Detector(format!("{}: {}", path.display(), e)))?;

        inner.set_min_face_size(min_face_size);
        inner.set_score_thresh(2.0);
        inner.set_pyramid_scale_factor(0.8);
        inner.set_slide_window_step(4, 4);

        debug!("loaded face detector from {}", path.display());
        Ok(Self { inner })
    }

    /// Detect faces, returning their boxes in pixel coordinates.
    pub fn detect(&mut self, gray: &GrayImage) -> Vec<FaceBox> {
        let data = ImageData::new(gray.as_raw(), gray.width(), gray.height());
        self.inner
            .detect(&data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox::new(
                    bbox.x() as f32,
                    bbox.y() as f32,
                    bbox.width() as f32,
                    bbox.height() as f32,
                )
            })
            .collect()
    }
}

/// Landmarks are only meaningful when the frame holds exactly one face;
/// zero or several detections yield nothing.
pub fn single_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    match faces {
        [only] => Some(only),
        _ => None,
    }
}
