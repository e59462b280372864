//! Camera capture, read synchronously by the frame loop.

use image::RgbaImage;
use log::{info, warn};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::error::{Error, Result};

/// A camera device held open for the lifetime of the program.
///
/// Frames are pulled with a blocking call from the loop that consumes them;
/// there is no capture thread. The stream is released on drop.
pub struct CameraStream {
    camera: Camera,
}

impl CameraStream {
    /// Open the device at `index`.
    ///
    /// Detection cost grows quickly with frame size, so a monitor-friendly
    /// 640x480 format is requested first, with the device default as
    /// fallback.
    pub fn open(index: u32) -> Result<Self> {
        let index = CameraIndex::Index(index);
        let preferred = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(640, 480),
        ));

        let mut camera = match Camera::new(index.clone(), preferred) {
            Ok(camera) => camera,
            Err(e) => {
                warn!("camera rejected the 640x480 request: {}", e);
                let fallback = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                Camera::new(index, fallback).map_err(|e| Error::Camera(e.to_string()))?
            }
        };

        camera
            .open_stream()
            .map_err(|e| Error::Camera(e.to_string()))?;
        info!(
            "camera open: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );
        Ok(Self { camera })
    }

    /// Block until the next frame arrives and decode it to RGBA.
    pub fn grab(&mut self) -> Result<RgbaImage> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| Error::Camera(e.to_string()))?;
        frame
            .decode_image::<RgbAFormat>()
            .map_err(|e| Error::Camera(e.to_string()))
    }

    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }

    /// Names of the attached capture devices, by index.
    pub fn list() -> Vec<(u32, String)> {
        match nokhwa::query(ApiBackend::Auto) {
            Ok(devices) => devices
                .iter()
                .enumerate()
                .map(|(idx, info)| (idx as u32, info.human_name().to_string()))
                .collect(),
            Err(e) => {
                warn!("camera enumeration failed: {}", e);
                Vec::new()
            }
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("failed to stop camera stream: {}", e);
        }
    }
}
