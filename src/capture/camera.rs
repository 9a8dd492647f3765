//! Camera discovery and frame capture.
//!
//! Probes the available devices, prefers the one with the highest advertised
//! resolution, then requests a moderate capture format so recognition keeps
//! up with the stream.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{query, Camera};

use crate::config::ScanConfig;

/// Anything the orchestrator can pull frames from.
///
/// A `read_frame` error means the source stopped delivering frames and is
/// fatal to the capture loop.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<RgbImage>;
}

/// A physical webcam, exclusively owned for the lifetime of a session.
/// The stream is released on drop.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    /// Probes available cameras, opens the best one and starts the stream.
    ///
    /// Fails when no camera is detected or the selected device cannot
    /// deliver frames; both are fatal to the session.
    pub fn open(config: &ScanConfig) -> Result<Self> {
        let index = find_best_camera()?;

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.camera_width, config.camera_height),
                FrameFormat::MJPEG,
                config.camera_fps,
            ),
        ));

        let mut camera =
            Camera::new(index, requested).context("failed to open selected camera")?;
        camera
            .open_stream()
            .context("failed to start camera stream")?;

        // Probe one frame up front so a dead device fails the session here
        // instead of mid-loop.
        let test = camera
            .frame()
            .context("camera opened but cannot read frames")?;
        test.decode_image::<RgbFormat>()
            .context("camera delivers undecodable frames")?;

        let resolution = camera.resolution();
        crate::log(&format!(
            "Camera configured: {} at {}x{}",
            camera.info().human_name(),
            resolution.width(),
            resolution.height()
        ));

        Ok(Self { camera })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<RgbImage> {
        let buffer = self
            .camera
            .frame()
            .context("camera stopped delivering frames")?;
        let frame = buffer
            .decode_image::<RgbFormat>()
            .context("failed to decode camera frame")?;
        Ok(frame)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if self.camera.is_stream_open() {
            let _ = self.camera.stop_stream();
        }
        crate::log("Camera released");
    }
}

/// Enumerates cameras and returns the index of the one with the highest
/// advertised resolution.
fn find_best_camera() -> Result<CameraIndex> {
    let infos = query(ApiBackend::Auto).context("camera enumeration failed")?;

    if infos.is_empty() {
        return Err(anyhow!("no camera detected"));
    }

    let mut best: Option<(CameraIndex, u32)> = None;

    for info in &infos {
        // Opening at the highest supported resolution tells us what the
        // device is actually capable of; some enumerated devices fail here
        // and are skipped.
        let probe = Camera::new(
            info.index().clone(),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
        );

        let camera = match probe {
            Ok(camera) => camera,
            Err(e) => {
                crate::log(&format!(
                    "Camera {} ({}) not usable: {}",
                    info.index(),
                    info.human_name(),
                    e
                ));
                continue;
            }
        };

        let resolution = camera.resolution();
        let area = resolution.width() * resolution.height();
        crate::log(&format!(
            "Camera {} ({}): {}x{}",
            info.index(),
            info.human_name(),
            resolution.width(),
            resolution.height()
        ));

        if best.as_ref().map(|&(_, a)| area > a).unwrap_or(true) {
            best = Some((info.index().clone(), area));
        }
    }

    best.map(|(index, _)| index)
        .ok_or_else(|| anyhow!("no usable camera found"))
}
