//! Camera capture functionality.
//!
//! This module provides:
//! - Camera discovery and selection (`CameraSource::open`)
//! - The `FrameSource` seam the orchestrator pulls frames through

pub mod camera;

pub use camera::{CameraSource, FrameSource};
