//! Capabilities the session driver depends on: a camera that yields frames
//! and a landmark source that turns a frame into a pose.

mod scripted;
mod simulated;
mod synthetic;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::RgbImage;

use crate::pose::LandmarkSet;

pub use scripted::{ScriptedLandmarkSource, ScriptedResult};
pub use simulated::SimulatedLandmarkSource;
pub use synthetic::{synthetic_pose, SyntheticCamera};

#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("camera has not been started")]
    NotStarted,
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquires the device. Failure here is terminal for a session start.
    async fn start(&self) -> Result<(), CameraError>;

    /// Latest frame from an acquired device.
    async fn frame(&self) -> Result<Frame, CameraError>;

    /// Releases the device. Safe to call when not started.
    async fn stop(&self);

    fn is_active(&self) -> bool;
}

/// Pose estimator. `Ok(None)` is the normal "no pose in this frame" result;
/// `Err` is a failed inference.
#[async_trait]
pub trait LandmarkSource: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Option<LandmarkSet>>;
}
