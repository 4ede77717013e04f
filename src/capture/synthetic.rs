use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use image::RgbImage;
use log::{debug, info};

use super::{Camera, CameraError, Frame};
use crate::pose::{JointGroup, JointTriple, Landmark, LandmarkSet, NUM_KEYPOINTS};

const SEGMENT_LENGTH: f32 = 0.2;
const LEFT_VERTEX: (f32, f32) = (0.35, 0.5);
const RIGHT_VERTEX: (f32, f32) = (0.65, 0.5);

/// In-process camera producing blank frames. Acquisition can be refused to
/// stand in for a denied permission prompt.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    active: AtomicBool,
    deny_access: AtomicBool,
    sequence: AtomicU64,
    acquisitions: AtomicU32,
    releases: AtomicU32,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            active: AtomicBool::new(false),
            deny_access: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            acquisitions: AtomicU32::new(0),
            releases: AtomicU32::new(0),
        }
    }

    pub fn set_denied(&self, denied: bool) {
        self.deny_access.store(denied, Ordering::SeqCst);
    }

    pub fn acquisition_count(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for SyntheticCamera {
    async fn start(&self) -> Result<(), CameraError> {
        if self.deny_access.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(CameraError::Unavailable("already in use".into()));
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        info!("synthetic camera started ({}x{})", self.width, self.height);
        Ok(())
    }

    async fn frame(&self) -> Result<Frame, CameraError> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(CameraError::NotStarted);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        Ok(Frame {
            image: RgbImage::new(self.width, self.height),
            sequence,
            captured_at: Utc::now(),
        })
    }

    async fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
            debug!("synthetic camera released");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Builds a full landmark set whose `group` joints measure `left_deg` and
/// `right_deg`. Every keypoint is fully visible.
pub fn synthetic_pose(group: JointGroup, left_deg: f32, right_deg: f32) -> LandmarkSet {
    let neutral = Landmark::new(0.5, 0.5).with_visibility(1.0);
    let mut set = LandmarkSet::from_slice(&[neutral; NUM_KEYPOINTS]).unwrap_or_default();

    let (left, right) = group.triples();
    place_joint(&mut set, left, LEFT_VERTEX, left_deg);
    place_joint(&mut set, right, RIGHT_VERTEX, right_deg);
    set
}

fn place_joint(set: &mut LandmarkSet, triple: JointTriple, vertex: (f32, f32), angle_deg: f32) {
    // Proximal segment points straight up; the distal one is rotated from it.
    let distal_direction = (angle_deg - 90.0).to_radians();

    set[triple.vertex].x = vertex.0;
    set[triple.vertex].y = vertex.1;
    set[triple.proximal].x = vertex.0;
    set[triple.proximal].y = vertex.1 - SEGMENT_LENGTH;
    set[triple.distal].x = vertex.0 + SEGMENT_LENGTH * distal_direction.cos();
    set[triple.distal].y = vertex.1 + SEGMENT_LENGTH * distal_direction.sin();
}
