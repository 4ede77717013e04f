//! Demo-only landmark source.
//!
//! Sweeps the chosen joint group through a sine wave so the binary has
//! something to count without a pose model. This is placeholder motion, not a
//! detection algorithm.

use std::{f32::consts::TAU, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tokio::time::Instant;

use super::{synthetic_pose, Frame, LandmarkSource};
use crate::pose::{JointGroup, LandmarkSet};

const CENTER_DEG: f32 = 95.0;
const AMPLITUDE_DEG: f32 = 75.0;
const JITTER_DEG: f32 = 3.0;
const DEFAULT_PERIOD: Duration = Duration::from_secs(4);
/// Share of frames reported as "no pose", to exercise the missing-pose path.
const DROPOUT_RATE: f64 = 0.05;

pub struct SimulatedLandmarkSource {
    group: JointGroup,
    period: Duration,
    started: Instant,
}

impl SimulatedLandmarkSource {
    pub fn new(group: JointGroup) -> Self {
        Self {
            group,
            period: DEFAULT_PERIOD,
            started: Instant::now(),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    fn angle_at(&self, now: Instant) -> f32 {
        let period = self.period.as_secs_f32().max(f32::EPSILON);
        let phase = (now.duration_since(self.started).as_secs_f32() % period) / period;
        // Start fully extended and flex through the middle of each cycle.
        CENTER_DEG + AMPLITUDE_DEG * (phase * TAU).cos()
    }
}

#[async_trait]
impl LandmarkSource for SimulatedLandmarkSource {
    async fn detect(&self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        let (dropout, jitter_left, jitter_right) = sample_noise();
        if dropout {
            return Ok(None);
        }

        let angle = self.angle_at(Instant::now());
        let left = (angle + jitter_left).clamp(0.0, 180.0);
        let right = (angle + jitter_right).clamp(0.0, 180.0);
        Ok(Some(synthetic_pose(self.group, left, right)))
    }
}

fn sample_noise() -> (bool, f32, f32) {
    let mut rng = rand::thread_rng();
    (
        rng.gen_bool(DROPOUT_RATE),
        rng.gen_range(-JITTER_DEG..=JITTER_DEG),
        rng.gen_range(-JITTER_DEG..=JITTER_DEG),
    )
}
