use std::time::{Duration, Instant};

use super::{ExerciseProfile, RepEvent, RepStage};

/// How long the counter reads `Extended` after a rep before settling.
pub const DEFAULT_SETTLE_COOLDOWN: Duration = Duration::from_millis(300);

/// Debounced flex/extend counter for a single joint angle stream.
#[derive(Debug, Clone)]
pub struct RepCounter {
    profile: ExerciseProfile,
    cooldown: Duration,
    stage: RepStage,
    reps: u32,
    last_rep_at: Option<Instant>,
    /// When set, `Extended` reverts to `Settling` at this instant.
    settle_at: Option<Instant>,
}

impl RepCounter {
    pub fn new(profile: ExerciseProfile, cooldown: Duration) -> Self {
        Self {
            profile,
            cooldown,
            stage: RepStage::Settling,
            reps: 0,
            last_rep_at: None,
            settle_at: None,
        }
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// Stage as of `now`, with any elapsed cool-down applied.
    pub fn stage_at(&self, now: Instant) -> RepStage {
        if self.cooldown_elapsed(now) {
            RepStage::Settling
        } else {
            self.stage
        }
    }

    /// Feeds one angle sample; returns the event when it completes a rep.
    pub fn feed(&mut self, angle: f32, now: Instant) -> Option<RepEvent> {
        if self.cooldown_elapsed(now) {
            self.stage = RepStage::Settling;
            self.settle_at = None;
        }

        if angle < self.profile.flex_threshold && self.stage != RepStage::Flexed {
            self.stage = RepStage::Flexed;
            // A new flex supersedes the pending settle.
            self.settle_at = None;
            return None;
        }

        if angle > self.profile.extend_threshold
            && self.stage == RepStage::Flexed
            && self.gap_elapsed(now)
        {
            self.stage = RepStage::Extended;
            self.reps += 1;
            self.last_rep_at = Some(now);
            self.settle_at = Some(now + self.cooldown);
            return Some(RepEvent {
                rep: self.reps,
                angle,
                at: now,
            });
        }

        None
    }

    /// Back to the neutral baseline with a zero count.
    pub fn reset(&mut self) {
        self.stage = RepStage::Settling;
        self.reps = 0;
        self.last_rep_at = None;
        self.settle_at = None;
    }

    pub fn reset_with(&mut self, profile: ExerciseProfile) {
        self.profile = profile;
        self.reset();
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        matches!(
            (self.stage, self.settle_at),
            (RepStage::Extended, Some(settle_at)) if now >= settle_at
        )
    }

    fn gap_elapsed(&self, now: Instant) -> bool {
        self.last_rep_at
            .map(|last| now.saturating_duration_since(last) > self.profile.min_rep_gap())
            .unwrap_or(true)
    }
}
