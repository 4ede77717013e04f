use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Stage of the rep cycle for the tracked joint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RepStage {
    /// Limb straight, the starting position. Held briefly after a counted rep.
    Extended,
    /// Limb curled past the flex threshold.
    Flexed,
    /// Neutral baseline before the first classification and after a rep's
    /// cool-down.
    Settling,
}

impl Default for RepStage {
    fn default() -> Self {
        RepStage::Settling
    }
}

impl RepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepStage::Extended => "extended",
            RepStage::Flexed => "flexed",
            RepStage::Settling => "settling",
        }
    }
}

/// How the last measured angle sits against the profile thresholds. Past
/// either threshold is `Good`; in between is `Ok`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FormState {
    Good,
    Ok,
}

impl FormState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormState::Good => "good",
            FormState::Ok => "ok",
        }
    }
}

/// Emitted once per completed flex-then-extend cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepEvent {
    /// Running count including this rep.
    pub rep: u32,
    pub angle: f32,
    pub at: Instant,
}
