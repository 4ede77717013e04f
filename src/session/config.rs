use std::time::Duration;

use crate::counter::DEFAULT_SETTLE_COOLDOWN;

/// Tunables for the session driver.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gap between landmark requests, independent of the camera frame rate.
    pub sample_interval: Duration,

    /// How long the counter reads `Extended` after a rep before settling.
    pub settle_cooldown: Duration,

    /// A landmark request slower than this counts as a failed sample.
    pub landmark_timeout: Duration,

    /// Joint sides with a keypoint scored below this are ignored.
    pub min_visibility: f32,

    /// Processed samples between `on_state_changed` heartbeats.
    pub heartbeat_every_ticks: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(100),
            settle_cooldown: DEFAULT_SETTLE_COOLDOWN,
            landmark_timeout: Duration::from_secs(2),
            min_visibility: 0.0,
            heartbeat_every_ticks: 10,
        }
    }
}

impl SessionConfig {
    /// Defaults, with `REPCOUNT_DEBUG` forcing a heartbeat every sample.
    pub fn from_env() -> Self {
        let debug_mode = std::env::var("REPCOUNT_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
            ..Self::default()
        }
    }
}
