use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, info};

use super::SessionSnapshot;

/// Receives per-sample results from the session driver. Calls arrive on the
/// sampler task, one sample at a time, and never after `stop` has returned.
pub trait SessionObserver: Send + Sync {
    fn on_angle_update(&self, angle: f32);

    /// Fired once per completed rep.
    fn on_rep_detected(&self);

    fn on_pose_detected(&self, detected: bool);

    /// Lifecycle changes and periodic heartbeats.
    fn on_state_changed(&self, _snapshot: &SessionSnapshot) {}
}

/// Observer for the command-line runner: writes everything to the log.
pub struct LoggingObserver {
    announce_reps: bool,
    reps: AtomicU32,
}

impl LoggingObserver {
    /// With `announce_reps` each rep also gets a spoken-style cue line.
    pub fn new(announce_reps: bool) -> Self {
        Self {
            announce_reps,
            reps: AtomicU32::new(0),
        }
    }
}

impl SessionObserver for LoggingObserver {
    fn on_angle_update(&self, angle: f32) {
        debug!("angle {angle:.0}°");
    }

    fn on_rep_detected(&self) {
        let rep = self.reps.fetch_add(1, Ordering::SeqCst) + 1;
        info!("rep {rep} completed");
        if self.announce_reps {
            info!("voice cue: \"{rep}\"");
        }
    }

    fn on_pose_detected(&self, detected: bool) {
        if !detected {
            debug!("no pose in frame");
        }
    }

    fn on_state_changed(&self, snapshot: &SessionSnapshot) {
        let state = &snapshot.state;
        info!(
            "session {:?}: exercise={} reps={} stage={} form={} elapsed={}ms",
            state.status,
            state.exercise.as_deref().unwrap_or("-"),
            state.reps,
            state.stage.as_str(),
            state.form.map_or("-", |form| form.as_str()),
            snapshot.elapsed_ms
        );
    }
}
