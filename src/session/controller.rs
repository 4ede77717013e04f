use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{error, info, warn};
use tokio::{sync::Mutex, time::Instant};
use uuid::Uuid;

use crate::{
    capture::{Camera, LandmarkSource},
    counter::{ExerciseProfile, ProfileTable, RepCounter},
};

use super::{
    loop_worker::SamplerContext, sampler::SamplerController, state::SessionCore, SessionConfig,
    SessionObserver, SessionSnapshot, SessionState, SessionStatus, SessionSummary,
};

/// Drives one exercise session: camera lifecycle, sampling cadence and the
/// rep counter. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionDriver {
    core: Arc<Mutex<SessionCore>>,
    /// Held for the whole of `start`, `stop` and `reset`, so the camera is
    /// never acquired by one call while another is still releasing it.
    lifecycle: Arc<Mutex<()>>,
    camera: Arc<dyn Camera>,
    source: Arc<dyn LandmarkSource>,
    observer: Arc<dyn SessionObserver>,
    profiles: Arc<ProfileTable>,
    config: SessionConfig,
    sampler: Arc<Mutex<SamplerController>>,
}

impl SessionDriver {
    pub fn new(
        camera: Arc<dyn Camera>,
        source: Arc<dyn LandmarkSource>,
        observer: Arc<dyn SessionObserver>,
        profiles: ProfileTable,
        config: SessionConfig,
    ) -> Self {
        Self {
            core: Arc::new(Mutex::new(SessionCore::default())),
            lifecycle: Arc::new(Mutex::new(())),
            camera,
            source,
            observer,
            profiles: Arc::new(profiles),
            config,
            sampler: Arc::new(Mutex::new(SamplerController::new())),
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub async fn get_state(&self) -> SessionState {
        self.snapshot().await.state
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.core.lock().await.snapshot()
    }

    /// Acquires the camera and starts sampling. On camera failure the driver
    /// is back to idle and the error chain carries the `CameraError`. A `stop`
    /// or `reset` while the camera is being acquired cancels the start.
    pub async fn start(&self, exercise: &str) -> Result<SessionState> {
        let profile = self.lookup_profile(exercise)?;
        let _lifecycle = self.lifecycle.lock().await;

        let attempt = {
            let mut core = self.core.lock().await;
            if core.state.status != SessionStatus::Idle {
                bail!("session already active");
            }
            core.state.status = SessionStatus::AcquiringCamera;
            core.epoch = core.epoch.wrapping_add(1);
            core.epoch
        };
        self.emit_state_changed().await;

        if let Err(err) = self.camera.start().await {
            error!("camera acquisition failed: {err}");
            self.core.lock().await.state.cancel();
            self.emit_state_changed().await;
            return Err(anyhow::Error::new(err).context("failed to start session"));
        }

        let session_id = Uuid::new_v4().to_string();
        let cancelled = {
            let mut core = self.core.lock().await;
            let cancelled =
                core.epoch != attempt || core.state.status != SessionStatus::AcquiringCamera;
            if !cancelled {
                core.state.begin_session(
                    session_id.clone(),
                    exercise.to_string(),
                    Utc::now(),
                    Instant::now(),
                );
                core.counter = Some(RepCounter::new(profile, self.config.settle_cooldown));
            }
            cancelled
        };

        if cancelled {
            info!("session start cancelled while acquiring the camera");
            self.camera.stop().await;
            self.core.lock().await.state.cancel();
            self.emit_state_changed().await;
            bail!("session start cancelled");
        }

        let started = self.sampler.lock().await.start(self.sampler_context());
        if let Err(err) = started {
            error!("failed to start sampler: {err}");
            self.teardown().await;
            return Err(err);
        }

        info!("session {session_id} started for {exercise}");
        self.emit_state_changed().await;

        Ok(self.get_state().await)
    }

    pub async fn pause(&self) -> Result<SessionState> {
        {
            let mut core = self.core.lock().await;
            match core.state.status {
                SessionStatus::Running => core.state.pause(),
                SessionStatus::Paused => bail!("session already paused"),
                _ => bail!("no active session"),
            }
        }
        info!("session paused");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    pub async fn resume(&self) -> Result<SessionState> {
        {
            let mut core = self.core.lock().await;
            if core.state.status != SessionStatus::Paused {
                bail!("session not paused");
            }
            core.state.resume(Instant::now());
        }
        info!("session resumed");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// Switches the counted exercise without releasing the camera. Counter
    /// progress starts over from `Settling`.
    pub async fn set_exercise(&self, exercise: &str) -> Result<SessionState> {
        let profile = self.lookup_profile(exercise)?;

        {
            let mut guard = self.core.lock().await;
            let core = &mut *guard;
            if !core.state.status.is_active() {
                bail!("no active session");
            }
            let counter = core
                .counter
                .as_mut()
                .ok_or_else(|| anyhow!("active session has no counter"))?;
            counter.reset_with(profile);
            core.state.switch_exercise(exercise.to_string());
            // Results already in flight were measured for the old exercise.
            core.epoch = core.epoch.wrapping_add(1);
        }

        info!("exercise switched to {exercise}");
        self.emit_state_changed().await;
        Ok(self.get_state().await)
    }

    /// Stops sampling, then releases the camera. Called while the camera is
    /// still being acquired, it cancels the start and returns an error since
    /// no session began.
    pub async fn stop(&self) -> Result<SessionSummary> {
        if self.cancel_acquisition().await {
            let _lifecycle = self.lifecycle.lock().await;
            bail!("session start cancelled before the camera was ready");
        }
        let _lifecycle = self.lifecycle.lock().await;
        let stopped_at = Utc::now();

        let summary = {
            let mut core = self.core.lock().await;
            if !core.state.status.is_active() {
                bail!("no active session");
            }
            core.state.sync_active_from_anchor();

            let id = core
                .state
                .session_id
                .clone()
                .ok_or_else(|| anyhow!("missing session id"))?;
            SessionSummary {
                id,
                exercise: core.state.exercise.clone().unwrap_or_default(),
                reps: core.state.reps,
                active_ms: core.state.current_active_ms(),
                started_at: core.state.started_at.unwrap_or(stopped_at),
                stopped_at,
                frames_processed: core.state.frames_processed,
                detection_failures: core.state.detection_failures,
            }
        };

        self.teardown().await;

        info!(
            "session {} stopped: {} reps in {}ms",
            summary.id, summary.reps, summary.active_ms
        );
        Ok(summary)
    }

    /// Like `stop`, without a summary. Idle drivers are left alone, and a
    /// pending camera acquisition is cancelled.
    pub async fn reset(&self) -> Result<()> {
        let cancelling = self.cancel_acquisition().await;
        let _lifecycle = self.lifecycle.lock().await;
        if cancelling || self.core.lock().await.state.status == SessionStatus::Idle {
            return Ok(());
        }
        self.teardown().await;
        Ok(())
    }

    /// Invalidates an in-progress `start`. The starting call notices after
    /// `Camera::start` returns, releases the camera and goes back to idle.
    async fn cancel_acquisition(&self) -> bool {
        let mut core = self.core.lock().await;
        if core.state.status != SessionStatus::AcquiringCamera {
            return false;
        }
        core.epoch = core.epoch.wrapping_add(1);
        true
    }

    /// Invalidates in-flight results, joins the sampler, releases the camera
    /// and returns to idle.
    async fn teardown(&self) {
        {
            let mut core = self.core.lock().await;
            core.epoch = core.epoch.wrapping_add(1);
            core.state.cancel();
            core.counter = None;
        }

        if let Err(err) = self.sampler.lock().await.stop().await {
            warn!("sampler did not shut down cleanly: {err}");
        }
        self.camera.stop().await;

        self.emit_state_changed().await;
    }

    fn lookup_profile(&self, exercise: &str) -> Result<ExerciseProfile> {
        self.profiles
            .get(exercise)
            .copied()
            .ok_or_else(|| anyhow!("unknown exercise type: {exercise}"))
    }

    fn sampler_context(&self) -> SamplerContext {
        SamplerContext {
            core: self.core.clone(),
            camera: self.camera.clone(),
            source: self.source.clone(),
            observer: self.observer.clone(),
            config: self.config.clone(),
        }
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        self.observer.on_state_changed(&snapshot);
    }
}
