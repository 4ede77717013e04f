use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::counter::{FormState, RepCounter, RepStage};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    AcquiringCamera,
    Running,
    Paused,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

impl SessionStatus {
    /// Running or paused: the camera is held and a sampler exists.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::Paused)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub exercise: Option<String>,
    pub reps: u32,
    pub last_angle: Option<f32>,
    pub pose_detected: bool,
    pub stage: RepStage,
    /// Form for the last measured angle; `None` until one arrives.
    pub form: Option<FormState>,
    pub started_at: Option<DateTime<Utc>>,
    pub active_ms: u64,
    pub frames_processed: u64,
    pub detection_failures: u64,
    /// Active time banked before the current running window; pairs with
    /// `running_anchor` to give the live duration.
    #[serde(skip)]
    pub active_ms_baseline: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            exercise: None,
            reps: 0,
            last_angle: None,
            pose_detected: false,
            stage: RepStage::Settling,
            form: None,
            started_at: None,
            active_ms: 0,
            frames_processed: 0,
            detection_failures: 0,
            active_ms_baseline: 0,
            running_anchor: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_active_ms(&self) -> u64 {
        if let (SessionStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64)
        } else {
            self.active_ms
        }
    }

    pub fn sync_active_from_anchor(&mut self) {
        if let (SessionStatus::Running, Some(anchor)) = (self.status, self.running_anchor) {
            self.active_ms = self
                .active_ms_baseline
                .saturating_add(anchor.elapsed().as_millis() as u64);
        }
    }

    pub fn begin_session(
        &mut self,
        session_id: String,
        exercise: String,
        started_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            status: SessionStatus::Running,
            session_id: Some(session_id),
            exercise: Some(exercise),
            started_at: Some(started_at),
            running_anchor: Some(now),
            ..Self::default()
        };
    }

    pub fn pause(&mut self) {
        self.sync_active_from_anchor();
        self.status = SessionStatus::Paused;
        self.running_anchor = None;
        self.active_ms_baseline = self.active_ms;
    }

    pub fn resume(&mut self, now: Instant) {
        self.status = SessionStatus::Running;
        self.active_ms_baseline = self.active_ms;
        self.running_anchor = Some(now);
    }

    /// Per-exercise progress cleared; timing and frame counters carry on.
    pub fn switch_exercise(&mut self, exercise: String) {
        self.exercise = Some(exercise);
        self.reps = 0;
        self.last_angle = None;
        self.stage = RepStage::Settling;
        self.form = None;
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub elapsed_ms: u64,
}

/// Final account of a stopped session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub exercise: String,
    pub reps: u32,
    pub active_ms: u64,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub frames_processed: u64,
    pub detection_failures: u64,
}

/// Everything the driver and its sampler share under one lock.
#[derive(Debug, Default)]
pub(crate) struct SessionCore {
    pub state: SessionState,
    pub counter: Option<RepCounter>,
    /// Bumped whenever in-flight landmark results must be discarded.
    pub epoch: u64,
}

impl SessionCore {
    pub fn snapshot(&mut self) -> SessionSnapshot {
        self.state.sync_active_from_anchor();
        if let Some(counter) = &self.counter {
            self.state.stage = counter.stage_at(Instant::now().into_std());
        }
        SessionSnapshot {
            elapsed_ms: self.state.current_active_ms(),
            state: self.state.clone(),
        }
    }
}
