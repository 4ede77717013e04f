use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{Frame, LandmarkSource};
use crate::pose::LandmarkSet;

#[derive(Debug, Clone)]
pub enum ScriptedResult {
    Pose(LandmarkSet),
    NoPose,
    Fail(String),
}

/// Replays a queue of per-frame results. Once the queue runs dry every frame
/// reports no pose.
pub struct ScriptedLandmarkSource {
    queue: Mutex<VecDeque<ScriptedResult>>,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedLandmarkSource {
    pub fn new(results: impl IntoIterator<Item = ScriptedResult>) -> Self {
        Self {
            queue: Mutex::new(results.into_iter().collect()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every detection sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, result: ScriptedResult) {
        self.lock_queue().push_back(result);
    }

    pub fn extend(&self, results: impl IntoIterator<Item = ScriptedResult>) {
        self.lock_queue().extend(results);
    }

    pub fn remaining(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedResult>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LandmarkSource for ScriptedLandmarkSource {
    async fn detect(&self, _frame: &Frame) -> Result<Option<LandmarkSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.lock_queue().pop_front();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match next {
            Some(ScriptedResult::Pose(set)) => Ok(Some(set)),
            Some(ScriptedResult::NoPose) | None => Ok(None),
            Some(ScriptedResult::Fail(message)) => Err(anyhow!(message)),
        }
    }
}
