use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::Mutex,
    time::{timeout, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{Camera, LandmarkSource},
    counter::RepEvent,
    pose::LandmarkSet,
};

use super::{
    state::SessionCore, SessionConfig, SessionObserver, SessionSnapshot, SessionStatus,
};

// Set to false to silence this module's logging
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub(crate) struct SamplerContext {
    pub core: Arc<Mutex<SessionCore>>,
    pub camera: Arc<dyn Camera>,
    pub source: Arc<dyn LandmarkSource>,
    pub observer: Arc<dyn SessionObserver>,
    pub config: SessionConfig,
}

/// Outputs of one accepted sample, delivered after the lock is released.
struct SampleOutput {
    pose_detected: bool,
    angle: Option<f32>,
    rep: Option<RepEvent>,
    heartbeat: Option<SessionSnapshot>,
}

pub(crate) async fn sampling_loop(ctx: SamplerContext, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut processed_ticks: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down");
                break;
            }
        }

        let Some(epoch) = running_epoch(&ctx).await else {
            continue;
        };

        // Awaited in place: no new request goes out while this one is pending.
        let outcome = tokio::select! {
            outcome = detect_landmarks(&ctx) => outcome,
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop cancelled with a landmark request in flight");
                break;
            }
        };

        let Some(output) = apply_sample(&ctx, epoch, outcome, &mut processed_ticks).await else {
            continue;
        };

        ctx.observer.on_pose_detected(output.pose_detected);
        if let Some(angle) = output.angle {
            ctx.observer.on_angle_update(angle);
        }
        if let Some(event) = output.rep {
            log_info!("rep {} completed at {:.0}°", event.rep, event.angle);
            ctx.observer.on_rep_detected();
        }
        if let Some(snapshot) = output.heartbeat {
            ctx.observer.on_state_changed(&snapshot);
        }
    }
}

/// Epoch of a running session, or `None` while paused or winding down.
async fn running_epoch(ctx: &SamplerContext) -> Option<u64> {
    let core = ctx.core.lock().await;
    (core.state.status == SessionStatus::Running).then_some(core.epoch)
}

async fn detect_landmarks(ctx: &SamplerContext) -> Result<Option<LandmarkSet>> {
    let frame = ctx.camera.frame().await.context("frame grab failed")?;

    match timeout(ctx.config.landmark_timeout, ctx.source.detect(&frame)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "landmark detection timed out after {}ms",
            ctx.config.landmark_timeout.as_millis()
        )),
    }
}

async fn apply_sample(
    ctx: &SamplerContext,
    epoch: u64,
    outcome: Result<Option<LandmarkSet>>,
    processed_ticks: &mut u32,
) -> Option<SampleOutput> {
    let failed = outcome.is_err();
    let landmarks = outcome.unwrap_or_else(|err| {
        log_warn!("landmark sample failed, treating as no pose: {err:#}");
        None
    });

    let now = Instant::now();
    let mut guard = ctx.core.lock().await;
    let core = &mut *guard;

    if core.epoch != epoch || core.state.status != SessionStatus::Running {
        log_debug!("discarding landmark result from a superseded sample");
        return None;
    }

    core.state.frames_processed += 1;
    if failed {
        core.state.detection_failures += 1;
    }
    core.state.pose_detected = landmarks.is_some();

    let mut angle = None;
    let mut rep = None;
    if let (Some(set), Some(counter)) = (landmarks, core.counter.as_mut()) {
        angle = counter
            .profile()
            .joint_group
            .angle(&set, ctx.config.min_visibility);

        if let Some(value) = angle {
            rep = counter.feed(value, now.into_std());
            core.state.last_angle = Some(value);
            core.state.form = Some(counter.profile().form_at(value));
            core.state.reps = counter.reps();
        }
    }

    if let Some(counter) = &core.counter {
        core.state.stage = counter.stage_at(now.into_std());
    }

    *processed_ticks = processed_ticks.wrapping_add(1);
    let heartbeat = (ctx.config.heartbeat_every_ticks > 0
        && *processed_ticks % ctx.config.heartbeat_every_ticks == 0)
        .then(|| core.snapshot());

    Some(SampleOutput {
        pose_detected: landmarks.is_some(),
        angle,
        rep,
        heartbeat,
    })
}
