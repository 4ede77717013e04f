pub mod capture;
pub mod counter;
pub mod pose;
pub mod session;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};

use capture::{SimulatedLandmarkSource, SyntheticCamera};
use session::{LoggingObserver, SessionConfig, SessionDriver};
use settings::SettingsStore;

const DEFAULT_SETTINGS_PATH: &str = "repcount-settings.json";
const DEFAULT_DURATION_SECS: u64 = 10;

/// Runs one demo session against the synthetic camera and the simulated
/// landmark source, logging reps as they land.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("repcount starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_demo_session())
}

async fn run_demo_session() -> Result<()> {
    let settings_path = std::env::var("REPCOUNT_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = SettingsStore::new(settings_path)?;

    let exercise = std::env::var("REPCOUNT_EXERCISE").unwrap_or_else(|_| settings.default_exercise());
    let duration = std::env::var("REPCOUNT_DURATION_SECS")
        .ok()
        .and_then(|value| match value.parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(err) => {
                warn!("ignoring REPCOUNT_DURATION_SECS={value}: {err}");
                None
            }
        })
        .unwrap_or(DEFAULT_DURATION_SECS);

    let profiles = settings.profile_table();
    let group = profiles
        .get(&exercise)
        .map(|profile| profile.joint_group)
        .with_context(|| format!("unknown exercise type: {exercise}"))?;

    let camera = Arc::new(SyntheticCamera::new(640, 480));
    // Demo motion only; a real deployment plugs a pose model in here.
    let source = Arc::new(SimulatedLandmarkSource::new(group));
    let observer = Arc::new(LoggingObserver::new(settings.audio_feedback().enabled));

    let driver = SessionDriver::new(camera, source, observer, profiles, SessionConfig::from_env());

    driver.start(&exercise).await?;
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(duration)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted, stopping session"),
    }
    let summary = driver.stop().await?;

    info!(
        "{} reps of {} in {:.1}s ({} frames, {} failed detections)",
        summary.reps,
        summary.exercise,
        summary.active_ms as f64 / 1000.0,
        summary.frames_processed,
        summary.detection_failures
    );
    Ok(())
}
