use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use repcount_lib::{
    capture::{synthetic_pose, Camera, ScriptedLandmarkSource, ScriptedResult, SyntheticCamera},
    counter::{ProfileTable, RepStage},
    pose::JointGroup,
    session::{SessionConfig, SessionDriver, SessionObserver, SessionSnapshot, SessionStatus},
};

#[derive(Default)]
struct Counts {
    angles: Vec<f32>,
    reps: usize,
    poses: Vec<bool>,
    heartbeats: usize,
}

#[derive(Default)]
struct CountingObserver {
    counts: Mutex<Counts>,
}

impl CountingObserver {
    fn per_sample_calls(&self) -> usize {
        let counts = self.counts.lock().unwrap();
        counts.angles.len() + counts.reps + counts.poses.len()
    }

    fn reps(&self) -> usize {
        self.counts.lock().unwrap().reps
    }

    fn poses(&self) -> Vec<bool> {
        self.counts.lock().unwrap().poses.clone()
    }
}

impl SessionObserver for CountingObserver {
    fn on_angle_update(&self, angle: f32) {
        self.counts.lock().unwrap().angles.push(angle);
    }

    fn on_rep_detected(&self) {
        self.counts.lock().unwrap().reps += 1;
    }

    fn on_pose_detected(&self, detected: bool) {
        self.counts.lock().unwrap().poses.push(detected);
    }

    fn on_state_changed(&self, snapshot: &SessionSnapshot) {
        if snapshot.state.status == SessionStatus::Running {
            self.counts.lock().unwrap().heartbeats += 1;
        }
    }
}

struct Harness {
    driver: SessionDriver,
    camera: Arc<SyntheticCamera>,
    source: Arc<ScriptedLandmarkSource>,
    observer: Arc<CountingObserver>,
}

fn harness(source: ScriptedLandmarkSource, config: SessionConfig) -> Harness {
    let camera = Arc::new(SyntheticCamera::new(32, 24));
    let source = Arc::new(source);
    let observer = Arc::new(CountingObserver::default());
    let driver = SessionDriver::new(
        camera.clone(),
        source.clone(),
        observer.clone(),
        ProfileTable::default(),
        config,
    );
    Harness {
        driver,
        camera,
        source,
        observer,
    }
}

fn quiet_config() -> SessionConfig {
    SessionConfig {
        heartbeat_every_ticks: 0,
        ..SessionConfig::default()
    }
}

fn pose(group: JointGroup, angle: f32) -> ScriptedResult {
    ScriptedResult::Pose(synthetic_pose(group, angle, angle))
}

fn curls(angles: &[f32]) -> Vec<ScriptedResult> {
    angles.iter().map(|&a| pose(JointGroup::Arms, a)).collect()
}

#[tokio::test(start_paused = true)]
async fn stale_landmark_result_after_stop_is_ignored() {
    let source = ScriptedLandmarkSource::new(curls(&[40.0]))
        .with_latency(Duration::from_millis(500));
    let h = harness(source, quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.source.call_count(), 1, "request should be in flight");

    h.driver.stop().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.observer.per_sample_calls(), 0);
    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.camera.release_count(), 1);
    assert_eq!(h.driver.get_state().await.status, SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn result_in_flight_at_pause_is_dropped() {
    let source = ScriptedLandmarkSource::new(curls(&[40.0]))
        .with_latency(Duration::from_millis(300));
    let h = harness(source, quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.source.call_count(), 1);
    assert_eq!(h.source.remaining(), 0);

    h.driver.pause().await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    // The flexed pose answered after the pause and must not count.
    assert_eq!(h.observer.per_sample_calls(), 0);
    assert_eq!(h.source.call_count(), 1);
    let state = h.driver.get_state().await;
    assert_eq!(state.frames_processed, 0);
    assert_eq!(state.stage, RepStage::Settling);
    assert_eq!(state.last_angle, None);

    h.driver.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn result_in_flight_at_exercise_change_is_dropped() {
    let source = ScriptedLandmarkSource::new(curls(&[40.0]))
        .with_latency(Duration::from_millis(300));
    let h = harness(source, quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.source.call_count(), 1);

    // Pushups also track the arms, so only the epoch tells the sample apart.
    h.driver.set_exercise("pushups").await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(h.observer.poses().is_empty());
    let state = h.driver.get_state().await;
    assert_eq!(state.frames_processed, 0);
    assert_eq!(state.stage, RepStage::Settling);
    assert_eq!(state.last_angle, None);
    assert_eq!(state.exercise.as_deref(), Some("pushups"));

    h.driver.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_source_never_overlaps_requests() {
    // Each answer takes 250ms against a 100ms cadence.
    let source = ScriptedLandmarkSource::new(curls(&[170.0; 8]))
        .with_latency(Duration::from_millis(250));
    let h = harness(source, quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(1000)).await;
    h.driver.stop().await.unwrap();

    // Strictly sequential requests fit at most 1000 / 250 (+1 in flight).
    let calls = h.source.call_count();
    assert!((3..=5).contains(&calls), "unexpected call count {calls}");
    assert_eq!(h.observer.poses().len(), calls - 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_detection_counts_as_no_pose() {
    let source = ScriptedLandmarkSource::new(curls(&[40.0]))
        .with_latency(Duration::from_millis(500));
    let config = SessionConfig {
        landmark_timeout: Duration::from_millis(200),
        ..quiet_config()
    };
    let h = harness(source, config);

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(h.observer.poses(), vec![false]);
    assert_eq!(h.driver.get_state().await.detection_failures, 1);
    h.driver.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn pause_suspends_sampling_but_keeps_the_camera() {
    let h = harness(ScriptedLandmarkSource::new([]), quiet_config());

    h.driver.start("squats").await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    let before = h.observer.poses().len();
    assert_eq!(before, 3);

    let paused = h.driver.pause().await.unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);
    let elapsed_at_pause = h.driver.snapshot().await.elapsed_ms;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(h.observer.poses().len(), before);
    assert_eq!(h.driver.snapshot().await.elapsed_ms, elapsed_at_pause);
    assert!(h.camera.is_active());
    assert_eq!(h.camera.release_count(), 0);

    h.driver.resume().await.unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(h.observer.poses().len() > before);

    let summary = h.driver.stop().await.unwrap();
    assert!(summary.active_ms >= 600 && summary.active_ms < 1000, "active {}", summary.active_ms);
    assert_eq!(h.camera.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn exercise_change_resets_without_a_spurious_rep() {
    let h = harness(ScriptedLandmarkSource::new(curls(&[40.0, 40.0])), quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.driver.get_state().await.stage, RepStage::Flexed);

    let switched = h.driver.set_exercise("squats").await.unwrap();
    assert_eq!(switched.stage, RepStage::Settling);
    assert_eq!(switched.exercise.as_deref(), Some("squats"));
    assert_eq!(switched.status, SessionStatus::Running);

    // Fully extended legs straight after the switch: no flex to complete.
    h.source.extend([pose(JointGroup::Legs, 170.0), pose(JointGroup::Legs, 170.0)]);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.observer.reps(), 0);
    assert!(h.camera.is_active());
    assert_eq!(h.camera.acquisition_count(), 1);

    // A full squat afterwards counts.
    h.source.extend([pose(JointGroup::Legs, 80.0), pose(JointGroup::Legs, 170.0)]);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.observer.reps(), 1);

    let summary = h.driver.stop().await.unwrap();
    assert_eq!(summary.exercise, "squats");
    assert_eq!(summary.reps, 1);
}

#[tokio::test(start_paused = true)]
async fn min_gap_debounces_a_jittery_extension() {
    // Flex/extend flicker at 100ms spacing; bicep curls need >600ms between reps.
    let h = harness(
        ScriptedLandmarkSource::new(curls(&[40.0, 170.0, 40.0, 170.0, 40.0, 170.0])),
        quiet_config(),
    );

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(650)).await;

    assert_eq!(h.observer.reps(), 1);
    let summary = h.driver.stop().await.unwrap();
    assert_eq!(summary.reps, 1);
}

#[tokio::test(start_paused = true)]
async fn heartbeats_follow_the_configured_cadence() {
    let config = SessionConfig {
        heartbeat_every_ticks: 5,
        ..SessionConfig::default()
    };
    let h = harness(ScriptedLandmarkSource::new([]), config);

    h.driver.start("pushups").await.unwrap();
    // The start itself reports the running state once.
    tokio::time::sleep(Duration::from_millis(950)).await;
    h.driver.stop().await.unwrap();

    // Ten samples: one lifecycle event plus two heartbeats.
    assert_eq!(h.observer.counts.lock().unwrap().heartbeats, 3);
}

#[tokio::test(start_paused = true)]
async fn a_new_session_starts_from_scratch() {
    let h = harness(ScriptedLandmarkSource::new(curls(&[40.0, 170.0])), quiet_config());

    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let first = h.driver.stop().await.unwrap();
    assert_eq!(first.reps, 1);

    h.source.extend(curls(&[170.0]));
    h.driver.start("bicep_curls").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = h.driver.get_state().await;
    assert_eq!(state.reps, 0);
    assert_eq!(state.stage, RepStage::Settling);
    assert_ne!(state.session_id.as_deref(), Some(first.id.as_str()));

    h.driver.reset().await.unwrap();
    assert_eq!(h.driver.get_state().await.status, SessionStatus::Idle);
    assert_eq!(h.camera.release_count(), 2);
}
