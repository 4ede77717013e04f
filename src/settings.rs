use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::counter::{ExerciseKind, ExerciseProfile, ProfileTable};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeedbackSettings {
    pub enabled: bool,
    pub voice: String,
}

impl Default for AudioFeedbackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: "default".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    audio_feedback: AudioFeedbackSettings,
    default_exercise: String,
    /// Per-exercise threshold overrides, merged over the builtin table.
    profiles: BTreeMap<String, ExerciseProfile>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            audio_feedback: AudioFeedbackSettings::default(),
            default_exercise: ExerciseKind::Squats.as_str().to_string(),
            profiles: BTreeMap::new(),
        }
    }
}

/// JSON-backed user settings. Missing or unreadable files fall back to
/// defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn audio_feedback(&self) -> AudioFeedbackSettings {
        self.read().audio_feedback.clone()
    }

    pub fn update_audio_feedback(&self, settings: AudioFeedbackSettings) -> Result<()> {
        let mut guard = self.write();
        guard.audio_feedback = settings;
        self.persist(&guard)
    }

    pub fn default_exercise(&self) -> String {
        self.read().default_exercise.clone()
    }

    /// Only exercises known to the merged profile table are accepted.
    pub fn set_default_exercise(&self, exercise: &str) -> Result<()> {
        if self.profile_table().get(exercise).is_none() {
            bail!("unknown exercise type: {exercise}");
        }
        let mut guard = self.write();
        guard.default_exercise = exercise.to_string();
        self.persist(&guard)
    }

    /// Stores a threshold override after validating it.
    pub fn set_profile(&self, exercise: &str, profile: ExerciseProfile) -> Result<()> {
        profile
            .validate()
            .with_context(|| format!("Rejected profile for {exercise}"))?;
        let mut guard = self.write();
        guard.profiles.insert(exercise.to_string(), profile);
        self.persist(&guard)
    }

    /// Builtin profiles with the stored overrides applied. Invalid overrides
    /// are logged and skipped.
    pub fn profile_table(&self) -> ProfileTable {
        let mut table = ProfileTable::default();
        for err in table.merge(&self.read().profiles) {
            warn!("Keeping builtin profile: {err}");
        }
        table
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
