use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use super::FormState;
use crate::pose::JointGroup;

/// Exercises with built-in thresholds. Settings can add more keys to a
/// [`ProfileTable`]; these are just the ones that ship with defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squats,
    Pushups,
    BicepCurls,
    Situps,
    ShoulderPress,
    Lunges,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 6] = [
        ExerciseKind::Squats,
        ExerciseKind::Pushups,
        ExerciseKind::BicepCurls,
        ExerciseKind::Situps,
        ExerciseKind::ShoulderPress,
        ExerciseKind::Lunges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squats => "squats",
            ExerciseKind::Pushups => "pushups",
            ExerciseKind::BicepCurls => "bicep_curls",
            ExerciseKind::Situps => "situps",
            ExerciseKind::ShoulderPress => "shoulder_press",
            ExerciseKind::Lunges => "lunges",
        }
    }

    pub fn default_profile(&self) -> ExerciseProfile {
        match self {
            ExerciseKind::Squats => ExerciseProfile::new(JointGroup::Legs, 90.0, 160.0, 1000),
            ExerciseKind::Pushups => ExerciseProfile::new(JointGroup::Arms, 90.0, 160.0, 1000),
            ExerciseKind::BicepCurls => ExerciseProfile::new(JointGroup::Arms, 60.0, 140.0, 600),
            ExerciseKind::Situps => ExerciseProfile::new(JointGroup::Torso, 60.0, 140.0, 1200),
            ExerciseKind::ShoulderPress => {
                ExerciseProfile::new(JointGroup::Arms, 90.0, 160.0, 800)
            }
            // Same knee mechanics as a squat.
            ExerciseKind::Lunges => ExerciseProfile::new(JointGroup::Legs, 90.0, 160.0, 1000),
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("unknown exercise type: {s}"))
    }
}

/// Thresholds for one exercise. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProfile {
    pub joint_group: JointGroup,
    /// Below this the joint counts as flexed.
    pub flex_threshold: f32,
    /// Above this (coming from flexed) a rep completes.
    pub extend_threshold: f32,
    /// A rep only counts if more than this has passed since the previous one.
    pub min_rep_gap_ms: u64,
}

impl ExerciseProfile {
    pub fn new(
        joint_group: JointGroup,
        flex_threshold: f32,
        extend_threshold: f32,
        min_rep_gap_ms: u64,
    ) -> Self {
        Self {
            joint_group,
            flex_threshold,
            extend_threshold,
            min_rep_gap_ms,
        }
    }

    pub fn min_rep_gap(&self) -> Duration {
        Duration::from_millis(self.min_rep_gap_ms)
    }

    pub fn form_at(&self, angle: f32) -> FormState {
        if angle < self.flex_threshold || angle > self.extend_threshold {
            FormState::Good
        } else {
            FormState::Ok
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=180.0).contains(&self.flex_threshold)
            || !(0.0..=180.0).contains(&self.extend_threshold)
        {
            bail!(
                "thresholds must lie within [0, 180], got flex {} / extend {}",
                self.flex_threshold,
                self.extend_threshold
            );
        }
        if self.flex_threshold >= self.extend_threshold {
            bail!(
                "flex threshold {} must be below extend threshold {}",
                self.flex_threshold,
                self.extend_threshold
            );
        }
        Ok(())
    }
}

/// Exercise key → profile lookup. Deserializing validates every entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, ExerciseProfile>",
    into = "BTreeMap<String, ExerciseProfile>"
)]
pub struct ProfileTable {
    profiles: BTreeMap<String, ExerciseProfile>,
}

impl TryFrom<BTreeMap<String, ExerciseProfile>> for ProfileTable {
    type Error = anyhow::Error;

    fn try_from(profiles: BTreeMap<String, ExerciseProfile>) -> Result<Self> {
        let mut table = ProfileTable::empty();
        for (exercise, profile) in profiles {
            table.insert(exercise, profile)?;
        }
        Ok(table)
    }
}

impl From<ProfileTable> for BTreeMap<String, ExerciseProfile> {
    fn from(table: ProfileTable) -> Self {
        table.profiles
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        let profiles = ExerciseKind::ALL
            .into_iter()
            .map(|kind| (kind.as_str().to_string(), kind.default_profile()))
            .collect();
        Self { profiles }
    }
}

impl ProfileTable {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    pub fn get(&self, exercise: &str) -> Option<&ExerciseProfile> {
        self.profiles.get(exercise)
    }

    pub fn insert(&mut self, exercise: impl Into<String>, profile: ExerciseProfile) -> Result<()> {
        let exercise = exercise.into();
        profile
            .validate()
            .map_err(|err| anyhow!("invalid profile for {exercise}: {err}"))?;
        self.profiles.insert(exercise, profile);
        Ok(())
    }

    /// Applies overrides on top of this table, returning the ones rejected.
    pub fn merge(
        &mut self,
        overrides: &BTreeMap<String, ExerciseProfile>,
    ) -> Vec<anyhow::Error> {
        overrides
            .iter()
            .filter_map(|(exercise, profile)| self.insert(exercise.clone(), *profile).err())
            .collect()
    }

    pub fn exercises(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid_and_complete() {
        let table = ProfileTable::default();
        assert_eq!(table.len(), ExerciseKind::ALL.len());
        for kind in ExerciseKind::ALL {
            let profile = table.get(kind.as_str()).expect("missing builtin profile");
            profile.validate().unwrap();
        }
    }

    #[test]
    fn joint_selection_is_data() {
        let table = ProfileTable::default();
        assert_eq!(table.get("squats").unwrap().joint_group, JointGroup::Legs);
        assert_eq!(table.get("pushups").unwrap().joint_group, JointGroup::Arms);
        assert_eq!(table.get("bicep_curls").unwrap().joint_group, JointGroup::Arms);
        assert_eq!(table.get("situps").unwrap().joint_group, JointGroup::Torso);
        assert_eq!(table.get("lunges"), table.get("squats"));
    }

    #[test]
    fn form_is_good_past_either_threshold() {
        let curls = ExerciseKind::BicepCurls.default_profile();
        assert_eq!(curls.form_at(40.0), FormState::Good);
        assert_eq!(curls.form_at(170.0), FormState::Good);
        assert_eq!(curls.form_at(100.0), FormState::Ok);
        // The thresholds themselves are not past.
        assert_eq!(curls.form_at(60.0), FormState::Ok);
        assert_eq!(curls.form_at(140.0), FormState::Ok);
    }

    #[test]
    fn parses_exercise_keys() {
        assert_eq!("bicep_curls".parse::<ExerciseKind>().unwrap(), ExerciseKind::BicepCurls);
        assert_eq!(ExerciseKind::ShoulderPress.to_string(), "shoulder_press");
        assert!("burpees".parse::<ExerciseKind>().is_err());
    }

    #[test]
    fn rejects_inverted_or_out_of_range_thresholds() {
        let inverted = ExerciseProfile::new(JointGroup::Arms, 150.0, 60.0, 600);
        assert!(inverted.validate().is_err());

        let equal = ExerciseProfile::new(JointGroup::Arms, 90.0, 90.0, 600);
        assert!(equal.validate().is_err());

        let too_wide = ExerciseProfile::new(JointGroup::Arms, 30.0, 190.0, 600);
        assert!(too_wide.validate().is_err());

        let mut table = ProfileTable::empty();
        assert!(table.insert("curls", inverted).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn merge_overrides_and_reports_rejects() {
        let mut table = ProfileTable::default();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "squats".to_string(),
            ExerciseProfile::new(JointGroup::Legs, 100.0, 150.0, 900),
        );
        overrides.insert(
            "step_ups".to_string(),
            ExerciseProfile::new(JointGroup::Legs, 95.0, 155.0, 1100),
        );
        overrides.insert(
            "pushups".to_string(),
            ExerciseProfile::new(JointGroup::Arms, 170.0, 20.0, 1000),
        );

        let rejected = table.merge(&overrides);
        assert_eq!(rejected.len(), 1);
        assert_eq!(table.get("squats").unwrap().flex_threshold, 100.0);
        assert_eq!(table.get("step_ups").unwrap().min_rep_gap_ms, 1100);
        // The invalid override leaves the builtin in place.
        assert_eq!(table.get("pushups").unwrap().flex_threshold, 90.0);
    }

    #[test]
    fn deserializes_from_settings_json() {
        let json = r#"{
            "bicep_curls": { "jointGroup": "arms", "flexThreshold": 50, "extendThreshold": 150, "minRepGapMs": 800 }
        }"#;
        let table: ProfileTable = serde_json::from_str(json).unwrap();
        let profile = table.get("bicep_curls").unwrap();
        assert_eq!(profile.flex_threshold, 50.0);
        assert_eq!(profile.min_rep_gap(), Duration::from_millis(800));
    }

    #[test]
    fn rejects_invalid_profiles_when_deserializing() {
        let json = r#"{
            "pushups": { "jointGroup": "arms", "flexThreshold": 170, "extendThreshold": 20, "minRepGapMs": 1000 }
        }"#;
        let err = serde_json::from_str::<ProfileTable>(json).unwrap_err();
        assert!(err.to_string().contains("pushups"), "{err}");

        let builtins = serde_json::to_string(&ProfileTable::default()).unwrap();
        let parsed: ProfileTable = serde_json::from_str(&builtins).unwrap();
        assert_eq!(parsed, ProfileTable::default());
    }
}
