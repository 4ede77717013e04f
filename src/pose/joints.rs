use serde::{Deserialize, Serialize};

use super::{joint_angle, Keypoint, LandmarkSet};

/// Three keypoints forming a joint: the angle is measured at `vertex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointTriple {
    pub proximal: Keypoint,
    pub vertex: Keypoint,
    pub distal: Keypoint,
}

impl JointTriple {
    pub const fn new(proximal: Keypoint, vertex: Keypoint, distal: Keypoint) -> Self {
        Self {
            proximal,
            vertex,
            distal,
        }
    }

    pub fn angle(&self, set: &LandmarkSet) -> f32 {
        joint_angle(&set[self.proximal], &set[self.vertex], &set[self.distal])
    }

    pub fn is_visible(&self, set: &LandmarkSet, min_visibility: f32) -> bool {
        [self.proximal, self.vertex, self.distal]
            .iter()
            .all(|&keypoint| set[keypoint].is_visible(min_visibility))
    }
}

/// Which limb pair feeds an exercise's angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointGroup {
    Arms,
    Legs,
    Torso,
}

impl JointGroup {
    pub fn triples(self) -> (JointTriple, JointTriple) {
        use Keypoint::*;

        match self {
            JointGroup::Arms => (
                JointTriple::new(LeftShoulder, LeftElbow, LeftWrist),
                JointTriple::new(RightShoulder, RightElbow, RightWrist),
            ),
            JointGroup::Legs => (
                JointTriple::new(LeftHip, LeftKnee, LeftAnkle),
                JointTriple::new(RightHip, RightKnee, RightAnkle),
            ),
            JointGroup::Torso => (
                JointTriple::new(LeftShoulder, LeftHip, LeftKnee),
                JointTriple::new(RightShoulder, RightHip, RightKnee),
            ),
        }
    }

    /// Angle for this group, taking the more flexed side when both are usable.
    ///
    /// A side whose keypoints score below `min_visibility` is dropped; `None`
    /// means neither side could be measured.
    pub fn angle(self, set: &LandmarkSet, min_visibility: f32) -> Option<f32> {
        let (left, right) = self.triples();
        let left = left
            .is_visible(set, min_visibility)
            .then(|| left.angle(set));
        let right = right
            .is_visible(set, min_visibility)
            .then(|| right.angle(set));

        match (left, right) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (Some(angle), None) | (None, Some(angle)) => Some(angle),
            (None, None) => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JointGroup::Arms => "arms",
            JointGroup::Legs => "legs",
            JointGroup::Torso => "torso",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::synthetic_pose;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn uses_the_more_flexed_side() {
        let set = synthetic_pose(JointGroup::Arms, 150.0, 45.0);
        let angle = JointGroup::Arms.angle(&set, 0.0).unwrap();
        assert_approx_eq!(angle, 45.0, 1e-2);
    }

    #[test]
    fn falls_back_to_the_visible_side() {
        let mut set = synthetic_pose(JointGroup::Legs, 40.0, 170.0);
        set[Keypoint::LeftKnee].visibility = Some(0.1);

        let angle = JointGroup::Legs.angle(&set, 0.5).unwrap();
        assert_approx_eq!(angle, 170.0, 1e-2);

        // Gating disabled: both sides count again.
        let angle = JointGroup::Legs.angle(&set, 0.0).unwrap();
        assert_approx_eq!(angle, 40.0, 1e-2);
    }

    #[test]
    fn no_angle_when_neither_side_is_visible() {
        let mut set = synthetic_pose(JointGroup::Torso, 90.0, 90.0);
        set[Keypoint::LeftHip].visibility = Some(0.2);
        set[Keypoint::RightShoulder].visibility = Some(0.2);
        assert_eq!(JointGroup::Torso.angle(&set, 0.6), None);
    }

    #[test]
    fn torso_is_measured_at_the_hip() {
        let (left, right) = JointGroup::Torso.triples();
        assert_eq!(left.vertex, Keypoint::LeftHip);
        assert_eq!(right.vertex, Keypoint::RightHip);
    }
}
