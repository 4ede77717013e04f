use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

pub const NUM_KEYPOINTS: usize = 33;

/// Values per landmark in a flat buffer: x, y, z, visibility.
pub const FLAT_STRIDE: usize = 4;

/// Body keypoints in the 33-point pose model ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keypoint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Keypoint {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A single tracked keypoint. `x`/`y` are normalized to the frame, `z` is a
/// relative depth estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Landmarks without a score are treated as visible.
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.visibility.map_or(true, f32::is_finite)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LandmarkSetError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// One frame's complete set of keypoints. A set is either complete or absent;
/// there is no way to build a partial one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkSet {
    landmarks: [Landmark; NUM_KEYPOINTS],
}

impl LandmarkSet {
    pub fn from_slice(landmarks: &[Landmark]) -> Result<Self, LandmarkSetError> {
        if landmarks.len() != NUM_KEYPOINTS {
            return Err(LandmarkSetError::WrongLength {
                expected: NUM_KEYPOINTS,
                actual: landmarks.len(),
            });
        }

        let mut set = [Landmark::default(); NUM_KEYPOINTS];
        for (i, landmark) in landmarks.iter().enumerate() {
            if !landmark.is_finite() {
                return Err(LandmarkSetError::NonFinite(i));
            }
            set[i] = *landmark;
        }

        Ok(Self { landmarks: set })
    }

    /// Builds a set from a flat `[x, y, z, visibility] * 33` buffer, the layout
    /// pose runtimes usually hand over.
    pub fn from_flat(data: &[f32]) -> Result<Self, LandmarkSetError> {
        if data.len() != NUM_KEYPOINTS * FLAT_STRIDE {
            return Err(LandmarkSetError::WrongLength {
                expected: NUM_KEYPOINTS * FLAT_STRIDE,
                actual: data.len(),
            });
        }

        let landmarks: Vec<Landmark> = data
            .chunks_exact(FLAT_STRIDE)
            .map(|chunk| Landmark {
                x: chunk[0],
                y: chunk[1],
                z: chunk[2],
                visibility: Some(chunk[3]),
            })
            .collect();

        Self::from_slice(&landmarks)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); NUM_KEYPOINTS],
        }
    }
}

impl Index<Keypoint> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, keypoint: Keypoint) -> &Landmark {
        &self.landmarks[keypoint.index()]
    }
}

impl IndexMut<Keypoint> for LandmarkSet {
    fn index_mut(&mut self, keypoint: Keypoint) -> &mut Landmark {
        &mut self.landmarks[keypoint.index()]
    }
}
