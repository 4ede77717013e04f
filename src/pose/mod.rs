//! Pose landmark model and joint-angle math.

mod angles;
mod joints;
mod landmarks;

pub use angles::joint_angle;
pub use joints::{JointGroup, JointTriple};
pub use landmarks::{Keypoint, Landmark, LandmarkSet, LandmarkSetError, FLAT_STRIDE, NUM_KEYPOINTS};
