//! Joint angle calculation
//!
//! Angle at a joint vertex from the polar angles of the two limb segments
//! leaving it (vertex→proximal and vertex→distal).

use super::Landmark;

/// Angle at `b` in degrees, in [0, 180].
///
/// Takes the absolute difference of the two segment directions and reflects
/// anything above 180 back as `360 - angle`. Coincident points are not
/// special-cased; `atan2(0, 0)` yields 0 and the result falls out of the
/// formula.
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let to_distal = (c.y - b.y).atan2(c.x - b.x);
    let to_proximal = (a.y - b.y).atan2(a.x - b.x);

    let angle = (to_distal - to_proximal).abs().to_degrees();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
