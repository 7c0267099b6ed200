//! Toolhead pose tracking types

/// Linear interpolation from `from` (alpha = 0) to `to` (alpha = 1)
#[inline]
pub fn lerp(alpha: f64, from: f64, to: f64) -> f64 {
    alpha * (to - from) + from
}

/// Position of the toolhead plus the cumulative extrusion axis
///
/// `e` is the total filament length fed so far, not a physical position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

impl Pose {
    /// Create a new pose
    pub fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    /// Distance to `other` in the XY plane
    pub fn planar_distance(&self, other: &Pose) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Blend the X, Y and Z axes from `self` (alpha = 0) to `other` (alpha = 1)
    ///
    /// The extrusion axis of the result is taken from `self`; callers track
    /// extrusion separately.
    pub fn lerp_position(&self, other: &Pose, alpha: f64) -> Pose {
        Pose {
            x: lerp(alpha, self.x, other.x),
            y: lerp(alpha, self.y, other.y),
            z: lerp(alpha, self.z, other.z),
            e: self.e,
        }
    }
}
