use fixed::types::I48F16;
use serde::{Deserialize, Serialize};

pub type FixedNum = I48F16;

/// Integer grid coordinate on the horizontal plane. The world is treated as
/// 2D at a fixed height; `z` is the second horizontal axis, not elevation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    pub const ZERO: Self = Self { x: 0, z: 0 };

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn distance_squared(self, other: Self) -> FixedNum {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        FixedNum::from_num(dx * dx + dz * dz)
    }

    pub fn distance(self, other: Self) -> FixedNum {
        let d_sq = self.distance_squared(other);
        if d_sq == FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        d_sq.sqrt()
    }

    pub fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    /// Unit step direction toward `other`: the sign of (Δx, Δz).
    /// Path simplification keeps exactly the points where this changes.
    pub fn step_sign(self, other: Self) -> (i32, i32) {
        ((other.x - self.x).signum(), (other.z - self.z).signum())
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self { x: self.x + dx, z: self.z + dz }
    }

    /// Bearing toward `other` in degrees, 0 = +z, clockwise, in [0, 360).
    ///
    /// Presentation only (HUD compass); not part of the deterministic core,
    /// so plain f32 trig is fine here.
    pub fn bearing_to(self, other: Self) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dz = (other.z - self.z) as f32;
        let deg = dx.atan2(dz).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }
}

/// Sum of consecutive-point euclidean distances along a polyline.
pub fn polyline_length(points: &[GridPos]) -> FixedNum {
    points
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .fold(FixedNum::ZERO, |acc, d| acc + d)
}
