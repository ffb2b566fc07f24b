//! Classifying contact normals into ground, ceiling, and too-steep surfaces.
use avian2d::math::{Scalar, Vector};

/// Slack on the slope limit, so that a normal at exactly the limit survives float error.
pub const SLOPE_TOLERANCE_DEGREES: Scalar = 1e-3;

/// Which way a surface faces relative to the character's up axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceSide {
    /// Faces up, or exactly sideways.
    Ground,
    /// Faces down.
    Ceiling,
}

/// How a contact normal relates to the up axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeClass {
    pub side: SurfaceSide,
    /// Degrees between the normal and up (ground) or down (ceiling).
    pub angle_from_up: Scalar,
    /// [`SlopeClass::angle_from_up`], negative when the surface faces the character's left.
    pub signed_angle: Scalar,
    /// Whether the angle is within the slope limit.
    pub walkable: bool,
}

impl SlopeClass {
    pub fn is_walkable_ground(&self) -> bool {
        self.walkable && self.side == SurfaceSide::Ground
    }

    pub fn is_walkable_ceiling(&self) -> bool {
        self.walkable && self.side == SurfaceSide::Ceiling
    }
}

/// Classifies `normal` against the unit `up` axis and a slope limit in degrees.
///
/// Ceilings are measured against the down axis, so an overhang reads as a steep ceiling
/// rather than as ground tilted past 90 degrees.
pub fn classify(normal: Vector, up: Vector, slope_limit_degrees: Scalar) -> SlopeClass {
    let normal = normal.normalize_or_zero();
    let side = if normal.dot(up) >= 0.0 {
        SurfaceSide::Ground
    } else {
        SurfaceSide::Ceiling
    };
    let axis = match side {
        SurfaceSide::Ground => up,
        SurfaceSide::Ceiling => -up,
    };
    let angle_from_up = axis.dot(normal).clamp(-1.0, 1.0).acos().to_degrees();
    let right = Vector::new(up.y, -up.x);
    let signed_angle = if normal.dot(right) < 0.0 {
        -angle_from_up
    } else {
        angle_from_up
    };
    SlopeClass {
        side,
        angle_from_up,
        signed_angle,
        walkable: angle_from_up <= slope_limit_degrees + SLOPE_TOLERANCE_DEGREES,
    }
}
