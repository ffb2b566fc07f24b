//! Which sides of a character touched geometry during a move.
use avian2d::math::{Scalar, Vector};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Normals closer than this to the up axis have no front or back.
const SIDE_EPSILON: Scalar = 1e-4;

bitflags! {
    /// Contacts accumulated during one [`CharacterController::move_by`](super::controller::CharacterController::move_by).
    ///
    /// Cleared when a move starts and only ever added to while it runs.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionFlags: u8 {
        /// Blocked by something on the character's right.
        const FRONT = 1 << 0;
        /// Blocked by something on the character's left.
        const BACK = 1 << 1;
        /// Touched a ceiling.
        const TOP = 1 << 2;
        /// Touched walkable ground.
        const BOTTOM = 1 << 3;
        /// Touched a surface steeper than the slope limit.
        const STEEP_SLOPE = 1 << 4;
        /// Slid along a walkable surface.
        const SHALLOW_SLOPE = 1 << 5;
    }
}

impl CollisionFlags {
    /// Pinned between two opposing surfaces.
    pub const fn is_crushed(self) -> bool {
        self.contains(Self::TOP.union(Self::BOTTOM)) || self.contains(Self::FRONT.union(Self::BACK))
    }

    /// Front or back, depending on which side of the character a surface with `normal` is on.
    pub fn side_of(normal: Vector, right: Vector) -> Self {
        let side = normal.dot(right);
        if side < -SIDE_EPSILON {
            Self::FRONT
        } else if side > SIDE_EPSILON {
            Self::BACK
        } else {
            Self::empty()
        }
    }
}
