//! Kinematic character controllers.
//!
//! [`CharacterController`](controller::CharacterController) is the entry point. The pieces it is
//! built from are public too, for games that want to drive the movement loop themselves.

pub mod config;
pub mod controller;
pub mod flags;
pub mod ground;
pub mod move_and_slide;
pub mod response;
pub mod slope;

/// Re-exports common types related to character controller functionality.
pub mod prelude {
    pub use super::config::{ConfigError, ControllerConfig, GroundDetection};
    pub use super::controller::CharacterController;
    pub use super::flags::CollisionFlags;
    pub use super::ground::{GroundState, sense_ground};
    pub use super::move_and_slide::{MovementResolver, Resolution};
}
