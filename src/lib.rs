//! Collide-and-slide movement for 2D kinematic characters.
//!
//! The movement core ([`char_controller`]) only talks to the world through
//! [`GeometryQuery`](geometry::GeometryQuery), so it runs against avian2d inside a Bevy app
//! ([`plugin`]) as well as against an in-memory [`StaticScene`](geometry::scene::StaticScene).

// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]

pub mod char_controller;
pub mod geometry;
pub mod physics;

pub use physics::plugin;

pub mod prelude {
    pub use crate::char_controller::prelude::*;
    pub use crate::geometry::{
        CastResult, GeometryQuery, OverlapContact, SurfaceContact,
        avian::AvianGeometry,
        scene::{Obstacle, StaticScene},
    };
    pub use crate::physics::{CharacterSystems, CharacterVelocity, Crushed};
}
