//! Runs [`CharacterController`]s against avian2d colliders every fixed step.
use avian2d::math::Vector;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::char_controller::{
    config::{ControllerConfig, GroundDetection},
    controller::CharacterController,
    flags::CollisionFlags,
    ground::GroundState,
};
use crate::geometry::avian::AvianGeometry;

/// Velocity the character wants to move with, in units per second.
///
/// Unlike [`LinearVelocity`], this is never touched by the physics solver. Drivers write it;
/// [`move_characters`] turns it into one [`CharacterController::move_by`] per fixed step.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Reflect, Deref, DerefMut)]
#[reflect(Component, Default)]
pub struct CharacterVelocity(pub Vector);

/// Triggered when a move pins a character between two opposing surfaces.
#[derive(Event, Clone, Copy, Debug)]
pub struct Crushed {
    pub entity: Entity,
    pub flags: CollisionFlags,
}

/// Ordering for character movement. Systems that write [`CharacterVelocity`] should run before
/// [`CharacterSystems::Move`], systems that read the outcome after it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterSystems {
    Move,
}

/// Moves every character by its velocity, sliding along colliders.
///
/// The resolved position is written to [`Transform`]; avian2d carries it over to [`Position`].
pub fn move_characters(
    mut characters: Query<(
        Entity,
        &mut CharacterController,
        &Collider,
        &Rotation,
        &Position,
        &mut Transform,
        &CharacterVelocity,
    )>,
    geometry: AvianGeometry,
    time: Res<Time>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    for (entity, mut controller, collider, rotation, position, mut transform, velocity) in
        &mut characters
    {
        controller.set_position(position.0);
        let displacement = velocity.0 * delta;
        let query = geometry.for_body(entity, collider, rotation.as_radians());
        let flags = controller
            .move_by(&query, displacement)
            .unwrap_or_else(|never| match never {});

        let resolved = controller.position();
        transform.translation.x = resolved.x;
        transform.translation.y = resolved.y;

        if flags.is_crushed() {
            commands.trigger(Crushed { entity, flags });
        }
    }
}

pub fn plugin(app: &mut App) {
    app.register_type::<CharacterController>()
        .register_type::<CharacterVelocity>()
        .register_type::<ControllerConfig>()
        .register_type::<GroundDetection>()
        .register_type::<GroundState>()
        .add_systems(
            FixedUpdate,
            move_characters.in_set(CharacterSystems::Move),
        );
}
