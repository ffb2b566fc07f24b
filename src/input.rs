//! Keyboard control of the sandbox player.
use avian2d::prelude::*;
use bevy::prelude::*;
use kcc2d::prelude::*;

use crate::level::{Player, SpawnPoint};

const RUN_SPEED: f32 = 220.0;
const JUMP_SPEED: f32 = 420.0;
const GRAVITY: f32 = 980.0;
const MAX_FALL_SPEED: f32 = 900.0;
/// Keeps a grounded player pressed onto the ground so that the vertical pass keeps touching it.
const GROUND_STICK_SPEED: f32 = 30.0;
/// Falling below this height respawns the player.
const KILL_HEIGHT: f32 = -1000.0;

pub(crate) fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (respawn, drive_player)
            .chain()
            .before(CharacterSystems::Move),
    );
}

fn drive_player(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    player: Single<(&CharacterController, &mut CharacterVelocity), With<Player>>,
) {
    let (controller, mut velocity) = player.into_inner();
    let up = controller.up_direction().as_vec2();
    let right = controller.config().right_direction();
    let flags = controller.collision_flags();

    let mut axis = 0.0;
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        axis -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        axis += 1.0;
    }

    let mut vertical = velocity.dot(up);
    if controller.is_grounded() {
        vertical = if keys.pressed(KeyCode::Space) {
            JUMP_SPEED
        } else {
            -GROUND_STICK_SPEED
        };
    } else {
        if flags.contains(CollisionFlags::TOP) {
            vertical = vertical.min(0.0);
        }
        vertical = (vertical - GRAVITY * time.delta_secs()).max(-MAX_FALL_SPEED);
    }

    velocity.0 = right * axis * RUN_SPEED + up * vertical;
}

/// Puts the player back at its spawn point when R is pressed or it falls out of the level.
fn respawn(
    keys: Res<ButtonInput<KeyCode>>,
    player: Single<
        (
            Entity,
            &mut CharacterController,
            &mut CharacterVelocity,
            &mut Transform,
            &Collider,
            &Rotation,
            &SpawnPoint,
        ),
        With<Player>,
    >,
    geometry: AvianGeometry,
) {
    let (entity, mut controller, mut velocity, mut transform, collider, rotation, spawn) =
        player.into_inner();
    if !keys.just_pressed(KeyCode::KeyR) && transform.translation.y > KILL_HEIGHT {
        return;
    }
    let query = geometry.for_body(entity, collider, rotation.as_radians());
    let Ok(position) = controller.teleport(&query, **spawn);
    info!(?position, "respawned");
    velocity.0 = Vec2::ZERO;
    transform.translation.x = position.x;
    transform.translation.y = position.y;
}
