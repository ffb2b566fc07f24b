//! Builds the sandbox level and the player from RON descriptions.
use std::fs::read_to_string;

use avian2d::prelude::*;
use bevy::prelude::*;
use kcc2d::prelude::*;
use serde::{Deserialize, Serialize};

const LEVEL_PATH: &str = "assets/levels/sandbox.ron";
const CONTROLLER_PATH: &str = "assets/controllers/player.ron";

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub enum ColliderShape {
    Ball(f32),
    Cuboid(f32, f32),
    Capsule(f32, f32),
    Segment(Vec2, Vec2),
}

impl From<ColliderShape> for Collider {
    fn from(value: ColliderShape) -> Self {
        match value {
            ColliderShape::Ball(radius) => Collider::circle(radius),
            ColliderShape::Cuboid(w, h) => Collider::rectangle(w, h),
            ColliderShape::Capsule(radius, length) => Collider::capsule(radius, length),
            ColliderShape::Segment(a, b) => Collider::segment(a, b),
        }
    }
}

impl Default for ColliderShape {
    fn default() -> Self {
        ColliderShape::Cuboid(20.0, 20.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct Block {
    position: Vec2,
    #[serde(default)]
    rotation_degrees: f32,
    shape: ColliderShape,
}

#[derive(Clone, Debug, Deserialize)]
struct PlayerSpawn {
    position: Vec2,
    shape: ColliderShape,
}

impl Default for PlayerSpawn {
    fn default() -> Self {
        Self {
            position: Vec2::new(0.0, 40.0),
            shape: ColliderShape::Capsule(10.0, 24.0),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct LevelDescription {
    player: PlayerSpawn,
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Component, Debug)]
pub struct Player;

/// Where the player goes back to on respawn.
#[derive(Component, Clone, Copy, Debug, Deref)]
pub struct SpawnPoint(pub Vec2);

pub(crate) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup).add_observer(report_crushed);
}

fn load_level(path: &str) -> LevelDescription {
    info!("Looking at path: {path}");
    let Some(source) = read_to_string(path).ok() else {
        warn!("did not find a level file at {path}");
        return LevelDescription::default();
    };
    ron::de::from_str::<LevelDescription>(&source)
        .map_err(|e| warn!("could not parse {e}"))
        .unwrap_or_default()
}

fn setup(mut commands: Commands) {
    commands.spawn((Name::new("Camera"), Camera2d));

    let level = load_level(LEVEL_PATH);
    for block in level.blocks {
        commands.spawn((
            Name::new("Block"),
            RigidBody::Static,
            Collider::from(block.shape),
            Transform::from_translation(block.position.extend(0.0))
                .with_rotation(Quat::from_rotation_z(block.rotation_degrees.to_radians())),
        ));
    }

    let config = ControllerConfig::load(CONTROLLER_PATH).unwrap_or_else(|e| {
        warn!("could not load {CONTROLLER_PATH}: {e}");
        ControllerConfig::default()
    });
    let spawn = level.player.position;
    let controller = CharacterController::new(config, spawn).unwrap_or_else(|e| {
        warn!("falling back to the default controller: {e}");
        CharacterController::default()
    });
    commands.spawn((
        Name::new("Player"),
        Player,
        SpawnPoint(spawn),
        controller,
        RigidBody::Kinematic,
        Collider::from(level.player.shape),
        Transform::from_translation(spawn.extend(1.0)),
    ));
}

fn report_crushed(crushed: On<Crushed>, names: Query<&Name>) {
    let name = names
        .get(crushed.entity)
        .map(Name::as_str)
        .unwrap_or("character");
    info!(flags = ?crushed.flags, "{name} is crushed");
}
