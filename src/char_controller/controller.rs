//! The per-body controller that games talk to.
use avian2d::math::Vector;
use bevy::{math::Dir2, prelude::*};

use super::config::{ConfigError, ControllerConfig, GroundDetection};
use super::flags::CollisionFlags;
use super::ground::{GroundState, sense_ground};
use super::move_and_slide::MovementResolver;
use crate::geometry::GeometryQuery;
use crate::physics::CharacterVelocity;

/// A kinematic character: a position moved through the world by [`CharacterController::move_by`].
///
/// Each call resolves one step of motion, then probes the ground. The results
/// ([`collision_flags`](Self::collision_flags), [`is_grounded`](Self::is_grounded),
/// [`ground`](Self::ground)) describe that call only and stay unchanged until the next one.
///
/// Call [`move_by`](Self::move_by) at most once per simulation step, with a displacement that
/// already accounts for the step's duration.
#[derive(Component, Clone, Debug, Reflect)]
#[require(CharacterVelocity)]
pub struct CharacterController {
    config: ControllerConfig,
    position: Vector,
    #[reflect(ignore)]
    flags: CollisionFlags,
    ground: GroundState,
    grounded: bool,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            config: ControllerConfig::default(),
            position: Vector::ZERO,
            flags: CollisionFlags::empty(),
            ground: GroundState::AIRBORNE,
            grounded: false,
        }
    }
}

impl CharacterController {
    /// Creates a controller at `position`, rejecting an invalid `config`.
    pub fn new(config: ControllerConfig, position: Vector) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            position,
            ..Default::default()
        })
    }

    /// Moves the character by `displacement`, sliding along whatever it runs into, and returns the
    /// flags collected on the way.
    ///
    /// A zero displacement issues no query and leaves the ground reading of the previous move in
    /// place; with no flags set, only [`GroundDetection::Sensor`] and [`GroundDetection::Either`]
    /// can keep the character grounded. If `geometry` fails, the error is returned and the
    /// position is left untouched.
    pub fn move_by<G: GeometryQuery>(
        &mut self,
        geometry: &G,
        displacement: Vector,
    ) -> Result<CollisionFlags, G::Error> {
        self.flags = CollisionFlags::empty();
        if displacement == Vector::ZERO {
            self.grounded = self.grounded_by_policy();
            return Ok(self.flags);
        }

        let ground_normal = self.ground.normal.filter(|_| self.ground.grounded);
        let resolution = MovementResolver::new(geometry, &self.config).resolve(
            self.position,
            displacement,
            ground_normal,
        )?;
        let ground = sense_ground(geometry, resolution.position, &self.config)?;

        self.position = resolution.position;
        self.flags = resolution.flags;
        self.ground = ground;

        let grounded = self.grounded_by_policy();
        if grounded != self.grounded {
            tracing::debug!(grounded, position = ?self.position, angle = ground.angle, "grounded changed");
        }
        self.grounded = grounded;
        Ok(self.flags)
    }

    fn grounded_by_policy(&self) -> bool {
        let landed = self.flags.contains(CollisionFlags::BOTTOM);
        match self.config.ground_detection {
            GroundDetection::BottomFlag => landed,
            GroundDetection::Sensor => self.ground.grounded,
            GroundDetection::Either => landed || self.ground.grounded,
        }
    }

    /// Whether the character stands on walkable ground, as decided by
    /// [`ControllerConfig::ground_detection`].
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Whether the last move pinned the character between two opposing surfaces.
    pub fn is_crushed(&self) -> bool {
        self.flags.is_crushed()
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.flags
    }

    /// The ground probe reading taken after the last move.
    pub fn ground(&self) -> GroundState {
        self.ground
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    /// Places the character without checking for overlaps.
    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    /// Places the character at `position`, pushed out of anything it would overlap there.
    pub fn teleport<G: GeometryQuery>(
        &mut self,
        geometry: &G,
        position: Vector,
    ) -> Result<Vector, G::Error> {
        let offset = MovementResolver::new(geometry, &self.config).depenetrate_all(position)?;
        self.position = position + offset;
        self.ground = GroundState::AIRBORNE;
        self.grounded = false;
        Ok(self.position)
    }

    pub fn up_direction(&self) -> Dir2 {
        Dir2::new(self.config.up_direction).unwrap_or(Dir2::Y)
    }

    /// Changes which way is up for the following moves. Flags of the last move keep their meaning.
    pub fn set_up_direction(&mut self, up: Dir2) {
        self.config.up_direction = up.as_vec2();
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Replaces the configuration for the following moves, rejecting an invalid one.
    pub fn set_config(&mut self, config: ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
