//! Per-controller tuning, validated up front and loadable from RON.
use std::path::Path;

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::LayerMask;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How far an up direction may stray from unit length and still be accepted.
const UNIT_TOLERANCE: Scalar = 1e-3;

/// Invalid [`ControllerConfig`] values, or a config file that could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("skin width must be positive and finite, got {0}")]
    SkinWidth(Scalar),
    #[error("slope limit must be within 0..=90 degrees, got {0}")]
    SlopeLimit(Scalar),
    #[error("at least one iteration is required per pass")]
    MaxIterations,
    #[error("up direction must be a finite unit vector, got {0}")]
    UpDirection(Vector),
    #[error("ground probe distance must be positive and finite, got {0}")]
    GroundProbe(Scalar),
    #[error("could not parse controller config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("could not read controller config: {0}")]
    Io(#[from] std::io::Error),
}

/// Which signal decides [`CharacterController::is_grounded`](super::controller::CharacterController::is_grounded).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
#[reflect(Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum GroundDetection {
    /// Grounded when the vertical pass of the last move landed on walkable ground.
    #[default]
    BottomFlag,
    /// Grounded when the probe after the last move found walkable ground.
    Sensor,
    /// Either of the two.
    Either,
}

/// Configuration for a [`CharacterController`](super::controller::CharacterController).
///
/// Fixed for the duration of a move, but may be swapped between moves with
/// [`CharacterController::set_config`](super::controller::CharacterController::set_config).
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Clearance kept between the character and everything it touches.
    ///
    /// Increase the value if you notice your character getting stuck in geometry.
    /// Decrease it when you notice jittering, especially around V-shaped walls.
    pub skin_width: Scalar,

    /// Steepest surface, in degrees from the up axis, that still counts as walkable.
    /// Ceilings are measured from the down axis.
    pub slope_limit_degrees: Scalar,

    /// Budget of cast-and-respond iterations for each of the two passes of a move.
    /// Running out is not an error: the character stays where the last iteration left it.
    pub max_iterations: usize,

    /// Slide along walkable ground hit while moving sideways, instead of stopping.
    pub slide_on_ground: bool,

    /// Slide along walkable ceilings hit while moving sideways, and off steep ceilings
    /// while moving vertically.
    pub slide_on_ceilings: bool,

    /// Slide off surfaces steeper than the slope limit during vertical motion, instead of
    /// coming to rest on them.
    pub force_slide_on_steep: bool,

    /// World-space up. Must be unit length.
    pub up_direction: Vector,

    /// How much of the sliding motion is lost on impact. `0` slides at full speed,
    /// `1` stops dead, values outside `0..=1` amplify or reverse the slide.
    pub friction: Scalar,

    /// How much of the motion is reflected away from the surface on impact.
    pub bounciness: Scalar,

    /// Length of the downward probe that confirms ground after every move.
    pub ground_probe_distance: Scalar,

    /// Which signal decides whether the character is grounded.
    pub ground_detection: GroundDetection,

    /// Redirect sideways input along the ground measured by the previous move, so that
    /// walking follows slopes before anything is hit.
    pub align_to_ground: bool,

    /// Stop a pass early once the motion left is negligible.
    pub early_exit: bool,

    /// How many Gauss-Seidel iterations to use when restoring the skin width after a contact.
    pub depenetration_iterations: usize,

    /// The accumulated error below which skin-width restoration stops iterating.
    pub max_depenetration_error: Scalar,

    /// Layers the character collides with.
    pub collision_mask: LayerMask,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let skin_width = 0.01;
        Self {
            skin_width,
            slope_limit_degrees: 45.0,
            max_iterations: 5,
            slide_on_ground: true,
            slide_on_ceilings: false,
            force_slide_on_steep: true,
            up_direction: Vector::Y,
            friction: 0.0,
            bounciness: 0.0,
            ground_probe_distance: skin_width * 2.0,
            ground_detection: GroundDetection::default(),
            align_to_ground: true,
            early_exit: true,
            depenetration_iterations: 16,
            max_depenetration_error: 0.0001,
            collision_mask: LayerMask::ALL,
        }
    }
}

impl ControllerConfig {
    /// Rejects values that would make movement silently wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.skin_width.is_finite() && self.skin_width > 0.0) {
            return Err(ConfigError::SkinWidth(self.skin_width));
        }
        if !(0.0..=90.0).contains(&self.slope_limit_degrees) {
            return Err(ConfigError::SlopeLimit(self.slope_limit_degrees));
        }
        if self.max_iterations < 1 {
            return Err(ConfigError::MaxIterations);
        }
        let up = self.up_direction;
        if !up.is_finite() || (up.length() - 1.0).abs() > UNIT_TOLERANCE {
            return Err(ConfigError::UpDirection(up));
        }
        if !(self.ground_probe_distance.is_finite() && self.ground_probe_distance > 0.0) {
            return Err(ConfigError::GroundProbe(self.ground_probe_distance));
        }
        Ok(())
    }

    /// Parses and validates a RON document. Missing fields take their default value.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::de::from_str(source)?;
        config.validate()?;
        tracing::debug!(?config, "loaded controller config");
        Ok(config)
    }

    /// Reads a RON file with [`ControllerConfig::from_ron_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// The character's right, perpendicular to up.
    pub fn right_direction(&self) -> Vector {
        Vector::new(self.up_direction.y, -self.up_direction.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        ControllerConfig::default().validate().unwrap();
    }

    #[rstest]
    #[case::zero_skin(ControllerConfig { skin_width: 0.0, ..default() })]
    #[case::negative_skin(ControllerConfig { skin_width: -0.1, ..default() })]
    #[case::nan_skin(ControllerConfig { skin_width: Scalar::NAN, ..default() })]
    #[case::negative_slope(ControllerConfig { slope_limit_degrees: -1.0, ..default() })]
    #[case::overhanging_slope(ControllerConfig { slope_limit_degrees: 90.5, ..default() })]
    #[case::no_iterations(ControllerConfig { max_iterations: 0, ..default() })]
    #[case::zero_up(ControllerConfig { up_direction: Vector::ZERO, ..default() })]
    #[case::long_up(ControllerConfig { up_direction: Vector::new(0.0, 2.0), ..default() })]
    #[case::no_probe(ControllerConfig { ground_probe_distance: 0.0, ..default() })]
    fn invalid_configs_are_rejected(#[case] config: ControllerConfig) {
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case(0.0)]
    #[case(45.0)]
    #[case(90.0)]
    fn slope_limit_bounds_are_inclusive(#[case] slope_limit_degrees: Scalar) {
        let config = ControllerConfig {
            slope_limit_degrees,
            ..default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn partial_ron_uses_defaults() {
        let config = ControllerConfig::from_ron_str(
            "(skin_width: 0.02, slope_limit_degrees: 50.0, ground_detection: Either)",
        )
        .unwrap();
        assert_eq!(config.skin_width, 0.02);
        assert_eq!(config.slope_limit_degrees, 50.0);
        assert_eq!(config.ground_detection, GroundDetection::Either);
        assert_eq!(config.max_iterations, ControllerConfig::default().max_iterations);
    }

    #[test]
    fn ron_values_are_validated() {
        let error = ControllerConfig::from_ron_str("(max_iterations: 0)").unwrap_err();
        assert!(matches!(error, ConfigError::MaxIterations));
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let error = ControllerConfig::from_ron_str("(skin_width: \"wide\")").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn bundled_player_config_parses() {
        let config =
            ControllerConfig::from_ron_str(include_str!("../../assets/controllers/player.ron"))
                .unwrap();
        assert!(config.max_iterations >= 1);
    }

    #[test]
    fn right_is_clockwise_from_up() {
        let config = ControllerConfig::default();
        assert_eq!(config.right_direction(), Vector::X);
    }
}
