//! A short probe below the character that confirms whether it stands on walkable ground.
use avian2d::math::{Scalar, Vector};
use bevy::{math::Dir2, prelude::*};

use super::config::ControllerConfig;
use super::slope::{self, SlopeClass};
use crate::geometry::GeometryQuery;

/// What the ground probe found after a move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct GroundState {
    pub grounded: bool,
    /// Normal of the walkable ground below, when grounded.
    pub normal: Option<Vector>,
    /// Signed slope of that ground in degrees, zero when airborne.
    pub angle: Scalar,
    /// The body the ground belongs to, if the geometry knows it.
    pub body: Option<Entity>,
}

impl GroundState {
    pub const AIRBORNE: Self = Self {
        grounded: false,
        normal: None,
        angle: 0.0,
        body: None,
    };

    fn on(normal: Vector, class: SlopeClass, body: Option<Entity>) -> Self {
        Self {
            grounded: true,
            normal: Some(normal),
            angle: class.signed_angle,
            body,
        }
    }
}

/// Probes [`ControllerConfig::ground_probe_distance`] below `position`.
///
/// The probe is a cast along the down axis. When nothing walkable is found that way, an overlap
/// query with the probe distance as margin catches ground the character is resting in.
pub fn sense_ground<G: GeometryQuery>(
    geometry: &G,
    position: Vector,
    config: &ControllerConfig,
) -> Result<GroundState, G::Error> {
    let Ok(down) = Dir2::new(-config.up_direction) else {
        return Ok(GroundState::AIRBORNE);
    };
    let classify = |normal: Vector| {
        let class = slope::classify(normal, config.up_direction, config.slope_limit_degrees);
        class.is_walkable_ground().then_some(class)
    };

    let contacts = geometry.cast(
        position,
        down,
        config.ground_probe_distance,
        config.collision_mask,
    )?;
    let cast_hit = contacts
        .iter()
        .filter_map(|contact| {
            let normal = contact.normal.normalize_or_zero();
            classify(normal).map(|class| (contact.distance, normal, class, contact.body))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((_, normal, class, body)) = cast_hit {
        return Ok(GroundState::on(normal, class, body));
    }

    let overlaps = geometry.overlap(
        position,
        config.ground_probe_distance,
        config.collision_mask,
    )?;
    let overlap_hit = overlaps
        .iter()
        .filter_map(|contact| {
            let normal = contact.normal.normalize_or_zero();
            classify(normal).map(|class| (contact.penetration, normal, class, contact.body))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0));
    Ok(match overlap_hit {
        Some((_, normal, class, body)) => GroundState::on(normal, class, body),
        None => GroundState::AIRBORNE,
    })
}
