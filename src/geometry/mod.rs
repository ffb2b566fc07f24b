//! The boundary between the movement core and whatever answers spatial questions about the world.
//!
//! The movement code never does geometry itself. It asks a [`GeometryQuery`] where a swept shape
//! would touch something, and how deep the shape currently sits inside its surroundings.
//! Two implementations ship with the crate:
//!
//! - [`scene::StaticScene`], an in-memory set of half-planes and segments with no ECS involved.
//! - [`avian::AvianGeometry`], a [`SystemParam`](bevy::ecs::system::SystemParam) backed by avian2d's spatial query pipeline.
use avian2d::math::{Scalar, Vector};
use avian2d::prelude::LayerMask;
use bevy::{math::Dir2, prelude::Entity};

pub mod avian;
pub mod scene;

/// A surface touched by a shape cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    /// Unit surface normal, pointing away from the surface into free space.
    pub normal: Vector,
    /// Distance travelled along the cast direction before touching the surface. Never negative.
    pub distance: Scalar,
    /// The body the surface belongs to, if the query knows it.
    pub body: Option<Entity>,
}

/// A surface the shape overlaps (or nearly overlaps) at a fixed position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapContact {
    /// Unit direction that separates the shape from the surface.
    pub normal: Vector,
    /// How deep the shape sits inside the surface.
    /// Negative values mean the shape is outside, but within the margin of the query.
    pub penetration: Scalar,
    /// The body the surface belongs to, if the query knows it.
    pub body: Option<Entity>,
}

/// Shape-cast and overlap queries against the world.
///
/// Implementors are bound to the shape of one body: the cast shape, its rotation and the body's
/// own collider (which must never be reported) are captured when the query value is created.
/// Results are finite and consumed immediately; the order of contacts is not significant.
#[cfg_attr(test, mockall::automock(type Error = core::convert::Infallible;))]
pub trait GeometryQuery {
    /// Failure raised by the underlying world. The movement code never catches it.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sweeps the shape from `origin` along `direction` and reports every surface touched
    /// within `max_distance`, restricted to colliders on `mask`.
    fn cast(
        &self,
        origin: Vector,
        direction: Dir2,
        max_distance: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<SurfaceContact>, Self::Error>;

    /// Reports every surface closer than `margin` to the shape placed at `origin`.
    fn overlap(
        &self,
        origin: Vector,
        margin: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<OverlapContact>, Self::Error>;
}

impl<G: GeometryQuery + ?Sized> GeometryQuery for &G {
    type Error = G::Error;

    fn cast(
        &self,
        origin: Vector,
        direction: Dir2,
        max_distance: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<SurfaceContact>, Self::Error> {
        (**self).cast(origin, direction, max_distance, mask)
    }

    fn overlap(
        &self,
        origin: Vector,
        margin: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<OverlapContact>, Self::Error> {
        (**self).overlap(origin, margin, mask)
    }
}

/// The single contact of a cast that matters for movement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastResult {
    /// Unit normal of the selected contact. Zero when nothing was hit.
    pub normal: Vector,
    /// Distance to the selected contact along the cast. Zero when nothing was hit.
    pub distance: Scalar,
    /// Whether anything blocks the cast at all.
    pub collided: bool,
    /// The body that was hit.
    pub body: Option<Entity>,
}

impl CastResult {
    pub const MISS: Self = Self {
        normal: Vector::ZERO,
        distance: 0.0,
        collided: false,
        body: None,
    };

    /// Picks the nearest contact that opposes motion along `direction`.
    ///
    /// Surfaces the motion runs parallel to or away from cannot block it and are skipped, as are
    /// contacts with a degenerate normal. Ties keep the contact that came first.
    #[must_use]
    pub fn nearest(contacts: &[SurfaceContact], direction: Dir2) -> Self {
        let mut best = Self::MISS;
        for contact in contacts {
            let normal = contact.normal.normalize_or_zero();
            if normal == Vector::ZERO || direction.dot(normal) >= 0.0 {
                continue;
            }
            let distance = contact.distance.max(0.0);
            if !best.collided || distance < best.distance {
                best = Self {
                    normal,
                    distance,
                    collided: true,
                    body: contact.body,
                };
            }
        }
        best
    }
}
