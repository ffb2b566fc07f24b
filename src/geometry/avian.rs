//! [`GeometryQuery`] on top of avian2d's spatial query pipeline.
use core::convert::Infallible;

use avian2d::math::{AdjustPrecision as _, AsF32 as _, Scalar, Vector};
use avian2d::{collision::collider::contact_query::contact_manifolds, prelude::*};
use bevy::{ecs::system::SystemParam, math::Dir2, prelude::*};

use super::{GeometryQuery, OverlapContact, SurfaceContact};

/// Upper bound on contacts collected by a single shape cast.
const MAX_HITS: u32 = 16;

/// A [`SystemParam`] giving character controllers access to avian2d colliders.
///
/// Call [`AvianGeometry::for_body`] to bind it to the collider of the body being moved;
/// the result implements [`GeometryQuery`] and never reports the body itself.
#[derive(SystemParam)]
pub struct AvianGeometry<'w, 's> {
    /// The [`SpatialQueryPipeline`] used to perform shape casts.
    pub query_pipeline: Res<'w, SpatialQueryPipeline>,
    /// The [`Query`] used to fetch colliders for contact manifolds.
    pub colliders: Query<
        'w,
        's,
        (
            &'static Collider,
            &'static Position,
            &'static Rotation,
            Option<&'static CollisionLayers>,
        ),
    >,
}

impl<'w, 's> AvianGeometry<'w, 's> {
    /// Binds the pipeline to the collider of `entity`.
    pub fn for_body<'a>(
        &'a self,
        entity: Entity,
        shape: &'a Collider,
        shape_rotation: Scalar,
    ) -> BodyGeometry<'a, 'w, 's> {
        BodyGeometry {
            geometry: self,
            entity,
            shape,
            shape_rotation,
        }
    }
}

/// An [`AvianGeometry`] bound to the shape of one body.
pub struct BodyGeometry<'a, 'w, 's> {
    geometry: &'a AvianGeometry<'w, 's>,
    entity: Entity,
    shape: &'a Collider,
    shape_rotation: Scalar,
}

impl BodyGeometry<'_, '_, '_> {
    fn filter(&self, mask: LayerMask) -> SpatialQueryFilter {
        SpatialQueryFilter::from_mask(mask).with_excluded_entities([self.entity])
    }
}

impl GeometryQuery for BodyGeometry<'_, '_, '_> {
    type Error = Infallible;

    fn cast(
        &self,
        origin: Vector,
        direction: Dir2,
        max_distance: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<SurfaceContact>, Self::Error> {
        // Penetrations at the origin are left to the overlap query; reporting them here would
        // block every move that starts in contact with the ground.
        let config = ShapeCastConfig {
            ignore_origin_penetration: true,
            ..ShapeCastConfig::from_max_distance(max_distance)
        };
        let hits = self.geometry.query_pipeline.shape_hits(
            self.shape,
            origin,
            self.shape_rotation,
            direction,
            MAX_HITS,
            &config,
            &self.filter(mask),
        );
        Ok(hits
            .into_iter()
            .map(|hit| SurfaceContact {
                normal: hit.normal1,
                distance: hit.distance.max(0.0),
                body: Some(hit.entity),
            })
            .collect())
    }

    fn overlap(
        &self,
        origin: Vector,
        margin: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<OverlapContact>, Self::Error> {
        let filter = self.filter(mask);
        let expanded_aabb = self
            .shape
            .aabb(origin, self.shape_rotation)
            .grow(Vector::splat(margin));
        let aabb_intersections = self
            .geometry
            .query_pipeline
            .aabb_intersections_with_aabb(expanded_aabb);

        let mut contacts = Vec::new();
        for intersection_entity in aabb_intersections {
            let Ok((intersection_collider, intersection_pos, intersection_rot, layers)) =
                self.geometry.colliders.get(intersection_entity)
            else {
                continue;
            };
            let layers = layers.copied().unwrap_or_default();
            if !filter.test(intersection_entity, layers) {
                continue;
            }
            let mut manifolds = Vec::new();
            contact_manifolds(
                self.shape,
                origin,
                self.shape_rotation,
                intersection_collider,
                *intersection_pos,
                *intersection_rot,
                margin,
                &mut manifolds,
            );
            for manifold in manifolds {
                let Some(deepest) = manifold.find_deepest_contact() else {
                    continue;
                };
                contacts.push(OverlapContact {
                    normal: (-manifold.normal.f32()).adjust_precision(),
                    penetration: deepest.penetration,
                    body: Some(intersection_entity),
                });
            }
        }
        Ok(contacts)
    }
}
