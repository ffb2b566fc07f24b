//! A small in-memory world of half-planes and segments.
//!
//! Good enough to drive the controller headless (servers, tools, tests) without spinning up an
//! avian2d pipeline. The swept shape is a circle; a radius of zero turns every query into a ray.
use core::convert::Infallible;

use avian2d::math::{Scalar, Vector};
use avian2d::prelude::LayerMask;
use bevy::{math::Dir2, prelude::Entity};

use super::{GeometryQuery, OverlapContact, SurfaceContact};

/// Below this length a segment is treated as a point and a separation vector as zero.
const GEOMETRY_EPSILON: Scalar = 1e-6;

/// A static piece of geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Obstacle {
    /// Everything behind the line through `point` with outward `normal` is solid.
    HalfPlane { point: Vector, normal: Vector },
    /// A two-sided line segment.
    Segment { a: Vector, b: Vector },
}

impl Obstacle {
    /// A half-plane whose surface passes through `point`. The normal is normalized.
    pub fn half_plane(point: Vector, normal: Vector) -> Self {
        Self::HalfPlane {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    pub fn segment(a: Vector, b: Vector) -> Self {
        Self::Segment { a, b }
    }
}

#[derive(Clone, Debug)]
struct Placed {
    obstacle: Obstacle,
    layers: LayerMask,
    body: Option<Entity>,
}

/// A collection of static [`Obstacle`]s.
#[derive(Clone, Debug, Default)]
pub struct StaticScene {
    obstacles: Vec<Placed>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`StaticScene::add`].
    #[must_use]
    pub fn with(mut self, obstacle: Obstacle) -> Self {
        self.add(obstacle);
        self
    }

    /// Adds an obstacle on every layer.
    pub fn add(&mut self, obstacle: Obstacle) -> &mut Self {
        self.add_on_layers(obstacle, LayerMask::ALL, None)
    }

    /// Adds an obstacle that only collides with queries whose mask shares a bit with `layers`.
    pub fn add_on_layers(
        &mut self,
        obstacle: Obstacle,
        layers: LayerMask,
        body: Option<Entity>,
    ) -> &mut Self {
        if matches!(obstacle, Obstacle::HalfPlane { normal, .. } if normal == Vector::ZERO) {
            tracing::warn!("ignoring half-plane without a normal");
            return self;
        }
        self.obstacles.push(Placed {
            obstacle,
            layers,
            body,
        });
        self
    }

    /// Adds the four sides of an axis-aligned box.
    pub fn add_rect(&mut self, center: Vector, half_extents: Vector) -> &mut Self {
        let min = center - half_extents;
        let max = center + half_extents;
        let corners = [
            Vector::new(min.x, min.y),
            Vector::new(max.x, min.y),
            Vector::new(max.x, max.y),
            Vector::new(min.x, max.y),
        ];
        for i in 0..corners.len() {
            self.add(Obstacle::segment(corners[i], corners[(i + 1) % corners.len()]));
        }
        self
    }

    /// Binds a swept circle of `radius` to the scene.
    pub fn query(&self, radius: Scalar) -> SceneQuery<'_> {
        SceneQuery {
            scene: self,
            radius: radius.max(0.0),
        }
    }

    fn on_mask(&self, mask: LayerMask) -> impl Iterator<Item = &Placed> {
        self.obstacles
            .iter()
            .filter(move |placed| placed.layers.0 & mask.0 != 0)
    }
}

/// A [`StaticScene`] seen through a circle of a given radius.
#[derive(Clone, Copy, Debug)]
pub struct SceneQuery<'a> {
    scene: &'a StaticScene,
    radius: Scalar,
}

impl GeometryQuery for SceneQuery<'_> {
    type Error = Infallible;

    fn cast(
        &self,
        origin: Vector,
        direction: Dir2,
        max_distance: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<SurfaceContact>, Self::Error> {
        let direction = direction.as_vec2();
        Ok(self
            .scene
            .on_mask(mask)
            .filter_map(|placed| {
                let (normal, distance) = match placed.obstacle {
                    Obstacle::HalfPlane { point, normal } => {
                        cast_half_plane(origin, direction, self.radius, point, normal)?
                    }
                    Obstacle::Segment { a, b } => {
                        cast_segment(origin, direction, self.radius, a, b)?
                    }
                };
                (distance <= max_distance).then_some(SurfaceContact {
                    normal,
                    distance,
                    body: placed.body,
                })
            })
            .collect())
    }

    fn overlap(
        &self,
        origin: Vector,
        margin: Scalar,
        mask: LayerMask,
    ) -> Result<Vec<OverlapContact>, Self::Error> {
        Ok(self
            .scene
            .on_mask(mask)
            .filter_map(|placed| {
                let (normal, separation) = match placed.obstacle {
                    Obstacle::HalfPlane { point, normal } => (normal, (origin - point).dot(normal)),
                    Obstacle::Segment { a, b } => {
                        let closest = closest_point_on_segment(a, b, origin);
                        let offset = origin - closest;
                        let length = offset.length();
                        let normal = if length > GEOMETRY_EPSILON {
                            offset / length
                        } else {
                            segment_normal_facing(a, b, origin)?
                        };
                        (normal, length)
                    }
                };
                let penetration = self.radius - separation;
                (penetration > -margin).then_some(OverlapContact {
                    normal,
                    penetration,
                    body: placed.body,
                })
            })
            .collect())
    }
}

/// Time of impact of a circle moving along the unit `direction` against a one-sided half-plane.
fn cast_half_plane(
    origin: Vector,
    direction: Vector,
    radius: Scalar,
    point: Vector,
    normal: Vector,
) -> Option<(Vector, Scalar)> {
    let gap = (origin - point).dot(normal) - radius;
    let approach = -direction.dot(normal);
    if approach <= 0.0 {
        return None;
    }
    // Already touching or inside: the contact is immediate.
    Some((normal, (gap / approach).max(0.0)))
}

fn cast_segment(
    origin: Vector,
    direction: Vector,
    radius: Scalar,
    a: Vector,
    b: Vector,
) -> Option<(Vector, Scalar)> {
    // Starting inside the swept radius of the segment.
    let closest = closest_point_on_segment(a, b, origin);
    let offset = origin - closest;
    let separation = offset.length();
    if radius > 0.0 && separation < radius {
        let normal = if separation > GEOMETRY_EPSILON {
            offset / separation
        } else {
            segment_normal_facing(a, b, origin)?
        };
        return (direction.dot(normal) < 0.0).then_some((normal, 0.0));
    }

    let mut best: Option<(Vector, Scalar)> = None;
    let mut keep = |candidate: (Vector, Scalar)| {
        match best {
            Some((_, distance)) if distance <= candidate.1 => {}
            _ => best = Some(candidate),
        }
    };

    // Face of the segment, offset by the radius.
    if let Some(normal) = segment_normal_facing(a, b, origin) {
        let gap = (origin - a).dot(normal) - radius;
        let approach = -direction.dot(normal);
        if approach > 0.0 && gap >= 0.0 {
            let distance = gap / approach;
            let center = origin + direction * distance;
            let edge = b - a;
            let along = (center - a).dot(edge) / edge.length_squared();
            if (0.0..=1.0).contains(&along) {
                keep((normal, distance));
            }
        }
    }

    // Rounded caps at both ends.
    if radius > 0.0 {
        for end in [a, b] {
            if let Some(distance) = ray_circle(origin, direction, end, radius) {
                let normal = (origin + direction * distance - end).normalize_or_zero();
                if normal != Vector::ZERO {
                    keep((normal, distance));
                }
            }
        }
    }

    best
}

/// Entry distance of a ray into a circle, if the ray starts outside and reaches it.
fn ray_circle(origin: Vector, direction: Vector, center: Vector, radius: Scalar) -> Option<Scalar> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    if c < 0.0 || b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

fn closest_point_on_segment(a: Vector, b: Vector, point: Vector) -> Vector {
    let edge = b - a;
    let length_squared = edge.length_squared();
    if length_squared < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return a;
    }
    let t = ((point - a).dot(edge) / length_squared).clamp(0.0, 1.0);
    a + edge * t
}

/// The segment normal on the side of `point`. `None` for degenerate segments.
fn segment_normal_facing(a: Vector, b: Vector, point: Vector) -> Option<Vector> {
    let normal = (b - a).perp().normalize_or_zero();
    if normal == Vector::ZERO {
        return None;
    }
    Some(if (point - a).dot(normal) >= 0.0 {
        normal
    } else {
        -normal
    })
}
