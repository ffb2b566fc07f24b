//! Contains the *move and slide* algorithm used by [`CharacterController`](super::controller::CharacterController).
//!
//! See the documentation of [`MovementResolver`] for more information.
use avian2d::math::{Scalar, Vector};
use bevy::math::Dir2;

use super::config::ControllerConfig;
use super::flags::CollisionFlags;
use super::response::respond;
use super::slope::{self, SlopeClass, SurfaceSide};
use crate::geometry::{CastResult, GeometryQuery, SurfaceContact};

/// Squared length of remaining motion below which a pass may stop early.
const EARLY_EXIT_EPSILON: Scalar = 1e-5;

/// The *move and slide* algorithm, also known as *collide and slide* or *step slide*.
///
/// Move and slide is the core movement and collision algorithm used by most kinematic character controllers.
/// It attempts to move a shape along a desired displacement, while sliding along any surfaces it hits on the way.
///
/// # Algorithm
///
/// 1. Probe the whole displacement. If nothing is within reach, move the full distance and stop.
/// 2. Split the displacement into a vertical part (along [`ControllerConfig::up_direction`]) and a
///    horizontal part (the rest). Resolve the horizontal part first, then the vertical part.
/// 3. In each pass, until the motion is used up or [`ControllerConfig::max_iterations`] is reached:
///    - Sweep the shape towards the target.
///    - If nothing is hit, move to the target.
///    - Otherwise move up to the hit, keeping [`ControllerConfig::skin_width`] of clearance.
///    - Classify the surface and either slide along it or stop, depending on the pass.
///
/// The order of the passes matters: the horizontal pass decides whether the character is on a
/// slope, and the vertical pass decides whether it lands or bumps its head. Swapping them changes
/// how characters behave on slopes.
///
/// Running out of iterations is not an error. The character stays where the last iteration left it.
///
/// # Resources
///
/// - [*Collide And Slide - \*Actually Decent\* Character Collision From Scratch*](https://youtu.be/YR6Q7dUz2uk) by [Poke Dev](https://www.youtube.com/@poke_gamedev) (video)
/// - [`PM_SlideMove`](https://github.com/id-Software/Quake-III-Arena/blob/dbe4ddb10315479fc00086f08e25d968b4b43c49/code/game/bg_slidemove.c#L45) in Quake III Arena (source code)
#[doc(alias = "CollideAndSlide")]
#[doc(alias = "StepSlide")]
pub struct MovementResolver<'a, G> {
    geometry: &'a G,
    config: &'a ControllerConfig,
}

/// One of the two passes of a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Motion perpendicular to up. Resolved first.
    Horizontal,
    /// Motion along up.
    Vertical,
}

/// State threaded through the iterations of one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementStep {
    pub start: Vector,
    pub current: Vector,
    pub target: Vector,
    /// Normal of the last surface hit in this pass.
    pub normal: Vector,
    /// Distance advanced towards hits so far.
    pub distance_consumed: Scalar,
    pub remaining: Scalar,
}

impl MovementStep {
    fn new(start: Vector, motion: Vector) -> Self {
        Self {
            start,
            current: start,
            target: start + motion,
            normal: Vector::ZERO,
            distance_consumed: 0.0,
            remaining: motion.length(),
        }
    }
}

/// Output from [`MovementResolver::resolve`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Where the character ends up.
    pub position: Vector,
    /// Everything touched on the way.
    pub flags: CollisionFlags,
    /// Number of sweeps performed by the two passes, not counting the initial probe.
    pub iterations: usize,
}

impl<'a, G: GeometryQuery> MovementResolver<'a, G> {
    pub fn new(geometry: &'a G, config: &'a ControllerConfig) -> Self {
        Self { geometry, config }
    }

    /// Moves a character from `start` by `displacement`.
    ///
    /// `ground_normal` is the walkable ground the character stood on before the move. When given
    /// and [`ControllerConfig::align_to_ground`] is set, horizontal motion follows that ground
    /// instead of heading into it.
    ///
    /// A zero or non-finite displacement returns `start` without touching the geometry.
    #[doc(alias = "collide_and_slide")]
    #[doc(alias = "step_slide")]
    pub fn resolve(
        &self,
        start: Vector,
        displacement: Vector,
        ground_normal: Option<Vector>,
    ) -> Result<Resolution, G::Error> {
        let mut resolution = Resolution {
            position: start,
            ..Default::default()
        };
        if !displacement.is_finite() {
            tracing::warn!(?displacement, "ignoring non-finite displacement");
            return Ok(resolution);
        }
        if displacement == Vector::ZERO {
            return Ok(resolution);
        }

        let up = self.config.up_direction;
        let vertical = up * displacement.dot(up);
        let (horizontal, displacement) = match self.align(displacement - vertical, ground_normal) {
            Some(aligned) => (aligned, aligned + vertical),
            None => (displacement - vertical, displacement),
        };

        // Fast path: most steps never come close to anything.
        if let Ok((direction, length)) = Dir2::new_and_length(displacement) {
            let contacts = self.geometry.cast(
                start,
                direction,
                length + self.config.skin_width,
                self.config.collision_mask,
            )?;
            if !CastResult::nearest(&contacts, direction).collided {
                resolution.position = start + displacement;
                return Ok(resolution);
            }
        }

        let position = self.run_pass(Pass::Horizontal, start, horizontal, &mut resolution)?;
        resolution.position = self.run_pass(Pass::Vertical, position, vertical, &mut resolution)?;
        Ok(resolution)
    }

    /// Horizontal motion redirected along the ground, if there is ground to follow.
    fn align(&self, horizontal: Vector, ground_normal: Option<Vector>) -> Option<Vector> {
        let normal = ground_normal.filter(|_| self.config.align_to_ground)?;
        let class = slope::classify(
            normal,
            self.config.up_direction,
            self.config.slope_limit_degrees,
        );
        if !class.is_walkable_ground() {
            return None;
        }
        let normal = normal.normalize_or_zero();
        let tangent = Vector::new(normal.y, -normal.x);
        Some(tangent * horizontal.dot(self.config.right_direction()))
    }

    /// Runs one pass of the loop and returns where it ended.
    pub fn run_pass(
        &self,
        pass: Pass,
        start: Vector,
        motion: Vector,
        resolution: &mut Resolution,
    ) -> Result<Vector, G::Error> {
        let config = self.config;
        let right = config.right_direction();
        let mut step = MovementStep::new(start, motion);

        for _ in 0..config.max_iterations {
            let Ok((direction, remaining)) = Dir2::new_and_length(step.target - step.current)
            else {
                // No movement left
                return Ok(step.current);
            };
            step.remaining = remaining;
            resolution.iterations += 1;

            let contacts = self.geometry.cast(
                step.current,
                direction,
                remaining + config.skin_width,
                config.collision_mask,
            )?;
            let hit = CastResult::nearest(&contacts, direction);
            if !hit.collided {
                tracing::trace!(?pass, remaining, "clear");
                return Ok(step.target);
            }

            // Move up to the hit point.
            let advance = (hit.distance - config.skin_width).clamp(0.0, remaining);
            step.current += direction * advance;
            step.current += self.restore_skin(&contacts, direction, advance);
            step.distance_consumed += advance;
            step.normal = hit.normal;

            let class = slope::classify(hit.normal, config.up_direction, config.slope_limit_degrees);
            let (flags, slide) = pass.policy(&class, hit.normal, right, config);
            resolution.flags |= flags;
            step.target = if slide {
                respond(
                    step.current,
                    step.target,
                    hit.normal,
                    config.friction,
                    config.bounciness,
                )
            } else {
                step.current
            };
            tracing::trace!(
                ?pass,
                distance = hit.distance,
                angle = class.signed_angle,
                walkable = class.walkable,
                slide,
                ?flags,
                "hit"
            );

            if config.early_exit
                && (step.target - step.current).length_squared() < EARLY_EXIT_EPSILON
            {
                return Ok(step.current);
            }
        }

        if step.current != step.target {
            tracing::debug!(
                ?pass,
                iterations = config.max_iterations,
                left = step.current.distance(step.target),
                "ran out of iterations"
            );
        }
        Ok(step.current)
    }

    /// Pushes the shape back out to [`ControllerConfig::skin_width`] from every surface of `contacts`
    /// that it ended up closer to than that after advancing `advance` along `direction`.
    fn restore_skin(&self, contacts: &[SurfaceContact], direction: Dir2, advance: Scalar) -> Vector {
        let skin_width = self.config.skin_width;
        let intersections: Vec<(Vector, Scalar)> = contacts
            .iter()
            .filter_map(|contact| {
                let normal = contact.normal.normalize_or_zero();
                let approach = -direction.dot(normal);
                if approach <= 0.0 {
                    return None;
                }
                let gap = (contact.distance - advance) * approach;
                (gap < skin_width).then_some((normal, skin_width - gap))
            })
            .collect();
        depenetrate(self.config, &intersections)
    }

    /// Moves the shape at `position` so that it no longer intersects anything and keeps a distance
    /// of [`ControllerConfig::skin_width`] to all surfaces.
    ///
    /// Meant for placing a character into the world. Moves never need it.
    ///
    /// Returns the displacement to add to `position`.
    pub fn depenetrate_all(&self, position: Vector) -> Result<Vector, G::Error> {
        let skin_width = self.config.skin_width;
        let intersections: Vec<(Vector, Scalar)> = self
            .geometry
            .overlap(position, skin_width, self.config.collision_mask)?
            .into_iter()
            .filter_map(|contact| {
                let normal = contact.normal.normalize_or_zero();
                let total_penetration = contact.penetration + skin_width;
                (normal != Vector::ZERO && total_penetration > 0.0)
                    .then_some((normal, total_penetration))
            })
            .collect();
        Ok(depenetrate(self.config, &intersections))
    }
}

impl Pass {
    /// Which flags a hit sets, and whether the character slides along the surface.
    fn policy(
        self,
        class: &SlopeClass,
        normal: Vector,
        right: Vector,
        config: &ControllerConfig,
    ) -> (CollisionFlags, bool) {
        match self {
            Self::Horizontal => {
                let slide = class.walkable
                    && match class.side {
                        SurfaceSide::Ground => config.slide_on_ground,
                        SurfaceSide::Ceiling => config.slide_on_ceilings,
                    };
                let flags = CollisionFlags::side_of(normal, right);
                if slide {
                    (flags | CollisionFlags::SHALLOW_SLOPE, true)
                } else {
                    (flags, false)
                }
            }
            Self::Vertical if class.walkable => {
                let flags = match class.side {
                    SurfaceSide::Ground => CollisionFlags::BOTTOM,
                    SurfaceSide::Ceiling => CollisionFlags::TOP,
                };
                (flags, false)
            }
            Self::Vertical => {
                let slide = config.force_slide_on_steep
                    && (class.side == SurfaceSide::Ground || config.slide_on_ceilings);
                (
                    CollisionFlags::STEEP_SLOPE | CollisionFlags::side_of(normal, right),
                    slide,
                )
            }
        }
    }
}

/// Solves a set of `(normal, depth)` constraints and returns the displacement that satisfies them.
///
/// Depenetration is an iterative process that solves penetrations for all planes bit-by-bit, until we either reached
/// [`ControllerConfig::depenetration_iterations`] or the accumulated error is less than [`ControllerConfig::max_depenetration_error`].
/// If the iterations run out first, the current best attempt is returned.
#[must_use]
pub fn depenetrate(config: &ControllerConfig, intersections: &[(Vector, Scalar)]) -> Vector {
    if intersections.is_empty() {
        return Vector::ZERO;
    }

    let mut fixup = Vector::ZERO;
    for _ in 0..config.depenetration_iterations {
        let mut total_error = 0.0;
        for (normal, dist) in intersections {
            let error = (dist - fixup.dot(*normal)).max(0.0);
            total_error += error;
            fixup += error * *normal;
        }
        if total_error < config.max_depenetration_error {
            break;
        }
    }
    fixup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::scene::{Obstacle, StaticScene};
    use crate::geometry::{MockGeometryQuery, OverlapContact};
    use approx::assert_relative_eq;
    use avian2d::prelude::LayerMask;
    use core::convert::Infallible;
    use proptest::prelude::*;

    const SKIN: Scalar = 0.01;

    fn config() -> ControllerConfig {
        ControllerConfig {
            skin_width: SKIN,
            slope_limit_degrees: 45.0,
            ..ControllerConfig::default()
        }
    }

    fn resolve(scene: &StaticScene, config: &ControllerConfig, start: Vector, d: Vector) -> Resolution {
        let query = scene.query(0.0);
        let Ok(resolution) = MovementResolver::new(&query, config).resolve(start, d, None);
        resolution
    }

    fn ground() -> StaticScene {
        StaticScene::new().with(Obstacle::half_plane(Vector::ZERO, Vector::Y))
    }

    /// A half-plane whose normal is `degrees` from up, facing the character's left.
    fn slope_through(point: Vector, degrees: Scalar) -> Obstacle {
        let radians = degrees.to_radians();
        Obstacle::half_plane(point, Vector::new(-radians.sin(), radians.cos()))
    }

    #[test]
    fn flat_ground_walk() {
        let resolution = resolve(&ground(), &config(), Vector::ZERO, Vector::new(1.0, -0.001));
        assert_relative_eq!(resolution.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(resolution.position.y, SKIN, epsilon = 1e-5);
        assert!(resolution.flags.contains(CollisionFlags::BOTTOM));
    }

    #[test]
    fn wall_blocks() {
        let scene = StaticScene::new().with(Obstacle::half_plane(Vector::X, Vector::NEG_X));
        let resolution = resolve(&scene, &config(), Vector::ZERO, Vector::new(5.0, 0.0));
        assert_relative_eq!(resolution.position.x, 1.0 - SKIN, epsilon = 1e-5);
        assert_relative_eq!(resolution.position.y, 0.0, epsilon = 1e-6);
        assert!(resolution.flags.contains(CollisionFlags::FRONT));
        assert!(!resolution.flags.contains(CollisionFlags::BACK));
    }

    #[test]
    fn wall_behind_is_back() {
        let scene = StaticScene::new().with(Obstacle::half_plane(Vector::NEG_X, Vector::X));
        let resolution = resolve(&scene, &config(), Vector::ZERO, Vector::new(-5.0, 0.0));
        assert_relative_eq!(resolution.position.x, -1.0 + SKIN, epsilon = 1e-5);
        assert!(resolution.flags.contains(CollisionFlags::BACK));
    }

    #[test]
    fn steep_slope_stops_horizontal_motion() {
        let scene = StaticScene::new().with(slope_through(Vector::X, 80.0));
        let resolution = resolve(&scene, &config(), Vector::ZERO, Vector::new(3.0, 0.0));
        // Stopped at the slope instead of climbing it.
        assert!(resolution.position.x < 1.0);
        assert_relative_eq!(resolution.position.y, 0.0, epsilon = 1e-3);
        assert!(resolution.flags.contains(CollisionFlags::FRONT));
        assert!(!resolution.flags.contains(CollisionFlags::SHALLOW_SLOPE));
    }

    #[test]
    fn walkable_ramp_is_climbed() {
        let scene = StaticScene::new()
            .with(Obstacle::half_plane(Vector::ZERO, Vector::Y))
            .with(slope_through(Vector::new(1.0, 0.0), 30.0));
        let resolution = resolve(&scene, &config(), Vector::new(0.0, SKIN), Vector::new(3.0, 0.0));
        assert!(resolution.position.x > 1.0);
        assert!(resolution.position.y > 0.5);
        assert!(
            resolution
                .flags
                .contains(CollisionFlags::FRONT | CollisionFlags::SHALLOW_SLOPE)
        );
    }

    #[test]
    fn rising_into_a_ramp_is_not_a_landing() {
        let scene = StaticScene::new().with(slope_through(Vector::X, 30.0));
        let resolution = resolve(&scene, &config(), Vector::new(0.5, 0.1), Vector::new(2.0, 0.3));
        assert_eq!(
            resolution.flags,
            CollisionFlags::FRONT | CollisionFlags::SHALLOW_SLOPE
        );
        assert!(resolution.position.y > 0.4);
    }

    #[test]
    fn ramp_without_ground_slide_is_a_stop() {
        let scene = StaticScene::new().with(slope_through(Vector::X, 30.0));
        let config = ControllerConfig {
            slide_on_ground: false,
            ..config()
        };
        let resolution = resolve(&scene, &config, Vector::ZERO, Vector::new(3.0, 0.0));
        assert!(resolution.position.x < 1.0);
        assert_eq!(resolution.flags, CollisionFlags::FRONT);
    }

    #[test]
    fn falling_onto_steep_slope_slides_off() {
        let scene = StaticScene::new().with(slope_through(Vector::ZERO, 60.0));
        let resolution = resolve(&scene, &config(), Vector::new(0.0, 1.0), Vector::new(0.0, -3.0));
        assert!(resolution.flags.contains(CollisionFlags::STEEP_SLOPE));
        assert!(!resolution.flags.contains(CollisionFlags::BOTTOM));
        // Pushed down the slope, to the left.
        assert!(resolution.position.x < -0.1);
    }

    #[test]
    fn steep_slope_without_forced_slide_holds() {
        let scene = StaticScene::new().with(slope_through(Vector::ZERO, 60.0));
        let config = ControllerConfig {
            force_slide_on_steep: false,
            ..config()
        };
        let resolution = resolve(&scene, &config, Vector::new(0.0, 1.0), Vector::new(0.0, -3.0));
        assert!(resolution.flags.contains(CollisionFlags::STEEP_SLOPE));
        assert_relative_eq!(resolution.position.x, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn landing_sets_bottom() {
        let resolution = resolve(&ground(), &config(), Vector::new(0.0, 2.0), Vector::new(0.0, -5.0));
        assert_relative_eq!(resolution.position.y, SKIN, epsilon = 1e-5);
        assert_eq!(resolution.flags, CollisionFlags::BOTTOM);
    }

    #[test]
    fn head_bump_sets_top() {
        let scene = StaticScene::new().with(Obstacle::half_plane(Vector::Y, Vector::NEG_Y));
        let resolution = resolve(&scene, &config(), Vector::ZERO, Vector::new(0.0, 5.0));
        assert_relative_eq!(resolution.position.y, 1.0 - SKIN, epsilon = 1e-5);
        assert_eq!(resolution.flags, CollisionFlags::TOP);
    }

    /// Two steep slopes meeting at the origin, leaving a narrow V open upwards.
    fn v_groove() -> StaticScene {
        let radians = (60.0 as Scalar).to_radians();
        StaticScene::new()
            .with(Obstacle::half_plane(Vector::ZERO, Vector::new(radians.sin(), radians.cos())))
            .with(Obstacle::half_plane(Vector::ZERO, Vector::new(-radians.sin(), radians.cos())))
    }

    #[test]
    fn falling_into_a_v_groove_is_crushing() {
        let resolution = resolve(&v_groove(), &config(), Vector::new(0.0, 1.0), Vector::new(0.0, -2.0));
        assert!(resolution.flags.contains(CollisionFlags::FRONT | CollisionFlags::BACK));
        assert!(resolution.flags.contains(CollisionFlags::STEEP_SLOPE));
        assert!(!resolution.flags.contains(CollisionFlags::BOTTOM));
        assert!(resolution.flags.is_crushed());
        assert!(resolution.position.y > 0.0);
    }

    #[test]
    fn ceiling_wedge_only_blocks_the_front() {
        let radians = (30.0 as Scalar).to_radians();
        let ceiling = Obstacle::half_plane(Vector::new(1.0, 0.5), Vector::new(-radians.sin(), -radians.cos()));
        let scene = ground().with(ceiling);
        let resolution = resolve(&scene, &config(), Vector::new(0.0, SKIN), Vector::new(2.0, -0.1));
        assert_eq!(resolution.flags, CollisionFlags::FRONT | CollisionFlags::BOTTOM);
        assert!(!resolution.flags.is_crushed());
        assert!(resolution.position.x < 2.0);
    }

    #[test]
    fn ground_alignment_follows_the_slope() {
        let config = config();
        let normal = slope_through(Vector::ZERO, 30.0);
        let Obstacle::HalfPlane { normal, .. } = normal else {
            unreachable!()
        };
        let scene = StaticScene::new();
        let query = scene.query(0.0);
        let Ok(resolution) =
            MovementResolver::new(&query, &config).resolve(Vector::ZERO, Vector::new(2.0, 0.0), Some(normal));
        assert_relative_eq!(resolution.position.length(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(resolution.position.dot(normal), 0.0, epsilon = 1e-5);
        assert!(resolution.position.y > 0.0);
    }

    #[test]
    fn alignment_can_be_disabled() {
        let config = ControllerConfig {
            align_to_ground: false,
            ..config()
        };
        let scene = StaticScene::new();
        let query = scene.query(0.0);
        let normal = Vector::new(-0.5, 0.75).normalize();
        let Ok(resolution) =
            MovementResolver::new(&query, &config).resolve(Vector::ZERO, Vector::new(2.0, 0.0), Some(normal));
        assert_eq!(resolution.position, Vector::new(2.0, 0.0));
    }

    #[test]
    fn zero_displacement_issues_no_query() {
        let mut geometry = MockGeometryQuery::new();
        geometry.expect_cast().never();
        geometry.expect_overlap().never();
        let config = config();
        let start = Vector::new(4.0, 2.0);
        let Ok(resolution) =
            MovementResolver::new(&geometry, &config).resolve(start, Vector::ZERO, None);
        assert_eq!(resolution.position, start);
        assert!(resolution.flags.is_empty());
        assert_eq!(resolution.iterations, 0);
    }

    #[test]
    fn non_finite_displacement_is_ignored() {
        let mut geometry = MockGeometryQuery::new();
        geometry.expect_cast().never();
        let config = config();
        let Ok(resolution) = MovementResolver::new(&geometry, &config).resolve(
            Vector::ONE,
            Vector::new(Scalar::NAN, 1.0),
            None,
        );
        assert_eq!(resolution.position, Vector::ONE);
    }

    #[test]
    fn clear_probe_takes_the_fast_path() {
        let mut geometry = MockGeometryQuery::new();
        geometry
            .expect_cast()
            .times(1)
            .returning(|_, _, _, _| Ok::<_, Infallible>(Vec::new()));
        let config = config();
        let Ok(resolution) = MovementResolver::new(&geometry, &config).resolve(
            Vector::ZERO,
            Vector::new(0.3, -0.7),
            None,
        );
        assert_eq!(resolution.position, Vector::new(0.3, -0.7));
        assert_eq!(resolution.iterations, 0);
    }

    #[test]
    fn iteration_budget_is_respected() {
        // A surface that is always right in front of the character, whatever it does.
        let mut geometry = MockGeometryQuery::new();
        geometry.expect_cast().returning(|_, direction, _, _| {
            Ok::<_, Infallible>(vec![SurfaceContact {
                normal: (-direction.as_vec2() + Vector::new(0.3, 0.0)).normalize(),
                distance: 0.05,
                body: None,
            }])
        });
        let config = ControllerConfig {
            max_iterations: 3,
            early_exit: false,
            ..config()
        };
        let Ok(resolution) = MovementResolver::new(&geometry, &config).resolve(
            Vector::ZERO,
            Vector::new(0.0, -10.0),
            None,
        );
        assert!(resolution.iterations <= 3);
        assert!(resolution.position.is_finite());
    }

    #[test]
    fn depenetrate_all_pushes_out_of_the_ground() {
        let mut geometry = MockGeometryQuery::new();
        geometry.expect_overlap().returning(|_, _, _| {
            Ok::<_, Infallible>(vec![OverlapContact {
                normal: Vector::Y,
                penetration: 0.25,
                body: None,
            }])
        });
        let config = config();
        let Ok(offset) = MovementResolver::new(&geometry, &config).depenetrate_all(Vector::ZERO);
        assert_relative_eq!(offset.y, 0.25 + SKIN, epsilon = 1e-5);
        assert_relative_eq!(offset.x, 0.0);
    }

    #[test]
    fn depenetrate_solves_a_corner() {
        let offset = depenetrate(&config(), &[(Vector::Y, 0.1), (Vector::NEG_X, 0.2)]);
        assert_relative_eq!(offset.x, -0.2, epsilon = 1e-5);
        assert_relative_eq!(offset.y, 0.1, epsilon = 1e-5);
        assert_eq!(depenetrate(&config(), &[]), Vector::ZERO);
    }

    #[test]
    fn mask_excludes_geometry() {
        let mut scene = StaticScene::new();
        scene.add_on_layers(Obstacle::half_plane(Vector::ZERO, Vector::Y), LayerMask(0b10), None);
        let config = ControllerConfig {
            collision_mask: LayerMask(0b01),
            ..config()
        };
        let resolution = resolve(&scene, &config, Vector::new(0.0, 1.0), Vector::new(0.0, -3.0));
        assert_eq!(resolution.position, Vector::new(0.0, -2.0));
    }

    const WALL_X: Scalar = 3.0;

    fn ground_and_wall() -> StaticScene {
        ground().with(Obstacle::half_plane(Vector::new(WALL_X, 0.0), Vector::NEG_X))
    }

    fn displacement() -> impl Strategy<Value = Vector> {
        (-6.0f32..6.0, -6.0f32..6.0).prop_map(|(x, y)| Vector::new(x, y))
    }

    proptest! {
        #[test]
        fn empty_world_moves_exactly(start in displacement(), d in displacement()) {
            let resolution = resolve(&StaticScene::new(), &config(), start, d);
            prop_assert_eq!(resolution.position, start + d);
            prop_assert!(resolution.flags.is_empty());
        }

        #[test]
        fn never_penetrates_ground_or_wall(
            x in -4.0f32..(WALL_X - SKIN),
            y in SKIN..4.0,
            d in displacement(),
        ) {
            let resolution = resolve(&ground_and_wall(), &config(), Vector::new(x, y), d);
            let position = resolution.position;
            prop_assert!(position.y >= -1e-4);
            prop_assert!(position.x <= WALL_X + 1e-4);
            if resolution.flags.contains(CollisionFlags::BOTTOM) {
                prop_assert!(position.y >= SKIN - 1e-4);
            }
            if resolution.flags.contains(CollisionFlags::FRONT) {
                prop_assert!(position.x <= WALL_X - SKIN + 1e-4);
            }
        }

        #[test]
        fn early_exit_matches_full_budget(
            x in -4.0f32..(WALL_X - SKIN),
            y in SKIN..4.0,
            d in displacement(),
        ) {
            let start = Vector::new(x, y);
            let scene = ground_and_wall();
            let exhaustive = ControllerConfig { early_exit: false, ..config() };
            let fast = resolve(&scene, &config(), start, d).position;
            let full = resolve(&scene, &exhaustive, start, d).position;
            prop_assert!(fast.distance(full) <= 1e-4, "{fast} vs {full}");
        }
    }
}
