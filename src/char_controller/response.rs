//! Turning the motion left after an impact into a new target.
use avian2d::math::{Scalar, Vector};

/// Components shorter than this fraction of the remaining distance count as zero.
const DEGENERATE_FRACTION: Scalar = 1e-6;

/// Computes where the character should head after hitting a surface with `hit_normal` at `current`,
/// on its way to `target`.
///
/// The motion left is reflected about the surface and split into the part along the normal and
/// the part along the surface. Each part is rescaled to the full remaining distance and weighted:
/// `bounciness` for the normal part, `1 - friction` for the tangential part. With the default
/// `friction = 0, bounciness = 0` the character slides along the surface without losing speed.
pub fn respond(
    current: Vector,
    target: Vector,
    hit_normal: Vector,
    friction: Scalar,
    bounciness: Scalar,
) -> Vector {
    let direction = target - current;
    let remaining = direction.length();
    if remaining == 0.0 {
        return current;
    }
    let normal = hit_normal.normalize_or_zero();
    let reflected = direction - 2.0 * direction.dot(normal) * normal;
    let normal_component = reflected.dot(normal) * normal;
    let tangent_component = reflected - normal_component;

    let min_length = remaining * DEGENERATE_FRACTION;
    current
        + bounciness * remaining * direction_or_zero(normal_component, min_length)
        + (1.0 - friction) * remaining * direction_or_zero(tangent_component, min_length)
}

fn direction_or_zero(v: Vector, min_length: Scalar) -> Vector {
    let length = v.length();
    if length <= min_length || !length.is_finite() {
        Vector::ZERO
    } else {
        v / length
    }
}
