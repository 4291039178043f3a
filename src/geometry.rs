//! Geometry helpers - angles, ground-plane projection and segment intersection.

use bevy::prelude::*;

/// Tolerance below which a cross product is treated as zero.
pub const INTERSECTION_EPSILON: f32 = 1e-6;

/// Squared magnitude below which a vector is considered degenerate.
const DEGENERATE_SQR: f32 = 1e-15;

/// True if `value` lies strictly within `±INTERSECTION_EPSILON`.
pub fn float_is_zero(value: f32) -> bool {
    value.abs() < INTERSECTION_EPSILON
}

/// Projects a world vector onto the ground (XZ) plane as a 2D vector.
pub fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Flattens a world vector onto the ground plane, keeping it in 3D.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unsigned angle between two 3D vectors in degrees.
///
/// Returns `0.0` when either vector is degenerate.
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < DEGENERATE_SQR {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Unsigned angle between two 2D vectors in degrees.
///
/// Returns `0.0` when either vector is degenerate.
pub fn angle_deg_2d(a: Vec2, b: Vec2) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < DEGENERATE_SQR {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Rotates a vector around the world up axis by `degrees`.
pub fn rotate_yaw(v: Vec3, degrees: f32) -> Vec3 {
    Quat::from_rotation_y(degrees.to_radians()) * v
}

/// Horizontal unit forward of a facing direction, or zero when it points straight up/down.
pub fn horizontal_forward(forward: Vec3) -> Vec3 {
    flatten(forward).normalize_or_zero()
}

/// Tests whether segment `p1-p2` intersects segment `q1-q2`.
///
/// Parametric cross-product test. Parallel and collinear segments (cross
/// product within tolerance) never intersect. Touching endpoints count as an
/// intersection. The result does not depend on which segment is passed first.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let s10 = p2 - p1;
    let s32 = q2 - q1;

    let mut denom = s10.perp_dot(s32);
    if float_is_zero(denom) {
        return false;
    }

    let s02 = p1 - q1;
    // position along q and along p, both scaled by denom
    let mut along_q = s10.perp_dot(s02);
    let mut along_p = s32.perp_dot(s02);

    if denom < 0.0 {
        denom = -denom;
        along_q = -along_q;
        along_p = -along_p;
    }

    along_q >= 0.0 && along_p >= 0.0 && along_q <= denom && along_p <= denom
}
