//! Surface sampling on sub-point primitives.
//!
//! Offsets are in the sub-point's local XY plane; callers transform them with
//! the sub-point's current transform.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::components::SubPointShape;
use crate::geometry::float_is_zero;

/// Scatter radius for a precision knob in `[0, 1]`.
///
/// `1 - knob`, snapped to exactly zero near zero.
pub fn spread_for(knob: f32) -> f32 {
    let spread = 1.0 - knob;
    if float_is_zero(spread) {
        0.0
    } else {
        spread
    }
}

/// Square patch offset from two uniforms in `[0, 1)`.
pub fn cuboid_offset(u1: f32, u2: f32, spread: f32) -> Vec3 {
    Vec3::new((u1 - 0.5) * spread, (u2 - 0.5) * spread, 0.0)
}

/// Disk offset from two uniforms in `[0, 1)`.
///
/// The pair is ordered so that `u <= v`; the angle term is `TAU * u / v`.
/// This is not the textbook polar mapping and is kept that way so existing
/// impact patterns do not change.
pub fn disk_offset(u: f32, v: f32, spread: f32) -> Vec3 {
    let (u, v) = if u > v { (v, u) } else { (u, v) };
    if float_is_zero(v) || float_is_zero(spread) {
        return Vec3::ZERO;
    }
    let theta = TAU * u / v;
    let radius = v * spread;
    let x = radius * theta.cos();
    let y = radius * theta.sin();
    if !x.is_finite() || !y.is_finite() {
        return Vec3::ZERO;
    }
    Vec3::new(x, y, 0.0)
}

/// Draws a local offset on `shape` for the given precision knob.
pub fn sample_surface_point<R: Rng + ?Sized>(shape: SubPointShape, knob: f32, rng: &mut R) -> Vec3 {
    let spread = spread_for(knob);
    match shape {
        SubPointShape::Cuboid => {
            let u1: f32 = rng.random();
            let u2: f32 = rng.random();
            cuboid_offset(u1, u2, spread)
        }
        SubPointShape::Circle => {
            let u: f32 = rng.random();
            let v: f32 = rng.random();
            disk_offset(u, v, spread)
        }
    }
}
