//! Random sampling helpers used when emitting particles.
//!
//! All helpers take the emitter's [`SmallRng`] so a seeded emitter is fully
//! reproducible.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Unit direction inside a cone around local +Y.
///
/// `phi` is uniform over `[0, 2π)` and `theta` uniform over
/// `[0, half_angle]`, giving `(sinθ cosφ, cosθ, sinθ sinφ)`. A half angle of
/// zero always returns +Y.
pub fn cone_direction(rng: &mut SmallRng, half_angle: f32) -> Vec3 {
    let phi = rng.gen::<f32>() * TAU;
    let theta = rng.gen::<f32>() * half_angle;

    Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
}

/// Uniform value in `[-range / 2, range / 2)`.
///
/// Safe for a zero range, unlike `gen_range` on an empty interval.
#[inline]
pub fn spread(rng: &mut SmallRng, range: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * range
}

/// Random point on the surface of a sphere of given radius.
pub fn random_on_sphere(rng: &mut SmallRng, radius: f32) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    // acos of a uniform cosine keeps the surface density even
    let phi = (rng.gen::<f32>() * 2.0 - 1.0).clamp(-1.0, 1.0).acos();
    debug_assert!((0.0..=PI).contains(&phi));

    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

/// Random point inside the axis-aligned box `min..max`.
pub fn random_in_box(rng: &mut SmallRng, min: Vec3, max: Vec3) -> Vec3 {
    let t = Vec3::new(rng.gen(), rng.gen(), rng.gen());
    min + (max - min) * t
}
