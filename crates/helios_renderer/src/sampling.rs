//! Random sampling helpers shared by materials, media and the pixel driver.
//!
//! All samplers take `&mut dyn RngCore` so they stay object-safe and usable
//! from enum dispatch without generic plumbing.

use helios_math::Vec3;
use rand::RngCore;
use std::f64::consts::PI;

/// Generate a random f64 in [0, 1) from an RngCore.
///
/// Derives the double from the top 53 bits of raw generator output, the
/// same construction rand's Standard distribution uses.
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    let bits = rng.next_u64();
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Generate a random f64 in [min, max).
#[inline]
pub fn gen_range(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    min + (max - min) * gen_f64(rng)
}

/// Generate a random index in [0, n).
#[inline]
pub fn gen_index(rng: &mut dyn RngCore, n: usize) -> usize {
    ((gen_f64(rng) * n as f64) as usize).min(n - 1)
}

/// Sample a standard normal variate (Box-Muller).
///
/// The pixel driver jitters sample positions with a zero-mean Gaussian.
pub fn sample_standard_normal(rng: &mut dyn RngCore) -> f64 {
    let u1 = (1.0 - gen_f64(rng)).max(f64::MIN_POSITIVE);
    let u2 = gen_f64(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Sample a unit vector uniformly over the sphere.
pub fn sample_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    let cos_theta = 2.0 * gen_f64(rng) - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = 2.0 * PI * gen_f64(rng);
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Sample a cosine-weighted direction in the hemisphere around a normal.
///
/// Uses Malley's method: sample uniformly on disk, project to hemisphere.
/// PDF = cos(theta) / PI
pub fn sample_cosine_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let r1 = gen_f64(rng);
    let r2 = gen_f64(rng);

    let sqrt_r1 = r1.sqrt();
    let theta = 2.0 * PI * r2;
    let x = sqrt_r1 * theta.cos();
    let y = sqrt_r1 * theta.sin();
    let z = (1.0 - r1).sqrt();

    let (tangent, bitangent) = orthonormal_basis(normal);
    x * tangent + y * bitangent + z * normal
}

/// Build an orthonormal tangent/bitangent pair from a unit normal.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}
