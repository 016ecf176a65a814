//! Math types for the helios path tracer.
//!
//! The renderer works in double precision throughout: path throughput is a
//! long product of BSDF weights and transmittances, and f32 loses too much
//! of it. The glam double-precision vectors are re-exported under the
//! crate-local names the rest of the workspace uses.

// Re-export glam for convenience
pub use glam;

/// 3-component double-precision vector: positions, unit directions, linear RGB.
pub type Vec3 = glam::DVec3;

/// 2-component double-precision vector: UV coordinates.
pub type Vec2 = glam::DVec2;

mod aabb;
mod interval;

pub use aabb::Aabb;
pub use interval::Interval;
