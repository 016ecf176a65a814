//! Hit records produced by ray/primitive intersection.

use helios_math::Vec3;

/// Distance and sub-primitive id from a raw intersection test.
///
/// Intersection is split in two phases: every primitive reports only the
/// distance (plus which sub-primitive was struck inside a union), and the
/// winning hit is completed with point, normal and incident direction once
/// the closest-hit scan is done. This keeps the per-primitive test cheap
/// while `t_max` tightens.
#[derive(Debug, Clone, Copy)]
pub struct RawHit {
    pub distance: f64,
    /// Identifier of the struck sub-primitive inside a composite object
    pub primitive_id: usize,
}

impl RawHit {
    #[inline]
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            primitive_id: 0,
        }
    }
}

/// A completed ray/scene intersection.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    /// Ray parameter of the intersection, in (EPSILON, t_max]
    pub distance: f64,
    /// World-space intersection point
    pub point: Vec3,
    /// Unit shading normal at the intersection
    pub normal: Vec3,
    /// Unit direction of the incoming ray
    pub incident: Vec3,
    /// Index of the struck object in the scene's primitive list
    pub object_index: usize,
    /// Sub-primitive identifier inside composite objects
    pub primitive_id: usize,
    /// True when the ray arrived from the outward side of the surface
    pub outside: bool,
}
