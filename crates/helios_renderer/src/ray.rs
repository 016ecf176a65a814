//! Ray type for path tracing.
//!
//! A ray is defined by an origin point and a unit direction vector, plus a
//! classification of the bounce that produced it. Construction precomputes
//! the axis permutation and shear coefficients used by the watertight
//! ray/triangle test, so they are derived once per ray rather than once per
//! triangle.

use helios_math::Vec3;

/// Classification of the bounce that produced a ray.
///
/// The integrator uses this to keep next-event estimation from
/// double-counting emitters reached through specular bounces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayKind {
    /// Primary ray from the camera
    Camera,
    /// Ray leaving a diffuse bounce or a medium scatter event
    Diffuse,
    /// Ray leaving a mirror reflection
    Reflected,
    /// Ray transmitted through a refractive boundary
    Transmitted,
}

impl RayKind {
    /// True for delta bounces that light sampling cannot reproduce.
    #[inline]
    pub fn is_specular(self) -> bool {
        matches!(self, RayKind::Reflected | RayKind::Transmitted)
    }
}

/// A ray with origin, unit direction, and watertight-test precompute.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    /// Bounce classification of the last event
    pub kind: RayKind,
    /// Axis permutation: kz is the dominant direction axis
    kx: usize,
    ky: usize,
    kz: usize,
    /// Shear aligning the permuted ray with +z
    sx: f64,
    sy: f64,
    sz: f64,
}

impl Ray {
    /// Create a new ray. The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3, kind: RayKind) -> Self {
        let direction = direction.normalize();

        // Permute so the dominant axis becomes z, preserving handedness
        let kz = max_abs_axis(direction);
        let kx = (kz + 1) % 3;
        let ky = (kx + 1) % 3;

        let dz = direction[kz];
        let sx = -direction[kx] / dz;
        let sy = -direction[ky] / dz;
        let sz = 1.0 / dz;

        Self {
            origin,
            direction,
            kind,
            kx,
            ky,
            kz,
            sx,
            sy,
            sz,
        }
    }

    /// Get the ray's origin point.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the ray's unit direction vector.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Compute a point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Axis permutation for the watertight triangle test.
    #[inline]
    pub fn permutation(&self) -> (usize, usize, usize) {
        (self.kx, self.ky, self.kz)
    }

    /// Shear coefficients for the watertight triangle test.
    #[inline]
    pub fn shear(&self) -> (f64, f64, f64) {
        (self.sx, self.sy, self.sz)
    }
}

/// Index of the component with the largest absolute value.
#[inline]
fn max_abs_axis(v: Vec3) -> usize {
    let a = v.abs();
    if a.x > a.y && a.x > a.z {
        0
    } else if a.y > a.z {
        1
    } else {
        2
    }
}
