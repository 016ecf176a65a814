//! Triangle primitive.
//!
//! Intersection uses the watertight permute-and-shear test: the ray's
//! dominant axis becomes +z, the vertices are sheared into that frame, and
//! the three 2D edge functions must agree in sign. Rays through a shared
//! edge of two triangles then hit exactly one of them.

use crate::hit::RawHit;
use crate::ray::Ray;
use crate::sampling::gen_f64;
use crate::{MaterialId, EPSILON};
use helios_math::{Aabb, Vec2, Vec3};
use rand::RngCore;

/// A triangle with optional vertex UVs and smooth-shading normals.
#[derive(Debug, Clone)]
pub struct Triangle {
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
    /// Unit face normal
    normal: Vec3,
    /// Orthonormal in-plane frame for barycentric lookup
    v1: Vec3,
    v2: Vec3,
    /// Vertex positions in the (v1, v2) frame
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
    det_t: f64,
    uv1: Vec2,
    uv2: Vec2,
    uv3: Vec2,
    n1: Vec3,
    n2: Vec3,
    n3: Vec3,
    smooth_shaded: bool,
    area: f64,
    pub material: MaterialId,
}

impl Triangle {
    /// Create a triangle from three vertices.
    pub fn new(p1: Vec3, p2: Vec3, p3: Vec3, material: MaterialId) -> Self {
        let e1 = p2 - p1;
        let e2 = p3 - p1;
        let normal = e1.cross(e2).normalize();
        let v1 = e1.normalize();
        let v2 = normal.cross(v1).normalize();

        let x1 = p1.dot(v1);
        let y1 = p1.dot(v2);
        let x2 = p2.dot(v1);
        let y2 = p2.dot(v2);
        let x3 = p3.dot(v1);
        let y3 = p3.dot(v2);
        let det_t = (y2 - y3) * (x1 - x3) + (x3 - x2) * (y1 - y3);

        let area = 0.5 * (x1 * (y2 - y3) + x2 * (y3 - y1) + x3 * (y1 - y2)).abs();

        Self {
            p1,
            p2,
            p3,
            normal,
            v1,
            v2,
            x1,
            y1,
            x2,
            y2,
            x3,
            y3,
            det_t,
            uv1: Vec2::ZERO,
            uv2: Vec2::ZERO,
            uv3: Vec2::ZERO,
            n1: normal,
            n2: normal,
            n3: normal,
            smooth_shaded: false,
            area,
            material,
        }
    }

    /// Attach per-vertex texture coordinates.
    pub fn set_vertex_uv(&mut self, uv1: Vec2, uv2: Vec2, uv3: Vec2) {
        self.uv1 = uv1;
        self.uv2 = uv2;
        self.uv3 = uv3;
    }

    /// Attach per-vertex normals and enable smooth shading.
    pub fn set_vertex_normals(&mut self, n1: Vec3, n2: Vec3, n3: Vec3) {
        self.n1 = n1;
        self.n2 = n2;
        self.n3 = n3;
        self.smooth_shaded = true;
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Watertight intersection distance, or None.
    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        let (kx, ky, kz) = ray.permutation();
        let (sx, sy, sz) = ray.shear();

        let a = self.p1 - ray.origin();
        let b = self.p2 - ray.origin();
        let c = self.p3 - ray.origin();

        // Permute so the dominant axis is z, then shear x/y onto the ray
        let mut p1t = Vec3::new(a[kx], a[ky], a[kz]);
        let mut p2t = Vec3::new(b[kx], b[ky], b[kz]);
        let mut p3t = Vec3::new(c[kx], c[ky], c[kz]);

        p1t.x += sx * p1t.z;
        p1t.y += sy * p1t.z;
        p2t.x += sx * p2t.z;
        p2t.y += sy * p2t.z;
        p3t.x += sx * p3t.z;
        p3t.y += sy * p3t.z;

        let e1 = p2t.x * p3t.y - p2t.y * p3t.x;
        let e2 = p3t.x * p1t.y - p3t.y * p1t.x;
        let e3 = p1t.x * p2t.y - p1t.y * p2t.x;

        // Mixed edge signs mean the hit is outside; zero counts as boundary
        if (e1 < 0.0 || e2 < 0.0 || e3 < 0.0) && (e1 > 0.0 || e2 > 0.0 || e3 > 0.0) {
            return None;
        }

        let det = e1 + e2 + e3;
        if det == 0.0 {
            return None;
        }

        p1t.z *= sz;
        p2t.z *= sz;
        p3t.z *= sz;
        let t_scaled = e1 * p1t.z + e2 * p2t.z + e3 * p3t.z;

        // Reject outside (0, t_max) while still in the scaled space
        if det < 0.0 && (t_scaled >= 0.0 || t_scaled < t_max * det) {
            return None;
        }
        if det > 0.0 && (t_scaled <= 0.0 || t_scaled > t_max * det) {
            return None;
        }

        let t = t_scaled / det;
        if t <= EPSILON {
            return None;
        }
        Some(RawHit::new(t))
    }

    /// Barycentric coordinates of a point assumed to lie in the plane.
    fn barycentric(&self, point: Vec3) -> Vec3 {
        let x = point.dot(self.v1);
        let y = point.dot(self.v2);

        let lambda1 = ((self.y2 - self.y3) * (x - self.x3) + (self.x3 - self.x2) * (y - self.y3))
            / self.det_t;
        let lambda2 = ((self.y3 - self.y1) * (x - self.x3) + (self.x1 - self.x3) * (y - self.y3))
            / self.det_t;
        Vec3::new(lambda1, lambda2, 1.0 - lambda1 - lambda2)
    }

    /// Face normal, or the barycentric blend of vertex normals when smooth.
    pub fn normal(&self, surface_point: Vec3) -> Vec3 {
        if self.smooth_shaded {
            let bary = self.barycentric(surface_point);
            (self.n1 * bary.x + self.n2 * bary.y + self.n3 * bary.z).normalize()
        } else {
            self.normal
        }
    }

    pub fn uv(&self, surface_point: Vec3) -> Vec2 {
        let bary = self.barycentric(surface_point);
        self.uv1 * bary.x + self.uv2 * bary.y + self.uv3 * bary.z
    }

    /// Uniform random point on the triangle.
    pub fn random_surface_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let r1 = gen_f64(rng);
        let r2 = gen_f64(rng);
        let sqrt_r1 = r1.sqrt();
        self.p1 * (1.0 - sqrt_r1) + self.p2 * (sqrt_r1 * (1.0 - r2)) + self.p3 * (sqrt_r1 * r2)
    }

    pub fn bounding_box(&self) -> Aabb {
        let min = self.p1.min(self.p2).min(self.p3);
        let max = self.p1.max(self.p2).max(self.p3);
        Aabb::from_points(min, max)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.p1 + self.p2 + self.p3) / 3.0
    }
}
