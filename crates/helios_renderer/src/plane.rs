//! Plane and rectangle primitives.
//!
//! A rectangle is a plane clipped to half-extents in its local (v1, v2)
//! frame, so the two share the centered-system distance solve.

use crate::hit::RawHit;
use crate::primitive::area_to_angle_factor;
use crate::ray::Ray;
use crate::sampling::gen_range;
use crate::{MaterialId, EPSILON};
use helios_math::{Aabb, Vec2, Vec3};
use rand::RngCore;

/// An infinite single-sided plane.
#[derive(Debug, Clone)]
pub struct Plane {
    pub position: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub normal: Vec3,
    pub material: MaterialId,
}

impl Plane {
    /// Create a plane through `position` spanned by `v1` and `v2`.
    pub fn new(position: Vec3, v1: Vec3, v2: Vec3, material: MaterialId) -> Self {
        let v1 = v1.normalize();
        let v2 = v2.normalize();
        let normal = v1.cross(v2).normalize();
        Self {
            position,
            v1,
            v2,
            normal,
            material,
        }
    }

    /// Ray parameter of the plane in a frame centered on `position`.
    ///
    /// Returns a negative value for parallel rays, which the caller rejects.
    fn distance_in_centered_system(&self, start: Vec3, direction: Vec3) -> f64 {
        let direction_dot_normal = -direction.dot(self.normal);
        if direction_dot_normal.abs() < EPSILON {
            return -1.0;
        }
        start.dot(self.normal) / direction_dot_normal
    }

    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        let shifted = ray.origin() - self.position;
        let distance = self.distance_in_centered_system(shifted, ray.direction());
        if distance <= EPSILON || distance > t_max {
            return None;
        }
        Some(RawHit::new(distance))
    }

    pub fn uv(&self, surface_point: Vec3) -> Vec2 {
        let shifted = surface_point - self.position;
        let u = 1.0 - shifted.dot(self.v1) - 0.5;
        let v = 1.0 - shifted.dot(self.v2) - 0.5;
        Vec2::new(u, v)
    }
}

/// An axis-bounded rectangle in a plane.
#[derive(Debug, Clone)]
pub struct Rectangle {
    pub plane: Plane,
    pub l1: f64,
    pub l2: f64,
    area: f64,
}

impl Rectangle {
    /// Create a rectangle centered on `position` with side lengths `l1`, `l2`.
    pub fn new(position: Vec3, v1: Vec3, v2: Vec3, l1: f64, l2: f64, material: MaterialId) -> Self {
        Self {
            plane: Plane::new(position, v1, v2, material),
            l1,
            l2,
            area: l1 * l2,
        }
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        let shifted = ray.origin() - self.plane.position;
        let distance = self
            .plane
            .distance_in_centered_system(shifted, ray.direction());
        if distance <= EPSILON || distance > t_max {
            return None;
        }

        let direction_dot_v1 = ray.direction().dot(self.plane.v1);
        let direction_dot_v2 = ray.direction().dot(self.plane.v2);
        let start_dot_v1 = shifted.dot(self.plane.v1);
        let start_dot_v2 = shifted.dot(self.plane.v2);

        let within_v1 = (start_dot_v1 + direction_dot_v1 * distance).abs() <= self.l1 / 2.0 + EPSILON;
        let within_v2 = (start_dot_v2 + direction_dot_v2 * distance).abs() <= self.l2 / 2.0 + EPSILON;
        if !within_v1 || !within_v2 {
            return None;
        }

        Some(RawHit::new(distance))
    }

    pub fn uv(&self, surface_point: Vec3) -> Vec2 {
        let shifted = surface_point - self.plane.position;
        let u = 1.0 - shifted.dot(self.plane.v1) / self.l1 - 0.5;
        let v = 1.0 - shifted.dot(self.plane.v2) / self.l2 - 0.5;
        Vec2::new(u, v)
    }

    /// Uniform random point in the rectangle.
    pub fn random_surface_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let r1 = gen_range(rng, -self.l1 / 2.0, self.l1 / 2.0);
        let r2 = gen_range(rng, -self.l2 / 2.0, self.l2 / 2.0);
        self.plane.v1 * r1 + self.plane.v2 * r2 + self.plane.position
    }

    /// Area sampling with the area-to-solid-angle conversion folded in.
    pub fn random_light_point(&self, reference: Vec3, rng: &mut dyn RngCore) -> (Vec3, f64) {
        let point = self.random_surface_point(rng);
        let inverse_pdf = self.area * area_to_angle_factor(self.plane.normal, point, reference);
        (point, inverse_pdf)
    }

    pub fn solid_angle_pdf(&self, reference: Vec3, surface_point: Vec3) -> f64 {
        let inverse = self.area * area_to_angle_factor(self.plane.normal, surface_point, reference);
        if inverse > 0.0 {
            1.0 / inverse
        } else {
            0.0
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        let half = self.plane.v1.abs() * (self.l1 / 2.0) + self.plane.v2.abs() * (self.l2 / 2.0);
        Aabb::from_points(self.plane.position - half, self.plane.position + half)
    }

    pub fn centroid(&self) -> Vec3 {
        self.plane.position
    }
}
