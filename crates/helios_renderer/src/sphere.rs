//! Sphere primitive.

use crate::hit::RawHit;
use crate::primitive::area_to_angle_factor;
use crate::ray::Ray;
use crate::sampling::{gen_f64, gen_range, orthonormal_basis, sample_unit_sphere};
use crate::{MaterialId, EPSILON};
use helios_math::{Aabb, Vec2, Vec3};
use rand::RngCore;
use std::f64::consts::PI;

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    pub material: MaterialId,
    area: f64,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f64, material: MaterialId) -> Self {
        Self {
            center,
            radius,
            material,
            area: 4.0 * PI * radius * radius,
        }
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Analytic quadratic intersection; smallest root above EPSILON.
    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        let oc = self.center - ray.origin();
        // Unit direction, so the quadratic is t^2 + b t + c = 0
        let b = -2.0 * ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = b * b - 4.0 * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrtd = discriminant.sqrt();

        let mut root = (-b - sqrtd) / 2.0;
        if root <= EPSILON {
            root = (-b + sqrtd) / 2.0;
            if root <= EPSILON {
                return None;
            }
        }
        if root > t_max {
            return None;
        }

        Some(RawHit::new(root))
    }

    /// Outward unit normal at a surface point.
    pub fn normal(&self, surface_point: Vec3) -> Vec3 {
        (surface_point - self.center).normalize()
    }

    /// Spherical UV coordinates of a surface point.
    pub fn uv(&self, surface_point: Vec3) -> Vec2 {
        let unit = (surface_point - self.center) / self.radius;
        let x = -unit.x;
        let y = -unit.y;
        let z = -unit.z;
        let u = 0.5 + z.atan2(x) / (2.0 * PI);
        let v = 0.5 + y.clamp(-1.0, 1.0).asin() / PI;
        Vec2::new(u, v)
    }

    /// Uniform random point on the surface.
    pub fn random_surface_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        sample_unit_sphere(rng) * self.radius + self.center
    }

    /// Sample a point toward the sphere for next-event estimation.
    ///
    /// From an outside reference point the visible cap is sampled through a
    /// cone of half-angle `arccos sqrt(1 - (r/d)^2)`, with solid-angle
    /// inverse PDF `2 pi (1 - cos theta_max)`. From inside, falls back to
    /// uniform area sampling with the area-to-solid-angle conversion.
    pub fn random_light_point(&self, reference: Vec3, rng: &mut dyn RngCore) -> (Vec3, f64) {
        let distance = (reference - self.center).length();
        if distance <= self.radius {
            let point = self.random_surface_point(rng);
            let inverse_pdf = self.area * area_to_angle_factor(self.normal(point), point, reference);
            return (point, inverse_pdf);
        }

        let cos_theta_max = (1.0 - (self.radius / distance).powi(2)).sqrt();
        let inverse_pdf = 2.0 * PI * (1.0 - cos_theta_max);

        let rand = gen_f64(rng);
        let cos_theta = 1.0 + rand * (cos_theta_max - 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        let chord = distance * cos_theta
            - (self.radius * self.radius - (distance * sin_theta).powi(2))
                .max(0.0)
                .sqrt();
        let cos_alpha = (self.radius * self.radius + distance * distance - chord * chord)
            / (2.0 * distance * self.radius);
        let sin_alpha = (1.0 - cos_alpha * cos_alpha).max(0.0).sqrt();

        let z_hat = (reference - self.center).normalize();
        let (x_hat, y_hat) = orthonormal_basis(z_hat);
        let phi = gen_range(rng, 0.0, 2.0 * PI);
        let direction = x_hat * sin_alpha * phi.cos() + y_hat * sin_alpha * phi.sin() + z_hat * cos_alpha;
        (direction * self.radius + self.center, inverse_pdf)
    }

    /// Solid-angle PDF of `random_light_point` for a given sampled point.
    pub fn solid_angle_pdf(&self, reference: Vec3, surface_point: Vec3) -> f64 {
        let distance = (reference - self.center).length();
        if distance <= self.radius {
            let inverse = self.area * area_to_angle_factor(self.normal(surface_point), surface_point, reference);
            return if inverse > 0.0 { 1.0 / inverse } else { 0.0 };
        }
        let cos_theta_max = (1.0 - (self.radius / distance).powi(2)).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        if solid_angle > 0.0 {
            1.0 / solid_angle
        } else {
            0.0
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        let rvec = Vec3::splat(self.radius);
        Aabb::from_points(self.center - rvec, self.center + rvec)
    }

    pub fn centroid(&self) -> Vec3 {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::RayKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);

        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();
        assert!((hit.distance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), RayKind::Camera);
        assert!(sphere.intersect(&ray, f64::INFINITY).is_none());
    }

    #[test]
    fn test_sphere_inside_hit() {
        // Ray starting inside the sphere strikes the far shell
        let sphere = Sphere::new(Vec3::ZERO, 2.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), RayKind::Camera);
        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_t_max_rejection() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, 0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
        assert!(sphere.intersect(&ray, 5.0).is_none());
        assert!(sphere.intersect(&ray, 20.0).is_some());
    }

    #[test]
    fn test_sphere_surface_points_on_sphere() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.7, 0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = sphere.random_surface_point(&mut rng);
            assert!(((p - sphere.center).length() - 0.7).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sphere_cone_sampling_visible_cap() {
        // Every cone-sampled light point must be on the half facing the
        // reference point, and the inverse PDF must match the cap solid angle.
        let sphere = Sphere::new(Vec3::ZERO, 1.0, 0);
        let reference = Vec3::new(0.0, 0.0, 5.0);
        let mut rng = StdRng::seed_from_u64(11);
        let cos_theta_max = (1.0f64 - (1.0 / 5.0f64).powi(2)).sqrt();
        let expected_inverse = 2.0 * PI * (1.0 - cos_theta_max);

        for _ in 0..200 {
            let (p, inverse_pdf) = sphere.random_light_point(reference, &mut rng);
            assert!((p.length() - 1.0).abs() < 1e-9);
            assert!((inverse_pdf - expected_inverse).abs() < 1e-9);
            // Sampled point faces the reference
            assert!(sphere.normal(p).dot((reference - p).normalize()) > -1e-9);
        }
    }

    #[test]
    fn test_sphere_solid_angle_pdf_matches_inverse() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, 0);
        let reference = Vec3::new(3.0, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(13);
        let (p, inverse_pdf) = sphere.random_light_point(reference, &mut rng);
        let pdf = sphere.solid_angle_pdf(reference, p);
        assert!((pdf * inverse_pdf - 1.0).abs() < 1e-9);
    }
}
