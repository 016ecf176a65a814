//! The primitive variants and their capability dispatch.
//!
//! Primitives are a tagged variant rather than trait objects: the closest-hit
//! scan is the hottest loop in the renderer and enum dispatch keeps it
//! inlineable.

use crate::hit::RawHit;
use crate::material::Material;
use crate::plane::{Plane, Rectangle};
use crate::ray::Ray;
use crate::sphere::Sphere;
use crate::triangle::Triangle;
use crate::union::ObjectUnion;
use crate::MaterialId;
use helios_math::{Aabb, Vec2, Vec3};
use rand::RngCore;

/// A scene primitive.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    Rectangle(Rectangle),
    Triangle(Triangle),
    Union(ObjectUnion),
}

impl Primitive {
    /// Closest intersection with distance in (EPSILON, t_max], if any.
    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        match self {
            Primitive::Sphere(sphere) => sphere.intersect(ray, t_max),
            Primitive::Plane(plane) => plane.intersect(ray, t_max),
            Primitive::Rectangle(rectangle) => rectangle.intersect(ray, t_max),
            Primitive::Triangle(triangle) => triangle.intersect(ray, t_max),
            Primitive::Union(union) => union.intersect(ray, t_max),
        }
    }

    /// Unit shading normal at a surface point.
    pub fn normal(&self, surface_point: Vec3, primitive_id: usize) -> Vec3 {
        match self {
            Primitive::Sphere(sphere) => sphere.normal(surface_point),
            Primitive::Plane(plane) => plane.normal,
            Primitive::Rectangle(rectangle) => rectangle.plane.normal,
            Primitive::Triangle(triangle) => triangle.normal(surface_point),
            Primitive::Union(union) => union.normal(surface_point, primitive_id),
        }
    }

    /// UV parameterization of a surface point.
    pub fn uv(&self, surface_point: Vec3, primitive_id: usize) -> Vec2 {
        match self {
            Primitive::Sphere(sphere) => sphere.uv(surface_point),
            Primitive::Plane(plane) => plane.uv(surface_point),
            Primitive::Rectangle(rectangle) => rectangle.uv(surface_point),
            Primitive::Triangle(triangle) => triangle.uv(surface_point),
            Primitive::Union(union) => union.uv(surface_point, primitive_id),
        }
    }

    /// Surface area. Infinite planes report zero and are never sampled.
    pub fn area(&self) -> f64 {
        match self {
            Primitive::Sphere(sphere) => sphere.area(),
            Primitive::Plane(_) => 0.0,
            Primitive::Rectangle(rectangle) => rectangle.area(),
            Primitive::Triangle(triangle) => triangle.area(),
            Primitive::Union(union) => union.area(),
        }
    }

    /// Material of the (sub-)primitive.
    pub fn material_id(&self, primitive_id: usize) -> MaterialId {
        match self {
            Primitive::Sphere(sphere) => sphere.material,
            Primitive::Plane(plane) => plane.material,
            Primitive::Rectangle(rectangle) => rectangle.plane.material,
            Primitive::Triangle(triangle) => triangle.material,
            Primitive::Union(union) => union.material_id(primitive_id),
        }
    }

    /// True when the primitive can emit light.
    pub fn is_light_source(&self, materials: &[Material]) -> bool {
        match self {
            Primitive::Union(union) => union.is_light_source(),
            _ => materials[self.material_id(0)].is_light_source(),
        }
    }

    /// Uniform random point on the surface.
    pub fn random_surface_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            Primitive::Sphere(sphere) => sphere.random_surface_point(rng),
            Primitive::Plane(plane) => plane.position,
            Primitive::Rectangle(rectangle) => rectangle.random_surface_point(rng),
            Primitive::Triangle(triangle) => triangle.random_surface_point(rng),
            Primitive::Union(union) => union.random_surface_point(rng),
        }
    }

    /// Sample a point for next-event estimation, returning the point and
    /// the solid-angle inverse PDF of having sampled it from `reference`.
    pub fn random_light_point(&self, reference: Vec3, rng: &mut dyn RngCore) -> (Vec3, f64) {
        match self {
            Primitive::Sphere(sphere) => sphere.random_light_point(reference, rng),
            Primitive::Rectangle(rectangle) => rectangle.random_light_point(reference, rng),
            Primitive::Triangle(triangle) => {
                let point = triangle.random_surface_point(rng);
                let factor = area_to_angle_factor(triangle.normal(point), point, reference);
                (point, triangle.area() * factor)
            }
            Primitive::Union(union) => union.random_light_point(reference, rng),
            Primitive::Plane(plane) => (plane.position, 0.0),
        }
    }

    /// Solid-angle PDF of `random_light_point` producing `surface_point`.
    pub fn solid_angle_pdf(&self, reference: Vec3, surface_point: Vec3, primitive_id: usize) -> f64 {
        match self {
            Primitive::Sphere(sphere) => sphere.solid_angle_pdf(reference, surface_point),
            Primitive::Rectangle(rectangle) => rectangle.solid_angle_pdf(reference, surface_point),
            Primitive::Triangle(triangle) => {
                let factor =
                    area_to_angle_factor(triangle.normal(surface_point), surface_point, reference);
                let inverse = triangle.area() * factor;
                if inverse > 0.0 {
                    1.0 / inverse
                } else {
                    0.0
                }
            }
            Primitive::Union(union) => union.solid_angle_pdf(reference, surface_point, primitive_id),
            Primitive::Plane(_) => 0.0,
        }
    }

    /// Axis-aligned bounds. Infinite planes report an unbounded box.
    pub fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(sphere) => sphere.bounding_box(),
            Primitive::Plane(_) => Aabb::UNIVERSE,
            Primitive::Rectangle(rectangle) => rectangle.bounding_box(),
            Primitive::Triangle(triangle) => triangle.bounding_box(),
            Primitive::Union(union) => union.bounding_box(),
        }
    }

    pub fn centroid(&self) -> Vec3 {
        match self {
            Primitive::Sphere(sphere) => sphere.centroid(),
            Primitive::Plane(plane) => plane.position,
            Primitive::Rectangle(rectangle) => rectangle.centroid(),
            Primitive::Triangle(triangle) => triangle.centroid(),
            Primitive::Union(union) => union.centroid(),
        }
    }
}

/// Conversion factor from an area measure to a solid-angle measure.
///
/// `cos theta / r^2` seen from `reference` toward `surface_point`; clamps
/// back-facing samples to zero so they contribute nothing.
pub fn area_to_angle_factor(normal: Vec3, surface_point: Vec3, reference: Vec3) -> f64 {
    let difference = reference - surface_point;
    let to_reference = difference.normalize();
    let factor = normal.dot(to_reference) / difference.length_squared();
    factor.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::RayKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_area_to_angle_factor() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let p = Vec3::ZERO;

        // Straight above at distance 2: cos = 1, r^2 = 4
        let f = area_to_angle_factor(n, p, Vec3::new(0.0, 2.0, 0.0));
        assert!((f - 0.25).abs() < 1e-12);

        // Below the surface: clamped to zero
        let f = area_to_angle_factor(n, p, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(f, 0.0);
    }

    #[test]
    fn test_dispatch_roundtrip() {
        let sphere = Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0, 4));
        assert_eq!(sphere.material_id(0), 4);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), RayKind::Camera);
        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-9);

        let point = ray.at(hit.distance);
        let normal = sphere.normal(point, 0);
        assert!((normal - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_triangle_light_point_pdf_consistency() {
        let triangle = Primitive::Triangle(crate::triangle::Triangle::new(
            Vec3::new(-1.0, 0.0, -3.0),
            Vec3::new(1.0, 0.0, -3.0),
            Vec3::new(0.0, 2.0, -3.0),
            0,
        ));
        let reference = Vec3::new(0.0, 0.5, 0.0);
        let mut rng = StdRng::seed_from_u64(31);

        for _ in 0..100 {
            let (point, inverse_pdf) = triangle.random_light_point(reference, &mut rng);
            if inverse_pdf > 0.0 {
                let pdf = triangle.solid_angle_pdf(reference, point, 0);
                assert!((pdf * inverse_pdf - 1.0).abs() < 1e-9);
            }
        }
    }
}
