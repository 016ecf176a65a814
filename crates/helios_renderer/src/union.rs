//! Composite objects: a primitive list behind one scene slot.
//!
//! An `ObjectUnion` owns sub-primitives (typically a triangle mesh), an
//! optional BVH over them, and the cumulative-area table used to sample its
//! emissive sub-primitives proportionally to area.

use crate::bvh::BvhNode;
use crate::hit::RawHit;
use crate::material::Material;
use crate::primitive::Primitive;
use crate::ray::Ray;
use crate::sampling::{gen_f64, gen_range};
use crate::scene::SceneError;
use crate::{MaterialId, EPSILON};
use helios_math::{Aabb, Vec2, Vec3};
use rand::RngCore;

/// A composite primitive owning a list of sub-primitives.
#[derive(Debug, Clone)]
pub struct ObjectUnion {
    objects: Vec<Primitive>,
    bvh: Option<BvhNode>,
    /// Summed area of all sub-primitives
    area: f64,
    /// Cumulative areas over the emissive sub-primitives only
    emissive_cumulative_area: Vec<f64>,
    /// Sub-primitive index for each cumulative-area bucket
    emissive_indices: Vec<usize>,
    contains_light_source: bool,
    bbox: Aabb,
}

impl ObjectUnion {
    /// Build a union over `objects`, optionally with a BVH accelerator.
    ///
    /// The material arena is needed to find the emissive sub-primitives.
    pub fn new(
        objects: Vec<Primitive>,
        build_bvh: bool,
        materials: &[Material],
    ) -> Result<Self, SceneError> {
        if objects.is_empty() {
            return Err(SceneError::EmptyUnion);
        }
        debug_assert!(
            objects.iter().all(|o| !matches!(o, Primitive::Union(_))),
            "unions hold simple primitives"
        );

        let area = objects.iter().map(|o| o.area()).sum();

        let mut emissive_cumulative_area = Vec::new();
        let mut emissive_indices = Vec::new();
        let mut running = 0.0;
        for (i, object) in objects.iter().enumerate() {
            if object.is_light_source(materials) {
                running += object.area();
                emissive_cumulative_area.push(running);
                emissive_indices.push(i);
            }
        }

        let bbox = objects
            .iter()
            .map(|o| o.bounding_box())
            .reduce(|a, b| Aabb::merge(&a, &b))
            .unwrap_or(Aabb::EMPTY);

        let bvh = if build_bvh {
            Some(BvhNode::build(&objects))
        } else {
            None
        };

        Ok(Self {
            contains_light_source: !emissive_indices.is_empty(),
            objects,
            bvh,
            area,
            emissive_cumulative_area,
            emissive_indices,
            bbox,
        })
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn is_light_source(&self) -> bool {
        self.contains_light_source
    }

    pub fn sub_primitive_count(&self) -> usize {
        self.objects.len()
    }

    /// Closest sub-primitive hit; `primitive_id` names the sub-primitive.
    pub fn intersect(&self, ray: &Ray, t_max: f64) -> Option<RawHit> {
        if let Some(bvh) = &self.bvh {
            return bvh.intersect(ray, t_max, &self.objects);
        }

        let mut best: Option<RawHit> = None;
        let mut limit = t_max;
        for (i, object) in self.objects.iter().enumerate() {
            if let Some(raw) = object.intersect(ray, limit) {
                if raw.distance > EPSILON && raw.distance < limit {
                    limit = raw.distance;
                    best = Some(RawHit {
                        distance: raw.distance,
                        primitive_id: i,
                    });
                }
            }
        }
        best
    }

    pub fn normal(&self, surface_point: Vec3, primitive_id: usize) -> Vec3 {
        self.objects[primitive_id].normal(surface_point, 0)
    }

    pub fn uv(&self, surface_point: Vec3, primitive_id: usize) -> Vec2 {
        self.objects[primitive_id].uv(surface_point, 0)
    }

    pub fn material_id(&self, primitive_id: usize) -> MaterialId {
        self.objects[primitive_id].material_id(0)
    }

    /// Pick an emissive sub-primitive proportional to its area.
    fn sample_emissive_index(&self, rng: &mut dyn RngCore) -> Option<usize> {
        let total = *self.emissive_cumulative_area.last()?;
        let split = gen_range(rng, 0.0, total);
        let bucket = self
            .emissive_cumulative_area
            .partition_point(|&cumulative| cumulative < split);
        Some(self.emissive_indices[bucket.min(self.emissive_indices.len() - 1)])
    }

    /// Uniform point on the emissive surface of the union.
    pub fn random_surface_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self.sample_emissive_index(rng) {
            Some(index) => self.objects[index].random_surface_point(rng),
            None => {
                // Not a light: fall back to any sub-primitive
                let index = (gen_f64(rng) * self.objects.len() as f64) as usize;
                self.objects[index.min(self.objects.len() - 1)].random_surface_point(rng)
            }
        }
    }

    /// Light sampling: choose a sub-primitive by area, defer to it.
    pub fn random_light_point(&self, reference: Vec3, rng: &mut dyn RngCore) -> (Vec3, f64) {
        let Some(&total) = self.emissive_cumulative_area.last() else {
            return (Vec3::ZERO, 0.0);
        };
        let Some(index) = self.sample_emissive_index(rng) else {
            return (Vec3::ZERO, 0.0);
        };
        let (point, sub_inverse_pdf) = self.objects[index].random_light_point(reference, rng);
        let selection_inverse = total / self.objects[index].area();
        (point, sub_inverse_pdf * selection_inverse)
    }

    /// Solid-angle PDF of `random_light_point` landing on `surface_point`
    /// of sub-primitive `primitive_id`.
    pub fn solid_angle_pdf(&self, reference: Vec3, surface_point: Vec3, primitive_id: usize) -> f64 {
        let Some(&total) = self.emissive_cumulative_area.last() else {
            return 0.0;
        };
        let object = &self.objects[primitive_id];
        let selection_probability = object.area() / total;
        selection_probability * object.solid_angle_pdf(reference, surface_point, 0)
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn centroid(&self) -> Vec3 {
        self.bbox.centroid()
    }
}
