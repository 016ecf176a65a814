//! Scene: arena-owned primitives, materials and media.
//!
//! The scene owns everything the render needs through plain vectors;
//! primitives refer to materials and materials to media by index, so there
//! are no lifetimes or reference cycles to manage. Once built, the scene is
//! immutable and shared across render workers without synchronization.

use crate::camera::Camera;
use crate::hit::Hit;
use crate::material::Material;
use crate::medium::Medium;
use crate::primitive::Primitive;
use crate::ray::Ray;
use crate::{MaterialId, MediumId, EPSILON};
use helios_math::Vec3;
use thiserror::Error;

/// Errors raised while assembling a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("object union must contain at least one primitive")]
    EmptyUnion,
}

/// A fully-built scene, immutable during rendering.
#[derive(Debug)]
pub struct Scene {
    pub camera: Camera,
    primitives: Vec<Primitive>,
    materials: Vec<Material>,
    media: Vec<Medium>,
    /// Indices of emissive primitives, maintained on insertion
    lights: Vec<usize>,
    background_medium: MediumId,
}

impl Scene {
    /// Create an empty scene with a vacuum background.
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            primitives: Vec::new(),
            materials: Vec::new(),
            media: vec![Medium::Vacuum],
            lights: Vec::new(),
            background_medium: 0,
        }
    }

    /// Register a material, returning its arena index.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Register a medium, returning its arena index.
    pub fn add_medium(&mut self, medium: Medium) -> MediumId {
        self.media.push(medium);
        self.media.len() - 1
    }

    /// Add a primitive. Emissive primitives join the light list.
    pub fn add_primitive(&mut self, primitive: Primitive) -> usize {
        let index = self.primitives.len();
        if primitive.is_light_source(&self.materials) {
            self.lights.push(index);
        }
        self.primitives.push(primitive);
        index
    }

    /// Replace the background medium the camera rays start in.
    pub fn set_background_medium(&mut self, medium: MediumId) {
        self.background_medium = medium;
    }

    pub fn background_medium(&self) -> MediumId {
        self.background_medium
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id]
    }

    pub fn medium(&self, id: MediumId) -> &Medium {
        &self.media[id]
    }

    pub fn lights(&self) -> &[usize] {
        &self.lights
    }

    /// Material at a hit, resolving union sub-primitives.
    pub fn material_at(&self, hit: &Hit) -> &Material {
        let id = self.primitives[hit.object_index].material_id(hit.primitive_id);
        &self.materials[id]
    }

    /// Closest intersection along `ray` with distance in (EPSILON, t_max].
    ///
    /// Scans every primitive, tightening the clip distance as hits land;
    /// unions may delegate the scan of their interior to a BVH. The winning
    /// raw hit is completed with point, shading normal, incident direction
    /// and sidedness. Deterministic for a given ray and scene.
    pub fn find_closest_hit(&self, ray: &Ray, t_max: f64) -> Option<Hit> {
        let mut best: Option<(usize, crate::hit::RawHit)> = None;
        let mut limit = t_max;

        for (index, primitive) in self.primitives.iter().enumerate() {
            if let Some(raw) = primitive.intersect(ray, limit) {
                if raw.distance > EPSILON && raw.distance < limit {
                    limit = raw.distance;
                    best = Some((index, raw));
                }
            }
        }

        let (object_index, raw) = best?;
        let point = ray.at(raw.distance);
        let normal = self.primitives[object_index].normal(point, raw.primitive_id);
        let incident = ray.direction();
        Some(Hit {
            distance: raw.distance,
            point,
            normal,
            incident,
            object_index,
            primitive_id: raw.primitive_id,
            outside: incident.dot(normal) < 0.0,
        })
    }

    /// Solid-angle PDF that next-event estimation from `reference` would
    /// have sampled the emissive surface struck by `hit`. Used to weigh
    /// BSDF-sampled emitter hits against light sampling.
    pub fn light_pdf(&self, reference: Vec3, hit: &Hit) -> f64 {
        if self.lights.is_empty() {
            return 0.0;
        }
        let primitive = &self.primitives[hit.object_index];
        let pdf = primitive.solid_angle_pdf(reference, hit.point, hit.primitive_id);
        pdf / self.lights.len() as f64
    }
}
