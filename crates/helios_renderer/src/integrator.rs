//! The recursive Monte Carlo path integrator.
//!
//! One path alternates medium events and surface events. Each iteration
//! samples a free-flight distance in the current medium and races it
//! against the closest surface: the nearer event wins. Surface events add
//! emission (MIS-weighted against next-event estimation), sample the BSDF,
//! and maintain the nested-medium stack; medium events scatter off the
//! phase function. Russian roulette terminates paths once they carry
//! little throughput.

use crate::hit::Hit;
use crate::material::{Material, MaterialKind};
use crate::medium::{Medium, MediumStack};
use crate::ray::{Ray, RayKind};
use crate::renderer::RenderConfig;
use crate::sampling::{gen_f64, gen_index};
use crate::scene::Scene;
use crate::EPSILON;
use helios_math::{Vec2, Vec3};
use rand::RngCore;

/// First surface struck by a primary ray, kept for denoising buffers.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryHit {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Result of integrating one path.
#[derive(Debug, Clone, Copy)]
pub struct PathSample {
    pub radiance: Vec3,
    pub primary_hit: Option<PrimaryHit>,
}

/// The vertex next-event estimation is run from.
enum NeeVertex<'a> {
    Surface {
        hit: &'a Hit,
        material: &'a Material,
        uv: Vec2,
    },
    Medium {
        point: Vec3,
        incident: Vec3,
        medium: &'a Medium,
    },
}

impl NeeVertex<'_> {
    fn point(&self) -> Vec3 {
        match self {
            NeeVertex::Surface { hit, .. } => hit.point,
            NeeVertex::Medium { point, .. } => *point,
        }
    }
}

/// Power heuristic with beta = 2.
///
/// `power_heuristic(a, b) + power_heuristic(b, a) = 1` whenever both
/// strategies have nonzero PDF.
pub fn power_heuristic(pdf_a: f64, pdf_b: f64) -> f64 {
    let a2 = pdf_a * pdf_a;
    let b2 = pdf_b * pdf_b;
    if a2 + b2 <= 0.0 {
        return 0.0;
    }
    a2 / (a2 + b2)
}

/// Delta BSDFs are skipped by light sampling: they evaluate to black and
/// only their own sampling can find the single transport direction.
fn is_delta(material: &Material) -> bool {
    matches!(
        material.kind,
        MaterialKind::Reflective { .. } | MaterialKind::Transparent { .. }
    )
}

/// Estimate the radiance arriving along `ray`.
pub fn trace_path(
    scene: &Scene,
    config: &RenderConfig,
    mut ray: Ray,
    rng: &mut dyn RngCore,
) -> PathSample {
    let mut color = Vec3::ZERO;
    let mut throughput = Vec3::ONE;
    let mut stack = MediumStack::new(scene.background_medium());
    // MIS state of the last non-virtual scattering event
    let mut scatter_pdf = 0.0;
    let mut saved_point = ray.origin();
    let mut primary_hit = None;

    for depth in 0..=config.max_depth {
        let medium = scene.medium(stack.current());
        let flight = medium.sample_distance(rng);
        let clip = flight.min(config.max_ray_distance);
        let hit = scene.find_closest_hit(&ray, clip);

        if let Some(hit) = hit {
            throughput *= medium.segment_weight(hit.distance);

            if depth == 0 {
                primary_hit = Some(PrimaryHit {
                    position: hit.point,
                    normal: hit.normal,
                });
            }

            let material = scene.material_at(&hit);
            let uv = scene.primitives()[hit.object_index].uv(hit.point, hit.primitive_id);

            // Emission counts only when the ray strikes the outward side.
            // On camera and specular paths (and with NEE off) the BSDF
            // strategy is the only one that can reach the emitter; otherwise
            // weigh it against the light-sampling strategy.
            if material.is_light_source() && hit.outside {
                let weight = if !config.enable_nee
                    || ray.kind == RayKind::Camera
                    || ray.kind.is_specular()
                {
                    1.0
                } else {
                    power_heuristic(scatter_pdf, scene.light_pdf(saved_point, &hit))
                };
                color += weight * throughput * material.emission(uv);
            }

            if config.enable_nee && hit.outside && !is_delta(material) {
                let vertex = NeeVertex::Surface {
                    hit: &hit,
                    material,
                    uv,
                };
                color += throughput * sample_light(scene, config, &vertex, &stack, rng);
            }

            let bsdf = material.sample(&hit, uv, rng);
            throughput *= bsdf.weight;
            if throughput.max_element() <= 0.0 {
                break;
            }

            // Virtual boundaries keep the incoming classification and the
            // MIS state of the last real scattering event
            let kind = if material.allow_direct_light {
                ray.kind
            } else {
                scatter_pdf = bsdf.pdf;
                saved_point = hit.point;
                bsdf.kind
            };

            if let Some(medium_id) = material.interior_medium {
                let entering = hit.outside && bsdf.outgoing.dot(hit.normal) < 0.0;
                let exiting = !hit.outside && bsdf.outgoing.dot(hit.normal) > 0.0;
                if entering {
                    stack.push(hit.object_index, medium_id);
                } else if exiting {
                    stack.pop(hit.object_index);
                }
            }

            ray = Ray::new(hit.point, bsdf.outgoing, kind);
        } else {
            if flight > config.max_ray_distance {
                // Escaped the scene
                break;
            }

            // Medium scatter event at the sampled free-flight distance
            let point = ray.at(flight);
            throughput *= medium.scatter_weight(flight);
            color += throughput * medium.emission(flight);

            if config.enable_nee {
                let vertex = NeeVertex::Medium {
                    point,
                    incident: ray.direction(),
                    medium,
                };
                color += throughput * sample_light(scene, config, &vertex, &stack, rng);
            }

            let outgoing = medium.sample_phase(ray.direction(), rng);
            scatter_pdf = medium.phase_pdf(ray.direction(), outgoing);
            saved_point = point;
            ray = Ray::new(point, outgoing, RayKind::Diffuse);
        }

        // Russian roulette
        if depth >= config.force_tracing_limit {
            let survival = throughput.max_element().min(0.9);
            if gen_f64(rng) >= survival {
                break;
            }
            throughput /= survival;
        }
    }

    PathSample {
        radiance: color,
        primary_hit,
    }
}

/// Next-event estimation from a surface or medium vertex.
///
/// Picks one emissive object uniformly, asks it for a light point with the
/// solid-angle inverse PDF, traces the shadow ray and requires it to land
/// on the chosen light at the expected distance. Contributions carry the
/// light-side power-heuristic weight so they partition unity with
/// BSDF-sampled emitter hits.
fn sample_light(
    scene: &Scene,
    config: &RenderConfig,
    vertex: &NeeVertex,
    stack: &MediumStack,
    rng: &mut dyn RngCore,
) -> Vec3 {
    let lights = scene.lights();
    if lights.is_empty() {
        return Vec3::ZERO;
    }
    let light_index = lights[gen_index(rng, lights.len())];

    let origin = vertex.point();
    let (light_point, inverse_pdf) =
        scene.primitives()[light_index].random_light_point(origin, rng);
    if inverse_pdf <= 0.0 {
        return Vec3::ZERO;
    }

    let to_light = light_point - origin;
    let distance = to_light.length();
    if distance <= EPSILON {
        return Vec3::ZERO;
    }
    let direction = to_light / distance;

    let shadow_ray = Ray::new(origin, direction, RayKind::Diffuse);
    let Some(shadow_hit) = scene.find_closest_hit(&shadow_ray, config.max_ray_distance) else {
        return Vec3::ZERO;
    };

    // Occluded, struck a different object, or landed on the back face
    if shadow_hit.object_index != light_index
        || (shadow_hit.distance - distance).abs() > EPSILON
        || !shadow_hit.outside
    {
        return Vec3::ZERO;
    }

    let (bsdf_cos, bsdf_pdf) = match vertex {
        NeeVertex::Surface { hit, material, uv } => {
            let cosine = hit.normal.dot(direction).max(0.0);
            if cosine <= 0.0 {
                return Vec3::ZERO;
            }
            (
                material.eval(hit, *uv, direction) * cosine,
                material.pdf(hit, *uv, direction),
            )
        }
        NeeVertex::Medium {
            incident, medium, ..
        } => {
            let phase = medium.phase_pdf(*incident, direction);
            (Vec3::splat(phase), phase)
        }
    };

    let emission = scene.material_at(&shadow_hit).emission(
        scene.primitives()[shadow_hit.object_index].uv(shadow_hit.point, shadow_hit.primitive_id),
    );

    let n_lights = lights.len() as f64;
    let light_pdf = 1.0 / (inverse_pdf * n_lights);
    let mis_weight = power_heuristic(light_pdf, bsdf_pdf);

    let transmittance = scene.medium(stack.current()).transmittance(distance);

    mis_weight * bsdf_cos * emission * inverse_pdf * n_lights * transmittance
}
