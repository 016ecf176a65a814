//! Surface materials and their sampling/evaluation contracts.
//!
//! A material is shared surface state (emission maps, an optional interior
//! medium, the virtual-interface flag) plus a BSDF variant. Sampling returns
//! the BSDF already divided by its PDF so the integrator multiplies the path
//! throughput directly; the PDF itself is reported separately for multiple
//! importance sampling.

use crate::hit::Hit;
use crate::ray::RayKind;
use crate::sampling::{gen_f64, orthonormal_basis, sample_cosine_hemisphere};
use crate::texture::{ColorMap, ScalarMap};
use crate::MediumId;
use helios_math::{Vec2, Vec3};
use rand::RngCore;
use std::f64::consts::PI;

/// Refractive index of the exterior medium (air).
const AIR_REFRACTIVE_INDEX: f64 = 1.0;

/// Result of importance-sampling a material.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    /// Sampled outgoing direction (unit)
    pub outgoing: Vec3,
    /// BSDF x cosine / PDF, ready to multiply into the path throughput
    pub weight: Vec3,
    /// Solid-angle PDF of the sample; delta bounces report infinity
    pub pdf: f64,
    /// Bounce classification for the continued ray
    pub kind: RayKind,
}

/// The BSDF variant of a material.
#[derive(Debug, Clone)]
pub enum MaterialKind {
    /// Lambertian diffuse reflector
    Diffuse { albedo: ColorMap },
    /// Perfect mirror
    Reflective { albedo: ColorMap },
    /// Smooth refractive boundary, dielectric or conductor
    Transparent {
        albedo: ColorMap,
        refractive_index: f64,
        /// Imaginary part of the refractive index (conductors)
        extinction: f64,
        dielectric: bool,
    },
    /// GGX microfacet with an optional Lambertian lobe
    Microfacet {
        albedo: ColorMap,
        roughness: ScalarMap,
        /// Probability of taking the diffuse lobe (dielectrics only)
        percent_diffuse: ScalarMap,
        refractive_index: f64,
        dielectric: bool,
    },
}

/// A surface material: BSDF variant plus shared surface state.
#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    pub emission_color: ColorMap,
    pub emission_intensity: ScalarMap,
    /// Medium bounded by this material's surface, if any
    pub interior_medium: Option<MediumId>,
    /// Virtual boundaries (index-matched interfaces) preserve the incoming
    /// ray classification and MIS state
    pub allow_direct_light: bool,
}

impl Material {
    /// Lambertian surface.
    pub fn diffuse(albedo: impl Into<ColorMap>) -> Self {
        Self::from_kind(MaterialKind::Diffuse {
            albedo: albedo.into(),
        })
    }

    /// Diffuse emitter.
    pub fn emitter(albedo: impl Into<ColorMap>, emission: Vec3, intensity: f64) -> Self {
        let mut material = Self::diffuse(albedo);
        material.emission_color = ColorMap::Constant(emission);
        material.emission_intensity = ScalarMap::Constant(intensity);
        material
    }

    /// Perfect mirror.
    pub fn mirror(albedo: impl Into<ColorMap>) -> Self {
        Self::from_kind(MaterialKind::Reflective {
            albedo: albedo.into(),
        })
    }

    /// Clear dielectric (glass, water).
    pub fn dielectric(refractive_index: f64) -> Self {
        Self::from_kind(MaterialKind::Transparent {
            albedo: ColorMap::Constant(Vec3::ONE),
            refractive_index,
            extinction: 0.0,
            dielectric: true,
        })
    }

    /// Smooth conductor with a complex refractive index.
    pub fn conductor(albedo: impl Into<ColorMap>, refractive_index: f64, extinction: f64) -> Self {
        Self::from_kind(MaterialKind::Transparent {
            albedo: albedo.into(),
            refractive_index,
            extinction,
            dielectric: false,
        })
    }

    /// GGX microfacet surface.
    pub fn microfacet(
        albedo: impl Into<ColorMap>,
        roughness: impl Into<ScalarMap>,
        percent_diffuse: impl Into<ScalarMap>,
        refractive_index: f64,
        dielectric: bool,
    ) -> Self {
        Self::from_kind(MaterialKind::Microfacet {
            albedo: albedo.into(),
            roughness: roughness.into(),
            percent_diffuse: percent_diffuse.into(),
            refractive_index,
            dielectric,
        })
    }

    fn from_kind(kind: MaterialKind) -> Self {
        Self {
            kind,
            emission_color: ColorMap::Constant(Vec3::ONE),
            emission_intensity: ScalarMap::Constant(0.0),
            interior_medium: None,
            allow_direct_light: false,
        }
    }

    /// Attach the medium bounded by this surface.
    pub fn with_medium(mut self, medium: MediumId) -> Self {
        self.interior_medium = Some(medium);
        self
    }

    /// Mark the surface as a virtual (index-matched) boundary.
    pub fn with_allow_direct_light(mut self) -> Self {
        self.allow_direct_light = true;
        self
    }

    /// Emitted radiance at the given UV.
    pub fn emission(&self, uv: Vec2) -> Vec3 {
        self.emission_color.sample(uv) * self.emission_intensity.sample(uv)
    }

    pub fn is_light_source(&self) -> bool {
        self.emission_intensity.max_value() > 0.0
    }

    /// BSDF value toward `to_light`. Delta materials evaluate to black.
    pub fn eval(&self, hit: &Hit, uv: Vec2, to_light: Vec3) -> Vec3 {
        match &self.kind {
            MaterialKind::Diffuse { albedo } => albedo.sample(uv) / PI,
            MaterialKind::Reflective { .. } | MaterialKind::Transparent { .. } => Vec3::ZERO,
            MaterialKind::Microfacet {
                albedo,
                roughness,
                percent_diffuse,
                refractive_index,
                dielectric,
            } => {
                let n = hit.normal;
                let wo = -hit.incident;
                let wi = to_light;
                let n_dot_l = n.dot(wi);
                let n_dot_v = n.dot(wo);
                if n_dot_l <= 0.0 || n_dot_v <= 0.0 {
                    return Vec3::ZERO;
                }

                let albedo = albedo.sample(uv);
                let alpha = ggx_alpha(roughness.sample(uv));
                let pd = if *dielectric {
                    percent_diffuse.sample(uv).clamp(0.0, 1.0)
                } else {
                    0.0
                };

                let h = (wo + wi).normalize();
                let d = ggx_d(n.dot(h).max(0.0), alpha);
                let g = smith_g_ggx(n_dot_l, n_dot_v, alpha);
                let f = fresnel_lobe(albedo, *refractive_index, *dielectric, wi.dot(h).max(0.0));
                let specular = d * g * f / (4.0 * n_dot_l * n_dot_v);

                albedo * (pd / PI) + specular * (1.0 - pd)
            }
        }
    }

    /// Solid-angle PDF of `sample` producing `outgoing`. Zero for deltas.
    pub fn pdf(&self, hit: &Hit, uv: Vec2, outgoing: Vec3) -> f64 {
        match &self.kind {
            MaterialKind::Diffuse { .. } => {
                let cos_theta = hit.normal.dot(outgoing).max(0.0);
                cos_theta / PI
            }
            MaterialKind::Reflective { .. } | MaterialKind::Transparent { .. } => 0.0,
            MaterialKind::Microfacet {
                roughness,
                percent_diffuse,
                dielectric,
                ..
            } => {
                let n = hit.normal;
                let wo = -hit.incident;
                let wi = outgoing;
                let n_dot_l = n.dot(wi);
                if n_dot_l <= 0.0 || n.dot(wo) <= 0.0 {
                    return 0.0;
                }

                let alpha = ggx_alpha(roughness.sample(uv));
                let pd = if *dielectric {
                    percent_diffuse.sample(uv).clamp(0.0, 1.0)
                } else {
                    0.0
                };

                let diffuse_pdf = n_dot_l / PI;
                let h = (wo + wi).normalize();
                let specular_pdf =
                    ggx_d(n.dot(h).max(0.0), alpha) * n.dot(h).max(0.0) / (4.0 * wo.dot(h).max(1e-12));

                pd * diffuse_pdf + (1.0 - pd) * specular_pdf
            }
        }
    }

    /// Importance-sample an outgoing direction.
    pub fn sample(&self, hit: &Hit, uv: Vec2, rng: &mut dyn RngCore) -> BsdfSample {
        match &self.kind {
            MaterialKind::Diffuse { albedo } => {
                let outgoing = sample_cosine_hemisphere(hit.normal, rng);
                let cos_theta = hit.normal.dot(outgoing).max(0.0);
                BsdfSample {
                    outgoing,
                    weight: albedo.sample(uv),
                    pdf: cos_theta / PI,
                    kind: RayKind::Diffuse,
                }
            }
            MaterialKind::Reflective { albedo } => BsdfSample {
                outgoing: reflect(hit.incident, hit.normal),
                weight: albedo.sample(uv),
                pdf: f64::INFINITY,
                kind: RayKind::Reflected,
            },
            MaterialKind::Transparent {
                albedo,
                refractive_index,
                extinction,
                dielectric,
            } => self.sample_transparent(
                hit,
                albedo.sample(uv),
                *refractive_index,
                *extinction,
                *dielectric,
                rng,
            ),
            MaterialKind::Microfacet {
                roughness,
                percent_diffuse,
                dielectric,
                ..
            } => {
                let alpha = ggx_alpha(roughness.sample(uv));
                let pd = if *dielectric {
                    percent_diffuse.sample(uv).clamp(0.0, 1.0)
                } else {
                    0.0
                };

                let outgoing = if gen_f64(rng) < pd {
                    sample_cosine_hemisphere(hit.normal, rng)
                } else {
                    let h = sample_ggx_half_vector(hit.normal, alpha, rng);
                    reflect(hit.incident, h)
                };

                let n_dot_l = hit.normal.dot(outgoing);
                if n_dot_l <= 0.0 {
                    // Sampled below the horizon: the path is absorbed
                    return BsdfSample {
                        outgoing: hit.normal,
                        weight: Vec3::ZERO,
                        pdf: 0.0,
                        kind: RayKind::Diffuse,
                    };
                }

                let pdf = self.pdf(hit, uv, outgoing);
                if pdf <= 0.0 {
                    return BsdfSample {
                        outgoing: hit.normal,
                        weight: Vec3::ZERO,
                        pdf: 0.0,
                        kind: RayKind::Diffuse,
                    };
                }
                let weight = self.eval(hit, uv, outgoing) * n_dot_l / pdf;

                BsdfSample {
                    outgoing,
                    weight,
                    pdf,
                    kind: RayKind::Diffuse,
                }
            }
        }
    }

    /// Fresnel-weighted reflect-or-refract through a smooth boundary.
    fn sample_transparent(
        &self,
        hit: &Hit,
        albedo: Vec3,
        refractive_index: f64,
        extinction: f64,
        dielectric: bool,
        rng: &mut dyn RngCore,
    ) -> BsdfSample {
        // Refractive indices on the incident (1) and transmitted (2) sides
        let (n1, k1, n2, k2) = if hit.outside {
            (AIR_REFRACTIVE_INDEX, 0.0, refractive_index, extinction)
        } else {
            (refractive_index, extinction, AIR_REFRACTIVE_INDEX, 0.0)
        };

        // Normal on the incident side, pointing against the incident ray
        let facing_normal = if hit.outside { hit.normal } else { -hit.normal };

        let transmitted = refract(hit.incident, facing_normal, n1 / n2);
        let reflectance = if transmitted.length_squared() == 0.0 {
            // Total internal reflection
            1.0
        } else {
            let cos_i = (-hit.incident).dot(facing_normal).min(1.0);
            fresnel_reflectance(cos_i, n1, k1, n2, k2, dielectric)
        };

        if gen_f64(rng) <= reflectance {
            let weight = if dielectric { Vec3::ONE } else { albedo };
            BsdfSample {
                outgoing: reflect(hit.incident, facing_normal),
                weight,
                pdf: f64::INFINITY,
                kind: RayKind::Reflected,
            }
        } else {
            // Radiance scales with the squared index ratio across the boundary
            let intensity_factor = (n2 / n1).powi(2);
            BsdfSample {
                outgoing: transmitted,
                weight: albedo * intensity_factor,
                pdf: f64::INFINITY,
                kind: RayKind::Transmitted,
            }
        }
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface with relative index `etai_over_etat`.
///
/// `n` must point against `uv`. Returns the zero vector on total internal
/// reflection.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f64) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let k = 1.0 - r_out_perp.length_squared();
    if k <= 0.0 {
        return Vec3::ZERO;
    }
    r_out_perp - k.sqrt() * n
}

/// Unpolarized Fresnel reflectance at a smooth boundary.
///
/// Dielectrics use the exact two-polarization form; conductors fold the
/// imaginary index into the standard complex-index expansion.
pub fn fresnel_reflectance(cos_i: f64, n1: f64, k1: f64, n2: f64, k2: f64, dielectric: bool) -> f64 {
    let cos_i = cos_i.clamp(0.0, 1.0);
    if dielectric {
        let sin_t2 = (n1 / n2).powi(2) * (1.0 - cos_i * cos_i);
        if sin_t2 >= 1.0 {
            return 1.0;
        }
        let cos_t = (1.0 - sin_t2).sqrt();
        let rs = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
        let rp = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
        (rs * rs + rp * rp) / 2.0
    } else {
        // Relative complex index of the transmitted side
        let eta = n2 / n1.max(1e-12);
        let k = (k2 - k1).abs() / n1.max(1e-12);

        let cos2 = cos_i * cos_i;
        let sin2 = 1.0 - cos2;
        let eta2 = eta * eta;
        let k2 = k * k;

        let t0 = eta2 - k2 - sin2;
        let a2b2 = (t0 * t0 + 4.0 * eta2 * k2).sqrt();
        let t1 = a2b2 + cos2;
        let a = (0.5 * (a2b2 + t0)).max(0.0).sqrt();
        let t2 = 2.0 * a * cos_i;
        let rs = (t1 - t2) / (t1 + t2);
        let t3 = cos2 * a2b2 + sin2 * sin2;
        let t4 = t2 * sin2;
        let rp = rs * (t3 - t4) / (t3 + t4);
        0.5 * (rs + rp)
    }
}

/// Squared-roughness parameterization with a floor against degenerate lobes.
#[inline]
fn ggx_alpha(roughness: f64) -> f64 {
    (roughness * roughness).max(0.001)
}

/// GGX/Trowbridge-Reitz distribution.
#[inline]
fn ggx_d(n_dot_h: f64, alpha: f64) -> f64 {
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// Smith masking-shadowing for GGX.
#[inline]
fn smith_g_ggx(n_dot_l: f64, n_dot_v: f64, alpha: f64) -> f64 {
    let a2 = alpha * alpha;
    let g1_l = 2.0 * n_dot_l / (n_dot_l + (a2 + (1.0 - a2) * n_dot_l * n_dot_l).sqrt());
    let g1_v = 2.0 * n_dot_v / (n_dot_v + (a2 + (1.0 - a2) * n_dot_v * n_dot_v).sqrt());
    g1_l * g1_v
}

/// Schlick weight for Fresnel.
#[inline]
fn schlick_weight(cos_theta: f64) -> f64 {
    let x = (1.0 - cos_theta).clamp(0.0, 1.0);
    let x2 = x * x;
    x2 * x2 * x
}

/// Fresnel term of the microfacet specular lobe.
///
/// Conductors tint by the albedo; dielectrics use the scalar F0 implied by
/// their refractive index.
fn fresnel_lobe(albedo: Vec3, refractive_index: f64, dielectric: bool, cos_theta: f64) -> Vec3 {
    let f0 = if dielectric {
        let r = (AIR_REFRACTIVE_INDEX - refractive_index) / (AIR_REFRACTIVE_INDEX + refractive_index);
        Vec3::splat(r * r)
    } else {
        albedo
    };
    f0 + (Vec3::ONE - f0) * schlick_weight(cos_theta)
}

/// Sample a GGX microfacet half vector in world space.
fn sample_ggx_half_vector(n: Vec3, alpha: f64, rng: &mut dyn RngCore) -> Vec3 {
    let u1 = gen_f64(rng);
    let u2 = gen_f64(rng);

    let theta = (alpha * u1.sqrt() / (1.0 - u1).max(1e-12).sqrt()).atan();
    let phi = 2.0 * PI * u2;

    let sin_theta = theta.sin();
    let cos_theta = theta.cos();
    let h_local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

    let (tangent, bitangent) = orthonormal_basis(n);
    h_local.x * tangent + h_local.y * bitangent + h_local.z * n
}
