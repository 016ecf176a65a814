//! Participating media and the nested-medium stack.
//!
//! A medium answers three questions for the integrator: how far does a ray
//! fly before scattering, how much radiance survives a segment, and where
//! does a scattered ray go. The scattering medium samples distances against
//! a scalar extinction (the mean extinction component) and compensates the
//! scalar/vector mismatch in the returned throughput weights.

use crate::sampling::{gen_f64, orthonormal_basis, sample_unit_sphere};
use crate::MediumId;
use helios_math::Vec3;
use rand::RngCore;
use std::f64::consts::PI;

/// A participating medium.
#[derive(Debug, Clone)]
pub enum Medium {
    /// Empty space: infinite free flight, unit transmittance
    Vacuum,
    /// Non-scattering absorber (Beer's law)
    BeersLaw { sigma_a: Vec3 },
    /// Homogeneous absorbing + scattering medium with a phase function
    Homogeneous {
        sigma_a: Vec3,
        sigma_s: Vec3,
        /// Henyey-Greenstein asymmetry; 0 is isotropic
        g: f64,
    },
}

impl Medium {
    /// Componentwise extinction.
    fn sigma_t(&self) -> Vec3 {
        match self {
            Medium::Vacuum => Vec3::ZERO,
            Medium::BeersLaw { sigma_a } => *sigma_a,
            Medium::Homogeneous { sigma_a, sigma_s, .. } => *sigma_a + *sigma_s,
        }
    }

    /// Scalar extinction used for free-flight sampling.
    fn sigma_bar(&self) -> f64 {
        let t = self.sigma_t();
        (t.x + t.y + t.z) / 3.0
    }

    pub fn is_scattering(&self) -> bool {
        matches!(self, Medium::Homogeneous { .. })
    }

    /// Sample a free-flight distance; infinite for non-scattering media.
    pub fn sample_distance(&self, rng: &mut dyn RngCore) -> f64 {
        match self {
            Medium::Vacuum | Medium::BeersLaw { .. } => f64::INFINITY,
            Medium::Homogeneous { .. } => {
                let sigma_bar = self.sigma_bar();
                if sigma_bar <= 0.0 {
                    return f64::INFINITY;
                }
                -(1.0 - gen_f64(rng)).max(f64::MIN_POSITIVE).ln() / sigma_bar
            }
        }
    }

    /// Componentwise transmittance over a segment of length `distance`.
    pub fn transmittance(&self, distance: f64) -> Vec3 {
        match self {
            Medium::Vacuum => Vec3::ONE,
            _ => exp_vec(-self.sigma_t() * distance),
        }
    }

    /// Throughput factor for a ray that reached a surface at `distance`.
    ///
    /// Transmittance divided by the probability that the sampled free
    /// flight exceeded the segment.
    pub fn segment_weight(&self, distance: f64) -> Vec3 {
        match self {
            Medium::Vacuum => Vec3::ONE,
            Medium::BeersLaw { sigma_a } => exp_vec(-*sigma_a * distance),
            Medium::Homogeneous { .. } => {
                let pass_probability = (-self.sigma_bar() * distance).exp();
                self.transmittance(distance) / pass_probability.max(f64::MIN_POSITIVE)
            }
        }
    }

    /// Throughput factor for a scatter event sampled at `distance`.
    ///
    /// Transmittance times the scattering coefficient over the sampled
    /// distance density.
    pub fn scatter_weight(&self, distance: f64) -> Vec3 {
        match self {
            Medium::Vacuum | Medium::BeersLaw { .. } => Vec3::ZERO,
            Medium::Homogeneous { sigma_s, .. } => {
                let sigma_bar = self.sigma_bar();
                let density = sigma_bar * (-sigma_bar * distance).exp();
                self.transmittance(distance) * *sigma_s / density.max(f64::MIN_POSITIVE)
            }
        }
    }

    /// Radiance emitted along a segment. All shipped media are non-emitting.
    pub fn emission(&self, _distance: f64) -> Vec3 {
        Vec3::ZERO
    }

    /// Sample a scattering direction for a ray travelling along `incident`.
    pub fn sample_phase(&self, incident: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let g = match self {
            Medium::Homogeneous { g, .. } => *g,
            _ => 0.0,
        };
        if g.abs() < 1e-3 {
            return sample_unit_sphere(rng);
        }

        // Henyey-Greenstein inversion
        let xi = gen_f64(rng);
        let sq = (1.0 - g * g) / (1.0 - g + 2.0 * g * xi);
        let cos_theta = (1.0 + g * g - sq * sq) / (2.0 * g);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * gen_f64(rng);

        let (tangent, bitangent) = orthonormal_basis(incident);
        sin_theta * phi.cos() * tangent + sin_theta * phi.sin() * bitangent + cos_theta * incident
    }

    /// Phase-function density of scattering from `incident` into `outgoing`.
    pub fn phase_pdf(&self, incident: Vec3, outgoing: Vec3) -> f64 {
        let g = match self {
            Medium::Homogeneous { g, .. } => *g,
            _ => 0.0,
        };
        if g.abs() < 1e-3 {
            return 1.0 / (4.0 * PI);
        }
        let cos_theta = incident.dot(outgoing);
        let denom = 1.0 + g * g - 2.0 * g * cos_theta;
        (1.0 - g * g) / (4.0 * PI * denom * denom.sqrt())
    }
}

/// Componentwise exponential.
#[inline]
fn exp_vec(v: Vec3) -> Vec3 {
    Vec3::new(v.x.exp(), v.y.exp(), v.z.exp())
}

/// Maximum nesting depth tracked by the medium stack.
const MAX_STACK_SIZE: usize = 50;

/// LIFO of media the ray is currently inside of.
///
/// Entries pair the medium with the scene index of the object whose surface
/// pushed it, so exits pop the matching entry rather than blindly the top.
/// Mismatched pops are ignored: concave geometry can interleave boundary
/// crossings, and best-effort recovery beats corrupting the stack.
#[derive(Debug, Clone)]
pub struct MediumStack {
    entries: Vec<(usize, MediumId)>,
    background: MediumId,
}

impl MediumStack {
    /// Create a stack with the background medium at the bottom.
    pub fn new(background: MediumId) -> Self {
        Self {
            entries: Vec::new(),
            background,
        }
    }

    /// Medium the ray is currently travelling through.
    pub fn current(&self) -> MediumId {
        self.entries.last().map_or(self.background, |&(_, m)| m)
    }

    /// Record entry into a medium bounded by `object_index`'s surface.
    pub fn push(&mut self, object_index: usize, medium: MediumId) {
        if self.entries.len() >= MAX_STACK_SIZE {
            log::debug!("medium stack full, dropping push for object {object_index}");
            return;
        }
        self.entries.push((object_index, medium));
    }

    /// Record exit from the medium pushed by `object_index`.
    ///
    /// Removes the most recent matching entry. A pop with no matching entry
    /// is silently ignored.
    pub fn pop(&mut self, object_index: usize) {
        if let Some(position) = self
            .entries
            .iter()
            .rposition(|&(index, _)| index == object_index)
        {
            self.entries.remove(position);
        } else {
            log::debug!("medium stack pop with no matching object {object_index}");
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}
