//! Render configuration and the parallel pixel driver.
//!
//! The image is split into rows; rayon distributes rows across the thread
//! pool and every row owns a ChaCha stream seeded from the base seed and
//! the row index. The worker-to-pixel mapping is therefore fixed, and a
//! render is reproducible for a given seed regardless of thread count.

use crate::film::Film;
use crate::integrator::trace_path;
use crate::sampling::sample_standard_normal;
use crate::scene::Scene;
use helios_math::Vec3;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Render configuration, threaded immutably through the driver.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Independent path samples accumulated per pixel
    pub samples_per_pixel: u32,
    /// Maximum path length
    pub max_depth: u32,
    /// Depth below which Russian roulette is not applied
    pub force_tracing_limit: u32,
    /// Large finite sentinel for rays that escape the scene
    pub max_ray_distance: f64,
    /// Explicit light sampling at every non-specular vertex
    pub enable_nee: bool,
    /// Gaussian sub-pixel jitter for anti-aliasing
    pub enable_antialias: bool,
    /// Base seed for the per-row RNG streams
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            samples_per_pixel: 10,
            max_depth: 100,
            force_tracing_limit: 3,
            max_ray_distance: 1e9,
            enable_nee: true,
            enable_antialias: true,
            seed: 0,
        }
    }
}

/// Render the scene into a film.
pub fn render(scene: &Scene, config: &RenderConfig) -> Film {
    let mut film = Film::new(config.width, config.height);
    let width = config.width;

    log::info!(
        "rendering {}x{} at {} spp across {} threads",
        config.width,
        config.height,
        config.samples_per_pixel,
        rayon::current_num_threads()
    );

    film.radiance
        .par_chunks_mut(width)
        .zip(film.position.par_chunks_mut(width))
        .zip(film.normal.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, ((radiance_row, position_row), normal_row))| {
            let mut rng = row_rng(config.seed, y);
            for x in 0..width {
                let (radiance, position, normal) = render_pixel(scene, config, x, y, &mut rng);
                radiance_row[x] = radiance;
                position_row[x] = position;
                normal_row[x] = normal;
            }
        });

    film
}

/// RNG stream for one image row.
fn row_rng(seed: u64, row: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ (row as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Accumulate all samples for one pixel.
///
/// Returns the mean radiance plus the mean first-hit position and normal
/// over the samples whose primary ray struck geometry.
pub fn render_pixel(
    scene: &Scene,
    config: &RenderConfig,
    x: usize,
    y: usize,
    rng: &mut dyn RngCore,
) -> (Vec3, Vec3, Vec3) {
    let mut radiance = Vec3::ZERO;
    let mut position = Vec3::ZERO;
    let mut normal = Vec3::ZERO;
    let mut primary_hits = 0u32;

    for _ in 0..config.samples_per_pixel {
        let (jitter_x, jitter_y) = if config.enable_antialias {
            (
                sample_standard_normal(rng) / 2.0,
                sample_standard_normal(rng) / 2.0,
            )
        } else {
            (0.0, 0.0)
        };

        // World y grows upward; image rows grow downward
        let px = x as f64 + jitter_x;
        let py = (config.height - 1 - y) as f64 + jitter_y;

        let ray = scene.camera.generate_ray(px, py);
        let sample = trace_path(scene, config, ray, rng);
        radiance += sample.radiance;
        if let Some(primary) = sample.primary_hit {
            position += primary.position;
            normal += primary.normal;
            primary_hits += 1;
        }
    }

    radiance /= config.samples_per_pixel as f64;
    if primary_hits > 0 {
        position /= primary_hits as f64;
        normal /= primary_hits as f64;
    }

    (radiance, position, normal)
}
