//! Render output buffers.

use helios_math::Vec3;

/// Linear radiance image plus auxiliary geometry buffers for denoising.
///
/// All three buffers are row-major with the origin at the top-left, one
/// `Vec3` per pixel, in linear space with no gamma applied.
#[derive(Debug, Clone)]
pub struct Film {
    pub width: usize,
    pub height: usize,
    /// Mean radiance per pixel
    pub radiance: Vec<Vec3>,
    /// Mean first-hit world position per pixel
    pub position: Vec<Vec3>,
    /// Mean first-hit shading normal per pixel
    pub normal: Vec<Vec3>,
}

impl Film {
    /// Create a film filled with black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            radiance: vec![Vec3::ZERO; width * height],
            position: vec![Vec3::ZERO; width * height],
            normal: vec![Vec3::ZERO; width * height],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Vec3 {
        self.radiance[y * self.width + x]
    }

    /// Mean radiance over the whole image.
    pub fn mean_radiance(&self) -> Vec3 {
        if self.radiance.is_empty() {
            return Vec3::ZERO;
        }
        self.radiance.iter().copied().sum::<Vec3>() / self.radiance.len() as f64
    }

    /// Mean luminance (Rec. 709) over the whole image.
    pub fn mean_luminance(&self) -> f64 {
        let mean = self.mean_radiance();
        0.2126 * mean.x + 0.7152 * mean.y + 0.0722 * mean.z
    }
}
