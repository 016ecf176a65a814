//! Value maps: constant or bitmap-backed scalar and RGB lookups.
//!
//! Materials read albedo, roughness, emission and mix factors through these
//! maps so a parameter can be a plain number or a tiled texture without the
//! material caring which.

use helios_math::{Vec2, Vec3};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building a value map.
#[derive(Error, Debug)]
pub enum ValueMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Bitmap dimensions {width}x{height} do not match {pixels} pixels")]
    DimensionMismatch {
        width: u32,
        height: u32,
        pixels: usize,
    },

    #[error("Bitmap must have at least one pixel")]
    Empty,
}

/// A decoded bitmap holding linear RGB pixels.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    /// Linear RGB, row-major
    pixels: Vec<Vec3>,
}

impl Bitmap {
    /// Create a bitmap from linear RGB pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Result<Self, ValueMapError> {
        if width == 0 || height == 0 || pixels.is_empty() {
            return Err(ValueMapError::Empty);
        }
        if pixels.len() != (width * height) as usize {
            return Err(ValueMapError::DimensionMismatch {
                width,
                height,
                pixels: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load a bitmap from an image file, converting sRGB to linear.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ValueMapError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Vec3> = rgba
            .pixels()
            .map(|p| {
                Vec3::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect();

        log::debug!(
            "Loaded bitmap: {} ({}x{})",
            path.display(),
            width,
            height
        );

        Self::from_pixels(width, height, pixels)
    }

    /// Sample the bitmap at UV coordinates with tiling and bilinear filtering.
    ///
    /// Out-of-range coordinates wrap (modular addressing); v is flipped so
    /// (0, 0) addresses the bottom-left of the image.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);

        let x = u * (self.width as f64 - 1.0);
        let y = (1.0 - v) * (self.height as f64 - 1.0);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x1, y0);
        let p01 = self.pixel(x0, y1);
        let p11 = self.pixel(x1, y1);

        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    #[inline]
    fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Convert an sRGB byte value to linear.
fn srgb_to_linear(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// An RGB-valued map: constant color or tiled bitmap.
#[derive(Debug, Clone)]
pub enum ColorMap {
    Constant(Vec3),
    Bitmap(Arc<Bitmap>),
}

impl ColorMap {
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        match self {
            ColorMap::Constant(color) => *color,
            ColorMap::Bitmap(bitmap) => bitmap.sample(uv),
        }
    }
}

impl From<Vec3> for ColorMap {
    fn from(color: Vec3) -> Self {
        ColorMap::Constant(color)
    }
}

/// A scalar-valued map: constant or one channel of a tiled bitmap.
#[derive(Debug, Clone)]
pub enum ScalarMap {
    Constant(f64),
    Bitmap(Arc<Bitmap>),
}

impl ScalarMap {
    pub fn sample(&self, uv: Vec2) -> f64 {
        match self {
            ScalarMap::Constant(value) => *value,
            ScalarMap::Bitmap(bitmap) => bitmap.sample(uv).x,
        }
    }

    /// Upper bound of the map over its domain, used to decide whether an
    /// emission map makes a material a light source.
    pub fn max_value(&self) -> f64 {
        match self {
            ScalarMap::Constant(value) => *value,
            ScalarMap::Bitmap(bitmap) => bitmap
                .pixels
                .iter()
                .map(|p| p.x)
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl From<f64> for ScalarMap {
    fn from(value: f64) -> Self {
        ScalarMap::Constant(value)
    }
}
