//! Pinhole camera for primary ray generation.

use crate::ray::{Ray, RayKind};
use helios_math::Vec3;

/// A pinhole camera.
///
/// The screen plane sits at unit distance along the viewing direction with
/// width 1; height follows the image aspect ratio. There is no lens model:
/// every primary ray leaves the camera position.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    viewing_direction: Vec3,
    screen_y: Vec3,
    screen_x: Vec3,
    screen_position: Vec3,
    screen_width: f64,
    screen_height: f64,
    image_width: usize,
    image_height: usize,
}

impl Camera {
    /// Create a camera at `position` looking along `viewing_direction`.
    ///
    /// `y_up` is orthogonalized against the viewing direction, so any
    /// roughly-up vector works.
    pub fn new(
        position: Vec3,
        viewing_direction: Vec3,
        y_up: Vec3,
        image_width: usize,
        image_height: usize,
    ) -> Self {
        let viewing_direction = viewing_direction.normalize();
        let mut y_up = y_up;
        if viewing_direction.dot(y_up) != 0.0 {
            let perpendicular = viewing_direction.cross(y_up);
            y_up = perpendicular.cross(viewing_direction);
        }
        let screen_y = y_up.normalize();

        let screen_width = 1.0;
        let screen_height = screen_width * image_height as f64 / image_width as f64;
        let screen_x = viewing_direction.cross(screen_y);
        let screen_position = position + viewing_direction;

        Self {
            position,
            viewing_direction,
            screen_y,
            screen_x,
            screen_position,
            screen_width,
            screen_height,
            image_width,
            image_height,
        }
    }

    /// World position of (possibly fractional) pixel coordinates.
    fn index_to_position(&self, x: f64, y: f64) -> Vec3 {
        let local_x = x * self.screen_width / self.image_width as f64 - self.screen_width / 2.0;
        let local_y = y * self.screen_height / self.image_height as f64 - self.screen_height / 2.0;
        self.screen_x * local_x + self.screen_y * local_y + self.screen_position
    }

    /// Generate the primary ray through pixel coordinates `(x, y)`.
    ///
    /// Pixel y grows upward in world space; the renderer flips rows so the
    /// image origin lands top-left.
    pub fn generate_ray(&self, x: f64, y: f64) -> Ray {
        let pixel = self.index_to_position(x, y);
        Ray::new(self.position, pixel - self.position, RayKind::Camera)
    }

    pub fn viewing_direction(&self) -> Vec3 {
        self.viewing_direction
    }
}
