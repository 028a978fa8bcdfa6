//! Camera basis and viewport construction.
//!
//! The shader generates primary rays from a handful of precomputed vectors:
//! the location of the first pixel center, the per-pixel steps across and
//! down the viewport, and the defocus disk basis. `CameraBuilder` derives
//! them once from the usual look-at framing parameters.

use glam::Vec3;
use serde::Serialize;
use thiserror::Error;

/// World up used for the look-at basis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Errors that can occur while building a camera.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Eye position and look-at target coincide at {0}")]
    CoincidentEye(Vec3),

    #[error("View direction {0} is parallel to world up")]
    DegenerateBasis(Vec3),
}

/// Camera vectors consumed by the shader.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Camera {
    pub position: Vec3,
    pub defocus_disk_u: Vec3,
    pub defocus_disk_v: Vec3,
    pub pixel_delta_u: Vec3,
    pub pixel_delta_v: Vec3,
    pub pixel00_loc: Vec3,
    /// Defocus angle in degrees; 0 disables depth of field.
    pub defocus_angle: f32,
    /// Resolution the pixel steps were derived for
    pub width: u32,
    pub height: u32,
}

/// Builder for [`Camera`].
#[derive(Debug, Clone)]
pub struct CameraBuilder {
    image_width: u32,
    image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus
}

impl CameraBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Derive the camera vectors.
    pub fn build(&self) -> Result<Camera, CameraError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(CameraError::EmptyImage {
                width: self.image_width,
                height: self.image_height,
            });
        }

        let view = self.look_from - self.look_at;
        if view == Vec3::ZERO {
            return Err(CameraError::CoincidentEye(self.look_from));
        }

        // Calculate viewport dimensions
        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        let w = view.normalize();
        let right = WORLD_UP.cross(w);
        if right.length_squared() < 1e-10 {
            return Err(CameraError::DegenerateBasis(-w));
        }
        let u = right.normalize();
        let v = w.cross(u);

        // Rows increase downward, hence -v
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / self.image_width as f32;
        let pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.look_from - self.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        Ok(Camera {
            position: self.look_from,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            pixel_delta_u,
            pixel_delta_v,
            pixel00_loc,
            defocus_angle: self.defocus_angle,
            width: self.image_width,
            height: self.image_height,
        })
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_square_camera_without_defocus() {
        let camera = CameraBuilder::new()
            .with_resolution(64, 64)
            .with_position(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -3.0))
            .with_lens(36.0, 0.0, 5.0)
            .build()
            .unwrap();

        assert_eq!(camera.defocus_disk_u, Vec3::ZERO);
        assert_eq!(camera.defocus_disk_v, Vec3::ZERO);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_viewport_vectors() {
        // 90 degree fov at focus 1 gives a 2x2 viewport.
        let camera = CameraBuilder::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .with_lens(90.0, 0.0, 1.0)
            .build()
            .unwrap();

        assert!(approx(camera.pixel_delta_u, Vec3::new(0.02, 0.0, 0.0)));
        assert!(approx(camera.pixel_delta_v, Vec3::new(0.0, -0.02, 0.0)));
        assert!(approx(camera.pixel00_loc, Vec3::new(-0.99, 0.99, -1.0)));
    }

    #[test]
    fn test_aspect_ratio_widens_viewport() {
        let camera = CameraBuilder::new()
            .with_resolution(200, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .with_lens(90.0, 0.0, 1.0)
            .build()
            .unwrap();

        // Viewport is 4 wide and 2 tall, so pixels stay square.
        assert!(approx(camera.pixel_delta_u, Vec3::new(0.02, 0.0, 0.0)));
        assert!(approx(camera.pixel_delta_v, Vec3::new(0.0, -0.02, 0.0)));
    }

    #[test]
    fn test_defocus_disk_radius() {
        let camera = CameraBuilder::new()
            .with_resolution(10, 10)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0))
            .with_lens(40.0, 10.0, 3.4)
            .build()
            .unwrap();

        let radius = 3.4 * 5.0_f32.to_radians().tan();
        assert!(approx(camera.defocus_disk_u, Vec3::X * radius));
        assert!(approx(camera.defocus_disk_v, Vec3::Y * radius));
        assert_eq!(camera.defocus_angle, 10.0);
    }

    #[test]
    fn test_looking_straight_down_is_rejected() {
        let result = CameraBuilder::new()
            .with_position(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO)
            .build();
        assert!(matches!(result, Err(CameraError::DegenerateBasis(_))));
    }

    #[test]
    fn test_coincident_eye_is_rejected() {
        let result = CameraBuilder::new().with_position(Vec3::ONE, Vec3::ONE).build();
        assert_eq!(result, Err(CameraError::CoincidentEye(Vec3::ONE)));
    }

    #[test]
    fn test_nearby_eye_and_target_are_accepted() {
        let camera = CameraBuilder::new()
            .with_resolution(4, 2)
            .with_position(Vec3::new(0.0, 0.0, 1e-4), Vec3::ZERO)
            .build()
            .unwrap();
        assert!(camera.pixel00_loc.is_finite());
        assert_eq!((camera.width, camera.height), (4, 2));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let result = CameraBuilder::new().with_resolution(0, 10).build();
        assert!(matches!(result, Err(CameraError::EmptyImage { .. })));
    }
}
