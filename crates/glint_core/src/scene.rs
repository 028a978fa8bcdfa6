//! Fixed-capacity scene aggregate.
//!
//! The shader declares its primitive arrays with fixed lengths, so a scene
//! carries the capacity pair (`SceneSchema`) it was built for and refuses to
//! grow past it.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Camera, Material, Quad, Sphere};

/// Default number of sphere slots.
pub const SPHERE_CAPACITY: usize = 4;
/// Default number of quad slots.
pub const QUAD_CAPACITY: usize = 7;

/// Errors that can occur while assembling a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Scene holds at most {capacity} {kind}, tried to add {requested}")]
    CapacityExceeded {
        kind: &'static str,
        capacity: usize,
        requested: usize,
    },

    #[error("Layout fills {filled} {kind} but the schema has {capacity} slots")]
    LayoutMismatch {
        kind: &'static str,
        capacity: usize,
        filled: usize,
    },

    #[error("Camera error: {0}")]
    Camera(#[from] crate::CameraError),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Primitive capacities shared between host and shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSchema {
    pub spheres: usize,
    pub quads: usize,
}

impl Default for SceneSchema {
    fn default() -> Self {
        Self {
            spheres: SPHERE_CAPACITY,
            quads: QUAD_CAPACITY,
        }
    }
}

/// Everything the shader needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    /// Maximum ray bounce count
    pub depth: u32,
    pub camera: Camera,
    schema: SceneSchema,
    spheres: Vec<Sphere>,
    quads: Vec<Quad>,
}

impl Scene {
    /// Create an empty scene for the given schema.
    pub fn new(schema: SceneSchema, depth: u32, camera: Camera) -> Self {
        Self {
            depth,
            camera,
            schema,
            spheres: Vec::with_capacity(schema.spheres),
            quads: Vec::with_capacity(schema.quads),
        }
    }

    pub fn schema(&self) -> SceneSchema {
        self.schema
    }

    /// Populated sphere slots, in slot order.
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Populated quad slots, in slot order.
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Get the sphere in slot `index`, if populated.
    pub fn sphere(&self, index: usize) -> Option<&Sphere> {
        self.spheres.get(index)
    }

    /// Get the quad in slot `index`, if populated.
    pub fn quad(&self, index: usize) -> Option<&Quad> {
        self.quads.get(index)
    }

    /// Check if every slot is populated.
    pub fn is_full(&self) -> bool {
        self.spheres.len() == self.schema.spheres && self.quads.len() == self.schema.quads
    }

    /// Fill the next free sphere slot.
    pub fn push_sphere(&mut self, sphere: Sphere) -> SceneResult<()> {
        if self.spheres.len() >= self.schema.spheres {
            return Err(SceneError::CapacityExceeded {
                kind: "spheres",
                capacity: self.schema.spheres,
                requested: self.spheres.len() + 1,
            });
        }
        self.spheres.push(sphere);
        Ok(())
    }

    /// Fill the next free quad slot.
    pub fn push_quad(&mut self, quad: Quad) -> SceneResult<()> {
        if self.quads.len() >= self.schema.quads {
            return Err(SceneError::CapacityExceeded {
                kind: "quads",
                capacity: self.schema.quads,
                requested: self.quads.len() + 1,
            });
        }
        self.quads.push(quad);
        Ok(())
    }

    /// Add the six faces of an axis-aligned box spanning `min` to
    /// `min + size`. Either all six faces fit or nothing is added.
    pub fn push_box(&mut self, min: Vec3, size: Vec3, material: Material) -> SceneResult<()> {
        let free = self.schema.quads - self.quads.len();
        if free < 6 {
            return Err(SceneError::CapacityExceeded {
                kind: "quads",
                capacity: self.schema.quads,
                requested: self.quads.len() + 6,
            });
        }

        let max = min + size;
        let dx = Vec3::new(size.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, size.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, size.z);

        // Edge order keeps every normal pointing outward.
        let faces = [
            Quad::new(Vec3::new(min.x, min.y, max.z), dx, dy, material), // front
            Quad::new(Vec3::new(max.x, min.y, max.z), -dz, dy, material), // right
            Quad::new(Vec3::new(max.x, min.y, min.z), -dx, dy, material), // back
            Quad::new(Vec3::new(min.x, min.y, min.z), dz, dy, material), // left
            Quad::new(Vec3::new(min.x, max.y, max.z), dx, -dz, material), // top
            Quad::new(Vec3::new(min.x, min.y, min.z), dx, dz, material), // bottom
        ];
        self.quads.extend(faces);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraBuilder;

    fn empty_scene(schema: SceneSchema) -> Scene {
        let camera = CameraBuilder::new().with_resolution(4, 4).build().unwrap();
        Scene::new(schema, 10, camera)
    }

    #[test]
    fn test_default_schema() {
        assert_eq!(SceneSchema::default(), SceneSchema { spheres: 4, quads: 7 });
    }

    #[test]
    fn test_sphere_capacity_enforced() {
        let mut scene = empty_scene(SceneSchema { spheres: 2, quads: 0 });
        let sphere = Sphere::new(Vec3::ZERO, 1.0, Material::default());

        scene.push_sphere(sphere).unwrap();
        scene.push_sphere(sphere).unwrap();
        let err = scene.push_sphere(sphere).unwrap_err();

        assert_eq!(
            err,
            SceneError::CapacityExceeded {
                kind: "spheres",
                capacity: 2,
                requested: 3
            }
        );
        assert_eq!(scene.spheres().len(), 2);
        assert!(scene.is_full());
    }

    #[test]
    fn test_box_faces_point_outward() {
        let mut scene = empty_scene(SceneSchema { spheres: 0, quads: 6 });
        let min = Vec3::new(-1.0, 0.0, -1.0);
        let size = Vec3::new(2.0, 1.0, 2.0);
        scene.push_box(min, size, Material::default()).unwrap();

        let center = min + size / 2.0;
        assert_eq!(scene.quads().len(), 6);
        for quad in scene.quads() {
            let face_center = quad.q() + 0.5 * (quad.u() + quad.v());
            assert!(
                quad.normal().dot(face_center - center) > 0.0,
                "normal {:?} points inward",
                quad.normal()
            );
        }
    }

    #[test]
    fn test_box_is_all_or_nothing() {
        let mut scene = empty_scene(SceneSchema { spheres: 0, quads: 7 });
        scene
            .push_quad(Quad::new(Vec3::ZERO, Vec3::X, Vec3::Z, Material::default()))
            .unwrap();
        scene
            .push_quad(Quad::new(Vec3::ZERO, Vec3::X, Vec3::Z, Material::default()))
            .unwrap();

        let result = scene.push_box(Vec3::ZERO, Vec3::ONE, Material::default());
        assert!(matches!(result, Err(SceneError::CapacityExceeded { .. })));
        assert_eq!(scene.quads().len(), 2);
    }

    #[test]
    fn test_slot_lookup() {
        let mut scene = empty_scene(SceneSchema::default());
        scene
            .push_sphere(Sphere::new(Vec3::X, 0.5, Material::noise(1.5)))
            .unwrap();

        assert_eq!(scene.sphere(0).map(|s| s.center), Some(Vec3::X));
        assert!(scene.sphere(1).is_none());
        assert!(scene.quad(0).is_none());
        assert!(!scene.is_full());
    }
}
