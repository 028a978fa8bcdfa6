//! Glint Core - scene description for the progressive GPU renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Sphere`, `Quad` (with its derived plane triple)
//! - **Materials**: the tagged `Material` union and its flat wire form
//! - **Camera**: `CameraBuilder` turning framing parameters into a `Camera`
//! - **Scenes**: fixed-capacity `Scene` aggregates and ready-made presets
//!
//! # Example
//!
//! ```ignore
//! use glint_core::presets::{cornell_showcase, PresetParams};
//!
//! let scene = cornell_showcase(&PresetParams::square(512))?;
//! assert!(scene.is_full());
//! ```

pub mod camera;
pub mod geometry;
pub mod material;
pub mod presets;
pub mod scene;

pub use camera::{Camera, CameraBuilder, CameraError};
pub use geometry::{Quad, Sphere};
pub use material::{FlatMaterial, Material};
pub use presets::Preset;
pub use scene::{Scene, SceneError, SceneSchema, QUAD_CAPACITY, SPHERE_CAPACITY};

/// Re-export Vec3 from glam, the vector type used throughout Glint.
pub use glam::Vec3;
