//! Surface materials.
//!
//! The shader branches on an integer tag and always receives every material
//! field. On the host side a material is a closed enum so that a metal can't
//! carry a refractive index; `flatten()` produces the wire form.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// A surface material. Exactly one variant is active per instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    /// Lambertian diffuse surface.
    Diffuse { albedo: Color },
    /// Reflective metal. Roughness 0.0 is a perfect mirror, 1.0 is very rough.
    Metal { albedo: Color, roughness: f32 },
    /// Glass-like refractive surface.
    Dielectric { ir: f32 },
    /// Procedural checker pattern.
    Checker { scale: f32 },
    /// Procedural noise pattern.
    Noise { scale: f32 },
    /// Area light.
    Emissive { brightness: f32 },
}

/// Flat material as the shader sees it: every field present, unused ones zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlatMaterial {
    pub albedo: Vec3,
    pub ir: f32,
    pub roughness: f32,
    pub kind: i32,
    pub scale: f32,
}

impl Material {
    /// Wire tag for each variant.
    pub const DIFFUSE: i32 = 0;
    pub const METAL: i32 = 1;
    pub const DIELECTRIC: i32 = 2;
    pub const CHECKER: i32 = 3;
    pub const NOISE: i32 = 4;
    pub const EMISSIVE: i32 = 5;

    pub fn diffuse(albedo: Color) -> Self {
        Self::Diffuse { albedo }
    }

    /// Create a metal. Roughness is clamped to [0, 1].
    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Self::Metal {
            albedo,
            roughness: roughness.clamp(0.0, 1.0),
        }
    }

    /// Create a dielectric.
    ///
    /// - `ir`: index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn dielectric(ir: f32) -> Self {
        Self::Dielectric { ir }
    }

    pub fn checker(scale: f32) -> Self {
        Self::Checker { scale }
    }

    pub fn noise(scale: f32) -> Self {
        Self::Noise { scale }
    }

    pub fn emissive(brightness: f32) -> Self {
        Self::Emissive { brightness }
    }

    /// Draw a random material for dataset generation.
    ///
    /// The tag is uniform over diffuse, metal, dielectric and noise. Colors
    /// and roughness are uniform in [0, 1), the refractive index is uniform
    /// in [1, 2] and the noise scale is fixed at 1.5.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let albedo = Color::new(rng.gen(), rng.gen(), rng.gen());
        match rng.gen_range(0..4) {
            0 => Self::diffuse(albedo),
            1 => Self::metal(albedo, rng.gen()),
            2 => Self::dielectric(rng.gen_range(1.0..=2.0)),
            _ => Self::noise(1.5),
        }
    }

    /// The integer tag the shader switches on.
    pub fn type_id(&self) -> i32 {
        match self {
            Self::Diffuse { .. } => Self::DIFFUSE,
            Self::Metal { .. } => Self::METAL,
            Self::Dielectric { .. } => Self::DIELECTRIC,
            Self::Checker { .. } => Self::CHECKER,
            Self::Noise { .. } => Self::NOISE,
            Self::Emissive { .. } => Self::EMISSIVE,
        }
    }

    /// Check if this material emits light.
    pub fn is_emissive(&self) -> bool {
        matches!(self, Self::Emissive { .. })
    }

    /// Convert to the flat wire form.
    ///
    /// Emissive brightness travels as a grey emission color in `albedo`
    /// since the wire form has no brightness field.
    pub fn flatten(&self) -> FlatMaterial {
        let kind = self.type_id();
        match *self {
            Self::Diffuse { albedo } => FlatMaterial {
                albedo,
                kind,
                ..Default::default()
            },
            Self::Metal { albedo, roughness } => FlatMaterial {
                albedo,
                roughness,
                kind,
                ..Default::default()
            },
            Self::Dielectric { ir } => FlatMaterial {
                ir,
                kind,
                ..Default::default()
            },
            Self::Checker { scale } | Self::Noise { scale } => FlatMaterial {
                scale,
                kind,
                ..Default::default()
            },
            Self::Emissive { brightness } => FlatMaterial {
                albedo: Vec3::splat(brightness),
                kind,
                ..Default::default()
            },
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::splat(0.5))
    }
}
