//! Ready-made scenes.
//!
//! Both presets place primitives inside the same 5x5x5 box, viewed from
//! the open front. `random_lineup` perturbs its spheres for dataset
//! generation; `cornell_showcase` is fixed.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::material::Color;
use crate::scene::SceneResult;
use crate::{CameraBuilder, Material, Quad, Scene, SceneError, SceneSchema, Sphere};

/// Default maximum bounce count.
pub const DEFAULT_DEPTH: u32 = 10;

/// Quads every preset fills: six walls and the ceiling light.
pub const LAYOUT_QUADS: usize = 7;

const SPHERE_RADIUS: f32 = 0.45;
const LINEUP_GAP: f32 = 0.75;

/// Parameters shared by every preset.
#[derive(Debug, Clone, Copy)]
pub struct PresetParams {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub schema: SceneSchema,
}

impl PresetParams {
    /// Square image with default depth and schema.
    pub fn square(width: u32) -> Self {
        Self {
            width,
            height: width,
            depth: DEFAULT_DEPTH,
            schema: SceneSchema::default(),
        }
    }
}

/// Named scene layouts selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Fixed box with a noise sphere and a small ceiling light.
    Cornell,
    /// Four randomized spheres in a row.
    #[default]
    Random,
}

impl Preset {
    /// Build the scene. `rng` is only drawn from by randomized presets.
    pub fn build<R: Rng + ?Sized>(self, params: &PresetParams, rng: &mut R) -> SceneResult<Scene> {
        match self {
            Self::Cornell => cornell_showcase(params),
            Self::Random => random_lineup(params, rng),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cornell => write!(f, "cornell"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cornell" => Ok(Self::Cornell),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown preset '{}' (expected cornell or random)", other)),
        }
    }
}

fn empty_scene(params: &PresetParams) -> SceneResult<Scene> {
    if params.schema.quads != LAYOUT_QUADS {
        return Err(SceneError::LayoutMismatch {
            kind: "quads",
            capacity: params.schema.quads,
            filled: LAYOUT_QUADS,
        });
    }
    let camera = CameraBuilder::new()
        .with_resolution(params.width, params.height)
        .with_position(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -3.0))
        .with_lens(36.0, 0.02, 5.0)
        .build()?;
    Ok(Scene::new(params.schema, params.depth, camera))
}

/// Floor, back wall, two side walls, the wall behind the camera and the
/// ceiling. Six quads.
fn push_walls(scene: &mut Scene) -> SceneResult<()> {
    // Ground
    scene.push_quad(Quad::new(
        Vec3::new(2.5, -2.5, -2.5),
        Vec3::new(-5.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 5.0),
        Material::checker(1.2),
    ))?;
    // Back, cyan
    scene.push_quad(Quad::new(
        Vec3::new(2.5, -2.5, -2.5),
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(-5.0, 0.0, 0.0),
        Material::metal(Color::new(0.18, 1.0, 1.0), 0.85),
    ))?;
    // Right, red
    scene.push_quad(Quad::new(
        Vec3::new(2.5, -2.5, 2.5),
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(0.0, 0.0, -5.0),
        Material::diffuse(Color::new(0.65, 0.05, 0.05)),
    ))?;
    // Left, green
    scene.push_quad(Quad::new(
        Vec3::new(-2.5, -2.5, -2.5),
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(0.0, 0.0, 5.0),
        Material::metal(Color::new(0.12, 0.45, 0.15), 0.05),
    ))?;
    scene.push_quad(Quad::new(
        Vec3::new(-2.5, -2.5, 2.5),
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(5.0, 0.0, 0.0),
        Material::diffuse(Color::splat(0.73)),
    ))?;
    // Ceiling
    scene.push_quad(Quad::new(
        Vec3::new(-2.5, 2.5, 2.5),
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(5.0, 0.0, 0.0),
        Material::diffuse(Color::splat(0.73)),
    ))
}

/// Box with a single noise-textured sphere and a 1x1 ceiling light.
pub fn cornell_showcase(params: &PresetParams) -> SceneResult<Scene> {
    let mut scene = empty_scene(params)?;

    scene.push_sphere(Sphere::new(Vec3::ZERO, 0.5, Material::noise(1.5)))?;
    push_walls(&mut scene)?;
    // Sits just below the ceiling to avoid z-fighting
    scene.push_quad(Quad::new(
        Vec3::new(-0.5, 2.499, -0.5),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Material::emissive(15.0),
    ))?;

    log::debug!(
        "Built cornell showcase: {} spheres, {} quads",
        scene.spheres().len(),
        scene.quads().len()
    );
    Ok(scene)
}

/// Spheres evenly spaced along X inside the box, each lifted by a uniform
/// jitter in [-2, 2) and given a random material. A 3x3 ceiling light fills
/// the last quad slot.
pub fn random_lineup<R: Rng + ?Sized>(params: &PresetParams, rng: &mut R) -> SceneResult<Scene> {
    let mut scene = empty_scene(params)?;

    let count = params.schema.spheres;
    let offset = -2.5 + LINEUP_GAP;
    let step = if count > 1 {
        (5.0 - LINEUP_GAP * 2.0) / (count - 1) as f32
    } else {
        0.0
    };

    for i in 0..count {
        let center = Vec3::new(offset + step * i as f32, rng.gen_range(-2.0..2.0), 0.0);
        scene.push_sphere(Sphere::new(center, SPHERE_RADIUS, Material::random(rng)))?;
    }

    push_walls(&mut scene)?;
    scene.push_quad(Quad::new(
        Vec3::new(-1.5, 2.499, -1.5),
        Vec3::new(3.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 3.0),
        Material::emissive(4.0),
    ))?;

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_presets_fill_default_schema() {
        let params = PresetParams::square(64);
        let mut rng = StdRng::seed_from_u64(1);

        let random = random_lineup(&params, &mut rng).unwrap();
        assert!(random.is_full());
        assert_eq!(random.depth, DEFAULT_DEPTH);

        let cornell = cornell_showcase(&params).unwrap();
        assert_eq!(cornell.spheres().len(), 1);
        assert_eq!(cornell.quads().len(), 7);
    }

    #[test]
    fn test_random_lineup_jitter_range() {
        let params = PresetParams::square(32);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..50 {
            let scene = random_lineup(&params, &mut rng).unwrap();
            let xs: Vec<f32> = scene.spheres().iter().map(|s| s.center.x).collect();
            assert!((xs[0] + 1.75).abs() < 1e-5);
            assert!((xs[3] - 1.75).abs() < 1e-5);
            for sphere in scene.spheres() {
                assert!((-2.0..2.0).contains(&sphere.center.y));
                assert_eq!(sphere.center.z, 0.0);
                assert_eq!(sphere.radius, SPHERE_RADIUS);
            }
        }
    }

    #[test]
    fn test_random_lineup_is_reproducible_with_seed() {
        let params = PresetParams::square(32);
        let a = random_lineup(&params, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = random_lineup(&params, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a.spheres(), b.spheres());
    }

    #[test]
    fn test_light_is_last_quad() {
        let params = PresetParams::square(16);
        let scene = Preset::Cornell.build(&params, &mut StdRng::seed_from_u64(0)).unwrap();
        let light = scene.quad(6).unwrap();
        assert!(light.material.is_emissive());
        // Faces down into the box
        assert!((light.normal() + Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_small_schema_is_rejected() {
        let params = PresetParams {
            schema: SceneSchema { spheres: 4, quads: 3 },
            ..PresetParams::square(16)
        };
        let result = cornell_showcase(&params);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_quad_schema_is_rejected() {
        let params = PresetParams {
            schema: SceneSchema { spheres: 4, quads: 9 },
            ..PresetParams::square(16)
        };
        let result = random_lineup(&params, &mut StdRng::seed_from_u64(0));
        assert_eq!(
            result.unwrap_err(),
            SceneError::LayoutMismatch {
                kind: "quads",
                capacity: 9,
                filled: LAYOUT_QUADS
            }
        );
        assert!(cornell_showcase(&params).is_err());
    }

    #[test]
    fn test_lineup_fills_any_sphere_count() {
        let params = PresetParams {
            schema: SceneSchema { spheres: 6, quads: 7 },
            ..PresetParams::square(16)
        };
        let scene = random_lineup(&params, &mut StdRng::seed_from_u64(4)).unwrap();
        assert!(scene.is_full());
        assert_eq!(scene.spheres().len(), 6);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Cornell".parse::<Preset>(), Ok(Preset::Cornell));
        assert_eq!("random".parse::<Preset>(), Ok(Preset::Random));
        assert!("sponza".parse::<Preset>().is_err());
        assert_eq!(Preset::Random.to_string(), "random");
    }
}
