//! Paired low/high sample renders of randomized scenes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use glint_core::presets::random_lineup;
use glint_core::Scene;
use glint_render::{ProgressiveRenderer, RenderBackend};
use rand::Rng;
use serde::Serialize;

use crate::config::JobConfig;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One rendered pair.
#[derive(Debug, Serialize)]
pub struct DatasetEntry {
    pub index: u32,
    pub low: PathBuf,
    pub high: PathBuf,
    pub low_seconds: f64,
    pub high_seconds: f64,
    pub scene: Scene,
}

/// Index written next to the images.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub width: u32,
    pub height: u32,
    pub samples_low: u32,
    pub samples_high: u32,
    pub seed: Option<u64>,
    pub entries: Vec<DatasetEntry>,
}

/// Render `config.scenes` random scenes twice each into
/// `<output_dir>/low/<i>.png` and `<output_dir>/high/<i>.png`, then write
/// the manifest.
pub fn generate<B, R>(
    config: &JobConfig,
    renderer: &mut ProgressiveRenderer<B>,
    rng: &mut R,
) -> Result<Manifest>
where
    B: RenderBackend,
    R: Rng + ?Sized,
{
    let params = config.preset_params();
    let dir = &config.output_dir;
    let mut entries = Vec::with_capacity(config.scenes as usize);
    let start = Instant::now();

    for index in 0..config.scenes {
        let scene = random_lineup(&params, rng)
            .with_context(|| format!("Failed to build scene {}", index))?;

        let low = dir.join("low").join(format!("{}.png", index));
        let low_stats = renderer
            .run(&scene, config.samples_low, rng, &low)
            .with_context(|| format!("Failed to render {}", low.display()))?;

        let high = dir.join("high").join(format!("{}.png", index));
        let high_stats = renderer
            .run(&scene, config.samples_high, rng, &high)
            .with_context(|| format!("Failed to render {}", high.display()))?;

        log::info!(
            "Scene {}/{}: low {:.2?}, high {:.2?}",
            index + 1,
            config.scenes,
            low_stats.elapsed,
            high_stats.elapsed
        );

        entries.push(DatasetEntry {
            index,
            low,
            high,
            low_seconds: low_stats.elapsed.as_secs_f64(),
            high_seconds: high_stats.elapsed.as_secs_f64(),
            scene,
        });
    }

    let manifest = Manifest {
        width: params.width,
        height: params.height,
        samples_low: config.samples_low,
        samples_high: config.samples_high,
        seed: config.seed,
        entries,
    };
    write_manifest(dir, &manifest)?;

    log::info!(
        "Generated {} pairs in {:.2?}",
        manifest.entries.len(),
        start.elapsed()
    );
    Ok(manifest)
}

fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::SceneSchema;
    use glint_render::{BackendError, ParamValue};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct GreyBackend;

    impl RenderBackend for GreyBackend {
        fn dimensions(&self) -> (u32, u32) {
            (2, 2)
        }

        fn schema(&self) -> SceneSchema {
            SceneSchema::default()
        }

        fn bind(&mut self, _name: &str, _value: ParamValue) -> Result<(), BackendError> {
            Ok(())
        }

        fn draw(&mut self) -> Result<(), BackendError> {
            Ok(())
        }

        fn read_pixels(&mut self, dst: &mut [u8]) -> Result<(), BackendError> {
            dst.fill(128);
            Ok(())
        }
    }

    #[test]
    fn test_generate_writes_pairs_and_manifest() {
        let dir = std::env::temp_dir().join(format!("glint-dataset-{}", std::process::id()));
        let config = JobConfig {
            width: 2,
            scenes: 2,
            samples_low: 10,
            samples_high: 150,
            seed: Some(5),
            output_dir: dir.clone(),
            ..Default::default()
        };
        let mut renderer = ProgressiveRenderer::new(GreyBackend);
        let mut rng = StdRng::seed_from_u64(5);

        let manifest = generate(&config, &mut renderer, &mut rng).unwrap();

        assert_eq!(manifest.entries.len(), 2);
        for (i, entry) in manifest.entries.iter().enumerate() {
            assert_eq!(entry.low, dir.join("low").join(format!("{}.png", i)));
            assert_eq!(entry.high, dir.join("high").join(format!("{}.png", i)));
            assert!(entry.low.exists());
            assert!(entry.high.exists());
            assert!(entry.scene.is_full());
        }
        // Each scene is drawn from the shared generator
        assert_ne!(
            manifest.entries[0].scene.spheres(),
            manifest.entries[1].scene.spheres()
        );

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(json["samples_high"], 150);
        assert_eq!(json["entries"].as_array().unwrap().len(), 2);
        assert_eq!(json["entries"][1]["index"], 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
