//! Job configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use glint_core::presets::{PresetParams, DEFAULT_DEPTH, LAYOUT_QUADS};
use glint_core::{Preset, SceneSchema};
use glint_render::BATCH_SIZE;
use serde::{Deserialize, Serialize};

/// Settings shared by every subcommand. Missing keys take defaults, and
/// command-line flags override whatever the file says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub width: u32,
    /// Defaults to `width`
    pub height: Option<u32>,
    pub depth: u32,
    pub batch_size: u32,
    /// Drawn from entropy when absent
    pub seed: Option<u64>,
    pub shader: PathBuf,
    pub preset: Preset,
    pub scenes: u32,
    pub samples_low: u32,
    pub samples_high: u32,
    pub output_dir: PathBuf,
    pub schema: SceneSchema,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: None,
            depth: DEFAULT_DEPTH,
            batch_size: BATCH_SIZE,
            seed: None,
            shader: PathBuf::from("shaders/pathtrace.wgsl"),
            preset: Preset::default(),
            scenes: 10,
            samples_low: 100,
            samples_high: 1000,
            output_dir: PathBuf::from("dataset"),
            schema: SceneSchema::default(),
        }
    }
}

impl JobConfig {
    /// Parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn height(&self) -> u32 {
        self.height.unwrap_or(self.width)
    }

    pub fn preset_params(&self) -> PresetParams {
        PresetParams {
            width: self.width,
            height: self.height(),
            depth: self.depth,
            schema: self.schema,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.width > 0, "width must be at least 1");
        ensure!(self.height() > 0, "height must be at least 1");
        ensure!(self.depth > 0, "depth must be at least 1");
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(
            self.schema.quads == LAYOUT_QUADS,
            "schema.quads must be {} to match the preset layouts, got {}",
            LAYOUT_QUADS,
            self.schema.quads
        );
        ensure!(
            self.samples_low <= self.samples_high,
            "samples_low ({}) exceeds samples_high ({})",
            self.samples_low,
            self.samples_high
        );
        Ok(())
    }
}
