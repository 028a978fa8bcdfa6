mod config;
mod dataset;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glint_core::Preset;
use glint_render::{GpuConfig, ProgressiveRenderer, WgpuBackend};
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::JobConfig;

/// Progressive GPU path tracing from the command line.
#[derive(Parser)]
#[command(name = "glint", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a single preset scene to a PNG
    Render(RenderArgs),
    /// Render low/high sample pairs of random scenes
    Dataset(DatasetArgs),
}

/// Flags shared by every subcommand.
#[derive(Args)]
struct CommonArgs {
    /// Job configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image width in pixels (square unless the config sets a height)
    #[arg(long)]
    width: Option<u32>,

    /// Seed for scene randomization and per-batch seeds
    #[arg(long)]
    seed: Option<u64>,

    /// WGSL sampling shader
    #[arg(long)]
    shader: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Scene layout
    #[arg(long)]
    preset: Option<Preset>,

    /// Samples per pixel (defaults to samples_high)
    #[arg(long)]
    samples: Option<u32>,

    /// Output PNG
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Args)]
struct DatasetArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of scene pairs
    #[arg(long)]
    scenes: Option<u32>,

    /// Samples per pixel of the low-quality image
    #[arg(long)]
    low: Option<u32>,

    /// Samples per pixel of the high-quality image
    #[arg(long)]
    high: Option<u32>,

    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn load_config(common: &CommonArgs) -> Result<JobConfig> {
    let mut config = match &common.config {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };
    if let Some(width) = common.width {
        config.width = width;
    }
    if common.seed.is_some() {
        config.seed = common.seed;
    }
    if let Some(shader) = &common.shader {
        config.shader = shader.clone();
    }
    Ok(config)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            log::info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

fn create_renderer(config: &JobConfig) -> Result<ProgressiveRenderer<WgpuBackend>> {
    let shader_source = fs::read_to_string(&config.shader)
        .with_context(|| format!("Failed to read shader {}", config.shader.display()))?;
    let backend = WgpuBackend::new(&GpuConfig {
        width: config.width,
        height: config.height(),
        schema: config.schema,
        shader_source,
    })
    .context("Failed to initialize GPU backend")?;
    Ok(ProgressiveRenderer::new(backend).with_batch_size(config.batch_size))
}

fn render(args: RenderArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(preset) = args.preset {
        config.preset = preset;
    }
    config.validate()?;
    let samples = args.samples.unwrap_or(config.samples_high);

    let mut rng = make_rng(config.seed);
    let scene = config
        .preset
        .build(&config.preset_params(), &mut rng)
        .context("Failed to build scene")?;

    let mut renderer = create_renderer(&config)?;
    let stats = renderer.run(&scene, samples, &mut rng, &args.output)?;

    log::info!(
        "Rendered {} ({} spp, {} batches) to {} in {:.2?}",
        config.preset,
        stats.samples,
        stats.batches,
        args.output.display(),
        stats.elapsed
    );
    Ok(())
}

fn generate_dataset(args: DatasetArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(scenes) = args.scenes {
        config.scenes = scenes;
    }
    if let Some(low) = args.low {
        config.samples_low = low;
    }
    if let Some(high) = args.high {
        config.samples_high = high;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.validate()?;

    let mut rng = make_rng(config.seed);
    let mut renderer = create_renderer(&config)?;
    dataset::generate(&config, &mut renderer, &mut rng)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse().command {
        Command::Render(args) => render(args),
        Command::Dataset(args) => generate_dataset(args),
    }
}
