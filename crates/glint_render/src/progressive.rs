//! Progressive accumulation renderer.
//!
//! Splits a sample count into batches, draws each batch on the backend with
//! a fresh seed and averages the read-back frames:
//!
//! `Idle -> Marshaling -> Batch* -> Averaging -> Written -> Idle`

use std::iter;
use std::path::Path;
use std::time::{Duration, Instant};

use glint_core::{Scene, SceneSchema};
use rand::Rng;
use thiserror::Error;

use crate::marshal::{marshal, upload, NUM_SAMPLES, RNG_STATE};
use crate::{write_png, Accumulator, BackendError, RenderBackend};

/// Default samples per batch. Bounds the work of a single draw.
pub const BATCH_SIZE: u32 = 100;

/// Largest batch the `numSamples` parameter (an `i32`) can carry.
pub const MAX_BATCH_SIZE: u32 = i32::MAX as u32;

/// Seeds are drawn uniformly from [0, RNG_STATE_RANGE).
const RNG_STATE_RANGE: f32 = 1_000_000.0;

/// Errors that abort a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Sample count must be at least 1")]
    NoSamples,

    #[error("Scene was built for {scene:?} but the backend expects {backend:?}")]
    SchemaMismatch {
        scene: SceneSchema,
        backend: SceneSchema,
    },

    #[error("Camera was built for {scene:?} but the backend renders {backend:?}")]
    ResolutionMismatch {
        scene: (u32, u32),
        backend: (u32, u32),
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the renderer is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Marshaling,
    Batch { index: u32, of: u32 },
    Averaging,
    Written,
}

/// How a sample count is split into draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: u32,
    /// Number of batches of exactly `batch_size` samples
    pub full: u32,
    /// Samples in the trailing partial batch, 0 if none
    pub remainder: u32,
}

impl BatchPlan {
    /// Split `samples` into batches. `batch_size` is clamped to
    /// `1..=MAX_BATCH_SIZE`.
    pub fn new(samples: u32, batch_size: u32) -> Self {
        let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        Self {
            batch_size,
            full: samples / batch_size,
            remainder: samples % batch_size,
        }
    }

    /// Number of draws, counting the partial batch.
    pub fn len(&self) -> u32 {
        self.full + u32::from(self.remainder != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample count of each draw, in order.
    pub fn batches(&self) -> impl Iterator<Item = u32> {
        let remainder = (self.remainder != 0).then_some(self.remainder);
        iter::repeat(self.batch_size)
            .take(self.full as usize)
            .chain(remainder)
    }
}

/// A converged frame.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, rows top to bottom
    pub pixels: Vec<u8>,
    /// Draws averaged into this frame
    pub batches: u32,
}

impl RenderedImage {
    /// Save as PNG.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        write_png(path, self.width, self.height, &self.pixels)
    }
}

/// Summary of a finished `run`.
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    pub samples: u32,
    pub batches: u32,
    pub elapsed: Duration,
}

/// Drives a backend through batched progressive renders.
pub struct ProgressiveRenderer<B> {
    backend: B,
    batch_size: u32,
    state: RenderState,
}

impl<B: RenderBackend> ProgressiveRenderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            batch_size: BATCH_SIZE,
            state: RenderState::Idle,
        }
    }

    /// Set samples per batch, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn enter(&mut self, state: RenderState) {
        log::trace!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Render `scene` with `num_samples` samples per pixel.
    ///
    /// Any backend failure aborts the whole render.
    pub fn render<R: Rng + ?Sized>(
        &mut self,
        scene: &Scene,
        num_samples: u32,
        rng: &mut R,
    ) -> Result<RenderedImage, RenderError> {
        let result = self.render_batches(scene, num_samples, rng);
        self.enter(RenderState::Idle);
        result
    }

    fn render_batches<R: Rng + ?Sized>(
        &mut self,
        scene: &Scene,
        num_samples: u32,
        rng: &mut R,
    ) -> Result<RenderedImage, RenderError> {
        if num_samples == 0 {
            return Err(RenderError::NoSamples);
        }
        let backend_schema = self.backend.schema();
        if scene.schema() != backend_schema {
            return Err(RenderError::SchemaMismatch {
                scene: scene.schema(),
                backend: backend_schema,
            });
        }

        let (width, height) = self.backend.dimensions();
        let camera = (scene.camera.width, scene.camera.height);
        if camera != (width, height) {
            return Err(RenderError::ResolutionMismatch {
                scene: camera,
                backend: (width, height),
            });
        }

        self.enter(RenderState::Marshaling);
        let bindings = marshal(scene, width, height);
        upload(&mut self.backend, &bindings)?;

        let plan = BatchPlan::new(num_samples, self.batch_size);
        log::info!(
            "Rendering {}x{} @ {} spp: {} batches of {} + remainder {}",
            width,
            height,
            num_samples,
            plan.full,
            plan.batch_size,
            plan.remainder
        );

        let frame_len = self.backend.frame_len();
        let mut draw_buffer = vec![0u8; frame_len];
        let mut accumulator = Accumulator::new(frame_len);

        for (index, samples) in plan.batches().enumerate() {
            self.enter(RenderState::Batch {
                index: index as u32,
                of: plan.len(),
            });

            let seed = rng.gen::<f32>() * RNG_STATE_RANGE;
            self.backend.bind(NUM_SAMPLES, (samples as i32).into())?;
            self.backend.bind(RNG_STATE, seed.into())?;
            self.backend.draw()?;
            self.backend.read_pixels(&mut draw_buffer)?;
            self.backend.present()?;

            accumulator.add(&draw_buffer);
            log::debug!("Batch {}/{} ({} samples) done", index + 1, plan.len(), samples);
        }

        self.enter(RenderState::Averaging);
        let batches = accumulator.batches();
        debug_assert_eq!(batches, plan.len());

        Ok(RenderedImage {
            width,
            height,
            pixels: accumulator.average(),
            batches,
        })
    }

    /// Render and write the result to `path` as PNG.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        scene: &Scene,
        num_samples: u32,
        rng: &mut R,
        path: &Path,
    ) -> Result<RenderStats, RenderError> {
        let start = Instant::now();
        let result = self
            .render_batches(scene, num_samples, rng)
            .and_then(|image| {
                image.save(path)?;
                self.enter(RenderState::Written);
                Ok(image.batches)
            });
        self.enter(RenderState::Idle);

        Ok(RenderStats {
            samples: num_samples,
            batches: result?,
            elapsed: start.elapsed(),
        })
    }
}
