//! Glint Render - progressive accumulation on a GPU backend.
//!
//! A render pushes the scene to the backend once as named parameters, then
//! issues batches of noisy draws, reading each frame back and summing it
//! into a wide accumulator before averaging.

mod accumulator;
mod backend;
pub mod gpu;
pub mod marshal;
mod output;
mod params;
mod progressive;

pub use accumulator::Accumulator;
pub use backend::{BackendError, RenderBackend};
pub use gpu::{GpuConfig, WgpuBackend};
pub use marshal::{binding_count, marshal, upload, NUM_SAMPLES, RNG_STATE};
pub use output::write_png;
pub use params::{Binding, ParamKind, ParamValue};
pub use progressive::{
    BatchPlan, ProgressiveRenderer, RenderError, RenderState, RenderStats, RenderedImage,
    BATCH_SIZE, MAX_BATCH_SIZE,
};
