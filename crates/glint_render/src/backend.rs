//! The interface between the renderer and whatever evaluates the samples.

use glint_core::SceneSchema;
use thiserror::Error;

use crate::{ParamKind, ParamValue};

/// Errors reported by a rendering backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("No compatible GPU adapter available")]
    NoAdapter,

    #[error("Failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Shader does not declare `const {0}`")]
    MissingCapacity(&'static str),

    #[error("Shader declares {shader:?}, host expects {expected:?}")]
    SchemaMismatch {
        shader: SceneSchema,
        expected: SceneSchema,
    },

    #[error("Shader failed to compile: {0}")]
    ShaderCompile(String),

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Parameter '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("Pixel buffer holds {found} bytes, frame needs {expected}")]
    BufferSize { expected: usize, found: usize },

    #[error("GPU error: {0}")]
    Device(String),

    #[error("Readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
}

/// A device that evaluates one noisy sample pass per draw.
///
/// Calls are blocking and strictly ordered: parameters bound before a draw
/// stay bound until overwritten, and `read_pixels` returns the frame of the
/// most recent draw.
pub trait RenderBackend {
    /// Output size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Primitive capacities the backend was built for.
    fn schema(&self) -> SceneSchema;

    /// Bind a named parameter.
    fn bind(&mut self, name: &str, value: ParamValue) -> Result<(), BackendError>;

    /// Evaluate one pass over every output pixel.
    fn draw(&mut self) -> Result<(), BackendError>;

    /// Copy the last frame as RGBA8, rows top to bottom, into `dst`
    /// (`width * height * 4` bytes).
    fn read_pixels(&mut self, dst: &mut [u8]) -> Result<(), BackendError>;

    /// Give the backend a chance to service its event loop between batches.
    fn present(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Bytes in one RGBA8 frame.
    fn frame_len(&self) -> usize {
        let (width, height) = self.dimensions();
        width as usize * height as usize * 4
    }
}
