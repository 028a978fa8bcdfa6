use std::fs;
use std::path::Path;

use image::{ColorType, ImageFormat};

use crate::RenderError;

/// Encode an RGBA8 buffer (rows top to bottom) as PNG, creating parent
/// directories as needed.
pub fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image::save_buffer_with_format(path, rgba, width, height, ColorType::Rgba8, ImageFormat::Png)?;
    log::debug!("Wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}
