use std::path::Path;

use image::RgbImage;
use tracing::debug;

use crate::core::processing::resize::{resize_to, scaled_dimensions};
use crate::error::{Error, Result};

/// Decode an image file into RGB8. Missing or undecodable files are input errors.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(Error::Input(format!("image not found: {}", path.display())));
    }
    let decoded = image::open(path)
        .map_err(|e| Error::Input(format!("cannot decode {}: {e}", path.display())))?;
    let rgb = decoded.to_rgb8();
    debug!(path = %path.display(), width = rgb.width(), height = rgb.height(), "image decoded");
    Ok(rgb)
}

/// Load, check the scaled size against `max_texture_size`, then scale by `size`.
/// An oversized target is rejected before any pixels are allocated for it.
pub fn prepare_image(path: &Path, size: f32, max_texture_size: u32) -> Result<RgbImage> {
    let image = load_rgb_image(path)?;
    let (width, height) = scaled_dimensions(image.width(), image.height(), size)?;
    validate_texture_size(width, height, max_texture_size)?;
    resize_to(image, width, height)
}

pub fn validate_texture_size(width: u32, height: u32, max: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max || height > max {
        return Err(Error::TextureSize { width, height, max });
    }
    Ok(())
}
