use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Dimensions after multiplying by `scale`, rounded, never below one pixel.
pub fn calculate_scaled_dimensions(
    original_cols: u32,
    original_rows: u32,
    scale: f32,
) -> (u32, u32) {
    let cols = (original_cols as f64 * scale as f64).round().max(1.0);
    let rows = (original_rows as f64 * scale as f64).round().max(1.0);
    if cols > u32::MAX as f64 || rows > u32::MAX as f64 {
        warn!(
            "Scale factor {} overflows dimensions {}x{}; saturating",
            scale, original_cols, original_rows
        );
    }
    (cols.min(u32::MAX as f64) as u32, rows.min(u32::MAX as f64) as u32)
}

pub fn resize_rgb_image(
    image: &RgbImage,
    target_cols: u32,
    target_rows: u32,
) -> Result<RgbImage> {
    let (original_cols, original_rows) = image.dimensions();
    if (original_cols, original_rows) == (target_cols, target_rows) {
        return Ok(image.clone());
    }

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        original_cols,
        original_rows,
        image.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(|e| Error::Input(format!("invalid source raster: {e}")))?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(|e| Error::Input(format!("resize failed: {e}")))?;

    RgbImage::from_raw(target_cols, target_rows, dst_image.into_vec())
        .ok_or_else(|| Error::Input("resized raster has unexpected length".into()))
}

/// Dimensions of an image scaled by `scale`. Only the numbers are computed, no pixels.
/// A factor of exactly 1.0 keeps the dimensions.
pub fn scaled_dimensions(cols: u32, rows: u32, scale: f32) -> Result<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::InvalidArgument {
            arg: "size",
            value: scale.to_string(),
        });
    }
    if scale == 1.0 {
        return Ok((cols, rows));
    }
    Ok(calculate_scaled_dimensions(cols, rows, scale))
}

/// Resize to `target_cols` x `target_rows`, passing the image through when it already fits.
pub fn resize_to(image: RgbImage, target_cols: u32, target_rows: u32) -> Result<RgbImage> {
    let (cols, rows) = image.dimensions();
    if (cols, rows) == (target_cols, target_rows) {
        return Ok(image);
    }
    info!(
        "Original size: {}x{}, New size: {}x{}",
        cols, rows, target_cols, target_rows
    );
    resize_rgb_image(&image, target_cols, target_rows)
}
