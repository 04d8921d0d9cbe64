use image::ExtendedColorType;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use crate::error::Result;

pub fn encode_rgb_png(cols: u32, rows: u32, rgb_data: &[u8]) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(rgb_data, cols, rows, ExtendedColorType::Rgb8)?;
    Ok(bytes)
}
