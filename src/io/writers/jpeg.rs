use jpeg_encoder::{ColorType, Encoder};

use crate::error::{Error, Result};

pub fn encode_rgb_jpeg(cols: u32, rows: u32, rgb_data: &[u8], quality: u8) -> Result<Vec<u8>> {
    let (width, height) = match (u16::try_from(cols), u16::try_from(rows)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(Error::Export(format!(
                "JPEG cannot hold a {cols}x{rows} image (max {} per side)",
                u16::MAX
            )));
        }
    };

    let mut bytes = Vec::new();
    let encoder = Encoder::new(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(rgb_data, width, height, ColorType::Rgb)
        .map_err(|e| Error::Export(e.to_string()))?;
    Ok(bytes)
}
