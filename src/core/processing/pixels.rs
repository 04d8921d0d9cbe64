//! Conversions between 8-bit rasters and `f32` tensors, plus the render target
//! that holds the most recent stylized image.
use image::RgbImage;
use ndarray::{Array4, Ix2, Ix3};

use crate::core::tensor::{MemoryLedger, Tensor};
use crate::models::BackendError;

/// Decoded 8-bit RGB output raster, interleaved row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// RGB value at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        match self.data.get(idx..idx + 3)? {
            &[r, g, b] => Some([r, g, b]),
            _ => None,
        }
    }

    pub fn into_rgb_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data)
    }
}

/// Single-slot destination for pipeline output; each run overwrites it.
#[derive(Debug, Default)]
pub struct RenderTarget {
    current: Option<PixelBuffer>,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, buffer: PixelBuffer) {
        self.current = Some(buffer);
    }

    pub fn current(&self) -> Option<&PixelBuffer> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<PixelBuffer> {
        self.current.take()
    }
}

/// RGB8 image -> `[1, H, W, 3]` tensor with channels scaled to `[0, 1]`.
pub fn to_normalized_batch(
    ledger: &MemoryLedger,
    image: &RgbImage,
) -> Result<Tensor, BackendError> {
    let (width, height) = image.dimensions();
    normalize_interleaved(ledger, width, height, image.as_raw())
}

fn normalize_interleaved(
    ledger: &MemoryLedger,
    width: u32,
    height: u32,
    raw: &[u8],
) -> Result<Tensor, BackendError> {
    let values: Vec<f32> = raw.iter().map(|&v| f32::from(v)).collect();
    let mut batch = Array4::from_shape_vec((1, height as usize, width as usize, 3), values)
        .map_err(|e| {
            BackendError::Shape(format!(
                "{width}x{height} RGB raster with {} samples: {e}",
                raw.len()
            ))
        })?;
    batch.par_mapv_inplace(|v| v / 255.0);
    Ok(ledger.track(batch.into_dyn()))
}

/// `[H, W, C]` (C = 1, 3 or 4) or `[H, W]` tensor in `[0, 1]` -> RGB8 raster.
///
/// Values outside `[0, 1]` are clamped. A fourth channel is treated as alpha and dropped;
/// a single channel is replicated to gray.
pub fn to_pixel_buffer(tensor: &Tensor) -> Result<PixelBuffer, BackendError> {
    let view = tensor.view();
    let (height, width, channels) = match *tensor.shape() {
        [h, w] => (h, w, 1),
        [h, w, c] if matches!(c, 1 | 3 | 4) => (h, w, c),
        _ => {
            return Err(BackendError::Shape(format!(
                "expected an [H, W] or [H, W, 1|3|4] image tensor, got {:?}",
                tensor.shape()
            )));
        }
    };
    if height == 0 || width == 0 {
        return Err(BackendError::Shape("image tensor has no pixels".into()));
    }

    let to_u8 = |v: f32| -> u8 {
        if v.is_nan() {
            0
        } else {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };

    let mut data = Vec::with_capacity(height * width * 3);
    if view.ndim() == 2 {
        let gray = view
            .into_dimensionality::<Ix2>()
            .map_err(|e| BackendError::Shape(e.to_string()))?;
        for &v in gray.iter() {
            let g = to_u8(v);
            data.extend_from_slice(&[g, g, g]);
        }
    } else {
        let hwc = view
            .into_dimensionality::<Ix3>()
            .map_err(|e| BackendError::Shape(e.to_string()))?;
        for y in 0..height {
            for x in 0..width {
                if channels == 1 {
                    let g = to_u8(hwc[[y, x, 0]]);
                    data.extend_from_slice(&[g, g, g]);
                } else {
                    data.extend_from_slice(&[
                        to_u8(hwc[[y, x, 0]]),
                        to_u8(hwc[[y, x, 1]]),
                        to_u8(hwc[[y, x, 2]]),
                    ]);
                }
            }
        }
    }

    Ok(PixelBuffer {
        width: width as u32,
        height: height as u32,
        data,
    })
}
