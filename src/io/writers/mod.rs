//! Raster encoders for the exported image.
pub mod jpeg;
pub mod png;

pub use jpeg::encode_rgb_jpeg;
pub use png::encode_rgb_png;
