//! Stylization building blocks: embedding blend, raster/tensor conversion,
//! input resizing and the staged pipeline that ties them together.
pub mod blend;
pub mod pipeline;
pub mod pixels;
pub mod resize;
