//! I/O layer: decoding input images, encoding the stylized output and saving
//! it as the `output` artifact.
pub mod export;
pub mod images;
pub mod writers;

pub use export::{ExportedImage, OutputExporter};
pub use images::{load_rgb_image, prepare_image};
