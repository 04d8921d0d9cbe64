//! Saves the rendered image as the `output` artifact.
//!
//! The encoded bytes go to a temporary file next to the destination, which is
//! then persisted over `output.<ext>`. Readers never see a half-written file.
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::core::processing::pixels::PixelBuffer;
use crate::error::{Error, Result};
use crate::io::writers::{encode_rgb_jpeg, encode_rgb_png};
use crate::types::OutputFormat;

/// Base file name of the exported image.
pub const OUTPUT_NAME: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedImage {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct OutputExporter {
    dir: PathBuf,
    format: OutputFormat,
    jpeg_quality: u8,
}

impl OutputExporter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat, jpeg_quality: u8) -> Self {
        Self {
            dir: dir.into(),
            format,
            jpeg_quality,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", OUTPUT_NAME, self.format.extension()))
    }

    pub fn encode(&self, buffer: &PixelBuffer) -> Result<Vec<u8>> {
        let expected = buffer.width as usize * buffer.height as usize * 3;
        if buffer.data.len() != expected {
            return Err(Error::Export(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{} RGB",
                buffer.data.len(),
                expected,
                buffer.width,
                buffer.height
            )));
        }
        match self.format {
            OutputFormat::Png => encode_rgb_png(buffer.width, buffer.height, &buffer.data),
            OutputFormat::Jpeg => {
                encode_rgb_jpeg(buffer.width, buffer.height, &buffer.data, self.jpeg_quality)
            }
        }
    }

    pub fn export(&self, buffer: &PixelBuffer) -> Result<ExportedImage> {
        let bytes = self.encode(buffer)?;
        std::fs::create_dir_all(&self.dir)?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(&bytes)?;
        staged.flush()?;

        let path = self.output_path();
        staged
            .persist(&path)
            .map_err(|e| Error::Export(format!("cannot save {}: {}", path.display(), e.error)))?;

        info!(
            path = %path.display(),
            mime = self.format.mime_type(),
            bytes = bytes.len(),
            "Exported stylized image"
        );
        Ok(ExportedImage {
            path,
            mime_type: self.format.mime_type(),
            width: buffer.width,
            height: buffer.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 128]);
            }
        }
        PixelBuffer { width, height, data }
    }

    #[test]
    fn png_export_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = OutputExporter::new(dir.path(), OutputFormat::Png, 100);
        let buffer = gradient(12, 7);

        let exported = exporter.export(&buffer).unwrap();
        assert_eq!(exported.path, dir.path().join("output.png"));
        assert_eq!(exported.mime_type, "image/png");

        let decoded = image::open(&exported.path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (12, 7));
        assert_eq!(decoded.into_raw(), buffer.data);
    }

    #[test]
    fn jpeg_export_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = OutputExporter::new(dir.path(), OutputFormat::Jpeg, 90);
        let exported = exporter.export(&gradient(16, 9)).unwrap();
        assert_eq!(exported.path, dir.path().join("output.jpg"));
        let decoded = image::open(&exported.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 9));
    }

    #[test]
    fn second_export_overwrites_first() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = OutputExporter::new(dir.path(), OutputFormat::Png, 100);
        exporter.export(&gradient(4, 4)).unwrap();
        exporter.export(&gradient(2, 3)).unwrap();

        let decoded = image::open(dir.path().join("output.png")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 3));
        // no staging files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let exporter = OutputExporter::new(".", OutputFormat::Png, 100);
        let buffer = PixelBuffer { width: 2, height: 2, data: vec![0; 5] };
        assert!(matches!(exporter.encode(&buffer), Err(Error::Export(_))));
    }
}
