//! Engine configuration: where the four graphs live, where output goes and
//! the input size limits. Loaded from JSON; every field has a default.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{ModelName, OutputFormat};

/// Largest texture side the renderer accepts, in pixels.
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 16384;

/// Relative (or absolute) location of each graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelLocations {
    pub style_fast: String,
    pub style_high: String,
    pub transform_fast: String,
    pub transform_high: String,
}

impl Default for ModelLocations {
    fn default() -> Self {
        Self {
            style_fast: "saved_model_style_js/model.onnx".to_string(),
            style_high: "saved_model_style_inception_js/model.onnx".to_string(),
            transform_fast: "saved_model_transformer_separable_js/model.onnx".to_string(),
            transform_high: "saved_model_transformer_js/model.onnx".to_string(),
        }
    }
}

impl ModelLocations {
    pub fn get(&self, name: ModelName) -> &str {
        match name {
            ModelName::StyleFast => &self.style_fast,
            ModelName::StyleHigh => &self.style_high,
            ModelName::TransformFast => &self.transform_fast,
            ModelName::TransformHigh => &self.transform_high,
        }
    }

    /// Full location of `name` under `base`. URLs and absolute paths are returned unchanged.
    pub fn resolve(&self, base: &str, name: ModelName) -> String {
        let location = self.get(name);
        if is_url(location) || Path::new(location).is_absolute() || base.is_empty() {
            return location.to_string();
        }
        if is_url(base) {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                location.trim_start_matches('/')
            )
        } else {
            Path::new(base).join(location).to_string_lossy().into_owned()
        }
    }
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL or directory the model locations are relative to
    pub model_base: String,
    pub models: ModelLocations,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    /// JPEG quality, 1..=100
    pub jpeg_quality: u8,
    pub max_texture_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_base: "models".to_string(),
            models: ModelLocations::default(),
            output_dir: PathBuf::from("."),
            output_format: OutputFormat::Png,
            jpeg_quality: 100,
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "stylepro.json"
    }

    pub fn model_location(&self, name: ModelName) -> String {
        self.models.resolve(&self.model_base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_locations_join_the_base() {
        let config = EngineConfig {
            model_base: "https://cdn.example.org/ast/".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(
            config.model_location(ModelName::StyleHigh),
            "https://cdn.example.org/ast/saved_model_style_inception_js/model.onnx"
        );

        let local = EngineConfig::default();
        assert_eq!(
            PathBuf::from(local.model_location(ModelName::TransformFast)),
            Path::new("models").join("saved_model_transformer_separable_js/model.onnx")
        );
    }

    #[test]
    fn absolute_locations_are_kept() {
        let mut config = EngineConfig::default();
        config.models.style_fast = "https://models.example.org/style.onnx".to_string();
        assert_eq!(
            config.model_location(ModelName::StyleFast),
            "https://models.example.org/style.onnx"
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stylepro.json");
        std::fs::write(
            &path,
            r#"{ "output_format": "jpeg", "models": { "style_high": "inception.onnx" } }"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.models.style_high, "inception.onnx");
        assert_eq!(config.models.style_fast, ModelLocations::default().style_fast);
        assert_eq!(config.max_texture_size, DEFAULT_MAX_TEXTURE_SIZE);
    }
}
