//! Shared types and enums used across stylepro.
//! Includes the model variant selectors (`StyleModel`, `TransformModel`), the
//! logical model names (`ModelName`), `SpeedClass`, `OutputFormat` and the
//! pipeline `Stage` labels used in errors and logs.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::notify::HostEvent;

/// Style encoder variant as accepted by the invocation surface.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StyleModel {
    /// MobileNet-based encoder (fast)
    #[default]
    Mobilenet,
    /// Inception-based encoder (high quality)
    Inception,
}

impl StyleModel {
    pub fn model_name(self) -> ModelName {
        match self {
            StyleModel::Mobilenet => ModelName::StyleFast,
            StyleModel::Inception => ModelName::StyleHigh,
        }
    }
}

impl std::fmt::Display for StyleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleModel::Mobilenet => write!(f, "mobilenet"),
            StyleModel::Inception => write!(f, "inception"),
        }
    }
}

/// Transform (decoder) variant as accepted by the invocation surface.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransformModel {
    /// Depthwise-separable transformer (fast)
    #[default]
    Separable,
    /// Original transformer network (high quality)
    Original,
}

impl TransformModel {
    pub fn model_name(self) -> ModelName {
        match self {
            TransformModel::Separable => ModelName::TransformFast,
            TransformModel::Original => ModelName::TransformHigh,
        }
    }
}

impl std::fmt::Display for TransformModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformModel::Separable => write!(f, "separable"),
            TransformModel::Original => write!(f, "original"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedClass {
    Fast,
    High,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Style,
    Transform,
}

/// Fixed logical names of the four loadable graphs.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ModelName {
    #[serde(rename = "style-fast")]
    StyleFast,
    #[serde(rename = "style-high")]
    StyleHigh,
    #[serde(rename = "transform-fast")]
    TransformFast,
    #[serde(rename = "transform-high")]
    TransformHigh,
}

impl ModelName {
    /// Benchmark order: style variants first, then transform variants.
    pub const ALL: [ModelName; 4] = [
        ModelName::StyleHigh,
        ModelName::StyleFast,
        ModelName::TransformHigh,
        ModelName::TransformFast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::StyleFast => "style-fast",
            ModelName::StyleHigh => "style-high",
            ModelName::TransformFast => "transform-fast",
            ModelName::TransformHigh => "transform-high",
        }
    }

    pub fn speed_class(self) -> SpeedClass {
        match self {
            ModelName::StyleFast | ModelName::TransformFast => SpeedClass::Fast,
            ModelName::StyleHigh | ModelName::TransformHigh => SpeedClass::High,
        }
    }

    pub fn kind(self) -> ModelKind {
        match self {
            ModelName::StyleFast | ModelName::StyleHigh => ModelKind::Style,
            ModelName::TransformFast | ModelName::TransformHigh => ModelKind::Transform,
        }
    }

    /// Host event announcing that this model finished loading.
    pub fn loaded_event(self) -> HostEvent {
        match (self.kind(), self.speed_class()) {
            (ModelKind::Style, SpeedClass::Fast) => HostEvent::FastModelLoad,
            (ModelKind::Style, SpeedClass::High) => HostEvent::HighModelLoad,
            (ModelKind::Transform, SpeedClass::Fast) => HostEvent::FastTransformLoad,
            (ModelKind::Transform, SpeedClass::High) => HostEvent::HighTransformLoad,
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style-fast" => Ok(ModelName::StyleFast),
            "style-high" => Ok(ModelName::StyleHigh),
            "transform-fast" => Ok(ModelName::TransformFast),
            "transform-high" => Ok(ModelName::TransformHigh),
            other => Err(format!("unknown model name: {other}")),
        }
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, Hash, Debug, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg, // Lossy
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Pipeline stage labels, used to tag stylization failures.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Stage {
    Prepare,
    EncodeStyle,
    EncodeContent,
    Blend,
    Decode,
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Prepare => "prepare",
            Stage::EncodeStyle => "encode-style",
            Stage::EncodeContent => "encode-content",
            Stage::Blend => "blend",
            Stage::Decode => "decode",
            Stage::Render => "render",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_resolve_to_logical_names() {
        assert_eq!(StyleModel::Mobilenet.model_name(), ModelName::StyleFast);
        assert_eq!(StyleModel::Inception.model_name(), ModelName::StyleHigh);
        assert_eq!(TransformModel::Separable.model_name(), ModelName::TransformFast);
        assert_eq!(TransformModel::Original.model_name(), ModelName::TransformHigh);
    }

    #[test]
    fn loaded_events_follow_speed_class() {
        assert_eq!(ModelName::StyleFast.loaded_event(), HostEvent::FastModelLoad);
        assert_eq!(ModelName::StyleHigh.loaded_event(), HostEvent::HighModelLoad);
        assert_eq!(ModelName::TransformFast.loaded_event(), HostEvent::FastTransformLoad);
        assert_eq!(ModelName::TransformHigh.loaded_event(), HostEvent::HighTransformLoad);
    }

    #[test]
    fn model_names_parse_and_serialize() {
        for name in ModelName::ALL {
            assert_eq!(name.as_str().parse::<ModelName>().unwrap(), name);
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
        assert!("style-medium".parse::<ModelName>().is_err());
    }

    #[test]
    fn option_strings_are_lowercase() {
        let style: StyleModel = serde_json::from_str("\"inception\"").unwrap();
        assert_eq!(style, StyleModel::Inception);
        let transform: TransformModel = serde_json::from_str("\"original\"").unwrap();
        assert_eq!(transform, TransformModel::Original);
        assert!(serde_json::from_str::<StyleModel>("\"vgg\"").is_err());
    }
}
