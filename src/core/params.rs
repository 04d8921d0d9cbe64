use std::path::PathBuf;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::images::prepare_image;
use crate::types::{StyleModel, TransformModel};

/// Blend weight of the style embedding, validated to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct StyleRatio(f32);

impl StyleRatio {
    pub const FULL: StyleRatio = StyleRatio(1.0);

    pub fn new(value: f32) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidArgument {
                arg: "styleRatio",
                value: value.to_string(),
            })
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Pure style: the content identity encode and the blend are skipped.
    pub fn is_full_style(self) -> bool {
        self.0 == 1.0
    }
}

/// Options accepted by the stylization entry point. All fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    pub content_image: PathBuf,
    pub source_image: PathBuf,
    pub style_model: StyleModel,
    pub transform_model: TransformModel,
    pub style_ratio: f32,
    /// Multiplier applied to the content image dimensions
    pub content_size: f32,
    /// Multiplier applied to the style image dimensions
    pub source_size: f32,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            content_image: PathBuf::from("images/beach.jpg"),
            source_image: PathBuf::from("images/statue_of_liberty.jpg"),
            style_model: StyleModel::Mobilenet,
            transform_model: TransformModel::Separable,
            style_ratio: 0.5,
            content_size: 1.0,
            source_size: 1.0,
        }
    }
}

impl StyleOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the options and decode both images.
    pub fn into_request(self, max_texture_size: u32) -> Result<StylizationRequest> {
        let ratio = StyleRatio::new(self.style_ratio)?;
        let content = prepare_image(&self.content_image, self.content_size, max_texture_size)?;
        let style = prepare_image(&self.source_image, self.source_size, max_texture_size)?;
        Ok(StylizationRequest {
            content,
            style,
            style_model: self.style_model,
            transform_model: self.transform_model,
            ratio,
        })
    }
}

/// A validated run: decoded images plus resolved variants. Immutable once built.
#[derive(Debug, Clone)]
pub struct StylizationRequest {
    pub content: RgbImage,
    pub style: RgbImage,
    pub style_model: StyleModel,
    pub transform_model: TransformModel,
    pub ratio: StyleRatio,
}

/// Options for mixing two style images onto one content image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombineOptions {
    pub content_image: PathBuf,
    pub first_style_image: PathBuf,
    pub second_style_image: PathBuf,
    pub style_model: StyleModel,
    pub transform_model: TransformModel,
    /// Weight of the second style; the first gets `1 - combineRatio`
    pub combine_ratio: f32,
    pub content_size: f32,
    pub source_size: f32,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            content_image: PathBuf::from("images/beach.jpg"),
            first_style_image: PathBuf::from("images/statue_of_liberty.jpg"),
            second_style_image: PathBuf::from("images/towers.jpg"),
            style_model: StyleModel::Mobilenet,
            transform_model: TransformModel::Separable,
            combine_ratio: 0.5,
            content_size: 1.0,
            source_size: 1.0,
        }
    }
}

impl CombineOptions {
    pub fn into_request(self, max_texture_size: u32) -> Result<CombineRequest> {
        let ratio = StyleRatio::new(self.combine_ratio).map_err(|_| Error::InvalidArgument {
            arg: "combineRatio",
            value: self.combine_ratio.to_string(),
        })?;
        Ok(CombineRequest {
            content: prepare_image(&self.content_image, self.content_size, max_texture_size)?,
            first_style: prepare_image(&self.first_style_image, self.source_size, max_texture_size)?,
            second_style: prepare_image(
                &self.second_style_image,
                self.source_size,
                max_texture_size,
            )?,
            style_model: self.style_model,
            transform_model: self.transform_model,
            ratio,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CombineRequest {
    pub content: RgbImage,
    pub first_style: RgbImage,
    pub second_style: RgbImage,
    pub style_model: StyleModel,
    pub transform_model: TransformModel,
    pub ratio: StyleRatio,
}
