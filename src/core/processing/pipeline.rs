//! The staged stylization pipeline.
//!
//! encode(style) -> [encode(content) -> blend] -> decode(content, embedding) -> pixels
//!
//! Every stage yields to the runtime before it starts so a host sharing the
//! thread keeps receiving events during long inference calls. Each stage runs
//! inside [`MemoryLedger::tidy`]; intermediates die with the stage and the
//! stage outputs are released right after their last consumer.
use image::RgbImage;
use tokio::task::yield_now;
use tracing::{debug, info};

use crate::core::params::{CombineRequest, StyleRatio, StylizationRequest};
use crate::core::processing::blend::{EMBEDDING_DIM, blend};
use crate::core::processing::pixels::{PixelBuffer, to_normalized_batch, to_pixel_buffer};
use crate::core::tensor::{MemoryLedger, Tensor};
use crate::error::{Error, Result};
use crate::models::{BackendError, ModelHandle};
use crate::types::Stage;

pub struct StylePipeline<'a> {
    style_net: &'a ModelHandle,
    transform_net: &'a ModelHandle,
    ledger: &'a MemoryLedger,
}

impl<'a> StylePipeline<'a> {
    pub fn new(
        style_net: &'a ModelHandle,
        transform_net: &'a ModelHandle,
        ledger: &'a MemoryLedger,
    ) -> Self {
        Self {
            style_net,
            transform_net,
            ledger,
        }
    }

    /// Stylize `request.content` with the style of `request.style`.
    pub async fn run(&self, request: &StylizationRequest) -> Result<PixelBuffer> {
        info!("Generating {}D style representation", EMBEDDING_DIM);
        let style_embedding = self.encode(Stage::EncodeStyle, &request.style).await?;

        let final_embedding = if request.ratio.is_full_style() {
            style_embedding
        } else {
            info!("Generating {}D identity style representation", EMBEDDING_DIM);
            let identity_embedding = self.encode(Stage::EncodeContent, &request.content).await?;
            let blended = self
                .blend(&style_embedding, &identity_embedding, request.ratio)
                .await?;
            style_embedding.release();
            identity_embedding.release();
            blended
        };

        info!("Stylizing image...");
        let stylized = self.decode(&request.content, &final_embedding).await?;
        let buffer = self.render(&stylized).await?;

        final_embedding.release();
        stylized.release();
        Ok(buffer)
    }

    /// Mix two styles: the first weighted `1 - ratio`, the second `ratio`.
    pub async fn combine(&self, request: &CombineRequest) -> Result<PixelBuffer> {
        info!("Generating {}D style representation of image 1", EMBEDDING_DIM);
        let first = self.encode(Stage::EncodeStyle, &request.first_style).await?;
        info!("Generating {}D style representation of image 2", EMBEDDING_DIM);
        let second = self.encode(Stage::EncodeStyle, &request.second_style).await?;

        let combined = self.blend(&second, &first, request.ratio).await?;
        first.release();
        second.release();

        info!("Stylizing image...");
        let stylized = self.decode(&request.content, &combined).await?;
        let buffer = self.render(&stylized).await?;

        combined.release();
        stylized.release();
        Ok(buffer)
    }

    async fn encode(&self, stage: Stage, image: &RgbImage) -> Result<Tensor> {
        yield_now().await;
        self.ledger
            .tidy(stage, |ledger| {
                let input = to_normalized_batch(ledger, image)?;
                let embedding = self.style_net.predict(&[&input], ledger)?;
                if embedding.len() != EMBEDDING_DIM {
                    return Err(BackendError::Shape(format!(
                        "{} produced {:?}, expected {} values",
                        self.style_net.name(),
                        embedding.shape(),
                        EMBEDDING_DIM
                    )));
                }
                Ok(embedding)
            })
            .map_err(|e| Error::stylization(stage, e))
    }

    async fn blend(&self, a: &Tensor, b: &Tensor, ratio: StyleRatio) -> Result<Tensor> {
        yield_now().await;
        debug!(weight_a = ratio.value(), weight_b = 1.0 - ratio.value(), "blending embeddings");
        self.ledger
            .tidy(Stage::Blend, |ledger| blend(ledger, a, b, ratio.value()))
            .map_err(|e| Error::stylization(Stage::Blend, e))
    }

    async fn decode(&self, content: &RgbImage, embedding: &Tensor) -> Result<Tensor> {
        yield_now().await;
        self.ledger
            .tidy(Stage::Decode, |ledger| {
                let input = to_normalized_batch(ledger, content)?;
                let output = self.transform_net.predict(&[&input, embedding], ledger)?;
                output.squeeze_batch()
            })
            .map_err(|e| Error::stylization(Stage::Decode, e))
    }

    async fn render(&self, stylized: &Tensor) -> Result<PixelBuffer> {
        yield_now().await;
        to_pixel_buffer(stylized).map_err(|e| Error::stylization(Stage::Render, e))
    }
}
