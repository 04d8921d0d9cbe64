//! High-level library API: one [`StyleContext`] owns the model cache, the
//! memory ledger, the exporter and the render target, and exposes the
//! stylization entry points. Construct it once and share it; prefer these
//! entry points over driving the pipeline directly.
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::bench::{Benchmark, BenchmarkReport};
use crate::config::EngineConfig;
use crate::core::params::{CombineOptions, StyleOptions};
use crate::core::processing::pipeline::StylePipeline;
use crate::core::processing::pixels::{PixelBuffer, RenderTarget};
use crate::core::tensor::MemoryLedger;
use crate::error::{Error, Result};
use crate::io::export::{ExportedImage, OutputExporter};
use crate::models::{ModelCache, ModelLoader};
use crate::notify::{HostEvent, HostNotifier, NoopNotifier};
use crate::types::{StyleModel, TransformModel};

pub struct StyleContext {
    config: EngineConfig,
    cache: ModelCache,
    notifier: Arc<dyn HostNotifier>,
    ledger: MemoryLedger,
    exporter: OutputExporter,
    target: Mutex<RenderTarget>,
}

impl StyleContext {
    /// Context with no host attached.
    pub fn new(config: EngineConfig, loader: Arc<dyn ModelLoader>) -> Self {
        Self::with_notifier(config, loader, Arc::new(NoopNotifier))
    }

    pub fn with_notifier(
        config: EngineConfig,
        loader: Arc<dyn ModelLoader>,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        let exporter = OutputExporter::new(
            config.output_dir.clone(),
            config.output_format,
            config.jpeg_quality,
        );
        let cache = ModelCache::new(loader, config.clone(), Arc::clone(&notifier));
        Self {
            config,
            cache,
            notifier,
            ledger: MemoryLedger::new(),
            exporter,
            target: Mutex::new(RenderTarget::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn exporter(&self) -> &OutputExporter {
        &self.exporter
    }

    /// Load the default pair (mobilenet encoder, separable transformer).
    pub async fn preload_defaults(&self) -> Result<()> {
        self.cache.style_model(StyleModel::default()).await?;
        self.cache.transform_model(TransformModel::default()).await?;
        Ok(())
    }

    /// Stylize `options.content_image` with the style of `options.source_image`
    /// and export the result.
    ///
    /// `startProgress` is broadcast first and `endProgress` exactly once when the
    /// run ends, whether it succeeded or not. The image is exported only when
    /// every stage succeeded.
    pub async fn generate_stylized_image(&self, options: StyleOptions) -> Result<ExportedImage> {
        self.notifier.broadcast(HostEvent::StartProgress);
        let rendered = self.stylize(options).await;
        self.finish(rendered)
    }

    /// Mix two style images onto one content image and export the result.
    pub async fn combine_styles(&self, options: CombineOptions) -> Result<ExportedImage> {
        self.notifier.broadcast(HostEvent::StartProgress);
        let rendered = self.combine(options).await;
        self.finish(rendered)
    }

    /// Copy of the last image written to the render target.
    pub fn last_output(&self) -> Option<PixelBuffer> {
        self.target.lock().ok().and_then(|t| t.current().cloned())
    }

    /// Profile all four graphs. Models are evicted from the cache afterwards.
    pub async fn benchmark(&self, benchmark: &Benchmark) -> Result<BenchmarkReport> {
        benchmark.run(&self.cache, &self.ledger).await
    }

    async fn stylize(&self, options: StyleOptions) -> Result<PixelBuffer> {
        let request = options
            .into_request(self.config.max_texture_size)
            .map_err(|e| self.report_size_error(e))?;
        info!(
            style_model = %request.style_model,
            transform_model = %request.transform_model,
            ratio = request.ratio.value(),
            content = ?request.content.dimensions(),
            style = ?request.style.dimensions(),
            "Starting stylization"
        );

        let style_net = self.cache.style_model(request.style_model).await?;
        let transform_net = self.cache.transform_model(request.transform_model).await?;
        StylePipeline::new(&style_net, &transform_net, &self.ledger)
            .run(&request)
            .await
    }

    async fn combine(&self, options: CombineOptions) -> Result<PixelBuffer> {
        let request = options
            .into_request(self.config.max_texture_size)
            .map_err(|e| self.report_size_error(e))?;
        info!(
            style_model = %request.style_model,
            transform_model = %request.transform_model,
            ratio = request.ratio.value(),
            "Starting style combination"
        );

        let style_net = self.cache.style_model(request.style_model).await?;
        let transform_net = self.cache.transform_model(request.transform_model).await?;
        StylePipeline::new(&style_net, &transform_net, &self.ledger)
            .combine(&request)
            .await
    }

    fn report_size_error(&self, e: Error) -> Error {
        if let Error::TextureSize { width, height, max } = e {
            warn!(width, height, max, "input exceeds the maximum texture size");
            self.notifier.broadcast(HostEvent::SizeError);
        }
        e
    }

    fn finish(&self, rendered: Result<PixelBuffer>) -> Result<ExportedImage> {
        let outcome = rendered.and_then(|buffer| {
            let exported = self.exporter.export(&buffer);
            if let Ok(mut target) = self.target.lock() {
                target.write(buffer);
            }
            exported
        });

        let snapshot = self.ledger.snapshot();
        if !snapshot.is_balanced() {
            warn!(live = snapshot.live_tensors(), "tensors still alive after run");
        }
        if let Err(e) = &outcome {
            error!("Stylization failed: {}", e);
        }
        self.notifier.broadcast(HostEvent::EndProgress);
        outcome
    }
}
