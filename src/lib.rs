#![doc = r#"
stylepro: arbitrary neural style transfer.

This crate renders a content image in the style of another image using a pair of
pretrained graphs: a style encoder that maps an image to a 100-dimensional style
embedding, and a transformer that decodes the content image conditioned on that
embedding. The style strength is controlled by blending the style embedding with
the content image's own embedding. It powers the `stylepro` CLI and can be
embedded in your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve.
Breaking changes can occur.

Requirements
------------
- ONNX exports of the four graphs (fast/high style encoder, fast/high transformer),
  either on disk or behind an HTTP(S) base URL.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
stylepro = { version = "0.1", features = ["full"] }
```

Quick start: stylize to `output.png`
-------------------------------------
```rust,no_run
use std::sync::Arc;
use stylepro::{EngineConfig, OnnxLoader, StyleContext, StyleModel, StyleOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> stylepro::Result<()> {
    let config = EngineConfig {
        model_base: "https://models.example.org/arbitrary-style/".to_string(),
        ..EngineConfig::default()
    };
    let ctx = StyleContext::new(config, Arc::new(OnnxLoader::new()));
    ctx.preload_defaults().await?;

    let exported = ctx
        .generate_stylized_image(StyleOptions {
            content_image: "photos/harbor.jpg".into(),
            source_image: "art/starry_night.jpg".into(),
            style_model: StyleModel::Inception,
            style_ratio: 0.8,
            ..StyleOptions::default()
        })
        .await?;

    println!("{} ({}x{})", exported.path.display(), exported.width, exported.height);
    Ok(())
}
```

Host progress events
--------------------
Attach a [`HostNotifier`] to follow model loads and run progress. The
[`ChannelNotifier`] forwards events to any number of subscribers.

```rust,no_run
use std::sync::Arc;
use stylepro::{ChannelNotifier, EngineConfig, OnnxLoader, StyleContext, StyleOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> stylepro::Result<()> {
    let notifier = Arc::new(ChannelNotifier::new(16));
    let mut events = notifier.subscribe();
    let ctx = StyleContext::with_notifier(
        EngineConfig::default(),
        Arc::new(OnnxLoader::new()),
        notifier,
    );

    let run = ctx.generate_stylized_image(StyleOptions::default());
    let result = run.await;
    while let Ok(event) = events.try_recv() {
        println!("host event: {event}");
    }
    result.map(|_| ())
}
```

Custom inference backends
-------------------------
The pipeline only depends on the [`GraphModel`] and [`ModelLoader`] traits, so
any runtime can be plugged in. Build without default features to drop the ONNX
Runtime backend entirely.

Error handling
--------------
All public functions return `stylepro::Result<T>`; match on `stylepro::Error` to
handle specific cases.

```rust,no_run
use std::sync::Arc;
use stylepro::{EngineConfig, Error, OnnxLoader, StyleContext, StyleOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let ctx = StyleContext::new(EngineConfig::default(), Arc::new(OnnxLoader::new()));
    match ctx.generate_stylized_image(StyleOptions::default()).await {
        Ok(img) => println!("saved {}", img.path.display()),
        Err(Error::ModelLoad { model, reason }) => eprintln!("{model} unavailable: {reason}"),
        Err(Error::TextureSize { width, height, max }) => {
            eprintln!("{width}x{height} is larger than {max}x{max}")
        }
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Feature flags
-------------
- `onnx` (default): ONNX Runtime backend with HTTP(S) model fetching.
- `full`: enables a complete feature set for typical end-to-end workflows.

Useful modules
--------------
- [`api`]: the `StyleContext` entry points.
- [`types`]: model variants, logical model names and pipeline stages.
- [`models`]: inference backend traits, the model cache and the ONNX backend.
- [`io`]: image decoding and output export.
- [`bench`]: model benchmark harness.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod bench;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod models;
pub mod notify;
pub mod types;

// Curated public API surface
// Types
pub use config::{EngineConfig, ModelLocations};
pub use core::params::{CombineOptions, StyleOptions, StyleRatio};
pub use core::processing::pixels::PixelBuffer;
pub use core::tensor::{MemoryLedger, MemorySnapshot, Tensor};
pub use error::{Error, Result};
pub use types::{ModelName, OutputFormat, Stage, StyleModel, TransformModel};

// Backends
pub use models::{BackendError, GraphModel, ModelCache, ModelHandle, ModelLoader};
#[cfg(feature = "onnx")]
pub use models::onnx::{OnnxLoader, OnnxModel};

// Host notification
pub use notify::{
    ChannelNotifier, HostEvent, HostNotifier, NoopNotifier, RecordingNotifier, TracingNotifier,
};

// High-level API re-exports
pub use api::StyleContext;
pub use bench::{Benchmark, BenchmarkReport, ModelProfile};
pub use io::export::ExportedImage;
