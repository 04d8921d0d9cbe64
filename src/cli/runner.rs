use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use stylepro::{
    Benchmark, CombineOptions, EngineConfig, ModelLoader, StyleContext, StyleOptions,
    TracingNotifier,
};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stylepro=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(feature = "onnx")]
fn backend() -> Result<Arc<dyn ModelLoader>, AppError> {
    Ok(Arc::new(stylepro::OnnxLoader::new()))
}

#[cfg(not(feature = "onnx"))]
fn backend() -> Result<Arc<dyn ModelLoader>, AppError> {
    Err(AppError::BackendDisabled)
}

fn load_config(args: &CliArgs) -> Result<EngineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let default = Path::new(EngineConfig::default_path());
            if default.exists() {
                info!("Using configuration from {:?}", default);
                EngineConfig::load(default)?
            } else {
                EngineConfig::default()
            }
        }
    };

    if let Some(base) = &args.model_base {
        config.model_base = base.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(format) = args.format {
        config.output_format = format;
    }
    if let Some(quality) = args.jpeg_quality {
        if !(1..=100).contains(&quality) {
            return Err(AppError::InvalidQuality { quality });
        }
        config.jpeg_quality = quality;
    }
    Ok(config)
}

fn load_options(args: &CliArgs) -> Result<StyleOptions, AppError> {
    let mut options = match &args.options {
        Some(path) if !path.exists() => {
            return Err(AppError::MissingOptions { path: path.clone() });
        }
        Some(path) => StyleOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => StyleOptions::default(),
    };

    if let Some(content) = &args.content {
        options.content_image = content.clone();
    }
    if let Some(style) = &args.style {
        options.source_image = style.clone();
    }
    if let Some(model) = args.style_model {
        options.style_model = model;
    }
    if let Some(model) = args.transform_model {
        options.transform_model = model;
    }
    if let Some(ratio) = args.style_ratio {
        options.style_ratio = ratio;
    }
    if let Some(size) = args.content_size {
        options.content_size = size;
    }
    if let Some(size) = args.source_size {
        options.source_size = size;
    }
    Ok(options)
}

async fn execute(args: CliArgs, config: EngineConfig) -> Result<(), AppError> {
    let ctx = StyleContext::with_notifier(config, backend()?, Arc::new(TracingNotifier));

    if args.benchmark {
        let benchmark = Benchmark {
            runs: args.runs,
            seed: args.seed,
            ..Benchmark::default()
        };
        let report = ctx.benchmark(&benchmark).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let options = load_options(&args)?;
    let exported = match args.combine_with {
        Some(second) => {
            let combine = CombineOptions {
                content_image: options.content_image,
                first_style_image: options.source_image,
                second_style_image: second,
                style_model: options.style_model,
                transform_model: options.transform_model,
                combine_ratio: options.style_ratio,
                content_size: options.content_size,
                source_size: options.source_size,
            };
            ctx.combine_styles(combine).await?
        }
        None => ctx.generate_stylized_image(options).await?,
    };

    info!(
        "Successfully stylized: {:?} ({}x{}, {})",
        exported.path, exported.width, exported.height, exported.mime_type
    );
    println!("{}", exported.path.display());
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging();
    }

    if args.benchmark && args.combine_with.is_some() {
        return Err(AppError::ConflictingArguments {
            first: "--benchmark",
            second: "--combine-with",
        }
        .into());
    }

    let config = load_config(&args)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(args, config))?;
    Ok(())
}
