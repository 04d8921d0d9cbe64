use clap::Parser;
use std::path::PathBuf;

use stylepro::types::OutputFormat;
use stylepro::{StyleModel, TransformModel};

#[derive(Parser)]
#[command(name = "stylepro", version, about = "Arbitrary neural style transfer CLI")]
pub struct CliArgs {
    /// Content image to stylize
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Style (source) image
    #[arg(short, long)]
    pub style: Option<PathBuf>,

    /// Style encoder (mobilenet or inception)
    #[arg(long, value_enum)]
    pub style_model: Option<StyleModel>,

    /// Transformer network (separable or original)
    #[arg(long, value_enum)]
    pub transform_model: Option<TransformModel>,

    /// Style strength in [0, 1]; 1.0 applies the pure style.
    /// With --combine-with this is the weight of the second style.
    #[arg(long)]
    pub style_ratio: Option<f32>,

    /// Scale factor applied to the content image (1.0 keeps it as is)
    #[arg(long)]
    pub content_size: Option<f32>,

    /// Scale factor applied to the style image(s)
    #[arg(long)]
    pub source_size: Option<f32>,

    /// JSON file with run options (camelCase fields); flags override it
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Engine configuration JSON (defaults to ./stylepro.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL or directory the model files are relative to
    #[arg(long)]
    pub model_base: Option<String>,

    /// Directory receiving output.png / output.jpg
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output format (png or jpeg)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Second style image; mixes both styles instead of a single stylization
    #[arg(long)]
    pub combine_with: Option<PathBuf>,

    /// Profile all four models on synthetic input and print a JSON report
    #[arg(long, default_value_t = false)]
    pub benchmark: bool,

    /// Timed runs per model in benchmark mode
    #[arg(long, default_value_t = 10)]
    pub runs: usize,

    /// RNG seed for the benchmark input
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
