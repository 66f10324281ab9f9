//! Inpainting Example
//!
//! This example demonstrates how to fill a masked region of an image with one or more
//! inpainting models, either trying them one after another or racing them in parallel.
//!
//! # Usage
//! ```bash
//! cargo run --example inpaint -- \
//!   --image photo.jpg \
//!   --mask mask.png \
//!   --output result.png \
//!   models/lama_fp32.onnx [models/lama_int8.onnx ...]
//! ```
//!
//! # Arguments
//! * `--image` - Encoded input image
//! * `--mask` - Encoded mask; white marks the region to fill
//! * `--output` - Where to write the result; the extension picks PNG or JPEG
//! * `--parallel` - Run all models at once and keep the first usable result
//! * `--config` - Optional JSON runner configuration
//! * `--format` - Force `png` or `jpeg` output
//! * `models` - ONNX model files, in priority order

use clap::Parser;
use oar_inpaint::core::{CodecConfig, OutputFormat, RunnerConfig};
use oar_inpaint::pipeline::InpaintRunner;
use oar_inpaint::utils::{
    init_tracing, load_image, output_format_for_path, read_image_bytes, write_image_bytes,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// Command-line arguments for the inpainting example
#[derive(Parser)]
#[command(name = "inpaint")]
#[command(about = "Inpainting Example - fills masked regions of an image")]
struct Args {
    /// ONNX model files, tried in this order
    models: Vec<PathBuf>,

    /// Input image
    #[arg(short, long)]
    image: PathBuf,

    /// Mask image
    #[arg(short, long)]
    mask: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "inpainted.png")]
    output: PathBuf,

    /// Run every model concurrently
    #[arg(short, long)]
    parallel: bool,

    /// JSON runner configuration; its model list is used when no models are given
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (png or jpeg); defaults to the output file extension
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Number of CPU cores each session may use
    #[arg(long)]
    cores: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RunnerConfig::from_json_file(path)?,
        None => RunnerConfig::default(),
    };
    if !args.models.is_empty() {
        config.model_paths = args.models.clone();
    }
    if config.model_paths.is_empty() {
        error!("No models given. Pass model paths or a config file with model_paths.");
        return Err("no models".into());
    }
    if let Some(cores) = args.cores {
        config.execution = config.execution.with_num_cpu_cores(cores);
    }

    let format = args
        .format
        .or_else(|| output_format_for_path(&args.output))
        .unwrap_or(config.codec.output_format);
    config.codec = CodecConfig {
        output_format: format,
        ..config.codec
    };

    info!("Loading {} model(s)", config.model_paths.len());
    let runner = InpaintRunner::new(config)?;
    for session in runner.sessions() {
        info!(
            "  {} expects {} input",
            session.model_name(),
            session.target_size()
        );
    }

    let source = load_image(&args.image)?;
    info!("Input image: {}x{}", source.width(), source.height());
    let image_bytes = read_image_bytes(&args.image)?;
    let mask_bytes = read_image_bytes(&args.mask)?;

    let start = Instant::now();
    let output = if args.parallel {
        let report = runner.dispatch(&image_bytes, &mask_bytes)?;
        info!("{}", report);
        report.resolve()?
    } else {
        runner.infer_from_bytes(&image_bytes, &mask_bytes)?
    };
    info!(
        "Inpainting finished in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    write_image_bytes(&args.output, &output)?;
    info!(
        "{} result saved to: {}",
        format.as_str(),
        args.output.display()
    );

    Ok(())
}
