//! Convert command - render a PDF to images.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use pdfcheck_core::{ColorModel, ExportOptions, OutputFormat, convert_from_pdf};

use super::config::load_config;

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (an image, or a zip with --multi)
    #[arg(short, long)]
    output: PathBuf,

    /// Output format: png, jpg or tiff
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Color model: rgb, greyscale or binary
    #[arg(long)]
    color: Option<ColorModel>,

    /// Rendering resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// Write one image per page into a zip instead of a single image
    #[arg(long, conflicts_with = "single")]
    multi: bool,

    /// Write a single image even if the config asks for a zip
    #[arg(long)]
    single: bool,

    /// Prefix of zip entry names
    #[arg(long)]
    base_name: Option<String>,

    /// Render pages one at a time
    #[arg(long)]
    sequential: bool,
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let loaded = load_config(config_path)?;
    let options = apply_args(loaded.config.export, &args);
    options.validate()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    info!("Converting {} at {} dpi", args.input.display(), options.dpi);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Rendering pages...");

    // Rendering is CPU-bound, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || convert_from_pdf(&data, &options)).await?;
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    pb.finish_with_message("Done");

    fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} Output written to {} ({} bytes)",
        style("✓").green(),
        args.output.display(),
        output.len()
    );

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Command-line flags take precedence over the config file.
fn apply_args(mut options: ExportOptions, args: &ConvertArgs) -> ExportOptions {
    if let Some(format) = args.format {
        options = options.with_format(format);
    }
    if let Some(color) = args.color {
        options = options.with_color_model(color);
    }
    if let Some(dpi) = args.dpi {
        options = options.with_dpi(dpi);
    }
    if let Some(base_name) = &args.base_name {
        options = options.with_base_name(base_name.clone());
    }
    if args.multi {
        options = options.with_single_image(false);
    }
    if args.single {
        options = options.with_single_image(true);
    }
    if args.sequential {
        options = options.with_parallel(false);
    }
    options
}
