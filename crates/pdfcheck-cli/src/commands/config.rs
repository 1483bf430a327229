//! Config command - inspect and create the export settings file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use pdfcheck_core::{OutputFormat, PdfCheckConfig};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Validate and print the export settings in effect
    Show,

    /// Write a configuration file
    Init(InitArgs),

    /// Show which configuration file is used
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path, defaults to --config or the platform config dir
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,

    /// Default output format to store
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Default rendering resolution to store
    #[arg(long)]
    dpi: Option<u32>,
}

/// Export settings and the file they were read from, if any.
pub struct LoadedConfig {
    pub config: PdfCheckConfig,
    pub source: Option<PathBuf>,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(config_path),
        ConfigCommand::Init(init_args) => init_config(init_args, config_path),
        ConfigCommand::Path => show_path(config_path),
    }
}

/// `pdfcheck/config.json` under the platform config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdfcheck")
        .join("config.json")
}

/// The file `--config` names, else the default location.
fn effective_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the explicit config file, else the default one if it exists.
///
/// An explicit path must exist. A missing default file means built-in
/// defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LoadedConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            if !default_path.exists() {
                return Ok(LoadedConfig {
                    config: PdfCheckConfig::default(),
                    source: None,
                });
            }
            default_path
        }
    };

    debug!("Using config {}", path.display());
    let config = PdfCheckConfig::from_file(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;

    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}

fn show_config(config_path: Option<&str>) -> anyhow::Result<()> {
    let LoadedConfig { config, source } = load_config(config_path)?;

    match &source {
        Some(path) => {
            config
                .export
                .validate()
                .with_context(|| format!("Invalid config {}", path.display()))?;
            eprintln!("{} Loaded {}", style("ℹ").blue(), path.display());
        }
        None => eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        ),
    }

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| effective_path(config_path));

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    let mut config = PdfCheckConfig::default();
    if let Some(format) = args.format {
        config.export = config.export.with_format(format);
    }
    if let Some(dpi) = args.dpi {
        config.export = config.export.with_dpi(dpi);
    }
    config.export.validate()?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn show_path(config_path: Option<&str>) -> anyhow::Result<()> {
    let path = effective_path(config_path);
    let origin = if config_path.is_some() { "--config" } else { "default" };

    println!("Configuration file: {} ({})", path.display(), origin);
    println!("Status: {}", file_status(&path));

    if !path.exists() {
        println!();
        println!("Run 'pdfcheck config init' to create a configuration file.");
    }

    Ok(())
}

fn file_status(path: &Path) -> String {
    if !path.exists() {
        return style("not created").yellow().to_string();
    }

    let valid = PdfCheckConfig::from_file(path)
        .map_err(anyhow::Error::from)
        .and_then(|config| Ok(config.export.validate()?));
    match valid {
        Ok(()) => style("valid").green().to_string(),
        Err(e) => style(format!("invalid ({})", e)).red().to_string(),
    }
}
