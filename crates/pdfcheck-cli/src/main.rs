//! CLI application for PDF inspection and image export.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, convert, inspect};

/// pdfcheck - Query PDF documents and render them to images
#[derive(Parser)]
#[command(name = "pdfcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and page sizes as JSON
    Info(inspect::InfoArgs),

    /// Check whether pages contain images
    Images(inspect::ImagesArgs),

    /// Check whether pages contain a piece of text
    Text(inspect::TextArgs),

    /// Compare the page count with a threshold
    PageCount(inspect::PageCountArgs),

    /// Check the size of the first page
    PageSize(inspect::PageSizeArgs),

    /// Render pages to PNG, JPEG or TIFF
    Convert(convert::ConvertArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Info(args) => inspect::info(args).await,
        Commands::Images(args) => inspect::images(args).await,
        Commands::Text(args) => inspect::text(args).await,
        Commands::PageCount(args) => inspect::page_count(args).await,
        Commands::PageSize(args) => inspect::page_size(args).await,
        Commands::Convert(args) => convert::run(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
