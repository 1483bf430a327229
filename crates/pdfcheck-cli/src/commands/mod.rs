//! Subcommand implementations.

pub mod config;
pub mod convert;
pub mod inspect;

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use pdfcheck_core::PdfDocument;

/// Read and parse a PDF file.
pub fn load_document(path: &Path) -> anyhow::Result<PdfDocument> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("Read {} bytes from {}", data.len(), path.display());

    PdfDocument::load_mem(&data).with_context(|| format!("Failed to load {}", path.display()))
}

/// Print a predicate result the way scripts expect it.
pub fn print_bool(value: bool) {
    println!("{}", value);
}
