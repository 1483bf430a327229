//! Query commands - answer yes/no questions about a document.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use pdfcheck_core::pdf::{self, has_images_in, has_page_size, has_text_in};
use pdfcheck_core::{Comparator, PageRect, PageSelector, PaperSize};

use super::{load_document, print_bool};

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Input PDF
    input: PathBuf,
}

/// Arguments for the images command.
#[derive(Args)]
pub struct ImagesArgs {
    /// Input PDF
    input: PathBuf,

    /// Pages to check: "all", "4" or "1-2,3"
    #[arg(short, long, default_value = "all")]
    pages: PageSelector,
}

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Input PDF
    input: PathBuf,

    /// Text to look for (case-sensitive)
    needle: String,

    /// Pages to check: "all", "4" or "1-2,3"
    #[arg(short, long, default_value = "all")]
    pages: PageSelector,
}

/// Arguments for the page-count command.
#[derive(Args)]
pub struct PageCountArgs {
    /// Input PDF
    input: PathBuf,

    /// Page count to compare against
    threshold: usize,

    /// greater, less or equal
    comparator: Comparator,
}

/// Arguments for the page-size command.
#[derive(Args)]
pub struct PageSizeArgs {
    /// Input PDF
    input: PathBuf,

    /// Exact size in points ("612x792") or a paper name (A0-A6, LETTER, LEGAL)
    size: String,
}

#[derive(Serialize)]
struct DocumentInfo {
    pages: usize,
    page_sizes: Vec<PageInfo>,
}

#[derive(Serialize)]
struct PageInfo {
    page: usize,
    width: f32,
    height: f32,
    rotation: u32,
    media_box: PageRect,
}

pub async fn info(args: InfoArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.input)?;

    let info = DocumentInfo {
        pages: doc.page_count(),
        page_sizes: doc
            .pages()
            .map(|page| {
                let media_box = page.media_box();
                PageInfo {
                    page: page.number(),
                    width: media_box.width(),
                    height: media_box.height(),
                    rotation: page.rotation(),
                    media_box,
                }
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

pub async fn images(args: ImagesArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.input)?;
    info!("Checking pages {} for images", args.pages);

    print_bool(has_images_in(&doc, &args.pages)?);
    Ok(())
}

pub async fn text(args: TextArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.input)?;
    info!("Checking pages {} for {:?}", args.pages, args.needle);

    print_bool(has_text_in(&doc, &args.pages, &args.needle)?);
    Ok(())
}

pub async fn page_count(args: PageCountArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.input)?;

    print_bool(pdf::page_count(&doc, args.threshold, args.comparator));
    Ok(())
}

pub async fn page_size(args: PageSizeArgs) -> anyhow::Result<()> {
    let doc = load_document(&args.input)?;

    let matches = match args.size.parse::<PaperSize>() {
        Ok(paper) => {
            let rect = paper.rect();
            has_page_size(&doc, rect.width(), rect.height())?
        }
        Err(_) => pdf::page_size(&doc, &args.size)?,
    };

    print_bool(matches);
    Ok(())
}
