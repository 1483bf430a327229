//! Core library for PDF inspection and rasterization.
//!
//! This crate provides:
//! - A read-only document model over parsed PDFs (pages, resources, content)
//! - Page geometry checks against named paper sizes and exact dimensions
//! - Text and image presence detection with page selectors
//! - Page-count predicates
//! - Page rasterization and export to PNG, JPEG, TIFF or a zip of per-page images
//! - Static asset path classification

pub mod error;
pub mod models;
pub mod pdf;
pub mod render;
pub mod request_uri;

pub use error::{ContentError, ErrorKind, ExportError, PdfCheckError, Result, UsageError};
pub use models::config::{ExportOptions, PdfCheckConfig};
pub use pdf::{
    Comparator, ImageXObject, Page, PageRect, PageSelector, PaperSize, PdfDocument, Resources,
};
pub use render::{convert_from_pdf, ColorModel, OutputFormat, PageRenderer, RasterizedImage, SkiaRenderer};
pub use request_uri::is_static_resource;
