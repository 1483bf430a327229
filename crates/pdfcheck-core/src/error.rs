//! Error types for the pdfcheck-core library.

use thiserror::Error;

/// Main error type for the pdfcheck library.
#[derive(Error, Debug)]
pub enum PdfCheckError {
    /// The caller passed an invalid argument.
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The document could not be read or lacks the requested content.
    #[error("content error: {0}")]
    Content(#[from] ContentError),

    /// Encoding or packaging of rendered output failed.
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Coarse classification of a [`PdfCheckError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller mistake. Never worth retrying.
    Usage,
    /// Unreadable or out-of-range document content.
    Content,
    /// Output encoding failure.
    Export,
}

impl PdfCheckError {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfCheckError::Usage(_) => ErrorKind::Usage,
            PdfCheckError::Content(_) => ErrorKind::Content,
            PdfCheckError::Export(_) => ErrorKind::Export,
        }
    }
}

/// Errors caused by invalid arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Paper size token is not one of A0..A6, LETTER, LEGAL.
    #[error("unknown paper size: {0}")]
    UnknownPaperSize(String),

    /// Dimension string is not of the form `WxH`.
    #[error("invalid page dimensions: {0:?} (expected WIDTHxHEIGHT)")]
    InvalidDimensions(String),

    /// Comparator token is not greater, less or equal.
    #[error("invalid comparator: {0:?} (expected greater, less or equal)")]
    InvalidComparator(String),

    /// Output image format is not supported.
    #[error("unsupported image format: {0:?}")]
    UnsupportedFormat(String),

    /// Color model token is not recognized.
    #[error("unknown color model: {0:?}")]
    UnknownColorModel(String),

    /// Page selector is malformed.
    #[error("invalid page selector: {0:?}")]
    InvalidSelector(String),

    /// Rendering resolution must be positive.
    #[error("invalid DPI: {0}")]
    InvalidDpi(u32),
}

/// Errors related to the document content.
#[derive(Error, Debug)]
pub enum ContentError {
    /// Failed to parse the PDF bytes.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A 1-based page reference outside the document.
    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// A page content stream could not be decoded.
    #[error("invalid content stream: {0}")]
    ContentStream(String),

    /// An image XObject could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),
}

/// Errors raised while encoding rendered pages.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Image encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// TIFF encoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Zip packaging error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error while writing into the output buffer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page could not be rasterized.
    #[error("render failed: {0}")]
    Render(String),
}

/// Result type for the pdfcheck library.
pub type Result<T> = std::result::Result<T, PdfCheckError>;
