//! Text and image presence detection.

use tracing::debug;

use super::document::{Page, PdfDocument};
use super::resources::{ImageIter, Resources};
use super::selector::PageSelector;
use crate::error::{ContentError, Result};

/// True if the page references at least one image, directly or through
/// nested Form XObjects. Pages without resources have no images.
pub fn has_images_on_page(page: &Page<'_>) -> bool {
    page.resources().has_images()
}

/// Check the pages named by `selector` for images.
pub fn has_images(doc: &PdfDocument, selector: &str) -> Result<bool> {
    let selector: PageSelector = selector.parse()?;
    Ok(has_images_in(doc, &selector)?)
}

/// Check the pages named by a parsed selector for images.
pub fn has_images_in(doc: &PdfDocument, selector: &PageSelector) -> std::result::Result<bool, ContentError> {
    for index in selector.resolve(doc.page_count())? {
        if has_images_on_page(&doc.page(index)?) {
            debug!("Found image on page {}", index + 1);
            return Ok(true);
        }
    }
    Ok(false)
}

/// All images reachable from a resource set, in first-encountered order.
pub fn get_all_images<'a>(resources: &Resources<'a>) -> ImageIter<'a> {
    resources.images()
}

/// True if the page text contains `needle` (case-sensitive).
pub fn has_text_on_page(page: &Page<'_>, needle: &str) -> std::result::Result<bool, ContentError> {
    if needle.is_empty() {
        return Ok(true);
    }
    Ok(page.text()?.contains(needle))
}

/// Check the pages named by `selector` for `needle`.
pub fn has_text(doc: &PdfDocument, selector: &str, needle: &str) -> Result<bool> {
    let selector: PageSelector = selector.parse()?;
    Ok(has_text_in(doc, &selector, needle)?)
}

/// Check the pages named by a parsed selector for `needle`.
pub fn has_text_in(
    doc: &PdfDocument,
    selector: &PageSelector,
    needle: &str,
) -> std::result::Result<bool, ContentError> {
    for index in selector.resolve(doc.page_count())? {
        if has_text_on_page(&doc.page(index)?, needle)? {
            debug!("Found {:?} on page {}", needle, index + 1);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Like [`has_text`], but a missing selector means every page.
pub fn contains_text_in_file(
    doc: &PdfDocument,
    needle: &str,
    selector: Option<&str>,
) -> Result<bool> {
    let selector = PageSelector::from_option(selector)?;
    Ok(has_text_in(doc, &selector, needle)?)
}
