//! Page geometry: paper sizes and exact dimension checks.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use lopdf::Object;
use regex::Regex;
use serde::Serialize;

use super::document::PdfDocument;
use crate::error::{ContentError, Result, UsageError};

/// Points per millimetre (1 pt = 1/72 inch).
const POINTS_PER_MM: f32 = 72.0 / 25.4;

lazy_static! {
    /// Dimension string: `612x792`
    static ref DIMENSIONS: Regex = Regex::new(r"^(\d+)x(\d+)$").unwrap();
}

/// A rectangle in PDF user space, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRect {
    /// Lower-left x.
    pub llx: f32,
    /// Lower-left y.
    pub lly: f32,
    /// Upper-right x.
    pub urx: f32,
    /// Upper-right y.
    pub ury: f32,
}

impl PageRect {
    /// US Letter, the fallback for pages without a MediaBox.
    pub const LETTER: PageRect = PageRect::new(612.0, 792.0);

    /// A rectangle of the given size anchored at the origin.
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            llx: 0.0,
            lly: 0.0,
            urx: width,
            ury: height,
        }
    }

    /// Width in points.
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    /// Height in points.
    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Exact size comparison. Orientation matters.
    pub fn has_size(&self, width: f32, height: f32) -> bool {
        self.width() == width && self.height() == height
    }

    /// Read a `[llx lly urx ury]` array, normalizing swapped corners.
    pub(crate) fn from_object(doc: &PdfDocument, object: &Object) -> Option<Self> {
        let Object::Array(values) = doc.resolve(object)? else {
            return None;
        };
        if values.len() != 4 {
            return None;
        }

        let mut coords = [0.0f32; 4];
        for (slot, value) in coords.iter_mut().zip(values) {
            *slot = super::number(doc.resolve(value)?)?;
        }

        Some(Self {
            llx: coords[0].min(coords[2]),
            lly: coords[1].min(coords[3]),
            urx: coords[0].max(coords[2]),
            ury: coords[1].max(coords[3]),
        })
    }
}

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    Letter,
    Legal,
}

impl PaperSize {
    /// All supported sizes.
    pub const ALL: [PaperSize; 9] = [
        PaperSize::A0,
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
        PaperSize::A6,
        PaperSize::Letter,
        PaperSize::Legal,
    ];

    /// The token naming this size.
    pub fn name(&self) -> &'static str {
        match self {
            PaperSize::A0 => "A0",
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::A6 => "A6",
            PaperSize::Letter => "LETTER",
            PaperSize::Legal => "LEGAL",
        }
    }

    /// Portrait dimensions in points.
    pub fn rect(&self) -> PageRect {
        let (width_mm, height_mm) = match self {
            PaperSize::A0 => (841.0, 1189.0),
            PaperSize::A1 => (594.0, 841.0),
            PaperSize::A2 => (420.0, 594.0),
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::A6 => (105.0, 148.0),
            PaperSize::Letter => return PageRect::new(612.0, 792.0),
            PaperSize::Legal => return PageRect::new(612.0, 1008.0),
        };
        PageRect::new(width_mm * POINTS_PER_MM, height_mm * POINTS_PER_MM)
    }
}

impl FromStr for PaperSize {
    type Err = UsageError;

    /// Tokens are case-sensitive and never trimmed.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PaperSize::ALL
            .into_iter()
            .find(|size| size.name() == s)
            .ok_or_else(|| UsageError::UnknownPaperSize(s.to_string()))
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a paper size token to its dimensions.
pub fn text_to_page_size(name: &str) -> std::result::Result<PageRect, UsageError> {
    name.parse::<PaperSize>().map(|size| size.rect())
}

/// Parse a `WxH` dimension string.
pub fn parse_dimensions(dimensions: &str) -> std::result::Result<(u32, u32), UsageError> {
    let invalid = || UsageError::InvalidDimensions(dimensions.to_string());

    let caps = DIMENSIONS.captures(dimensions).ok_or_else(invalid)?;
    let width = caps[1].parse().map_err(|_| invalid())?;
    let height = caps[2].parse().map_err(|_| invalid())?;
    Ok((width, height))
}

/// Check whether the first page's MediaBox is exactly `width` x `height`.
pub fn has_page_size(
    doc: &PdfDocument,
    width: f32,
    height: f32,
) -> std::result::Result<bool, ContentError> {
    let media_box = doc.first_page()?.media_box();
    Ok(media_box.has_size(width, height))
}

/// Check the first page against a `WxH` dimension string.
pub fn page_size(doc: &PdfDocument, dimensions: &str) -> Result<bool> {
    let (width, height) = parse_dimensions(dimensions)?;
    Ok(has_page_size(doc, width as f32, height as f32)?)
}
