//! Parsed document and page views backed by lopdf.

use std::collections::{BTreeMap, HashSet};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::{debug, trace};

use super::geometry::PageRect;
use super::resources::Resources;
use crate::error::ContentError;

/// Longest chain of indirect references followed before giving up.
const MAX_REFERENCE_CHAIN: usize = 32;

/// Deepest page tree walked when looking up inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// A parsed PDF document.
///
/// The document is read-only once loaded; every query borrows it immutably,
/// so one instance can serve concurrent readers.
#[derive(Debug)]
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    pub fn load_mem(data: &[u8]) -> Result<Self, ContentError> {
        let mut doc = Document::load_mem(data).map_err(|e| ContentError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(ContentError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let document = Self::from_lopdf(doc);
        debug!("Loaded PDF with {} pages", document.page_count());
        Ok(document)
    }

    /// Wrap an already parsed lopdf document.
    pub fn from_lopdf(inner: Document) -> Self {
        let page_ids = inner.get_pages().into_values().collect();
        Self { inner, page_ids }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Get a page by 0-based index.
    pub fn page(&self, index: usize) -> Result<Page<'_>, ContentError> {
        let id = *self
            .page_ids
            .get(index)
            .ok_or(ContentError::PageOutOfRange {
                page: index + 1,
                count: self.page_count(),
            })?;

        Ok(Page {
            doc: self,
            index,
            id,
        })
    }

    /// Get the first page, failing on a document without pages.
    pub fn first_page(&self) -> Result<Page<'_>, ContentError> {
        if self.page_ids.is_empty() {
            return Err(ContentError::NoPages);
        }
        self.page(0)
    }

    /// Iterate over all pages in order.
    pub fn pages(&self) -> impl Iterator<Item = Page<'_>> + '_ {
        self.page_ids
            .iter()
            .enumerate()
            .map(move |(index, &id)| Page {
                doc: self,
                index,
                id,
            })
    }

    /// The underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Follow indirect references until a direct object is reached.
    pub(crate) fn resolve<'a>(&'a self, mut object: &'a Object) -> Option<&'a Object> {
        for _ in 0..MAX_REFERENCE_CHAIN {
            match object {
                Object::Reference(id) => object = self.inner.get_object(*id).ok()?,
                direct => return Some(direct),
            }
        }
        trace!("Reference chain too long, giving up");
        None
    }

    /// Resolve an object that should be a dictionary.
    pub(crate) fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(object)? {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Resolve an object that should be a name.
    pub(crate) fn resolve_name<'a>(&'a self, object: &'a Object) -> Option<&'a [u8]> {
        match self.resolve(object)? {
            Object::Name(name) => Some(name.as_slice()),
            _ => None,
        }
    }
}

/// A view of one page inside a [`PdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    doc: &'a PdfDocument,
    index: usize,
    id: ObjectId,
}

impl<'a> Page<'a> {
    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Object id of the page dictionary.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The owning document.
    pub fn document(&self) -> &'a PdfDocument {
        self.doc
    }

    /// The page dictionary.
    pub fn dictionary(&self) -> Option<&'a Dictionary> {
        self.doc.inner.get_dictionary(self.id).ok()
    }

    /// Look up a page attribute, walking `/Parent` for inheritable keys.
    fn inherited(&self, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.dictionary()?;
        let mut seen = HashSet::from([self.id]);

        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }

            let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
            if !seen.insert(parent_id) {
                return None;
            }
            dict = self.doc.inner.get_dictionary(parent_id).ok()?;
        }
        None
    }

    /// The page's MediaBox. Pages without one are treated as US Letter.
    pub fn media_box(&self) -> PageRect {
        self.inherited(b"MediaBox")
            .and_then(|obj| PageRect::from_object(self.doc, obj))
            .unwrap_or(PageRect::LETTER)
    }

    /// The visible region of the page, falling back to the MediaBox.
    pub fn crop_box(&self) -> PageRect {
        self.inherited(b"CropBox")
            .and_then(|obj| PageRect::from_object(self.doc, obj))
            .unwrap_or_else(|| self.media_box())
    }

    /// Clockwise display rotation in degrees (0, 90, 180 or 270).
    pub fn rotation(&self) -> u32 {
        let degrees = self
            .inherited(b"Rotate")
            .and_then(|obj| self.doc.resolve(obj))
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);

        match degrees.rem_euclid(360) {
            90 => 90,
            180 => 180,
            270 => 270,
            _ => 0,
        }
    }

    /// The page's resource dictionary. Absent resources yield an empty view.
    pub fn resources(&self) -> Resources<'a> {
        let dict = self
            .inherited(b"Resources")
            .and_then(|obj| self.doc.resolve_dict(obj));
        Resources::new(self.doc, dict)
    }

    /// Decode the page content stream(s) into operations.
    pub fn content(&self) -> Result<Vec<Operation>, ContentError> {
        let data = self
            .doc
            .inner
            .get_page_content(self.id)
            .map_err(|e| ContentError::ContentStream(e.to_string()))?;

        let content =
            Content::decode(&data).map_err(|e| ContentError::ContentStream(e.to_string()))?;
        Ok(content.operations)
    }

    /// Extract the page's text.
    ///
    /// Strings shown with `Tj`, `TJ`, `'` and `"` are decoded with the
    /// encoding of the current font. Each text object ends with a newline.
    pub fn text(&self) -> Result<String, ContentError> {
        let inner = &self.doc.inner;
        let fonts = inner
            .get_page_fonts(self.id)
            .map_err(|e| ContentError::TextExtraction(e.to_string()))?;
        let encodings: BTreeMap<Vec<u8>, Encoding<'_>> = fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(inner) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    debug!("Font {} has no usable encoding: {}", String::from_utf8_lossy(&name), e);
                    None
                }
            })
            .collect();

        let mut text = String::new();
        let mut encoding = None;
        for op in self.content()? {
            match op.operator.as_str() {
                "Tf" => {
                    encoding = op
                        .operands
                        .first()
                        .and_then(|font| font.as_name().ok())
                        .and_then(|font| encodings.get(font));
                }
                "Tj" | "TJ" | "'" | "\"" => match encoding {
                    Some(encoding) => push_shown_text(&mut text, encoding, &op.operands)?,
                    None => trace!("Text shown without a known font on page {}", self.number()),
                },
                "ET" if !text.ends_with('\n') => text.push('\n'),
                _ => {}
            }
        }

        trace!("Extracted {} chars from page {}", text.len(), self.number());
        Ok(text)
    }
}

/// Append the strings among text-showing operands. Large negative kerning
/// inside a `TJ` array counts as a word gap.
fn push_shown_text(
    text: &mut String,
    encoding: &Encoding<'_>,
    operands: &[Object],
) -> Result<(), ContentError> {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => {
                let decoded = Document::decode_text(encoding, bytes)
                    .map_err(|e| ContentError::TextExtraction(e.to_string()))?;
                text.push_str(&decoded);
            }
            Object::Array(items) => {
                push_shown_text(text, encoding, items)?;
                text.push(' ');
            }
            Object::Integer(gap) if *gap < -100 => text.push(' '),
            Object::Real(gap) if *gap < -100.0 => text.push(' '),
            _ => {}
        }
    }
    Ok(())
}
