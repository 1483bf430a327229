//! Resource dictionaries and XObject traversal.

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use tracing::trace;

use super::document::PdfDocument;
use crate::error::ContentError;

/// A view of a resource dictionary. May be empty.
#[derive(Debug, Clone, Copy)]
pub struct Resources<'a> {
    doc: &'a PdfDocument,
    dict: Option<&'a Dictionary>,
}

impl<'a> Resources<'a> {
    pub(crate) fn new(doc: &'a PdfDocument, dict: Option<&'a Dictionary>) -> Self {
        Self { doc, dict }
    }

    /// The resource dictionary, if present.
    pub fn dictionary(&self) -> Option<&'a Dictionary> {
        self.dict
    }

    /// True when there is no dictionary or it has no entries.
    pub fn is_empty(&self) -> bool {
        self.dict.is_none_or(|dict| dict.len() == 0)
    }

    /// A named resource category such as `XObject` or `Font`.
    pub fn category(&self, key: &[u8]) -> Option<&'a Dictionary> {
        let value = self.dict?.get(key).ok()?;
        self.doc.resolve_dict(value)
    }

    /// Look up an XObject by name.
    pub fn xobject(&self, name: &[u8]) -> Option<XObject<'a>> {
        let entry = self.category(b"XObject")?.get(name).ok()?;
        XObject::classify(self.doc, entry)
    }

    /// Iterate over every image reachable from these resources.
    ///
    /// Images inside Form XObjects are included, in first-encountered order.
    /// An image listed under two names is yielded twice.
    /// Each call starts a fresh walk.
    pub fn images(&self) -> ImageIter<'a> {
        ImageIter::new(*self)
    }

    /// True if at least one image is reachable.
    pub fn has_images(&self) -> bool {
        self.images().next().is_some()
    }
}

/// An entry of an XObject resource dictionary.
#[derive(Debug, Clone, Copy)]
pub enum XObject<'a> {
    Image(ImageXObject<'a>),
    Form(FormXObject<'a>),
}

impl<'a> XObject<'a> {
    fn classify(doc: &'a PdfDocument, entry: &'a Object) -> Option<Self> {
        let id = entry.as_reference().ok();
        let Object::Stream(stream) = doc.resolve(entry)? else {
            return None;
        };
        let subtype = doc.resolve_name(stream.dict.get(b"Subtype").ok()?)?;

        match subtype {
            b"Image" => Some(XObject::Image(ImageXObject { doc, id, stream })),
            b"Form" => Some(XObject::Form(FormXObject { doc, id, stream })),
            _ => None,
        }
    }
}

/// Lazy depth-first walk over the images of a resource dictionary.
///
/// Uses an explicit stack instead of recursion. Each Form XObject is scanned
/// at most once, so self-referencing forms terminate. Images are yielded once
/// per resource entry that names them.
pub struct ImageIter<'a> {
    doc: &'a PdfDocument,
    stack: Vec<std::vec::IntoIter<&'a Object>>,
    visited: HashSet<ObjectId>,
}

impl<'a> ImageIter<'a> {
    fn new(resources: Resources<'a>) -> Self {
        let mut iter = Self {
            doc: resources.doc,
            stack: Vec::new(),
            visited: HashSet::new(),
        };
        iter.push(&resources);
        iter
    }

    fn push(&mut self, resources: &Resources<'a>) {
        if let Some(xobjects) = resources.category(b"XObject") {
            let entries: Vec<&'a Object> = xobjects.iter().map(|(_, value)| value).collect();
            self.stack.push(entries.into_iter());
        }
    }
}

impl<'a> Iterator for ImageIter<'a> {
    type Item = ImageXObject<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            let Some(entry) = frame.next() else {
                self.stack.pop();
                continue;
            };

            match XObject::classify(self.doc, entry) {
                Some(XObject::Image(image)) => return Some(image),
                Some(XObject::Form(form)) => {
                    if let Some(id) = form.id() {
                        if !self.visited.insert(id) {
                            trace!("Skipping already scanned form {:?}", id);
                            continue;
                        }
                    }
                    if let Some(resources) = form.own_resources() {
                        self.push(&resources);
                    }
                }
                None => {}
            }
        }
        None
    }
}

/// An image XObject.
#[derive(Debug, Clone, Copy)]
pub struct ImageXObject<'a> {
    doc: &'a PdfDocument,
    id: Option<ObjectId>,
    stream: &'a Stream,
}

impl<'a> ImageXObject<'a> {
    /// Object id, when the image is an indirect object.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Width in samples.
    pub fn width(&self) -> u32 {
        self.int(b"Width").unwrap_or(0)
    }

    /// Height in samples.
    pub fn height(&self) -> u32 {
        self.int(b"Height").unwrap_or(0)
    }

    fn int(&self, key: &[u8]) -> Option<u32> {
        let value = self.doc.resolve(self.stream.dict.get(key).ok()?)?;
        u32::try_from(value.as_i64().ok()?).ok()
    }

    /// Name of the first stream filter, if any.
    fn filter(&self) -> Option<&'a [u8]> {
        match self.doc.resolve(self.stream.dict.get(b"Filter").ok()?)? {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| self.doc.resolve_name(o)),
            _ => None,
        }
    }

    /// Number of color components of the image color space.
    fn components(&self) -> Result<usize, ContentError> {
        let color_space = self
            .stream
            .dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| self.doc.resolve(cs));

        let name = match color_space {
            None => return Ok(1),
            Some(Object::Name(name)) => name.as_slice(),
            Some(Object::Array(arr)) => {
                let family = arr.first().and_then(|o| self.doc.resolve_name(o));
                if family == Some(b"ICCBased".as_slice()) {
                    let n = arr
                        .get(1)
                        .and_then(|profile| self.doc.resolve_dict(profile))
                        .and_then(|dict| dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok());
                    return match n {
                        Some(n @ (1 | 3 | 4)) => Ok(n as usize),
                        _ => Err(ContentError::ImageDecode("bad ICC component count".into())),
                    };
                }
                family.unwrap_or_default()
            }
            Some(_) => &[],
        };

        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Ok(1),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(3),
            b"DeviceCMYK" | b"CMYK" => Ok(4),
            other => Err(ContentError::ImageDecode(format!(
                "unsupported color space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Decode the image samples.
    pub fn decode(&self) -> Result<DynamicImage, ContentError> {
        let (width, height) = (self.width(), self.height());
        if width == 0 || height == 0 {
            return Err(ContentError::ImageDecode("image has no extent".into()));
        }
        trace!("Decoding image {:?}: {}x{}", self.id, width, height);

        match self.filter() {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(
                    &self.stream.content,
                    image::ImageFormat::Jpeg,
                )
                .map_err(|e| ContentError::ImageDecode(e.to_string()));
            }
            Some(other @ (b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode")) => {
                return Err(ContentError::ImageDecode(format!(
                    "unsupported filter {}",
                    String::from_utf8_lossy(other)
                )));
            }
            _ => {}
        }

        let data = match self.stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => self.stream.content.clone(),
        };

        let bits = self.int(b"BitsPerComponent").unwrap_or(8);
        let components = self.components()?;
        let (w, h) = (width as usize, height as usize);
        let sample_count = w
            .checked_mul(h)
            .and_then(|pixels| pixels.checked_mul(components))
            .ok_or_else(|| {
                ContentError::ImageDecode(format!("image size {}x{} overflows", width, height))
            })?;

        let image = match (bits, components) {
            (8, 1) => samples(&data, sample_count)
                .and_then(|raw| GrayImage::from_raw(width, height, raw.to_vec()))
                .map(DynamicImage::ImageLuma8),
            (8, 3) => samples(&data, sample_count)
                .and_then(|raw| RgbImage::from_raw(width, height, raw.to_vec()))
                .map(DynamicImage::ImageRgb8),
            (8, 4) => samples(&data, sample_count)
                .and_then(|raw| RgbImage::from_raw(width, height, cmyk_to_rgb(raw)))
                .map(DynamicImage::ImageRgb8),
            (1, 1) => unpack_bits(&data, w, h)
                .and_then(|raw| GrayImage::from_raw(width, height, raw))
                .map(DynamicImage::ImageLuma8),
            _ => None,
        };

        image.ok_or_else(|| {
            ContentError::ImageDecode(format!(
                "cannot decode {}x{} image: {} bits, {} components, {} bytes",
                width,
                height,
                bits,
                components,
                data.len()
            ))
        })
    }
}

fn samples(data: &[u8], expected: usize) -> Option<&[u8]> {
    data.get(..expected)
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u32;
            [px[0], px[1], px[2]].map(|c| ((255 - c as u32) * k / 255) as u8)
        })
        .collect()
}

/// Expand 1-bit samples (rows padded to whole bytes) into 8-bit gray.
fn unpack_bits(data: &[u8], width: usize, height: usize) -> Option<Vec<u8>> {
    let stride = width.div_ceil(8);
    if data.len() < stride.checked_mul(height)? {
        return None;
    }

    let mut out = Vec::with_capacity(width.checked_mul(height)?);
    for row in data.chunks_exact(stride).take(height) {
        for x in 0..width {
            let bit = (row[x / 8] >> (7 - x % 8)) & 1;
            out.push(if bit == 1 { 255 } else { 0 });
        }
    }
    Some(out)
}

/// A Form XObject: a reusable content stream with its own resources.
#[derive(Debug, Clone, Copy)]
pub struct FormXObject<'a> {
    doc: &'a PdfDocument,
    id: Option<ObjectId>,
    stream: &'a Stream,
}

impl<'a> FormXObject<'a> {
    /// Object id, when the form is an indirect object.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// The form's own resources, if it declares any.
    pub fn own_resources(&self) -> Option<Resources<'a>> {
        let dict = self.doc.resolve_dict(self.stream.dict.get(b"Resources").ok()?)?;
        Some(Resources::new(self.doc, Some(dict)))
    }

    /// Form space to user space matrix `[a b c d e f]`.
    pub fn matrix(&self) -> [f32; 6] {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let Some(Object::Array(values)) = self
            .stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|m| self.doc.resolve(m))
        else {
            return identity;
        };

        let numbers: Vec<f32> = values.iter().filter_map(super::number).collect();
        <[f32; 6]>::try_from(numbers).unwrap_or(identity)
    }

    /// Decode the form's content stream.
    pub fn content(&self) -> Result<Vec<Operation>, ContentError> {
        let data = match self.stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => self.stream.content.clone(),
        };
        let content =
            Content::decode(&data).map_err(|e| ContentError::ContentStream(e.to_string()))?;
        Ok(content.operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_bits() {
        // 3 pixels per row, one padded byte per row
        let data = [0b1010_0000, 0b0110_0000];
        assert_eq!(
            unpack_bits(&data, 3, 2).unwrap(),
            vec![255, 0, 255, 0, 255, 255]
        );
        assert!(unpack_bits(&data, 3, 3).is_none());
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }
}
