//! In-memory fixture PDFs shared by the integration tests.
//!
//! Every helper builds a fresh document, so tests never share state.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pdfcheck_core::PdfDocument;

/// Solid blue, the color of the embedded test image.
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Draws `/Im1` as a 100pt square near the top left of a Letter page.
pub const DRAW_IMAGE: &str = "q 100 0 0 100 72 600 cm /Im1 Do Q";

/// Incrementally assembles a small PDF.
pub struct FixtureBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// A Helvetica font with a one-byte encoding.
    pub fn font(&mut self) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        })
    }

    /// An uncompressed 8-bit DeviceRGB image filled with `rgb`.
    pub fn image(&mut self, width: i64, height: i64, rgb: [u8; 3]) -> ObjectId {
        let pixels = (width * height) as usize;
        let data: Vec<u8> = rgb.iter().copied().cycle().take(pixels * 3).collect();
        self.raw_image(width, height, data)
    }

    /// A DeviceRGB image whose sample data need not match its declared size.
    pub fn raw_image(&mut self, width: i64, height: i64, data: Vec<u8>) -> ObjectId {
        self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width),
                "Height" => Object::Integer(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            data,
        ))
    }

    /// A Form XObject with a unit bounding box scaled to 100pt.
    pub fn form(&mut self, content: &str, resources: Option<Dictionary>) -> ObjectId {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => rect(100, 100),
        };
        if let Some(resources) = resources {
            dict.set("Resources", resources);
        }
        self.doc
            .add_object(Stream::new(dict, content.as_bytes().to_vec()))
    }

    /// Reserve an id to be filled in later, for self-referencing objects.
    pub fn reserve(&mut self) -> ObjectId {
        self.doc.new_object_id()
    }

    /// Store `object` under a reserved id.
    pub fn set(&mut self, id: ObjectId, object: impl Into<Object>) {
        self.doc.objects.insert(id, object.into());
    }

    /// Append a page. `resources` of `None` omits the key entirely.
    pub fn page(
        &mut self,
        size: (i64, i64),
        content: &str,
        resources: Option<Dictionary>,
    ) -> &mut Self {
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(self.pages_id),
            "MediaBox" => rect(size.0, size.1),
            "Contents" => Object::Reference(content_id),
        };
        if let Some(resources) = resources {
            page.set("Resources", resources);
        }

        let page_id = self.doc.add_object(page);
        self.kids.push(Object::Reference(page_id));
        self
    }

    /// Serialize the document.
    pub fn build(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => Object::Integer(count),
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(self.pages_id),
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).unwrap();
        buf
    }
}

pub fn rect(width: i64, height: i64) -> Vec<Object> {
    vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ]
}

/// Content stream showing `text` with font F1 at 12pt.
pub fn text_content(text: &str) -> String {
    format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
}

fn font_resources(font: ObjectId) -> Dictionary {
    dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font) },
    }
}

pub fn load(bytes: &[u8]) -> PdfDocument {
    PdfDocument::load_mem(bytes).unwrap()
}

/// One Letter page with the text "This is some text" and no images.
pub fn txt_only() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let font = builder.font();
    builder.page(
        (612, 792),
        &text_content("This is some text"),
        Some(font_resources(font)),
    );
    builder.build()
}

/// One Letter page with a 2x2 blue image and no text.
pub fn img_only() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.image(2, 2, BLUE);
    builder.page(
        (612, 792),
        DRAW_IMAGE,
        Some(dictionary! {
            "XObject" => dictionary! { "Im1" => Object::Reference(image) },
        }),
    );
    builder.build()
}

/// One 612x792 page with text and the blue image.
pub fn txt_and_img() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let font = builder.font();
    let image = builder.image(2, 2, BLUE);
    let content = format!("{}\n{}", text_content("Text and an image"), DRAW_IMAGE);
    builder.page(
        (612, 792),
        &content,
        Some(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font) },
            "XObject" => dictionary! { "Im1" => Object::Reference(image) },
        }),
    );
    builder.build()
}

/// Four Letter pages. Only page 4 contains the word "text".
pub fn multi_page() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let font = builder.font();
    for label in ["Page one", "Page two", "Page three", "Last page has text"] {
        builder.page((612, 792), &text_content(label), Some(font_resources(font)));
    }
    builder.build()
}

/// The image is only reachable through two levels of Form XObjects.
pub fn nested_form() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.image(2, 2, BLUE);
    let inner = builder.form(
        "q 1 0 0 1 0 0 cm /Im1 Do Q",
        Some(dictionary! {
            "XObject" => dictionary! { "Im1" => Object::Reference(image) },
        }),
    );
    let outer = builder.form(
        "/Fm2 Do",
        Some(dictionary! {
            "XObject" => dictionary! { "Fm2" => Object::Reference(inner) },
        }),
    );
    builder.page(
        (612, 792),
        "q 100 0 0 100 72 600 cm /Fm1 Do Q",
        Some(dictionary! {
            "XObject" => dictionary! { "Fm1" => Object::Reference(outer) },
        }),
    );
    builder.build()
}

/// A form that lists itself in its own resources, with an image beside it.
pub fn cyclic_form() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.image(2, 2, BLUE);
    let form = builder.reserve();
    builder.set(
        form,
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => rect(1, 1),
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Self" => Object::Reference(form),
                        "Im1" => Object::Reference(image),
                    },
                },
            },
            b"/Self Do /Im1 Do".to_vec(),
        ),
    );
    builder.page(
        (612, 792),
        "q 100 0 0 100 72 600 cm /Fm1 Do Q",
        Some(dictionary! {
            "XObject" => dictionary! { "Fm1" => Object::Reference(form) },
        }),
    );
    builder.build()
}

/// One page drawing an image that claims u32::MAX x u32::MAX samples.
pub fn oversized_image() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.raw_image(u32::MAX as i64, u32::MAX as i64, vec![0; 12]);
    builder.page(
        (612, 792),
        DRAW_IMAGE,
        Some(dictionary! {
            "XObject" => dictionary! { "Im1" => Object::Reference(image) },
        }),
    );
    builder.build()
}

/// One image object listed under two page names and once more inside a form.
pub fn shared_image() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    let image = builder.image(2, 2, BLUE);
    let form = builder.form(
        "/Im3 Do",
        Some(dictionary! {
            "XObject" => dictionary! { "Im3" => Object::Reference(image) },
        }),
    );
    builder.page(
        (612, 792),
        "/Im1 Do /Im2 Do /Fm1 Do",
        Some(dictionary! {
            "XObject" => dictionary! {
                "Im1" => Object::Reference(image),
                "Im2" => Object::Reference(image),
                "Fm1" => Object::Reference(form),
            },
        }),
    );
    builder.build()
}

/// A page with no /Resources entry at all.
pub fn no_resources() -> Vec<u8> {
    let mut builder = FixtureBuilder::new();
    builder.page((612, 792), "0 0 m 100 100 l S", None);
    builder.build()
}

/// A document whose page tree is empty.
pub fn empty() -> Vec<u8> {
    FixtureBuilder::new().build()
}
