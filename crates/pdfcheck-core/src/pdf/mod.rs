//! PDF document model and queries.

mod document;
mod geometry;
mod inspect;
mod predicates;
mod resources;
mod selector;

pub use document::{Page, PdfDocument};
pub use geometry::{PageRect, PaperSize, has_page_size, page_size, parse_dimensions, text_to_page_size};
pub use inspect::{
    contains_text_in_file, get_all_images, has_images, has_images_in, has_images_on_page,
    has_text, has_text_in, has_text_on_page,
};
pub use predicates::{Comparator, page_count};
pub use resources::{FormXObject, ImageIter, ImageXObject, Resources, XObject};
pub use selector::{PageSelector, PageSpan};

use lopdf::Object;

/// Read a numeric PDF object as `f32`.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Read the numeric operands of a content stream operator.
pub(crate) fn numbers(operands: &[Object]) -> Vec<f32> {
    operands.iter().filter_map(number).collect()
}
