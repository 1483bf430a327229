//! Rasterize whole documents and package the encoded output.

use std::io::{Cursor, Write};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, imageops};
use rayon::prelude::*;
use tiff::encoder::{TiffEncoder, colortype};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::rasterizer::SkiaRenderer;
use super::{ColorModel, OutputFormat, PageRenderer, RasterizedImage};
use crate::error::{ContentError, ExportError, Result};
use crate::models::config::ExportOptions;
use crate::pdf::PdfDocument;

/// Convert PDF bytes into an encoded image or a zip of per-page images.
///
/// With `single_image` set, TIFF output holds one frame per page and PNG/JPEG
/// output stacks the pages vertically. Otherwise every page is encoded on its
/// own and stored in a zip as `{base_name}_page_{n}.{ext}`.
pub fn convert_from_pdf(bytes: &[u8], options: &ExportOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let doc = PdfDocument::load_mem(bytes)?;
    if doc.page_count() == 0 {
        return Err(ContentError::NoPages.into());
    }

    let renderer = SkiaRenderer::new().with_max_form_depth(options.max_form_depth);
    let pages = rasterize(&doc, &renderer, options)?;
    info!(
        "Rendered {} pages at {} dpi as {}",
        pages.len(),
        options.dpi,
        options.format
    );

    let output = if options.single_image {
        encode_single(&pages, options)?
    } else {
        encode_zip(&pages, options)?
    };
    debug!("Export produced {} bytes", output.len());
    Ok(output)
}

/// Render every page of `doc` in page order, converted to the configured
/// color model.
pub fn rasterize<R: PageRenderer>(
    doc: &PdfDocument,
    renderer: &R,
    options: &ExportOptions,
) -> Result<Vec<RasterizedImage>> {
    options.validate()?;

    let render = |page_index: usize| -> Result<RasterizedImage> {
        let page = doc.page(page_index)?;
        let rgb = renderer.render_page(&page, options.dpi)?;
        Ok(RasterizedImage {
            page_index,
            image: options.color_model.apply(rgb),
        })
    };

    // Indexed collection keeps page order regardless of completion order
    if options.parallel {
        (0..doc.page_count()).into_par_iter().map(render).collect()
    } else {
        (0..doc.page_count()).map(render).collect()
    }
}

/// Encode one image as PNG, JPEG or single-frame TIFF.
pub fn encode_image(
    image: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> std::result::Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(Vec::new());
    match format {
        OutputFormat::Png => image.write_to(&mut cursor, ImageFormat::Png)?,
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality.clamp(1, 100));
            image.write_with_encoder(encoder)?;
        }
        OutputFormat::Tiff => return encode_tiff(std::slice::from_ref(image)),
    }
    Ok(cursor.into_inner())
}

fn encode_single(
    pages: &[RasterizedImage],
    options: &ExportOptions,
) -> std::result::Result<Vec<u8>, ExportError> {
    if options.format == OutputFormat::Tiff {
        let frames: Vec<DynamicImage> = pages.iter().map(|p| p.image.clone()).collect();
        return encode_tiff(&frames);
    }

    match pages {
        [page] => encode_image(&page.image, options.format, options.jpeg_quality),
        _ => {
            let stitched = stack_vertically(pages, options.color_model);
            encode_image(&stitched, options.format, options.jpeg_quality)
        }
    }
}

/// Write each image as one frame of a multi-page TIFF.
fn encode_tiff(frames: &[DynamicImage]) -> std::result::Result<Vec<u8>, ExportError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor)?;
        for frame in frames {
            match frame {
                DynamicImage::ImageLuma8(gray) => {
                    encoder.write_image::<colortype::Gray8>(gray.width(), gray.height(), gray.as_raw())?
                }
                other => {
                    let rgb = other.to_rgb8();
                    encoder.write_image::<colortype::RGB8>(rgb.width(), rgb.height(), rgb.as_raw())?
                }
            }
        }
    }
    Ok(cursor.into_inner())
}

/// Stack pages top to bottom on a white canvas as wide as the widest page.
fn stack_vertically(pages: &[RasterizedImage], color_model: ColorModel) -> DynamicImage {
    let width = pages.iter().map(|p| p.image.width()).max().unwrap_or(1);
    let height: u32 = pages.iter().map(|p| p.image.height()).sum();

    let mut offset = 0i64;
    match color_model {
        ColorModel::Rgb => {
            let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
            for page in pages {
                imageops::replace(&mut canvas, &page.image.to_rgb8(), 0, offset);
                offset += page.image.height() as i64;
            }
            DynamicImage::ImageRgb8(canvas)
        }
        ColorModel::Greyscale | ColorModel::Binary => {
            let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
            for page in pages {
                imageops::replace(&mut canvas, &page.image.to_luma8(), 0, offset);
                offset += page.image.height() as i64;
            }
            DynamicImage::ImageLuma8(canvas)
        }
    }
}

fn encode_zip(
    pages: &[RasterizedImage],
    options: &ExportOptions,
) -> std::result::Result<Vec<u8>, ExportError> {
    let encoded: Vec<Vec<u8>> = if options.parallel {
        pages
            .par_iter()
            .map(|p| encode_image(&p.image, options.format, options.jpeg_quality))
            .collect::<std::result::Result<_, _>>()?
    } else {
        pages
            .iter()
            .map(|p| encode_image(&p.image, options.format, options.jpeg_quality))
            .collect::<std::result::Result<_, _>>()?
    };

    // Encoded images are already compressed
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (page, data) in pages.iter().zip(&encoded) {
        let name = entry_name(&options.base_name, page.page_index + 1, options.format);
        debug!("Adding zip entry {} ({} bytes)", name, data.len());
        zip.start_file(name, file_options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Zip entry name for 1-based page `number`.
pub(crate) fn entry_name(base_name: &str, number: usize, format: OutputFormat) -> String {
    format!("{}_page_{}.{}", base_name, number, format.extension())
}
