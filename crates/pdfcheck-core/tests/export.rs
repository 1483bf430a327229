//! Rasterization and export of fixture documents.

mod common;

use std::io::{Cursor, Read};

use common::*;
use image::{ColorType, ImageFormat};
use pdfcheck_core::pdf::get_all_images;
use pdfcheck_core::render::rasterize;
use pdfcheck_core::{
    ColorModel, ContentError, ErrorKind, ExportOptions, OutputFormat, PageRenderer, PdfCheckError,
    SkiaRenderer, UsageError, convert_from_pdf,
};
use pretty_assertions::assert_eq;

fn options(format: OutputFormat, dpi: u32) -> ExportOptions {
    ExportOptions::new().with_format(format).with_dpi(dpi)
}

fn is_blue(pixel: &image::Rgb<u8>) -> bool {
    let [r, g, b] = pixel.0;
    r < 50 && g < 50 && b > 200
}

#[test]
fn test_invalid_pdf_is_content_error() {
    let png = {
        let image = image::RgbImage::from_pixel(4, 4, image::Rgb(BLUE));
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    };

    let err = convert_from_pdf(&png, &ExportOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Content);
}

#[test]
fn test_empty_document_has_no_pages() {
    let err = convert_from_pdf(&empty(), &ExportOptions::new()).unwrap_err();
    assert!(matches!(err, PdfCheckError::Content(ContentError::NoPages)));
}

#[test]
fn test_zero_dpi_is_usage_error() {
    let err = convert_from_pdf(&txt_only(), &options(OutputFormat::Png, 0)).unwrap_err();
    assert!(matches!(err, PdfCheckError::Usage(UsageError::InvalidDpi(0))));
}

#[test]
fn test_single_page_png_dimensions() {
    let bytes = convert_from_pdf(&txt_and_img(), &options(OutputFormat::Png, 150)).unwrap();
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
    // 612x792 points at 150 dpi
    assert_eq!((image.width(), image.height()), (1275, 1650));
}

#[test]
fn test_multi_page_png_is_stacked() {
    let bytes = convert_from_pdf(&multi_page(), &options(OutputFormat::Png, 36)).unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (306, 4 * 396));
}

#[test]
fn test_multi_page_jpg_zip() {
    let opts = options(OutputFormat::Jpeg, 36)
        .with_single_image(false)
        .with_base_name("scan");
    let bytes = convert_from_pdf(&multi_page(), &opts).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 4);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        assert_eq!(entry.name(), format!("scan_page_{}.jpg", i + 1));

        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        let page = image::load_from_memory_with_format(&data, ImageFormat::Jpeg).unwrap();
        assert_eq!((page.width(), page.height()), (306, 396));
    }
}

#[test]
fn test_single_page_zip_has_one_entry() {
    let opts = options(OutputFormat::Png, 36).with_single_image(false);
    let bytes = convert_from_pdf(&img_only(), &opts).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["img_page_1.png"]);
}

#[test]
fn test_tiff_single_image_is_multi_frame() {
    let bytes = convert_from_pdf(&multi_page(), &options(OutputFormat::Tiff, 36)).unwrap();

    let mut decoder = tiff::decoder::Decoder::new(Cursor::new(bytes)).unwrap();
    let mut frames = 1;
    assert_eq!(decoder.dimensions().unwrap(), (306, 396));
    while decoder.more_images() {
        decoder.next_image().unwrap();
        frames += 1;
    }
    assert_eq!(frames, 4);
}

#[test]
fn test_tiff_single_page() {
    let bytes = convert_from_pdf(&img_only(), &options(OutputFormat::Tiff, 36)).unwrap();
    let image = image::load_from_memory_with_format(&bytes, ImageFormat::Tiff).unwrap();
    assert_eq!((image.width(), image.height()), (306, 396));
}

#[test]
fn test_greyscale_output() {
    let opts = options(OutputFormat::Png, 36).with_color_model(ColorModel::Greyscale);
    let bytes = convert_from_pdf(&txt_and_img(), &opts).unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!(image.color(), ColorType::L8);
}

#[test]
fn test_binary_output_is_black_and_white() {
    let opts = options(OutputFormat::Png, 72).with_color_model(ColorModel::Binary);
    let bytes = convert_from_pdf(&txt_and_img(), &opts).unwrap();
    let image = image::load_from_memory(&bytes).unwrap().to_luma8();
    assert!(image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    assert!(image.pixels().any(|p| p.0[0] == 0));
}

#[test]
fn test_image_is_drawn_through_ctm() {
    let doc = load(&img_only());
    let page = SkiaRenderer::new().render_page(&doc.page(0).unwrap(), 72).unwrap();

    // The image covers x 72..172, y 600..700 in PDF space
    assert!(is_blue(page.get_pixel(122, 142)));
    assert_eq!(page.get_pixel(10, 10).0, [255, 255, 255]);
    assert_eq!(page.get_pixel(122, 300).0, [255, 255, 255]);
}

#[test]
fn test_text_is_drawn() {
    let doc = load(&txt_only());
    let page = SkiaRenderer::new().render_page(&doc.page(0).unwrap(), 72).unwrap();

    // Baseline at y=720, 12pt text starting at x=72
    let pixel = page.get_pixel(80, 69).0;
    assert!(pixel.iter().all(|&c| c < 128), "got {pixel:?}");
}

#[test]
fn test_nested_forms_are_rendered() {
    let doc = load(&nested_form());
    let page = SkiaRenderer::new().render_page(&doc.page(0).unwrap(), 72).unwrap();
    assert!(is_blue(page.get_pixel(122, 142)));
}

#[test]
fn test_cyclic_form_renders_once() {
    let doc = load(&cyclic_form());
    let page = SkiaRenderer::new().render_page(&doc.page(0).unwrap(), 72).unwrap();
    assert!(is_blue(page.get_pixel(122, 142)));
}

#[test]
fn test_oversized_image_is_skipped() {
    let opts = options(OutputFormat::Png, 18).with_parallel(false);
    let bytes = convert_from_pdf(&oversized_image(), &opts).unwrap();

    let page = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(page.dimensions(), (153, 198));
    // Nothing is drawn where the image would be
    assert!(page.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[test]
fn test_oversized_image_fails_to_decode() {
    let doc = load(&oversized_image());
    let resources = doc.page(0).unwrap().resources();
    let image = get_all_images(&resources).next().unwrap();

    assert_eq!(image.width(), u32::MAX);
    let err = image.decode().unwrap_err();
    assert!(matches!(err, ContentError::ImageDecode(_)));
}

#[test]
fn test_form_depth_limit() {
    let doc = load(&nested_form());
    let renderer = SkiaRenderer::new().with_max_form_depth(1);
    let page = renderer.render_page(&doc.page(0).unwrap(), 72).unwrap();
    // The image sits two forms deep
    assert_eq!(page.get_pixel(122, 142).0, [255, 255, 255]);
}

#[test]
fn test_rasterize_keeps_page_order() {
    let doc = load(&multi_page());
    let opts = options(OutputFormat::Png, 18);

    let parallel = rasterize(&doc, &SkiaRenderer::new(), &opts).unwrap();
    let sequential = rasterize(&doc, &SkiaRenderer::new(), &opts.clone().with_parallel(false)).unwrap();

    let indices: Vec<usize> = parallel.iter().map(|p| p.page_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    for (a, b) in parallel.iter().zip(&sequential) {
        assert_eq!(a.image, b.image);
    }
}
