//! Page rasterization and image export.

mod export;
mod rasterizer;

pub use export::{convert_from_pdf, encode_image, rasterize};
pub use rasterizer::SkiaRenderer;

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UsageError};
use crate::pdf::Page;

/// Pixel model of rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorModel {
    /// 8-bit RGB.
    Rgb,
    /// 8-bit luminance.
    #[serde(alias = "grayscale", alias = "gray")]
    Greyscale,
    /// Black and white, stored as 0/255 luminance.
    Binary,
}

impl ColorModel {
    /// Convert an RGB render into this color model.
    pub fn apply(self, image: RgbImage) -> DynamicImage {
        match self {
            ColorModel::Rgb => DynamicImage::ImageRgb8(image),
            ColorModel::Greyscale => DynamicImage::ImageLuma8(image::imageops::grayscale(&image)),
            ColorModel::Binary => {
                let mut gray = image::imageops::grayscale(&image);
                for pixel in gray.pixels_mut() {
                    pixel.0[0] = if pixel.0[0] < 128 { 0 } else { 255 };
                }
                DynamicImage::ImageLuma8(gray)
            }
        }
    }
}

impl FromStr for ColorModel {
    type Err = UsageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorModel::Rgb),
            "greyscale" | "grayscale" | "gray" | "grey" => Ok(ColorModel::Greyscale),
            "binary" => Ok(ColorModel::Binary),
            _ => Err(UsageError::UnknownColorModel(s.to_string())),
        }
    }
}

/// Encoded output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    #[serde(alias = "tif")]
    Tiff,
}

impl OutputFormat {
    /// File extension used for zip entries.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tiff",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UsageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            _ => Err(UsageError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct RasterizedImage {
    /// 0-based index of the source page.
    pub page_index: usize,
    /// Pixel data in the requested color model.
    pub image: DynamicImage,
}

/// Renders a page to an RGB pixel buffer.
pub trait PageRenderer: Sync {
    /// Render `page` at `dpi`. The buffer is `floor(points * dpi / 72)` pixels
    /// on each side, after applying the page rotation.
    fn render_page(&self, page: &Page<'_>, dpi: u32) -> Result<RgbImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("tif".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert_eq!("tiff".parse::<OutputFormat>().unwrap(), OutputFormat::Tiff);
        assert_eq!(
            "gif".parse::<OutputFormat>(),
            Err(UsageError::UnsupportedFormat("gif".to_string()))
        );
    }

    #[test]
    fn test_color_model_tokens() {
        assert_eq!("RGB".parse::<ColorModel>().unwrap(), ColorModel::Rgb);
        assert_eq!("greyscale".parse::<ColorModel>().unwrap(), ColorModel::Greyscale);
        assert_eq!("Grayscale".parse::<ColorModel>().unwrap(), ColorModel::Greyscale);
        assert!("cmyk".parse::<ColorModel>().is_err());
    }

    #[test]
    fn test_binary_threshold() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, image::Rgb([200, 200, 200]));
        rgb.put_pixel(1, 0, image::Rgb([40, 40, 40]));

        let binary = ColorModel::Binary.apply(rgb).to_luma8();
        assert_eq!(binary.get_pixel(0, 0).0, [255]);
        assert_eq!(binary.get_pixel(1, 0).0, [0]);
    }
}
