//! Configuration structures for inspection and export.

use serde::{Deserialize, Serialize};

use crate::error::UsageError;
use crate::render::{ColorModel, OutputFormat};

/// Main configuration for pdfcheck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfCheckConfig {
    /// Image export configuration.
    pub export: ExportOptions,
}

/// Options for converting a PDF into raster images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Encoder used for every produced image.
    pub format: OutputFormat,

    /// Pixel model of the rendered pages.
    pub color_model: ColorModel,

    /// Combine all pages into one image instead of a zip of per-page images.
    pub single_image: bool,

    /// Rendering resolution in dots per inch.
    pub dpi: u32,

    /// Prefix for zip entry names (`{base_name}_page_{n}.{ext}`).
    pub base_name: String,

    /// JPEG quality (1 - 100).
    pub jpeg_quality: u8,

    /// Render pages on the rayon thread pool.
    pub parallel: bool,

    /// Maximum nesting of Form XObjects followed while rendering.
    pub max_form_depth: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            color_model: ColorModel::Rgb,
            single_image: true,
            dpi: 300,
            base_name: "img".to_string(),
            jpeg_quality: 90,
            parallel: true,
            max_form_depth: 32,
        }
    }
}

impl ExportOptions {
    /// Create export options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the color model.
    pub fn with_color_model(mut self, color_model: ColorModel) -> Self {
        self.color_model = color_model;
        self
    }

    /// Set whether all pages end up in a single image.
    pub fn with_single_image(mut self, single_image: bool) -> Self {
        self.single_image = single_image;
        self
    }

    /// Set the rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the zip entry prefix.
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set whether pages render in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check the options that the type system cannot.
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.dpi == 0 {
            return Err(UsageError::InvalidDpi(self.dpi));
        }
        Ok(())
    }
}

impl PdfCheckConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PdfCheckConfig =
            serde_json::from_str(r#"{ "export": { "dpi": 150, "format": "tiff" } }"#).unwrap();

        assert_eq!(config.export.dpi, 150);
        assert_eq!(config.export.format, OutputFormat::Tiff);
        assert_eq!(config.export.color_model, ColorModel::Rgb);
        assert_eq!(config.export.base_name, "img");
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let options = ExportOptions::new().with_dpi(0);
        assert_eq!(options.validate(), Err(UsageError::InvalidDpi(0)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PdfCheckConfig::default();
        config.export = config.export.with_color_model(ColorModel::Binary);
        config.save(&path).unwrap();

        let loaded = PdfCheckConfig::from_file(&path).unwrap();
        assert_eq!(loaded.export, config.export);
    }
}
