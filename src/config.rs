//! Configuration types for file conversion.
//!
//! All codec knobs live in [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. The config is read once when a
//! [`crate::Converter`] is constructed; handlers copy the values they need,
//! so changing a config afterwards never affects a running converter.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a [`crate::Converter`].
///
/// # Example
/// ```rust
/// use edgequake_fileconv::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .jpeg_quality(90)
///     .svg_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.jpeg_quality, 90);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// JPEG encoder quality, 1–100. Default: 75.
    pub jpeg_quality: u8,

    /// Scale factor applied when rasterising SVG input. Range: 0.1–10.0. Default: 1.0.
    ///
    /// The raster size is the SVG's intrinsic size multiplied by this factor.
    pub svg_scale: f32,

    /// Load system fonts so `<text>` elements in SVG input render. Default: true.
    pub svg_system_fonts: bool,

    /// Page geometry for generated text PDFs.
    pub pdf_layout: PdfLayout,

    /// Path to a pandoc binary. When set, DOCX/ODT/RTF/HTML output is
    /// produced by pandoc instead of the built-in writers. Default: None.
    pub pandoc_path: Option<PathBuf>,

    /// Number of files converted in parallel by [`crate::convert_batch`] when
    /// the call does not override it. Must be ≥ 1. Default: 4.
    pub concurrency: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            svg_scale: 1.0,
            svg_system_fonts: true,
            pdf_layout: PdfLayout::default(),
            pandoc_path: None,
            concurrency: 4,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn svg_scale(mut self, scale: f32) -> Self {
        self.config.svg_scale = scale;
        self
    }

    pub fn svg_system_fonts(mut self, v: bool) -> Self {
        self.config.svg_system_fonts = v;
        self
    }

    pub fn pdf_layout(mut self, layout: PdfLayout) -> Self {
        self.config.pdf_layout = layout;
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = Some(path.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(ConvertError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if !(0.1..=10.0).contains(&c.svg_scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "SVG scale must be 0.1–10.0, got {}",
                c.svg_scale
            )));
        }
        c.pdf_layout.validate()?;
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── PDF layout ───────────────────────────────────────────────────────────

/// Physical page size for generated PDFs, in PostScript points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 8.5 × 11 in (612 × 792 pt). (default)
    #[default]
    Letter,
    /// 210 × 297 mm (595 × 842 pt).
    A4,
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
        }
    }
}

/// Top-down text layout used by the text-to-PDF writer.
///
/// Lines are drawn from `margin` below the top edge, `line_height` apart;
/// a new page starts once the next baseline would fall below `margin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfLayout {
    pub page_size: PageSize,
    pub margin: f32,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            margin: 40.0,
            font_size: 12.0,
            line_height: 15.0,
        }
    }
}

impl PdfLayout {
    /// How many lines fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let (_, height) = self.page_size.dimensions();
        let usable = height - 2.0 * self.margin;
        ((usable / self.line_height).floor() as usize + 1).max(1)
    }

    fn validate(&self) -> Result<(), ConvertError> {
        let (_, height) = self.page_size.dimensions();
        if self.margin < 0.0 || self.margin * 2.0 >= height {
            return Err(ConvertError::InvalidConfig(format!(
                "PDF margin {} leaves no room on the page",
                self.margin
            )));
        }
        if self.font_size <= 0.0 || self.line_height <= 0.0 {
            return Err(ConvertError::InvalidConfig(
                "PDF font size and line height must be positive".into(),
            ));
        }
        Ok(())
    }
}
