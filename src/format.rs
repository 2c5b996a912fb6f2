//! Closed sets of supported formats, one enum per domain.
//!
//! Handlers are keyed by these tags rather than by raw extension strings, so
//! a `match` over a format is checked for exhaustiveness at compile time and
//! extension aliases (`jpg`/`jpeg`, `htm`/`html`, `tif`/`tiff`) are resolved
//! in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::path::Path;

/// A format tag usable as a registry key.
pub trait FormatTag: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every member of the closed set.
    fn all() -> &'static [Self];

    /// Canonical extension (no leading dot) used when naming output files.
    fn extension(self) -> &'static str;

    /// Resolve an extension (case-insensitive, leading dot optional).
    fn from_extension(ext: &str) -> Option<Self>;

    /// Resolve the format of a path from its extension.
    fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Normalise a user-supplied extension: trim, strip one leading dot, lowercase.
pub fn normalise_extension(ext: &str) -> String {
    let ext = ext.trim();
    ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase()
}

/// Lower-cased extension of `path`, or an empty string when it has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(normalise_extension)
        .unwrap_or_default()
}

/// Which registry a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Document,
    Image,
}

impl Domain {
    /// Route an input path to its domain by extension.
    ///
    /// Image extensions win over document ones; `pdf` is therefore a
    /// document on input (the image domain only writes PDF).
    pub fn of_input(path: &Path) -> Option<Domain> {
        let ext = extension_of(path);
        match ImageFormat::from_extension(&ext) {
            Some(ImageFormat::Pdf) | None => {}
            Some(_) => return Some(Domain::Image),
        }
        DocumentFormat::from_extension(&ext).map(|_| Domain::Document)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Document => f.write_str("document"),
            Domain::Image => f.write_str("image"),
        }
    }
}

// ── Documents ────────────────────────────────────────────────────────────

/// Text document formats. The intermediate representation is plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Txt,
    Docx,
    Pdf,
    Rtf,
    Html,
    Odt,
    /// Word 97–2003. Read-only.
    Doc,
}

impl FormatTag for DocumentFormat {
    fn all() -> &'static [Self] {
        use DocumentFormat::*;
        &[Txt, Docx, Pdf, Rtf, Html, Odt, Doc]
    }

    fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Txt => "txt",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Html => "html",
            DocumentFormat::Odt => "odt",
            DocumentFormat::Doc => "doc",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match normalise_extension(ext).as_str() {
            "txt" => Some(DocumentFormat::Txt),
            "docx" => Some(DocumentFormat::Docx),
            "pdf" => Some(DocumentFormat::Pdf),
            "rtf" => Some(DocumentFormat::Rtf),
            "html" | "htm" => Some(DocumentFormat::Html),
            "odt" => Some(DocumentFormat::Odt),
            "doc" => Some(DocumentFormat::Doc),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

// ── Images ───────────────────────────────────────────────────────────────

/// Image formats. The intermediate representation is a [`crate::Picture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    /// Vector input. Read-only.
    Svg,
    /// Vector output for SVG input. Write-only.
    Pdf,
}

impl ImageFormat {
    /// Whether the target keeps an alpha channel. Drives the RGBA/RGB
    /// normalisation applied before raster encoding.
    pub fn supports_alpha(self) -> bool {
        matches!(self, ImageFormat::Png | ImageFormat::Gif)
    }

    /// The matching `image` crate format for raster members.
    pub fn raster(self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
            ImageFormat::Svg | ImageFormat::Pdf => None,
        }
    }
}

impl FormatTag for ImageFormat {
    fn all() -> &'static [Self] {
        use ImageFormat::*;
        &[Jpeg, Png, Gif, Bmp, Tiff, Svg, Pdf]
    }

    fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match normalise_extension(ext).as_str() {
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "svg" => Some(ImageFormat::Svg),
            "pdf" => Some(ImageFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}
