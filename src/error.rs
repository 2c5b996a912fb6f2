//! Error types for the edgequake-fileconv library.
//!
//! Two layers of errors reflect two layers of the conversion pipeline:
//!
//! * [`CodecError`] — what a single reader or writer reports. It names the
//!   codec library that failed (image, svg, pdf, zip, xml …) and carries the
//!   library's own error as its source.
//!
//! * [`ConvertError`] — what the façade returns. Every codec failure is
//!   wrapped into [`ConvertError::ReadFailure`] or
//!   [`ConvertError::WriteFailure`] at the handler boundary, so callers match
//!   on four stable variants instead of on a dozen library error types.
//!
//! None of these errors is fatal to the process: the registry stays usable
//! after any failure.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the `convert*` entry points.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Dispatch errors ───────────────────────────────────────────────────
    /// No reader is registered for the input file's extension.
    #[error("Unsupported input format '{extension}' for '{path}'")]
    UnsupportedInputFormat { path: PathBuf, extension: String },

    /// No writer is registered for the requested target, or the writer
    /// cannot encode what the reader produced (e.g. SVG into BMP).
    #[error("Cannot convert '{path}' to '{format}': no writer for this target")]
    UnsupportedOutputFormat { path: PathBuf, format: String },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// The reader failed: missing file, corrupt content, bad encoding.
    #[error("Failed to read '{path}': {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The writer failed: permission denied, disk full, encoder error.
    #[error("Failed to write '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// True for the two dispatch errors, which are detected before any
    /// output file could have been touched.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedInputFormat { .. }
                | ConvertError::UnsupportedOutputFormat { .. }
        )
    }
}

/// Failure reported by an individual reader or writer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),

    #[error("SVG parser: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("zip container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("HTML: {0}")]
    Html(#[from] lol_html::errors::RewritingError),

    #[error("text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// The container opened fine but the content does not follow the format.
    #[error("malformed {format} content: {detail}")]
    Malformed { format: &'static str, detail: String },

    /// An external tool (pandoc) failed or could not be started.
    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },

    /// The writer was handed a representation it cannot encode.
    #[error("{0}")]
    Unsupported(String),
}

impl CodecError {
    pub(crate) fn malformed(format: &'static str, detail: impl Into<String>) -> Self {
        CodecError::Malformed {
            format,
            detail: detail.into(),
        }
    }
}
