//! # edgequake-fileconv
//!
//! Convert images and text documents between formats through one façade.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request (input path, target extension, destination)
//!  │
//!  ├─ 1. Route    input extension → document or image registry
//!  ├─ 2. Read     reader for the input format → intermediate representation
//!  ├─ 3. Select   writer for the target format (must accept the IR)
//!  └─ 4. Write    encode into a temp file, rename over <stem>_converted.<ext>
//! ```
//!
//! Documents go through plain text (`String`), so formatting is not
//! preserved. Images go through a [`Picture`]: decoded pixels, or a parsed
//! SVG tree that is rendered only when the target needs pixels.
//!
//! ## Supported formats
//!
//! | Domain   | Read                                  | Write                               |
//! |----------|---------------------------------------|-------------------------------------|
//! | Document | txt, docx, pdf, rtf, html, odt, doc   | txt, docx, pdf, rtf, html, odt      |
//! | Image    | jpeg, png, gif, bmp, tiff, svg        | jpeg, png, gif, bmp, tiff, pdf      |
//!
//! SVG input can only be written as PNG or PDF.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_fileconv::{ConversionConfig, ConversionRequest, Converter};
//!
//! let converter = Converter::new(ConversionConfig::default());
//! let out = converter.convert(&ConversionRequest::new("report.txt", "pdf", "/tmp/out"))?;
//! assert_eq!(out, std::path::Path::new("/tmp/out/report_converted.pdf"));
//! # Ok::<(), edgequake_fileconv::ConvertError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-fileconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod codecs;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod progress;
pub mod registry;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_batch, BatchItem, FileReport};
pub use codecs::Picture;
pub use config::{ConversionConfig, ConversionConfigBuilder, PageSize, PdfLayout};
pub use convert::{convert_async, convert_file, Converter};
pub use error::{CodecError, ConvertError};
pub use format::{DocumentFormat, Domain, FormatTag, ImageFormat};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{ConversionRegistry, Decode, Encode, Handler, Role, Sink};
pub use request::{ConversionRequest, Destination};
