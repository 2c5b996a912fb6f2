//! The extension-keyed dispatch table and the generic `convert` pipeline.
//!
//! A [`ConversionRegistry`] maps each format tag to at most one reader
//! ([`Decode`]) and at most one writer ([`Encode`]) over a shared
//! intermediate representation `R`. The registry itself is stateless between
//! calls: it is filled once at startup and only read afterwards, so a shared
//! `&ConversionRegistry` can serve concurrent conversions.
//!
//! ## Data Flow
//!
//! ```text
//! input path ──▶ reader ──▶ R ──▶ writer ──▶ temp file ──▶ rename ──▶ output path
//! ```
//!
//! Writers never see the final path. They encode into a temporary file in
//! the destination directory which is persisted over the final path only
//! after the writer returns `Ok`, so a failed write leaves nothing behind.

use crate::error::{CodecError, ConvertError};
use crate::format::{extension_of, FormatTag};
use crate::request::Destination;
use std::collections::HashMap;
use std::fmt;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output sink handed to writers: a seekable byte stream.
///
/// Seeking is required by zip-based containers (DOCX, ODT) and some image
/// encoders (TIFF).
pub trait Sink: Write + Seek {}

impl<T: Write + Seek> Sink for T {}

/// Reads a file into the intermediate representation `R`.
///
/// The file handle must not outlive the call.
pub trait Decode<R>: Send + Sync {
    fn decode(&self, path: &Path) -> Result<R, CodecError>;
}

/// Encodes the intermediate representation `R` into a target format.
pub trait Encode<R>: Send + Sync {
    fn encode(&self, repr: &R, out: &mut dyn Sink) -> Result<(), CodecError>;

    /// Whether this writer can encode `repr` at all. A `false` here is
    /// reported as an unsupported output format, not as a write failure.
    fn accepts(&self, repr: &R) -> bool {
        let _ = repr;
        true
    }
}

impl<R, F> Decode<R> for F
where
    F: Fn(&Path) -> Result<R, CodecError> + Send + Sync,
{
    fn decode(&self, path: &Path) -> Result<R, CodecError> {
        self(path)
    }
}

/// Which side of the table a handler sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Writer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => f.write_str("reader"),
            Role::Writer => f.write_str("writer"),
        }
    }
}

/// A handler tagged with its role, as accepted by [`ConversionRegistry::register`].
pub enum Handler<R> {
    Reader(Box<dyn Decode<R>>),
    Writer(Box<dyn Encode<R>>),
}

impl<R> Handler<R> {
    pub fn reader(decoder: impl Decode<R> + 'static) -> Self {
        Handler::Reader(Box::new(decoder))
    }

    pub fn writer(encoder: impl Encode<R> + 'static) -> Self {
        Handler::Writer(Box::new(encoder))
    }

    pub fn role(&self) -> Role {
        match self {
            Handler::Reader(_) => Role::Reader,
            Handler::Writer(_) => Role::Writer,
        }
    }
}

/// Format-tag → handler table for one intermediate representation.
pub struct ConversionRegistry<F: FormatTag, R> {
    readers: HashMap<F, Box<dyn Decode<R>>>,
    writers: HashMap<F, Box<dyn Encode<R>>>,
}

impl<F: FormatTag, R> Default for ConversionRegistry<F, R> {
    fn default() -> Self {
        Self {
            readers: HashMap::new(),
            writers: HashMap::new(),
        }
    }
}

impl<F: FormatTag, R> fmt::Debug for ConversionRegistry<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("readers", &self.readable_formats())
            .field("writers", &self.writable_formats())
            .finish()
    }
}

impl<F: FormatTag, R> ConversionRegistry<F, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second registration for the same format and
    /// role replaces the first.
    pub fn register(&mut self, format: F, handler: Handler<R>) -> &mut Self {
        let role = handler.role();
        let replaced = match handler {
            Handler::Reader(h) => self.readers.insert(format, h).is_some(),
            Handler::Writer(h) => self.writers.insert(format, h).is_some(),
        };
        if replaced {
            debug!("Replaced {} {} handler", format, role);
        } else {
            debug!("Registered {} {} handler", format, role);
        }
        self
    }

    pub fn register_reader(&mut self, format: F, decoder: impl Decode<R> + 'static) -> &mut Self {
        self.register(format, Handler::reader(decoder))
    }

    pub fn register_writer(&mut self, format: F, encoder: impl Encode<R> + 'static) -> &mut Self {
        self.register(format, Handler::writer(encoder))
    }

    pub fn has_handler(&self, format: F, role: Role) -> bool {
        match role {
            Role::Reader => self.readers.contains_key(&format),
            Role::Writer => self.writers.contains_key(&format),
        }
    }

    /// Formats with a reader, in declaration order.
    pub fn readable_formats(&self) -> Vec<F> {
        F::all()
            .iter()
            .copied()
            .filter(|f| self.readers.contains_key(f))
            .collect()
    }

    /// Formats with a writer, in declaration order.
    pub fn writable_formats(&self) -> Vec<F> {
        F::all()
            .iter()
            .copied()
            .filter(|f| self.writers.contains_key(f))
            .collect()
    }

    /// Convert `input` into `target`, placing the result at `destination`.
    ///
    /// # Errors
    /// - [`ConvertError::UnsupportedInputFormat`] — no reader for the input extension
    /// - [`ConvertError::ReadFailure`] — the reader failed
    /// - [`ConvertError::UnsupportedOutputFormat`] — no writer for `target`,
    ///   or the writer does not accept what was read
    /// - [`ConvertError::WriteFailure`] — the writer (or the final rename) failed
    ///
    /// No output file exists after any error.
    pub fn convert(
        &self,
        input: &Path,
        target: F,
        destination: &Destination,
    ) -> Result<PathBuf, ConvertError> {
        // ── Step 1: Pick the reader ──────────────────────────────────────
        let source_format = F::from_path(input);
        let reader = source_format
            .and_then(|f| self.readers.get(&f))
            .ok_or_else(|| ConvertError::UnsupportedInputFormat {
                path: input.to_path_buf(),
                extension: extension_of(input),
            })?;

        // ── Step 2: Decode ───────────────────────────────────────────────
        debug!("Reading {} as {:?}", input.display(), source_format);
        let repr = reader
            .decode(input)
            .map_err(|source| ConvertError::ReadFailure {
                path: input.to_path_buf(),
                source,
            })?;

        // ── Step 3: Pick the writer ──────────────────────────────────────
        let writer = self
            .writers
            .get(&target)
            .filter(|w| w.accepts(&repr))
            .ok_or_else(|| ConvertError::UnsupportedOutputFormat {
                path: input.to_path_buf(),
                format: target.to_string(),
            })?;

        // ── Step 4: Name the output ──────────────────────────────────────
        let output = destination.output_path(input, target.extension());

        // ── Step 5: Encode atomically ────────────────────────────────────
        debug!("Writing {} as {}", output.display(), target);
        write_atomically(&output, |sink| writer.encode(&repr, sink)).map_err(|source| {
            ConvertError::WriteFailure {
                path: output.clone(),
                source,
            }
        })?;

        info!("Converted {} → {}", input.display(), output.display());
        Ok(output)
    }
}

/// Run `encode` against a temp file next to `path`, then rename it into place.
///
/// The temp file is removed automatically if `encode` fails or panics.
fn write_atomically(
    path: &Path,
    encode: impl FnOnce(&mut dyn Sink) -> Result<(), CodecError>,
) -> Result<(), CodecError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".fileconv-")
        .suffix(".tmp")
        .tempfile_in(parent)?;

    encode(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}
