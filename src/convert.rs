//! The conversion façade: one entry point over both registries.
//!
//! A [`Converter`] owns a document registry (`String` intermediate) and an
//! image registry ([`Picture`] intermediate), both filled once from a
//! [`ConversionConfig`]. It routes each [`ConversionRequest`] to the right
//! registry by input extension and parses the target in that domain.
//!
//! `convert` is synchronous and CPU/IO-bound. From async code use
//! [`convert_async`], which runs it on tokio's blocking pool.

use crate::codecs::{self, Picture};
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::{extension_of, normalise_extension, DocumentFormat, Domain, FormatTag, ImageFormat};
use crate::registry::ConversionRegistry;
use crate::request::ConversionRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Converts files between the supported formats.
///
/// Cheap to share: wrap it in an [`Arc`] and call [`Converter::convert`]
/// from as many threads as you like.
pub struct Converter {
    config: ConversionConfig,
    documents: ConversionRegistry<DocumentFormat, String>,
    images: ConversionRegistry<ImageFormat, Picture>,
}

impl Converter {
    /// Build both registries from `config`.
    pub fn new(config: ConversionConfig) -> Self {
        let documents = codecs::document_registry(&config);
        let images = codecs::image_registry(&config);
        debug!(
            "Converter ready: {} document readers, {} image readers",
            documents.readable_formats().len(),
            images.readable_formats().len()
        );
        Self {
            config,
            documents,
            images,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The document table, e.g. to inspect or extend it before sharing.
    pub fn documents(&self) -> &ConversionRegistry<DocumentFormat, String> {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut ConversionRegistry<DocumentFormat, String> {
        &mut self.documents
    }

    pub fn images(&self) -> &ConversionRegistry<ImageFormat, Picture> {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ConversionRegistry<ImageFormat, Picture> {
        &mut self.images
    }

    /// Convert one file.
    ///
    /// # Errors
    /// - [`ConvertError::UnsupportedInputFormat`] — the input extension
    ///   belongs to no domain or has no reader
    /// - [`ConvertError::UnsupportedOutputFormat`] — the target is unknown in
    ///   the input's domain, has no writer, or refuses what was read
    /// - [`ConvertError::ReadFailure`] / [`ConvertError::WriteFailure`] —
    ///   a codec failed; no output file is left behind
    ///
    /// The target name is parsed before the input is read, so an unknown
    /// target is reported as `UnsupportedOutputFormat` even when the input
    /// is also unreadable. A known target whose writer refuses the decoded
    /// content is only detected after the read.
    pub fn convert(&self, request: &ConversionRequest) -> Result<PathBuf, ConvertError> {
        let start = Instant::now();
        let input = request.input.as_path();
        info!("Starting conversion: {} → {}", input.display(), normalise_extension(&request.target));

        let domain = Domain::of_input(input).ok_or_else(|| ConvertError::UnsupportedInputFormat {
            path: input.to_path_buf(),
            extension: extension_of(input),
        })?;
        debug!("{} routed to the {} registry", input.display(), domain);

        let output = match domain {
            Domain::Document => {
                let target = parse_target::<DocumentFormat>(input, &request.target)?;
                self.documents.convert(input, target, &request.destination)?
            }
            Domain::Image => {
                let target = parse_target::<ImageFormat>(input, &request.target)?;
                self.images.convert(input, target, &request.destination)?
            }
        };

        debug!("Finished {} in {}ms", input.display(), start.elapsed().as_millis());
        Ok(output)
    }

    /// Input extensions with a reader, per domain, in declaration order.
    pub fn supported_inputs(&self) -> Vec<(Domain, &'static str)> {
        let docs = self
            .documents
            .readable_formats()
            .into_iter()
            .map(|f| (Domain::Document, f.extension()));
        let imgs = self
            .images
            .readable_formats()
            .into_iter()
            .map(|f| (Domain::Image, f.extension()));
        docs.chain(imgs).collect()
    }

    /// Target extensions with a writer in `domain`.
    pub fn supported_outputs(&self, domain: Domain) -> Vec<&'static str> {
        match domain {
            Domain::Document => self
                .documents
                .writable_formats()
                .into_iter()
                .map(FormatTag::extension)
                .collect(),
            Domain::Image => self
                .images
                .writable_formats()
                .into_iter()
                .map(FormatTag::extension)
                .collect(),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("documents", &self.documents)
            .field("images", &self.images)
            .finish()
    }
}

fn parse_target<F: FormatTag>(input: &Path, target: &str) -> Result<F, ConvertError> {
    F::from_extension(target).ok_or_else(|| ConvertError::UnsupportedOutputFormat {
        path: input.to_path_buf(),
        format: normalise_extension(target),
    })
}

/// Run [`Converter::convert`] on tokio's blocking pool.
pub async fn convert_async(
    converter: Arc<Converter>,
    request: ConversionRequest,
) -> Result<PathBuf, ConvertError> {
    tokio::task::spawn_blocking(move || converter.convert(&request))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task failed: {e}")))?
}

/// One-shot conversion with the default configuration.
///
/// Builds a fresh [`Converter`] each call; keep one around instead when
/// converting many files.
pub fn convert_file(
    input: impl Into<PathBuf>,
    target: &str,
    output_dir: impl Into<PathBuf>,
) -> Result<PathBuf, ConvertError> {
    Converter::default().convert(&ConversionRequest::new(input, target, output_dir))
}
