//! Optional pandoc-backed writers for rich-text targets.
//!
//! The text is handed to pandoc as Markdown on stdin; the rendered document
//! comes back on stdout and is copied into the sink. Pandoc is never
//! required: these writers only replace the built-in ones when a binary
//! path is configured.

use crate::error::CodecError;
use crate::format::{DocumentFormat, FormatTag};
use crate::registry::{Encode, Sink};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Targets pandoc takes over when enabled.
pub const PANDOC_TARGETS: &[DocumentFormat] = &[
    DocumentFormat::Docx,
    DocumentFormat::Odt,
    DocumentFormat::Rtf,
    DocumentFormat::Html,
];

pub struct PandocWriter {
    binary: PathBuf,
    target: DocumentFormat,
}

impl PandocWriter {
    pub fn new(binary: &Path, target: DocumentFormat) -> Self {
        Self {
            binary: binary.to_path_buf(),
            target,
        }
    }

    fn tool_error(&self, detail: impl Into<String>) -> CodecError {
        CodecError::Tool {
            tool: format!("pandoc ({})", self.binary.display()),
            detail: detail.into(),
        }
    }
}

impl Encode<String> for PandocWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        let target = self.target.extension();
        debug!("Running {} --to {}", self.binary.display(), target);

        let mut child = Command::new(&self.binary)
            .args(["--from", "markdown", "--to", target, "--standalone", "--output", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.tool_error(format!("cannot start: {e}")))?;

        // Feed stdin from a thread so a large document cannot deadlock
        // against a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.tool_error("stdin was not captured"))?;
        let input = text.clone();
        let feeder = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        match feeder.join() {
            Ok(result) => result?,
            Err(_) => return Err(self.tool_error("stdin writer panicked")),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.tool_error(format!("exit {}: {}", output.status, stderr.trim())));
        }
        out.write_all(&output.stdout)?;
        Ok(())
    }
}
