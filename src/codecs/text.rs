//! Plain UTF-8 text.

use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use std::path::Path;

const BOM: char = '\u{FEFF}';

/// Read a UTF-8 file. A leading byte-order mark is dropped.
pub fn read_txt(path: &Path) -> Result<String, CodecError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes)?;
    Ok(match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Writes the text unchanged as UTF-8.
pub struct TxtWriter;

impl Encode<String> for TxtWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}
