//! Word 97–2003 binary documents (read-only).
//!
//! ## Layout
//!
//! ```text
//! OLE2 container
//! ├── WordDocument   FIB header + text pieces
//! └── 0Table/1Table  CLX → piece table (which byte ranges hold which chars)
//! ```
//!
//! The FIB says which table stream is live (`fWhichTblStm`) and where the
//! CLX sits inside it. Each piece is either 8-bit Windows-1252
//! ("compressed") or UTF-16LE. Only the main story (`ccpText` characters)
//! is extracted; footnotes and headers follow it in CP space and are cut.
//!
//! Files that carry a `.doc` extension but are really RTF or DOCX (a
//! common "Save as" accident) are detected by signature and delegated.

use super::{charset, docx, rtf};
use crate::error::CodecError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const FIB_IDENT: u16 = 0xA5EC;
const FIB_FLAGS: usize = 0x000A;
const FIB_CCP_TEXT: usize = 0x004C;
const FIB_FC_CLX: usize = 0x01A2;
const FIB_LCB_CLX: usize = 0x01A6;

const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;
const FC_COMPRESSED: u32 = 0x4000_0000;

const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub fn read_doc(path: &Path) -> Result<String, CodecError> {
    let mut head = [0u8; 8];
    let n = std::fs::File::open(path)?.read(&mut head)?;
    let head = &head[..n];

    if head.starts_with(b"{\\rtf") {
        debug!("{} is RTF despite its extension", path.display());
        return rtf::read_rtf(path);
    }
    if head.starts_with(b"PK\x03\x04") {
        debug!("{} is a zip package, trying DOCX", path.display());
        return docx::read_docx(path);
    }
    if head != OLE_MAGIC {
        return Err(CodecError::malformed("DOC", "not an OLE2 compound file"));
    }

    let mut container = cfb::open(path)?;
    let word = read_stream(&mut container, "/WordDocument")?;

    if read_u16(&word, 0) != Some(FIB_IDENT) {
        return Err(CodecError::malformed("DOC", "WordDocument stream has no Word 97 FIB"));
    }
    let flags = field_u16(&word, FIB_FLAGS)?;
    if flags & FLAG_ENCRYPTED != 0 {
        return Err(CodecError::malformed("DOC", "document is password-protected"));
    }
    let table_name = if flags & FLAG_WHICH_TABLE != 0 { "/1Table" } else { "/0Table" };
    let table = read_stream(&mut container, table_name)?;

    let ccp_text = field_u32(&word, FIB_CCP_TEXT)? as usize;
    let fc_clx = field_u32(&word, FIB_FC_CLX)? as usize;
    let lcb_clx = field_u32(&word, FIB_LCB_CLX)? as usize;
    let clx = table
        .get(fc_clx..fc_clx.saturating_add(lcb_clx))
        .ok_or_else(|| CodecError::malformed("DOC", "CLX lies outside the table stream"))?;

    let raw = extract_pieces(&word, piece_table(clx)?, ccp_text)?;
    Ok(clean(&raw))
}

fn read_stream(container: &mut cfb::CompoundFile<std::fs::File>, name: &str) -> Result<Vec<u8>, CodecError> {
    let mut stream = container
        .open_stream(name)
        .map_err(|_| CodecError::malformed("DOC", format!("missing {} stream", name.trim_start_matches('/'))))?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

fn read_u16(b: &[u8], at: usize) -> Option<u16> {
    let bytes: [u8; 2] = b.get(at..at + 2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

fn read_u32(b: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = b.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn field_u16(b: &[u8], at: usize) -> Result<u16, CodecError> {
    read_u16(b, at).ok_or_else(|| CodecError::malformed("DOC", "truncated FIB"))
}

fn field_u32(b: &[u8], at: usize) -> Result<u32, CodecError> {
    read_u32(b, at).ok_or_else(|| CodecError::malformed("DOC", "truncated FIB"))
}

/// Skip property runs (`Prc`, type 1) and return the `PlcPcd` body of the
/// piece-table entry (`Pcdt`, type 2).
fn piece_table(clx: &[u8]) -> Result<&[u8], CodecError> {
    let truncated = || CodecError::malformed("DOC", "truncated CLX");
    let mut i = 0;
    while i < clx.len() {
        match clx[i] {
            0x01 => {
                let cb = read_u16(clx, i + 1).ok_or_else(truncated)? as usize;
                i += 3 + cb;
            }
            0x02 => {
                let lcb = read_u32(clx, i + 1).ok_or_else(truncated)? as usize;
                return clx.get(i + 5..i + 5 + lcb).ok_or_else(truncated);
            }
            other => {
                return Err(CodecError::malformed("DOC", format!("unexpected CLX entry {other:#04x}")));
            }
        }
    }
    Err(CodecError::malformed("DOC", "CLX has no piece table"))
}

/// `PlcPcd` = (n + 1) CPs followed by n 8-byte piece descriptors.
fn extract_pieces(word: &[u8], plc: &[u8], ccp_text: usize) -> Result<String, CodecError> {
    if plc.len() < 4 || (plc.len() - 4) % 12 != 0 {
        return Err(CodecError::malformed("DOC", "piece table has an odd size"));
    }
    let n = (plc.len() - 4) / 12;
    let out_of_range = || CodecError::malformed("DOC", "piece points outside WordDocument");

    let mut text = String::new();
    let mut emitted = 0usize;
    for k in 0..n {
        if emitted >= ccp_text {
            break;
        }
        let cp_start = read_u32(plc, k * 4).ok_or_else(out_of_range)? as usize;
        let cp_end = read_u32(plc, (k + 1) * 4).ok_or_else(out_of_range)? as usize;
        let len = cp_end.saturating_sub(cp_start).min(ccp_text - emitted);

        let pcd = (n + 1) * 4 + k * 8;
        let fc = read_u32(plc, pcd + 2).ok_or_else(out_of_range)?;

        if fc & FC_COMPRESSED != 0 {
            let start = ((fc & !FC_COMPRESSED) / 2) as usize;
            let bytes = word.get(start..start + len).ok_or_else(out_of_range)?;
            text.push_str(&charset::decode(bytes));
        } else {
            let start = fc as usize;
            let bytes = word.get(start..start + 2 * len).ok_or_else(out_of_range)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            text.extend(char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)));
        }
        emitted += len;
    }
    Ok(text)
}

/// Map Word's in-band control characters to plain text.
///
/// Fields are `0x13 instructions 0x14 result 0x15`; only the result is kept.
fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // One entry per open field: true while still inside its instructions.
    let mut fields: Vec<bool> = Vec::new();

    for c in raw.chars() {
        match c {
            '\u{13}' => fields.push(true),
            '\u{14}' => {
                if let Some(top) = fields.last_mut() {
                    *top = false;
                }
            }
            '\u{15}' => {
                fields.pop();
            }
            _ if fields.iter().any(|&in_instr| in_instr) => {}
            '\r' | '\u{0B}' | '\u{0C}' => out.push('\n'),
            '\u{07}' => out.push('\t'),
            '\u{1E}' => out.push('-'),
            '\t' | '\n' => out.push(c),
            c if c < ' ' => {}
            c => out.push(c),
        }
    }

    out.trim_end().to_string()
}
