//! Windows-1252 helpers shared by the RTF, DOC and PDF codecs.
//!
//! RTF `\'hh` escapes, compressed Word pieces and the PDF
//! `WinAnsiEncoding` all use this code page. It equals Latin-1 except in
//! 0x80–0x9F.

const HIGH_CONTROL: [char; 32] = [
    '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž', '\u{8F}',
    '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9D}', 'ž', 'Ÿ',
];

/// Decode one Windows-1252 byte.
pub fn decode_byte(b: u8) -> char {
    match b {
        0x80..=0x9F => HIGH_CONTROL[usize::from(b - 0x80)],
        _ => char::from(b),
    }
}

/// Decode a Windows-1252 byte string.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

/// Encode one char, or `None` if the code page has no slot for it.
pub fn encode_char(c: char) -> Option<u8> {
    match u32::from(c) {
        0x00..=0x7F | 0xA0..=0xFF => u8::try_from(u32::from(c)).ok(),
        _ => HIGH_CONTROL
            .iter()
            .position(|&h| h == c)
            .and_then(|i| u8::try_from(i + 0x80).ok()),
    }
}

/// Encode a string, replacing unmappable chars with `?`.
pub fn encode_lossy(s: &str) -> Vec<u8> {
    s.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}
