//! Rich Text Format: a tokenizing plain-text extractor and a minimal writer.
//!
//! The reader walks control words group by group. Destination groups that
//! carry no body text (font and colour tables, stylesheets, document info,
//! pictures, field instructions, anything starred with `\*`) are skipped
//! wholesale. `\uN` escapes honour the `\ucN` fallback count of the group
//! they appear in, and `\'hh` bytes are decoded as Windows-1252.

use super::charset;
use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use std::path::Path;

const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "object",
    "fldinst",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "xmlnstbl",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "filetbl",
    "revtbl",
];

pub fn read_rtf(path: &Path) -> Result<String, CodecError> {
    rtf_to_text(&std::fs::read(path)?)
}

#[derive(Clone, Copy)]
struct Group {
    skip: bool,
    uc: usize,
}

struct Extractor {
    out: String,
    group: Group,
    stack: Vec<Group>,
    /// Fallback chars still to swallow after a `\u` escape.
    pending_fallback: usize,
    high_surrogate: Option<u16>,
}

impl Extractor {
    fn emit(&mut self, c: char) {
        if self.group.skip {
            return;
        }
        if self.pending_fallback > 0 {
            self.pending_fallback -= 1;
            return;
        }
        self.out.push(c);
    }

    fn control_word(&mut self, word: &str, param: Option<i32>) {
        if SKIPPED_DESTINATIONS.contains(&word) {
            self.group.skip = true;
            return;
        }
        match word {
            "par" | "line" | "sect" | "page" | "row" => self.emit('\n'),
            "tab" => self.emit('\t'),
            "cell" => self.emit('\t'),
            "emdash" => self.emit('—'),
            "endash" => self.emit('–'),
            "bullet" => self.emit('•'),
            "lquote" => self.emit('‘'),
            "rquote" => self.emit('’'),
            "ldblquote" => self.emit('“'),
            "rdblquote" => self.emit('”'),
            "emspace" | "enspace" | "qmspace" => self.emit(' '),
            "uc" => self.group.uc = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(n) = param {
                    self.unicode(n);
                }
            }
            _ => {}
        }
    }

    fn unicode(&mut self, n: i32) {
        // Parameters are signed 16-bit; negatives wrap to the upper half.
        let unit = (n & 0xFFFF) as u16;
        if !self.group.skip {
            match unit {
                0xD800..=0xDBFF => self.high_surrogate = Some(unit),
                0xDC00..=0xDFFF => {
                    if let Some(high) = self.high_surrogate.take() {
                        if let Some(Ok(c)) = char::decode_utf16([high, unit]).next() {
                            self.out.push(c);
                        }
                    }
                }
                _ => {
                    self.high_surrogate = None;
                    if let Some(c) = char::from_u32(u32::from(unit)) {
                        self.out.push(c);
                    }
                }
            }
        }
        self.pending_fallback = self.group.uc;
    }
}

/// Extract the body text of an RTF document.
pub fn rtf_to_text(rtf: &[u8]) -> Result<String, CodecError> {
    let start = rtf
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(rtf.len());
    if !rtf[start..].starts_with(b"{\\rtf") {
        return Err(CodecError::malformed("RTF", "missing {\\rtf header"));
    }

    let mut x = Extractor {
        out: String::new(),
        group: Group { skip: false, uc: 1 },
        stack: Vec::new(),
        pending_fallback: 0,
        high_surrogate: None,
    };

    let mut i = start;
    while i < rtf.len() {
        match rtf[i] {
            b'{' => {
                x.stack.push(x.group);
                x.pending_fallback = 0;
                i += 1;
            }
            b'}' => {
                x.group = x
                    .stack
                    .pop()
                    .ok_or_else(|| CodecError::malformed("RTF", "unbalanced closing brace"))?;
                x.pending_fallback = 0;
                i += 1;
            }
            b'\\' => {
                i += 1;
                let Some(&next) = rtf.get(i) else { break };
                if next.is_ascii_alphabetic() {
                    let word_start = i;
                    while i < rtf.len() && rtf[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word = String::from_utf8_lossy(&rtf[word_start..i]).into_owned();

                    let param_start = i;
                    if rtf.get(i) == Some(&b'-') {
                        i += 1;
                    }
                    while i < rtf.len() && rtf[i].is_ascii_digit() {
                        i += 1;
                    }
                    let param = std::str::from_utf8(&rtf[param_start..i])
                        .ok()
                        .and_then(|s| s.parse::<i32>().ok());

                    if rtf.get(i) == Some(&b' ') {
                        i += 1;
                    }
                    x.control_word(&word, param);
                } else {
                    i += 1;
                    match next {
                        b'\\' | b'{' | b'}' => x.emit(char::from(next)),
                        b'~' => x.emit('\u{A0}'),
                        b'_' => x.emit('-'),
                        b'*' => x.group.skip = true,
                        b'\'' => {
                            let hex = rtf.get(i..i + 2).and_then(|h| std::str::from_utf8(h).ok());
                            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                                x.emit(charset::decode_byte(byte));
                                i += 2;
                            }
                        }
                        b'\n' | b'\r' => x.emit('\n'),
                        _ => {}
                    }
                }
            }
            b'\r' | b'\n' => i += 1,
            b => {
                x.emit(charset::decode_byte(b));
                i += 1;
            }
        }
    }

    if !x.stack.is_empty() {
        return Err(CodecError::malformed("RTF", "unterminated group"));
    }

    Ok(x.out.trim_end_matches('\n').to_string())
}

/// Writes one `\par`-separated paragraph per line, Helvetica 12 pt.
pub struct RtfWriter;

const RTF_HEADER: &str = "{\\rtf1\\ansi\\ansicpg1252\\deff0{\\fonttbl{\\f0\\fswiss Helvetica;}}\\f0\\fs24 ";

impl Encode<String> for RtfWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        out.write_all(text_to_rtf(text).as_bytes())?;
        Ok(())
    }
}

pub fn text_to_rtf(text: &str) -> String {
    let body: Vec<String> = text.lines().map(escape).collect();
    format!("{RTF_HEADER}{}}}", body.join("\\par\n"))
}

fn escape(line: &str) -> String {
    let mut s = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' | '{' | '}' => {
                s.push('\\');
                s.push(c);
            }
            '\t' => s.push_str("\\tab "),
            c if c.is_ascii() => s.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    s.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_body_and_skips_tables() {
        let rtf = br"{\rtf1\ansi{\fonttbl{\f0 Times;}}{\colortbl;\red0\green0\blue0;}
{\*\generator Foo;}\f0\fs24 Hello {\b bold} world\par
Second line}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "Hello bold world\nSecond line");
    }

    #[test]
    fn decodes_hex_and_unicode_escapes() {
        let rtf = br"{\rtf1\ansi caf\'e9 \u8364? {\uc2\u26085\'93\'fa}!}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "café € 日!");
    }

    #[test]
    fn escaped_braces_are_text() {
        let rtf = br"{\rtf1 a \{b\} c\\d}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "a {b} c\\d");
    }

    #[test]
    fn rejects_non_rtf() {
        assert!(matches!(
            rtf_to_text(b"plain text"),
            Err(CodecError::Malformed { format: "RTF", .. })
        ));
        assert!(rtf_to_text(br"{\rtf1 open").is_err());
    }

    #[test]
    fn writer_escapes_specials() {
        let rtf = text_to_rtf("{x}\\y\n€");
        assert!(rtf.starts_with("{\\rtf1"));
        assert!(rtf.contains("\\{x\\}\\\\y\\par\n\\u8364?"), "{rtf}");
        assert!(rtf.ends_with('}'));
    }

    #[test]
    fn written_rtf_reads_back() {
        let text = "Line one\n\nLine three\twith tab\nnaïve 😀";
        assert_eq!(rtf_to_text(text_to_rtf(text).as_bytes()).unwrap(), text);
    }
}
