//! OpenDocument Text.

use super::package::{self, Member};
use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;
use std::path::Path;

const MIMETYPE: &str = "application/vnd.oasis.opendocument.text";
const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

/// Largest `text:c` honoured on a single `text:s`.
const MAX_SPACE_RUN: usize = 1024;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.text"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

pub fn read_odt(path: &Path) -> Result<String, CodecError> {
    let xml = package::read_member(path, "content.xml")?;
    content_xml_to_text(&xml)
}

fn content_xml_to_text(xml: &str) -> Result<String, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    // Paragraphs nest inside frames and notes.
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if is_paragraph(e.local_name().as_ref()) {
                    depth += 1;
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" | b"h" if depth == 0 => paragraphs.push(String::new()),
                b"tab" if depth > 0 => current.push('\t'),
                b"line-break" if depth > 0 => current.push('\n'),
                b"s" if depth > 0 => {
                    let count = e
                        .try_get_attribute("text:c")
                        .ok()
                        .flatten()
                        .and_then(|a| std::str::from_utf8(&a.value).ok()?.parse::<usize>().ok())
                        .unwrap_or(1)
                        .min(MAX_SPACE_RUN);
                    current.extend(std::iter::repeat(' ').take(count));
                }
                _ => {}
            },
            Event::Text(t) if depth > 0 => current.push_str(&t.unescape()?),
            Event::End(e) => {
                if is_paragraph(e.local_name().as_ref()) {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn is_paragraph(local: &[u8]) -> bool {
    local == b"p" || local == b"h"
}

/// One `text:p` per line.
pub struct OdtWriter;

impl Encode<String> for OdtWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        let content = content_xml(text)?;
        package::write_package(
            out,
            &[
                Member { name: "mimetype", body: MIMETYPE.as_bytes(), stored: true },
                Member { name: "META-INF/manifest.xml", body: MANIFEST.as_bytes(), stored: false },
                Member { name: "content.xml", body: &content, stored: false },
            ],
        )
    }
}

fn content_xml(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut w = package::xml_writer(false)?;

    let mut root = BytesStart::new("office:document-content");
    root.push_attribute(("xmlns:office", OFFICE_NS));
    root.push_attribute(("xmlns:text", TEXT_NS));
    root.push_attribute(("office:version", "1.2"));
    w.write_event(Event::Start(root))?;
    w.write_event(Event::Start(BytesStart::new("office:body")))?;
    w.write_event(Event::Start(BytesStart::new("office:text")))?;

    for line in text.lines() {
        if line.is_empty() {
            w.write_event(Event::Empty(BytesStart::new("text:p")))?;
        } else {
            w.write_event(Event::Start(BytesStart::new("text:p")))?;
            write_line(&mut w, line)?;
            w.write_event(Event::End(BytesEnd::new("text:p")))?;
        }
    }

    w.write_event(Event::End(BytesEnd::new("office:text")))?;
    w.write_event(Event::End(BytesEnd::new("office:body")))?;
    w.write_event(Event::End(BytesEnd::new("office:document-content")))?;
    Ok(w.into_inner().into_inner())
}

/// ODF collapses whitespace: keep a single inner space as text, spell out
/// everything else as `text:s` and `text:tab`.
fn write_line(w: &mut Writer<Cursor<Vec<u8>>>, line: &str) -> Result<(), CodecError> {
    let chars: Vec<char> = line.chars().collect();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\t' => {
                flush_text(w, &mut buf)?;
                w.write_event(Event::Empty(BytesStart::new("text:tab")))?;
                i += 1;
            }
            ' ' => {
                let run = chars[i..].iter().take_while(|&&c| c == ' ').count();
                let mut extra = run;
                if i > 0 && chars[i - 1] != '\t' {
                    buf.push(' ');
                    extra -= 1;
                }
                if extra > 0 {
                    flush_text(w, &mut buf)?;
                }
                while extra > 0 {
                    let n = extra.min(MAX_SPACE_RUN);
                    let mut s = BytesStart::new("text:s");
                    if n > 1 {
                        s.push_attribute(("text:c", n.to_string().as_str()));
                    }
                    w.write_event(Event::Empty(s))?;
                    extra -= n;
                }
                i += run;
            }
            c => {
                buf.push(c);
                i += 1;
            }
        }
    }
    flush_text(w, &mut buf)
}

fn flush_text(w: &mut Writer<Cursor<Vec<u8>>>, buf: &mut String) -> Result<(), CodecError> {
    if !buf.is_empty() {
        w.write_event(Event::Text(BytesText::new(buf.as_str())))?;
        buf.clear();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn extracts_paragraphs_and_headings() {
        let xml = r#"<office:document-content xmlns:office="o" xmlns:text="t"><office:body><office:text>
            <text:h>Title</text:h>
            <text:p>a<text:s text:c="3"/>b<text:tab/>c<text:line-break/>d</text:p>
            <text:p/>
            <text:p>x <text:span>y</text:span></text:p>
        </office:text></office:body></office:document-content>"#;
        assert_eq!(
            content_xml_to_text(xml).unwrap(),
            "Title\na   b\tc\nd\n\nx y"
        );
    }

    #[test]
    fn huge_space_count_is_capped() {
        let xml = r#"<text:p xmlns:text="t">a<text:s text:c="4000000000"/>b</text:p>"#;
        let text = content_xml_to_text(xml).unwrap();
        assert_eq!(text.len(), MAX_SPACE_RUN + 2);
        assert!(text.starts_with('a') && text.ends_with('b'));
    }

    #[test]
    fn long_space_runs_survive_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.odt");
        let text = format!("x{}y", " ".repeat(MAX_SPACE_RUN * 2 + 5));

        let mut file = File::create(&path).unwrap();
        OdtWriter.encode(&text, &mut file).unwrap();
        drop(file);

        assert_eq!(read_odt(&path).unwrap(), text);
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.odt");
        let mut file = File::create(&path).unwrap();
        OdtWriter.encode(&"hi".to_string(), &mut file).unwrap();
        drop(file);

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), zip::CompressionMethod::Stored);
    }

    #[test]
    fn written_odt_reads_back_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.odt");
        let text = "  lead\nmid   gap\ttab\t after\n\nplain <&> text ".to_string();

        let mut file = File::create(&path).unwrap();
        OdtWriter.encode(&text, &mut file).unwrap();
        drop(file);

        assert_eq!(read_odt(&path).unwrap(), text);
    }
}
