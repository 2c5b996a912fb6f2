//! Office Open XML word-processing documents.
//!
//! Only `word/document.xml` matters for text: paragraphs (`w:p`) become
//! lines, runs of `w:t` are concatenated, `w:tab` and `w:br` inside a run
//! map to tab and newline. Deleted revisions, field instructions and
//! paragraph properties are ignored. Text-box paragraphs come out as their
//! own lines, ahead of the paragraph that anchors them.

use super::package::{self, Member};
use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Reader;
use std::path::Path;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub fn read_docx(path: &Path) -> Result<String, CodecError> {
    let xml = package::read_member(path, "word/document.xml")?;
    document_xml_to_text(&xml)
}

/// Paragraph being collected, with how many `w:r` runs are open in it.
/// Tab stops and other properties live outside runs and are skipped.
#[derive(Default)]
struct OpenParagraph {
    text: String,
    runs: usize,
}

impl OpenParagraph {
    fn in_run(&self) -> bool {
        self.runs > 0
    }
}

fn document_xml_to_text(xml: &str) -> Result<String, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    // Text boxes nest whole paragraphs inside a run of the outer one.
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(OpenParagraph::default()),
                b"r" => {
                    if let Some(p) = open.last_mut() {
                        p.runs += 1;
                    }
                }
                b"t" => in_text = open.last().is_some_and(OpenParagraph::in_run),
                _ => {}
            },
            Event::Empty(e) => {
                let run = open.last_mut().filter(|p| p.in_run());
                match (e.local_name().as_ref(), run) {
                    (b"p", _) => paragraphs.push(String::new()),
                    (b"tab", Some(p)) => p.text.push('\t'),
                    (b"br" | b"cr", Some(p)) => p.text.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) if in_text => {
                if let Some(p) = open.last_mut() {
                    p.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => {
                    if let Some(p) = open.last_mut() {
                        p.runs = p.runs.saturating_sub(1);
                    }
                }
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p.text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// One `w:p` per line of text.
pub struct DocxWriter;

impl Encode<String> for DocxWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        let document = document_xml(text)?;
        package::write_package(
            out,
            &[
                Member { name: "[Content_Types].xml", body: CONTENT_TYPES.as_bytes(), stored: false },
                Member { name: "_rels/.rels", body: ROOT_RELS.as_bytes(), stored: false },
                Member { name: "word/document.xml", body: &document, stored: false },
            ],
        )
    }
}

fn document_xml(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut w = package::xml_writer(true)?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", W_NS));
    w.write_event(Event::Start(root))?;
    w.write_event(Event::Start(BytesStart::new("w:body")))?;

    for line in text.lines() {
        if line.is_empty() {
            w.write_event(Event::Empty(BytesStart::new("w:p")))?;
            continue;
        }
        w.write_event(Event::Start(BytesStart::new("w:p")))?;
        w.write_event(Event::Start(BytesStart::new("w:r")))?;
        for (i, chunk) in line.split('\t').enumerate() {
            if i > 0 {
                w.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            if chunk.is_empty() {
                continue;
            }
            let mut t = BytesStart::new("w:t");
            t.push_attribute(("xml:space", "preserve"));
            w.write_event(Event::Start(t))?;
            w.write_event(Event::Text(BytesText::new(chunk)))?;
            w.write_event(Event::End(BytesEnd::new("w:t")))?;
        }
        w.write_event(Event::End(BytesEnd::new("w:r")))?;
        w.write_event(Event::End(BytesEnd::new("w:p")))?;
    }

    w.write_event(Event::Empty(BytesStart::new("w:sectPr")))?;
    w.write_event(Event::End(BytesEnd::new("w:body")))?;
    w.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(w.into_inner().into_inner())
}
