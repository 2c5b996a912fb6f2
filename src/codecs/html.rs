//! HTML reader (tag stripping) and a minimal paragraph writer.
//!
//! Reading runs two `lol_html` passes. The first marks structure with
//! private-use sentinels (one per `<br>`, one before and one after each
//! block element) and drops scripts, styles and comments. The second
//! removes every tag but keeps its content. Whitespace from the source
//! layout is collapsed before entities are decoded, so `&nbsp;` and `&#9;`
//! survive as written and escaped markup never turns back into tags.
//!
//! The writer spells out every space a reader would otherwise collapse as
//! `&nbsp;`, which makes TXT → HTML → TXT lossless.

use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use lol_html::html_content::ContentType;
use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

const LINE_MARK: char = '\u{E000}';
const BLOCK_OPEN: char = '\u{E001}';
const BLOCK_CLOSE: char = '\u{E002}';

const DROPPED: &str = "head, script, style, noscript, template";
const BLOCKS: &str = "p, div, h1, h2, h3, h4, h5, h6, li, dt, dd, tr, blockquote, pre, \
                      section, article, header, footer, nav, aside, table, ul, ol, dl";

static RE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!doctype[^>]*>|<\?.*?\?>").unwrap());

/// Read an HTML file into plain text: one paragraph per block element,
/// one line per `<br>`.
pub fn read_html(path: &Path) -> Result<String, CodecError> {
    let html = String::from_utf8(std::fs::read(path)?)?;
    html_to_text(&html)
}

pub fn html_to_text(html: &str) -> Result<String, CodecError> {
    let marked = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(DROPPED, |el| {
                    el.remove();
                    Ok(())
                }),
                element!("br", |el| {
                    el.replace(LINE_MARK.encode_utf8(&mut [0; 4]), ContentType::Text);
                    Ok(())
                }),
                element!("hr", |el| {
                    el.replace(BLOCK_CLOSE.encode_utf8(&mut [0; 4]), ContentType::Text);
                    Ok(())
                }),
                element!(BLOCKS, |el| {
                    el.before(BLOCK_OPEN.encode_utf8(&mut [0; 4]), ContentType::Text);
                    el.after(BLOCK_CLOSE.encode_utf8(&mut [0; 4]), ContentType::Text);
                    Ok(())
                }),
            ],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )?;

    let bare = rewrite_str(
        &marked,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                el.remove_and_keep_content();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )?;
    let bare = RE_DECLARATION.replace_all(&bare, "");

    // Split on block marks. A segment is a paragraph when it has text, or
    // when it is the whole body of a block (`<p></p>` is an empty paragraph).
    let mut paragraphs: Vec<String> = Vec::new();
    let mut segment = String::new();
    let mut opened_by: Option<char> = None;
    for c in bare.chars() {
        if c == BLOCK_OPEN || c == BLOCK_CLOSE {
            let whole_block = opened_by == Some(BLOCK_OPEN) && c == BLOCK_CLOSE;
            paragraphs.extend(paragraph(&segment, whole_block));
            segment.clear();
            opened_by = Some(c);
        } else {
            segment.push(c);
        }
    }
    paragraphs.extend(paragraph(&segment, false));

    Ok(paragraphs.join("\n\n"))
}

fn paragraph(raw: &str, keep_empty: bool) -> Option<String> {
    let lines: Vec<String> = raw.split(LINE_MARK).map(clean_line).collect();
    if keep_empty || lines.iter().any(|l| !l.is_empty()) {
        Some(lines.join("\n"))
    } else {
        None
    }
}

/// Collapse layout whitespace, then decode entities; `&nbsp;` reads as a space.
fn clean_line(raw: &str) -> String {
    let collapsed = raw.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    html_escape::decode_html_entities(&collapsed).replace('\u{A0}', " ")
}

/// `<p>` per blank-line-separated paragraph, `<br>` per line break inside it.
pub struct HtmlWriter;

impl Encode<String> for HtmlWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        out.write_all(text_to_html(text).as_bytes())?;
        Ok(())
    }
}

pub fn text_to_html(text: &str) -> String {
    let mut html = String::from("<html><body>");
    for paragraph in text.replace("\r\n", "\n").split("\n\n") {
        html.push_str("<p>");
        let lines: Vec<String> = paragraph.split('\n').map(line_to_html).collect();
        html.push_str(&lines.join("<br>"));
        html.push_str("</p>");
    }
    html.push_str("</body></html>");
    html
}

/// Escape one line. Leading, trailing and repeated spaces become `&nbsp;`
/// and tabs `&#9;`, since a reader collapses both.
fn line_to_html(line: &str) -> String {
    let escaped = html_escape::encode_text(line);
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    let mut after_space = true;
    while let Some(c) = chars.next() {
        match c {
            ' ' if after_space || chars.peek().is_none() => out.push_str("&nbsp;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
        after_space = c == ' ';
    }
    out
}
