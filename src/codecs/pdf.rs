//! PDF text extraction and a single-font text-to-PDF writer, both on lopdf.

use super::charset;
use crate::config::PdfLayout;
use crate::error::CodecError;
use crate::registry::{Encode, Sink};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::debug;

/// Extract the text of every page, pages separated by a newline.
///
/// Scanned (image-only) PDFs yield empty text rather than an error.
pub fn read_pdf(path: &Path) -> Result<String, CodecError> {
    let doc = Document::load(path)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!("{} has {} page(s)", path.display(), pages.len());

    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(doc.extract_text(&[*page])?.trim_end_matches('\n'));
    }
    Ok(text)
}

/// Draws each line of text top-down in 12 pt Helvetica, starting a new page
/// when the page is full. Characters outside Windows-1252 become `?`.
pub struct PdfTextWriter {
    layout: PdfLayout,
}

impl PdfTextWriter {
    pub fn new(layout: PdfLayout) -> Self {
        Self { layout }
    }

    fn page_ops(&self, lines: &[&str]) -> Vec<Operation> {
        let (_, height) = self.layout.page_size.dimensions();
        let mut ops = Vec::with_capacity(lines.len() * 5);
        for (i, line) in lines.iter().enumerate() {
            let y = height - self.layout.margin - i as f32 * self.layout.line_height;
            let line = line.replace('\t', "    ");
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Real(self.layout.font_size.into())],
            ));
            ops.push(Operation::new(
                "Td",
                vec![Object::Real(self.layout.margin.into()), Object::Real(y.into())],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(charset::encode_lossy(&line))]));
            ops.push(Operation::new("ET", vec![]));
        }
        ops
    }
}

impl Encode<String> for PdfTextWriter {
    fn encode(&self, text: &String, out: &mut dyn Sink) -> Result<(), CodecError> {
        let (width, height) = self.layout.page_size.dimensions();
        let lines: Vec<&str> = text.lines().collect();
        let per_page = self.layout.lines_per_page();

        // An empty document still gets one blank page.
        let pages: Vec<&[&str]> = if lines.is_empty() {
            vec![lines.as_slice()]
        } else {
            lines.chunks(per_page).collect()
        };

        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width.into()),
            Object::Real(height.into()),
        ];

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for chunk in &pages {
            let content = Content { operations: self.page_ops(chunk) };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => media_box.clone(),
            });
            kids.push(page_id.into());
        }

        finish_document(&mut doc, pages_id, kids, media_box, out)
    }
}

/// Insert the page tree and catalog, compress and serialise `doc`.
pub(crate) fn finish_document(
    doc: &mut Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    media_box: Vec<Object>,
    out: &mut dyn Sink,
) -> Result<(), CodecError> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    out.write_all(&bytes)?;
    Ok(())
}
