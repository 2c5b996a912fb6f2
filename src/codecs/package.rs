//! Zip-packaged XML documents (DOCX, ODT): shared read and write plumbing.

use crate::error::CodecError;
use crate::registry::Sink;
use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Read one member of a zip package as UTF-8.
pub fn read_member(path: &Path, member: &str) -> Result<String, CodecError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entry = archive.by_name(member)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// One file inside a package being written.
pub struct Member<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
    /// Store uncompressed (ODF requires this for `mimetype`).
    pub stored: bool,
}

/// Write `members` into a zip archive, in order.
///
/// Timestamps are pinned to the zip epoch so identical input gives
/// byte-identical output.
pub fn write_package(out: &mut dyn Sink, members: &[Member<'_>]) -> Result<(), CodecError> {
    let mut zip = ZipWriter::new(out);
    for m in members {
        let method = if m.stored {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(DateTime::default());
        zip.start_file(m.name, options)?;
        zip.write_all(m.body)?;
    }
    zip.finish()?;
    Ok(())
}

/// An XML writer primed with the `<?xml ...?>` declaration.
pub fn xml_writer(standalone: bool) -> Result<Writer<Cursor<Vec<u8>>>, CodecError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let standalone = if standalone { Some("yes") } else { None };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), standalone)))?;
    Ok(writer)
}
