//! Concrete readers and writers, and the default registration tables.
//!
//! Each submodule handles exactly one format family. Readers are plain
//! functions (`fn(&Path) -> Result<R, CodecError>`); writers are small
//! structs implementing [`Encode`] so they can carry configuration.
//!
//! ## Tables
//!
//! ```text
//!              readers                          writers
//! documents    txt docx pdf rtf html odt doc   txt docx pdf rtf html odt
//! images       jpeg png gif bmp tiff svg       jpeg png gif bmp tiff pdf
//! ```
//!
//! Images: SVG input can only go to PNG (rasterised) or PDF; the other
//! raster writers refuse vector input. Image PDF output accepts only SVG.

pub mod charset;
pub mod doc;
pub mod docx;
pub mod html;
pub mod odt;
pub mod package;
pub mod pandoc;
pub mod pdf;
pub mod raster;
pub mod rtf;
pub mod svg;
pub mod text;

use crate::config::ConversionConfig;
use crate::format::{DocumentFormat, ImageFormat};
use crate::registry::{ConversionRegistry, Encode};
use tracing::info;

pub use raster::Picture;

/// Build the document table: every reader, every native writer, and the
/// pandoc writers on top when a pandoc binary is configured.
pub fn document_registry(config: &ConversionConfig) -> ConversionRegistry<DocumentFormat, String> {
    let mut reg = ConversionRegistry::new();

    reg.register_reader(DocumentFormat::Txt, text::read_txt)
        .register_reader(DocumentFormat::Docx, docx::read_docx)
        .register_reader(DocumentFormat::Pdf, pdf::read_pdf)
        .register_reader(DocumentFormat::Rtf, rtf::read_rtf)
        .register_reader(DocumentFormat::Html, html::read_html)
        .register_reader(DocumentFormat::Odt, odt::read_odt)
        .register_reader(DocumentFormat::Doc, doc::read_doc);

    reg.register_writer(DocumentFormat::Txt, text::TxtWriter)
        .register_writer(DocumentFormat::Docx, docx::DocxWriter)
        .register_writer(DocumentFormat::Pdf, pdf::PdfTextWriter::new(config.pdf_layout))
        .register_writer(DocumentFormat::Rtf, rtf::RtfWriter)
        .register_writer(DocumentFormat::Html, html::HtmlWriter)
        .register_writer(DocumentFormat::Odt, odt::OdtWriter);

    if let Some(ref binary) = config.pandoc_path {
        info!("Using pandoc at {} for rich-text output", binary.display());
        for format in pandoc::PANDOC_TARGETS {
            reg.register_writer(*format, pandoc::PandocWriter::new(binary, *format));
        }
    }

    reg
}

/// Build the image table.
pub fn image_registry(config: &ConversionConfig) -> ConversionRegistry<ImageFormat, Picture> {
    let mut reg = ConversionRegistry::new();

    for format in [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
    ] {
        reg.register_reader(format, raster::read_raster);
        reg.register_writer(format, raster_writer(format, config));
    }

    reg.register_reader(ImageFormat::Svg, svg::SvgReader::new(config.svg_system_fonts))
        .register_writer(ImageFormat::Pdf, svg::SvgPdfWriter::new(config.svg_scale));

    reg
}

fn raster_writer(format: ImageFormat, config: &ConversionConfig) -> impl Encode<Picture> {
    raster::RasterWriter {
        format,
        jpeg_quality: config.jpeg_quality,
        svg_scale: config.svg_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Role;

    #[test]
    fn document_table_matches_supported_sets() {
        let reg = document_registry(&ConversionConfig::default());
        assert_eq!(reg.readable_formats().len(), 7);
        assert_eq!(
            reg.writable_formats(),
            vec![
                DocumentFormat::Txt,
                DocumentFormat::Docx,
                DocumentFormat::Pdf,
                DocumentFormat::Rtf,
                DocumentFormat::Html,
                DocumentFormat::Odt,
            ]
        );
        assert!(!reg.has_handler(DocumentFormat::Doc, Role::Writer));
    }

    #[test]
    fn image_table_is_asymmetric() {
        let reg = image_registry(&ConversionConfig::builder().svg_system_fonts(false).build().unwrap());
        assert!(reg.has_handler(ImageFormat::Svg, Role::Reader));
        assert!(!reg.has_handler(ImageFormat::Svg, Role::Writer));
        assert!(reg.has_handler(ImageFormat::Pdf, Role::Writer));
        assert!(!reg.has_handler(ImageFormat::Pdf, Role::Reader));
    }
}
