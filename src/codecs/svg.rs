//! SVG input (usvg), rasterisation (resvg), and SVG-to-PDF output.
//!
//! The PDF writer embeds one rendered page: the drawing is rasterised at
//! `svg_scale`, composited over white and stored as a Flate-compressed RGB
//! image XObject on a page of the drawing's intrinsic size (96 px per inch).

use super::pdf::finish_document;
use super::raster::Picture;
use crate::error::CodecError;
use crate::registry::{Decode, Encode, Sink};
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// PDF points per CSS pixel.
const PT_PER_PX: f32 = 72.0 / 96.0;

/// Parses SVG files. Holds the font database so `<text>` can be shaped.
pub struct SvgReader {
    fontdb: Arc<fontdb::Database>,
}

impl SvgReader {
    /// `system_fonts` loads the host's fonts once, up front.
    pub fn new(system_fonts: bool) -> Self {
        let mut db = fontdb::Database::new();
        if system_fonts {
            db.load_system_fonts();
            debug!("Loaded {} system font faces for SVG text", db.len());
        }
        Self { fontdb: Arc::new(db) }
    }
}

impl Decode<Picture> for SvgReader {
    fn decode(&self, path: &Path) -> Result<Picture, CodecError> {
        let data = std::fs::read(path)?;
        let options = usvg::Options {
            resources_dir: path.parent().map(Path::to_path_buf),
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_data(&data, &options)?;
        Ok(Picture::Vector(tree))
    }
}

/// Render `tree` at `scale` into a premultiplied pixmap.
pub fn render(tree: &usvg::Tree, scale: f32) -> Result<Pixmap, CodecError> {
    let size = tree
        .size()
        .to_int_size()
        .scale_by(scale)
        .ok_or_else(|| CodecError::malformed("SVG", "drawing has no area at this scale"))?;
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| CodecError::malformed("SVG", "cannot allocate render target"))?;
    resvg::render(tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Render to straight (non-premultiplied) RGBA.
pub fn render_rgba(tree: &usvg::Tree, scale: f32) -> Result<RgbaImage, CodecError> {
    let pixmap = render(tree, scale)?;
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| CodecError::malformed("SVG", "rendered buffer has the wrong size"))
}

/// Render and flatten onto a white background: packed RGB rows.
fn render_on_white(tree: &usvg::Tree, scale: f32) -> Result<(u32, u32, Vec<u8>), CodecError> {
    let pixmap = render(tree, scale)?;
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            // Premultiplied: over-white is c + (255 - a).
            let white = 255 - p.alpha();
            [p.red() + white, p.green() + white, p.blue() + white]
        })
        .collect();
    Ok((pixmap.width(), pixmap.height(), data))
}

/// Writes SVG input as a one-page PDF.
pub struct SvgPdfWriter {
    scale: f32,
}

impl SvgPdfWriter {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl Encode<Picture> for SvgPdfWriter {
    fn encode(&self, picture: &Picture, out: &mut dyn Sink) -> Result<(), CodecError> {
        let Picture::Vector(tree) = picture else {
            return Err(CodecError::Unsupported("PDF output needs SVG input".into()));
        };

        let (px_w, px_h, rgb) = render_on_white(tree, self.scale)?;
        let page_w = tree.size().width() * PT_PER_PX;
        let page_h = tree.size().height() * PT_PER_PX;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(px_w),
                "Height" => i64::from(px_h),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => Object::Integer(8),
            },
            rgb,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(page_w.into()),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page_h.into()),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_w.into()),
            Object::Real(page_h.into()),
        ];
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "MediaBox" => media_box.clone(),
        });

        finish_document(&mut doc, pages_id, vec![page_id.into()], media_box, out)
    }

    fn accepts(&self, picture: &Picture) -> bool {
        picture.is_vector()
    }
}
