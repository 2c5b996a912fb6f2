//! Raster image codecs on the `image` crate, and the image-domain
//! intermediate representation.

use super::svg;
use crate::error::CodecError;
use crate::format::ImageFormat;
use crate::registry::{Encode, Sink};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use resvg::usvg;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// A decoded image: pixels, or a parsed vector tree that still has to be
/// rendered.
pub enum Picture {
    Raster(DynamicImage),
    Vector(usvg::Tree),
}

impl Picture {
    pub fn is_vector(&self) -> bool {
        matches!(self, Picture::Vector(_))
    }

    /// Pixel size for rasters; intrinsic size (rounded up) for vectors.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Picture::Raster(img) => (img.width(), img.height()),
            Picture::Vector(tree) => {
                let size = tree.size().to_int_size();
                (size.width(), size.height())
            }
        }
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        match self {
            Picture::Raster(img) => write!(f, "Raster({w}x{h}, {:?})", img.color()),
            Picture::Vector(_) => write!(f, "Vector({w}x{h})"),
        }
    }
}

/// Decode any supported raster file. The format is sniffed from content,
/// so a mislabelled extension still decodes.
pub fn read_raster(path: &Path) -> Result<Picture, CodecError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(Picture::Raster(img))
}

/// Encodes to one raster format.
///
/// Pixels are normalised first: RGBA for targets with alpha (PNG, GIF),
/// RGB for the rest. Vector input is accepted by the PNG writer only.
pub struct RasterWriter {
    pub format: ImageFormat,
    pub jpeg_quality: u8,
    pub svg_scale: f32,
}

impl RasterWriter {
    fn normalise(&self, img: &DynamicImage) -> DynamicImage {
        if self.format.supports_alpha() {
            DynamicImage::ImageRgba8(img.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(img.to_rgb8())
        }
    }
}

impl Encode<Picture> for RasterWriter {
    fn encode(&self, picture: &Picture, out: &mut dyn Sink) -> Result<(), CodecError> {
        let img = match picture {
            Picture::Raster(img) => self.normalise(img),
            Picture::Vector(tree) => DynamicImage::ImageRgba8(svg::render_rgba(tree, self.svg_scale)?),
        };

        let format = self
            .format
            .raster()
            .ok_or_else(|| CodecError::Unsupported(format!("{} is not a raster format", self.format)))?;

        let mut buf = Cursor::new(Vec::new());
        match self.format {
            ImageFormat::Jpeg => {
                img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality))?
            }
            _ => img.write_to(&mut buf, format)?,
        }
        out.write_all(buf.get_ref())?;
        Ok(())
    }

    fn accepts(&self, picture: &Picture) -> bool {
        !picture.is_vector() || self.format == ImageFormat::Png
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn checker() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        }))
    }

    fn writer(format: ImageFormat) -> RasterWriter {
        RasterWriter { format, jpeg_quality: 75, svg_scale: 1.0 }
    }

    fn encode(format: ImageFormat, img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        writer(format).encode(&Picture::Raster(img), &mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn png_keeps_alpha() {
        let bytes = encode(ImageFormat::Png, checker());
        let back = image::load_from_memory(&bytes).unwrap();
        assert!(back.color().has_alpha());
        assert_eq!(back.get_pixel(1, 0), Rgba([0, 0, 255, 128]));
    }

    #[test]
    fn jpeg_and_bmp_drop_alpha() {
        for format in [ImageFormat::Jpeg, ImageFormat::Bmp, ImageFormat::Tiff] {
            let bytes = encode(format, checker());
            let back = image::load_from_memory(&bytes).unwrap();
            assert!(!back.color().has_alpha(), "{format}");
            assert_eq!(back.dimensions(), (8, 8));
        }
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8])
        }));
        let mut low = Cursor::new(Vec::new());
        RasterWriter { jpeg_quality: 10, ..writer(ImageFormat::Jpeg) }
            .encode(&Picture::Raster(img.clone()), &mut low)
            .unwrap();
        let mut high = Cursor::new(Vec::new());
        RasterWriter { jpeg_quality: 95, ..writer(ImageFormat::Jpeg) }
            .encode(&Picture::Raster(img), &mut high)
            .unwrap();
        assert!(low.into_inner().len() < high.into_inner().len());
    }

    #[test]
    fn reader_sniffs_content_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.bmp");
        std::fs::write(&path, encode(ImageFormat::Png, checker())).unwrap();
        let picture = read_raster(&path).unwrap();
        assert_eq!(picture.dimensions(), (8, 8));
        assert!(!picture.is_vector());
    }

    #[test]
    fn truncated_file_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.png");
        let bytes = encode(ImageFormat::Png, checker());
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(read_raster(&path), Err(CodecError::Image(_))));
    }
}
