//! Integration tests over the public API.
//!
//! Every fixture is generated on the fly (documents through the converter
//! itself, images through `image`), so no binary files live in the repo.
//!
//! Run with:
//!   cargo test --test conversions

use edgequake_fileconv::{
    convert_async, convert_batch, ConversionConfig, ConversionRequest, ConvertError, Converter, Destination,
    Domain,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

const SAMPLE_TEXT: &str = "Hello\nWorld";

const SAMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
  <rect x="5" y="5" width="30" height="20" fill="#3366cc"/>
</svg>"##;

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn converter() -> Converter {
    init_tracing();
    Converter::new(
        ConversionConfig::builder()
            .svg_system_fonts(false)
            .build()
            .unwrap(),
    )
}

fn write_txt(dir: &Path) -> PathBuf {
    let path = dir.join("sample.txt");
    std::fs::write(&path, SAMPLE_TEXT).unwrap();
    path
}

/// Word 97 file with a single compressed (cp1252) piece.
fn write_doc(path: &Path, text: &[u8]) {
    const TEXT_AT: usize = 0x0800;
    const FC_COMPRESSED: u32 = 0x4000_0000;

    let mut word = vec![0u8; TEXT_AT + text.len()];
    word[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
    // fWhichTblStm: piece table lives in 1Table.
    word[0x0A..0x0C].copy_from_slice(&0x0200u16.to_le_bytes());
    word[0x4C..0x50].copy_from_slice(&(text.len() as u32).to_le_bytes());
    word[TEXT_AT..].copy_from_slice(text);

    let mut plc = Vec::new();
    plc.extend_from_slice(&0u32.to_le_bytes());
    plc.extend_from_slice(&(text.len() as u32).to_le_bytes());
    plc.extend_from_slice(&[0, 0]);
    plc.extend_from_slice(&((TEXT_AT as u32 * 2) | FC_COMPRESSED).to_le_bytes());
    plc.extend_from_slice(&[0, 0]);

    let mut table = vec![0x02];
    table.extend_from_slice(&(plc.len() as u32).to_le_bytes());
    table.extend_from_slice(&plc);

    word[0x1A2..0x1A6].copy_from_slice(&0u32.to_le_bytes());
    word[0x1A6..0x1AA].copy_from_slice(&(table.len() as u32).to_le_bytes());

    let mut comp = cfb::create(path).unwrap();
    comp.create_stream("/WordDocument").unwrap().write_all(&word).unwrap();
    comp.create_stream("/1Table").unwrap().write_all(&table).unwrap();
    comp.flush().unwrap();
}

/// One `sample.<ext>` per readable document format.
fn document_fixtures(c: &Converter, dir: &Path) -> Vec<PathBuf> {
    let txt = write_txt(dir);
    let mut inputs = vec![txt.clone()];
    for ext in ["docx", "pdf", "rtf", "html", "odt"] {
        let path = dir.join(format!("sample.{ext}"));
        c.convert(&ConversionRequest::to_file(&txt, ext, &path)).unwrap();
        inputs.push(path);
    }
    let doc = dir.join("sample.doc");
    write_doc(&doc, b"Hello\rWorld\r");
    inputs.push(doc);
    inputs
}

fn gradient() -> RgbImage {
    RgbImage::from_fn(16, 12, |x, y| Rgb([(x * 16) as u8, (y * 20) as u8, 128]))
}

fn translucent() -> RgbaImage {
    RgbaImage::from_fn(16, 12, |x, _| Rgba([200, 40, 40, if x < 8 { 255 } else { 96 }]))
}

/// One `sample.<ext>` per raster format, plus `sample.svg`.
fn image_fixtures(dir: &Path) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for ext in ["jpeg", "bmp", "tiff"] {
        let path = dir.join(format!("sample.{ext}"));
        DynamicImage::ImageRgb8(gradient()).save(&path).unwrap();
        inputs.push(path);
    }
    for ext in ["png", "gif"] {
        let path = dir.join(format!("sample.{ext}"));
        DynamicImage::ImageRgba8(translucent()).save(&path).unwrap();
        inputs.push(path);
    }
    let svg = dir.join("sample.svg");
    std::fs::write(&svg, SAMPLE_SVG).unwrap();
    inputs.push(svg);
    inputs
}

fn text_of(c: &Converter, path: &Path, scratch: &Path) -> String {
    let out = scratch.join(format!(
        "readback-{}.txt",
        path.extension().unwrap().to_string_lossy()
    ));
    c.convert(&ConversionRequest::to_file(path, "txt", &out)).unwrap();
    std::fs::read_to_string(out).unwrap()
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Documents ────────────────────────────────────────────────────────────────

#[test]
fn every_document_pair_converts_and_keeps_text() {
    let c = converter();
    let fixtures = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let inputs = document_fixtures(&c, fixtures.path());
    assert_eq!(inputs.len(), c.supported_inputs().iter().filter(|(d, _)| *d == Domain::Document).count());

    for input in &inputs {
        let out_dir = tempfile::tempdir().unwrap();
        for target in c.supported_outputs(Domain::Document) {
            let out = c
                .convert(&ConversionRequest::new(input, target, out_dir.path()))
                .unwrap_or_else(|e| panic!("{} → {target}: {e}", input.display()));
            assert_eq!(out, out_dir.path().join(format!("sample_converted.{target}")));
            assert!(std::fs::metadata(&out).unwrap().len() > 0);

            let text = text_of(&c, &out, scratch.path());
            assert!(
                text.contains("Hello") && text.contains("World"),
                "{} → {target} lost the text: {text:?}",
                input.display()
            );
        }
    }
}

#[test]
fn report_txt_to_html() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.txt");
    std::fs::write(&input, "Hello\nWorld").unwrap();
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();

    let out = converter()
        .convert(&ConversionRequest::new(&input, ".html", &out_dir))
        .unwrap();
    assert_eq!(out, out_dir.join("report_converted.html"));
    assert_eq!(
        std::fs::read_to_string(out).unwrap(),
        "<html><body><p>Hello<br>World</p></body></html>"
    );
}

#[test]
fn txt_html_txt_round_trip() {
    let c = converter();
    let dir = tempfile::tempdir().unwrap();

    for (i, text) in [
        "Fish & chips <3\nsecond line\n\nnew paragraph",
        "a  b",
        "    indented code\nx",
        "one\n\n\n\ntwo",
        "name:\tvalue\n  - item  \n",
    ]
    .into_iter()
    .enumerate()
    {
        let input = dir.path().join(format!("notes{i}.txt"));
        std::fs::write(&input, text).unwrap();

        let html = c.convert(&ConversionRequest::new(&input, "html", dir.path())).unwrap();
        let back = c
            .convert(&ConversionRequest::to_file(&html, "txt", dir.path().join(format!("back{i}.txt"))))
            .unwrap();
        assert_eq!(std::fs::read_to_string(back).unwrap(), text, "round trip of {text:?}");
    }
}

#[test]
fn repeated_conversions_are_byte_identical() {
    let c = converter();
    let dir = tempfile::tempdir().unwrap();
    let input = write_txt(dir.path());

    for target in ["docx", "odt", "pdf", "rtf"] {
        let out = c.convert(&ConversionRequest::new(&input, target, dir.path())).unwrap();
        let first = std::fs::read(&out).unwrap();
        let again = c.convert(&ConversionRequest::new(&input, target, dir.path())).unwrap();
        assert_eq!(out, again);
        assert_eq!(first, std::fs::read(&again).unwrap(), "{target} output differs");
    }
}

#[test]
fn corrupt_pdf_is_a_read_failure_with_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.pdf");
    std::fs::write(&input, b"\x00\x01 truncated download \xff\xfe").unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let err = converter()
        .convert(&ConversionRequest::new(&input, "txt", out_dir.path()))
        .unwrap_err();
    assert!(matches!(err, ConvertError::ReadFailure { .. }), "got {err:?}");
    assert!(dir_entries(out_dir.path()).is_empty());
}

#[test]
fn unsupported_formats_leave_no_output() {
    let c = converter();
    let dir = tempfile::tempdir().unwrap();
    let input = write_txt(dir.path());
    let unknown = dir.path().join("data.xyz");
    std::fs::write(&unknown, "x").unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let err = c
        .convert(&ConversionRequest::new(&unknown, "txt", out_dir.path()))
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedInputFormat { .. }));

    let err = c
        .convert(&ConversionRequest::new(&input, "xyz", out_dir.path()))
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedOutputFormat { .. }));

    // doc is read-only.
    let err = c
        .convert(&ConversionRequest::new(&input, "doc", out_dir.path()))
        .unwrap_err();
    assert!(err.is_unsupported());

    assert!(dir_entries(out_dir.path()).is_empty());

    // Still usable afterwards.
    c.convert(&ConversionRequest::new(&input, "html", out_dir.path())).unwrap();
}

#[test]
fn missing_output_directory_is_a_write_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_txt(dir.path());
    let err = converter()
        .convert(&ConversionRequest::new(&input, "html", dir.path().join("nope")))
        .unwrap_err();
    assert!(matches!(err, ConvertError::WriteFailure { .. }), "got {err:?}");
}

#[test]
fn beside_input_writes_next_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_txt(dir.path());
    let request = ConversionRequest::beside_input(&input, "rtf");
    assert_eq!(request.destination, Destination::Directory(dir.path().to_path_buf()));
    let out = converter().convert(&request).unwrap();
    assert_eq!(out, dir.path().join("sample_converted.rtf"));
}

// ── Images ───────────────────────────────────────────────────────────────────

#[test]
fn every_raster_pair_converts() {
    let c = converter();
    let fixtures = tempfile::tempdir().unwrap();
    let rasters: Vec<PathBuf> = image_fixtures(fixtures.path())
        .into_iter()
        .filter(|p| p.extension().unwrap() != "svg")
        .collect();

    for input in &rasters {
        let out_dir = tempfile::tempdir().unwrap();
        for target in ["jpeg", "png", "gif", "bmp", "tiff"] {
            let out = c
                .convert(&ConversionRequest::new(input, target, out_dir.path()))
                .unwrap_or_else(|e| panic!("{} → {target}: {e}", input.display()));
            let img = image::open(&out).unwrap();
            assert_eq!((img.width(), img.height()), (16, 12), "{} → {target}", input.display());
        }
    }
}

#[test]
fn raster_to_pdf_is_unsupported() {
    let fixtures = tempfile::tempdir().unwrap();
    let png = fixtures.path().join("sample.png");
    DynamicImage::ImageRgba8(translucent()).save(&png).unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let err = converter()
        .convert(&ConversionRequest::new(&png, "pdf", out_dir.path()))
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedOutputFormat { .. }), "got {err:?}");
    assert!(dir_entries(out_dir.path()).is_empty());
}

#[test]
fn svg_goes_to_png_and_pdf_only() {
    let c = converter();
    let dir = tempfile::tempdir().unwrap();
    let svg = dir.path().join("photo.svg");
    std::fs::write(&svg, SAMPLE_SVG).unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let png = c.convert(&ConversionRequest::new(&svg, "png", out_dir.path())).unwrap();
    assert_eq!(png, out_dir.path().join("photo_converted.png"));
    let img = image::open(&png).unwrap();
    assert_eq!((img.width(), img.height()), (40, 30));

    let pdf = c.convert(&ConversionRequest::new(&svg, "pdf", out_dir.path())).unwrap();
    assert!(std::fs::read(pdf).unwrap().starts_with(b"%PDF-"));

    for target in ["bmp", "jpeg", "gif", "tiff"] {
        let err = c
            .convert(&ConversionRequest::new(&svg, target, out_dir.path()))
            .unwrap_err();
        assert!(
            matches!(err, ConvertError::UnsupportedOutputFormat { .. }),
            "svg → {target}: {err:?}"
        );
    }
    assert_eq!(
        dir_entries(out_dir.path()),
        vec!["photo_converted.pdf", "photo_converted.png"]
    );
}

#[test]
fn svg_scale_changes_png_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let svg = dir.path().join("icon.svg");
    std::fs::write(&svg, SAMPLE_SVG).unwrap();
    let c = Converter::new(
        ConversionConfig::builder()
            .svg_scale(2.0)
            .svg_system_fonts(false)
            .build()
            .unwrap(),
    );
    let png = c.convert(&ConversionRequest::new(&svg, "png", dir.path())).unwrap();
    let img = image::open(png).unwrap();
    assert_eq!((img.width(), img.height()), (80, 60));
}

// ── Async ────────────────────────────────────────────────────────────────────

#[test]
fn async_conversion_outside_tokio_main() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_txt(dir.path());
    let request = ConversionRequest::new(&input, "odt", dir.path());

    let out = tokio_test::block_on(convert_async(Arc::new(converter()), request)).unwrap();
    assert_eq!(out, dir.path().join("sample_converted.odt"));
}

#[tokio::test]
async fn batch_mixes_domains_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = image_fixtures(dir.path());
    let txt = write_txt(dir.path());

    let mut requests: Vec<ConversionRequest> = inputs
        .iter()
        .map(|p| {
            let ext = p.extension().unwrap().to_string_lossy();
            ConversionRequest::to_file(p, "png", out_dir.path().join(format!("from-{ext}.png")))
        })
        .collect();
    requests.push(ConversionRequest::new(&txt, "pdf", out_dir.path()));
    requests.push(ConversionRequest::new(dir.path().join("missing.txt"), "pdf", out_dir.path()));

    let items = convert_batch(Arc::new(converter()), requests, Some(4), None).await;
    assert_eq!(items.len(), 8);
    assert!(items[..7].iter().all(|i| i.is_ok()));
    assert!(matches!(items[7].result, Err(ConvertError::ReadFailure { .. })));

    let report = serde_json::to_value(items[7].report()).unwrap();
    assert!(report.get("output").is_none());
    assert!(report["error"].as_str().unwrap().contains("missing.txt"));
}
