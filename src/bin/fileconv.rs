//! CLI binary for edgequake-fileconv.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_fileconv::{
    convert_batch, BatchProgressCallback, ConversionConfig, ConversionRequest, Converter, Domain,
    FileReport, PageSize, PdfLayout, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files finish out of order when converted concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, index: usize, _total: usize, input: &Path) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(file_name(input));
    }

    fn on_file_complete(&self, index: usize, total: usize, input: &Path, output: &Path) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {} → {}  {}",
            green("✓"),
            index,
            total,
            file_name(input),
            output.display(),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, input: &Path, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 100 {
            error.chars().take(99).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            file_name(input),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) converted  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Text to PDF, next to the input (report_converted.pdf)
  fileconv report.txt --to pdf

  # Several files into one directory, 8 at a time
  fileconv *.docx --to odt --out-dir converted/ -c 8

  # Explicit output name (single input only)
  fileconv logo.svg --to png -o logo@2x.png --svg-scale 2

  # Rich-text output through pandoc
  fileconv notes.txt --to docx --pandoc /usr/bin/pandoc

  # Machine-readable results
  fileconv a.rtf b.html --to txt --json

  # What can be converted to what
  fileconv --list-formats

NOTES:
  Documents are converted through plain text: formatting, images and
  tables are not carried over. SVG input can only be written as PNG or PDF.

ENVIRONMENT VARIABLES:
  Every flag can also be set as FILECONV_<FLAG>, e.g. FILECONV_TO=pdf,
  FILECONV_OUT_DIR=out, FILECONV_JPEG_QUALITY=90.
  RUST_LOG overrides the log filter.
"#;

/// Convert documents and images between formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert documents and images between formats",
    long_about = "Convert text documents (txt, docx, odt, rtf, html, pdf, doc) and images \
(jpeg, png, gif, bmp, tiff, svg) between formats. Outputs are named \
<input>_converted.<ext> unless -o is given.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to convert.
    #[arg(required_unless_present = "list_formats")]
    inputs: Vec<PathBuf>,

    /// Target format extension (pdf, docx, png, ...).
    #[arg(short, long, env = "FILECONV_TO", required_unless_present = "list_formats")]
    to: Option<String>,

    /// Directory for the converted files. Default: next to each input.
    #[arg(long, env = "FILECONV_OUT_DIR", conflicts_with = "output")]
    out_dir: Option<PathBuf>,

    /// Exact output path. Only valid with a single input.
    #[arg(short, long, env = "FILECONV_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of files converted in parallel.
    #[arg(short, long, env = "FILECONV_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// JPEG quality (1–100).
    #[arg(long, env = "FILECONV_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Scale factor for rendering SVG input (0.1–10).
    #[arg(long, env = "FILECONV_SVG_SCALE", default_value_t = 1.0)]
    svg_scale: f32,

    /// Do not load system fonts for SVG text.
    #[arg(long, env = "FILECONV_NO_SYSTEM_FONTS")]
    no_system_fonts: bool,

    /// Page size for generated text PDFs.
    #[arg(long, env = "FILECONV_PAGE_SIZE", value_enum, default_value = "letter")]
    page_size: PageSizeArg,

    /// Use this pandoc binary for DOCX/ODT/RTF/HTML output.
    #[arg(long, env = "FILECONV_PANDOC")]
    pandoc: Option<PathBuf>,

    /// Print one JSON record per file instead of log lines.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// List readable and writable formats, then exit.
    #[arg(long)]
    list_formats: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PageSizeArg {
    Letter,
    A4,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::A4 => PageSize::A4,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_formats;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let converter = Arc::new(Converter::new(config));

    // ── List-formats mode ────────────────────────────────────────────────
    if cli.list_formats {
        print_formats(&converter);
        return Ok(());
    }

    let requests = build_requests(&cli)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    // ── Run conversions ──────────────────────────────────────────────────
    let items = convert_batch(converter, requests, None, progress_cb).await;
    let failed = items.iter().filter(|i| !i.is_ok()).count();

    if cli.json {
        let reports: Vec<FileReport> = items.iter().map(|i| i.report()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialise results")?
        );
    } else if !cli.quiet && !show_progress {
        // Only print per-file lines when the progress callback is disabled.
        for item in &items {
            match &item.result {
                Ok(out) => eprintln!("{} → {}", item.input.display(), out.display()),
                Err(e) => eprintln!("{} {}", red("error:"), e),
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} conversion(s) failed", failed, items.len());
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let layout = PdfLayout {
        page_size: cli.page_size.clone().into(),
        ..PdfLayout::default()
    };

    let mut builder = ConversionConfig::builder()
        .jpeg_quality(cli.jpeg_quality)
        .svg_scale(cli.svg_scale)
        .svg_system_fonts(!cli.no_system_fonts && !cli.list_formats)
        .pdf_layout(layout)
        .concurrency(cli.concurrency);

    if let Some(ref pandoc) = cli.pandoc {
        builder = builder.pandoc_path(pandoc);
    }

    builder.build().context("Invalid configuration")
}

/// One request per input, honouring `-o` / `--out-dir`.
fn build_requests(cli: &Cli) -> Result<Vec<ConversionRequest>> {
    let target = cli.to.clone().context("--to is required")?;

    if let Some(ref output) = cli.output {
        if cli.inputs.len() != 1 {
            anyhow::bail!("-o/--output needs exactly one input (got {})", cli.inputs.len());
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        return Ok(vec![ConversionRequest::to_file(&cli.inputs[0], target, output)]);
    }

    if let Some(ref dir) = cli.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    Ok(cli
        .inputs
        .iter()
        .map(|input| match cli.out_dir {
            Some(ref dir) => ConversionRequest::new(input, target.as_str(), dir),
            None => ConversionRequest::beside_input(input, target.as_str()),
        })
        .collect())
}

fn print_formats(converter: &Converter) {
    for domain in [Domain::Document, Domain::Image] {
        let inputs: Vec<&str> = converter
            .supported_inputs()
            .into_iter()
            .filter(|(d, _)| *d == domain)
            .map(|(_, ext)| ext)
            .collect();
        println!("{}", bold(&format!("{domain}s")));
        println!("  read:   {}", inputs.join(", "));
        println!("  write:  {}", converter.supported_outputs(domain).join(", "));
    }
    println!("{}", dim("SVG input converts to png or pdf only."));
}
