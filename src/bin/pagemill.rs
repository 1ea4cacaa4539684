//! CLI binary for pagemill.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes results to disk.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pagemill::{
    convert_batch, server, BatchProgressCallback, ConversionConfig, OutputFormat, PageSelection,
    ProgressCallback, ResizeMode, UploadedFile,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

/// Truncate long error messages to keep output tidy.
///
/// Counts chars, not bytes: messages embed upload filenames, which can be
/// non-ASCII, and a byte-offset slice could land mid-codepoint.
fn truncate_message(error: &str) -> String {
    if error.chars().count() > 80 {
        let head: String = error.chars().take(79).collect();
        format!("{head}\u{2026}")
    } else {
        error.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across the batch plus a per-file
/// log line as each file finishes or fails.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  \
                 ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, output_count: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!(
                "{output_count} output{}",
                if output_count == 1 { "" } else { "s" }
            )),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let msg = truncate_message(error);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let failed = total_files.saturating_sub(converted);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterise a PDF to JPEGs (one per page) in the current directory
  pagemill convert report.pdf

  # PDF to PNGs at 300 DPI, half size, into ./out
  pagemill convert --format png --dpi 300 --resize-percent 50 -o out report.pdf

  # Pages 1-5 only
  pagemill convert --pages 1-5 report.pdf

  # Bundle several images into a single PDF
  pagemill convert --format pdf --zip scans.zip page1.png page2.png page3.png

  # Convert a mixed batch, ZIP the results
  pagemill convert --zip converted.zip *.pdf *.png

  # Machine-readable summary
  pagemill convert --json --quiet report.pdf

  # Run the web UI on port 8080
  pagemill serve --addr 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium shared library

SETUP:
  PDF input and output need a pdfium shared library at runtime. Place
  libpdfium next to the executable, in ./lib, or system-wide, or point
  PDFIUM_LIB_PATH at an existing copy. Image-only batches need nothing.
"#;

/// Convert PDFs and images between formats, in batches.
#[derive(Parser, Debug)]
#[command(
    name = "pagemill",
    version,
    about = "Convert PDFs and images between formats, in batches",
    long_about = "Batch conversion between PDFs and images: rasterise PDF pages to \
JPEG/PNG/WebP/BMP, assemble images into PDFs, change image formats, and resize on the \
way through. Failing files are reported and skipped; the rest of the batch completes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a batch of files.
    Convert(ConvertArgs),
    /// Run the web UI.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Input files (PDF, JPEG, PNG, WebP, BMP, GIF).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: jpg, png, webp, bmp, or pdf.
    #[arg(short, long, env = "PAGEMILL_FORMAT", default_value = "jpg")]
    format: String,

    /// Rasterisation DPI for PDF pages (72–400).
    #[arg(long, env = "PAGEMILL_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PAGEMILL_QUALITY", default_value_t = 92,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Scale every output to this percentage of its original size.
    #[arg(long, env = "PAGEMILL_RESIZE_PERCENT")]
    resize_percent: Option<u32>,

    /// Page selection for PDF inputs: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PAGEMILL_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAGEMILL_PASSWORD")]
    password: Option<String>,

    /// Directory to write outputs into (created if missing).
    #[arg(short, long, env = "PAGEMILL_OUTPUT_DIR", default_value = ".",
          conflicts_with = "zip")]
    out_dir: PathBuf,

    /// Write all outputs into a single ZIP archive at this path.
    #[arg(long, env = "PAGEMILL_ZIP")]
    zip: Option<PathBuf>,

    /// Print a JSON summary of the batch to stdout.
    #[arg(long, env = "PAGEMILL_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PAGEMILL_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGEMILL_QUIET")]
    quiet: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEMILL_VERBOSE")]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PAGEMILL_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEMILL_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => run_convert(args).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    init_logging(if args.verbose { "debug" } else { "info" });
    server::serve(args.addr)
        .await
        .context("Server failed")?;
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !args.quiet && !args.no_progress;
    let filter = if args.verbose {
        "debug"
    } else if args.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    init_logging(filter);

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadedFile::new(name, bytes));
    }

    let config = build_config(&args, show_progress)?;

    let output = convert_batch(files, &config)
        .await
        .context("Conversion failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output.report())
            .context("Failed to serialise summary")?;
        println!("{json}");
    }

    let stats = output.stats.clone();
    let failures = output.failures.clone();

    if let Some(ref zip_path) = args.zip {
        let bytes = output.into_zip().context("Failed to write archive")?;
        tokio::fs::write(zip_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", zip_path.display()))?;
        if !args.quiet {
            eprintln!(
                "{} {} outputs  {}ms  →  {}",
                green("✔"),
                stats.output_count,
                stats.total_duration_ms,
                bold(&zip_path.display().to_string()),
            );
        }
    } else {
        tokio::fs::create_dir_all(&args.out_dir)
            .await
            .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
        for file in &output.outputs {
            let path = args.out_dir.join(&file.name);
            tokio::fs::write(&path, &file.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        if !args.quiet && !show_progress {
            eprintln!(
                "Converted {}/{} files ({} outputs) in {}ms",
                stats.converted_files,
                stats.total_files,
                stats.output_count,
                stats.total_duration_ms
            );
        }
    }

    // The progress callback already printed per-file errors; without it,
    // list the skipped files here.
    if !args.quiet && !show_progress {
        for failure in &failures {
            eprintln!("  {} {}", red("✗"), failure.error);
        }
    }

    if !failures.is_empty() && output_is_strict() {
        std::process::exit(2);
    }
    Ok(())
}

/// Partial success exits 0 by default; set PAGEMILL_STRICT=1 to exit 2
/// when any file was skipped.
fn output_is_strict() -> bool {
    std::env::var("PAGEMILL_STRICT").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &ConvertArgs, show_progress: bool) -> Result<ConversionConfig> {
    let format: OutputFormat = args.format.parse().context("Invalid output format")?;
    let pages = parse_pages(&args.pages)?;

    let mut builder = ConversionConfig::builder()
        .format(format)
        .dpi(args.dpi)
        .quality(args.quality)
        .pages(pages);

    if let Some(percent) = args.resize_percent {
        if percent != 100 {
            builder = builder.resize(ResizeMode::Percent(percent));
        }
    }
    if let Some(ref password) = args.password {
        builder = builder.password(password.clone());
    }
    if show_progress {
        let cb = CliProgressCallback::new();
        builder = builder.progress(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_variants() {
        assert!(matches!(parse_pages("all").unwrap(), PageSelection::All));
        assert!(matches!(
            parse_pages("5").unwrap(),
            PageSelection::Single(5)
        ));
        assert!(matches!(
            parse_pages("3-15").unwrap(),
            PageSelection::Range(3, 15)
        ));
        assert!(matches!(
            parse_pages("1,3,5").unwrap(),
            PageSelection::Set(ref v) if v == &vec![1, 3, 5]
        ));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // A filename like "fé.pdf" puts multibyte chars in the message;
        // truncation must never split one.
        let long = format!("'{}' is a corrupt PDF: {}", "fé.pdf", "é".repeat(120));
        let msg = truncate_message(&long);
        assert_eq!(msg.chars().count(), 80);
        assert!(msg.ends_with('\u{2026}'));

        let short = "'fé.pdf' is a corrupt PDF";
        assert_eq!(truncate_message(short), short);
    }

    #[test]
    fn error_callback_survives_multibyte_messages() {
        let cb = CliProgressCallback::new();
        cb.on_batch_start(1);
        cb.on_file_start(1, 1, "fé.pdf");
        cb.on_file_error(1, 1, "fé.pdf", &"é".repeat(120));
        cb.bar.finish_and_clear();
    }

    #[test]
    fn parse_pages_rejects_nonsense() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-3").is_err());
        assert!(parse_pages("1,x,3").is_err());
        assert!(parse_pages("abc").is_err());
    }
}
