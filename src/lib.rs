//! # pagemill
//!
//! Batch conversion between PDFs and images, as a library, a CLI, and an
//! embedded web UI.
//!
//! ## Why this crate?
//!
//! The same four conversions come up together constantly — rasterise a PDF
//! into page images, bundle loose images back into a PDF, change image
//! formats, and shrink everything on the way through. This crate does all of
//! them behind one configuration struct, with a best-effort batch policy: a
//! corrupt upload is reported and skipped, never allowed to sink the rest of
//! the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! uploads
//!  │
//!  ├─ 1. Input     sniff magic bytes, route PDF vs image
//!  ├─ 2. Raster    rasterise PDF pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Transform Lanczos3 resize (percent / exact / fit)
//!  ├─ 4. Encode    JPEG / PNG / WebP / BMP via the image crate
//!  ├─ 5. Assemble  images → multi-page PDF (when the target is pdf)
//!  └─ 6. Archive   one download, zipped when there is more than one output
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagemill::{convert_batch, ConversionConfig, OutputFormat, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = vec![UploadedFile::new(
//!         "report.pdf",
//!         std::fs::read("report.pdf")?,
//!     )];
//!     let config = ConversionConfig::builder()
//!         .format(OutputFormat::Png)
//!         .dpi(300)
//!         .build()?;
//!
//!     let output = convert_batch(files, &config).await?;
//!     for file in &output.outputs {
//!         std::fs::write(&file.name, &file.bytes)?;
//!     }
//!     for failure in &output.failures {
//!         eprintln!("skipped: {}", failure.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagemill` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pagemill = { version = "0.3", default-features = false }
//! ```
//!
//! ## The pdfium runtime
//!
//! PDF rasterisation and assembly need a pdfium shared library at runtime.
//! The binding order is `PDFIUM_LIB_PATH`, the current directory, `./lib`,
//! the executable's directory, then the system library path. Image-only
//! batches run without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::OutputFile;
pub use batch::{convert_batch, BatchOutput, BatchReport, BatchStats, FileFailure};
pub use config::{
    ConversionConfig, ConversionConfigBuilder, OutputFormat, PageSelection, ResizeMode,
};
pub use error::{FileError, PagemillError};
pub use pipeline::input::UploadedFile;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
