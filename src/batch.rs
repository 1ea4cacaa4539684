//! Batch orchestration: the primary conversion entry point.
//!
//! One linear pass over the uploaded files. Each file is routed by its
//! sniffed kind and the configured target format:
//!
//! | input | target     | route                                          |
//! |-------|------------|------------------------------------------------|
//! | PDF   | image      | rasterise → resize → encode (one per page)     |
//! | PDF   | pdf        | rasterise → resize → reassemble                |
//! | image | image      | decode → resize → encode                       |
//! | image | pdf        | decode → resize → single-page PDF              |
//!
//! ## Failure policy
//!
//! Best-effort partial success: a failing file is recorded as a
//! [`FileFailure`] and the batch continues. No retry, no rollback; a failure
//! never affects other files' outputs. The batch as a whole errs only when
//! the input set is empty, the engine is missing, or every file failed.

use crate::archive::{self, OutputFile};
use crate::config::ConversionConfig;
use crate::error::{FileError, PagemillError};
use crate::pipeline::input::{self, InputKind, UploadedFile};
use crate::pipeline::{assemble, encode, raster, transform};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// A file that failed to convert, with the reason it was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub name: String,
    pub error: FileError,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Files submitted.
    pub total_files: usize,
    /// Files that produced at least one output.
    pub converted_files: usize,
    /// Files skipped with a [`FileFailure`].
    pub failed_files: usize,
    /// Outputs produced across all files (pages count individually).
    pub output_count: usize,
    /// Wall-clock duration of the whole batch.
    pub total_duration_ms: u64,
}

/// Everything a batch run produced.
#[derive(Debug)]
pub struct BatchOutput {
    /// Successful outputs, in input order (pages in page order).
    pub outputs: Vec<OutputFile>,
    /// Files that were skipped, in input order.
    pub failures: Vec<FileFailure>,
    pub stats: BatchStats,
}

/// Serialisable summary of a batch run (for the CLI `--json` report).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub outputs: Vec<String>,
    pub failures: Vec<FileFailure>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// True when at least one file failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Bundle all outputs into a single ZIP archive.
    pub fn into_zip(self) -> Result<Vec<u8>, PagemillError> {
        archive::write_zip(&self.outputs)
    }

    /// Suggested download name for the bundled archive.
    pub fn zip_name(&self) -> String {
        format!("converted_{}_files.zip", self.stats.converted_files)
    }

    /// Summary without the output bytes.
    pub fn report(&self) -> BatchReport {
        BatchReport {
            outputs: self.outputs.iter().map(|o| o.name.clone()).collect(),
            failures: self.failures.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Convert a batch of uploaded files.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchOutput)` on success, even if some files failed
/// (check `output.failures`).
///
/// # Errors
/// Returns `Err(PagemillError)` only for fatal errors:
/// - Empty input set
/// - No usable pdfium library when a file needs one
/// - Every file failed and no output was produced
pub async fn convert_batch(
    files: Vec<UploadedFile>,
    config: &ConversionConfig,
) -> Result<BatchOutput, PagemillError> {
    if files.is_empty() {
        return Err(PagemillError::EmptyBatch);
    }

    let total_start = Instant::now();
    let total_files = files.len();
    tracing::info!(
        "Starting batch: {} files → {}",
        total_files,
        config.format
    );

    if let Some(ref cb) = config.progress {
        cb.on_batch_start(total_files);
    }

    let mut outputs: Vec<OutputFile> = Vec::new();
    let mut failures: Vec<FileFailure> = Vec::new();
    let mut converted_files = 0usize;
    let mut taken_names: HashSet<String> = HashSet::new();

    for (i, file) in files.into_iter().enumerate() {
        let index = i + 1;
        let name = file.name.clone();
        if let Some(ref cb) = config.progress {
            cb.on_file_start(index, total_files, &name);
        }

        match convert_one(&file, config, &mut taken_names).await {
            Ok(mut file_outputs) => {
                converted_files += 1;
                if let Some(ref cb) = config.progress {
                    cb.on_file_complete(index, total_files, &name, file_outputs.len());
                }
                outputs.append(&mut file_outputs);
            }
            Err(FileError::EngineUnavailable { detail }) => {
                // Not a property of the input file; nothing else that needs
                // pdfium can succeed either.
                return Err(PagemillError::PdfiumBindingFailed(detail));
            }
            Err(error) => {
                tracing::warn!("Skipping '{}': {}", name, error);
                if let Some(ref cb) = config.progress {
                    cb.on_file_error(index, total_files, &name, &error.to_string());
                }
                failures.push(FileFailure { name, error });
            }
        }
    }

    if converted_files == 0 {
        let first_error = failures
            .first()
            .map(|f| f.error.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(PagemillError::AllFilesFailed {
            total: total_files,
            first_error,
        });
    }

    let stats = BatchStats {
        total_files,
        converted_files,
        failed_files: failures.len(),
        output_count: outputs.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    tracing::info!(
        "Batch complete: {}/{} files, {} outputs, {}ms",
        converted_files,
        total_files,
        stats.output_count,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_batch_complete(total_files, converted_files);
    }

    Ok(BatchOutput {
        outputs,
        failures,
        stats,
    })
}

/// Convert one file into its outputs, claiming names in `taken`.
async fn convert_one(
    file: &UploadedFile,
    config: &ConversionConfig,
    taken: &mut HashSet<String>,
) -> Result<Vec<OutputFile>, FileError> {
    let stem = input::file_stem(&file.name);
    let ext = config.format.extension();

    match input::sniff_kind(&file.bytes) {
        None => Err(FileError::Unsupported {
            name: file.name.clone(),
            magic: input::magic_prefix(&file.bytes),
        }),

        Some(InputKind::Pdf) => {
            let rendered = raster::rasterize_pdf(&file.name, file.bytes.clone(), config).await?;

            if config.format.is_pdf() {
                // Normalisation pass: rasterise, resize, reassemble.
                let images = rendered
                    .into_iter()
                    .map(|(_, img)| transform::resize(img, &config.resize))
                    .collect();
                let bytes = assemble::images_to_pdf(&file.name, images, config.dpi).await?;
                let name = archive::unique_name(taken, format!("{stem}.{ext}"));
                Ok(vec![OutputFile::new(name, bytes)])
            } else {
                let mut outputs = Vec::with_capacity(rendered.len());
                for (idx, img) in rendered {
                    let resized = transform::resize(img, &config.resize);
                    let bytes = encode::encode_image(&resized, config.format, config.quality)
                        .map_err(|e| FileError::EncodeFailed {
                            name: file.name.clone(),
                            format: config.format.to_string(),
                            detail: e.to_string(),
                        })?;
                    let name =
                        archive::unique_name(taken, archive::page_name(&stem, idx + 1, ext));
                    outputs.push(OutputFile::new(name, bytes));
                }
                Ok(outputs)
            }
        }

        Some(InputKind::Image) => {
            let img = encode::decode_image(&file.bytes).map_err(|e| FileError::DecodeFailed {
                name: file.name.clone(),
                detail: e.to_string(),
            })?;
            let resized = transform::resize(img, &config.resize);

            let bytes = if config.format.is_pdf() {
                assemble::images_to_pdf(&file.name, vec![resized], config.dpi).await?
            } else {
                encode::encode_image(&resized, config.format, config.quality).map_err(|e| {
                    FileError::EncodeFailed {
                        name: file.name.clone(),
                        format: config.format.to_string(),
                        detail: e.to_string(),
                    }
                })?
            };

            let name = archive::unique_name(taken, format!("{stem}.{ext}"));
            Ok(vec![OutputFile::new(name, bytes)])
        }
    }
}
