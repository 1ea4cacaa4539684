//! Error types for the pagemill library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PagemillError`] — **Fatal**: the batch cannot proceed at all
//!   (invalid configuration, empty batch, no usable pdfium library).
//!   Returned as `Err(PagemillError)` from [`crate::batch::convert_batch`].
//!
//! * [`FileError`] — **Non-fatal**: a single input file failed (corrupt PDF,
//!   unsupported bytes, undecodable image) but the rest of the batch is
//!   fine. Stored inside [`crate::batch::FileFailure`] so callers can
//!   inspect partial success rather than losing the whole batch to one
//!   bad upload.
//!
//! The separation implements the best-effort policy: a failing file is
//! reported and skipped, and processing continues for the remainder.

use thiserror::Error;

/// All fatal errors returned by the pagemill library.
///
/// Per-file failures use [`FileError`] and are collected in
/// [`crate::batch::BatchOutput::failures`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PagemillError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The batch contained no files at all.
    #[error("No input files were provided")]
    EmptyBatch,

    /// Every file in the batch failed; there is nothing to download.
    #[error("All {total} files failed to convert.\nFirst error: {first_error}")]
    AllFilesFailed { total: usize, first_error: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium next to the executable, in ./lib, or system-wide,\n\
or point PDFIUM_LIB_PATH at an existing copy."
    )]
    PdfiumBindingFailed(String),

    /// Writing the ZIP archive failed.
    #[error("Failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Underlying I/O failure (archive buffer, output files, listener).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input file.
///
/// Stored alongside the file name in [`crate::batch::FileFailure`].
/// The batch continues unless ALL files fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The uploaded bytes are neither a PDF nor a supported image format.
    #[error("'{name}' is not a PDF or a supported image (first bytes: {magic:?})")]
    Unsupported { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("'{name}' is a corrupt PDF: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("'{name}' is encrypted and requires a password")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for '{name}'")]
    WrongPassword { name: String },

    /// The page selection matched nothing in this document.
    #[error("'{name}': no pages selected (document has {total} pages)")]
    NoPagesSelected { name: String, total: usize },

    /// pdfium returned an error while rasterising a specific page.
    #[error("'{name}' page {page}: rasterisation failed: {detail}")]
    RenderFailed {
        name: String,
        page: usize,
        detail: String,
    },

    /// The image bytes could not be decoded.
    #[error("'{name}': image decoding failed: {detail}")]
    DecodeFailed { name: String, detail: String },

    /// Encoding to the target format failed.
    #[error("'{name}': encoding to {format} failed: {detail}")]
    EncodeFailed {
        name: String,
        format: String,
        detail: String,
    },

    /// Composing the output PDF failed.
    #[error("'{name}': PDF assembly failed: {detail}")]
    AssembleFailed { name: String, detail: String },

    /// No pdfium library could be bound for this operation.
    ///
    /// [`crate::batch::convert_batch`] escalates this to
    /// [`PagemillError::PdfiumBindingFailed`] — a missing engine is an
    /// environment problem, not a property of the input file.
    #[error("PDF engine unavailable: {detail}")]
    EngineUnavailable { detail: String },
}

impl FileError {
    /// The input file name this failure refers to, when the error carries one.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            FileError::Unsupported { name, .. }
            | FileError::CorruptPdf { name, .. }
            | FileError::PasswordRequired { name }
            | FileError::WrongPassword { name }
            | FileError::NoPagesSelected { name, .. }
            | FileError::RenderFailed { name, .. }
            | FileError::DecodeFailed { name, .. }
            | FileError::EncodeFailed { name, .. }
            | FileError::AssembleFailed { name, .. } => Some(name),
            FileError::EngineUnavailable { .. } => None,
        }
    }
}
