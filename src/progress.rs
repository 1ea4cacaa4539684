//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events as
//! the batch processes each file. The CLI drives its progress bar through
//! this trait; the web surface leaves it unset.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about. The trait is `Send + Sync` because conversion work
//! is offloaded to blocking threads.

use std::sync::Arc;

/// Called by the batch pipeline as it processes each file.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is converted.
    ///
    /// `index` is 1-indexed.
    fn on_file_start(&self, index: usize, total_files: usize, name: &str) {
        let _ = (index, total_files, name);
    }

    /// Called when a file converted successfully.
    ///
    /// `output_count` is the number of outputs it produced (one per PDF page
    /// for raster targets, one per file otherwise).
    fn on_file_complete(&self, index: usize, total_files: usize, name: &str, output_count: usize) {
        let _ = (index, total_files, name, output_count);
    }

    /// Called when a file failed and was skipped.
    fn on_file_error(&self, index: usize, total_files: usize, name: &str, error: &str) {
        let _ = (index, total_files, name, error);
    }

    /// Called once after all files have been attempted.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
