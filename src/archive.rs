//! ZIP bundling for batch downloads.
//!
//! One deflated entry per successful output. Entry names are assigned by the
//! batch layer and deduplicated here deterministically: a colliding name gets
//! a `_2`, `_3`, … suffix before the extension, in insertion order, so two
//! uploads that share a base name can never overwrite each other inside the
//! archive.

use crate::error::PagemillError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One converted output: the archive/download entry name and its bytes.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Bundle outputs into a single deflated ZIP archive in memory.
pub fn write_zip(outputs: &[OutputFile]) -> Result<Vec<u8>, PagemillError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for output in outputs {
        writer.start_file(&output.name, options)?;
        writer.write_all(&output.bytes)?;
    }

    let cursor = writer.finish()?;
    let bytes = cursor.into_inner();
    tracing::info!("Wrote archive: {} entries, {} bytes", outputs.len(), bytes.len());
    Ok(bytes)
}

/// The output name for page `page_num` (1-indexed) of a rasterised PDF.
///
/// Matches the original tool's `{stem}_page{N}.{ext}` convention, which keeps
/// pages of the same document adjacent when the archive is sorted by name.
pub fn page_name(stem: &str, page_num: usize, extension: &str) -> String {
    format!("{stem}_page{page_num}.{extension}")
}

/// Claim `candidate` in `taken`, appending `_2`, `_3`, … before the
/// extension until the name is free.
pub fn unique_name(taken: &mut HashSet<String>, candidate: String) -> String {
    if taken.insert(candidate.clone()) {
        return candidate;
    }

    let (stem, ext) = match candidate.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s.to_string(), Some(e.to_string())),
        _ => (candidate.clone(), None),
    };

    for k in 2.. {
        let attempt = match &ext {
            Some(e) => format!("{stem}_{k}.{e}"),
            None => format!("{stem}_{k}"),
        };
        if taken.insert(attempt.clone()) {
            return attempt;
        }
    }
    unreachable!("the suffix counter is unbounded")
}
