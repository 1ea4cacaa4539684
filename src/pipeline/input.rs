//! Input classification: sniff uploaded bytes by magic number.
//!
//! Browsers and shells both lie about file types, so routing decisions are
//! made on the leading bytes, never on the file extension. Unrecognised
//! bytes become a per-file [`crate::error::FileError::Unsupported`] failure
//! rather than a pdfium or image-decoder crash further down the pipeline.

use std::path::Path;

/// One uploaded (or CLI-supplied) file: a name and its raw bytes.
///
/// The only data entity in the system. Transient and in-memory; identity is
/// the caller-supplied file name, which also seeds output naming.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// What the leading bytes of an upload say it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `%PDF` header.
    Pdf,
    /// Any image format the pipeline can decode.
    Image,
}

/// Classify bytes by magic number.
///
/// Recognises PDF, JPEG, PNG, WebP, BMP and GIF. Returns `None` for
/// anything else (including empty or truncated uploads).
pub fn sniff_kind(bytes: &[u8]) -> Option<InputKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(InputKind::Pdf);
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(InputKind::Image); // JPEG
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some(InputKind::Image);
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(InputKind::Image);
    }
    if bytes.starts_with(b"BM") {
        return Some(InputKind::Image);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(InputKind::Image);
    }
    None
}

/// The first bytes of an upload, for error reporting.
pub fn magic_prefix(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().take(4).copied().collect()
}

/// The file name without its final extension, for output naming.
///
/// Falls back to the whole name when there is no stem (e.g. ".pdf").
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_pdf() {
        assert_eq!(sniff_kind(b"%PDF-1.7\n..."), Some(InputKind::Pdf));
    }

    #[test]
    fn sniffs_common_image_formats() {
        assert_eq!(sniff_kind(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some(InputKind::Image));
        assert_eq!(
            sniff_kind(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(InputKind::Image)
        );
        assert_eq!(sniff_kind(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some(InputKind::Image));
        assert_eq!(sniff_kind(b"BM\x00\x00"), Some(InputKind::Image));
        assert_eq!(sniff_kind(b"GIF89a...."), Some(InputKind::Image));
    }

    #[test]
    fn rejects_unknown_and_truncated_bytes() {
        assert_eq!(sniff_kind(b"hello world"), None);
        assert_eq!(sniff_kind(b""), None);
        // RIFF container that is not WebP
        assert_eq!(sniff_kind(b"RIFF\x10\x00\x00\x00WAVEfmt "), None);
    }

    #[test]
    fn extension_is_ignored() {
        // A text file renamed to .pdf is still not a PDF.
        assert_eq!(sniff_kind(b"not really a pdf"), None);
    }

    #[test]
    fn file_stem_strips_one_extension() {
        assert_eq!(file_stem("report.pdf"), "report");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }
}
