//! Configuration types for batch conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs between the CLI flags and the web form fields,
//! and to diff two runs to understand why their outputs differ.
//!
//! The source revisions this tool replaces silently disagreed on defaults
//! (150 vs 200 DPI, quality 85 vs 92). One consistent policy is fixed here:
//! 200 DPI and JPEG quality 92.

use crate::error::PagemillError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Configuration for one conversion batch.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pagemill::{ConversionConfig, OutputFormat, ResizeMode};
///
/// let config = ConversionConfig::builder()
///     .format(OutputFormat::Png)
///     .dpi(300)
///     .resize(ResizeMode::Percent(50))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rasterisation DPI used when rendering PDF pages. Range: 72–400. Default: 200.
    ///
    /// 200 is the balance point between sharpness and output size; 300 is
    /// noticeably crisper for small print but roughly doubles the bytes.
    /// Also controls the page size when assembling images into a PDF
    /// (page points = pixels × 72 / dpi), so a PDF rasterised and
    /// reassembled at the same DPI keeps its physical page size.
    pub dpi: u32,

    /// JPEG quality, 1–100. Default: 92.
    ///
    /// Only affects JPEG output; PNG and WebP output is lossless and BMP is
    /// uncompressed.
    pub quality: u8,

    /// Target output format. Default: [`OutputFormat::Jpeg`].
    pub format: OutputFormat,

    /// Resize applied to every decoded/rasterised image. Default: no resize.
    pub resize: ResizeMode,

    /// Page selection for PDF inputs. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional per-file progress callback (used by the CLI progress bar).
    pub progress: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            quality: 92,
            format: OutputFormat::Jpeg,
            resize: ResizeMode::None,
            pages: PageSelection::All,
            password: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("quality", &self.quality)
            .field("format", &self.format)
            .field("resize", &self.resize)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn resize(mut self, resize: ResizeMode) -> Self {
        self.config.resize = resize;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, PagemillError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(PagemillError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.quality == 0 || c.quality > 100 {
            return Err(PagemillError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.quality
            )));
        }
        match c.resize {
            ResizeMode::Percent(0) => {
                return Err(PagemillError::InvalidConfig(
                    "Resize percentage must be at least 1".into(),
                ));
            }
            ResizeMode::Exact { width, height } | ResizeMode::Fit { width, height }
                if width == 0 || height == 0 =>
            {
                return Err(PagemillError::InvalidConfig(format!(
                    "Resize dimensions must be at least 1×1, got {width}×{height}"
                )));
            }
            _ => {}
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target output format for converted files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG, lossy, controlled by [`ConversionConfig::quality`]. (default)
    #[default]
    Jpeg,
    /// PNG, lossless.
    Png,
    /// WebP, lossless (the image crate's WebP encoder).
    WebP,
    /// BMP, uncompressed.
    Bmp,
    /// Multi-page PDF assembled from the input's pages/images.
    Pdf,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// MIME type for the download response.
    pub fn mime(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    /// Whether outputs go through PDF assembly instead of an image encoder.
    pub fn is_pdf(&self) -> bool {
        matches!(self, OutputFormat::Pdf)
    }

    /// The corresponding `image` crate format, for raster targets.
    pub fn as_image_format(&self) -> Option<image::ImageFormat> {
        match self {
            OutputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            OutputFormat::Png => Some(image::ImageFormat::Png),
            OutputFormat::WebP => Some(image::ImageFormat::WebP),
            OutputFormat::Bmp => Some(image::ImageFormat::Bmp),
            OutputFormat::Pdf => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = PagemillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "bmp" => Ok(OutputFormat::Bmp),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(PagemillError::InvalidConfig(format!(
                "Unknown output format '{other}' (expected jpg, png, webp, bmp, or pdf)"
            ))),
        }
    }
}

/// How to resize each image before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Keep original pixel dimensions. (default)
    #[default]
    None,
    /// Scale both dimensions by a percentage. 100 is a no-op.
    Percent(u32),
    /// Resize to exactly `width`×`height`, ignoring aspect ratio.
    Exact { width: u32, height: u32 },
    /// Resize to fit within `width`×`height`, preserving aspect ratio.
    Fit { width: u32, height: u32 },
}

impl ResizeMode {
    /// Compute the target dimensions for a `width`×`height` source.
    ///
    /// Results are clamped to at least 1×1 so tiny images and aggressive
    /// percentages never produce a zero-sized target.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match *self {
            ResizeMode::None | ResizeMode::Percent(100) => (width, height),
            ResizeMode::Percent(p) => {
                let w = (width as u64 * p as u64 / 100) as u32;
                let h = (height as u64 * p as u64 / 100) as u32;
                (w.max(1), h.max(1))
            }
            ResizeMode::Exact {
                width: w,
                height: h,
            } => (w.max(1), h.max(1)),
            ResizeMode::Fit {
                width: max_w,
                height: max_h,
            } => {
                if width <= max_w && height <= max_h {
                    return (width, height);
                }
                let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
                let w = (width as f64 * scale).round() as u32;
                let h = (height as f64 * scale).round() as u32;
                (w.max(1), h.max(1))
            }
        }
    }

    /// True when applying this mode to a `width`×`height` image would change nothing.
    pub fn is_noop(&self, width: u32, height: u32) -> bool {
        self.target_dimensions(width, height) == (width, height)
    }
}

/// Specifies which pages of a PDF input to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_200_dpi_quality_92() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.quality, 92);
        assert_eq!(c.format, OutputFormat::Jpeg);
    }

    #[test]
    fn builder_rejects_out_of_range_dpi() {
        assert!(ConversionConfig::builder().dpi(50).build().is_err());
        assert!(ConversionConfig::builder().dpi(500).build().is_err());
        assert!(ConversionConfig::builder().dpi(72).build().is_ok());
        assert!(ConversionConfig::builder().dpi(400).build().is_ok());
    }

    #[test]
    fn builder_rejects_bad_quality_and_sizes() {
        assert!(ConversionConfig::builder().quality(0).build().is_err());
        assert!(ConversionConfig::builder().quality(101).build().is_err());
        assert!(ConversionConfig::builder()
            .resize(ResizeMode::Percent(0))
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .resize(ResizeMode::Exact {
                width: 0,
                height: 100
            })
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .resize(ResizeMode::Fit {
                width: 800,
                height: 600
            })
            .build()
            .is_ok());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::WebP);
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert!("tiff".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn percent_100_is_identity() {
        let mode = ResizeMode::Percent(100);
        assert_eq!(mode.target_dimensions(640, 480), (640, 480));
        assert!(mode.is_noop(640, 480));
    }

    #[test]
    fn percent_scales_and_clamps() {
        assert_eq!(ResizeMode::Percent(50).target_dimensions(640, 480), (320, 240));
        // Tiny image at 1% never reaches zero
        assert_eq!(ResizeMode::Percent(1).target_dimensions(10, 10), (1, 1));
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        let mode = ResizeMode::Fit {
            width: 100,
            height: 100,
        };
        assert_eq!(mode.target_dimensions(200, 100), (100, 50));
        // Already fits: untouched
        assert_eq!(mode.target_dimensions(80, 60), (80, 60));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }
}
