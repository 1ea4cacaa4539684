//! Pipeline stages for batch file conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ raster ───▶ transform ──▶ encode ────▶ (archive)
//! (sniff)   (pdfium)    (Lanczos)     (jpeg/png/…)
//!              │                          ▲
//!              └────────▶ assemble ───────┘
//!                        (images→PDF)
//! ```
//!
//! 1. [`input`]     — classify uploaded bytes by magic number (PDF vs image)
//! 2. [`raster`]    — rasterise selected PDF pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`transform`] — Lanczos resampling per the configured resize mode
//! 4. [`encode`]    — decode image bytes and encode `DynamicImage`s to the
//!    target format
//! 5. [`assemble`]  — compose an ordered image sequence into one PDF; also
//!    `spawn_blocking`

pub mod assemble;
pub mod encode;
pub mod input;
pub mod raster;
pub mod transform;
