//! PDF rasterisation: render selected pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## DPI
//!
//! pdfium page geometry is in points (72 per inch). Rendering at `dpi`
//! means scaling every page by `dpi / 72`, so an A4 page (595×842 pt)
//! at 200 DPI comes out as 1654×2339 px.

use crate::config::ConversionConfig;
use crate::error::FileError;
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Bind to a pdfium library, searching next to the executable, in `./lib`,
/// in the working directory, and finally system-wide.
///
/// `PDFIUM_LIB_PATH` overrides the search when set.
pub(crate) fn bind_pdfium() -> Result<Pdfium, FileError> {
    let bindings = if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        Pdfium::bind_to_library(path)
    } else {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));

        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./lib"))
            })
            .or_else(|e| match exe_dir {
                Some(dir) => {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
                }
                None => Err(e),
            })
            .or_else(|_| Pdfium::bind_to_system_library())
    }
    .map_err(|e| FileError::EngineUnavailable {
        detail: format!("{e:?}"),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Rasterise the selected pages of a PDF into images.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples in page order —
/// exactly one entry per selected page of a valid document.
pub async fn rasterize_pdf(
    name: &str,
    bytes: Vec<u8>,
    config: &ConversionConfig,
) -> Result<Vec<(usize, DynamicImage)>, FileError> {
    let name = name.to_string();
    let task_name = name.clone();
    let dpi = config.dpi;
    let password = config.password.clone();
    let pages = config.pages.clone();

    tokio::task::spawn_blocking(move || {
        rasterize_blocking(&task_name, bytes, dpi, password.as_deref(), &pages)
    })
    .await
    .map_err(|e| render_task_failed(name, e.to_string()))?
}

/// A join failure (panicked or cancelled render task) surfaces as a render
/// error carrying the file's real name.
fn render_task_failed(name: String, detail: String) -> FileError {
    FileError::RenderFailed {
        name,
        page: 0,
        detail: format!("Render task panicked: {detail}"),
    }
}

/// Blocking implementation of page rasterisation.
fn rasterize_blocking(
    name: &str,
    bytes: Vec<u8>,
    dpi: u32,
    password: Option<&str>,
    pages: &crate::config::PageSelection,
) -> Result<Vec<(usize, DynamicImage)>, FileError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_vec(bytes, password)
        .map_err(|e| classify_load_error(name, password, e))?;

    let total_pages = document.pages().len() as usize;
    tracing::info!("'{}' loaded: {} pages", name, total_pages);

    let indices = pages.to_indices(total_pages);
    if indices.is_empty() {
        return Err(FileError::NoPagesSelected {
            name: name.to_string(),
            total: total_pages,
        });
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

    let mut results = Vec::with_capacity(indices.len());
    for idx in indices {
        let page =
            document
                .pages()
                .get(idx as u16)
                .map_err(|e| FileError::RenderFailed {
                    name: name.to_string(),
                    page: idx + 1,
                    detail: format!("{e:?}"),
                })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| FileError::RenderFailed {
                name: name.to_string(),
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        let image = bitmap.as_image();
        tracing::debug!(
            "Rendered '{}' page {} → {}x{} px",
            name,
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}

/// Map a pdfium load error to the password/corruption taxonomy.
fn classify_load_error(name: &str, password: Option<&str>, e: PdfiumError) -> FileError {
    let err_str = format!("{e:?}");
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            FileError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            FileError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        FileError::CorruptPdf {
            name: name.to_string(),
            detail: err_str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_keeps_the_file_name() {
        let e = render_task_failed("fé.pdf".into(), "worker panicked".into());
        assert_eq!(e.file_name(), Some("fé.pdf"));
        let msg = e.to_string();
        assert!(msg.contains("fé.pdf"), "got: {msg}");
        assert!(msg.contains("worker panicked"));
    }
}
