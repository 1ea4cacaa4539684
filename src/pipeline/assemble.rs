//! Multi-page PDF assembly: compose an ordered image sequence into one
//! document via pdfium.
//!
//! Pages are appended in input order, one image per page, each page sized so
//! the image lands at the configured DPI (page points = pixels × 72 / dpi).
//! Rasterising a PDF and reassembling it at the same DPI therefore keeps the
//! physical page size.

use crate::error::FileError;
use crate::pipeline::raster::bind_pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Compose `images` into a single PDF, preserving order.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn images_to_pdf(
    name: &str,
    images: Vec<DynamicImage>,
    dpi: u32,
) -> Result<Vec<u8>, FileError> {
    let name = name.to_string();
    let task_name = name.clone();

    tokio::task::spawn_blocking(move || images_to_pdf_blocking(&task_name, images, dpi))
        .await
        .map_err(|e| assembly_task_failed(name, e.to_string()))?
}

/// A join failure (panicked or cancelled assembly task) surfaces as an
/// assembly error carrying the file's real name.
fn assembly_task_failed(name: String, detail: String) -> FileError {
    FileError::AssembleFailed {
        name,
        detail: format!("Assembly task panicked: {detail}"),
    }
}

/// Blocking implementation of PDF assembly.
fn images_to_pdf_blocking(
    name: &str,
    images: Vec<DynamicImage>,
    dpi: u32,
) -> Result<Vec<u8>, FileError> {
    let pdfium = bind_pdfium()?;

    let fail = |detail: String| FileError::AssembleFailed {
        name: name.to_string(),
        detail,
    };

    let mut document = pdfium.create_new_pdf().map_err(|e| fail(format!("{e:?}")))?;

    let points_per_pixel = 72.0 / dpi as f32;
    for img in &images {
        let width = PdfPoints::new(img.width() as f32 * points_per_pixel);
        let height = PdfPoints::new(img.height() as f32 * points_per_pixel);

        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::from_points(width, height))
            .map_err(|e| fail(format!("{e:?}")))?;

        let object = PdfPageImageObject::new_with_size(&document, img, width, height)
            .map_err(|e| fail(format!("{e:?}")))?;

        page.objects_mut()
            .add_image_object(object)
            .map_err(|e| fail(format!("{e:?}")))?;
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| fail(format!("{e:?}")))?;

    tracing::info!(
        "Assembled '{}': {} pages, {} bytes",
        name,
        images.len(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_keeps_the_file_name() {
        let e = assembly_task_failed("scans fé.pdf".into(), "worker panicked".into());
        assert_eq!(e.file_name(), Some("scans fé.pdf"));
        assert!(e.to_string().contains("scans fé.pdf"));
    }
}
