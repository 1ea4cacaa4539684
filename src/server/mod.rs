//! Embedded web UI: a single upload form and a conversion endpoint.
//!
//! Routes:
//! * `GET /` serves the upload form.
//! * `POST /convert` accepts a multipart batch and responds with the
//!   converted output. A single output downloads directly under its own
//!   name and MIME type; multiple outputs are bundled into a ZIP archive.
//!
//! Per-file failures do not fail the request. When a batch partially
//! succeeds the skipped files are reported in the `x-pagemill-failed`
//! response header so the download still completes.

use crate::batch::{self, BatchOutput};
use crate::config::{ConversionConfig, OutputFormat, ResizeMode};
use crate::error::PagemillError;
use crate::pipeline::input::UploadedFile;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;

const INDEX_HTML: &str = include_str!("index.html");

/// Uploads are held in memory, so cap the request body.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Response header listing the files skipped in a partial batch.
pub const FAILED_HEADER: &str = "x-pagemill-failed";

/// Build the application router.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Bind `addr` and serve the application until the process is stopped.
pub async fn serve(addr: SocketAddr) -> Result<(), PagemillError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn convert(multipart: Multipart) -> Response {
    let (files, config) = match parse_request(multipart).await {
        Ok(parsed) => parsed,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    match batch::convert_batch(files, &config).await {
        Ok(output) => download_response(output, config.format),
        Err(e @ PagemillError::PdfiumBindingFailed(_)) | Err(e @ PagemillError::Internal(_)) => {
            tracing::error!("Conversion failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

/// Parse the multipart form into uploaded files and a validated config.
async fn parse_request(
    mut multipart: Multipart,
) -> Result<(Vec<UploadedFile>, ConversionConfig), String> {
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut builder = ConversionConfig::builder();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to parse multipart data: {e}"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" => {
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("upload_{}", files.len() + 1));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read '{name}': {e}"))?;
                // Browsers submit an empty part when no file is picked.
                if !bytes.is_empty() {
                    files.push(UploadedFile::new(name, bytes.to_vec()));
                }
            }
            "format" => {
                let value = read_text(field, "format").await?;
                let format: OutputFormat = value.parse().map_err(|e| format!("{e}"))?;
                builder = builder.format(format);
            }
            "dpi" => {
                let value = read_text(field, "dpi").await?;
                let dpi: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("DPI must be a number, got '{value}'"))?;
                builder = builder.dpi(dpi);
            }
            "quality" => {
                let value = read_text(field, "quality").await?;
                let quality: u8 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("Quality must be a number, got '{value}'"))?;
                builder = builder.quality(quality);
            }
            "resize_percent" => {
                let value = read_text(field, "resize_percent").await?;
                let percent: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("Resize percentage must be a number, got '{value}'"))?;
                if percent != 100 {
                    builder = builder.resize(ResizeMode::Percent(percent));
                }
            }
            "password" => {
                let value = read_text(field, "password").await?;
                if !value.is_empty() {
                    builder = builder.password(value);
                }
            }
            other => {
                tracing::debug!("Ignoring unknown form field '{}'", other);
            }
        }
    }

    let config = builder.build().map_err(|e| e.to_string())?;
    Ok((files, config))
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, String> {
    field
        .text()
        .await
        .map_err(|e| format!("Failed to read field '{name}': {e}"))
}

/// Turn a finished batch into the download response.
fn download_response(output: BatchOutput, format: OutputFormat) -> Response {
    let failed_header = if output.is_partial() {
        let summary = output
            .failures
            .iter()
            .map(|f| f.error.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&sanitize_header(&summary)).ok()
    } else {
        None
    };

    let (name, mime, bytes) = if output.outputs.len() == 1 {
        let file = output.outputs.into_iter().next().expect("one output");
        (file.name, format.mime().to_string(), file.bytes)
    } else {
        let name = output.zip_name();
        match output.into_zip() {
            Ok(bytes) => (name, "application/zip".to_string(), bytes),
            Err(e) => {
                tracing::error!("Archive failed: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
            }
        }
    };

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", sanitize_header(&name)),
            ),
        ],
        bytes,
    )
        .into_response();

    if let Some(value) = failed_header {
        response.headers_mut().insert(FAILED_HEADER, value);
    }
    response
}

/// Strip characters that are not valid in an HTTP header value.
fn sanitize_header(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pagemill-test-boundary";

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([40, 40, 200, 255])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    struct FormBuilder {
        body: Vec<u8>,
    }

    impl FormBuilder {
        fn new() -> Self {
            Self { body: Vec::new() }
        }

        fn text(mut self, name: &str, value: &str) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
            self
        }

        fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
            self.body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            self.body.extend_from_slice(bytes);
            self.body.extend_from_slice(b"\r\n");
            self
        }

        fn build(mut self) -> Request<Body> {
            self.body
                .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
            Request::builder()
                .method("POST")
                .uri("/convert")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(self.body))
                .unwrap()
        }
    }

    #[tokio::test]
    async fn index_serves_the_upload_form() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("<form"));
        assert!(html.contains("name=\"files\""));
    }

    #[tokio::test]
    async fn single_output_downloads_directly() {
        let request = FormBuilder::new()
            .file("files", "photo.png", &png_bytes(10, 10))
            .text("format", "jpg")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("image/jpeg")
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("photo.jpg"), "got: {disposition}");
        assert!(response.headers().get(FAILED_HEADER).is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(image::load_from_memory(&body).is_ok());
    }

    #[tokio::test]
    async fn multiple_outputs_come_back_as_zip() {
        let request = FormBuilder::new()
            .file("files", "a.png", &png_bytes(6, 6))
            .file("files", "b.png", &png_bytes(7, 7))
            .text("format", "png")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("application/zip")
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(
            disposition.contains("converted_2_files.zip"),
            "got: {disposition}"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let archive = zip::ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_is_reported_in_header() {
        let request = FormBuilder::new()
            .file("files", "good.png", &png_bytes(5, 5))
            .file("files", "bad.bin", b"not an image at all")
            .file("files", "good2.png", &png_bytes(5, 5))
            .text("format", "png")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let failed = response.headers()[FAILED_HEADER].to_str().unwrap();
        assert!(failed.contains("bad.bin"), "got: {failed}");
    }

    #[tokio::test]
    async fn empty_upload_is_a_bad_request() {
        let request = FormBuilder::new().text("format", "jpg").build();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn out_of_range_dpi_is_rejected() {
        let request = FormBuilder::new()
            .file("files", "photo.png", &png_bytes(4, 4))
            .text("dpi", "9000")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("DPI"));
    }

    #[tokio::test]
    async fn all_failed_batch_is_a_bad_request() {
        let request = FormBuilder::new()
            .file("files", "junk.bin", b"garbage bytes")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resize_percent_is_applied() {
        let request = FormBuilder::new()
            .file("files", "photo.png", &png_bytes(40, 20))
            .text("format", "png")
            .text("resize_percent", "50")
            .build();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let decoded = image::load_from_memory(&body).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }
}
