//! Image codecs: decode uploaded bytes, encode `DynamicImage`s to the
//! target format.
//!
//! Colour handling per format:
//! * JPEG has no alpha channel, so frames are flattened to RGB8 before
//!   encoding (pdfium renders RGBA; the alpha plane of a rendered page is
//!   fully opaque anyway).
//! * The image crate's WebP encoder is lossless and accepts only RGB8/RGBA8,
//!   so frames are normalised to RGBA8.
//! * PNG and BMP take the frame as decoded/rendered.

use crate::config::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::error::{ImageFormatHint, UnsupportedError};
use image::{DynamicImage, ImageError};
use std::io::Cursor;

/// Decode image bytes into a pixel buffer.
///
/// Format is detected from the bytes themselves, consistent with the
/// magic-number routing in [`crate::pipeline::input`].
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Encode an image to `format`, returning the encoded bytes.
///
/// `quality` applies to JPEG only. `OutputFormat::Pdf` is not an image
/// encoding and is rejected; PDF outputs go through
/// [`crate::pipeline::assemble`].
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            encoder.encode_image(&rgb)?;
        }
        OutputFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut buf, image::ImageFormat::WebP)?;
        }
        OutputFormat::Png | OutputFormat::Bmp => {
            let fmt = format
                .as_image_format()
                .expect("png/bmp map to an image format");
            img.write_to(&mut buf, fmt)?;
        }
        OutputFormat::Pdf => {
            return Err(ImageError::Unsupported(
                UnsupportedError::from_format_and_kind(
                    ImageFormatHint::Name("pdf".into()),
                    image::error::UnsupportedErrorKind::Format(ImageFormatHint::Name(
                        "pdf".into(),
                    )),
                ),
            ));
        }
    }

    let bytes = buf.into_inner();
    tracing::debug!(
        "Encoded {}x{} → {} bytes of {}",
        img.width(),
        img.height(),
        bytes.len(),
        format
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::{sniff_kind, InputKind};
    use image::{Rgba, RgbaImage};

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 12, Rgba([200, 50, 50, 255])))
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let bytes = encode_image(&test_image(), OutputFormat::Jpeg, 92).unwrap();
        assert_eq!(sniff_kind(&bytes), Some(InputKind::Image));
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = test_image();
        let bytes = encode_image(&img, OutputFormat::Png, 92).unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn webp_and_bmp_encode_and_sniff() {
        for format in [OutputFormat::WebP, OutputFormat::Bmp] {
            let bytes = encode_image(&test_image(), format, 92).unwrap();
            assert_eq!(sniff_kind(&bytes), Some(InputKind::Image), "{format}");
            let decoded = decode_image(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 12), "{format}");
        }
    }

    #[test]
    fn jpeg_quality_changes_size() {
        // Noise compresses badly, so quality has a visible effect on size.
        let noisy = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([
                (x * 37 % 256) as u8,
                (y * 91 % 256) as u8,
                ((x + y) * 53 % 256) as u8,
                255,
            ])
        }));
        let high = encode_image(&noisy, OutputFormat::Jpeg, 95).unwrap();
        let low = encode_image(&noisy, OutputFormat::Jpeg, 10).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn pdf_target_is_rejected_here() {
        assert!(encode_image(&test_image(), OutputFormat::Pdf, 92).is_err());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
