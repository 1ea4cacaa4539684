//! Image resizing with Lanczos3 resampling.
//!
//! Lanczos is the highest-quality filter `image::imageops` offers and the
//! one the original tool used for downscaling. The no-op cases (no resize,
//! 100 %, already-fits) skip the resample pass entirely so they return the
//! input pixels untouched rather than a visually identical but re-filtered
//! copy.

use crate::config::ResizeMode;
use image::imageops::FilterType;
use image::DynamicImage;

/// Apply the configured resize mode to an image.
pub fn resize(img: DynamicImage, mode: &ResizeMode) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let (target_w, target_h) = mode.target_dimensions(w, h);

    if (target_w, target_h) == (w, h) {
        return img;
    }

    tracing::debug!("Resizing {}x{} → {}x{}", w, h, target_w, target_h);
    img.resize_exact(target_w, target_h, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn test_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn no_resize_keeps_dimensions() {
        let out = resize(test_image(64, 48), &ResizeMode::None);
        assert_eq!((out.width(), out.height()), (64, 48));
    }

    #[test]
    fn percent_100_keeps_dimensions() {
        let out = resize(test_image(64, 48), &ResizeMode::Percent(100));
        assert_eq!((out.width(), out.height()), (64, 48));
    }

    #[test]
    fn percent_50_halves_dimensions() {
        let out = resize(test_image(64, 48), &ResizeMode::Percent(50));
        assert_eq!((out.width(), out.height()), (32, 24));
    }

    #[test]
    fn exact_ignores_aspect_ratio() {
        let out = resize(
            test_image(64, 48),
            &ResizeMode::Exact {
                width: 10,
                height: 40,
            },
        );
        assert_eq!((out.width(), out.height()), (10, 40));
    }

    #[test]
    fn fit_downscales_preserving_aspect() {
        let out = resize(
            test_image(200, 100),
            &ResizeMode::Fit {
                width: 50,
                height: 50,
            },
        );
        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn fit_leaves_smaller_images_alone() {
        let out = resize(
            test_image(30, 20),
            &ResizeMode::Fit {
                width: 50,
                height: 50,
            },
        );
        assert_eq!((out.width(), out.height()), (30, 20));
    }
}
