//! Frame size normalization and blending.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use recam_data::Resolution;

/// Resampling filter for all resizes. Fixed so output is reproducible.
const FILTER: FilterType = FilterType::Triangle;

/// How a frame is brought to a target resolution with a different aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale to cover the target, then center crop.
    #[default]
    Crop,
    /// Scale to fit inside the target, then center on black.
    Pad,
    /// Resize to the target ignoring aspect ratio.
    Stretch,
}

/// Bring `image` to exactly `target`.
pub fn fit_to(image: &RgbImage, target: Resolution, mode: FitMode) -> RgbImage {
    let (width, height) = image.dimensions();
    if (width, height) == (target.width, target.height) {
        return image.clone();
    }

    match mode {
        FitMode::Stretch => imageops::resize(image, target.width, target.height, FILTER),
        FitMode::Crop => {
            let scale = f64::max(
                target.width as f64 / width as f64,
                target.height as f64 / height as f64,
            );
            let scaled_w = scaled_side(width, scale).max(target.width);
            let scaled_h = scaled_side(height, scale).max(target.height);
            let scaled = imageops::resize(image, scaled_w, scaled_h, FILTER);
            let x = (scaled_w - target.width) / 2;
            let y = (scaled_h - target.height) / 2;
            imageops::crop_imm(&scaled, x, y, target.width, target.height).to_image()
        }
        FitMode::Pad => {
            let scale = f64::min(
                target.width as f64 / width as f64,
                target.height as f64 / height as f64,
            );
            let scaled_w = scaled_side(width, scale).clamp(1, target.width);
            let scaled_h = scaled_side(height, scale).clamp(1, target.height);
            let scaled = imageops::resize(image, scaled_w, scaled_h, FILTER);
            let mut canvas = RgbImage::from_pixel(target.width, target.height, Rgb([0, 0, 0]));
            let x = (target.width - scaled_w) / 2;
            let y = (target.height - scaled_h) / 2;
            imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
            canvas
        }
    }
}

fn scaled_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}

/// Per-channel linear blend: `weight == 0` yields `a`, `weight == 1` yields `b`.
/// Both images must have the same dimensions.
pub fn blend(a: &RgbImage, b: &RgbImage, weight: f64) -> RgbImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let w = weight.clamp(0.0, 1.0);
    let raw: Vec<u8> = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&pa, &pb)| (pa as f64 * (1.0 - w) + pb as f64 * w).round() as u8)
        .collect();
    RgbImage::from_raw(a.width(), a.height(), raw).unwrap_or_else(|| a.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
    }

    #[test]
    fn test_fit_modes_hit_exact_resolution() {
        let target = Resolution::new(832, 480);
        for (w, h) in [(1920, 1080), (480, 640), (100, 100), (833, 481), (31, 7)] {
            for mode in [FitMode::Crop, FitMode::Pad, FitMode::Stretch] {
                let out = fit_to(&gradient(w, h), target, mode);
                assert_eq!(out.dimensions(), (832, 480), "{w}x{h} {mode:?}");
            }
        }
    }

    #[test]
    fn test_fit_is_identity_at_target_size() {
        let frame = gradient(832, 480);
        assert_eq!(fit_to(&frame, Resolution::new(832, 480), FitMode::Crop), frame);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let frame = gradient(640, 360);
        let target = Resolution::new(832, 480);
        assert_eq!(
            fit_to(&frame, target, FitMode::Crop),
            fit_to(&frame, target, FitMode::Crop)
        );
    }

    #[test]
    fn test_pad_leaves_black_bars() {
        // Square source into a wide target: bars on the left and right.
        let frame = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let out = fit_to(&frame, Resolution::new(200, 100), FitMode::Pad);
        assert_eq!(out.get_pixel(0, 50), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(199, 50), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(100, 50), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_blend() {
        let a = RgbImage::from_pixel(2, 2, Rgb([0, 100, 200]));
        let b = RgbImage::from_pixel(2, 2, Rgb([100, 200, 0]));
        assert_eq!(blend(&a, &b, 0.0), a);
        assert_eq!(blend(&a, &b, 1.0), b);
        assert_eq!(blend(&a, &b, 0.5).get_pixel(1, 1), &Rgb([50, 150, 100]));
    }
}
