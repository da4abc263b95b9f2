//! Small pixel helpers shared by the readers.

use image::{Rgb, RgbImage};

use crate::bbox::Rect;

/// Perceptual luma of one pixel, 0.0..=255.0.
pub fn luma(p: &Rgb<u8>) -> f64 {
    0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64
}

/// Mean luma over a whole image; 0.0 for an empty image.
pub fn mean_luma(img: &RgbImage) -> f64 {
    let n = (img.width() * img.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    img.pixels().map(luma).sum::<f64>() / n
}

/// Whether a pixel is within `tolerance` of a reference color on every
/// channel.
pub fn near_color(p: &Rgb<u8>, color: [u8; 3], tolerance: u8) -> bool {
    p.0[0].abs_diff(color[0]) <= tolerance
        && p.0[1].abs_diff(color[1]) <= tolerance
        && p.0[2].abs_diff(color[2]) <= tolerance
}

/// Crop a rectangle out of an image, clamped to the image bounds.
/// Returns `None` when the clamped rectangle is empty.
pub fn crop_rect(img: &RgbImage, rect: Rect) -> Option<RgbImage> {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    if x0 >= img.width() || y0 >= img.height() || rect.width <= 0 || rect.height <= 0 {
        return None;
    }
    let w = (rect.width as u32).min(img.width() - x0);
    let h = (rect.height as u32).min(img.height() - y0);
    if w == 0 || h == 0 {
        return None;
    }
    Some(image::imageops::crop_imm(img, x0, y0, w, h).to_image())
}

/// Byte-exact image equality, used by the frame-diff guard.
pub fn images_identical(a: &RgbImage, b: &RgbImage) -> bool {
    a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
}
