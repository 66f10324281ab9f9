//! Mask preparation: nearest-neighbour resize and binarization.

use super::types::TargetSize;
use crate::core::constants::MASK_THRESHOLD;
use image::GrayImage;
use image::imageops::{self, FilterType};

/// Maps a mask value to 0 or 255.
#[inline]
pub fn threshold_value(v: u8) -> u8 {
    if v >= MASK_THRESHOLD { 255 } else { 0 }
}

/// Binarizes a mask in place.
pub fn binarize_mask(mask: &mut GrayImage) {
    for p in mask.iter_mut() {
        *p = threshold_value(*p);
    }
}

/// Resizes a mask to `target` without introducing intermediate values.
///
/// The mask is returned unchanged when it already has the target size.
pub fn resize_mask(mask: &GrayImage, target: TargetSize) -> GrayImage {
    if mask.dimensions() == (target.width, target.height) {
        return mask.clone();
    }
    imageops::resize(mask, target.width, target.height, FilterType::Nearest)
}

/// Resizes and binarizes a mask for the model.
pub fn prepare_mask(mask: &GrayImage, target: TargetSize) -> GrayImage {
    let mut prepared = resize_mask(mask, target);
    binarize_mask(&mut prepared);
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(threshold_value(0), 0);
        assert_eq!(threshold_value(127), 0);
        assert_eq!(threshold_value(128), 255);
        assert_eq!(threshold_value(255), 255);
    }

    #[test]
    fn test_threshold_is_idempotent() {
        for v in 0..=255u8 {
            let once = threshold_value(v);
            assert_eq!(threshold_value(once), once, "value {v}");
        }
    }

    #[test]
    fn test_nearest_resize_keeps_mask_binary() {
        let mask = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let resized = prepare_mask(&mask, TargetSize::new(23, 17));
        assert_eq!(resized.dimensions(), (23, 17));
        assert!(resized.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_prepare_mask_binarizes_soft_edges() {
        let mask = GrayImage::from_fn(4, 1, |x, _| Luma([[10, 127, 128, 250][x as usize]]));
        let prepared = prepare_mask(&mask, TargetSize::new(4, 1));
        assert_eq!(prepared.as_raw(), &vec![0, 0, 255, 255]);
    }
}
