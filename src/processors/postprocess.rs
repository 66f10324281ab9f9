//! Output tensor to 8-bit image conversion.

use super::types::{ChannelOrder, Image, OutputRange};
use crate::core::constants::NORMALIZED_RANGE_EPSILON;
use crate::core::errors::{InpaintError, InpaintResult};
use image::{GrayImage, RgbImage};

/// Decides whether color values should be multiplied by 255.
pub fn needs_scaling(values: &[f32], range: OutputRange) -> bool {
    match range {
        OutputRange::Normalized => true,
        OutputRange::Scaled => false,
        OutputRange::Auto => {
            let (min, max) = values
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            !values.is_empty() && min >= 0.0 && max <= 1.0 + NORMALIZED_RANGE_EPSILON
        }
    }
}

/// Converts a `(1, C, H, W)` output into an image.
///
/// Single-channel outputs are truncated to 8 bits as-is. Three-channel outputs are
/// de-interleaved, scaled according to `range`, rounded to the nearest level and mapped
/// from `order` to RGB. Out-of-range values saturate.
pub fn tensor_to_image(
    shape: &[usize],
    data: &[f32],
    range: OutputRange,
    order: ChannelOrder,
) -> InpaintResult<Image> {
    if shape.len() != 4 || shape[0] != 1 {
        return Err(InpaintError::shape_error(
            "postprocess",
            &[1, 3, 0, 0],
            shape,
            "expected NCHW output with batch 1",
        ));
    }
    let (channels, height, width) = (shape[1], shape[2], shape[3]);
    let plane = height * width;
    if data.len() != channels * plane {
        return Err(InpaintError::shape_error(
            "postprocess",
            shape,
            &[data.len()],
            "output data length does not match its shape",
        ));
    }
    let (w, h) = (width as u32, height as u32);

    match channels {
        1 => {
            let pixels = data.iter().map(|&v| v as u8).collect();
            GrayImage::from_raw(w, h, pixels)
                .map(Image::Gray)
                .ok_or_else(|| {
                    InpaintError::shape_error("postprocess", &[plane], &[data.len()], "gray plane")
                })
        }
        3 => {
            let scale = if needs_scaling(data, range) { 255.0 } else { 1.0 };
            let planes = match order {
                ChannelOrder::Rgb => [0, 1, 2],
                ChannelOrder::Bgr => [2, 1, 0],
            };
            let mut pixels = Vec::with_capacity(3 * plane);
            for i in 0..plane {
                for &c in &planes {
                    pixels.push((data[c * plane + i] * scale).round() as u8);
                }
            }
            RgbImage::from_raw(w, h, pixels)
                .map(Image::Color)
                .ok_or_else(|| {
                    InpaintError::shape_error(
                        "postprocess",
                        &[3 * plane],
                        &[data.len()],
                        "color planes",
                    )
                })
        }
        other => Err(InpaintError::shape_error(
            "postprocess",
            &[1, 3, height, width],
            &[1, other, height, width],
            "only 1 or 3 output channels are supported",
        )),
    }
}
