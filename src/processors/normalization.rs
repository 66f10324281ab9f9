//! Pixel buffer to NCHW tensor normalization.
//!
//! Pixels are scaled into [0, 1] and laid out as `(1, C, H, W)`. Large images are
//! split by row across the rayon pool.

use crate::core::Tensor4D;
use crate::core::constants::PIXEL_MAX;
use crate::core::errors::{InpaintError, InpaintResult};
use crate::processors::types::ChannelOrder;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Converts interleaved RGB pixels into a `(1, 3, H, W)` tensor.
///
/// With [`ChannelOrder::Bgr`] the red and blue planes are swapped.
pub fn rgb_to_tensor(
    img: &RgbImage,
    order: ChannelOrder,
    parallel_threshold: usize,
) -> InpaintResult<Tensor4D> {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let plane = w * h;
    let src_channel = |c: usize| match order {
        ChannelOrder::Rgb => c,
        ChannelOrder::Bgr => 2 - c,
    };

    let mut data = vec![0.0f32; 3 * plane];
    let raw = img.as_raw();
    if plane > parallel_threshold {
        data.par_chunks_mut(w).enumerate().for_each(|(row_idx, row)| {
            let c = row_idx / h;
            let y = row_idx % h;
            let sc = src_channel(c);
            let src_row = &raw[y * w * 3..(y + 1) * w * 3];
            for (x, dst) in row.iter_mut().enumerate() {
                *dst = src_row[x * 3 + sc] as f32 / PIXEL_MAX;
            }
        });
    } else {
        for c in 0..3 {
            let sc = src_channel(c);
            let dst_plane = &mut data[c * plane..(c + 1) * plane];
            for (i, dst) in dst_plane.iter_mut().enumerate() {
                *dst = raw[i * 3 + sc] as f32 / PIXEL_MAX;
            }
        }
    }

    Tensor4D::from_shape_vec((1, 3, h, w), data).map_err(|e| {
        InpaintError::shape_error(
            "rgb_to_tensor",
            &[1, 3, h, w],
            &[raw.len() / 3],
            format!("failed to create CHW tensor for {width}x{height} image: {e}"),
        )
    })
}

/// Converts grayscale pixels into a `(1, 1, H, W)` tensor.
pub fn gray_to_tensor(img: &GrayImage) -> InpaintResult<Tensor4D> {
    let (width, height) = img.dimensions();
    let data: Vec<f32> = img.as_raw().iter().map(|&v| v as f32 / PIXEL_MAX).collect();
    Ok(Tensor4D::from_shape_vec(
        (1, 1, height as usize, width as usize),
        data,
    )?)
}
