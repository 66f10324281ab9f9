//! Image processing between encoded bytes and model tensors.
//!
//! # Modules
//!
//! * `codec` - PNG/JPEG decoding and encoding
//! * `mask` - Mask resizing and binarization
//! * `normalization` - Pixel buffers to normalized NCHW tensors
//! * `postprocess` - Output tensors back to 8-bit images
//! * `tensor_codec` - The [`TensorCodec`] facade tying the steps together
//! * `types` - Type definitions used across the processors module

pub mod codec;
pub mod mask;
mod normalization;
mod postprocess;
mod tensor_codec;
pub mod types;

pub use mask::{binarize_mask, prepare_mask, threshold_value};
pub use normalization::*;
pub use postprocess::*;
pub use tensor_codec::TensorCodec;
pub use types::*;
