//! Constants used throughout the inpainting engine.

/// Mask pixels at or above this value become 255, everything below becomes 0.
pub const MASK_THRESHOLD: u8 = 128;

/// Largest 8-bit pixel value; pixels are divided by it to map them into [0, 1].
pub const PIXEL_MAX: f32 = 255.0;

/// Tolerance above 1.0 still treated as a normalized output tensor.
pub const NORMALIZED_RANGE_EPSILON: f32 = 1e-6;

/// Batch size every tensor is pinned to.
pub const BATCH_SIZE: usize = 1;

/// Number of channels of the color image input.
pub const IMAGE_CHANNELS: usize = 3;

/// Number of channels of the mask input.
pub const MASK_CHANNELS: usize = 1;

/// JPEG quality used when encoding JPEG outputs.
pub const JPEG_QUALITY: u8 = 100;

/// Default name given to the ONNX Runtime environment.
pub const DEFAULT_ENVIRONMENT_NAME: &str = "oar-inpaint";

/// Pixel count above which pixel loops are split across the rayon pool.
pub const DEFAULT_PARALLEL_PIXEL_THRESHOLD: usize = 256 * 256;
