//! Trait definitions for the inpainting engine.
//!
//! [`InpaintSession`] is the seam between the dispatcher and a loaded model: the
//! dispatcher and the runner only ever see sessions through it, which lets them be
//! driven by in-process fakes as well as by real ONNX Runtime sessions.

use crate::core::errors::InpaintResult;

/// A model that turns an encoded image and mask into an encoded result.
pub trait InpaintSession: Send + Sync {
    /// Human-readable name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Runs decode, inference and encode on one image/mask pair.
    fn run_end_to_end(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>>;

    /// Called on the worker thread before it reports ready.
    ///
    /// Work done here is excluded from the synchronized start, so per-thread setup
    /// does not skew when the sessions begin running.
    fn warm_up(&self) {}
}

impl<T: InpaintSession + ?Sized> InpaintSession for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run_end_to_end(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>> {
        (**self).run_end_to_end(image_bytes, mask_bytes)
    }

    fn warm_up(&self) {
        (**self).warm_up()
    }
}

impl<T: InpaintSession + ?Sized> InpaintSession for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run_end_to_end(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>> {
        (**self).run_end_to_end(image_bytes, mask_bytes)
    }

    fn warm_up(&self) {
        (**self).warm_up()
    }
}
