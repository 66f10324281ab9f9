//! The inpainting pipeline.
//!
//! This module ties loaded sessions together: sequential fallback, the synchronized
//! parallel dispatcher and the `Option`-returning handle used at foreign boundaries.

mod dispatcher;
mod handle;
mod result;
mod runner;

pub use dispatcher::ParallelDispatcher;
pub use handle::RunnerHandle;
pub use result::{DispatchReport, InferenceResult, WorkerReport};
pub use runner::{InpaintRunner, run_sequential};
