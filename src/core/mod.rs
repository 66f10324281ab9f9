//! The core module of the inpainting engine.
//!
//! This module contains the fundamental components of the engine, including:
//! - Configuration management
//! - Constants used throughout the engine
//! - Error handling
//! - ONNX Runtime integration (environment, sessions, IO discovery)
//! - The session trait driven by the pipeline
//!
//! It also provides re-exports of commonly used types and functions for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{
    ChannelOrder, CodecConfig, EngineLogLevel, EnvironmentConfig, ExecutionConfig,
    GraphOptimizationLevel, MemoryPolicy, NnapiFlags, OutputFormat, OutputRange, ProviderPlan,
    RunnerConfig, SessionPlan, XnnpackOptions,
};
pub use constants::*;
pub use errors::{ErrorKind, InpaintError, InpaintResult, SimpleError};
pub use inference::{InferenceEngine, MemoryDescriptor, ModelSession, SharedEnvironment, TensorInfo};
pub use traits::InpaintSession;

/// A batch of images in NCHW layout.
pub type Tensor4D = ndarray::Array4<f32>;
