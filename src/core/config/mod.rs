//! Configuration management for the inpainting engine.
//!
//! All configuration types are plain serde values with builder-style `with_*`
//! setters. [`RunnerConfig`] is the top-level document and can be loaded from JSON.

pub mod codec;
pub mod execution;
pub mod runner;

pub use codec::{ChannelOrder, CodecConfig, OutputFormat, OutputRange};
pub use execution::{
    ExecutionConfig, GraphOptimizationLevel, NnapiFlags, ProviderPlan, SessionPlan,
    XnnpackOptions,
};
pub use runner::{EngineLogLevel, EnvironmentConfig, MemoryPolicy, RunnerConfig};
