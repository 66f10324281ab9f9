//! ONNX Runtime integration.
//!
//! [`InferenceEngine`] owns the shared environment and builds [`ModelSession`]s, each
//! bound to one model file. Session options are derived from an
//! [`ExecutionConfig`](crate::core::config::ExecutionConfig) through its
//! [`SessionPlan`](crate::core::config::SessionPlan) and applied in [`session`].

pub mod engine;
pub mod io;
pub mod memory;
pub mod model_session;
pub mod session;

pub use engine::{InferenceEngine, SharedEnvironment};
pub use io::{InputBinding, ModelIo, TensorInfo};
pub use memory::MemoryDescriptor;
pub use model_session::{ModelSession, check_input_bytes};
pub use session::{SessionDefaults, load_session_with};

/// Path of a small model checked in under `testdata/`.
#[cfg(test)]
pub(crate) fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src/core/inference/testdata")
        .join(name)
}
