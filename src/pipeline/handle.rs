//! Absence-based boundary surface over [`InpaintRunner`].
//!
//! Foreign callers get `Option` results: any failure is logged here with its full
//! diagnostic and surfaces as `None`.

use super::runner::InpaintRunner;
use crate::core::config::RunnerConfig;
use crate::core::errors::InpaintResult;
use std::path::PathBuf;
use tracing::{error, info};

/// Owns at most one runner for a foreign caller.
#[derive(Debug, Default)]
pub struct RunnerHandle {
    runner: Option<InpaintRunner>,
}

impl RunnerHandle {
    /// Creates an empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a runner is loaded.
    pub fn is_loaded(&self) -> bool {
        self.runner.is_some()
    }

    /// The loaded runner, if any.
    pub fn runner(&self) -> Option<&InpaintRunner> {
        self.runner.as_ref()
    }

    /// Loads the given models with the default runner configuration, replacing any
    /// previously loaded runner. Returns false if loading failed.
    pub fn create_session<P: Into<PathBuf>>(
        &mut self,
        model_paths: impl IntoIterator<Item = P>,
    ) -> bool {
        self.create_session_with(RunnerConfig::new(model_paths))
    }

    /// Loads a runner from an explicit configuration. Returns false if loading failed.
    pub fn create_session_with(&mut self, config: RunnerConfig) -> bool {
        self.release_session();
        match InpaintRunner::new(config) {
            Ok(runner) => {
                self.runner = Some(runner);
                true
            }
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "create_session failed");
                false
            }
        }
    }

    /// Sequential inference; `None` on any failure or when nothing is loaded.
    pub fn infer_from_bytes(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> Option<Vec<u8>> {
        let runner = self.loaded("infer_from_bytes")?;
        absent_on_error("infer_from_bytes", runner.infer_from_bytes(image_bytes, mask_bytes))
    }

    /// Parallel inference; `None` on total failure or when nothing is loaded.
    pub fn infer_from_bytes_parallel(
        &self,
        image_bytes: &[u8],
        mask_bytes: &[u8],
    ) -> Option<Vec<u8>> {
        let runner = self.loaded("infer_from_bytes_parallel")?;
        absent_on_error(
            "infer_from_bytes_parallel",
            runner.infer_from_bytes_parallel(image_bytes, mask_bytes),
        )
    }

    /// Drops the runner and its sessions. Safe to call at any time, any number of times.
    pub fn release_session(&mut self) {
        if self.runner.take().is_some() {
            info!("runner released");
        }
    }

    fn loaded(&self, operation: &str) -> Option<&InpaintRunner> {
        if self.runner.is_none() {
            error!(operation, "no session loaded");
        }
        self.runner.as_ref()
    }
}

fn absent_on_error(operation: &str, result: InpaintResult<Vec<u8>>) -> Option<Vec<u8>> {
    match result {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            error!(operation, error = %e, kind = %e.kind(), "inference failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::InpaintError;

    #[test]
    fn test_release_without_create_is_safe() {
        let mut handle = RunnerHandle::new();
        handle.release_session();
        handle.release_session();
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_inference_without_session_is_absent() {
        let handle = RunnerHandle::new();
        assert!(handle.infer_from_bytes(b"img", b"mask").is_none());
        assert!(handle.infer_from_bytes_parallel(b"img", b"mask").is_none());
    }

    #[test]
    fn test_failed_create_leaves_handle_empty() {
        let mut handle = RunnerHandle::new();
        assert!(!handle.create_session(["dummy_path.onnx"]));
        assert!(!handle.is_loaded());
        assert!(handle.runner().is_none());
    }

    #[test]
    fn test_errors_and_empty_output_map_to_none() {
        assert_eq!(absent_on_error("op", Ok(vec![1, 2])), Some(vec![1, 2]));
        assert_eq!(absent_on_error("op", Ok(Vec::new())), None);
        assert_eq!(
            absent_on_error("op", Err(InpaintError::invalid_argument("empty"))),
            None
        );
    }
}
