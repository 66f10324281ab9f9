//! The in-process inpainting runner.

use super::dispatcher::ParallelDispatcher;
use super::result::DispatchReport;
use crate::core::config::RunnerConfig;
use crate::core::errors::{InpaintError, InpaintResult};
use crate::core::inference::{InferenceEngine, ModelSession, check_input_bytes};
use crate::core::traits::InpaintSession;
use std::path::PathBuf;
use tracing::{info, warn};

/// Owns an engine and the sessions it loaded, and runs them on encoded images.
///
/// Constructed once and passed to every call site; all operations return the full
/// [`InpaintError`] taxonomy.
#[derive(Debug)]
pub struct InpaintRunner {
    engine: InferenceEngine,
    sessions: Vec<ModelSession>,
    dispatcher: ParallelDispatcher,
    config: RunnerConfig,
}

impl InpaintRunner {
    /// Creates the engine and loads every model listed in `config`.
    pub fn new(config: RunnerConfig) -> InpaintResult<Self> {
        config.validate()?;

        let mut engine = InferenceEngine::new(config.environment.clone(), config.memory)?
            .with_codec(config.codec.clone());
        let sessions = engine.init_sessions(&config.model_paths, &config.execution)?;

        info!(
            sessions = sessions.len(),
            environment = %engine.environment().name(),
            "inpaint runner ready"
        );

        Ok(Self {
            engine,
            sessions,
            dispatcher: ParallelDispatcher::new(),
            config,
        })
    }

    /// Loads the given models with default settings.
    pub fn with_models<P: Into<PathBuf>>(
        model_paths: impl IntoIterator<Item = P>,
    ) -> InpaintResult<Self> {
        Self::new(RunnerConfig::new(model_paths))
    }

    /// The configuration this runner was built from.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The underlying engine.
    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Loaded sessions in registration order.
    pub fn sessions(&self) -> &[ModelSession] {
        &self.sessions
    }

    /// Runs the sessions one after another and returns the first usable output.
    pub fn infer_from_bytes(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>> {
        run_sequential(&self.sessions, image_bytes, mask_bytes)
    }

    /// Runs all sessions concurrently with a synchronized start.
    pub fn infer_from_bytes_parallel(
        &self,
        image_bytes: &[u8],
        mask_bytes: &[u8],
    ) -> InpaintResult<Vec<u8>> {
        self.dispatch(image_bytes, mask_bytes)?.resolve()
    }

    /// Like [`Self::infer_from_bytes_parallel`] but returns the per-session report.
    pub fn dispatch(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<DispatchReport> {
        check_input_bytes(image_bytes, mask_bytes)?;
        self.dispatcher
            .dispatch(&self.sessions, image_bytes, mask_bytes)
    }
}

/// Tries each session in order and returns the first non-empty output.
///
/// Empty inputs are rejected before any session runs. Session failures are logged and
/// the next session is tried; if none succeeds the failures are aggregated.
pub fn run_sequential<S: InpaintSession>(
    sessions: &[S],
    image_bytes: &[u8],
    mask_bytes: &[u8],
) -> InpaintResult<Vec<u8>> {
    check_input_bytes(image_bytes, mask_bytes)?;
    if sessions.is_empty() {
        return Err(InpaintError::invalid_argument("no sessions loaded"));
    }

    let mut failures = Vec::new();
    for session in sessions {
        match session.run_end_to_end(image_bytes, mask_bytes) {
            Ok(output) if !output.is_empty() => return Ok(output),
            Ok(_) => {
                warn!(session = %session.name(), "session returned empty output");
                failures.push(format!("{}: empty output", session.name()));
            }
            Err(e) => {
                warn!(session = %session.name(), error = %e, "session failed, trying next");
                failures.push(format!("{} ({}): {e}", session.name(), e.kind()));
            }
        }
    }
    Err(InpaintError::all_sessions_failed(failures))
}
