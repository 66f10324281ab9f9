//! The inference engine: shared runtime environment and session construction.

use super::memory::MemoryDescriptor;
use super::model_session::ModelSession;
use crate::core::config::{
    CodecConfig, EngineLogLevel, EnvironmentConfig, ExecutionConfig, MemoryPolicy,
};
use crate::core::errors::{InpaintError, InpaintResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Environment state shared read-only by every session an engine creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedEnvironment {
    name: String,
    log_level: EngineLogLevel,
    memory: MemoryPolicy,
    memory_descriptor: MemoryDescriptor,
}

impl SharedEnvironment {
    /// Creates the shared state without registering anything with the runtime.
    pub fn new(
        config: &EnvironmentConfig,
        memory: MemoryPolicy,
        memory_descriptor: MemoryDescriptor,
    ) -> Self {
        Self {
            name: config.name.clone(),
            log_level: config.log_level,
            memory,
            memory_descriptor,
        }
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runtime log level applied to every session.
    pub fn log_level(&self) -> EngineLogLevel {
        self.log_level
    }

    /// Memory policy applied to every session.
    pub fn memory(&self) -> MemoryPolicy {
        self.memory
    }

    /// Where every session allocates its input tensors.
    pub fn memory_descriptor(&self) -> MemoryDescriptor {
        self.memory_descriptor
    }
}

/// Owns the runtime environment and builds [`ModelSession`]s that share it.
#[derive(Debug)]
pub struct InferenceEngine {
    environment: Arc<SharedEnvironment>,
    registered_environment: bool,
    codec: CodecConfig,
    model_paths: Vec<PathBuf>,
}

impl InferenceEngine {
    /// Registers the runtime environment and creates an engine.
    ///
    /// The runtime keeps a single process-wide environment and the first commit wins.
    /// A later engine reuses that environment, its configured name is ignored and a
    /// warning is logged. Log level and memory policy still apply per session.
    ///
    /// # Errors
    ///
    /// Returns [`InpaintError::BackendInit`] if the runtime rejects the environment or
    /// the CPU memory descriptor.
    pub fn new(config: EnvironmentConfig, memory: MemoryPolicy) -> InpaintResult<Self> {
        if config.name.trim().is_empty() {
            return Err(InpaintError::config_error_with_context(
                "environment.name",
                &config.name,
                "must not be empty",
            ));
        }

        let registered_environment = match ort::init().with_name(config.name.clone()).commit() {
            Ok(true) => {
                info!(
                    name = %config.name,
                    log_level = ?config.log_level,
                    memory_pattern = memory.memory_pattern,
                    "ONNX Runtime environment committed"
                );
                true
            }
            Ok(false) => {
                warn!(
                    name = %config.name,
                    "ONNX Runtime environment already exists in this process; reusing it, name ignored"
                );
                false
            }
            Err(e) => {
                return Err(InpaintError::backend_init_error(
                    "onnxruntime",
                    format!("failed to commit environment '{}'", config.name),
                    Some(e),
                ));
            }
        };

        let memory_descriptor = MemoryDescriptor::cpu().validated()?;

        Ok(Self {
            environment: Arc::new(SharedEnvironment::new(&config, memory, memory_descriptor)),
            registered_environment,
            codec: CodecConfig::default(),
            model_paths: Vec::new(),
        })
    }

    /// Sets the codec configuration given to sessions created from now on.
    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    /// The shared environment.
    pub fn environment(&self) -> &Arc<SharedEnvironment> {
        &self.environment
    }

    /// True if this engine created the process-wide runtime environment, false if it
    /// reused one that already existed.
    pub fn registered_environment(&self) -> bool {
        self.registered_environment
    }

    /// Paths of every model this engine has loaded, in load order.
    pub fn model_paths(&self) -> &[PathBuf] {
        &self.model_paths
    }

    /// Loads one model.
    pub fn init_session(
        &mut self,
        model_path: impl AsRef<Path>,
        config: &ExecutionConfig,
    ) -> InpaintResult<ModelSession> {
        let session = self.load(model_path.as_ref(), config)?;
        self.model_paths.push(session.model_path().to_path_buf());
        Ok(session)
    }

    /// Loads one session per path, in order.
    ///
    /// Construction is all-or-nothing: if any model fails to load, sessions built so far
    /// are dropped and the first error is returned.
    pub fn init_sessions<P: AsRef<Path>>(
        &mut self,
        model_paths: &[P],
        config: &ExecutionConfig,
    ) -> InpaintResult<Vec<ModelSession>> {
        if model_paths.is_empty() {
            return Err(InpaintError::invalid_argument("model path list is empty"));
        }
        config.validate()?;

        let sessions = model_paths
            .iter()
            .map(|p| self.load(p.as_ref(), config))
            .collect::<InpaintResult<Vec<_>>>()
            .inspect_err(|e| warn!(error = %e, "session initialization aborted"))?;

        self.model_paths
            .extend(sessions.iter().map(|s| s.model_path().to_path_buf()));
        info!(count = sessions.len(), "sessions initialized");
        Ok(sessions)
    }

    fn load(&self, model_path: &Path, config: &ExecutionConfig) -> InpaintResult<ModelSession> {
        if model_path.as_os_str().is_empty() {
            return Err(InpaintError::invalid_argument("model path is empty"));
        }
        info!(path = %model_path.display(), cores = config.num_cpu_cores, "loading model");
        ModelSession::new(
            Arc::clone(&self.environment),
            model_path,
            config,
            self.codec.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    fn engine() -> InferenceEngine {
        InferenceEngine::new(
            EnvironmentConfig::default().with_name("engine-test"),
            MemoryPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_path_list_is_invalid_argument() {
        let mut engine = engine();
        let paths: [&str; 0] = [];
        let err = engine
            .init_sessions(&paths, &ExecutionConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(engine.model_paths().is_empty());
    }

    #[test]
    fn test_empty_single_path_is_invalid_argument() {
        let mut engine = engine();
        let err = engine
            .init_session("", &ExecutionConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_missing_model_fails_and_records_nothing() {
        let mut engine = engine();
        let err = engine
            .init_sessions(&["missing_a.onnx", "missing_b.onnx"], &ExecutionConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
        assert!(err.to_string().contains("missing_a.onnx"));
        assert!(engine.model_paths().is_empty());
    }

    #[test]
    fn test_environment_is_shared_and_named() {
        let engine = engine();
        assert_eq!(engine.environment().name(), "engine-test");
        assert_eq!(engine.environment().log_level(), EngineLogLevel::Warning);
        assert!(engine.environment().memory().memory_pattern);
    }

    #[test]
    fn test_second_engine_reuses_process_environment() {
        let first = engine();
        let second = InferenceEngine::new(
            EnvironmentConfig::default().with_name("engine-test-other"),
            MemoryPolicy::default(),
        )
        .unwrap();
        assert!(!second.registered_environment());
        assert_eq!(second.environment().name(), "engine-test-other");
        assert_eq!(
            first.environment().memory_descriptor(),
            second.environment().memory_descriptor()
        );
    }

    #[test]
    fn test_sessions_share_one_memory_descriptor() {
        let mut engine = engine();
        let path = crate::core::inference::fixture_path("masked_fill_8x8.onnx");
        let sessions = engine
            .init_sessions(&[&path, &path], &ExecutionConfig::default())
            .unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(Arc::ptr_eq(sessions[0].environment(), engine.environment()));
        assert!(Arc::ptr_eq(sessions[0].environment(), sessions[1].environment()));
        assert_eq!(
            sessions[1].environment().memory_descriptor(),
            MemoryDescriptor::cpu()
        );
        assert_eq!(engine.model_paths(), &[path.clone(), path]);
    }

    #[test]
    fn test_blank_environment_name_is_rejected() {
        let err = InferenceEngine::new(
            EnvironmentConfig::default().with_name("  "),
            MemoryPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
