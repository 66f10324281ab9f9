//! Runner-level configuration: environment, memory policy and the top-level
//! [`RunnerConfig`] that bundles everything needed to stand up a runner.

use super::codec::CodecConfig;
use super::execution::ExecutionConfig;
use crate::core::constants::DEFAULT_ENVIRONMENT_NAME;
use crate::core::errors::{InpaintError, InpaintResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity threshold for ONNX Runtime's own log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineLogLevel {
    /// Everything, including graph transformation traces.
    Verbose,
    /// Informational messages.
    Info,
    /// Warnings and above.
    #[default]
    Warning,
    /// Errors and above.
    Error,
    /// Fatal errors only.
    Fatal,
}

impl From<EngineLogLevel> for ort::logging::LogLevel {
    fn from(level: EngineLogLevel) -> Self {
        use ort::logging::LogLevel;
        match level {
            EngineLogLevel::Verbose => LogLevel::Verbose,
            EngineLogLevel::Info => LogLevel::Info,
            EngineLogLevel::Warning => LogLevel::Warning,
            EngineLogLevel::Error => LogLevel::Error,
            EngineLogLevel::Fatal => LogLevel::Fatal,
        }
    }
}

/// Process-wide runtime environment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Name the runtime environment is registered under.
    #[serde(default = "EnvironmentConfig::default_name")]
    pub name: String,
    /// Runtime log severity applied to every session.
    #[serde(default)]
    pub log_level: EngineLogLevel,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            log_level: EngineLogLevel::default(),
        }
    }
}

impl EnvironmentConfig {
    fn default_name() -> String {
        DEFAULT_ENVIRONMENT_NAME.to_string()
    }

    /// Sets the environment name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the runtime log level.
    pub fn with_log_level(mut self, level: EngineLogLevel) -> Self {
        self.log_level = level;
        self
    }
}

/// Host memory settings shared by every session an engine creates.
///
/// Input tensors live in host memory allocated by the default CPU allocator; this
/// policy controls how the runtime plans its own buffers around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPolicy {
    /// Pre-plan intermediate buffers from the first run's allocation pattern.
    #[serde(default = "MemoryPolicy::default_memory_pattern")]
    pub memory_pattern: bool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            memory_pattern: Self::default_memory_pattern(),
        }
    }
}

impl MemoryPolicy {
    fn default_memory_pattern() -> bool {
        true
    }

    /// Enables or disables memory pattern planning.
    pub fn with_memory_pattern(mut self, enabled: bool) -> Self {
        self.memory_pattern = enabled;
        self
    }
}

/// Everything needed to build an inpainting runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Model files, one session each, in registration order.
    #[serde(default)]
    pub model_paths: Vec<PathBuf>,
    /// Runtime environment.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Memory policy shared by all sessions.
    #[serde(default)]
    pub memory: MemoryPolicy,
    /// Execution settings applied to every session.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Image and tensor conversion settings.
    #[serde(default)]
    pub codec: CodecConfig,
}

impl RunnerConfig {
    /// Creates a configuration for the given model files with default settings.
    pub fn new<P: Into<PathBuf>>(model_paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            model_paths: model_paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the execution configuration.
    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Sets the environment configuration.
    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the memory policy.
    pub fn with_memory(mut self, memory: MemoryPolicy) -> Self {
        self.memory = memory;
        self
    }

    /// Sets the codec configuration.
    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> InpaintResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| InpaintError::config_error(format!("invalid runner config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> InpaintResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Checks the configuration without touching the filesystem.
    ///
    /// An empty model list is accepted here; it is rejected when sessions are created.
    pub fn validate(&self) -> InpaintResult<()> {
        if self.environment.name.trim().is_empty() {
            return Err(InpaintError::config_error_with_context(
                "environment.name",
                &self.environment.name,
                "must not be empty",
            ));
        }
        if let Some(empty) = self
            .model_paths
            .iter()
            .position(|p| p.as_os_str().is_empty())
        {
            return Err(InpaintError::config_error_with_context(
                "model_paths",
                &empty.to_string(),
                "model path must not be empty",
            ));
        }
        self.execution.validate()
    }
}
