//! Error type definitions for the inpainting engine.

use thiserror::Error;

/// Fieldless view of an [`InpaintError`], used where only the category matters
/// (worker reports, boundary logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed call-site input.
    InvalidArgument,
    /// Image bytes could not be decoded.
    Decode,
    /// The codec rejected a pixel buffer.
    Encode,
    /// Tensor or channel-count mismatch.
    Shape,
    /// The model file could not be loaded as a graph.
    ModelLoad,
    /// The runtime environment or an accelerator backend could not be initialized.
    BackendInit,
    /// Backend execution failed.
    Inference,
    /// Every session in a dispatch failed.
    AllSessionsFailed,
    /// Invalid configuration value.
    Config,
    /// Filesystem failure.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::Shape => "shape",
            ErrorKind::ModelLoad => "model load",
            ErrorKind::BackendInit => "backend init",
            ErrorKind::Inference => "inference",
            ErrorKind::AllSessionsFailed => "all sessions failed",
            ErrorKind::Config => "configuration",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Errors produced by the inpainting engine.
///
/// Backend-native failures never escape as `ort::Error`; they are normalized into
/// [`InpaintError::ModelLoad`], [`InpaintError::BackendInit`] or
/// [`InpaintError::Inference`] at the point where they occur.
#[derive(Error, Debug)]
pub enum InpaintError {
    /// Empty or malformed input at the call site.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// A message describing the invalid argument.
        message: String,
    },

    /// Image bytes were empty or could not be parsed.
    #[error("decode failed: {context}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// The codec error, if the codec produced one.
        #[source]
        source: Option<image::ImageError>,
    },

    /// The codec refused to encode a pixel buffer.
    #[error("encode to {format} failed: {context}")]
    Encode {
        /// Target container format.
        format: String,
        /// Additional context.
        context: String,
        /// The codec error, if the codec produced one.
        #[source]
        source: Option<image::ImageError>,
    },

    /// Tensor dimensions or channel counts do not match the expected contract.
    #[error("shape mismatch in {operation}: expected {expected:?}, got {actual:?} ({context})")]
    Shape {
        /// The operation that checked the shape.
        operation: String,
        /// The expected dimensions.
        expected: Vec<usize>,
        /// The observed dimensions.
        actual: Vec<usize>,
        /// Additional context.
        context: String,
    },

    /// The model file is missing or is not a valid graph.
    #[error("failed to load model '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path of the model that failed to load.
        model_path: String,
        /// Short reason description.
        reason: String,
        /// Suggestion suffix, empty when there is none.
        suggestion: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The runtime environment or a requested execution provider could not be set up.
    #[error("backend '{backend}' initialization failed: {context}")]
    BackendInit {
        /// The backend or component being initialized.
        backend: String,
        /// Additional context.
        context: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend failed while executing a model.
    #[error("inference failed for model '{model_name}' during {operation}: {context}")]
    Inference {
        /// Name of the model being executed.
        model_name: String,
        /// The step that failed (e.g. `forward_pass`).
        operation: String,
        /// Additional context.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No session in a dispatch produced a usable result.
    #[error("all {attempted} sessions failed: {}", failures.join("; "))]
    AllSessionsFailed {
        /// Number of sessions that were attempted.
        attempted: usize,
        /// One diagnostic per failed session, in registration order.
        failures: Vec<String>,
    },

    /// Configuration is invalid.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// Error from ndarray reshaping.
    #[error("tensor layout")]
    Tensor(#[from] ndarray::ShapeError),
}

impl InpaintError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InpaintError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            InpaintError::Decode { .. } => ErrorKind::Decode,
            InpaintError::Encode { .. } => ErrorKind::Encode,
            InpaintError::Shape { .. } | InpaintError::Tensor(_) => ErrorKind::Shape,
            InpaintError::ModelLoad { .. } => ErrorKind::ModelLoad,
            InpaintError::BackendInit { .. } => ErrorKind::BackendInit,
            InpaintError::Inference { .. } => ErrorKind::Inference,
            InpaintError::AllSessionsFailed { .. } => ErrorKind::AllSessionsFailed,
            InpaintError::ConfigError { .. } => ErrorKind::Config,
            InpaintError::Io(_) => ErrorKind::Io,
        }
    }
}

/// A plain message error, used as a source when no underlying error exists.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new simple error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}
