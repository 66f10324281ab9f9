//! Error constructor utilities.
//!
//! Helpers for building [`InpaintError`] values with consistent context strings.
//!
//! ```rust
//! use oar_inpaint::core::InpaintError;
//!
//! let error = InpaintError::shape_error(
//!     "preprocess",
//!     &[3],
//!     &[1],
//!     "image must have 3 channels",
//! );
//! assert!(error.to_string().contains("preprocess"));
//! ```

use super::types::{InpaintError, SimpleError};

impl InpaintError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a configuration error naming the offending field.
    pub fn config_error_with_context(field: &str, value: &str, reason: &str) -> Self {
        Self::ConfigError {
            message: format!(
                "Configuration error in field '{field}' with value '{value}': {reason}"
            ),
        }
    }

    /// Creates a decode error, optionally wrapping the codec error.
    pub fn decode_error(context: impl Into<String>, source: Option<image::ImageError>) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// Creates an encode error, optionally wrapping the codec error.
    pub fn encode_error(
        format: impl Into<String>,
        context: impl Into<String>,
        source: Option<image::ImageError>,
    ) -> Self {
        Self::Encode {
            format: format.into(),
            context: context.into(),
            source,
        }
    }

    /// Creates a shape error with the expected and observed dimensions.
    pub fn shape_error(
        operation: &str,
        expected: &[usize],
        actual: &[usize],
        context: impl Into<String>,
    ) -> Self {
        Self::Shape {
            operation: operation.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
            context: context.into(),
        }
    }

    /// Creates an error for model load failures with contextual suggestions.
    ///
    /// # Arguments
    /// * `model_path` - Path to the model file
    /// * `reason` - Short reason description
    /// * `suggestion` - Optional suggestion message (without punctuation)
    /// * `source` - Optional underlying error
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an error for a backend or execution provider that could not be initialized.
    pub fn backend_init_error(
        backend: impl Into<String>,
        context: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::BackendInit {
            backend: backend.into(),
            context: context.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an inference error with model and operation context.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The name of the model where inference failed.
    /// * `operation` - The step that failed.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn inference_error(
        model_name: &str,
        operation: &str,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            operation: operation.to_string(),
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an inference error that has no underlying backend error.
    pub fn inference_message(model_name: &str, operation: &str, message: &str) -> Self {
        Self::inference_error(model_name, operation, message, SimpleError::new(message))
    }

    /// Creates the aggregate error returned when every session failed.
    pub fn all_sessions_failed(failures: Vec<String>) -> Self {
        Self::AllSessionsFailed {
            attempted: failures.len(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use std::error::Error as _;

    #[test]
    fn test_model_load_error_formats_suggestion() {
        let err = InpaintError::model_load_error(
            "models/a.onnx",
            "failed to create ONNX session",
            Some("verify model file exists"),
            None::<SimpleError>,
        );
        let text = err.to_string();
        assert!(text.contains("models/a.onnx"));
        assert!(text.contains("suggested fix: verify model file exists"));
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
    }

    #[test]
    fn test_inference_error_keeps_source() {
        let err = InpaintError::inference_message("lama", "forward_pass", "boom");
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_all_sessions_failed_counts_failures() {
        let err = InpaintError::all_sessions_failed(vec!["a".into(), "b".into()]);
        match &err {
            InpaintError::AllSessionsFailed { attempted, .. } => assert_eq!(*attempted, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("a; b"));
    }

    #[test]
    fn test_tensor_layout_errors_are_shape_kind() {
        let err: InpaintError = ndarray::Array2::<f32>::from_shape_vec((2, 2), vec![0.0; 3])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }
}
