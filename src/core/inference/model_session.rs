//! A loaded inpainting model bound to one ONNX Runtime session.

use super::engine::SharedEnvironment;
use super::io::{ModelIo, TensorInfo};
use super::session::{SessionDefaults, load_session_with};
use crate::core::config::{CodecConfig, ExecutionConfig};
use crate::core::errors::{InpaintError, InpaintResult, SimpleError};
use crate::core::traits::InpaintSession;
use crate::processors::{ColorRole, Image, TargetSize, TensorCodec};
use crate::core::Tensor4D;
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// One model file loaded into a session, with its discovered inputs and outputs.
///
/// Calls into the underlying session are serialized by a mutex, so a `ModelSession`
/// can be shared between threads but runs one inference at a time.
pub struct ModelSession {
    session: Mutex<Session>,
    environment: Arc<SharedEnvironment>,
    io: ModelIo,
    codec: TensorCodec,
    execution: ExecutionConfig,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for ModelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSession")
            .field("model_name", &self.model_name)
            .field("model_path", &self.model_path)
            .field("environment", &self.environment.name())
            .field("target", &self.io.target)
            .field("inputs", &self.io.inputs)
            .field("outputs", &self.io.outputs)
            .finish()
    }
}

impl ModelSession {
    /// Loads a model and discovers its inputs and outputs.
    ///
    /// # Errors
    ///
    /// * [`InpaintError::ConfigError`] if `execution` is invalid
    /// * [`InpaintError::ModelLoad`] if the file is missing, is not a valid graph, or
    ///   does not take an image and a mask of fixed size
    /// * [`InpaintError::BackendInit`] if a requested accelerator cannot be registered
    pub fn new(
        environment: Arc<SharedEnvironment>,
        model_path: impl AsRef<Path>,
        execution: &ExecutionConfig,
        codec: CodecConfig,
    ) -> InpaintResult<Self> {
        let path = model_path.as_ref();
        execution.validate()?;

        let plan = execution.session_plan();
        let defaults = SessionDefaults {
            log_level: environment.log_level(),
            memory: environment.memory(),
        };
        let session = load_session_with(path, &plan, defaults)?;

        let io = ModelIo::from_session(&session, path)?;
        io.log(path);

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        Ok(Self {
            session: Mutex::new(session),
            environment,
            io,
            codec: TensorCodec::new(codec),
            execution: execution.clone(),
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// The environment shared with every other session of the same engine.
    pub fn environment(&self) -> &Arc<SharedEnvironment> {
        &self.environment
    }

    /// Returns the model path.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name (file stem).
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Spatial size the model expects.
    pub fn target_size(&self) -> TargetSize {
        self.io.target
    }

    /// Declared inputs, batch dimension pinned.
    pub fn inputs(&self) -> &[TensorInfo] {
        &self.io.inputs
    }

    /// Declared outputs.
    pub fn outputs(&self) -> &[TensorInfo] {
        &self.io.outputs
    }

    /// The execution configuration this session was built with.
    pub fn execution_config(&self) -> &ExecutionConfig {
        &self.execution
    }

    /// The tensor codec used for this model.
    pub fn codec(&self) -> &TensorCodec {
        &self.codec
    }

    /// Runs the model and returns the first output as an image.
    pub fn infer(&self, image: &Image, mask: &Image) -> InpaintResult<Image> {
        self.infer_all(image, mask)?.into_iter().next().ok_or_else(|| {
            InpaintError::inference_message(&self.model_name, "output_extraction", "no outputs")
        })
    }

    /// Runs the model and returns every output as an image, in declaration order.
    pub fn infer_all(&self, image: &Image, mask: &Image) -> InpaintResult<Vec<Image>> {
        let (image_tensor, mask_tensor) = self.codec.preprocess(image, mask, self.io.target)?;
        debug!(
            model = %self.model_name,
            image = ?image_tensor.shape(),
            mask = ?mask_tensor.shape(),
            "running inference"
        );

        let mut session = self.session.lock().map_err(|_| {
            InpaintError::inference_error(
                &self.model_name,
                "session_lock",
                "failed to acquire session lock",
                SimpleError::new("session mutex poisoned"),
            )
        })?;

        let descriptor = self.environment.memory_descriptor();
        let allocator = descriptor.allocator(&session).map_err(|e| {
            InpaintError::inference_error(
                &self.model_name,
                "tensor_allocation",
                format!("failed to create {} allocator", descriptor.device_name()),
                e,
            )
        })?;
        let image_input = self.input_tensor(&allocator, &image_tensor, "image")?;
        let mask_input = self.input_tensor(&allocator, &mask_tensor, "mask")?;
        let inputs = ort::inputs![
            self.io.binding.image.as_str() => image_input,
            self.io.binding.mask.as_str() => mask_input
        ];

        let outputs = session.run(inputs).map_err(|e| {
            error!(model = %self.model_name, error = %e, "session run failed");
            InpaintError::inference_error(
                &self.model_name,
                "forward_pass",
                format!(
                    "inputs '{}' and '{}' at {}",
                    self.io.binding.image, self.io.binding.mask, self.io.target
                ),
                e,
            )
        })?;

        let mut images = Vec::with_capacity(self.io.outputs.len());
        for name in self.io.output_names() {
            let (shape, data) = outputs[name].try_extract_tensor::<f32>().map_err(|e| {
                InpaintError::inference_error(
                    &self.model_name,
                    "output_extraction",
                    format!("failed to extract output tensor '{name}' as f32"),
                    e,
                )
            })?;
            let dims: Vec<usize> = shape
                .iter()
                .map(|&d| usize::try_from(d).unwrap_or(0))
                .collect();
            debug!(model = %self.model_name, output = name, shape = ?dims, "output tensor");
            images.push(self.codec.postprocess(&dims, data)?);
        }
        Ok(images)
    }

    /// Copies a preprocessed array into a tensor allocated from the shared descriptor.
    fn input_tensor(
        &self,
        allocator: &Allocator,
        array: &Tensor4D,
        role: &str,
    ) -> InpaintResult<Tensor<f32>> {
        let allocation_error = |e: ort::Error| {
            InpaintError::inference_error(
                &self.model_name,
                "tensor_allocation",
                format!("{role} tensor {:?}", array.shape()),
                e,
            )
        };
        let mut tensor =
            Tensor::<f32>::new(allocator, array.shape().to_vec()).map_err(allocation_error)?;
        let (_, data) = tensor
            .try_extract_tensor_mut::<f32>()
            .map_err(allocation_error)?;
        data.iter_mut().zip(array.iter()).for_each(|(dst, &src)| *dst = src);
        Ok(tensor)
    }

    /// Decodes the inputs, runs the model and encodes the first output.
    pub fn run_end_to_end(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>> {
        check_input_bytes(image_bytes, mask_bytes)?;
        let image = self.codec.decode(image_bytes, ColorRole::Color)?;
        let mask = self.codec.decode(mask_bytes, ColorRole::Gray)?;
        let output = self.infer(&image, &mask)?;
        self.codec.encode(output)
    }
}

impl InpaintSession for ModelSession {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn run_end_to_end(&self, image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<Vec<u8>> {
        ModelSession::run_end_to_end(self, image_bytes, mask_bytes)
    }
}

/// Rejects empty encoded inputs before any decoding happens.
pub fn check_input_bytes(image_bytes: &[u8], mask_bytes: &[u8]) -> InpaintResult<()> {
    if image_bytes.is_empty() {
        return Err(InpaintError::invalid_argument("image bytes are empty"));
    }
    if mask_bytes.is_empty() {
        return Err(InpaintError::invalid_argument("mask bytes are empty"));
    }
    Ok(())
}
