//! Input/output discovery for loaded models.

use crate::core::constants::BATCH_SIZE;
use crate::core::errors::{InpaintError, InpaintResult, SimpleError};
use crate::processors::TargetSize;
use ort::session::Session;
use ort::value::ValueType;
use std::path::Path;
use tracing::info;

/// Name and declared shape of one model input or output.
///
/// Dynamic dimensions are kept as negative values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    /// Tensor name in the graph.
    pub name: String,
    /// Declared dimensions.
    pub shape: Vec<i64>,
}

impl TensorInfo {
    /// Creates a tensor description.
    pub fn new(name: impl Into<String>, shape: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Replaces a dynamic leading batch dimension with 1.
    pub fn pin_batch(mut self) -> Self {
        if self.shape.first() == Some(&-1) {
            self.shape[0] = BATCH_SIZE as i64;
        }
        self
    }

    /// Renders the shape as `[1,3,?,?]`, with `?` for dynamic dimensions.
    pub fn shape_string(&self) -> String {
        let dims: Vec<String> = self
            .shape
            .iter()
            .map(|&d| if d < 0 { "?".to_string() } else { d.to_string() })
            .collect();
        format!("[{}]", dims.join(","))
    }

    fn from_value_type(name: &str, value_type: &ValueType) -> Self {
        let shape = match value_type {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            _ => Vec::new(),
        };
        Self::new(name, shape)
    }
}

/// Which declared input receives the image and which the mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    /// Input fed with the `(1, 3, H, W)` image tensor.
    pub image: String,
    /// Input fed with the `(1, 1, H, W)` mask tensor.
    pub mask: String,
}

/// Everything discovered about a model's inputs and outputs at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIo {
    /// Declared inputs with the batch dimension pinned.
    pub inputs: Vec<TensorInfo>,
    /// Declared outputs.
    pub outputs: Vec<TensorInfo>,
    /// Image and mask input names.
    pub binding: InputBinding,
    /// Spatial size read from the first input.
    pub target: TargetSize,
}

impl ModelIo {
    /// Reads the declared inputs and outputs of a session.
    pub fn from_session(session: &Session, model_path: &Path) -> InpaintResult<Self> {
        let inputs = session
            .inputs
            .iter()
            .map(|i| TensorInfo::from_value_type(&i.name, &i.input_type).pin_batch())
            .collect();
        let outputs = session
            .outputs
            .iter()
            .map(|o| TensorInfo::from_value_type(&o.name, &o.output_type))
            .collect();
        Self::resolve(inputs, outputs, model_path)
    }

    /// Validates declared inputs and outputs and derives the binding and target size.
    pub fn resolve(
        inputs: Vec<TensorInfo>,
        outputs: Vec<TensorInfo>,
        model_path: &Path,
    ) -> InpaintResult<Self> {
        if inputs.len() < 2 {
            return Err(InpaintError::model_load_error(
                model_path,
                format!("expected image and mask inputs, found {}", inputs.len()),
                Some("use a model taking (image, mask)"),
                None::<SimpleError>,
            ));
        }
        if outputs.is_empty() {
            return Err(InpaintError::model_load_error(
                model_path,
                "model declares no outputs",
                None,
                None::<SimpleError>,
            ));
        }

        let target = target_size(&inputs[0]).ok_or_else(|| {
            InpaintError::model_load_error(
                model_path,
                format!(
                    "first input '{}' has no fixed spatial size: {}",
                    inputs[0].name,
                    inputs[0].shape_string()
                ),
                Some("export the model with a static NCHW input size"),
                None::<SimpleError>,
            )
        })?;
        let binding = bind_inputs(&inputs);

        Ok(Self {
            inputs,
            outputs,
            binding,
            target,
        })
    }

    /// Logs every input and output with its shape.
    pub fn log(&self, model_path: &Path) {
        info!(path = %model_path.display(), "model loaded");
        info!(
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            "model io"
        );
        info!(
            width = self.target.width,
            height = self.target.height,
            "target image size (NCHW)"
        );
        for (i, input) in self.inputs.iter().enumerate() {
            info!(index = i, name = %input.name, shape = %input.shape_string(), "input");
        }
        for (i, output) in self.outputs.iter().enumerate() {
            info!(index = i, name = %output.name, shape = %output.shape_string(), "output");
        }
        info!(
            image = %self.binding.image,
            mask = %self.binding.mask,
            "input binding"
        );
    }

    /// Output names in declaration order.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.name.as_str())
    }
}

/// Reads `(W, H)` from the last two dimensions of an NCHW input.
fn target_size(input: &TensorInfo) -> Option<TargetSize> {
    if input.shape.len() != 4 {
        return None;
    }
    let height = u32::try_from(input.shape[2]).ok().filter(|&h| h > 0)?;
    let width = u32::try_from(input.shape[3]).ok().filter(|&w| w > 0)?;
    Some(TargetSize::new(width, height))
}

/// Picks the mask input by name, falling back to declaration order.
fn bind_inputs(inputs: &[TensorInfo]) -> InputBinding {
    let mask_idx = inputs
        .iter()
        .position(|i| i.name.to_ascii_lowercase().contains("mask"));
    match mask_idx {
        Some(mask_idx) => {
            let image_idx = if mask_idx == 0 { 1 } else { 0 };
            InputBinding {
                image: inputs[image_idx].name.clone(),
                mask: inputs[mask_idx].name.clone(),
            }
        }
        None => InputBinding {
            image: inputs[0].name.clone(),
            mask: inputs[1].name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    fn path() -> &'static Path {
        Path::new("models/test.onnx")
    }

    #[test]
    fn test_shape_string_marks_dynamic_dims() {
        let info = TensorInfo::new("image", vec![-1, 3, -1, 512]);
        assert_eq!(info.shape_string(), "[?,3,?,512]");
        assert_eq!(info.pin_batch().shape_string(), "[1,3,?,512]");
    }

    #[test]
    fn test_pin_batch_only_touches_leading_dynamic_dim() {
        let info = TensorInfo::new("x", vec![2, -1, 8, 8]).pin_batch();
        assert_eq!(info.shape, vec![2, -1, 8, 8]);
        assert!(TensorInfo::new("scalar", vec![]).pin_batch().shape.is_empty());
    }

    #[test]
    fn test_resolve_reads_target_from_first_input() {
        let io = ModelIo::resolve(
            vec![
                TensorInfo::new("image", vec![1, 3, 384, 512]),
                TensorInfo::new("mask", vec![1, 1, 384, 512]),
            ],
            vec![TensorInfo::new("output", vec![1, 3, 384, 512])],
            path(),
        )
        .unwrap();
        assert_eq!(io.target, TargetSize::new(512, 384));
        assert_eq!(io.output_names().collect::<Vec<_>>(), vec!["output"]);
    }

    #[test]
    fn test_mask_input_bound_by_name() {
        let io = ModelIo::resolve(
            vec![
                TensorInfo::new("input_mask", vec![1, 1, 256, 256]),
                TensorInfo::new("input_image", vec![1, 3, 256, 256]),
            ],
            vec![TensorInfo::new("out", vec![1, 3, 256, 256])],
            path(),
        )
        .unwrap();
        assert_eq!(io.binding.image, "input_image");
        assert_eq!(io.binding.mask, "input_mask");
    }

    #[test]
    fn test_inputs_bound_positionally_without_names() {
        let io = ModelIo::resolve(
            vec![
                TensorInfo::new("a", vec![1, 3, 64, 64]),
                TensorInfo::new("b", vec![1, 1, 64, 64]),
            ],
            vec![TensorInfo::new("c", vec![1, 3, 64, 64])],
            path(),
        )
        .unwrap();
        assert_eq!(io.binding.image, "a");
        assert_eq!(io.binding.mask, "b");
    }

    #[test]
    fn test_resolve_rejects_unusable_models() {
        let single = ModelIo::resolve(
            vec![TensorInfo::new("image", vec![1, 3, 64, 64])],
            vec![TensorInfo::new("out", vec![1, 3, 64, 64])],
            path(),
        )
        .unwrap_err();
        assert_eq!(single.kind(), ErrorKind::ModelLoad);

        let dynamic = ModelIo::resolve(
            vec![
                TensorInfo::new("image", vec![1, 3, -1, -1]),
                TensorInfo::new("mask", vec![1, 1, -1, -1]),
            ],
            vec![TensorInfo::new("out", vec![1, 3, -1, -1])],
            path(),
        )
        .unwrap_err();
        assert!(dynamic.to_string().contains("[1,3,?,?]"));

        let no_outputs = ModelIo::resolve(
            vec![
                TensorInfo::new("image", vec![1, 3, 64, 64]),
                TensorInfo::new("mask", vec![1, 1, 64, 64]),
            ],
            vec![],
            path(),
        )
        .unwrap_err();
        assert_eq!(no_outputs.kind(), ErrorKind::ModelLoad);
    }
}
