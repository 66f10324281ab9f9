//! # OAR Inpaint
//!
//! A Rust library that runs image inpainting models on device using ONNX Runtime.
//! Callers hand in an encoded image and an encoded mask; the engine returns an encoded
//! image with the masked region filled in.
//!
//! ## Features
//!
//! - Byte-level end-to-end API: decode, resize, binarize, infer, encode
//! - Configurable sessions: threading, graph optimization and XNNPACK / NNAPI acceleration
//! - One shared runtime environment for any number of model sessions
//! - Sequential fallback across sessions, or a synchronized parallel dispatch
//! - An `Option`-returning handle for foreign-function boundaries
//!
//! ## Modules
//!
//! * [`core`] - Configuration, errors, the runtime environment and model sessions
//! * [`pipeline`] - Runner, parallel dispatcher and boundary handle
//! * [`processors`] - Image/tensor conversion (codec, mask, normalization)
//! * [`utils`] - Filesystem helpers and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oar_inpaint::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = InpaintRunner::with_models(["models/lama_fp32.onnx"])?;
//!
//! let image = read_image_bytes(Path::new("photo.jpg"))?;
//! let mask = read_image_bytes(Path::new("mask.png"))?;
//! let output = runner.infer_from_bytes(&image, &mask)?;
//!
//! write_image_bytes(Path::new("result.png"), &output)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Configuration
//!
//! ```rust,no_run
//! use oar_inpaint::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunnerConfig::from_json_str(r#"
//! {
//!   "model_paths": ["models/lama_fp32.onnx", "models/lama_int8.onnx"],
//!   "environment": { "name": "inpaint", "log_level": "warning" },
//!   "execution": { "num_cpu_cores": 4, "use_xnnpack": false },
//!   "codec": { "output_format": "jpeg" }
//! }
//! "#)?;
//!
//! let runner = InpaintRunner::new(config)?;
//! # let _ = runner;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use oar_inpaint::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - Runners (`InpaintRunner`, `RunnerHandle`)
/// - Configuration (`RunnerConfig`, `ExecutionConfig`, `CodecConfig`)
/// - Essential error and result types (`InpaintError`, `InpaintResult`)
/// - File helpers (`read_image_bytes`, `write_image_bytes`)
///
/// For lower-level access (sessions, tensor codec, dispatcher reports),
/// import directly from the respective modules.
pub mod prelude {
    // Runners (essential)
    pub use crate::pipeline::{InpaintRunner, RunnerHandle};

    // Configuration
    pub use crate::core::{CodecConfig, ExecutionConfig, OutputFormat, RunnerConfig};

    // Error Handling (essential)
    pub use crate::core::{InpaintError, InpaintResult};

    // File helpers (minimal)
    pub use crate::utils::{read_image_bytes, write_image_bytes};
}
