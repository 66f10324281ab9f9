//! Execution configuration for ONNX Runtime sessions.
//!
//! [`ExecutionConfig`] is the immutable description of how a session should run:
//! how many cores it may use, which accelerator backends to register and how the
//! graph should be optimized. [`ExecutionConfig::session_plan`] resolves the
//! precedence rules into a [`SessionPlan`] without touching ONNX Runtime, so the
//! rules can be inspected and tested on their own.

use crate::core::errors::{InpaintError, InpaintResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Basic optimizations (constant folding, redundant node elimination).
    Level1,
    /// Extended optimizations (node fusions).
    Level2,
    /// All optimizations including layout transformations.
    Level3,
}

/// NNAPI sub-flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NnapiFlags {
    /// Allow FP16 relaxed precision.
    #[serde(default)]
    pub use_fp16: bool,
    /// Forbid NNAPI from falling back to its CPU reference implementation.
    #[serde(default)]
    pub cpu_disabled: bool,
    /// Only use the NNAPI CPU implementation.
    #[serde(default)]
    pub cpu_only: bool,
    /// Use NCHW layout inside NNAPI.
    #[serde(default)]
    pub use_nchw: bool,
}

impl NnapiFlags {
    const USE_FP16: u32 = 1 << 0;
    const CPU_DISABLED: u32 = 1 << 1;
    const CPU_ONLY: u32 = 1 << 2;
    const USE_NCHW: u32 = 1 << 3;

    /// Returns the raw NNAPI provider flag word.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.use_fp16 {
            bits |= Self::USE_FP16;
        }
        if self.cpu_disabled {
            bits |= Self::CPU_DISABLED;
        }
        if self.cpu_only {
            bits |= Self::CPU_ONLY;
        }
        if self.use_nchw {
            bits |= Self::USE_NCHW;
        }
        bits
    }

    /// Rebuilds flags from a raw provider flag word. Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            use_fp16: bits & Self::USE_FP16 != 0,
            cpu_disabled: bits & Self::CPU_DISABLED != 0,
            cpu_only: bits & Self::CPU_ONLY != 0,
            use_nchw: bits & Self::USE_NCHW != 0,
        }
    }
}

/// XNNPACK options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XnnpackOptions {
    /// Let XNNPACK share the session's intra-op thread pool instead of owning one.
    #[serde(default)]
    pub use_session_threads: bool,
}

/// How a session should execute.
///
/// The default is a portable CPU configuration. [`ExecutionConfig::mobile`] returns
/// the accelerator-heavy preset used on Android devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Number of CPU cores the session may use.
    #[serde(default = "ExecutionConfig::default_num_cpu_cores")]
    pub num_cpu_cores: usize,
    /// Register the XNNPACK execution provider.
    #[serde(default)]
    pub use_xnnpack: bool,
    /// Register the NNAPI execution provider.
    #[serde(default)]
    pub use_nnapi: bool,
    /// Run independent graph branches in parallel.
    #[serde(default)]
    pub use_parallel_execution: bool,
    /// Use full (layout) optimization instead of extended when no NPU is enabled.
    #[serde(default)]
    pub use_layout_optimization: bool,
    /// NNAPI sub-flags, only read when `use_nnapi` is set.
    #[serde(default)]
    pub nnapi: NnapiFlags,
    /// XNNPACK options, only read when `use_xnnpack` is set.
    #[serde(default)]
    pub xnnpack: XnnpackOptions,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            num_cpu_cores: Self::default_num_cpu_cores(),
            use_xnnpack: false,
            use_nnapi: false,
            use_parallel_execution: false,
            use_layout_optimization: false,
            nnapi: NnapiFlags::default(),
            xnnpack: XnnpackOptions::default(),
        }
    }
}

impl ExecutionConfig {
    /// Creates a CPU-only configuration using every available core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Android preset: XNNPACK and NNAPI both enabled.
    pub fn mobile(num_cpu_cores: usize) -> Self {
        Self {
            num_cpu_cores,
            use_xnnpack: true,
            use_nnapi: true,
            ..Self::default()
        }
    }

    fn default_num_cpu_cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Sets the number of CPU cores.
    pub fn with_num_cpu_cores(mut self, cores: usize) -> Self {
        self.num_cpu_cores = cores;
        self
    }

    /// Enables or disables XNNPACK.
    pub fn with_xnnpack(mut self, enabled: bool) -> Self {
        self.use_xnnpack = enabled;
        self
    }

    /// Sets XNNPACK options.
    pub fn with_xnnpack_options(mut self, options: XnnpackOptions) -> Self {
        self.xnnpack = options;
        self
    }

    /// Enables or disables NNAPI.
    pub fn with_nnapi(mut self, enabled: bool) -> Self {
        self.use_nnapi = enabled;
        self
    }

    /// Sets NNAPI flags.
    pub fn with_nnapi_flags(mut self, flags: NnapiFlags) -> Self {
        self.nnapi = flags;
        self
    }

    /// Enables or disables parallel execution mode.
    pub fn with_parallel_execution(mut self, enabled: bool) -> Self {
        self.use_parallel_execution = enabled;
        self
    }

    /// Prefers full layout optimization over extended optimization.
    pub fn with_layout_optimization(mut self, enabled: bool) -> Self {
        self.use_layout_optimization = enabled;
        self
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> InpaintResult<()> {
        if self.num_cpu_cores == 0 {
            return Err(InpaintError::config_error_with_context(
                "num_cpu_cores",
                "0",
                "must be at least 1",
            ));
        }
        if self.use_nnapi && self.nnapi.cpu_only && self.nnapi.cpu_disabled {
            return Err(InpaintError::config_error_with_context(
                "nnapi",
                &format!("{:#06b}", self.nnapi.bits()),
                "cpu_only and cpu_disabled are mutually exclusive",
            ));
        }
        Ok(())
    }

    /// Whether an accelerator owns intra-op threading for the session.
    pub fn accelerator_owns_intra_threads(&self) -> bool {
        self.use_xnnpack && !self.xnnpack.use_session_threads
    }

    /// Selects the graph optimization level.
    ///
    /// NNAPI takes precedence and forces basic optimization for compatibility, then the
    /// layout flag selects full optimization, otherwise extended optimization is used.
    pub fn optimization_level(&self) -> GraphOptimizationLevel {
        if self.use_nnapi {
            GraphOptimizationLevel::Level1
        } else if self.use_layout_optimization {
            GraphOptimizationLevel::Level3
        } else {
            GraphOptimizationLevel::Level2
        }
    }

    /// Resolves this configuration into concrete session settings.
    pub fn session_plan(&self) -> SessionPlan {
        let cores = self.num_cpu_cores.max(1);
        let intra_threads = if self.accelerator_owns_intra_threads() {
            1
        } else {
            cores
        };

        let mut providers = Vec::new();
        if self.use_xnnpack {
            let intra_op_threads = if self.xnnpack.use_session_threads {
                None
            } else {
                NonZeroUsize::new(cores)
            };
            providers.push(ProviderPlan::Xnnpack { intra_op_threads });
        }
        if self.use_nnapi {
            providers.push(ProviderPlan::Nnapi { flags: self.nnapi });
        }

        SessionPlan {
            inter_threads: cores,
            intra_threads,
            optimization_level: self.optimization_level(),
            parallel_execution: self.use_parallel_execution,
            intra_op_spinning: if self.use_xnnpack { Some(false) } else { None },
            providers,
        }
    }
}

/// An accelerator backend to register, with its resolved options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPlan {
    /// XNNPACK. `None` threads means it shares the session's intra-op pool.
    Xnnpack {
        /// Threads owned by XNNPACK.
        intra_op_threads: Option<NonZeroUsize>,
    },
    /// Android NNAPI.
    Nnapi {
        /// Provider flags.
        flags: NnapiFlags,
    },
}

impl ProviderPlan {
    /// Short backend name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderPlan::Xnnpack { .. } => "XNNPACK",
            ProviderPlan::Nnapi { .. } => "NNAPI",
        }
    }
}

/// Concrete session settings derived from an [`ExecutionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    /// Threads used across graph nodes.
    pub inter_threads: usize,
    /// Threads used within a node.
    pub intra_threads: usize,
    /// Graph optimization level.
    pub optimization_level: GraphOptimizationLevel,
    /// Parallel execution mode.
    pub parallel_execution: bool,
    /// Intra-op spinning override, `None` keeps the runtime default.
    pub intra_op_spinning: Option<bool>,
    /// Accelerators in registration order.
    pub providers: Vec<ProviderPlan>,
}
