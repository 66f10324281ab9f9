//! Helpers for building ONNX Runtime sessions from a [`SessionPlan`].

use crate::core::config::{
    EngineLogLevel, GraphOptimizationLevel, MemoryPolicy, ProviderPlan, SessionPlan,
};
use crate::core::errors::{InpaintError, InpaintResult};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use std::path::Path;
use tracing::debug;

/// Settings that apply to every session, independent of its execution plan.
#[derive(Debug, Clone, Copy)]
pub struct SessionDefaults {
    /// Runtime log severity.
    pub log_level: EngineLogLevel,
    /// Memory planning policy.
    pub memory: MemoryPolicy,
}

/// Loads a model with the given plan and shared settings.
///
/// Builder and provider failures are reported as [`InpaintError::BackendInit`]; failures
/// to read or parse the model file as [`InpaintError::ModelLoad`].
pub fn load_session_with(
    model_path: impl AsRef<Path>,
    plan: &SessionPlan,
    defaults: SessionDefaults,
) -> InpaintResult<Session> {
    let path = model_path.as_ref();
    if !path.is_file() {
        return Err(InpaintError::model_load_error(
            path,
            "model file not found",
            Some("verify model file exists and is readable"),
            None::<std::io::Error>,
        ));
    }

    let builder = Session::builder()
        .and_then(|b| apply_session_plan(b, plan, defaults))
        .map_err(|e| {
            InpaintError::backend_init_error(
                "onnxruntime",
                "failed to configure session options",
                Some(e),
            )
        })?;

    let builder = if plan.providers.is_empty() {
        builder
    } else {
        let names: Vec<_> = plan.providers.iter().map(ProviderPlan::name).collect();
        let providers = build_execution_providers(&plan.providers).map_err(|e| {
            InpaintError::backend_init_error(names.join("+"), "provider unavailable", Some(e))
        })?;
        builder.with_execution_providers(providers).map_err(|e| {
            InpaintError::backend_init_error(
                names.join("+"),
                "failed to register execution providers",
                Some(e),
            )
        })?
    };

    builder.commit_from_file(path).map_err(|e| {
        InpaintError::model_load_error(
            path,
            "failed to create ONNX session",
            Some("check execution provider configuration and model file"),
            Some(e),
        )
    })
}

fn apply_session_plan(
    mut builder: SessionBuilder,
    plan: &SessionPlan,
    defaults: SessionDefaults,
) -> Result<SessionBuilder, ort::Error> {
    use ort::session::builder::GraphOptimizationLevel as GOL;

    debug!(?plan, "applying session plan");

    builder = builder
        .with_log_level(defaults.log_level.into())?
        .with_memory_pattern(defaults.memory.memory_pattern)?
        .with_intra_threads(plan.intra_threads)?
        .with_inter_threads(plan.inter_threads)?
        .with_parallel_execution(plan.parallel_execution)?;

    let level = match plan.optimization_level {
        GraphOptimizationLevel::DisableAll => GOL::Disable,
        GraphOptimizationLevel::Level1 => GOL::Level1,
        GraphOptimizationLevel::Level2 => GOL::Level2,
        GraphOptimizationLevel::Level3 => GOL::Level3,
    };
    builder = builder.with_optimization_level(level)?;

    if let Some(spinning) = plan.intra_op_spinning {
        builder = builder.with_intra_op_spinning(spinning)?;
    }
    Ok(builder)
}

/// Builds execution providers in plan order.
///
/// Every provider fails session creation if it cannot be registered, so a requested
/// accelerator never silently degrades to CPU.
fn build_execution_providers(
    providers: &[ProviderPlan],
) -> Result<Vec<ExecutionProviderDispatch>, ort::Error> {
    providers.iter().map(build_execution_provider).collect()
}

fn build_execution_provider(provider: &ProviderPlan) -> Result<ExecutionProviderDispatch, ort::Error> {
    match provider {
        #[cfg(feature = "xnnpack")]
        ProviderPlan::Xnnpack { intra_op_threads } => {
            let mut xnnpack = ort::execution_providers::XNNPACKExecutionProvider::default();
            if let Some(threads) = intra_op_threads {
                xnnpack = xnnpack.with_intra_op_num_threads(*threads);
            }
            Ok(xnnpack.build().error_on_failure())
        }
        #[cfg(feature = "nnapi")]
        ProviderPlan::Nnapi { flags } => {
            let nnapi = ort::execution_providers::NNAPIExecutionProvider::default()
                .with_fp16(flags.use_fp16)
                .with_nchw(flags.use_nchw)
                .with_disable_cpu(flags.cpu_disabled)
                .with_cpu_only(flags.cpu_only);
            Ok(nnapi.build().error_on_failure())
        }
        #[cfg(not(feature = "xnnpack"))]
        ProviderPlan::Xnnpack { .. } => Err(ort::Error::new(
            "XNNPACK execution provider requested but xnnpack feature is not enabled",
        )),
        #[cfg(not(feature = "nnapi"))]
        ProviderPlan::Nnapi { .. } => Err(ort::Error::new(
            "NNAPI execution provider requested but nnapi feature is not enabled",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExecutionConfig;
    use crate::core::errors::ErrorKind;

    fn defaults() -> SessionDefaults {
        SessionDefaults {
            log_level: EngineLogLevel::Error,
            memory: MemoryPolicy::default(),
        }
    }

    #[test]
    fn test_missing_model_is_model_load_error() {
        let plan = ExecutionConfig::new().with_num_cpu_cores(1).session_plan();
        let err = load_session_with("dummy_path.onnx", &plan, defaults())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
        assert!(err.to_string().contains("dummy_path.onnx"));
    }

    #[cfg(not(feature = "xnnpack"))]
    #[test]
    fn test_xnnpack_without_feature_is_rejected() {
        let plan = ExecutionConfig::new().with_xnnpack(true).session_plan();
        let err = build_execution_providers(&plan.providers).err().unwrap();
        assert!(err.to_string().contains("xnnpack feature is not enabled"));
    }

    #[cfg(not(feature = "nnapi"))]
    #[test]
    fn test_nnapi_without_feature_is_rejected() {
        let plan = ExecutionConfig::new().with_nnapi(true).session_plan();
        let err = build_execution_providers(&plan.providers).err().unwrap();
        assert!(err.to_string().contains("nnapi feature is not enabled"));
    }

    #[test]
    fn test_cpu_plan_builds_no_providers() {
        let plan = ExecutionConfig::new().with_num_cpu_cores(2).session_plan();
        assert!(plan.providers.is_empty());
        let providers = build_execution_providers(&plan.providers).unwrap();
        assert!(providers.is_empty());
    }

    #[test]
    fn test_fixture_loads_with_tuned_plan() {
        let plan = ExecutionConfig::new()
            .with_num_cpu_cores(2)
            .with_parallel_execution(true)
            .session_plan();
        let session = load_session_with(
            crate::core::inference::fixture_path("masked_fill_8x8.onnx"),
            &plan,
            defaults(),
        )
        .unwrap();
        let names: Vec<_> = session.inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["image", "mask"]);
        assert_eq!(session.outputs.len(), 1);
    }
}
