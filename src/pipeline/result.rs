//! Per-worker outcomes of a parallel dispatch.

use crate::core::errors::{ErrorKind, InpaintError, InpaintResult};
use std::fmt;
use std::time::{Duration, Instant};

/// Outcome of one session's end-to-end call.
#[derive(Debug, Clone)]
pub enum InferenceResult {
    /// The session produced encoded output bytes.
    Completed {
        /// Encoded output image.
        output: Vec<u8>,
        /// Time spent in the call.
        elapsed: Duration,
    },
    /// The session failed; the failure was captured rather than propagated.
    Failed {
        /// Error category.
        kind: ErrorKind,
        /// Rendered error message.
        message: String,
        /// Time spent before the failure.
        elapsed: Duration,
    },
}

impl InferenceResult {
    /// Builds a result from a finished call.
    pub fn from_outcome(outcome: InpaintResult<Vec<u8>>, elapsed: Duration) -> Self {
        match outcome {
            Ok(output) => InferenceResult::Completed { output, elapsed },
            Err(e) => InferenceResult::failed(&e, elapsed),
        }
    }

    /// Builds a failed result from an error.
    pub fn failed(error: &InpaintError, elapsed: Duration) -> Self {
        InferenceResult::Failed {
            kind: error.kind(),
            message: error.to_string(),
            elapsed,
        }
    }

    /// Time spent in the call.
    pub fn elapsed(&self) -> Duration {
        match self {
            InferenceResult::Completed { elapsed, .. } | InferenceResult::Failed { elapsed, .. } => {
                *elapsed
            }
        }
    }

    /// Returns true if the call produced non-empty output.
    pub fn is_usable(&self) -> bool {
        matches!(self, InferenceResult::Completed { output, .. } if !output.is_empty())
    }
}

/// What one worker did during a dispatch.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Registration index of the session.
    pub index: usize,
    /// Session name.
    pub name: String,
    /// When the worker passed the start gate; `None` if it never got there.
    pub started_at: Option<Instant>,
    /// Outcome of the call.
    pub result: InferenceResult,
}

/// Everything observed during one dispatch, in registration order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// One report per session.
    pub workers: Vec<WorkerReport>,
    /// Wall-clock time from spawning the workers to joining the last one.
    pub wall_clock: Duration,
}

impl DispatchReport {
    /// Largest gap between two workers passing the start gate.
    pub fn start_skew(&self) -> Duration {
        let starts = self.workers.iter().filter_map(|w| w.started_at);
        match (starts.clone().min(), starts.max()) {
            (Some(first), Some(last)) => last.duration_since(first),
            _ => Duration::ZERO,
        }
    }

    /// Number of workers that produced usable output.
    pub fn success_count(&self) -> usize {
        self.workers.iter().filter(|w| w.result.is_usable()).count()
    }

    /// Selects the first usable output in registration order.
    ///
    /// Returns [`InpaintError::AllSessionsFailed`] with one diagnostic per worker when no
    /// session produced output.
    pub fn resolve(self) -> InpaintResult<Vec<u8>> {
        let mut failures = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            match worker.result {
                InferenceResult::Completed { output, .. } if !output.is_empty() => {
                    return Ok(output);
                }
                InferenceResult::Completed { .. } => {
                    failures.push(format!("{}: empty output", worker.name));
                }
                InferenceResult::Failed { kind, message, .. } => {
                    failures.push(format!("{} ({kind}): {message}", worker.name));
                }
            }
        }
        Err(InpaintError::all_sessions_failed(failures))
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dispatch Report:")?;
        writeln!(
            f,
            "  Sessions: {} ({} succeeded)",
            self.workers.len(),
            self.success_count()
        )?;
        writeln!(f, "  Wall clock: {:.2}ms", self.wall_clock.as_secs_f64() * 1000.0)?;
        writeln!(f, "  Start skew: {:.3}ms", self.start_skew().as_secs_f64() * 1000.0)?;
        for worker in &self.workers {
            let status = match &worker.result {
                InferenceResult::Completed { output, .. } => format!("{} bytes", output.len()),
                InferenceResult::Failed { kind, .. } => format!("failed ({kind})"),
            };
            writeln!(
                f,
                "  [{}] {}: {:.2}ms, {}",
                worker.index,
                worker.name,
                worker.result.elapsed().as_secs_f64() * 1000.0,
                status
            )?;
        }
        Ok(())
    }
}
