//! Runs several sessions on the same input with a synchronized start.
//!
//! Each session gets its own named scoped worker thread. Workers warm up, then wait for
//! the start gate. The dispatcher sizes the gate only after spawning, from the number of
//! workers that actually started, so a worker the OS refused to create is reported as
//! failed instead of leaving the others waiting. The dispatcher arrives at the gate last
//! and every worker leaves it together regardless of how long spawning or warm-up took.
//! Every worker times and captures its own outcome, panics included, and the dispatcher
//! resolves the collected reports once all workers have been joined.

use super::result::{DispatchReport, InferenceResult, WorkerReport};
use crate::core::errors::{ErrorKind, InpaintError, InpaintResult};
use crate::core::traits::InpaintSession;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Barrier};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Fans one image/mask pair out to several sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelDispatcher {
    stack_size: Option<usize>,
}

impl ParallelDispatcher {
    /// Creates a dispatcher whose workers use the platform default stack size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stack size, in bytes, of every worker thread.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Worker stack size, if one was set.
    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Runs every session and returns the first usable output in registration order.
    ///
    /// Individual failures are logged and do not affect the other sessions. Fails with
    /// [`InpaintError::AllSessionsFailed`] if no session produced output.
    pub fn run<S: InpaintSession>(
        &self,
        sessions: &[S],
        image_bytes: &[u8],
        mask_bytes: &[u8],
    ) -> InpaintResult<Vec<u8>> {
        let report = self.dispatch(sessions, image_bytes, mask_bytes)?;
        report.resolve()
    }

    /// Runs every session and returns the full per-worker report.
    ///
    /// A worker thread that cannot be spawned is reported as
    /// `Failed { kind: Io }` and never passes the start gate.
    pub fn dispatch<S: InpaintSession>(
        &self,
        sessions: &[S],
        image_bytes: &[u8],
        mask_bytes: &[u8],
    ) -> InpaintResult<DispatchReport> {
        dispatch_with(sessions, image_bytes, mask_bytes, |index| {
            self.worker_builder(index)
        })
    }

    fn worker_builder(&self, index: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(format!("inpaint-worker-{index}"));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

enum Worker<'scope> {
    Running {
        handle: ScopedJoinHandle<'scope, WorkerReport>,
        start: Sender<Arc<Barrier>>,
    },
    NotSpawned(WorkerReport),
}

fn dispatch_with<S, F>(
    sessions: &[S],
    image_bytes: &[u8],
    mask_bytes: &[u8],
    builder_for: F,
) -> InpaintResult<DispatchReport>
where
    S: InpaintSession,
    F: Fn(usize) -> thread::Builder,
{
    if sessions.is_empty() {
        return Err(InpaintError::invalid_argument(
            "parallel dispatch needs at least one session",
        ));
    }

    let region_start = Instant::now();

    let workers = thread::scope(|scope| {
        let workers: Vec<_> = sessions
            .iter()
            .enumerate()
            .map(|(index, session)| {
                let (start, gate) = mpsc::channel();
                let spawned = builder_for(index).spawn_scoped(scope, move || {
                    run_worker(index, session, gate, image_bytes, mask_bytes)
                });
                match spawned {
                    Ok(handle) => Worker::Running { handle, start },
                    Err(e) => Worker::NotSpawned(spawn_failure(index, session.name(), e)),
                }
            })
            .collect();

        let running = workers
            .iter()
            .filter(|w| matches!(w, Worker::Running { .. }))
            .count();
        let gate = Arc::new(Barrier::new(running + 1));
        for worker in &workers {
            if let Worker::Running { start, .. } = worker {
                // Receivers live until the worker has taken the gate.
                let _ = start.send(Arc::clone(&gate));
            }
        }

        debug!(workers = running, "waiting for workers to become ready");
        gate.wait();
        debug!("start gate released");

        workers
            .into_iter()
            .enumerate()
            .map(|(index, worker)| match worker {
                Worker::Running { handle, .. } => {
                    handle.join().unwrap_or_else(|payload| WorkerReport {
                        index,
                        name: sessions[index].name().to_string(),
                        started_at: None,
                        result: panic_result(payload, Duration::ZERO),
                    })
                }
                Worker::NotSpawned(report) => report,
            })
            .collect::<Vec<_>>()
    });

    let report = DispatchReport {
        workers,
        wall_clock: region_start.elapsed(),
    };
    log_report(&report);
    Ok(report)
}

fn run_worker<S: InpaintSession>(
    index: usize,
    session: &S,
    gate: Receiver<Arc<Barrier>>,
    image_bytes: &[u8],
    mask_bytes: &[u8],
) -> WorkerReport {
    let warm_up = panic::catch_unwind(AssertUnwindSafe(|| session.warm_up()));

    // Every spawned worker must arrive, or the dispatcher and the other workers never leave.
    if let Ok(gate) = gate.recv() {
        gate.wait();
    }
    let started_at = Instant::now();

    let result = match warm_up {
        Err(payload) => panic_result(payload, Duration::ZERO),
        Ok(()) => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                session.run_end_to_end(image_bytes, mask_bytes)
            }));
            let elapsed = started_at.elapsed();
            match outcome {
                Ok(outcome) => InferenceResult::from_outcome(outcome, elapsed),
                Err(payload) => panic_result(payload, elapsed),
            }
        }
    };

    WorkerReport {
        index,
        name: session.name().to_string(),
        started_at: Some(started_at),
        result,
    }
}

fn spawn_failure(index: usize, name: &str, error: io::Error) -> WorkerReport {
    warn!(index, session = name, error = %error, "failed to spawn worker thread");
    WorkerReport {
        index,
        name: name.to_string(),
        started_at: None,
        result: InferenceResult::failed(&InpaintError::Io(error), Duration::ZERO),
    }
}

fn panic_result(payload: Box<dyn Any + Send>, elapsed: Duration) -> InferenceResult {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string());
    InferenceResult::Failed {
        kind: ErrorKind::Inference,
        message: format!("panic: {message}"),
        elapsed,
    }
}

fn log_report(report: &DispatchReport) {
    for worker in &report.workers {
        let elapsed_ms = worker.result.elapsed().as_secs_f64() * 1000.0;
        match &worker.result {
            InferenceResult::Completed { output, .. } => info!(
                index = worker.index,
                session = %worker.name,
                elapsed_ms,
                bytes = output.len(),
                "session finished"
            ),
            InferenceResult::Failed { kind, message, .. } => warn!(
                index = worker.index,
                session = %worker.name,
                elapsed_ms,
                %kind,
                error = %message,
                "session failed"
            ),
        }
    }
    info!(
        wall_clock_ms = report.wall_clock.as_secs_f64() * 1000.0,
        start_skew_ms = report.start_skew().as_secs_f64() * 1000.0,
        succeeded = report.success_count(),
        total = report.workers.len(),
        "parallel region finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSession {
        name: String,
        warm_up_delay: Duration,
        run_time: Duration,
        output: Result<Vec<u8>, ErrorKind>,
        calls: AtomicUsize,
    }

    impl FakeSession {
        fn ok(name: &str, output: &[u8]) -> Self {
            Self {
                name: name.to_string(),
                warm_up_delay: Duration::ZERO,
                run_time: Duration::ZERO,
                output: Ok(output.to_vec()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                output: Err(ErrorKind::Inference),
                ..Self::ok(name, &[])
            }
        }

        fn with_warm_up(mut self, delay: Duration) -> Self {
            self.warm_up_delay = delay;
            self
        }

        fn with_run_time(mut self, run_time: Duration) -> Self {
            self.run_time = run_time;
            self
        }
    }

    impl InpaintSession for FakeSession {
        fn name(&self) -> &str {
            &self.name
        }

        fn run_end_to_end(&self, image: &[u8], _mask: &[u8]) -> InpaintResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.run_time);
            if image == b"panic" {
                panic!("backend crashed");
            }
            match &self.output {
                Ok(bytes) => Ok(bytes.clone()),
                Err(_) => Err(InpaintError::inference_message(&self.name, "forward_pass", "boom")),
            }
        }

        fn warm_up(&self) {
            thread::sleep(self.warm_up_delay);
        }
    }

    #[test]
    fn test_start_skew_is_bounded_despite_warm_up_delay() {
        let sessions = [
            FakeSession::ok("fast", b"a"),
            FakeSession::ok("slow", b"b").with_warm_up(Duration::from_millis(150)),
        ];
        let report = ParallelDispatcher::new()
            .dispatch(&sessions, b"img", b"mask")
            .unwrap();
        assert!(
            report.start_skew() < Duration::from_millis(10),
            "skew was {:?}",
            report.start_skew()
        );
        assert!(report.wall_clock >= Duration::from_millis(150));
    }

    #[test]
    fn test_first_session_failing_falls_back_to_second() {
        let sessions = [FakeSession::failing("a"), FakeSession::ok("b", b"result-b")];
        let report = ParallelDispatcher::new()
            .dispatch(&sessions, b"img", b"mask")
            .unwrap();
        assert!(matches!(
            report.workers[0].result,
            InferenceResult::Failed {
                kind: ErrorKind::Inference,
                ..
            }
        ));
        assert_eq!(report.resolve().unwrap(), b"result-b".to_vec());
    }

    #[test]
    fn test_registration_order_wins_over_completion_order() {
        let sessions = [
            FakeSession::ok("slow", b"first").with_run_time(Duration::from_millis(50)),
            FakeSession::ok("fast", b"second"),
        ];
        let output = ParallelDispatcher::new()
            .run(&sessions, b"img", b"mask")
            .unwrap();
        assert_eq!(output, b"first".to_vec());
    }

    #[test]
    fn test_all_sessions_failing_aggregates_errors() {
        let sessions = [FakeSession::failing("a"), FakeSession::ok("b", b"")];
        let err = ParallelDispatcher::new()
            .run(&sessions, b"img", b"mask")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllSessionsFailed);
        let text = err.to_string();
        assert!(text.contains("a (inference)"));
        assert!(text.contains("b: empty output"));
    }

    #[test]
    fn test_worker_panic_is_captured() {
        let sessions = [FakeSession::ok("a", b"x"), FakeSession::ok("b", b"y")];
        let report = ParallelDispatcher::new()
            .dispatch(&sessions, b"panic", b"mask")
            .unwrap();
        assert_eq!(report.success_count(), 0);
        for worker in &report.workers {
            match &worker.result {
                InferenceResult::Failed { message, .. } => {
                    assert!(message.contains("backend crashed"))
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_each_session_runs_exactly_once() {
        let sessions = [FakeSession::ok("a", b"x"), FakeSession::ok("b", b"y")];
        let dynamic: Vec<&dyn InpaintSession> = sessions.iter().map(|s| s as _).collect();
        ParallelDispatcher::new()
            .run(&dynamic, b"img", b"mask")
            .unwrap();
        assert!(sessions.iter().all(|s| s.calls.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_workers_run_on_named_threads() {
        struct ThreadName;

        impl InpaintSession for ThreadName {
            fn name(&self) -> &str {
                "thread-name"
            }

            fn run_end_to_end(&self, _image: &[u8], _mask: &[u8]) -> InpaintResult<Vec<u8>> {
                Ok(thread::current().name().unwrap_or("").as_bytes().to_vec())
            }
        }

        let output = ParallelDispatcher::new()
            .with_stack_size(512 * 1024)
            .run(&[ThreadName], b"img", b"mask")
            .unwrap();
        assert_eq!(output, b"inpaint-worker-0".to_vec());
    }

    /// Asks for more stack than any address space holds, so the OS refuses the thread.
    fn unspawnable() -> thread::Builder {
        thread::Builder::new().stack_size(1 << 50)
    }

    #[test]
    fn test_spawn_failure_is_reported_and_others_still_run() {
        let sessions = [
            FakeSession::ok("a", b"result-a"),
            FakeSession::ok("b", b"result-b").with_warm_up(Duration::from_millis(20)),
            FakeSession::ok("c", b"result-c"),
        ];
        let report = dispatch_with(&sessions, b"img", b"mask", |index| {
            if index == 0 {
                unspawnable()
            } else {
                thread::Builder::new()
            }
        })
        .unwrap();

        assert_eq!(report.workers.len(), 3);
        assert!(report.workers[0].started_at.is_none());
        assert!(matches!(
            report.workers[0].result,
            InferenceResult::Failed {
                kind: ErrorKind::Io,
                ..
            }
        ));
        assert_eq!(sessions[0].calls.load(Ordering::SeqCst), 0);
        assert!(report.workers[1..].iter().all(|w| w.started_at.is_some()));
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.resolve().unwrap(), b"result-b".to_vec());
    }

    #[test]
    fn test_no_worker_spawned_fails_every_session() {
        let sessions = [FakeSession::ok("a", b"x"), FakeSession::ok("b", b"y")];
        let err = dispatch_with(&sessions, b"img", b"mask", |_| unspawnable())
            .unwrap()
            .resolve()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllSessionsFailed);
        assert!(err.to_string().contains("a (io)"));
        assert!(sessions.iter().all(|s| s.calls.load(Ordering::SeqCst) == 0));
    }

    #[test]
    fn test_no_sessions_is_invalid_argument() {
        let sessions: [FakeSession; 0] = [];
        let err = ParallelDispatcher::new()
            .dispatch(&sessions, b"img", b"mask")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
