// Background worker abstraction
//
// Runs a long task off the UI thread and reports back through a single
// event channel with three event kinds: Progress, Error, Finished.
//
// Ordering contract (consumers rely on this):
// - zero or more Progress events arrive before exactly one Finished event
// - at most one Error event, and if present it precedes Finished
// - a task that returns Err or panics always yields Finished(false)

use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tokio::sync::mpsc;

/// Events emitted by a running worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Coarse progress tick reported by the task body.
    Progress(u32),

    /// The task returned an error or panicked.
    Error(TaskFailure),

    /// Terminal event for a single run. Carries the task's success flag;
    /// forced to `false` on the failure path.
    Finished(bool),
}

/// Details of a failed task, carried by [`WorkerEvent::Error`].
///
/// `message` is the top-level error text; `detail` is the full formatted
/// error chain (or the panic payload).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TaskFailure {
    pub message: String,
    pub detail: String,
}

impl TaskFailure {
    fn from_error(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            detail: format!("{err:?}"),
        }
    }

    fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self {
            detail: format!("panic: {message}"),
            message,
        }
    }
}

/// Handle passed into the task body for reporting progress.
///
/// Reports are forwarded to the owning [`WorkerHandle`] as
/// [`WorkerEvent::Progress`]. Dropped silently once the consumer goes away.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl ProgressReporter {
    pub fn report(&self, value: u32) {
        let _ = self.tx.send(WorkerEvent::Progress(value));
    }
}

/// A long-running operation that accepts a progress-reporting callback and
/// returns a success flag.
///
/// The real report generation is supplied behind this seam; the shell only
/// ships [`PlaceholderReport`](crate::services::PlaceholderReport).
pub trait ReportTask: Send + 'static {
    fn run(&self, progress: &ProgressReporter) -> anyhow::Result<bool>;
}

// Closures work as ad-hoc tasks, mainly in tests.
impl<F> ReportTask for F
where
    F: Fn(&ProgressReporter) -> anyhow::Result<bool> + Send + 'static,
{
    fn run(&self, progress: &ProgressReporter) -> anyhow::Result<bool> {
        self(progress)
    }
}

/// Receiving side of a spawned worker.
pub struct WorkerHandle {
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    join: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    /// Receive the next event. Returns `None` once the worker thread has
    /// exited and all events were drained.
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Wait for the worker thread itself to finish.
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Wraps a [`ReportTask`] and executes it on a thread distinct from the UI
/// thread (one of the runtime's blocking threads, since the task body may
/// sleep).
pub struct Worker;

impl Worker {
    /// Spawn `task` on the current tokio runtime's blocking pool.
    ///
    /// Errors and panics are caught at this boundary and converted into an
    /// [`WorkerEvent::Error`] followed by `Finished(false)`; nothing
    /// propagates to the scheduler.
    ///
    /// Must be called from within a tokio runtime context.
    pub fn spawn<T: ReportTask>(task: T) -> WorkerHandle {
        let (tx, events) = mpsc::unbounded_channel();
        let progress = ProgressReporter { tx: tx.clone() };

        let join = tokio::task::spawn_blocking(move || {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| task.run(&progress)));

            match outcome {
                Ok(Ok(finished_ok)) => {
                    tracing::debug!(finished_ok, "worker task completed");
                    let _ = tx.send(WorkerEvent::Finished(finished_ok));
                }
                Ok(Err(err)) => {
                    tracing::error!("worker task failed: {err:?}");
                    let _ = tx.send(WorkerEvent::Error(TaskFailure::from_error(&err)));
                    let _ = tx.send(WorkerEvent::Finished(false));
                }
                Err(payload) => {
                    let failure = TaskFailure::from_panic(payload.as_ref());
                    tracing::error!("worker task panicked: {}", failure.message);
                    let _ = tx.send(WorkerEvent::Error(failure));
                    let _ = tx.send(WorkerEvent::Finished(false));
                }
            }
        });

        WorkerHandle { events, join }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn collect_events(mut handle: WorkerHandle) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.recv().await {
            let terminal = matches!(event, WorkerEvent::Finished(_));
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn successful_task_emits_progress_then_finished() {
        let handle = Worker::spawn(|progress: &ProgressReporter| -> anyhow::Result<bool> {
            for n in 0..3 {
                progress.report(n);
            }
            Ok(true)
        });

        let events = collect_events(handle).await;
        assert_eq!(events.len(), 4);
        for (n, event) in events.iter().take(3).enumerate() {
            assert!(matches!(event, WorkerEvent::Progress(v) if *v == n as u32));
        }
        assert!(matches!(events[3], WorkerEvent::Finished(true)));
    }

    #[tokio::test]
    async fn failing_task_emits_error_then_finished_false() {
        let handle = Worker::spawn(|_: &ProgressReporter| -> anyhow::Result<bool> {
            Err(anyhow!("report template missing"))
        });

        let events = collect_events(handle).await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            WorkerEvent::Error(failure) => {
                assert_eq!(failure.message, "report template missing");
            }
            other => panic!("expected Error event, got {other:?}"),
        }
        assert!(matches!(events[1], WorkerEvent::Finished(false)));
    }

    #[tokio::test]
    async fn panicking_task_is_caught_at_the_boundary() {
        let handle = Worker::spawn(|_: &ProgressReporter| -> anyhow::Result<bool> {
            panic!("boom");
        });

        let events = collect_events(handle).await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            WorkerEvent::Error(failure) => assert_eq!(failure.message, "boom"),
            other => panic!("expected Error event, got {other:?}"),
        }
        assert!(matches!(events[1], WorkerEvent::Finished(false)));
    }

    #[tokio::test]
    async fn join_waits_for_the_worker_to_exit() {
        let mut handle = Worker::spawn(|progress: &ProgressReporter| -> anyhow::Result<bool> {
            progress.report(0);
            Ok(true)
        });

        while let Some(event) = handle.recv().await {
            if matches!(event, WorkerEvent::Finished(_)) {
                break;
            }
        }

        // The blocking task has sent its terminal event; join must complete
        handle.join().await;
    }

    #[tokio::test]
    async fn task_returning_false_is_not_an_error() {
        let handle = Worker::spawn(|_: &ProgressReporter| -> anyhow::Result<bool> { Ok(false) });

        let events = collect_events(handle).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WorkerEvent::Finished(false)));
    }
}
