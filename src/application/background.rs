//! Detached background work for side effects of already-decided results.
//!
//! Cache repopulation and click counting run as fire-and-forget tasks on the
//! runtime captured at startup, never inside the request that triggered them:
//! a client disconnect or request timeout drops the handler future but leaves
//! these tasks running. Their failures travel over a bounded channel to a
//! single logging worker and are never reported to the caller.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

use crate::error::AppError;

/// A failed background task, as seen by the logging worker.
#[derive(Debug)]
pub struct BackgroundFailure {
    pub task: &'static str,
    pub key: String,
    pub error: AppError,
}

struct Inner {
    runtime: Handle,
    failures: mpsc::Sender<BackgroundFailure>,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Submission handle for detached tasks.
///
/// Cheap to clone; all clones share the same in-flight counter and failure
/// channel.
#[derive(Clone)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

/// Decrements the in-flight counter even if the task panics.
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    /// Creates the submission handle and the receiving end of its failure channel.
    ///
    /// Must be called from within a Tokio runtime; tasks are spawned onto that
    /// runtime for the lifetime of the process.
    pub fn new(failure_capacity: usize) -> (Self, mpsc::Receiver<BackgroundFailure>) {
        let (tx, rx) = mpsc::channel(failure_capacity);
        let tasks = Self {
            inner: Arc::new(Inner {
                runtime: Handle::current(),
                failures: tx,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        };
        (tasks, rx)
    }

    /// Launches `fut` detached from the caller.
    ///
    /// Returns immediately. `task` names the operation and `key` the cache or
    /// store key it touches; both only appear in logs.
    pub fn spawn<F>(&self, task: &'static str, key: impl Into<String>, fut: F)
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let key = key.into();
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(self.inner.clone());

        self.inner.runtime.spawn(async move {
            if let Err(error) = fut.await {
                let failure = BackgroundFailure { task, key, error };
                if let Err(e) = guard.0.failures.try_send(failure) {
                    let failure = match e {
                        mpsc::error::TrySendError::Full(f) => f,
                        mpsc::error::TrySendError::Closed(f) => f,
                    };
                    log_failure(&failure);
                }
            }
            drop(guard);
        });
    }

    /// Number of tasks that have been spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Returns true if the logging worker has gone away.
    pub fn is_closed(&self) -> bool {
        self.inner.failures.is_closed()
    }

    /// Waits until no task is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Waits for in-flight tasks up to `grace`, returning how many were left.
    pub async fn drain(&self, grace: Duration) -> usize {
        match tokio::time::timeout(grace, self.wait_idle()).await {
            Ok(()) => 0,
            Err(_) => self.in_flight(),
        }
    }
}

fn log_failure(failure: &BackgroundFailure) {
    metrics::counter!(
        "background_task_failures_total",
        "task" => failure.task,
        "kind" => failure.error.kind()
    )
    .increment(1);

    warn!(
        task = failure.task,
        key = %failure.key,
        kind = failure.error.kind(),
        error = %failure.error,
        "background task failed"
    );
}

/// Consumes the failure channel, logging every failure.
///
/// Runs until every [`BackgroundTasks`] handle has been dropped.
pub async fn run_failure_logger(mut rx: mpsc::Receiver<BackgroundFailure>) {
    while let Some(failure) = rx.recv().await {
        log_failure(&failure);
    }
    debug!("Background failure logger stopped");
}
