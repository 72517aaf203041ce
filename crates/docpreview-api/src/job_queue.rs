use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use docpreview_core::JobRequest;

use crate::executor::{JobError, JobExecutor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Job queue is full")]
    Full,

    #[error("Job queue is shutting down")]
    ShuttingDown,
}

/// Bounded admission queue in front of the job executor
///
/// `submit` never waits: a full queue rejects immediately. A dispatcher task
/// runs at most `max_concurrent` jobs at a time. Every job gets a child of
/// the queue's cancellation token; cancelling drops the job future, which
/// removes its working directory and kills any running tool.
pub struct JobQueue {
    tx: mpsc::Sender<JobRequest>,
    tracker: TaskTracker,
    /// Stops admission; queued jobs still run
    closing: CancellationToken,
    /// Aborts running and queued jobs
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Create a new job queue and start its dispatcher
    ///
    /// # Arguments
    /// * `executor` - Runs each admitted job
    /// * `max_concurrent` - Maximum number of concurrently running jobs
    /// * `queue_size` - Number of admitted jobs that may wait for a slot
    pub fn new(executor: Arc<JobExecutor>, max_concurrent: usize, queue_size: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let queue_size = queue_size.max(1);
        let (tx, rx) = mpsc::channel(queue_size);

        let queue = Self {
            tx,
            tracker: TaskTracker::new(),
            closing: CancellationToken::new(),
            cancel: CancellationToken::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        };

        queue.tracker.spawn(Self::dispatch(
            rx,
            executor,
            Arc::new(Semaphore::new(max_concurrent)),
            queue.tracker.clone(),
            queue.closing.clone(),
            queue.cancel.clone(),
            queue.in_flight.clone(),
        ));

        tracing::info!(
            queue_size = queue_size,
            max_concurrent = max_concurrent,
            "Job queue initialized with bounded channel"
        );

        queue
    }

    #[tracing::instrument(skip(self, request), fields(bucket = %request.bucket, key = %request.key))]
    pub fn submit(&self, request: JobRequest) -> Result<(), QueueError> {
        if self.closing.is_cancelled() {
            return Err(QueueError::ShuttingDown);
        }

        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::warn!("Job queue is full, rejecting job");
                QueueError::Full
            }
            mpsc::error::TrySendError::Closed(_) => QueueError::ShuttingDown,
        })?;

        tracing::debug!("Job enqueued");
        Ok(())
    }

    /// Number of jobs currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop admission and drain
    ///
    /// Queued and running jobs get `grace` to finish. After that the rest are
    /// cancelled and this waits for them to unwind.
    pub async fn shutdown(&self, grace: Duration) {
        self.closing.cancel();
        self.tracker.close();

        tracing::info!(
            in_flight = self.in_flight(),
            grace_secs = grace.as_secs_f64(),
            "Draining job queue"
        );

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                in_flight = self.in_flight(),
                "Grace period elapsed, cancelling remaining jobs"
            );
            self.cancel.cancel();
            self.tracker.wait().await;
        }

        tracing::info!("Job queue drained");
    }

    async fn dispatch(
        mut rx: mpsc::Receiver<JobRequest>,
        executor: Arc<JobExecutor>,
        semaphore: Arc<Semaphore>,
        tracker: TaskTracker,
        closing: CancellationToken,
        cancel: CancellationToken,
        in_flight: Arc<AtomicUsize>,
    ) {
        let mut draining = false;

        loop {
            let request = tokio::select! {
                _ = closing.cancelled(), if !draining => {
                    // Buffered jobs are still delivered after close
                    rx.close();
                    draining = true;
                    continue;
                }
                request = rx.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    executor.report_failure(&request, &JobError::Cancelled);
                    continue;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let executor = executor.clone();
            let token = cancel.child_token();
            let guard = InFlightGuard::new(in_flight.clone());

            tracker.spawn(async move {
                let _permit = permit;
                let _guard = guard;

                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::warn!(
                            bucket = %request.bucket,
                            key = %request.key,
                            "Job cancelled"
                        );
                        executor.report_failure(&request, &JobError::Cancelled);
                    }
                    // Failures are reported by the executor
                    _ = executor.execute(&request) => {}
                }
            });
        }

        tracing::debug!("Job dispatcher stopped");
    }
}

/// Counts a running job for as long as it is alive
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
