//! Deploy worker pool
//!
//! Runs the deployment pipeline off the request path:
//! - Bounded job queue shared by a fixed set of workers
//! - One `oneshot` reply per submitted job
//! - Pool statistics and monitoring

use crate::error::DeployError;
use crate::pipeline::{ApplicationWithPrograms, DeployJob, DeploymentPipeline};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

/// Result of one deploy job
pub type DeployResult = Result<ApplicationWithPrograms, DeployError>;

/// Job queued for a worker
#[derive(Debug)]
struct DeployRequest {
    job: DeployJob,
    reply: oneshot::Sender<DeployResult>,
}

/// Pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted into the queue
    pub submitted: usize,
    /// Jobs that deployed successfully
    pub succeeded: usize,
    /// Jobs that failed
    pub failed: usize,
    /// Jobs currently running
    pub in_flight: usize,
    /// Jobs rejected because the queue was full
    pub rejected: usize,
}

/// Fixed-size pool of deploy workers
#[derive(Debug)]
pub struct DeployPool {
    /// Queue sender; `None` once shut down
    sender: Mutex<Option<mpsc::Sender<DeployRequest>>>,
    /// Queue capacity
    capacity: usize,
    /// Worker tasks
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Statistics
    stats: Arc<Mutex<PoolStats>>,
}

impl DeployPool {
    /// Start `workers` workers over a queue of `capacity` jobs
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(pipeline: Arc<DeploymentPipeline>, workers: usize, capacity: usize) -> Self {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(AsyncMutex::new(rx));
        let stats = Arc::new(Mutex::new(PoolStats::default()));

        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(deploy_worker(
                    id,
                    Arc::clone(&pipeline),
                    Arc::clone(&rx),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        tracing::debug!(workers, capacity, "deploy pool started");

        Self {
            sender: Mutex::new(Some(tx)),
            capacity,
            workers: Mutex::new(handles),
            stats,
        }
    }

    /// Queue a job
    ///
    /// # Returns
    /// Receiver for the job's result
    ///
    /// # Errors
    /// - `DeployError::PoolExhausted` if the queue is full
    /// - `DeployError::PoolShutdown` after [`Self::shutdown`]
    pub fn submit(&self, job: DeployJob) -> Result<oneshot::Receiver<DeployResult>, DeployError> {
        let sender = self.sender.lock().clone().ok_or(DeployError::PoolShutdown)?;
        let (reply, receiver) = oneshot::channel();

        match sender.try_send(DeployRequest { job, reply }) {
            Ok(()) => {
                self.stats.lock().submitted += 1;
                Ok(receiver)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.lock().rejected += 1;
                Err(DeployError::PoolExhausted(self.capacity))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DeployError::PoolShutdown),
        }
    }

    /// Stop accepting jobs; queued jobs still run
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for result in futures::future::join_all(workers).await {
            if let Err(err) = result {
                tracing::error!(error = %err, "deploy worker panicked");
            }
        }
    }

    /// Check if jobs are still accepted
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Get pool statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        *self.stats.lock()
    }

    /// Queue capacity
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Worker loop (runs in separate tokio task)
async fn deploy_worker(
    id: usize,
    pipeline: Arc<DeploymentPipeline>,
    rx: Arc<AsyncMutex<mpsc::Receiver<DeployRequest>>>,
    stats: Arc<Mutex<PoolStats>>,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(DeployRequest { job, reply }) = next else {
            break;
        };

        stats.lock().in_flight += 1;
        let result = pipeline.run(job).await;
        {
            let mut stats = stats.lock();
            stats.in_flight -= 1;
            if result.is_ok() {
                stats.succeeded += 1;
            } else {
                stats.failed += 1;
            }
        }

        if reply.send(result).is_err() {
            tracing::debug!(worker = id, "deploy result dropped by caller");
        }
    }
    tracing::debug!(worker = id, "deploy worker stopped");
}
