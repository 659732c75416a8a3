//! [`BatchSlot`]: holder for the single current batch run.

use std::sync::{Arc, OnceLock};

use common::protocol::{BatchAccepted, BatchState, BatchStatus, TokenRow};
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::scheduler::{BatchJob, BatchMonitor, BatchOutcome, BatchScheduler};
use crate::crypto::SerialEncryptor;
use crate::serial::SerialRange;

/// Errors from batch lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A batch is still running; only one may run at a time.
    #[error("a batch is already running")]
    AlreadyRunning,

    /// No batch has been started since the process began.
    #[error("no batch has been started")]
    NoBatch,

    /// The current batch has already finished.
    #[error("the current batch is not running")]
    NotRunning,

    /// The current batch has no result table (still running, or cancelled).
    #[error("the current batch has not completed")]
    NotCompleted,
}

/// One batch run: its parameters, live monitor, and final outcome.
#[derive(Debug)]
pub struct BatchHandle {
    id: Uuid,
    product: String,
    range: SerialRange,
    workers: usize,
    monitor: Arc<BatchMonitor>,
    state: watch::Sender<BatchState>,
    outcome: OnceLock<BatchOutcome>,
}

impl BatchHandle {
    fn new(job: &BatchJob, monitor: Arc<BatchMonitor>) -> Self {
        let (state, _) = watch::channel(BatchState::Idle);
        Self {
            id: Uuid::new_v4(),
            product: job.product.clone(),
            range: job.range,
            workers: job.workers(),
            monitor,
            state,
            outcome: OnceLock::new(),
        }
    }

    pub fn state(&self) -> BatchState {
        *self.state.borrow()
    }

    pub fn accepted(&self) -> BatchAccepted {
        BatchAccepted {
            id: self.id,
            total: self.range.len(),
            workers: self.workers,
        }
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            id: self.id,
            state: self.state(),
            progress: self.monitor.progress(),
            completed: self.monitor.completed(),
            total: self.range.len(),
            product: self.product.clone(),
            start: self.range.start().to_string(),
            end: self.range.end().to_string(),
        }
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn range(&self) -> &SerialRange {
        &self.range
    }

    /// Result table of a completed run, in serial order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NotCompleted`] while running or after cancellation.
    pub fn rows(&self) -> Result<&[TokenRow], BatchError> {
        match self.outcome.get() {
            Some(BatchOutcome::Completed(rows)) => Ok(rows.as_slice()),
            _ => Err(BatchError::NotCompleted),
        }
    }

    /// Set the cancel flag.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NotRunning`] once the run has finished.
    pub fn cancel(&self) -> Result<(), BatchError> {
        if self.state() != BatchState::Running {
            return Err(BatchError::NotRunning);
        }
        info!(id = %self.id, "batch cancellation requested");
        self.monitor.cancel();
        Ok(())
    }

    /// Wait until the run reaches a terminal state and return it.
    pub async fn wait(&self) -> BatchState {
        let mut rx = self.state.subscribe();
        let state = match rx
            .wait_for(|s| matches!(s, BatchState::Completed | BatchState::Cancelled))
            .await
        {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    fn finish(&self, outcome: BatchOutcome) {
        let state = match &outcome {
            BatchOutcome::Completed(rows) => {
                debug!(id = %self.id, rows = rows.len(), "completed batch stored");
                BatchState::Completed
            }
            BatchOutcome::Cancelled { completed, total } => {
                debug!(id = %self.id, completed, total, "cancelled batch stored");
                BatchState::Cancelled
            }
        };
        // Only the run task calls this, exactly once.
        let _ = self.outcome.set(outcome);
        self.state.send_replace(state);
    }
}

/// Holds at most one batch.
///
/// Starting a batch while the current one is running is rejected. Starting
/// after it has finished replaces it, discarding its table.
#[derive(Clone, Debug, Default)]
pub struct BatchSlot {
    inner: Arc<RwLock<Option<Arc<BatchHandle>>>>,
}

impl BatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current batch, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NoBatch`] if none has been started.
    pub async fn current(&self) -> Result<Arc<BatchHandle>, BatchError> {
        self.inner.read().await.clone().ok_or(BatchError::NoBatch)
    }

    /// Start `job` on a background task and install it as the current batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::AlreadyRunning`] if the current batch is running.
    pub async fn start(
        &self,
        job: BatchJob,
        scheduler: &BatchScheduler,
        encryptor: Arc<dyn SerialEncryptor>,
    ) -> Result<Arc<BatchHandle>, BatchError> {
        let mut lock = self.inner.write().await;
        if let Some(current) = lock.as_ref() {
            if current.state() == BatchState::Running {
                return Err(BatchError::AlreadyRunning);
            }
        }

        let monitor = Arc::new(BatchMonitor::new(job.total()));
        let handle = Arc::new(BatchHandle::new(&job, Arc::clone(&monitor)));
        handle.state.send_replace(BatchState::Running);
        *lock = Some(Arc::clone(&handle));
        drop(lock);

        let scheduler = scheduler.clone();
        let task_handle = Arc::clone(&handle);
        tokio::spawn(async move {
            let outcome = scheduler.run(job, encryptor, monitor).await;
            task_handle.finish(outcome);
        });

        Ok(handle)
    }
}
