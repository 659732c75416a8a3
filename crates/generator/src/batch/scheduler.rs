//! Bounded-concurrency batch token generation.
//!
//! A fixed pool of workers pulls offsets from one shared atomic cursor. Each
//! offset is claimed by exactly one worker, which writes the row for
//! `start + offset` into that offset's write-once slot. Completion order across
//! workers is unspecified; table order always matches serial order.
//!
//! Cancellation is cooperative: workers check the flag before claiming the
//! next offset, and an in-flight encryption is allowed to finish.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use common::protocol::TokenRow;
use tokio::{sync::watch, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::crypto::SerialEncryptor;
use crate::export::build_check_url;
use crate::serial::{Serial, SerialError, SerialRange};

/// A validated batch request.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub product: String,
    pub range: SerialRange,
    /// Requested worker count; clamped to `1..=total` when run.
    pub concurrency: usize,
}

impl BatchJob {
    /// Validate the range texts and build a job.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::InvalidRange`] before any worker is spawned.
    pub fn new(
        product: impl Into<String>,
        start: &str,
        end: &str,
        concurrency: usize,
    ) -> Result<Self, SerialError> {
        Ok(Self {
            product: product.into(),
            range: SerialRange::parse(start, end)?,
            concurrency,
        })
    }

    pub fn total(&self) -> usize {
        self.range.len()
    }

    /// Worker count actually used for this job.
    pub fn workers(&self) -> usize {
        effective_workers(self.concurrency, self.total())
    }
}

/// Clamp a requested concurrency to `1..=total`.
pub fn effective_workers(concurrency: usize, total: usize) -> usize {
    concurrency.clamp(1, total.max(1))
}

/// Final result of a batch run.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every slot was written; rows are in serial order.
    Completed(Vec<TokenRow>),
    /// The run was cancelled. Partially written rows are discarded.
    Cancelled { completed: usize, total: usize },
}

/// Cancellation flag, completion counter, and progress channel for one run.
///
/// Shared between the scheduler's workers and any observer (status endpoint,
/// tests). Progress is a percentage published at a coarse cadence.
#[derive(Debug)]
pub struct BatchMonitor {
    cancel: CancellationToken,
    completed: AtomicUsize,
    total: usize,
    progress: watch::Sender<u8>,
}

impl BatchMonitor {
    pub fn new(total: usize) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            cancel: CancellationToken::new(),
            completed: AtomicUsize::new(0),
            total,
            progress,
        }
    }

    /// Request cancellation. Workers stop before their next claim.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Rows written so far, successful or sentinel.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Last published progress percentage.
    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    fn record_completion(&self, every: usize) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done % every == 0 {
            self.progress.send_replace(percent(done, self.total));
        }
    }

    fn publish(&self, pct: u8) {
        self.progress.send_replace(pct);
    }
}

/// `round(done / total * 100)`, saturating at 100.
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100 + total / 2) / total).min(100) as u8
}

/// Runs batch jobs over a fixed worker pool.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    base_url: Arc<str>,
    progress_every: usize,
}

impl BatchScheduler {
    /// `base_url` is used to assemble each row's verification URL.
    pub fn new(base_url: impl Into<Arc<str>>, progress_every: usize) -> Self {
        Self {
            base_url: base_url.into(),
            progress_every: progress_every.max(1),
        }
    }

    /// Run `job` to completion or cancellation.
    ///
    /// Per-serial cipher failures become sentinel rows and never abort the run.
    /// Returns [`BatchOutcome::Cancelled`] if the monitor's flag is set by the
    /// time all workers have stopped; progress is then reset to 0.
    pub async fn run(
        &self,
        job: BatchJob,
        encryptor: Arc<dyn SerialEncryptor>,
        monitor: Arc<BatchMonitor>,
    ) -> BatchOutcome {
        let total = job.total();
        let workers = job.workers();
        debug_assert_eq!(monitor.total(), total);

        info!(
            product = %job.product,
            start = %job.range.start(),
            end = %job.range.end(),
            total,
            workers,
            "batch started"
        );

        let run = Arc::new(Run {
            table: (0..total).map(|_| OnceLock::new()).collect(),
            cursor: AtomicUsize::new(0),
            job,
            encryptor,
            monitor: Arc::clone(&monitor),
            base_url: Arc::clone(&self.base_url),
            progress_every: self.progress_every,
        });

        let mut pool = JoinSet::new();
        for worker_id in 1..=workers {
            let run = Arc::clone(&run);
            pool.spawn(async move { run.work(worker_id).await });
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "batch worker aborted");
            }
        }

        if monitor.is_cancelled() {
            let completed = monitor.completed();
            monitor.publish(0);
            info!(completed, total, "batch cancelled");
            return BatchOutcome::Cancelled { completed, total };
        }

        let rows = run.collect_rows();
        monitor.publish(100);
        info!(
            total,
            failed = rows.iter().filter(|r| r.is_failed()).count(),
            "batch completed"
        );
        BatchOutcome::Completed(rows)
    }
}

/// State shared by the workers of one run.
struct Run {
    job: BatchJob,
    table: Vec<OnceLock<TokenRow>>,
    cursor: AtomicUsize,
    encryptor: Arc<dyn SerialEncryptor>,
    monitor: Arc<BatchMonitor>,
    base_url: Arc<str>,
    progress_every: usize,
}

impl Run {
    async fn work(&self, worker_id: usize) {
        let mut written = 0usize;
        while !self.monitor.is_cancelled() {
            let offset = self.cursor.fetch_add(1, Ordering::Relaxed);
            let Some(serial) = self.job.range.serial_at(offset) else {
                break;
            };

            let row = self.make_row(serial);
            if self.table[offset].set(row).is_err() {
                warn!(offset, "result slot already written");
            }
            self.monitor.record_completion(self.progress_every);
            written += 1;

            tokio::task::yield_now().await;
        }
        debug!(worker_id, written, "batch worker stopped");
    }

    fn make_row(&self, serial: Serial) -> TokenRow {
        let product = self.job.product.as_str();
        let serial_text = serial.to_string();
        match self.encryptor.encrypt_serial(serial) {
            Ok(token) => TokenRow {
                url: build_check_url(&self.base_url, product, &serial_text, &token),
                product: product.to_owned(),
                serial: serial_text,
                token,
            },
            Err(e) => {
                warn!(serial = %serial_text, error = %e, "token encryption failed; row marked as error");
                TokenRow::failed(product, serial_text)
            }
        }
    }

    /// Rows in table order. A slot left empty by an aborted worker is
    /// reported as a failed row.
    fn collect_rows(&self) -> Vec<TokenRow> {
        self.table
            .iter()
            .enumerate()
            .map(|(offset, slot)| match slot.get() {
                Some(row) => row.clone(),
                None => {
                    let serial = self
                        .job
                        .range
                        .serial_at(offset)
                        .map(|s| s.to_string())
                        .unwrap_or_default();
                    TokenRow::failed(self.job.product.as_str(), serial)
                }
            })
            .collect()
    }
}
