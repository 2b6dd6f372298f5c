//! Bounded row queue, worker pool and run metrics.
//!
//! The extractor pushes [`RawRow`]s into a bounded queue. When the queue is
//! full the push waits up to the configured backpressure timeout, then drops
//! the row and records it. Workers share the receiving end, parse and rate each
//! row, and push a [`ParseOutcome`] per row into a second bounded queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::error::RowError;
use crate::player::{ParseOutcome, PlayerRecord, RawRow};
use crate::ratings::RatingSettings;
use crate::row_parser::parse_row;
use crate::row_pool::RowPool;
use crate::weights::WeightProvider;

pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters shared by the producer and every worker of one run.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    rows_enqueued: AtomicU64,
    backpressure_events: AtomicU64,
    rows_dropped: AtomicU64,
    rows_parsed: AtomicU64,
    row_errors: AtomicU64,
    worker_faults: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_enqueued: u64,
    pub backpressure_events: u64,
    pub rows_dropped: u64,
    pub rows_parsed: u64,
    pub row_errors: u64,
    pub worker_faults: u64,
}

impl PipelineMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_enqueued: self.rows_enqueued.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            rows_dropped: self.rows_dropped.load(Ordering::Relaxed),
            rows_parsed: self.rows_parsed.load(Ordering::Relaxed),
            row_errors: self.row_errors.load(Ordering::Relaxed),
            worker_faults: self.worker_faults.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened to a row offered to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Queued,
    /// The queue stayed full for the whole timeout and the row was discarded.
    Dropped,
    /// The queue is closed or the run was cancelled.
    Closed,
}

/// Producer half of the row queue. Closing is idempotent: the sender is taken
/// out on the first close and every later call is a no-op.
#[derive(Debug)]
pub struct RowSender {
    tx: Option<mpsc::Sender<RawRow>>,
    timeout: Duration,
    metrics: Arc<PipelineMetrics>,
}

/// Consumer half of the row queue, shared by every worker.
#[derive(Debug, Clone)]
pub struct RowReceiver {
    rx: Arc<Mutex<mpsc::Receiver<RawRow>>>,
}

pub fn row_queue(
    depth: usize,
    timeout: Duration,
    metrics: Arc<PipelineMetrics>,
) -> (RowSender, RowReceiver) {
    let (tx, rx) = mpsc::channel(depth.max(1));
    (
        RowSender {
            tx: Some(tx),
            timeout,
            metrics,
        },
        RowReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl RowSender {
    /// Tries a non-blocking push first and falls back to a bounded wait.
    pub async fn send(&self, row: RawRow, cancel: &CancellationToken) -> SendStatus {
        let Some(tx) = self.tx.as_ref() else {
            return SendStatus::Closed;
        };
        let row = match tx.try_send(row) {
            Ok(()) => {
                PipelineMetrics::bump(&self.metrics.rows_enqueued);
                return SendStatus::Queued;
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return SendStatus::Closed,
            Err(mpsc::error::TrySendError::Full(row)) => row,
        };

        PipelineMetrics::bump(&self.metrics.backpressure_events);
        let index = row.index;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => SendStatus::Closed,
            sent = tx.send_timeout(row, self.timeout) => match sent {
                Ok(()) => {
                    PipelineMetrics::bump(&self.metrics.rows_enqueued);
                    SendStatus::Queued
                }
                Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                    PipelineMetrics::bump(&self.metrics.rows_dropped);
                    warn!(
                        row = index,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "row queue full, dropping row"
                    );
                    SendStatus::Dropped
                }
                Err(mpsc::error::SendTimeoutError::Closed(_)) => SendStatus::Closed,
            },
        }
    }

    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            debug!("row queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl RowReceiver {
    pub async fn recv(&self) -> Option<RawRow> {
        self.rx.lock().await.recv().await
    }
}

/// Everything a worker needs besides its queues.
#[derive(Clone)]
pub struct WorkerContext {
    pub weights: Arc<dyn WeightProvider>,
    pub settings: RatingSettings,
    pub metrics: Arc<PipelineMetrics>,
    pub row_pool: RowPool,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: u64,
    pub errors: u64,
    pub faults: u64,
}

/// Handle to a launched pool. The outcome queue closes once every worker has
/// exited; [`WorkerPool::join`] waits for that and totals the reports.
#[derive(Debug)]
pub struct WorkerPool {
    tasks: JoinSet<WorkerReport>,
    workers: usize,
}

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        headers: Arc<[String]>,
        rows: RowReceiver,
        outcomes: mpsc::Sender<ParseOutcome>,
        ctx: WorkerContext,
    ) -> Self {
        let workers = workers.max(1);
        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let headers = Arc::clone(&headers);
            let rows = rows.clone();
            let outcomes = outcomes.clone();
            let ctx = ctx.clone();
            tasks.spawn(run_worker(worker, headers, rows, outcomes, ctx));
        }
        debug!(workers, "worker pool started");
        Self { tasks, workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn join(mut self) -> WorkerReport {
        let mut total = WorkerReport::default();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => {
                    total.processed += report.processed;
                    total.errors += report.errors;
                    total.faults += report.faults;
                }
                Err(err) => error!("worker task failed to join: {err}"),
            }
        }
        total
    }
}

async fn run_worker(
    worker: usize,
    headers: Arc<[String]>,
    rows: RowReceiver,
    outcomes: mpsc::Sender<ParseOutcome>,
    ctx: WorkerContext,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    loop {
        let row = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            row = rows.recv() => match row {
                Some(row) => row,
                None => break,
            },
        };

        let RawRow { index, cells } = row;
        let result = guarded_process(worker, &cells, &headers, &ctx);
        ctx.row_pool.give(cells);

        report.processed += 1;
        match &result {
            Ok(_) => PipelineMetrics::bump(&ctx.metrics.rows_parsed),
            Err(RowError::WorkerFault { .. }) => {
                report.faults += 1;
                PipelineMetrics::bump(&ctx.metrics.worker_faults);
            }
            Err(err) => {
                report.errors += 1;
                PipelineMetrics::bump(&ctx.metrics.row_errors);
                if err.is_skippable() {
                    trace!(worker, row = index, "skipping row: {err}");
                } else {
                    warn!(worker, row = index, "row failed: {err}");
                }
            }
        }

        let sent = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => false,
            sent = outcomes.send(ParseOutcome { index, result }) => sent.is_ok(),
        };
        if !sent {
            break;
        }
    }
    debug!(
        worker,
        processed = report.processed,
        errors = report.errors,
        faults = report.faults,
        "worker finished"
    );
    report
}

/// Parses and rates one row. A panic anywhere inside becomes a
/// [`RowError::WorkerFault`] for that row only.
fn guarded_process(
    worker: usize,
    cells: &[String],
    headers: &[String],
    ctx: &WorkerContext,
) -> Result<PlayerRecord, RowError> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<PlayerRecord, RowError> {
        let mut record = parse_row(cells, headers)?;
        record.enhance(ctx.weights.as_ref(), &ctx.settings);
        Ok(record)
    }));
    match attempt {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(worker, "worker recovered from panic: {message}");
            Err(RowError::WorkerFault { worker, message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize) -> RawRow {
        RawRow {
            index,
            cells: vec![format!("Player {index}")],
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let metrics = Arc::new(PipelineMetrics::default());
        let (mut tx, rx) = row_queue(2, Duration::from_millis(10), metrics);
        tx.close();
        tx.close();
        assert!(tx.is_closed());
        assert_eq!(tx.send(row(0), &CancellationToken::new()).await, SendStatus::Closed);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_queue_drops_after_timeout() {
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = row_queue(1, Duration::from_millis(20), Arc::clone(&metrics));
        let cancel = CancellationToken::new();
        assert_eq!(tx.send(row(0), &cancel).await, SendStatus::Queued);
        assert_eq!(tx.send(row(1), &cancel).await, SendStatus::Dropped);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rows_enqueued, 1);
        assert_eq!(snapshot.backpressure_events, 1);
        assert_eq!(snapshot.rows_dropped, 1);
        assert_eq!(rx.recv().await.map(|r| r.index), Some(0));
    }

    #[tokio::test]
    async fn full_queue_waits_for_a_free_slot() {
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, rx) = row_queue(1, Duration::from_secs(2), Arc::clone(&metrics));
        let cancel = CancellationToken::new();
        assert_eq!(tx.send(row(0), &cancel).await, SendStatus::Queued);

        let drain = rx.clone();
        let first = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drain.recv().await.map(|r| r.index)
        });
        assert_eq!(tx.send(row(1), &cancel).await, SendStatus::Queued);
        assert_eq!(first.await.expect("drain task"), Some(0));
        assert_eq!(rx.recv().await.map(|r| r.index), Some(1));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.backpressure_events, 1);
        assert_eq!(snapshot.rows_enqueued, 2);
        assert_eq!(snapshot.rows_dropped, 0);
    }

    #[tokio::test]
    async fn cancel_during_wait_closes() {
        let metrics = Arc::new(PipelineMetrics::default());
        let (tx, _rx) = row_queue(1, Duration::from_secs(5), Arc::clone(&metrics));
        let cancel = CancellationToken::new();
        assert_eq!(tx.send(row(0), &cancel).await, SendStatus::Queued);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        assert_eq!(tx.send(row(1), &cancel).await, SendStatus::Closed);
        assert_eq!(metrics.snapshot().rows_dropped, 0);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
