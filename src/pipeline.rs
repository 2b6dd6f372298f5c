//! End-to-end driver: byte stream in, rated and ranked records out.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{ExtractError, RowError};
use crate::extract::{LaunchTrigger, extract};
use crate::percentiles::{DivisionFilter, rank_with_filter};
use crate::player::{ParseOutcome, PlayerRecord};
use crate::ratings::RatingSettings;
use crate::row_pool::RowPool;
use crate::weights::{WeightProvider, WeightTables};
use crate::workers::{
    MetricsSnapshot, PipelineMetrics, WorkerContext, WorkerPool, WorkerReport, row_queue,
};

/// Everything one run produced, in document order.
#[derive(Debug)]
pub struct ParsedBatch {
    pub headers: Arc<[String]>,
    pub records: Vec<PlayerRecord>,
    /// Rows that failed for a reason worth reporting, by row index.
    pub row_errors: Vec<(usize, RowError)>,
    /// Blank spacer rows.
    pub skipped_rows: usize,
    /// First currency symbol seen in the batch.
    pub currency_symbol: Option<String>,
    pub trigger: LaunchTrigger,
    pub workers: WorkerReport,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub players: usize,
    pub row_errors: usize,
    pub skipped_rows: usize,
    pub currency_symbol: Option<String>,
    pub metrics: MetricsSnapshot,
}

impl ParsedBatch {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            players: self.records.len(),
            row_errors: self.row_errors.len(),
            skipped_rows: self.skipped_rows,
            currency_symbol: self.currency_symbol.clone(),
            metrics: self.metrics,
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    weights: Arc<dyn WeightProvider>,
    rank_pool: Option<Arc<rayon::ThreadPool>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, weights: Arc<dyn WeightProvider>) -> Self {
        let rank_pool = build_rank_pool(config.worker_count).map(Arc::new);
        Self {
            config,
            weights,
            rank_pool,
        }
    }

    /// Builds the weight tables from the paths in `config`, falling back to
    /// the built-in tables per file.
    pub fn from_config(config: PipelineConfig) -> Self {
        let tables = WeightTables::load(
            config.attribute_weights_path.as_deref(),
            config.role_weights_path.as_deref(),
        );
        Self::new(config, Arc::new(tables))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn weights(&self) -> &dyn WeightProvider {
        self.weights.as_ref()
    }

    /// Extracts, parses and rates every row. Percentiles are not computed.
    pub async fn parse<R>(
        &self,
        reader: R,
        cancel: CancellationToken,
    ) -> Result<ParsedBatch, ExtractError>
    where
        R: AsyncRead + Unpin,
    {
        let metrics = Arc::new(PipelineMetrics::default());
        let row_pool = RowPool::new(self.config.cell_capacity);
        let (rows_tx, rows_rx) = row_queue(
            self.config.row_queue_depth,
            self.config.backpressure_timeout,
            Arc::clone(&metrics),
        );
        let (outcomes_tx, mut outcomes_rx) =
            mpsc::channel::<ParseOutcome>(self.config.outcome_queue_depth.max(1));

        let ctx = WorkerContext {
            weights: Arc::clone(&self.weights),
            settings: self.config.ratings,
            metrics: Arc::clone(&metrics),
            row_pool: row_pool.clone(),
            cancel: cancel.clone(),
        };
        let worker_count = self.config.worker_count;
        let launch = move |headers: Arc<[String]>| {
            WorkerPool::spawn(worker_count, headers, rows_rx, outcomes_tx, ctx)
        };

        let producer = extract(reader, rows_tx, row_pool, cancel.clone(), launch);
        let collector = async {
            let mut outcomes = Vec::new();
            while let Some(outcome) = outcomes_rx.recv().await {
                outcomes.push(outcome);
            }
            outcomes
        };
        let (extracted, mut outcomes) = tokio::join!(producer, collector);
        let extracted = extracted?;
        let workers = extracted.pool.join().await;
        if cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }

        outcomes.sort_by_key(|outcome| outcome.index);
        let mut records = Vec::with_capacity(outcomes.len());
        let mut row_errors = Vec::new();
        let mut skipped_rows = 0;
        for ParseOutcome { index, result } in outcomes {
            match result {
                Ok(mut record) => {
                    if record.uid.is_empty() {
                        record.uid = format!("row-{index}");
                    }
                    records.push(record);
                }
                Err(err) if err.is_skippable() => skipped_rows += 1,
                Err(err) => row_errors.push((index, err)),
            }
        }

        let currency_symbol = records
            .iter()
            .map(|record| record.currency_symbol.as_str())
            .find(|symbol| !symbol.is_empty())
            .map(str::to_string);

        let metrics = metrics.snapshot();
        if metrics.rows_dropped > 0 {
            warn!(dropped = metrics.rows_dropped, "rows dropped under backpressure");
        }
        info!(
            players = records.len(),
            errors = row_errors.len(),
            skipped = skipped_rows,
            "parse complete"
        );

        Ok(ParsedBatch {
            headers: extracted.headers,
            records,
            row_errors,
            skipped_rows,
            currency_symbol,
            trigger: extracted.trigger,
            workers,
            metrics,
        })
    }

    /// [`Pipeline::parse`] followed by the percentile pass on a blocking thread.
    pub async fn run<R>(
        &self,
        reader: R,
        filter: &DivisionFilter,
        cancel: CancellationToken,
    ) -> Result<ParsedBatch, ExtractError>
    where
        R: AsyncRead + Unpin,
    {
        let mut batch = self.parse(reader, cancel).await?;
        let mut records = std::mem::take(&mut batch.records);
        let pool = self.rank_pool.clone();
        let filter = filter.clone();
        let ranked = tokio::task::spawn_blocking(move || {
            with_rank_pool(pool.as_deref(), || rank_with_filter(&mut records, &filter));
            records
        })
        .await;
        batch.records = match ranked {
            Ok(records) => records,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => return Err(ExtractError::Cancelled),
        };
        Ok(batch)
    }

    pub async fn run_file(
        &self,
        path: &Path,
        filter: &DivisionFilter,
        cancel: CancellationToken,
    ) -> Result<ParsedBatch, ExtractError> {
        let file = tokio::fs::File::open(path).await?;
        self.run(file, filter, cancel).await
    }

    /// Percentiles on the pipeline's pool, sized like the worker pool.
    pub fn rank(&self, records: &mut [PlayerRecord], filter: &DivisionFilter) {
        with_rank_pool(self.rank_pool.as_deref(), || rank_with_filter(records, filter));
    }

    /// Re-rates already enhanced records, e.g. after switching scaling mode.
    pub fn recalculate(&self, records: &mut [PlayerRecord], settings: &RatingSettings) {
        let weights = self.weights.as_ref();
        records
            .par_iter_mut()
            .for_each(|record| record.recalculate(weights, settings));
    }
}

fn build_rank_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("squadview-rank-{i}"))
        .build()
        .map_err(|err| warn!(error = %err, "rank pool unavailable, using the global pool"))
        .ok()
}

fn with_rank_pool<T>(pool: Option<&rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool {
        pool.install(action)
    } else {
        action()
    }
}
