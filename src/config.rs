use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::ratings::{DEFAULT_RATING_SCALE, DEFAULT_ROLE_SCALE, RatingSettings, Scaling};
use crate::row_pool::DEFAULT_CELL_CAPACITY;
use crate::workers::DEFAULT_BACKPRESSURE_TIMEOUT;

const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub worker_count: usize,
    pub row_queue_depth: usize,
    pub outcome_queue_depth: usize,
    pub backpressure_timeout: Duration,
    pub cell_capacity: usize,
    pub ratings: RatingSettings,
    pub attribute_weights_path: Option<PathBuf>,
    pub role_weights_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_workers(default_worker_count())
    }
}

impl PipelineConfig {
    /// Defaults sized for `workers`, with both queues proportional to it.
    pub fn with_workers(workers: usize) -> Self {
        let worker_count = workers.clamp(1, 64);
        Self {
            worker_count,
            row_queue_depth: worker_count * QUEUE_DEPTH_PER_WORKER,
            outcome_queue_depth: worker_count * QUEUE_DEPTH_PER_WORKER,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
            cell_capacity: DEFAULT_CELL_CAPACITY,
            ratings: RatingSettings::default(),
            attribute_weights_path: None,
            role_weights_path: None,
        }
    }

    /// Defaults overridden by `SQUADVIEW_*` environment variables.
    pub fn from_env() -> Self {
        let worker_count = env::var("SQUADVIEW_WORKERS")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or_else(default_worker_count)
            .clamp(1, 64);
        let mut config = Self::with_workers(worker_count);

        config.row_queue_depth = env::var("SQUADVIEW_ROW_QUEUE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(config.row_queue_depth)
            .clamp(1, 65_536);
        config.outcome_queue_depth = env::var("SQUADVIEW_OUTCOME_QUEUE")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(config.outcome_queue_depth)
            .clamp(1, 65_536);
        config.backpressure_timeout = Duration::from_millis(
            env::var("SQUADVIEW_BACKPRESSURE_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(DEFAULT_BACKPRESSURE_TIMEOUT.as_millis() as u64)
                .clamp(1, 600_000),
        );

        config.ratings.rating_scale = env_scale("SQUADVIEW_RATING_SCALE", DEFAULT_RATING_SCALE);
        config.ratings.role_scale = env_scale("SQUADVIEW_ROLE_SCALE", DEFAULT_ROLE_SCALE);
        if let Some(scaling) = opt_env("SQUADVIEW_SCALING").and_then(|val| Scaling::from_label(&val)) {
            config.ratings.scaling = scaling;
        }

        config.attribute_weights_path = opt_env("SQUADVIEW_ATTRIBUTE_WEIGHTS").map(PathBuf::from);
        config.role_weights_path = opt_env("SQUADVIEW_ROLE_WEIGHTS").map(PathBuf::from);
        config
    }
}

pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 64)
}

fn env_scale(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .filter(|val| val.is_finite())
        .unwrap_or(default)
        .clamp(0.1, 20.0)
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val.trim().to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queues_scale_with_workers() {
        let config = PipelineConfig::with_workers(3);
        assert_eq!(config.row_queue_depth, 12);
        assert_eq!(config.outcome_queue_depth, 12);
        assert_eq!(config.backpressure_timeout, Duration::from_secs(5));
        assert_eq!(PipelineConfig::with_workers(0).worker_count, 1);
        assert_eq!(PipelineConfig::with_workers(500).worker_count, 64);
    }
}
