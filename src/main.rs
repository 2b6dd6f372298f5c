use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use squadview::config::PipelineConfig;
use squadview::logging;
use squadview::percentiles::DivisionFilter;
use squadview::pipeline::Pipeline;
use squadview::player::PlayerRecord;
use squadview::ratings::{GOALKEEPER_CATEGORIES, OUTFIELD_CATEGORIES};

const USAGE: &str = "usage: squadview <export.html> [--division=<name> | --top5] [--json]";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let path = parse_input_arg(&args).ok_or_else(|| anyhow!(USAGE))?;
    let filter = parse_division_arg(&args);
    let as_json = args.iter().any(|arg| arg == "--json");

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling parse");
            ctrl_c.cancel();
        }
    });

    let pipeline = Pipeline::from_config(PipelineConfig::from_env());
    let batch = pipeline
        .run_file(&path, &filter, cancel)
        .await
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if as_json {
        let out = serde_json::to_string_pretty(&batch.records)?;
        println!("{out}");
        return Ok(());
    }

    let summary = batch.summary();
    println!("Parsed {}", path.display());
    println!("Players: {}", summary.players);
    println!(
        "Rows skipped: {}  errors: {}",
        summary.skipped_rows, summary.row_errors
    );
    println!(
        "Currency: {}",
        summary.currency_symbol.as_deref().unwrap_or("n/a")
    );
    println!(
        "Queue: enqueued={} backpressure={} dropped={}",
        summary.metrics.rows_enqueued,
        summary.metrics.backpressure_events,
        summary.metrics.rows_dropped
    );
    for (index, err) in batch.row_errors.iter().take(6) {
        println!("  row {index}: {err}");
    }

    let mut ranked = batch.records.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.overall.cmp(&a.overall).then_with(|| a.name.cmp(&b.name)));
    for record in ranked.iter().take(20) {
        let best = record
            .best_role
            .as_ref()
            .map(|role| format!("{} {}", role.role, role.score))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}  {:<28} {:<14} {:<24} {:<44} {}",
            record.overall,
            record.name,
            record.short_positions.join("/"),
            record.club,
            best,
            category_line(record)
        );
    }

    Ok(())
}

fn category_line(record: &PlayerRecord) -> String {
    let codes = if record.is_goalkeeper() {
        GOALKEEPER_CATEGORIES
    } else {
        OUTFIELD_CATEGORIES
    };
    codes
        .iter()
        .filter_map(|code| record.stats.get(code).map(|value| format!("{code} {value}")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_input_arg(args: &[String]) -> Option<PathBuf> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--division" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        let trimmed = arg.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

fn parse_division_arg(args: &[String]) -> DivisionFilter {
    for (idx, arg) in args.iter().enumerate() {
        if arg == "--top5" {
            return DivisionFilter::TopFive;
        }
        if let Some(name) = arg.strip_prefix("--division=") {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                return DivisionFilter::Same(trimmed.to_string());
            }
        }
        if arg == "--division" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return DivisionFilter::Same(next.trim().to_string());
            }
        }
    }
    DivisionFilter::All
}
