use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::json;

use crate::models::{DatasetBounds, ResponseEnvelope};
use crate::stats::{LoadSummary, QueryStatisticCalculator};
use crate::utils::time::format_datetime;

#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub dataset_path: String,
    pub load: LoadSummary,
    pub bounds: DatasetBounds,
    pub min_start_utc: String,
    pub max_finish_utc: String,
}

pub fn build_summary_report(
    dataset_path: &Path,
    calculator: &QueryStatisticCalculator,
) -> Result<SummaryReport> {
    let bounds = calculator.bounds();
    Ok(SummaryReport {
        dataset_path: dataset_path.to_string_lossy().to_string(),
        load: *calculator.summary(),
        bounds,
        min_start_utc: format_datetime(bounds.min_start)?,
        max_finish_utc: format_datetime(bounds.max_finish)?,
    })
}

#[must_use]
pub fn render_text_report(report: &SummaryReport) -> String {
    let lines = [
        format!("dataset_path: {}", report.dataset_path),
        format!("load.raw_rows: {}", report.load.raw_rows),
        format!("load.start_events: {}", report.load.start_events),
        format!("load.finish_events: {}", report.load.finish_events),
        format!("load.ignored_rows: {}", report.load.ignored_rows),
        format!("load.merged_records: {}", report.load.merged_records),
        format!("load.unmatched_starts: {}", report.load.unmatched_starts),
        format!("load.unmatched_finishes: {}", report.load.unmatched_finishes),
        format!(
            "bounds.min_start: {} ({})",
            report.bounds.min_start, report.min_start_utc
        ),
        format!(
            "bounds.max_finish: {} ({})",
            report.bounds.max_finish, report.max_finish_utc
        ),
    ];
    lines.join("\n")
}

pub fn run(
    args: &SummaryArgs,
    dataset_path: &Path,
    calculator: &QueryStatisticCalculator,
) -> Result<()> {
    let report = build_summary_report(dataset_path, calculator)?;

    if args.json {
        let data = serde_json::to_value(&report).context("failed to encode summary report")?;
        let envelope = ResponseEnvelope::ok("summary", data).with_meta("status", json!(200));
        let encoded =
            serde_json::to_string(&envelope).context("failed to encode response envelope")?;
        println!("{encoded}");
    } else {
        println!("{}", render_text_report(&report));
    }

    Ok(())
}
