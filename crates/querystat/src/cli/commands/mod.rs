pub mod batch;
pub mod statistic;
pub mod summary;

use std::path::Path;

use anyhow::{Context, Result};

use crate::stats::QueryStatisticCalculator;

/// Loads and validates the dataset once; every command answers from the
/// returned calculator.
pub fn load_calculator(dataset_path: &Path) -> Result<QueryStatisticCalculator> {
    eprintln!("dataset: loading path={}", dataset_path.display());

    let table = crate::dataset::load_tsv(dataset_path)?;
    let calculator = QueryStatisticCalculator::new(&table).with_context(|| {
        format!(
            "dataset failed schema validation: {}",
            dataset_path.display()
        )
    })?;

    let summary = calculator.summary();
    let bounds = calculator.bounds();
    eprintln!(
        "dataset: loaded path={} raw_rows={} merged_records={} unmatched_starts={} unmatched_finishes={} ignored_rows={} min_start={} max_finish={}",
        dataset_path.display(),
        summary.raw_rows,
        summary.merged_records,
        summary.unmatched_starts,
        summary.unmatched_finishes,
        summary.ignored_rows,
        bounds.min_start,
        bounds.max_finish
    );

    Ok(calculator)
}

pub fn print_payload_schema() -> Result<()> {
    let schema = crate::models::statistic_payload_schema();
    let encoded =
        serde_json::to_string_pretty(&schema).context("failed to encode payload schema")?;
    println!("{encoded}");
    Ok(())
}
