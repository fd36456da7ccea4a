mod error;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub use error::{RangeError, SchemaError};

use crate::dataset::{QueryTable, query_events};
use crate::models::{DatasetBounds, MergedQueryRecord, QueryStatus, RawQueryEvent};
use crate::utils::time::{MILLIS_PER_SECOND, day_end_exclusive, day_start};

/// Counts gathered while pairing start and finish events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub raw_rows: usize,
    pub start_events: usize,
    pub finish_events: usize,
    pub ignored_rows: usize,
    pub merged_records: usize,
    pub unmatched_starts: usize,
    pub unmatched_finishes: usize,
}

#[derive(Debug, Clone)]
struct FinishPart {
    time: i64,
    rows: i64,
    threads: String,
    paired: bool,
}

/// Read-only statistics over paired query executions.
///
/// Everything is computed at construction; the calculator holds no interior
/// mutability and can be shared across threads by reference.
#[derive(Debug, Clone)]
pub struct QueryStatisticCalculator {
    records: Vec<MergedQueryRecord>,
    bounds: DatasetBounds,
    summary: LoadSummary,
}

impl QueryStatisticCalculator {
    pub fn new(table: &QueryTable) -> Result<Self, SchemaError> {
        Self::from_events(query_events(table)?)
    }

    /// Pairs start and finish events on `query_id`. Ids missing either side
    /// are dropped; a second start or finish for the same id is rejected.
    pub fn from_events(
        events: impl IntoIterator<Item = RawQueryEvent>,
    ) -> Result<Self, SchemaError> {
        let mut summary = LoadSummary::default();
        let mut starts = Vec::new();
        let mut finishes: HashMap<i64, FinishPart> = HashMap::new();

        for event in events {
            summary.raw_rows += 1;
            match event.query_status() {
                Some(QueryStatus::Start) => {
                    summary.start_events += 1;
                    starts.push((event.query_id, event.time));
                }
                Some(QueryStatus::Finish) => {
                    summary.finish_events += 1;
                    match finishes.entry(event.query_id) {
                        Entry::Occupied(_) => {
                            return Err(SchemaError::DuplicateEvent {
                                query_id: event.query_id,
                                status: QueryStatus::Finish,
                            });
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(FinishPart {
                                time: event.time,
                                rows: event.rows,
                                threads: event.threads,
                                paired: false,
                            });
                        }
                    }
                }
                None => summary.ignored_rows += 1,
            }
        }

        let mut seen_starts = HashSet::with_capacity(starts.len());
        let mut records = Vec::with_capacity(starts.len().min(finishes.len()));
        for (query_id, start) in starts {
            if !seen_starts.insert(query_id) {
                return Err(SchemaError::DuplicateEvent {
                    query_id,
                    status: QueryStatus::Start,
                });
            }

            let Some(finish) = finishes.get_mut(&query_id) else {
                summary.unmatched_starts += 1;
                continue;
            };
            finish.paired = true;
            records.push(MergedQueryRecord {
                query_id,
                start,
                finish: finish.time,
                rows: finish.rows,
                threads: finish.threads.clone(),
            });
        }

        summary.unmatched_finishes = finishes.values().filter(|part| !part.paired).count();
        summary.merged_records = records.len();

        let bounds = DatasetBounds {
            min_start: records
                .iter()
                .map(|record| record.start)
                .min()
                .ok_or(SchemaError::EmptyDataset)?,
            max_finish: records
                .iter()
                .map(|record| record.finish)
                .max()
                .ok_or(SchemaError::EmptyDataset)?,
        };

        Ok(Self {
            records,
            bounds,
            summary,
        })
    }

    #[must_use]
    pub fn records(&self) -> &[MergedQueryRecord] {
        &self.records
    }

    #[must_use]
    pub const fn bounds(&self) -> DatasetBounds {
        self.bounds
    }

    #[must_use]
    pub const fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    pub fn check_timestamp(&self, timestamp: i64) -> Result<(), RangeError> {
        if self.bounds.contains(timestamp) {
            return Ok(());
        }

        Err(RangeError::OutOfBounds {
            timestamp,
            min_start: self.bounds.min_start,
            max_finish: self.bounds.max_finish,
        })
    }

    /// Both endpoints are bounds-checked before their order is.
    pub fn check_range(&self, start: i64, finish: i64) -> Result<(), RangeError> {
        self.check_timestamp(start)?;
        self.check_timestamp(finish)?;

        if start == finish {
            return Err(RangeError::EmptyWindow { timestamp: start });
        }
        if start > finish {
            return Err(RangeError::InvertedWindow { start, finish });
        }

        Ok(())
    }

    /// Mean duration, in seconds, of queries that both start and finish on
    /// the UTC day containing `timestamp`. The day is half-open, so a query
    /// finishing exactly at the next midnight is excluded. `NaN` when no
    /// query qualifies.
    pub fn average_elapsed_seconds_on_date(&self, timestamp: i64) -> Result<f64, RangeError> {
        self.check_timestamp(timestamp)?;

        let day_start_ms = day_start(timestamp);
        let next_day_ms = day_end_exclusive(day_start_ms);

        let (count, total_ms) = self
            .records
            .iter()
            .filter(|record| record.start >= day_start_ms && record.finish < next_day_ms)
            .fold((0_u64, 0_i128), |(count, total), record| {
                (count + 1, total + record.duration_ms())
            });

        let mean_ms = total_ms as f64 / count as f64;
        Ok(mean_ms / MILLIS_PER_SECOND as f64)
    }

    /// Rows returned by queries fully inside `[start, finish]`, per second of
    /// the window.
    pub fn average_rows_per_second(&self, start: i64, finish: i64) -> Result<f64, RangeError> {
        self.check_range(start, finish)?;

        let rows = self.rows_in_window(start, finish);
        let elapsed_seconds = window_ms(start, finish) / MILLIS_PER_SECOND as f64;

        Ok(rows as f64 / elapsed_seconds)
    }

    /// Rows returned by queries fully inside the window, divided by the number
    /// of distinct thread ids those queries ran on. `0.0` when no thread is
    /// seen.
    pub fn average_rows_per_thread(&self, start: i64, finish: i64) -> Result<f64, RangeError> {
        self.check_range(start, finish)?;

        let threads = self
            .window(start, finish)
            .flat_map(|record| record.thread_ids())
            .collect::<HashSet<_>>();
        if threads.is_empty() {
            return Ok(0.0);
        }

        let rows = self.rows_in_window(start, finish);
        Ok(rows as f64 / threads.len() as f64)
    }

    /// Thread-milliseconds spent by queries fully inside the window, divided
    /// by the window length and then by 1000.
    pub fn average_threads_per_second(&self, start: i64, finish: i64) -> Result<f64, RangeError> {
        self.check_range(start, finish)?;

        let thread_ms = self
            .window(start, finish)
            .map(|record| record.duration_ms() * record.thread_count() as i128)
            .sum::<i128>();

        Ok(thread_ms as f64 / window_ms(start, finish) / MILLIS_PER_SECOND as f64)
    }

    fn window(&self, start: i64, finish: i64) -> impl Iterator<Item = &MergedQueryRecord> {
        self.records
            .iter()
            .filter(move |record| record.within_window(start, finish))
    }

    fn rows_in_window(&self, start: i64, finish: i64) -> i128 {
        self.window(start, finish)
            .map(|record| i128::from(record.rows))
            .sum()
    }
}

fn window_ms(start: i64, finish: i64) -> f64 {
    (i128::from(finish) - i128::from(start)) as f64
}
