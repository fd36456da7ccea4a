use std::fmt::{Display, Formatter};

use crate::dataset::ColumnType;
use crate::models::QueryStatus;

/// The dataset does not have the shape the calculator can work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    ColumnNames {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    ColumnTypes {
        expected: Vec<ColumnType>,
        actual: Vec<ColumnType>,
    },
    MalformedRow {
        line: u64,
        expected_fields: usize,
        found_fields: usize,
    },
    DuplicateEvent {
        query_id: i64,
        status: QueryStatus,
    },
    EmptyDataset,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNames { expected, actual } => write!(
                f,
                "Expected column names \"{}\" but \"{}\" are given",
                render_list(expected),
                render_list(actual)
            ),
            Self::ColumnTypes { expected, actual } => write!(
                f,
                "Expected column types \"{}\" but \"{}\" are given",
                render_list(expected),
                render_list(actual)
            ),
            Self::MalformedRow {
                line,
                expected_fields,
                found_fields,
            } => write!(
                f,
                "line {line}: expected {expected_fields} fields but {found_fields} are given"
            ),
            Self::DuplicateEvent { query_id, status } => write!(
                f,
                "query {query_id} has more than one {} event",
                status.as_str()
            ),
            Self::EmptyDataset => {
                f.write_str("no query has both a start and a finish event; bounds are undefined")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A query argument falls outside the dataset or the window is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    OutOfBounds {
        timestamp: i64,
        min_start: i64,
        max_finish: i64,
    },
    EmptyWindow {
        timestamp: i64,
    },
    InvertedWindow {
        start: i64,
        finish: i64,
    },
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds {
                timestamp,
                min_start,
                max_finish,
            } => write!(
                f,
                "Timestamp \"{timestamp}\" should be in the range [\"{min_start}\",\"{max_finish}\"]"
            ),
            Self::EmptyWindow { timestamp } => write!(
                f,
                "Start timestamp and finish timestamp should be not equal. The current value is \"{timestamp}\""
            ),
            Self::InvertedWindow { start, finish } => write!(
                f,
                "Start timestamp \"{start}\" should be less than finish timestamp \"{finish}\""
            ),
        }
    }
}

impl std::error::Error for RangeError {}

fn render_list<T: Display>(items: &[T]) -> String {
    let quoted = items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}
