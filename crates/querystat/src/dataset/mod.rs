use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::RawQueryEvent;
use crate::stats::SchemaError;

pub const TSV_DELIMITER: u8 = b'\t';

/// Canonical column layout of the query log, compared positionally.
pub const EXPECTED_COLUMNS: [(&str, ColumnType); 5] = [
    ("query_id", ColumnType::Int),
    ("status", ColumnType::Int),
    ("time", ColumnType::Int),
    ("rows", ColumnType::Int),
    ("threads", ColumnType::String),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    String,
}

impl ColumnType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
        }
    }

    /// Integer-like cells are still valid strings, so a `string` slot takes both.
    #[must_use]
    pub const fn satisfies(self, expected: Self) -> bool {
        matches!(
            (self, expected),
            (Self::Int, Self::Int) | (_, Self::String)
        )
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub cells: Vec<String>,
}

impl Column {
    fn infer(name: String, cells: Vec<String>) -> Self {
        let all_integers =
            !cells.is_empty() && cells.iter().all(|cell| cell.trim().parse::<i64>().is_ok());
        let column_type = if all_integers {
            ColumnType::Int
        } else {
            ColumnType::String
        };

        Self {
            name,
            column_type,
            cells,
        }
    }

    fn int_cells(&self) -> Result<Vec<i64>, SchemaError> {
        self.cells
            .iter()
            .map(|cell| cell.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| SchemaError::ColumnTypes {
                expected: expected_types(),
                actual: vec![self.column_type],
            })
    }
}

/// Column-oriented view of the dataset file with inferred column types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl QueryTable {
    /// Builds a table from a header and row-major cells. Every row must have
    /// exactly as many cells as the header; rows are numbered as lines of a
    /// file whose first line is the header.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, SchemaError> {
        let mut column_cells = vec![Vec::with_capacity(rows.len()); header.len()];
        let row_count = rows.len();

        for (offset, row) in rows.into_iter().enumerate() {
            check_row_width(offset as u64 + 2, header.len(), row.len())?;
            for (cells, cell) in column_cells.iter_mut().zip(row) {
                cells.push(cell);
            }
        }

        let columns = header
            .into_iter()
            .zip(column_cells)
            .map(|(name, cells)| Column::infer(name, cells))
            .collect();

        Ok(Self { columns, row_count })
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub const fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    #[must_use]
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|column| column.column_type).collect()
    }
}

fn expected_names() -> Vec<String> {
    EXPECTED_COLUMNS
        .iter()
        .map(|(name, _)| (*name).to_string())
        .collect()
}

fn expected_types() -> Vec<ColumnType> {
    EXPECTED_COLUMNS.iter().map(|(_, kind)| *kind).collect()
}

/// Strict ordered check: same column count, same names at the same positions,
/// then compatible types at the same positions.
pub fn validate_schema(table: &QueryTable) -> Result<(), SchemaError> {
    let actual_names = table.column_names();
    let names_match = actual_names.len() == EXPECTED_COLUMNS.len()
        && actual_names
            .iter()
            .zip(EXPECTED_COLUMNS.iter())
            .all(|(actual, (expected, _))| actual == expected);
    if !names_match {
        return Err(SchemaError::ColumnNames {
            expected: expected_names(),
            actual: actual_names,
        });
    }

    let actual_types = table.column_types();
    let types_match = actual_types
        .iter()
        .zip(EXPECTED_COLUMNS.iter())
        .all(|(actual, (_, expected))| actual.satisfies(*expected));
    if !types_match {
        return Err(SchemaError::ColumnTypes {
            expected: expected_types(),
            actual: actual_types,
        });
    }

    Ok(())
}

/// Validates the table and converts it into typed events, in file order.
pub fn query_events(table: &QueryTable) -> Result<Vec<RawQueryEvent>, SchemaError> {
    validate_schema(table)?;

    let [query_id, status, time, rows, threads] = table.columns() else {
        return Err(SchemaError::ColumnNames {
            expected: expected_names(),
            actual: table.column_names(),
        });
    };
    let query_ids = query_id.int_cells()?;
    let statuses = status.int_cells()?;
    let times = time.int_cells()?;
    let row_counts = rows.int_cells()?;

    let events = (0..table.row_count())
        .map(|index| RawQueryEvent {
            query_id: query_ids[index],
            status: statuses[index],
            time: times[index],
            rows: row_counts[index],
            threads: threads.cells[index].clone(),
        })
        .collect();

    Ok(events)
}

pub fn read_tsv<R: Read>(reader: R) -> Result<QueryTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(TSV_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = reader
        .headers()
        .context("failed to read dataset header")?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to read dataset row")?;
        if let Some(position) = record.position() {
            check_row_width(position.line(), header.len(), record.len())?;
        }
        rows.push(record.iter().map(ToString::to_string).collect::<Vec<_>>());
    }

    Ok(QueryTable::from_rows(header, rows)?)
}

fn check_row_width(line: u64, expected_fields: usize, found_fields: usize) -> Result<(), SchemaError> {
    if expected_fields == found_fields {
        return Ok(());
    }

    Err(SchemaError::MalformedRow {
        line,
        expected_fields,
        found_fields,
    })
}

pub fn load_tsv(path: &Path) -> Result<QueryTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open dataset: {}", path.display()))?;
    read_tsv(file).with_context(|| format!("failed to load dataset: {}", path.display()))
}
