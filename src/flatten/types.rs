//! Flattened table types

use serde::Serialize;
use serde_json::{Map, Value};

/// One output row, keyed by sanitized column name
pub type FlatRow = Map<String, Value>;

/// Rows produced from one batch, with columns in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    columns: Vec<String>,
    rows: Vec<FlatRow>,
}

impl FlatTable {
    /// Create a table from columns and rows
    ///
    /// Every key used by a row must appear in `columns`; rows may omit
    /// columns, which read back as null.
    pub fn new(columns: Vec<String>, rows: Vec<FlatRow>) -> Self {
        Self { columns, rows }
    }

    /// Column names in first-seen order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The rows
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, `None` when absent
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Counters for one flatten call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlattenStats {
    /// Parent records seen
    pub records: usize,
    /// Parent records without the nested array, contributing no rows
    pub records_without_path: usize,
    /// Rows produced
    pub rows: usize,
}
