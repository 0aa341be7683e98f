//! Pipeline types
//!
//! Batch accumulator, run state and the per-run report.

use crate::storage::ArtifactOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Where a conversion pass currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Enumerating source keys
    #[default]
    Listing,
    /// Reading objects into the batch
    Accumulating,
    /// Converting and writing a full (or tail) batch
    Flushing,
    /// Every key consumed and the tail flushed
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Listing => "listing",
            Self::Accumulating => "accumulating",
            Self::Flushing => "flushing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Records accumulated for the next flush
#[derive(Debug, Clone)]
pub struct Batch {
    records: Vec<Value>,
    capacity: usize,
}

impl Batch {
    /// Create an empty batch that fills at `capacity` records
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record
    pub fn push(&mut self, record: Value) {
        self.records.push(record);
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records are held
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if the batch reached its capacity
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Take the records out, leaving the batch empty
    pub fn take(&mut self) -> Vec<Value> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity))
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A source object that did not make it into a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedObject {
    /// Object key
    pub key: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of one flushed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// 1-based flush number
    pub index: usize,
    /// Records accepted so far, including this batch; names the artifacts
    pub cumulative_count: usize,
    /// Records in this batch
    pub records: usize,
    /// Flattened rows in this batch
    pub rows: usize,
    /// Raw JSON archive
    pub archive: ArtifactOutcome,
    /// Parquet file
    pub columnar: ArtifactOutcome,
}

impl BatchReport {
    /// Check if both artifacts were written
    pub fn is_success(&self) -> bool {
        self.archive.is_written() && self.columnar.is_written()
    }

    /// First failure reason, if any
    pub fn failure_reason(&self) -> Option<&str> {
        self.archive.reason().or_else(|| self.columnar.reason())
    }
}

/// Statistics and per-batch outcomes of a conversion pass
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// When the pass finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Keys enumerated from the source
    pub keys_listed: usize,
    /// Records read, parsed and added to a batch
    pub records_accepted: usize,
    /// Objects that could not be fetched
    pub read_failures: usize,
    /// Objects that were not valid JSON
    pub parse_failures: usize,
    /// Records without the nested array, contributing no rows
    pub records_without_path: usize,
    /// Rows in Parquet files that were written
    pub rows_written: usize,
    /// Batches with both artifacts written
    pub batches_succeeded: usize,
    /// Batches with at least one artifact missing
    pub batches_failed: usize,
    /// Objects left out of every batch
    pub skipped: Vec<SkippedObject>,
    /// One report per flush
    pub batches: Vec<BatchReport>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            keys_listed: 0,
            records_accepted: 0,
            read_failures: 0,
            parse_failures: 0,
            records_without_path: 0,
            rows_written: 0,
            batches_succeeded: 0,
            batches_failed: 0,
            skipped: Vec::new(),
            batches: Vec::new(),
        }
    }
}

impl RunSummary {
    /// Start a new summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped object
    pub fn add_skip(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedObject {
            key: key.into(),
            reason: reason.into(),
        });
    }

    /// Record a flushed batch
    pub fn add_batch(&mut self, report: BatchReport) {
        if report.is_success() {
            self.batches_succeeded += 1;
        } else {
            self.batches_failed += 1;
        }
        if report.columnar.is_written() {
            self.rows_written += report.rows;
        }
        self.batches.push(report);
    }

    /// Mark the pass finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of flushes
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// One-line human summary
    pub fn message(&self) -> String {
        let mut message = format!(
            "Converted {} records from {} keys into {} batches",
            self.records_accepted,
            self.keys_listed,
            self.batch_count()
        );
        if self.batches_failed > 0 {
            message.push_str(&format!(", {} failed", self.batches_failed));
        }
        if !self.skipped.is_empty() {
            message.push_str(&format!(", {} objects skipped", self.skipped.len()));
        }
        message
    }
}
