//! One-to-many normalization of a nested array field

use super::columns::{join_path, sanitize_column_name};
use super::types::{FlatRow, FlatTable, FlattenStats};
use crate::config::FlattenConfig;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Explodes `record_path` into rows and broadcasts parent fields onto them
#[derive(Debug, Clone)]
pub struct Flattener {
    record_path: String,
    record_prefix: String,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::from_config(&FlattenConfig::default())
    }
}

impl Flattener {
    /// Create a flattener for an array field and a row column prefix
    pub fn new(record_path: impl Into<String>, record_prefix: impl Into<String>) -> Self {
        Self {
            record_path: record_path.into(),
            record_prefix: record_prefix.into(),
        }
    }

    /// Create a flattener from config
    pub fn from_config(config: &FlattenConfig) -> Self {
        Self::new(&config.record_path, &config.record_prefix)
    }

    /// Column name prefix of array element fields
    pub fn record_prefix(&self) -> &str {
        &self.record_prefix
    }

    /// Flatten a batch of parent records
    ///
    /// Each element of the parent's `record_path` array becomes one row.
    /// Element fields are prefixed with `record_prefix`; nested objects are
    /// expanded into dotted paths; arrays inside elements stay list values.
    /// Scalar fields of the parent (including those reached through nested
    /// objects) are copied onto every row of that parent. A parent without
    /// the array contributes no rows.
    pub fn flatten(&self, records: &[Value]) -> (FlatTable, FlattenStats) {
        let mut stats = FlattenStats::default();
        let mut columns = Vec::new();
        let mut seen_columns = HashSet::new();
        let mut rows = Vec::new();

        for record in records {
            stats.records += 1;

            let Some(elements) = self.elements(record) else {
                stats.records_without_path += 1;
                continue;
            };

            let parent = self.parent_fields(record);

            for element in elements {
                let mut row = FlatRow::new();

                match element {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            let name = format!("{}{key}", self.record_prefix);
                            flatten_value(&mut row, &name, value, true);
                        }
                    }
                    other => {
                        row.insert(format!("{}value", self.record_prefix), other.clone());
                    }
                }

                // Element fields win over parent fields of the same name
                for (name, value) in &parent {
                    if !row.contains_key(name) {
                        row.insert(name.clone(), value.clone());
                    }
                }

                let row = sanitize_row(row);
                for name in row.keys() {
                    if seen_columns.insert(name.clone()) {
                        columns.push(name.clone());
                    }
                }
                rows.push(row);
            }
        }

        stats.rows = rows.len();
        debug!(
            "Flattened {} records into {} rows ({} without '{}')",
            stats.records, stats.rows, stats.records_without_path, self.record_path
        );

        (FlatTable::new(columns, rows), stats)
    }

    /// Elements of the nested array, `None` when the record has none
    ///
    /// A single object under `record_path` counts as a one-element array.
    fn elements<'a>(&self, record: &'a Value) -> Option<Vec<&'a Value>> {
        match record.get(&self.record_path)? {
            Value::Array(items) => Some(items.iter().collect()),
            object @ Value::Object(_) => Some(vec![object]),
            _ => None,
        }
    }

    /// Broadcastable scalar leaves of a parent record
    fn parent_fields(&self, record: &Value) -> FlatRow {
        let mut fields = FlatRow::new();
        if let Value::Object(object) = record {
            for (key, value) in object {
                if key != &self.record_path {
                    flatten_value(&mut fields, key, value, false);
                }
            }
        }
        fields
    }
}

/// Flatten one batch with the given settings
pub fn flatten_batch(records: &[Value], config: &FlattenConfig) -> (FlatTable, FlattenStats) {
    Flattener::from_config(config).flatten(records)
}

/// Expand `value` into dotted leaves under `name`
fn flatten_value(out: &mut Map<String, Value>, name: &str, value: &Value, keep_arrays: bool) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (key, child) in fields {
                flatten_value(out, &join_path(name, key), child, keep_arrays);
            }
        }
        Value::Object(_) => {
            out.insert(name.to_string(), Value::Null);
        }
        Value::Array(_) => {
            if keep_arrays {
                out.insert(name.to_string(), value.clone());
            }
        }
        scalar => {
            out.insert(name.to_string(), scalar.clone());
        }
    }
}

/// Rewrite every key to a legal column name, first writer wins on collision
fn sanitize_row(row: FlatRow) -> FlatRow {
    let mut sanitized = FlatRow::new();
    for (name, value) in row {
        sanitized
            .entry(sanitize_column_name(&name))
            .or_insert(value);
    }
    sanitized
}
