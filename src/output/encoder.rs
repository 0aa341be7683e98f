//! Flat table to Parquet

use super::schema::{infer_schema, table_to_arrow};
use super::writer::{encode_parquet, write_batch_to_parquet, ParquetWriterConfig};
use crate::error::Result;
use crate::flatten::{sanitize_column_name, FlatTable};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use std::path::Path;

/// Encodes flattened batches as Parquet
#[derive(Debug, Clone)]
pub struct ColumnarEncoder {
    config: ParquetWriterConfig,
    /// Column written when a table has no columns at all
    placeholder_column: String,
}

impl Default for ColumnarEncoder {
    fn default() -> Self {
        Self::new(ParquetWriterConfig::default(), "features_")
    }
}

impl ColumnarEncoder {
    /// Create an encoder
    ///
    /// `row_prefix` names the placeholder column (`<row_prefix>empty`) used
    /// for batches that produced no columns.
    pub fn new(config: ParquetWriterConfig, row_prefix: &str) -> Self {
        Self {
            config,
            placeholder_column: sanitize_column_name(&format!("{row_prefix}empty")),
        }
    }

    /// Writer settings
    pub fn config(&self) -> &ParquetWriterConfig {
        &self.config
    }

    /// Convert a table to a RecordBatch with an inferred schema
    pub fn to_record_batch(&self, table: &FlatTable) -> Result<RecordBatch> {
        let mut schema = infer_schema(table);
        if schema.fields().is_empty() {
            schema = Schema::new(vec![Field::new(
                &self.placeholder_column,
                DataType::Utf8,
                true,
            )]);
        }
        table_to_arrow(table, Some(&schema))
    }

    /// Encode a table into Parquet bytes
    pub fn encode(&self, table: &FlatTable) -> Result<(RecordBatch, Bytes)> {
        let batch = self.to_record_batch(table)?;
        let bytes = encode_parquet(&batch, &self.config)?;
        Ok((batch, bytes))
    }

    /// Encode a table into a local Parquet file, returning the row count
    pub fn encode_to_file(&self, table: &FlatTable, path: &Path) -> Result<(RecordBatch, usize)> {
        let batch = self.to_record_batch(table)?;
        let rows = write_batch_to_parquet(path, &batch, &self.config)?;
        Ok((batch, rows))
    }
}
