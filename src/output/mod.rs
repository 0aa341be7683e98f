//! Output module
//!
//! Encodes a flushed batch into its two artifacts.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring Arrow schemas from flattened rows
//! - Converting flat tables to Arrow RecordBatches
//! - Writing Parquet to memory or local files
//! - Serializing the raw JSON archive

mod archive;
mod encoder;
mod schema;
mod writer;

pub use archive::encode_archive;
pub use encoder::ColumnarEncoder;
pub use schema::{describe_schema, infer_schema, preview_rows, table_to_arrow};
pub use writer::{encode_parquet, write_batch_to_parquet, ParquetWriter, ParquetWriterConfig};

#[cfg(test)]
mod tests;
