//! Flatten module
//!
//! Turns a batch of nested JSON records into a flat table.
//!
//! # Overview
//!
//! - `Flattener` - explodes the nested array field into rows
//! - `sanitize_column_name` - rewrites names to Parquet-safe characters
//! - `FlatTable` - rows plus first-seen column order

mod columns;
mod normalize;
mod types;

pub use columns::{sanitize_column_name, PATH_SEPARATOR};
pub use normalize::{flatten_batch, Flattener};
pub use types::{FlatRow, FlatTable, FlattenStats};
