// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # GeoCore Parquet
//!
//! Harvests JSON metadata records from one object-store bucket and writes
//! them, in fixed-size batches, to a second bucket as a pretty-printed JSON
//! archive plus a Parquet file of the flattened `features` rows.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use geocore_parquet::{Converter, ConverterConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConverterConfig::new("s3://geocore-records", "s3://geocore-parquet")
//!         .with_batch_size(500);
//!
//!     let mut converter = Converter::from_config(config)?;
//!     let summary = converter.run().await?;
//!     println!("{}", summary.message());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Invocation (event → InvocationResponse)           │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │   Converter: list → read → batch(N) → flush → ... → tail     │
//! └──────┬──────────────┬──────────────┬──────────────┬──────────┘
//!        │              │              │              │
//! ┌──────┴─────┐ ┌──────┴─────┐ ┌──────┴─────┐ ┌──────┴─────┐
//! │  Storage   │ │  Flatten   │ │   Output   │ │  Storage   │
//! │ list/read  │ │ features_* │ │ JSON/Arrow │ │   write    │
//! │            │ │   rows     │ │  Parquet   │ │            │
//! └────────────┘ └────────────┘ └────────────┘ └────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Converter configuration
pub mod config;

/// Object store listing, reads and writes
pub mod storage;

/// Nested record flattening
pub mod flatten;

/// JSON archive and Parquet encoding
pub mod output;

/// Batch accumulate/flush orchestration
pub mod pipeline;

/// Trigger event and response envelope
pub mod invocation;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ConverterConfig;
pub use error::{Error, Result};
pub use invocation::{handle, InvocationEvent, InvocationResponse};
pub use pipeline::{Converter, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
