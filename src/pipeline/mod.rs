//! Conversion pipeline module
//!
//! Main accumulate/flush loop over a source bucket.
//!
//! # Overview
//!
//! The pipeline module provides:
//! - `Converter` - lists, reads and batches records, then flushes each window
//!   as a JSON archive plus a Parquet file
//! - `RunSummary` - statistics and per-batch outcomes of a pass
//! - `Batch`, `RunState` - accumulator and state machine

mod types;

pub use types::{Batch, BatchReport, RunState, RunSummary, SkippedObject};

use crate::config::{ConverterConfig, ListingMode, RecordErrorPolicy};
use crate::error::{Error, Result, ResultExt};
use crate::flatten::{FlatTable, Flattener};
use crate::output::{
    describe_schema, encode_archive, preview_rows, ColumnarEncoder, ParquetWriterConfig,
};
use crate::storage::{ArtifactOutcome, BlobLister, BlobReader, BlobStore, BlobWriter};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Rows shown by the verbose table preview
const PREVIEW_ROWS: usize = 5;

/// Batch converter from a source bucket to a destination bucket
pub struct Converter {
    config: ConverterConfig,
    lister: BlobLister,
    reader: BlobReader,
    writer: BlobWriter,
    flattener: Flattener,
    encoder: ColumnarEncoder,
    /// Log schema and row previews at INFO instead of DEBUG
    verbose: bool,
    state: RunState,
    batch: Batch,
    summary: RunSummary,
}

impl Converter {
    /// Create a converter over already-built stores
    pub fn new(config: ConverterConfig, source: BlobStore, destination: BlobStore) -> Result<Self> {
        config.validate()?;

        if let Some(dir) = &config.output.staging_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create staging directory {}", dir.display()))?;
        }

        let encoder = ColumnarEncoder::new(
            ParquetWriterConfig::from_output(&config.output),
            &config.flatten.record_prefix,
        );

        Ok(Self {
            lister: BlobLister::from_config(source.clone(), &config.source),
            reader: BlobReader::new(source),
            writer: BlobWriter::new(destination),
            flattener: Flattener::from_config(&config.flatten),
            encoder,
            verbose: false,
            state: RunState::Listing,
            batch: Batch::new(config.batch.size),
            summary: RunSummary::new(),
            config,
        })
    }

    /// Create a converter, building both stores from their URLs
    pub fn from_config(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        let source = BlobStore::parse(&config.source.url, config.source.region.as_deref())?;
        let destination = BlobStore::parse(
            &config.destination.url,
            config.destination.region.as_deref(),
        )?;
        Self::new(config, source, destination)
    }

    /// Log schema and row previews at INFO
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Get the current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Get the summary of the current (or last) pass
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Run a full pass over the source bucket
    ///
    /// Fatal errors (a failed listing page, an object that is not UTF-8, and
    /// anything the configured policies escalate) abort the pass. Batches
    /// already flushed stay written.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.reset();
        info!(
            "Converting {} -> {} in batches of {}",
            self.lister.store(),
            self.writer.store(),
            self.config.batch.size
        );

        match self.config.batch.listing {
            ListingMode::Eager => {
                let keys = self.lister.collect_keys().await?;
                self.summary.keys_listed = keys.len();
                for key in keys {
                    self.ingest(&key).await?;
                }
            }
            ListingMode::Streaming => {
                let lister = self.lister.clone();
                let mut keys = lister.keys();
                while let Some(key) = keys.try_next().await? {
                    self.summary.keys_listed += 1;
                    self.ingest(&key).await?;
                }
            }
        }

        self.finish().await
    }

    /// Run the accumulate/flush loop over an explicit key sequence
    pub async fn convert_keys<I>(&mut self, keys: I) -> Result<RunSummary>
    where
        I: IntoIterator<Item = String>,
    {
        self.reset();
        for key in keys {
            self.summary.keys_listed += 1;
            self.ingest(&key).await?;
        }
        self.finish().await
    }

    fn reset(&mut self) {
        self.state = RunState::Listing;
        self.batch.clear();
        self.summary = RunSummary::new();
    }

    /// Flush the tail batch and close the summary
    async fn finish(&mut self) -> Result<RunSummary> {
        self.flush().await?;
        self.state = RunState::Done;
        self.summary.finish();
        info!("{}", self.summary.message());
        Ok(self.summary.clone())
    }

    /// Read one object into the batch, flushing when the batch fills
    async fn ingest(&mut self, key: &str) -> Result<()> {
        self.state = RunState::Accumulating;

        let text = match self.reader.read(key).await? {
            Ok(text) => text,
            Err(failure) => {
                self.summary.read_failures += 1;
                return self.skip_or_abort(Error::read(key, failure.to_string()), key);
            }
        };

        let record: Value = match serde_json::from_str(&text) {
            Ok(record) => record,
            Err(e) => {
                self.summary.parse_failures += 1;
                return self.skip_or_abort(Error::record(key, e.to_string()), key);
            }
        };

        self.batch.push(record);
        self.summary.records_accepted += 1;

        if self.batch.is_full() {
            self.flush().await?;
        }
        Ok(())
    }

    fn skip_or_abort(&mut self, err: Error, key: &str) -> Result<()> {
        match self.config.batch.on_record_error {
            RecordErrorPolicy::Skip => {
                warn!("Skipping {key}: {err}");
                self.summary.add_skip(key, err.to_string());
                Ok(())
            }
            RecordErrorPolicy::Abort => Err(err),
        }
    }

    /// Convert and write the current batch, if it holds anything
    async fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.state = RunState::Flushing;

        let records = self.batch.take();
        let count = self.summary.records_accepted;
        let index = self.summary.batch_count() + 1;
        let archive_name = self.config.output.archive_name(count);
        let columnar_name = self.config.output.columnar_name(count);

        info!(
            "Flushing batch {index}: {} records (through record {count})",
            records.len()
        );

        let (table, stats) = self.flattener.flatten(&records);
        self.summary.records_without_path += stats.records_without_path;
        if stats.records_without_path > 0 {
            warn!(
                "Batch {index}: {} of {} records have no '{}' array and add no rows",
                stats.records_without_path, stats.records, self.config.flatten.record_path
            );
        }

        let archive = match encode_archive(&records, self.config.output.json_indent) {
            Ok(bytes) => self.writer.put(&archive_name, bytes).await,
            Err(e) => ArtifactOutcome::failed(format!("Failed to encode {archive_name}: {e}")),
        };
        let columnar = self.write_columnar(&table, &columnar_name).await;

        let report = BatchReport {
            index,
            cumulative_count: count,
            records: records.len(),
            rows: table.num_rows(),
            archive,
            columnar,
        };

        for outcome in [&report.archive, &report.columnar] {
            match outcome {
                ArtifactOutcome::Written { location, bytes } => {
                    info!("Wrote {location} ({bytes} bytes)");
                }
                ArtifactOutcome::Failed { reason } => error!("Batch {index}: {reason}"),
            }
        }

        let failure = report
            .failure_reason()
            .map(|reason| Error::write(&columnar_name, reason));
        self.summary.add_batch(report);
        self.state = RunState::Accumulating;

        match failure {
            Some(err) if self.config.batch.abort_on_write_failure => Err(err),
            _ => Ok(()),
        }
    }

    /// Encode the table and upload it, staging through a local file if configured
    async fn write_columnar(&self, table: &FlatTable, name: &str) -> ArtifactOutcome {
        match &self.config.output.staging_dir {
            Some(dir) => {
                let path = dir.join(name);
                let outcome = match self.encoder.encode_to_file(table, &path) {
                    Ok((batch, _)) => {
                        self.log_table(name, &batch);
                        self.writer.put_file(name, &path).await
                    }
                    Err(e) => ArtifactOutcome::failed(format!("Failed to encode {name}: {e}")),
                };
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    debug!("Could not remove staged file {}: {e}", path.display());
                }
                outcome
            }
            None => match self.encoder.encode(table) {
                Ok((batch, bytes)) => {
                    self.log_table(name, &batch);
                    self.writer.put(name, bytes).await
                }
                Err(e) => ArtifactOutcome::failed(format!("Failed to encode {name}: {e}")),
            },
        }
    }

    /// Dump the inferred schema and the first rows of a batch
    fn log_table(&self, name: &str, batch: &RecordBatch) {
        let schema = describe_schema(batch.schema().as_ref());
        let preview = preview_rows(batch, PREVIEW_ROWS).unwrap_or_else(|e| e.to_string());
        if self.verbose {
            info!("Schema of {name}:\n{schema}");
            info!("First rows of {name}: {preview}");
        } else {
            debug!("Schema of {name}:\n{schema}");
            debug!("First rows of {name}: {preview}");
        }
    }
}
