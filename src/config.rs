//! Configuration types for a conversion pass
//!
//! The whole pass is described by one [`ConverterConfig`], loaded from YAML or
//! JSON and handed to the converter at construction time.
//!
//! ```yaml
//! source:
//!   url: s3://geocore-records
//!   region: ca-central-1
//! destination:
//!   url: s3://geocore-parquet
//! batch:
//!   size: 500
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Bucket the JSON records are harvested from
    pub source: SourceConfig,

    /// Bucket the archives and Parquet files are written to
    pub destination: DestinationConfig,

    /// Windowing and failure policy
    #[serde(default)]
    pub batch: BatchConfig,

    /// Nested array normalization
    #[serde(default)]
    pub flatten: FlattenConfig,

    /// Artifact naming and encoding
    #[serde(default)]
    pub output: OutputConfig,
}

impl ConverterConfig {
    /// Create a config for a source and destination URL with default settings
    pub fn new(source_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            source: SourceConfig {
                url: source_url.into(),
                ..Default::default()
            },
            destination: DestinationConfig {
                url: destination_url.into(),
                ..Default::default()
            },
            batch: BatchConfig::default(),
            flatten: FlattenConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Set the window size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch.size = size;
        self
    }

    /// Set the listing mode
    #[must_use]
    pub fn with_listing(mut self, listing: ListingMode) -> Self {
        self.batch.listing = listing;
        self
    }

    /// Set the record error policy
    #[must_use]
    pub fn with_record_error_policy(mut self, policy: RecordErrorPolicy) -> Self {
        self.batch.on_record_error = policy;
        self
    }

    /// Load configuration from a YAML or JSON file
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(Error::missing_field("source.url"));
        }
        if self.destination.url.trim().is_empty() {
            return Err(Error::missing_field("destination.url"));
        }
        if self.batch.size == 0 {
            return Err(Error::invalid_value("batch.size", "must be greater than 0"));
        }
        if self.flatten.record_path.is_empty() {
            return Err(Error::invalid_value(
                "flatten.record_path",
                "must not be empty",
            ));
        }
        if self.output.name_prefix.is_empty() || self.output.name_prefix.contains('/') {
            return Err(Error::invalid_value(
                "output.name_prefix",
                "must be a non-empty name without '/'",
            ));
        }
        if self.output.json_indent > 16 {
            return Err(Error::invalid_value(
                "output.json_indent",
                "must be between 0 and 16",
            ));
        }
        if self.output.row_group_size == 0 {
            return Err(Error::invalid_value(
                "output.row_group_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Source / Destination
// ============================================================================

/// Source bucket settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Store URL (`s3://bucket/path`, `gs://...`, `az://...`, local path)
    pub url: String,

    /// Region of the bucket (S3 only)
    #[serde(default)]
    pub region: Option<String>,

    /// Only list keys under this prefix
    #[serde(default)]
    pub prefix: Option<String>,

    /// Only list keys lexically after this one
    #[serde(default)]
    pub start_after: Option<String>,
}

/// Destination bucket settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Store URL
    pub url: String,

    /// Region of the bucket (S3 only)
    #[serde(default)]
    pub region: Option<String>,
}

// ============================================================================
// Batch Config
// ============================================================================

/// How the key listing feeds the accumulate loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    /// Drain every page before reading the first object
    #[default]
    Eager,
    /// Read objects as their page arrives
    Streaming,
}

/// What to do with an object that cannot be read or parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorPolicy {
    /// Count the object as skipped and continue
    #[default]
    Skip,
    /// Abort the pass
    Abort,
}

/// Windowing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Records per flushed window
    #[serde(default = "default_batch_size")]
    pub size: usize,

    /// Listing mode
    #[serde(default)]
    pub listing: ListingMode,

    /// Unreadable or malformed object policy
    #[serde(default)]
    pub on_record_error: RecordErrorPolicy,

    /// Abort the pass when an artifact upload fails
    #[serde(default)]
    pub abort_on_write_failure: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            listing: ListingMode::default(),
            on_record_error: RecordErrorPolicy::default(),
            abort_on_write_failure: false,
        }
    }
}

fn default_batch_size() -> usize {
    500
}

// ============================================================================
// Flatten Config
// ============================================================================

/// Nested array normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenConfig {
    /// Field holding the array exploded into rows
    #[serde(default = "default_record_path")]
    pub record_path: String,

    /// Prefix tagging every column that came from an array element
    #[serde(default = "default_record_prefix")]
    pub record_prefix: String,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            record_path: default_record_path(),
            record_prefix: default_record_prefix(),
        }
    }
}

fn default_record_path() -> String {
    "features".to_string()
}

fn default_record_prefix() -> String {
    "features_".to_string()
}

// ============================================================================
// Output Config
// ============================================================================

/// Parquet compression codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// Snappy (default)
    #[default]
    Snappy,
    /// Zstandard
    Zstd,
    /// Gzip
    Gzip,
    /// No compression
    None,
}

/// Artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Artifact name prefix, followed by the cumulative record count
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Indentation of the JSON archive
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    /// Parquet compression
    #[serde(default)]
    pub compression: CompressionCodec,

    /// Parquet row group size
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    /// Dictionary-encode Parquet columns
    #[serde(default = "default_true")]
    pub dictionary: bool,

    /// Write Parquet column statistics
    #[serde(default = "default_true")]
    pub statistics: bool,

    /// Local directory the Parquet file is staged in before upload
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            json_indent: default_json_indent(),
            compression: CompressionCodec::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
            staging_dir: None,
        }
    }
}

impl OutputConfig {
    /// Name of the JSON archive covering records up to `count`
    pub fn archive_name(&self, count: usize) -> String {
        format!("{}{count}.json", self.name_prefix)
    }

    /// Name of the Parquet file covering records up to `count`
    pub fn columnar_name(&self, count: usize) -> String {
        format!("{}{count}.parquet", self.name_prefix)
    }
}

fn default_name_prefix() -> String {
    "records".to_string()
}

fn default_json_indent() -> usize {
    4
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r"
source:
  url: s3://geocore-records
  region: ca-central-1
destination:
  url: s3://geocore-parquet
";
        let config = ConverterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.source.url, "s3://geocore-records");
        assert_eq!(config.source.region.as_deref(), Some("ca-central-1"));
        assert_eq!(config.batch.size, 500);
        assert_eq!(config.batch.listing, ListingMode::Eager);
        assert_eq!(config.batch.on_record_error, RecordErrorPolicy::Skip);
        assert!(!config.batch.abort_on_write_failure);
        assert_eq!(config.flatten.record_path, "features");
        assert_eq!(config.flatten.record_prefix, "features_");
        assert_eq!(config.output.name_prefix, "records");
        assert_eq!(config.output.json_indent, 4);
        assert_eq!(config.output.compression, CompressionCodec::Snappy);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r"
source:
  url: s3://geocore-records/harvest
  prefix: '2024/'
  start_after: '2024/0001.json'
destination:
  url: /tmp/out
batch:
  size: 100
  listing: streaming
  on_record_error: abort
  abort_on_write_failure: true
flatten:
  record_path: items
  record_prefix: item_
output:
  name_prefix: part
  json_indent: 2
  compression: zstd
  staging_dir: /tmp/staging
";
        let config = ConverterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.source.prefix.as_deref(), Some("2024/"));
        assert_eq!(config.source.start_after.as_deref(), Some("2024/0001.json"));
        assert_eq!(config.batch.size, 100);
        assert_eq!(config.batch.listing, ListingMode::Streaming);
        assert_eq!(config.batch.on_record_error, RecordErrorPolicy::Abort);
        assert!(config.batch.abort_on_write_failure);
        assert_eq!(config.flatten.record_path, "items");
        assert_eq!(config.output.compression, CompressionCodec::Zstd);
        assert_eq!(
            config.output.staging_dir,
            Some(PathBuf::from("/tmp/staging"))
        );
    }

    #[test]
    fn test_json_config() {
        let json = r#"{"source": {"url": "memory://"}, "destination": {"url": "memory://"}, "batch": {"size": 10}}"#;
        let config = ConverterConfig::from_json_str(json).unwrap();
        assert_eq!(config.batch.size, 10);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = ConverterConfig::new("memory://", "memory://").with_batch_size(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch.size"));
    }

    #[test]
    fn test_missing_url_rejected() {
        let config = ConverterConfig::new("", "memory://");
        assert!(matches!(
            config.validate(),
            Err(Error::MissingConfigField { .. })
        ));
    }

    #[test]
    fn test_name_prefix_with_slash_rejected() {
        let mut config = ConverterConfig::new("memory://", "memory://");
        config.output.name_prefix = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_artifact_names() {
        let output = OutputConfig::default();
        assert_eq!(output.archive_name(500), "records500.json");
        assert_eq!(output.columnar_name(1200), "records1200.parquet");
    }

    #[test]
    fn test_from_file_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("convert.yaml");
        fs::write(
            &yaml_path,
            "source:\n  url: memory://\ndestination:\n  url: memory://\n",
        )
        .unwrap();
        assert!(ConverterConfig::from_file(&yaml_path).is_ok());

        let json_path = dir.path().join("convert.json");
        fs::write(
            &json_path,
            r#"{"source": {"url": "memory://"}, "destination": {"url": "memory://"}}"#,
        )
        .unwrap();
        assert!(ConverterConfig::from_file(&json_path).is_ok());

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            ConverterConfig::from_file(&missing),
            Err(Error::FileNotFound { .. })
        ));
    }
}
