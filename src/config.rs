//! Pipeline configuration.
//!
//! One [`PipelineConfig`] per data kind holds the discovery patterns, the
//! output format and the archive sort order. Defaults reproduce the layout
//! of the HOT data directories; CLI arguments adjust them through the
//! `with_*` builders.

use crate::constants::{
    CTD_FILE_PATTERN, FLUX_FILE_PATTERN, NISKIN_FILE_PATTERN, PRIM_PROD_FILE_PATTERN,
    SUMMARY_FILE_PATTERN,
};
use crate::error::{HotError, Result};
use crate::models::DataKind;
use crate::table::SortKey;
use clap::ValueEnum;
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// Comma-delimited text with a header row
    #[default]
    Csv,
    /// Apache Parquet with string columns
    Parquet,
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    #[default]
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub kind: DataKind,

    /// Glob pattern matched against data file names
    pub data_pattern: String,

    /// Search subdirectories of the input directory
    pub recursive: bool,

    /// Glob pattern matched against cruise summary file names
    pub summary_pattern: String,

    pub output_format: OutputFormat,

    pub compression: CompressionAlgorithm,

    /// Reorder output rows by `sort_keys` before writing
    pub sort_output: bool,

    pub sort_keys: Vec<SortKey>,

    /// Field list every data file must match; `None` uses the first file
    pub declared_schema: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Defaults for a data kind
    pub fn for_kind(kind: DataKind) -> Self {
        let (data_pattern, recursive, sort_keys) = match kind {
            DataKind::Ctd => (
                CTD_FILE_PATTERN,
                true,
                vec![
                    SortKey::numeric("cruise_name"),
                    SortKey::numeric("station"),
                    SortKey::numeric("cast"),
                ],
            ),
            DataKind::Niskin => (
                NISKIN_FILE_PATTERN,
                false,
                vec![
                    SortKey::numeric("cruise_name"),
                    SortKey::numeric("STNNBR"),
                    SortKey::numeric("CASTNO"),
                    SortKey::numeric("ROSETTE").reversed(),
                ],
            ),
            DataKind::ParticleFlux => (
                FLUX_FILE_PATTERN,
                true,
                vec![
                    SortKey::numeric("Cruise"),
                    SortKey::numeric("Depth"),
                    SortKey::lexical("Treatment"),
                ],
            ),
            DataKind::PrimaryProduction => (
                PRIM_PROD_FILE_PATTERN,
                true,
                vec![
                    SortKey::numeric("Cruise"),
                    SortKey::lexical("start_date_time"),
                    SortKey::numeric("Depth"),
                ],
            ),
        };

        Self {
            kind,
            data_pattern: data_pattern.to_string(),
            recursive,
            summary_pattern: SUMMARY_FILE_PATTERN.to_string(),
            output_format: OutputFormat::default(),
            compression: CompressionAlgorithm::default(),
            sort_output: true,
            sort_keys,
            declared_schema: None,
        }
    }

    pub fn with_data_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.data_pattern = pattern.into();
        self
    }

    pub fn with_summary_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.summary_pattern = pattern.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Write rows in decoding order
    pub fn without_sort(mut self) -> Self {
        self.sort_output = false;
        self
    }

    pub fn with_sort_keys(mut self, keys: Vec<SortKey>) -> Self {
        self.sort_keys = keys;
        self
    }

    pub fn with_declared_schema(mut self, fields: Vec<String>) -> Self {
        self.declared_schema = Some(fields);
        self
    }

    /// Check the patterns and schema before any file is read
    pub fn validate(&self) -> Result<()> {
        for pattern in [&self.data_pattern, &self.summary_pattern] {
            glob::Pattern::new(pattern)?;
        }
        if let Some(fields) = &self.declared_schema {
            if fields.is_empty() {
                return Err(HotError::Configuration {
                    message: format!("declared {} schema has no fields", self.kind),
                });
            }
        }
        if self.kind == DataKind::Ctd && self.output_format == OutputFormat::Parquet {
            return Err(HotError::Configuration {
                message: "ctd output is written as per-cast CSV files; parquet is not supported"
                    .to_string(),
            });
        }
        debug!("Validated {} pipeline configuration", self.kind);
        Ok(())
    }
}
