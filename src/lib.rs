//! HOT Processor Library
//!
//! Converts Hawaii Ocean Time-series (HOT) fixed-width data files into
//! comma-delimited or Parquet tables.
//!
//! This library provides tools for:
//! - Decoding CTD, niskin bottle, particle flux and primary production files
//!   by byte position, with field names and units taken from file headers or
//!   from static layouts
//! - Indexing cruise summary files by `expocode.station.cast`
//! - Joining bottle and CTD records with their cruise metadata and reporting
//!   the identifiers that have none
//! - Assembling one table per data kind with a cross-file schema check
//! - Sorting and writing the result through polars

pub mod cli;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod format_table;
pub mod join;
pub mod layout;
pub mod models;
pub mod processor;
pub mod summary;
pub mod table;

pub use config::{CompressionAlgorithm, OutputFormat, PipelineConfig};
pub use decoder::{CtdDecoder, FluxDecoder, NiskinDecoder, PrimProdDecoder, RecordDecoder};
pub use error::{HotError, Result};
pub use format_table::FormatTable;
pub use join::{JoinEngine, UnmatchedReport};
pub use models::{DataKind, FileRecordSet, ProcessingStats};
pub use processor::DatasetProcessor;
pub use summary::CruiseSummaryIndex;
pub use table::{CombinedTable, SortKey, TableAssembler};
