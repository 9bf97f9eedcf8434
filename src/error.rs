//! Error handling for HOT data conversion.
//!
//! Distinguishes the fatal ingestion errors (duplicate cruise identifiers,
//! field-schema mismatches) from ordinary I/O and parsing failures. Records
//! that simply fail to join are not errors; they are reported separately.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::DataKind;

#[derive(Error, Debug)]
pub enum HotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Directory traversal failed: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error(
        "Cruise identifier {identifier} from {second_file} is already defined (first seen in {first_file})"
    )]
    DuplicateIdentifier {
        identifier: String,
        first_file: String,
        second_file: String,
    },

    #[error("Variables of {master_file} != {file} for {kind} data:\n{diff}")]
    SchemaMismatch {
        kind: DataKind,
        master_file: String,
        file: String,
        diff: String,
    },

    #[error("Invalid cruise summary row in {path} line {line}: {reason}")]
    InvalidSummaryRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Format table error in {path}: {reason}")]
    FormatTable { path: PathBuf, reason: String },

    #[error("Malformed format table line {line} in {path}: {content:?}")]
    MalformedFormatLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("File {path} ends inside its header block: expected {expected} header lines, found {found}")]
    MissingHeader {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("File {path} has no {field} column; cannot build cruise identifiers")]
    MissingIdentifierField { path: PathBuf, field: String },

    #[error("Column {column} has {found} values but the table has {expected} rows")]
    RaggedTable {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl HotError {
    /// Whether this error belongs to the ingestion-level abort class
    pub fn is_ingestion_abort(&self) -> bool {
        matches!(
            self,
            HotError::DuplicateIdentifier { .. } | HotError::SchemaMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HotError>;
