//! Core data structures for HOT processing.
//!
//! Defines the data kinds, decoded field series, per-file record sets,
//! cruise summary entries and processing statistics shared by the
//! decoders, the join engine and the pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{HotError, Result};

/// Kinds of HOT data files handled by the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Ctd,
    Niskin,
    ParticleFlux,
    PrimaryProduction,
}

impl DataKind {
    /// Short name used in file names and log output
    pub fn short_name(&self) -> &'static str {
        match self {
            DataKind::Ctd => "ctd",
            DataKind::Niskin => "niskin",
            DataKind::ParticleFlux => "part_flux",
            DataKind::PrimaryProduction => "prim_prod",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Half-open byte range `[start, end)` within a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One decoded value together with the metadata of its column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    pub name: String,
    pub raw_value: String,
    pub unit: Option<String>,
    pub quality_flag: Option<String>,
    pub byte_range: Option<ByteRange>,
}

/// Column-oriented storage for one field of one file.
///
/// Name, unit, flag and range are shared by every value, so they are stored
/// once rather than per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSeries {
    pub name: String,
    pub unit: Option<String>,
    pub quality_flag: Option<String>,
    pub byte_range: Option<ByteRange>,
    pub values: Vec<String>,
}

impl FieldSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            quality_flag: None,
            byte_range: None,
            values: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_quality_flag(mut self, flag: impl Into<String>) -> Self {
        self.quality_flag = Some(flag.into());
        self
    }

    pub fn with_range(mut self, range: ByteRange) -> Self {
        self.byte_range = Some(range);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Materialize the value at `row` as a [`DecodedField`]
    pub fn field(&self, row: usize) -> Option<DecodedField> {
        self.values.get(row).map(|value| DecodedField {
            name: self.name.clone(),
            raw_value: value.clone(),
            unit: self.unit.clone(),
            quality_flag: self.quality_flag.clone(),
            byte_range: self.byte_range,
        })
    }
}

/// Everything decoded from a single source file
#[derive(Debug, Clone)]
pub struct FileRecordSet {
    pub kind: DataKind,
    pub source: PathBuf,
    /// Display name of the source, relative to the input directory
    pub source_name: String,
    /// Header metadata in the order it appears in the file
    pub header: Vec<(String, String)>,
    fields: Vec<FieldSeries>,
    row_count: usize,
}

impl FileRecordSet {
    /// Build a record set, enforcing that every series has one value per data line
    pub fn new(
        kind: DataKind,
        source: PathBuf,
        source_name: String,
        header: Vec<(String, String)>,
        fields: Vec<FieldSeries>,
        row_count: usize,
    ) -> Result<Self> {
        if let Some(series) = fields.iter().find(|series| series.len() != row_count) {
            return Err(HotError::RaggedTable {
                column: series.name.clone(),
                expected: row_count,
                found: series.len(),
            });
        }

        Ok(Self {
            kind,
            source,
            source_name,
            header,
            fields,
            row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn fields(&self) -> &[FieldSeries] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FieldSeries> {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSeries> {
        self.fields.iter().find(|series| series.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|series| series.name.clone()).collect()
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Add a series, replacing any existing series with the same name
    pub fn insert_field(&mut self, series: FieldSeries) -> Result<()> {
        if series.len() != self.row_count {
            let found = series.len();
            return Err(HotError::RaggedTable {
                column: series.name,
                expected: self.row_count,
                found,
            });
        }

        match self.fields.iter_mut().find(|existing| existing.name == series.name) {
            Some(existing) => *existing = series,
            None => self.fields.push(series),
        }
        Ok(())
    }
}

/// One cast described by a cruise summary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruiseSummaryEntry {
    pub ship: String,
    pub date: String,
    pub month: u32,
    pub day: String,
    pub year: i32,
    pub section: String,
    pub time_utc: String,
    pub time_code: String,
    /// Raw fixed-width latitude text (degrees, minutes, hemisphere)
    pub lat: String,
    /// Raw fixed-width longitude text (degrees, minutes, hemisphere)
    pub lon: String,
    pub nav_code: String,
    pub depth_max: String,
    pub depth_hgt: String,
    pub pres_max: String,
    pub num_bottles: String,
    pub parameters: String,
    pub comments: String,
    pub summary_file: String,
}

/// Processing statistics for one pipeline run
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    pub unmatched_identifiers: Vec<String>,
    pub output_paths: Vec<PathBuf>,
    pub processing_time_ms: u128,
}
