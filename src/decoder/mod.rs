//! Fixed-width record decoders.
//!
//! One decoder per data kind. Decoding is purely textual: every value is the
//! exact byte slice found at its column position, minus line terminators.
//! Header lines are consumed positionally before the data loop and are never
//! reinterpreted as data.

pub mod ctd;
pub mod flux;
pub mod niskin;
pub mod prim_prod;

pub use self::ctd::CtdDecoder;
pub use self::flux::FluxDecoder;
pub use self::niskin::NiskinDecoder;
pub use self::prim_prod::PrimProdDecoder;

use crate::error::{HotError, Result};
use crate::layout::{slice, RecordLayout, UnitSource, ValueSource};
use crate::models::{DataKind, FieldSeries, FileRecordSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Decoder for one kind of fixed-width data file
pub trait RecordDecoder {
    fn kind(&self) -> DataKind;

    /// Decode file contents already read into memory
    fn decode_text(&self, text: &str, path: &Path, source_name: &str) -> Result<FileRecordSet>;

    /// Read and decode a file. Invalid UTF-8 is replaced rather than rejected.
    fn decode_file(&self, path: &Path, source_name: &str) -> Result<FileRecordSet> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let record_set = self.decode_text(&text, path, source_name)?;
        debug!(
            "Decoded {} {} rows from {}",
            record_set.row_count(),
            self.kind(),
            path.display()
        );
        Ok(record_set)
    }
}

/// Split text into its header block and its data lines.
///
/// Whitespace-only lines after the header carry no columns and are dropped.
pub(crate) fn split_header<'a>(
    text: &'a str,
    header_lines: usize,
    path: &Path,
) -> Result<(Vec<&'a str>, Vec<&'a str>)> {
    let mut lines = text.lines();
    let header: Vec<&str> = lines.by_ref().take(header_lines).collect();
    if header.len() < header_lines {
        return Err(HotError::MissingHeader {
            path: path.to_path_buf(),
            expected: header_lines,
            found: header.len(),
        });
    }

    let data = lines.filter(|line| !line.trim().is_empty()).collect();
    Ok((header, data))
}

/// Decode data lines against a static layout.
///
/// Derived fields are returned empty for the caller to fill in.
pub(crate) fn decode_with_layout(
    layout: &RecordLayout,
    header: &[&str],
    data: &[&str],
    source_name: &str,
) -> Vec<FieldSeries> {
    layout
        .fields
        .iter()
        .map(|field| {
            let mut series = FieldSeries::new(field.name);
            match field.unit {
                UnitSource::None => {}
                UnitSource::Fixed(unit) => series = series.with_unit(unit),
                UnitSource::Header { line, range } => {
                    let unit = header.get(line).map(|text| slice(text, range));
                    series = series.with_unit(unit.unwrap_or_default().trim());
                }
            }

            match field.value {
                ValueSource::Slice(range) => {
                    series = series.with_range(range);
                    series.values = data.iter().map(|line| slice(line, range)).collect();
                }
                ValueSource::SourceName => {
                    series.values = vec![source_name.to_string(); data.len()];
                }
                ValueSource::Derived => {}
            }
            series
        })
        .collect()
}
