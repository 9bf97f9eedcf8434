//! CTD cast decoding.
//!
//! A CTD file starts with six header records. Records 1-3 carry cast
//! metadata; record 4 names the eight data columns, record 5 gives their
//! units and record 6 their quality bytes. The column names are taken from
//! the file itself, so the field set is only known once record 4 is read.

use super::{split_header, RecordDecoder};
use crate::error::Result;
use crate::layout::{ctd, slice};
use crate::models::{DataKind, FieldSeries, FileRecordSet};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Header key holding the CTD file name as given to the decoder
pub const CTD_FILENAME: &str = "CTD filename";

#[derive(Debug, Default, Clone, Copy)]
pub struct CtdDecoder;

impl CtdDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for CtdDecoder {
    fn kind(&self) -> DataKind {
        DataKind::Ctd
    }

    fn decode_text(&self, text: &str, path: &Path, source_name: &str) -> Result<FileRecordSet> {
        let (header, data) = split_header(text, ctd::HEADER_LINES, path)?;

        let mut metadata = vec![(CTD_FILENAME.to_string(), source_name.to_string())];
        for (name, line, range) in ctd::HEADER_FIELDS {
            metadata.push((name.to_string(), slice(header[line], range)));
        }

        let names = column_names(header[ctd::LABEL_LINE], path);
        let mut fields: Vec<FieldSeries> = ctd::COLUMNS
            .iter()
            .zip(names)
            .map(|(range, name)| {
                FieldSeries::new(name)
                    .with_unit(slice(header[ctd::UNIT_LINE], *range).trim())
                    .with_quality_flag(slice(header[ctd::QUALITY_LINE], *range))
                    .with_range(*range)
            })
            .collect();

        for line in &data {
            for series in fields.iter_mut() {
                if let Some(range) = series.byte_range {
                    series.values.push(slice(line, range));
                }
            }
        }

        let declared = metadata
            .iter()
            .find(|(name, _)| name == ctd::RECORD_COUNT)
            .and_then(|(_, value)| value.trim().parse::<usize>().ok());
        if let Some(declared) = declared {
            if declared != data.len() {
                warn!(
                    "{} declares {} data records but contains {}",
                    path.display(),
                    declared,
                    data.len()
                );
            }
        }

        FileRecordSet::new(
            DataKind::Ctd,
            path.to_path_buf(),
            source_name.to_string(),
            metadata,
            fields,
            data.len(),
        )
    }
}

/// Field names from the label record, trimmed.
///
/// Blank labels become `column_N`; a repeated label gets a numeric suffix so
/// every column keeps its own series.
fn column_names(label_line: &str, path: &Path) -> Vec<String> {
    let mut seen = HashSet::new();
    ctd::COLUMNS
        .iter()
        .enumerate()
        .map(|(index, range)| {
            let label = slice(label_line, *range).trim().to_string();
            let mut name = if label.is_empty() {
                format!("column_{}", index + 1)
            } else {
                label
            };
            if !seen.insert(name.clone()) {
                warn!("{} repeats column label {:?}", path.display(), name);
                name = format!("{}_{}", name, index + 1);
                seen.insert(name.clone());
            }
            name
        })
        .collect()
}

/// Composite identifier `expocode.station.cast` of a decoded cast
pub fn cast_identifier(record_set: &FileRecordSet) -> String {
    let part = |key: &str| record_set.header_value(key).unwrap_or_default().trim();
    format!(
        "{}.{}.{}",
        part(ctd::EXPOCODE),
        part(ctd::STATION),
        part(ctd::CAST)
    )
}
