//! Niskin bottle decoding.
//!
//! Column positions come from the format table of the reference document,
//! but the field names do not: each file's second header line carries a
//! short name above every column, and that short name is what the field is
//! called. Header lines three and four hold the units and quality flags at
//! the same positions.

use super::{split_header, RecordDecoder};
use crate::constants::NISKIN_HEADER_LINES;
use crate::error::{HotError, Result};
use crate::format_table::FormatTable;
use crate::layout::slice;
use crate::models::{DataKind, FieldSeries, FileRecordSet};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

pub const STATION_FIELD: &str = "STNNBR";
pub const CAST_FIELD: &str = "CASTNO";
/// Per-row cruise identifier; consumed by the join and never written out
pub const IDENT_FIELD: &str = "ident";

pub const EXPOCODE_KEY: &str = "EXPOCODE";
pub const WHP_ID_KEY: &str = "WHP-ID";
pub const CRUISE_START_KEY: &str = "DATES";
pub const CRUISE_END_KEY: &str = "TO";

const NAME_LINE: usize = 1;
const UNIT_LINE: usize = 2;
const FLAG_LINE: usize = 3;

#[derive(Debug, Clone)]
pub struct NiskinDecoder {
    table: FormatTable,
}

impl NiskinDecoder {
    pub fn new(table: FormatTable) -> Self {
        Self { table }
    }
}

impl RecordDecoder for NiskinDecoder {
    fn kind(&self) -> DataKind {
        DataKind::Niskin
    }

    fn decode_text(&self, text: &str, path: &Path, source_name: &str) -> Result<FileRecordSet> {
        let (header, data) = split_header(text, NISKIN_HEADER_LINES, path)?;
        let metadata = cruise_info(header[0]);

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.table.len() + 1);
        for entry in self.table.entries() {
            let mut name = slice(header[NAME_LINE], entry.range).trim().to_string();
            if name.is_empty() || !seen.insert(name.clone()) {
                warn!(
                    "{}: no distinct short name for {:?}, using the item label",
                    path.display(),
                    entry.label
                );
                name = entry.label.clone();
                seen.insert(name.clone());
            }

            let flag = slice(header[FLAG_LINE], entry.range);
            let flag = if flag.trim() == "*" {
                flag.replace('*', " ")
            } else {
                flag
            };

            let mut series = FieldSeries::new(name)
                .with_unit(slice(header[UNIT_LINE], entry.range).trim())
                .with_quality_flag(flag)
                .with_range(entry.range);
            series.values = data.iter().map(|line| slice(line, entry.range)).collect();
            fields.push(series);
        }

        let expocode = metadata
            .iter()
            .find(|(key, _)| key == EXPOCODE_KEY)
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        let ident = identifiers(&fields, &expocode, path)?;
        fields.push(ident);

        FileRecordSet::new(
            DataKind::Niskin,
            path.to_path_buf(),
            source_name.to_string(),
            metadata,
            fields,
            data.len(),
        )
    }
}

/// Tokens following the keywords of the cruise information line.
///
/// `EXPOCODE 32MW001_1  WHP-ID PRS2  DATES 103188 TO 110388` yields the
/// expedition code, WHP id, and cruise start and end dates.
fn cruise_info(line: &str) -> Vec<(String, String)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    [EXPOCODE_KEY, WHP_ID_KEY, CRUISE_START_KEY, CRUISE_END_KEY]
        .iter()
        .filter_map(|key| {
            let position = tokens.iter().position(|token| token == key)?;
            let value = tokens.get(position + 1)?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn identifiers(fields: &[FieldSeries], expocode: &str, path: &Path) -> Result<FieldSeries> {
    let column = |name: &str| {
        fields
            .iter()
            .find(|series| series.name == name)
            .ok_or_else(|| HotError::MissingIdentifierField {
                path: path.to_path_buf(),
                field: name.to_string(),
            })
    };
    let stations = column(STATION_FIELD)?;
    let casts = column(CAST_FIELD)?;

    let mut ident = FieldSeries::new(IDENT_FIELD);
    ident.values = stations
        .values
        .iter()
        .zip(&casts.values)
        .map(|(station, cast)| format!("{}.{}.{}", expocode, station.trim(), cast.trim()))
        .collect();
    Ok(ident)
}
