//! Record to cruise-summary join.
//!
//! Records are matched to summary entries by composite identifier. A hit
//! copies the cruise metadata onto the record, normalized for the archive:
//! positions become signed decimal degrees, commas in free text become
//! semicolons, and the ship field is split into cruise name and expocode.
//! A miss fills the cruise columns with [`MISSING_CRUISE_INFO`] and records
//! the identifier in the unmatched report; it is never an error.

use crate::constants::MISSING_CRUISE_INFO;
use crate::decoder::ctd::{cast_identifier, CTD_FILENAME};
use crate::decoder::niskin::IDENT_FIELD;
use crate::error::{HotError, Result};
use crate::layout::{ctd, slice};
use crate::models::{ByteRange, CruiseSummaryEntry, FieldSeries, FileRecordSet};
use crate::summary::CruiseSummaryIndex;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Cruise columns attached to every niskin row, in insertion order
pub const CRUISE_COLUMNS: [&str; 20] = [
    "Ship",
    "cruise_name",
    "EXPOCODE",
    "Date",
    "Month",
    "Day",
    "Year",
    "timeutc",
    "timecode",
    "section",
    "nav_code",
    "depth_max",
    "depth_hgt",
    "pres_max",
    "num_bottles",
    "parameters",
    "HOT_summary_file_name",
    "comments",
    "lat",
    "lon",
];

/// Column whose value marks a row as unmatched
pub const SHIP_COLUMN: &str = "Ship";

/// Columns of the CTD top-level file, in output order
pub const CTD_TOPLEVEL_COLUMNS: [&str; 23] = [
    "cruise_name",
    "station",
    "cast",
    "depth_max",
    "timecode",
    "HOT_summary_file_name",
    "parameters",
    "num_bottles",
    "section",
    "lon",
    "comments",
    "Date",
    "Day",
    "EXPOCODE",
    "lat",
    "nav_code",
    "pres_max",
    "depth_hgt",
    "Month",
    "timeutc",
    "Year",
    "Ship",
    "CTD_filename",
];

const LAT_DEGREES: ByteRange = ByteRange::new(0, 4);
const LAT_MINUTES: ByteRange = ByteRange::new(4, 10);
const LAT_HEMISPHERE: ByteRange = ByteRange::new(10, 12);
const LON_DEGREES: ByteRange = ByteRange::new(0, 5);
const LON_MINUTES: ByteRange = ByteRange::new(5, 11);
const LON_HEMISPHERE: ByteRange = ByteRange::new(11, 13);

/// Signed decimal latitude from `DD MM.MM H` text; South is negative
pub fn decode_latitude(raw: &str) -> String {
    decode_position(raw, LAT_DEGREES, LAT_MINUTES, LAT_HEMISPHERE, 'S')
}

/// Signed decimal longitude from `DDD MM.MM H` text; West is negative
pub fn decode_longitude(raw: &str) -> String {
    decode_position(raw, LON_DEGREES, LON_MINUTES, LON_HEMISPHERE, 'W')
}

fn decode_position(
    raw: &str,
    degrees: ByteRange,
    minutes: ByteRange,
    hemisphere: ByteRange,
    negative: char,
) -> String {
    let whole = slice(raw, degrees).trim().parse::<f64>();
    let fraction = slice(raw, minutes).trim().parse::<f64>();

    match (whole, fraction) {
        (Ok(whole), Ok(fraction)) => {
            let sign = if slice(raw, hemisphere).contains(negative) {
                "-"
            } else {
                ""
            };
            format!("{}{:6.4}", sign, whole + fraction / 60.0)
        }
        _ => {
            warn!("Cannot decode position {:?}; passing it through", raw);
            raw.trim().to_string()
        }
    }
}

/// Comments without a leading letter become a single space; otherwise commas
/// are replaced with semicolons and the text is trimmed
pub fn clean_comments(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        trimmed.replace(',', ";").trim().to_string()
    } else {
        " ".to_string()
    }
}

/// Ship text after its four byte platform prefix, up to the first `/`
pub fn cruise_name(ship: &str) -> String {
    ship.get(4..)
        .unwrap_or_default()
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn expocode(ship: &str) -> String {
    ship.replace('/', "_")
}

pub fn clean_parameters(raw: &str) -> String {
    raw.replace(',', ";")
}

/// Normalized value of one cruise column for a summary entry
pub fn cruise_value(entry: &CruiseSummaryEntry, column: &str) -> Option<String> {
    let value = match column {
        "Ship" => entry.ship.clone(),
        "cruise_name" => cruise_name(&entry.ship),
        "EXPOCODE" => expocode(&entry.ship),
        "Date" => entry.date.clone(),
        "Month" => entry.month.to_string(),
        "Day" => entry.day.clone(),
        "Year" => entry.year.to_string(),
        "timeutc" => entry.time_utc.clone(),
        "timecode" => entry.time_code.clone(),
        "section" => entry.section.clone(),
        "nav_code" => entry.nav_code.clone(),
        "depth_max" => entry.depth_max.clone(),
        "depth_hgt" => entry.depth_hgt.clone(),
        "pres_max" => entry.pres_max.clone(),
        "num_bottles" => entry.num_bottles.clone(),
        "parameters" => clean_parameters(&entry.parameters),
        "HOT_summary_file_name" => entry.summary_file.clone(),
        "comments" => clean_comments(&entry.comments),
        "lat" => decode_latitude(&entry.lat),
        "lon" => decode_longitude(&entry.lon),
        _ => return None,
    };
    Some(value)
}

/// Identifiers that had no summary entry, sorted and distinct
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnmatchedReport {
    identifiers: BTreeSet<String>,
}

impl UnmatchedReport {
    pub fn insert(&mut self, identifier: impl Into<String>) {
        self.identifiers.insert(identifier.into());
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.identifiers.iter().cloned().collect()
    }
}

/// Joins decoded records against a cruise summary index
#[derive(Debug)]
pub struct JoinEngine<'a> {
    index: &'a CruiseSummaryIndex,
    unmatched: UnmatchedReport,
}

impl<'a> JoinEngine<'a> {
    pub fn new(index: &'a CruiseSummaryIndex) -> Self {
        Self {
            index,
            unmatched: UnmatchedReport::default(),
        }
    }

    /// Look up an identifier, recording it as unmatched on a miss
    pub fn lookup(&mut self, identifier: &str) -> Option<&'a CruiseSummaryEntry> {
        let entry = self.index.get(identifier);
        if entry.is_none() {
            self.unmatched.insert(identifier);
        }
        entry
    }

    /// Attach cruise columns to every row of a niskin record set.
    ///
    /// Unmatched rows receive the MISSING sentinel in every cruise column.
    /// Returns the number of matched rows.
    pub fn enrich_rows(&mut self, record_set: &mut FileRecordSet) -> Result<usize> {
        let identifiers = record_set
            .field(IDENT_FIELD)
            .map(|series| series.values.clone())
            .ok_or_else(|| HotError::MissingIdentifierField {
                path: record_set.source.clone(),
                field: IDENT_FIELD.to_string(),
            })?;

        let mut columns: Vec<FieldSeries> =
            CRUISE_COLUMNS.iter().map(|name| FieldSeries::new(*name)).collect();
        let mut matched = 0;
        for identifier in &identifiers {
            match self.lookup(identifier) {
                Some(entry) => {
                    matched += 1;
                    for series in columns.iter_mut() {
                        let value = cruise_value(entry, &series.name).unwrap_or_default();
                        series.values.push(value);
                    }
                }
                None => {
                    for series in columns.iter_mut() {
                        series.values.push(MISSING_CRUISE_INFO.to_string());
                    }
                }
            }
        }

        for series in columns {
            record_set.insert_field(series)?;
        }
        debug!(
            "Joined {}/{} rows of {}",
            matched,
            identifiers.len(),
            record_set.source_name
        );
        Ok(matched)
    }

    /// Top-level row for a CTD cast, in [`CTD_TOPLEVEL_COLUMNS`] order.
    ///
    /// Returns `None` when the cast has no summary entry; the caller skips it.
    pub fn ctd_toplevel_row(&mut self, record_set: &FileRecordSet) -> Option<Vec<String>> {
        let identifier = cast_identifier(record_set);
        let entry = self.lookup(&identifier)?;
        let part = |key: &str| record_set.header_value(key).unwrap_or_default().trim().to_string();
        let station = part(ctd::STATION);
        let cast = part(ctd::CAST);
        let csv_name = record_set
            .header_value(CTD_FILENAME)
            .unwrap_or(record_set.source_name.as_str())
            .replace(".ctd", ".csv");

        Some(
            CTD_TOPLEVEL_COLUMNS
                .iter()
                .map(|column| match *column {
                    "station" => station.clone(),
                    "cast" => cast.clone(),
                    "CTD_filename" => csv_name.clone(),
                    other => cruise_value(entry, other).unwrap_or_default(),
                })
                .collect(),
        )
    }

    pub fn unmatched(&self) -> &UnmatchedReport {
        &self.unmatched
    }

    pub fn into_unmatched(self) -> UnmatchedReport {
        self.unmatched
    }
}
