//! Primary production decoding.
//!
//! Dates are stored as `YYMMDD` with leading zeros dropped and times as
//! `HHMM`, where incubations that run past midnight are written as times
//! above 2400. Both are combined here into ISO-8601 local date-times.

use super::{decode_with_layout, split_header, RecordDecoder};
use crate::constants::{prim_prod_century, MISSING_VALUE};
use crate::error::Result;
use crate::layout::{
    slice, RecordLayout, END_DATE_TIME, PP_DATE, PP_END_TIME, PP_START_TIME,
    PRIMARY_PRODUCTION_LAYOUT, START_DATE_TIME,
};
use crate::models::{DataKind, FileRecordSet};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct PrimProdDecoder {
    layout: &'static RecordLayout,
}

impl PrimProdDecoder {
    pub fn new() -> Self {
        Self {
            layout: &PRIMARY_PRODUCTION_LAYOUT,
        }
    }

    pub fn layout(&self) -> &'static RecordLayout {
        self.layout
    }
}

impl Default for PrimProdDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDecoder for PrimProdDecoder {
    fn kind(&self) -> DataKind {
        DataKind::PrimaryProduction
    }

    fn decode_text(&self, text: &str, path: &Path, source_name: &str) -> Result<FileRecordSet> {
        let (header, data) = split_header(text, self.layout.header_lines, path)?;
        let mut fields = decode_with_layout(self.layout, &header, &data, source_name);

        for series in fields.iter_mut() {
            let time_range = match series.name.as_str() {
                START_DATE_TIME => PP_START_TIME,
                END_DATE_TIME => PP_END_TIME,
                _ => continue,
            };
            series.values = data
                .iter()
                .map(|line| compose_date_time(&slice(line, PP_DATE), &slice(line, time_range)))
                .collect();
        }

        FileRecordSet::new(
            DataKind::PrimaryProduction,
            path.to_path_buf(),
            source_name.to_string(),
            vec![("Layout".to_string(), self.layout.version.to_string())],
            fields,
            data.len(),
        )
    }
}

/// Expand a `YYMMDD` date (leading zeros possibly dropped) to `YYYYMMDD`
pub fn expand_date(raw: &str) -> Option<String> {
    let digits = raw.trim();
    if digits.is_empty() || digits.len() > 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0>6}", digits);
    let year: u32 = padded[..2].parse().ok()?;
    Some(format!("{}{}", prim_prod_century(year), padded))
}

/// Combine a date and a time into `YYYY-MM-DDTHH:MM:00`.
///
/// The sentinel `-9` in either part makes the whole value `-9`. Times above
/// 2400 move to the following day. Values that are not digits are passed
/// through unchanged.
pub fn compose_date_time(date: &str, time: &str) -> String {
    let date = date.trim();
    let time = time.trim();
    if date == MISSING_VALUE || time == MISSING_VALUE {
        return MISSING_VALUE.to_string();
    }

    let Some(full_date) = expand_date(date) else {
        warn!("Unreadable primary production date {:?}", date);
        return format!("{}{}", date, time);
    };
    let Ok(clock) = time.parse::<u32>() else {
        warn!("Unreadable primary production time {:?}", time);
        return format!("{}{}", date, time);
    };

    let (full_date, time) = if clock > 2400 {
        (next_day(&full_date), clock - 2400)
    } else {
        (full_date, clock)
    };
    let time = format!("{:04}", time);

    format!(
        "{}-{}-{}T{}:{}:00",
        &full_date[..4],
        &full_date[4..6],
        &full_date[6..8],
        &time[..2],
        &time[2..4]
    )
}

/// The calendar day after a `YYYYMMDD` date
fn next_day(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y%m%d") {
        Ok(day) => (day + Duration::days(1)).format("%Y%m%d").to_string(),
        Err(_) => {
            warn!("{} is not a calendar date; incrementing numerically", date);
            date.parse::<u32>()
                .map(|value| format!("{:08}", value + 1))
                .unwrap_or_else(|_| date.to_string())
        }
    }
}
