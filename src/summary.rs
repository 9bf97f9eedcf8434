//! Cruise summary parsing and indexing.
//!
//! Summary files carry one fixed-width row per cast after a four line
//! header (title, column names, units, separator). Rows are indexed by the
//! composite identifier `expocode.station.cast`, which must be unique across
//! every summary file of a run.

use crate::constants::{expand_summary_year, SUMMARY_HEADER_LINES};
use crate::error::{HotError, Result};
use crate::layout::slice;
use crate::models::{ByteRange, CruiseSummaryEntry};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SHIP: ByteRange = ByteRange::new(0, 9);
const SECTION: ByteRange = ByteRange::new(9, 15);
const STATION: ByteRange = ByteRange::new(15, 20);
const CAST: ByteRange = ByteRange::new(20, 24);
const DATE: ByteRange = ByteRange::new(30, 37);
const MONTH: ByteRange = ByteRange::new(31, 33);
const DAY: ByteRange = ByteRange::new(33, 35);
const YEAR: ByteRange = ByteRange::new(35, 37);
const TIME_UTC: ByteRange = ByteRange::new(37, 42);
const TIME_CODE: ByteRange = ByteRange::new(42, 46);
const LAT: ByteRange = ByteRange::new(46, 58);
const LON: ByteRange = ByteRange::new(58, 71);
const NAV_CODE: ByteRange = ByteRange::new(71, 76);
const DEPTH_MAX: ByteRange = ByteRange::new(76, 82);
const DEPTH_HGT: ByteRange = ByteRange::new(82, 87);
const PRES_MAX: ByteRange = ByteRange::new(87, 92);
const NUM_BOTTLES: ByteRange = ByteRange::new(92, 99);
const PARAMETERS: ByteRange = ByteRange::new(99, 112);
const COMMENTS: ByteRange = ByteRange::new(112, usize::MAX);

/// Index of cruise summary entries keyed by composite identifier
#[derive(Debug, Default)]
pub struct CruiseSummaryIndex {
    entries: HashMap<String, CruiseSummaryEntry>,
}

impl CruiseSummaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every summary file; the first duplicate identifier aborts the load
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut index = Self::new();
        for path in paths {
            let file = File::open(path)?;
            index.ingest(BufReader::new(file), path, &summary_display_name(path))?;
        }
        info!(
            "Indexed {} casts from {} cruise summary files",
            index.len(),
            paths.len()
        );
        Ok(index)
    }

    /// Add the rows of one summary file.
    ///
    /// `display_name` is recorded on every entry as its source summary file.
    pub fn ingest<R: BufRead>(&mut self, reader: R, path: &Path, display_name: &str) -> Result<()> {
        let mut added = 0;
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line_num < SUMMARY_HEADER_LINES || line.trim().is_empty() {
                continue;
            }

            let identifier = composite_identifier(&line);
            let entry = parse_row(&line, path, line_num + 1, display_name)?;
            if let Some(existing) = self.entries.get(&identifier) {
                return Err(HotError::DuplicateIdentifier {
                    identifier,
                    first_file: existing.summary_file.clone(),
                    second_file: display_name.to_string(),
                });
            }
            self.entries.insert(identifier, entry);
            added += 1;
        }

        debug!("Read {} summary rows from {}", added, path.display());
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&CruiseSummaryEntry> {
        self.entries.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `expocode.station.cast` of a summary row, each part trimmed
pub fn composite_identifier(line: &str) -> String {
    format!(
        "{}.{}.{}",
        slice(line, SHIP).trim(),
        slice(line, STATION).trim(),
        slice(line, CAST).trim()
    )
}

/// Summary files are recorded as `<directory>/<file>`, e.g. `cruise.summaries/hot1.sum`
fn summary_display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    match path.parent().and_then(Path::file_name) {
        Some(dir) => format!("{}/{}", dir.to_string_lossy(), file_name),
        None => file_name,
    }
}

fn parse_row(
    line: &str,
    path: &Path,
    line_num: usize,
    summary_file: &str,
) -> Result<CruiseSummaryEntry> {
    let field = |range: ByteRange| slice(line, range).trim().to_string();
    let integer = |range: ByteRange, name: &str| {
        let text = field(range);
        text.parse::<u32>().map_err(|_| HotError::InvalidSummaryRow {
            path: path.to_path_buf(),
            line: line_num,
            reason: format!("{} {:?} is not an integer", name, text),
        })
    };

    Ok(CruiseSummaryEntry {
        ship: field(SHIP),
        date: field(DATE),
        month: integer(MONTH, "month")?,
        day: field(DAY),
        year: expand_summary_year(integer(YEAR, "year")?),
        section: field(SECTION),
        time_utc: field(TIME_UTC),
        time_code: field(TIME_CODE),
        lat: slice(line, LAT),
        lon: slice(line, LON),
        nav_code: field(NAV_CODE),
        depth_max: field(DEPTH_MAX),
        depth_hgt: field(DEPTH_HGT),
        pres_max: field(PRES_MAX),
        num_bottles: field(NUM_BOTTLES),
        parameters: field(PARAMETERS),
        comments: field(COMMENTS),
        summary_file: summary_file.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    pub(crate) const SUMMARY_HEADER: &str = "\
HOT cruise summary
SHIP/CRS  SECT  STN CAST          DATE  TIME CODE  LATITUDE    LONGITUDE    NAV  DEPTH  HGT  PRES  BOTTLES PARAMETERS   COMMENTS
                                  mmddyy  UTC              deg min        deg min
--------------------------------------------------------------------------------------------------------------------------------
";

    /// One summary row with the fields a test usually cares about
    pub(crate) fn summary_row(
        ship: &str,
        station: u32,
        cast: u32,
        date: &str,
        comments: &str,
    ) -> String {
        format!(
            "{:<9}{:<6}{:>5}{:>4}{:<6}{:<7}{:>5}{:>4}{:<12}{:<13}{:<5}{:>6}{:>5}{:>5}{:>7}{:<13}{}",
            ship,
            "PRS2",
            station,
            cast,
            "",
            date,
            "2315",
            "BE",
            "  22 45.00 N",
            "  158  0.00 W",
            "GPS",
            "4740",
            "10",
            "1020",
            "24",
            "1,2,3,4",
            comments
        )
    }

    fn index_of(text: &str, name: &str) -> Result<CruiseSummaryIndex> {
        let mut index = CruiseSummaryIndex::new();
        index.ingest(Cursor::new(text), Path::new(name), name)?;
        Ok(index)
    }

    #[test]
    fn test_row_fields_and_identifier() {
        let text = format!(
            "{}{}\n",
            SUMMARY_HEADER,
            summary_row("32MW001/1", 2, 1, " 103188", "CTD cast, deep")
        );
        let index = index_of(&text, "cruise.summaries/hot1.sum").unwrap();

        assert_eq!(index.len(), 1);
        let entry = index.get("32MW001/1.2.1").unwrap();
        assert_eq!(entry.ship, "32MW001/1");
        assert_eq!(entry.section, "PRS2");
        assert_eq!(entry.date, "103188");
        assert_eq!(entry.month, 10);
        assert_eq!(entry.day, "31");
        assert_eq!(entry.year, 1988);
        assert_eq!(entry.time_utc, "2315");
        assert_eq!(entry.lat, "  22 45.00 N");
        assert_eq!(entry.lon, "  158  0.00 W");
        assert_eq!(entry.depth_max, "4740");
        assert_eq!(entry.num_bottles, "24");
        assert_eq!(entry.parameters, "1,2,3,4");
        assert_eq!(entry.comments, "CTD cast, deep");
        assert_eq!(entry.summary_file, "cruise.summaries/hot1.sum");
    }

    #[test]
    fn test_year_expansion_boundary() {
        let text = format!(
            "{}{}\n{}\n{}\n",
            SUMMARY_HEADER,
            summary_row("32MW001/1", 1, 1, " 010179", ""),
            summary_row("32MW001/1", 2, 1, " 010180", ""),
            summary_row("32MW001/1", 3, 1, " 010100", "")
        );
        let index = index_of(&text, "hot1.sum").unwrap();

        assert_eq!(index.get("32MW001/1.1.1").unwrap().year, 2079);
        assert_eq!(index.get("32MW001/1.2.1").unwrap().year, 1980);
        assert_eq!(index.get("32MW001/1.3.1").unwrap().year, 2000);
    }

    #[test]
    fn test_one_entry_per_identifier() {
        let rows: Vec<String> = (1..=5)
            .map(|station| summary_row("32MW002/1", station, 1, " 120188", ""))
            .collect();
        let text = format!("{}{}\n", SUMMARY_HEADER, rows.join("\n"));
        let index = index_of(&text, "hot2.sum").unwrap();

        assert_eq!(index.len(), 5);
        assert!(index.get("32MW002/1.1.1").is_some());
        assert!(index.get("32MW002/1.5.1").is_some());
    }

    #[test]
    fn test_duplicate_across_files_aborts() {
        let row = summary_row("32MW001/1", 2, 1, " 103188", "");
        let mut index = CruiseSummaryIndex::new();
        index
            .ingest(
                Cursor::new(format!("{}{}\n", SUMMARY_HEADER, row)),
                Path::new("hot1.sum"),
                "cruise.summaries/hot1.sum",
            )
            .unwrap();

        let result = index.ingest(
            Cursor::new(format!("{}{}\n", SUMMARY_HEADER, row)),
            Path::new("hot2.sum"),
            "cruise.summaries/hot2.sum",
        );
        match result {
            Err(HotError::DuplicateIdentifier {
                identifier,
                first_file,
                second_file,
            }) => {
                assert_eq!(identifier, "32MW001/1.2.1");
                assert_eq!(first_file, "cruise.summaries/hot1.sum");
                assert_eq!(second_file, "cruise.summaries/hot2.sum");
            }
            other => panic!("Expected DuplicateIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_load_returns_no_index_on_duplicate() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let summaries = temp_dir.path().join("cruise.summaries");
        std::fs::create_dir_all(&summaries).unwrap();
        let row = summary_row("32MW001/1", 2, 1, " 103188", "");
        for name in ["hot1.sum", "hot2.sum"] {
            std::fs::write(summaries.join(name), format!("{}{}\n", SUMMARY_HEADER, row)).unwrap();
        }

        let paths = vec![summaries.join("hot1.sum"), summaries.join("hot2.sum")];
        assert!(matches!(
            CruiseSummaryIndex::load(&paths),
            Err(HotError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn test_non_numeric_year_is_rejected() {
        let text = format!(
            "{}{}\n",
            SUMMARY_HEADER,
            summary_row("32MW001/1", 2, 1, " 1031xx", "")
        );
        match index_of(&text, "hot1.sum") {
            Err(HotError::InvalidSummaryRow { line, .. }) => assert_eq!(line, 5),
            other => panic!("Expected InvalidSummaryRow, got {:?}", other),
        }
    }
}
