//! Application constants for the HOT processor
//!
//! Sentinel values, fixed observatory coordinates, file patterns and the
//! two-digit year rules used throughout the processor.

// =============================================================================
// Sentinels
// =============================================================================

/// Value substituted for every cruise-summary field when a record has no match
pub const MISSING_CRUISE_INFO: &str = "MISSING cruise.sum info";

/// Missing-value sentinel used by the primary production files
pub const MISSING_VALUE: &str = "-9";

/// Literal phrase that precedes the column table in the niskin reference document
pub const FORMAT_TABLE_ANCHOR: &str = "Column  Format";

// =============================================================================
// Station ALOHA
// =============================================================================

/// Fixed latitude attached to particle flux and primary production rows
pub const STATION_ALOHA_LAT: &str = "22.75";

/// Fixed longitude attached to particle flux and primary production rows
pub const STATION_ALOHA_LON: &str = "-158.00";

// =============================================================================
// File patterns
// =============================================================================

pub const SUMMARY_FILE_PATTERN: &str = "hot*.sum";
pub const CTD_FILE_PATTERN: &str = "h*.ctd";
pub const NISKIN_FILE_PATTERN: &str = "hot*.gof";
pub const FLUX_FILE_PATTERN: &str = "hot*.flux";
pub const PRIM_PROD_FILE_PATTERN: &str = "hot*.pp";

/// Summary directory name, resolved relative to the data directory's parent
pub const SUMMARY_DIR_NAME: &str = "cruise.summaries";

/// Default name of the niskin format reference document
pub const NISKIN_FORMAT_FILE: &str = "Readme.water.jgofs";

/// Name of the CTD top-level file inside the output directory
pub const CTD_TOPLEVEL_FILE: &str = "ctd_toplevel.dat";

// =============================================================================
// Header blocks
// =============================================================================

pub const SUMMARY_HEADER_LINES: usize = 4;
pub const CTD_HEADER_LINES: usize = 6;
pub const NISKIN_HEADER_LINES: usize = 5;
pub const FLUX_HEADER_LINES: usize = 3;
pub const PRIM_PROD_HEADER_LINES: usize = 5;

// =============================================================================
// Two-digit years
// =============================================================================

/// Cruise summary years below this value belong to the 2000s
pub const SUMMARY_CENTURY_PIVOT: u32 = 80;

/// Primary production years from this value up to 99 belong to the 1900s
pub const PRIM_PROD_CENTURY_PIVOT: u32 = 30;

/// Expand a cruise summary two-digit year (`< 80` → 20xx, otherwise 19xx)
pub fn expand_summary_year(two_digit: u32) -> i32 {
    if two_digit < SUMMARY_CENTURY_PIVOT {
        2000 + two_digit as i32
    } else {
        1900 + two_digit as i32
    }
}

/// Century prefix for a primary production two-digit year (30-99 → "19", else "20")
pub fn prim_prod_century(two_digit: u32) -> &'static str {
    if (PRIM_PROD_CENTURY_PIVOT..=99).contains(&two_digit) {
        "19"
    } else {
        "20"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_year_boundary() {
        assert_eq!(expand_summary_year(0), 2000);
        assert_eq!(expand_summary_year(18), 2018);
        assert_eq!(expand_summary_year(79), 2079);
        assert_eq!(expand_summary_year(80), 1980);
        assert_eq!(expand_summary_year(99), 1999);
    }

    #[test]
    fn test_prim_prod_century() {
        assert_eq!(prim_prod_century(29), "20");
        assert_eq!(prim_prod_century(30), "19");
        assert_eq!(prim_prod_century(88), "19");
        assert_eq!(prim_prod_century(5), "20");
    }
}
