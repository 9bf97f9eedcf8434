//! Fixed-width record layouts.
//!
//! Every column position used by the decoders is declared here once, per
//! data kind, as a table of (field name, byte range, unit source). Ranges are
//! 0-based and half-open. The niskin layout is not listed because it is
//! loaded at runtime from the reference document (see [`crate::format_table`]).

use crate::constants::{
    CTD_HEADER_LINES, FLUX_HEADER_LINES, PRIM_PROD_HEADER_LINES,
};
use crate::models::{ByteRange, DataKind};

/// Where a field's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Sliced from each data line
    Slice(ByteRange),
    /// The source file name, repeated on every row
    SourceName,
    /// Computed by the decoder from other fields
    Derived,
}

/// Where a field's unit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSource {
    None,
    Fixed(&'static str),
    /// Sliced from the given 0-based header line
    Header { line: usize, range: ByteRange },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub value: ValueSource,
    pub unit: UnitSource,
}

/// Complete layout for a data kind with statically named fields
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub kind: DataKind,
    /// Reference document revision the offsets were taken from
    pub version: &'static str,
    pub header_lines: usize,
    pub fields: &'static [FieldLayout],
}

impl RecordLayout {
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.to_string()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Slice `range` out of `line` by byte position.
///
/// The range is clamped to the line, so short lines give short or empty
/// values. Bytes are decoded lossily and trailing line terminators removed;
/// the content is otherwise passed through untouched.
pub fn slice(line: &str, range: ByteRange) -> String {
    let bytes = line.as_bytes();
    let end = range.end.min(bytes.len());
    let start = range.start.min(end);
    String::from_utf8_lossy(&bytes[start..end])
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

const fn data(name: &'static str, start: usize, end: usize, unit: UnitSource) -> FieldLayout {
    FieldLayout {
        name,
        value: ValueSource::Slice(ByteRange::new(start, end)),
        unit,
    }
}

const fn header_unit(line: usize, start: usize, end: usize) -> UnitSource {
    UnitSource::Header {
        line,
        range: ByteRange::new(start, end),
    }
}

// =============================================================================
// Particle flux (Readme.flux)
// =============================================================================

const FLUX_UNITS: usize = 2;

const fn flux(name: &'static str, start: usize, end: usize) -> FieldLayout {
    data(name, start, end, header_unit(FLUX_UNITS, start, end))
}

static FLUX_FIELDS: [FieldLayout; 28] = [
    FieldLayout {
        name: "P_flux_filename",
        value: ValueSource::SourceName,
        unit: UnitSource::None,
    },
    data("Cruise", 0, 4, UnitSource::Fixed("Number")),
    data("Depth", 8, 11, UnitSource::Fixed("Meters")),
    data("Treatment", 14, 15, header_unit(FLUX_UNITS, 13, 16)),
    data("Carbon", 18, 23, header_unit(FLUX_UNITS, 17, 24)),
    flux("Carbon_sd_diff", 25, 32),
    flux("Carbon_n", 32, 35),
    flux("Nitrogen", 35, 42),
    flux("Nitrogen_sd_diff", 43, 50),
    flux("Nitrogen_n", 51, 52),
    flux("Phosphorus", 53, 60),
    flux("Phosphorus_sd_diff", 61, 68),
    flux("Phosphorus_n", 68, 71),
    flux("Mass", 71, 78),
    flux("Mass_sd_diff", 78, 86),
    flux("Mass_n", 86, 89),
    flux("Silica", 89, 96),
    flux("Silica_sd_diff", 97, 104),
    flux("Silica_n", 104, 107),
    flux("Delta_15N", 107, 114),
    flux("Delta_15N_sd_diff", 115, 122),
    flux("Delta_15N_n", 122, 125),
    flux("Delta_13C", 125, 132),
    flux("Delta_13C_sd_diff", 133, 140),
    flux("Delta_13C_n", 140, 143),
    flux("PIC", 143, 150),
    flux("PIC_sd_diff", 151, 158),
    flux("PIC_n", 158, 161),
];

pub static PARTICLE_FLUX_LAYOUT: RecordLayout = RecordLayout {
    kind: DataKind::ParticleFlux,
    version: "Readme.flux 2018-04",
    header_lines: FLUX_HEADER_LINES,
    fields: &FLUX_FIELDS,
};

// =============================================================================
// Primary production (Readme.pp)
// =============================================================================

/// Header line carrying the light/dark incubation units
const PP_RATE_UNITS: usize = 2;
/// Header line carrying every other unit
const PP_UNITS: usize = 3;

pub const PP_DATE: ByteRange = ByteRange::new(18, 26);
pub const PP_START_TIME: ByteRange = ByteRange::new(26, 32);
pub const PP_END_TIME: ByteRange = ByteRange::new(32, 38);

pub const START_DATE_TIME: &str = "start_date_time";
pub const END_DATE_TIME: &str = "end_date_time";

const fn pp(name: &'static str, start: usize, end: usize) -> FieldLayout {
    data(name, start, end, header_unit(PP_UNITS, start, end))
}

const fn pp_rate(name: &'static str, start: usize, end: usize) -> FieldLayout {
    data(name, start, end, header_unit(PP_RATE_UNITS, start, end))
}

static PRIM_PROD_FIELDS: [FieldLayout; 26] = [
    FieldLayout {
        name: "PrimProd_filename",
        value: ValueSource::SourceName,
        unit: UnitSource::None,
    },
    data("Cruise", 0, 5, UnitSource::Fixed("Number")),
    data("Incubation_type", 6, 10, header_unit(PP_UNITS, 6, 11)),
    pp("Time", 11, 18),
    pp("Date", PP_DATE.start, PP_DATE.end),
    pp("Start_time", PP_START_TIME.start, PP_START_TIME.end),
    pp("End_time", PP_END_TIME.start, PP_END_TIME.end),
    pp("Depth", 38, 43),
    pp("Chl_a_mean", 44, 50),
    pp("Chl_a_sd", 51, 57),
    pp("Pheo_mean", 58, 64),
    pp("Pheo_sd", 65, 71),
    pp_rate("Light_rep1", 72, 79),
    pp_rate("Light_rep2", 80, 87),
    pp_rate("Light_rep3", 88, 95),
    pp_rate("Dark_rep1", 96, 103),
    pp_rate("Dark_rep2", 104, 111),
    pp_rate("Dark_rep3", 112, 119),
    pp("Salt", 120, 128),
    pp("Prochl", 129, 136),
    pp("Hetero", 137, 144),
    pp("Synecho", 145, 152),
    data("Euk", 153, 160, header_unit(PP_UNITS, 153, 161)),
    pp("Flag", 162, 172),
    FieldLayout {
        name: START_DATE_TIME,
        value: ValueSource::Derived,
        unit: UnitSource::Fixed("YYMMDDHHMM"),
    },
    FieldLayout {
        name: END_DATE_TIME,
        value: ValueSource::Derived,
        unit: UnitSource::Fixed("YYMMDDHHMM"),
    },
];

pub static PRIMARY_PRODUCTION_LAYOUT: RecordLayout = RecordLayout {
    kind: DataKind::PrimaryProduction,
    version: "Readme.pp 2018-05",
    header_lines: PRIM_PROD_HEADER_LINES,
    fields: &PRIM_PROD_FIELDS,
};

// =============================================================================
// CTD (Readme.format)
// =============================================================================

pub mod ctd {
    use super::*;

    pub const HEADER_LINES: usize = CTD_HEADER_LINES;

    /// Header line holding the column labels
    pub const LABEL_LINE: usize = 3;
    pub const UNIT_LINE: usize = 4;
    pub const QUALITY_LINE: usize = 5;

    /// Pressure, temperature, salinity, oxygen, transmissometer/nitrate,
    /// chlorophyll pigments, beam attenuation/obs, quality
    pub const COLUMNS: [ByteRange; 8] = [
        ByteRange::new(0, 8),
        ByteRange::new(8, 16),
        ByteRange::new(16, 25),
        ByteRange::new(25, 33),
        ByteRange::new(34, 41),
        ByteRange::new(41, 49),
        ByteRange::new(49, 57),
        ByteRange::new(57, 65),
    ];

    pub const EXPOCODE: &str = "EXPOCODE";
    pub const STATION: &str = "Station number";
    pub const CAST: &str = "Cast number";
    pub const RECORD_COUNT: &str = "Number of data records in the file";

    /// Header metadata: (name, header line, range)
    pub const HEADER_FIELDS: [(&str, usize, ByteRange); 10] = [
        (EXPOCODE, 0, ByteRange::new(8, 22)),
        ("WHP station identification", 0, ByteRange::new(30, 34)),
        ("Month", 0, ByteRange::new(40, 42)),
        ("Day", 0, ByteRange::new(42, 44)),
        ("Year", 0, ByteRange::new(44, 46)),
        (STATION, 1, ByteRange::new(6, 12)),
        (CAST, 1, ByteRange::new(19, 22)),
        (RECORD_COUNT, 1, ByteRange::new(35, 40)),
        ("Instrument number", 2, ByteRange::new(15, 21)),
        ("Sampling rate", 2, ByteRange::new(36, 41)),
    ];
}
