//! Output writing for HOT datasets
//!
//! Serializes combined tables through polars, either as comma-delimited
//! text or as Parquet, and writes the side files of a run: the CTD top-level
//! file, the unmatched identifier report and the data-comments version stamp.

use crate::config::{CompressionAlgorithm, OutputFormat};
use crate::error::Result;
use crate::join::{UnmatchedReport, CTD_TOPLEVEL_COLUMNS};
use crate::models::DataKind;
use crate::table::CombinedTable;

use chrono::NaiveDate;
use polars::prelude::{
    CsvWriter, DataFrame, ParquetWriter as PolarsParquetWriter, QuoteStyle, SerWriter,
};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writer for one output table
#[derive(Debug)]
pub struct TableWriter {
    output_path: PathBuf,
    format: OutputFormat,
    compression: CompressionAlgorithm,
}

impl TableWriter {
    pub fn new(output_path: PathBuf, format: OutputFormat) -> Self {
        Self {
            output_path,
            format,
            compression: CompressionAlgorithm::default(),
        }
    }

    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Write the table with a header row; returns the number of data rows
    pub fn write(&self, table: &CombinedTable) -> Result<usize> {
        create_parent_dir(&self.output_path)?;
        let mut df = table.to_dataframe()?;
        let file = File::create(&self.output_path)?;

        match self.format {
            OutputFormat::Csv => write_csv(BufWriter::new(file), &mut df, true)?,
            OutputFormat::Parquet => {
                PolarsParquetWriter::new(file)
                    .with_compression(self.compression.to_polars_compression())
                    .finish(&mut df)?;
            }
        }

        debug!(
            "Wrote {} rows x {} columns to {}",
            df.height(),
            df.width(),
            self.output_path.display()
        );
        Ok(df.height())
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Comma separated, `\n` terminated, quoting only values that need it
fn write_csv<W: Write>(writer: W, df: &mut DataFrame, header: bool) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(header)
        .with_separator(b',')
        .with_line_terminator("\n".to_string())
        .with_quote_style(QuoteStyle::Necessary)
        .finish(df)?;
    Ok(())
}

/// Write the CTD top-level file.
///
/// The first header line lists the top-level columns with the file name
/// column shown as `>`; the second lists the distinct CTD data field names
/// in reverse order. Data rows follow.
pub fn write_ctd_toplevel(
    path: &Path,
    rows: &CombinedTable,
    data_fields: &[String],
) -> Result<usize> {
    create_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);

    let mut first_line: Vec<&str> = CTD_TOPLEVEL_COLUMNS.to_vec();
    if let Some(last) = first_line.last_mut() {
        *last = ">";
    }
    writeln!(writer, "{}", first_line.join(","))?;

    let mut fields: Vec<&str> = data_fields.iter().map(String::as_str).collect();
    fields.sort_unstable_by(|a, b| b.cmp(a));
    fields.dedup();
    writeln!(writer, "{}", fields.join(","))?;

    let mut df = rows.to_dataframe()?;
    if df.height() > 0 {
        write_csv(&mut writer, &mut df, false)?;
    }
    writer.flush()?;
    Ok(df.height())
}

/// Write unmatched identifiers one per line
pub fn write_unmatched_report(path: &Path, report: &UnmatchedReport) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    for identifier in report.identifiers() {
        writeln!(writer, "{}", identifier)?;
    }
    writer.flush()?;
    Ok(())
}

/// Replace the first line of a data-comments file with a version stamp.
///
/// Niskin and CTD comments get an extra `\#` separator line. A missing file
/// is skipped with a warning.
pub fn stamp_comments(path: &Path, kind: DataKind, date: NaiveDate) -> Result<bool> {
    if !path.is_file() {
        warn!("Data comments file {} not found; not stamping", path.display());
        return Ok(false);
    }

    let text = fs::read_to_string(path)?;
    let mut stamp = format!("\\#  version: {}\n", date.format("%Y-%m-%d"));
    if matches!(kind, DataKind::Niskin | DataKind::Ctd) {
        stamp.push_str("\\#\n");
    }
    let rest = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    fs::write(path, format!("{}{}", stamp, rest))?;

    debug!("Stamped {} with version {}", path.display(), date);
    Ok(true)
}
