//! Pipeline orchestration for HOT datasets.
//!
//! Runs one data kind end to end: discover files, load the cruise summary
//! index, decode, join, assemble, sort and write. Fatal errors (duplicate
//! cruise identifiers, schema mismatches) are raised before any output file
//! is created.

pub mod discovery;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::{default_summary_dir, FileDiscovery};
use self::writer::{stamp_comments, write_ctd_toplevel, write_unmatched_report, TableWriter};

use crate::config::{OutputFormat, PipelineConfig};
use crate::constants::{
    CTD_TOPLEVEL_FILE, MISSING_CRUISE_INFO, NISKIN_FORMAT_FILE, STATION_ALOHA_LAT,
    STATION_ALOHA_LON,
};
use crate::decoder::niskin::IDENT_FIELD;
use crate::decoder::{CtdDecoder, FluxDecoder, NiskinDecoder, PrimProdDecoder, RecordDecoder};
use crate::error::{HotError, Result};
use crate::format_table::FormatTable;
use crate::join::{JoinEngine, UnmatchedReport, CRUISE_COLUMNS, CTD_TOPLEVEL_COLUMNS, SHIP_COLUMN};
use crate::models::{DataKind, FileRecordSet, ProcessingStats};
use crate::summary::CruiseSummaryIndex;
use crate::table::{CombinedTable, TableAssembler};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Main processor for one HOT data kind
#[derive(Debug)]
pub struct DatasetProcessor {
    input_dir: PathBuf,
    output_path: PathBuf,
    summary_dir: PathBuf,
    config: PipelineConfig,
    explicit_files: Vec<PathBuf>,
    format_file: Option<PathBuf>,
    unmatched_report: Option<PathBuf>,
    comments_file: Option<PathBuf>,
    quiet: bool,
}

impl DatasetProcessor {
    /// Create a processor with the default configuration for `kind`.
    ///
    /// `output_path` is a file for niskin, flux and primary production, and
    /// a directory for CTD.
    pub fn new(kind: DataKind, input_dir: PathBuf, output_path: PathBuf) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(HotError::Configuration {
                message: format!("input directory {} does not exist", input_dir.display()),
            });
        }

        Ok(Self {
            summary_dir: default_summary_dir(&input_dir),
            input_dir,
            output_path,
            config: PipelineConfig::for_kind(kind),
            explicit_files: Vec::new(),
            format_file: None,
            unmatched_report: None,
            comments_file: None,
            quiet: false,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_summary_dir(mut self, dir: PathBuf) -> Self {
        self.summary_dir = dir;
        self
    }

    /// Process exactly these data files instead of discovering them
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.explicit_files = files;
        self
    }

    pub fn with_format_file(mut self, path: PathBuf) -> Self {
        self.format_file = Some(path);
        self
    }

    pub fn with_unmatched_report(mut self, path: PathBuf) -> Self {
        self.unmatched_report = Some(path);
        self
    }

    pub fn with_comments_file(mut self, path: PathBuf) -> Self {
        self.comments_file = Some(path);
        self
    }

    /// Suppress console output and the progress bar
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn kind(&self) -> DataKind {
        self.config.kind
    }

    /// Main processing entry point
    pub fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;
        let kind = self.config.kind;

        self.say(format!(
            "{} {}",
            "Starting HOT".bright_green().bold(),
            kind.to_string().bright_green().bold()
        ));
        self.say(format!("  {} {}", "Input:".bright_cyan(), self.input_dir.display()));
        self.say(format!("  {} {}", "Output:".bright_cyan(), self.output_path.display()));

        let discovery = FileDiscovery::new(self.input_dir.clone()).recursive(self.config.recursive);
        let files = if self.explicit_files.is_empty() {
            discovery.discover(&self.config.data_pattern)?
        } else {
            self.explicit_files.clone()
        };
        self.say(format!(
            "  {} {} data files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold()
        ));

        let mut stats = match kind {
            DataKind::Niskin => self.process_niskin(&discovery, &files)?,
            DataKind::Ctd => self.process_ctd(&discovery, &files)?,
            DataKind::ParticleFlux => {
                let decoder = FluxDecoder::new();
                let fields = decoder.layout().field_names();
                self.process_fixed_layout(&decoder, fields, &discovery, &files)?
            }
            DataKind::PrimaryProduction => {
                let decoder = PrimProdDecoder::new();
                let fields = decoder.layout().field_names();
                self.process_fixed_layout(&decoder, fields, &discovery, &files)?
            }
        };

        if let Some(path) = &self.comments_file {
            let today = chrono::Local::now().date_naive();
            if stamp_comments(path, kind, today)? {
                self.say(format!("  {} {}", "Updated".bright_green(), path.display()));
            }
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        self.report(&stats);
        Ok(stats)
    }

    fn process_niskin(&self, discovery: &FileDiscovery, files: &[PathBuf]) -> Result<ProcessingStats> {
        let format_path = self
            .format_file
            .clone()
            .unwrap_or_else(|| self.input_dir.join(NISKIN_FORMAT_FILE));
        let decoder = NiskinDecoder::new(FormatTable::load(&format_path)?);
        let index = self.load_summaries()?;
        let record_sets = self.decode_all(&decoder, discovery, files)?;

        let mut assembler = TableAssembler::new(DataKind::Niskin);
        if let Some(declared) = &self.config.declared_schema {
            let mut fields = declared.clone();
            fields.push(IDENT_FIELD.to_string());
            fields.extend(CRUISE_COLUMNS.iter().map(|name| name.to_string()));
            assembler = assembler.with_declared_schema(fields);
        }

        let mut engine = JoinEngine::new(&index);
        let mut stats = ProcessingStats::default();
        for mut record_set in record_sets {
            engine.enrich_rows(&mut record_set)?;
            assembler.append(record_set)?;
            stats.files_processed += 1;
        }

        let mut table = assembler.finish()?;
        table.remove_column(IDENT_FIELD);
        let removed = table.remove_rows_where(SHIP_COLUMN, MISSING_CRUISE_INFO);
        debug!("Removed {} rows without cruise summary information", removed);
        table.sort_columns();

        self.finish_table(table, engine.into_unmatched(), stats)
    }

    fn process_fixed_layout<D: RecordDecoder>(
        &self,
        decoder: &D,
        layout_fields: Vec<String>,
        discovery: &FileDiscovery,
        files: &[PathBuf],
    ) -> Result<ProcessingStats> {
        let declared = self.config.declared_schema.clone().unwrap_or(layout_fields);
        let mut assembler = TableAssembler::new(decoder.kind()).with_declared_schema(declared);

        let mut stats = ProcessingStats::default();
        for record_set in self.decode_all(decoder, discovery, files)? {
            assembler.append(record_set)?;
            stats.files_processed += 1;
        }

        let mut table = assembler.finish()?;
        table.add_constant_column("lon", STATION_ALOHA_LON);
        table.add_constant_column("lat", STATION_ALOHA_LAT);

        self.finish_table(table, UnmatchedReport::default(), stats)
    }

    fn process_ctd(&self, discovery: &FileDiscovery, files: &[PathBuf]) -> Result<ProcessingStats> {
        let index = self.load_summaries()?;
        let record_sets = self.decode_all(&CtdDecoder::new(), discovery, files)?;

        let mut engine = JoinEngine::new(&index);
        let mut stats = ProcessingStats::default();
        let mut casts = Vec::new();
        let mut top_rows: Vec<Vec<String>> = Vec::new();
        for record_set in record_sets {
            match engine.ctd_toplevel_row(&record_set) {
                Some(row) => {
                    top_rows.push(row);
                    casts.push(record_set);
                }
                None => {
                    let identifier = crate::decoder::ctd::cast_identifier(&record_set);
                    warn!(
                        "{} from file {} not found in cruise summary",
                        identifier, record_set.source_name
                    );
                    self.say(format!(
                        "{} from file {} not found in cruise summary",
                        identifier.yellow(),
                        record_set.source_name
                    ));
                    stats.files_skipped += 1;
                }
            }
        }

        let mut data_fields = Vec::new();
        for record_set in casts {
            let path = self
                .output_path
                .join(record_set.source_name.replace(".ctd", ".csv"));
            data_fields.extend(record_set.field_names());
            let table = cast_table(record_set)?;
            stats.rows_written += TableWriter::new(path.clone(), OutputFormat::Csv).write(&table)?;
            stats.output_paths.push(path);
            stats.files_processed += 1;
        }

        let mut columns: Vec<(String, Vec<String>)> = CTD_TOPLEVEL_COLUMNS
            .iter()
            .map(|name| (name.to_string(), Vec::with_capacity(top_rows.len())))
            .collect();
        for row in top_rows {
            for ((_, values), value) in columns.iter_mut().zip(row) {
                values.push(value);
            }
        }
        let mut toplevel = CombinedTable::from_columns(columns)?;
        if self.config.sort_output {
            toplevel.sort_rows(&self.config.sort_keys);
        }

        if toplevel.row_count() > 0 {
            let path = self.output_path.join(CTD_TOPLEVEL_FILE);
            write_ctd_toplevel(&path, &toplevel, &data_fields)?;
            info!("Wrote {} casts to {}", toplevel.row_count(), path.display());
            stats.output_paths.push(path);
        }

        let unmatched = engine.into_unmatched();
        self.report_unmatched(&unmatched)?;
        stats.unmatched_identifiers = unmatched.identifiers();
        Ok(stats)
    }

    /// Sort and write an assembled table, then report unmatched identifiers
    fn finish_table(
        &self,
        mut table: CombinedTable,
        unmatched: UnmatchedReport,
        mut stats: ProcessingStats,
    ) -> Result<ProcessingStats> {
        if self.config.sort_output {
            table.sort_rows(&self.config.sort_keys);
        }

        self.say(format!(
            "\n{} {}",
            "Writing".bright_yellow(),
            self.output_path.display()
        ));
        let writer = TableWriter::new(self.output_path.clone(), self.config.output_format)
            .with_compression(self.config.compression);
        stats.rows_written = writer.write(&table)?;
        stats.output_paths.push(self.output_path.clone());
        info!(
            "Wrote {} {} rows with {} columns",
            stats.rows_written,
            self.config.kind,
            table.column_count()
        );

        self.report_unmatched(&unmatched)?;
        stats.unmatched_identifiers = unmatched.identifiers();
        Ok(stats)
    }

    fn load_summaries(&self) -> Result<CruiseSummaryIndex> {
        let paths = FileDiscovery::new(self.summary_dir.clone()).discover(&self.config.summary_pattern)?;
        self.say(format!(
            "  {} {} cruise summary files",
            "Found".bright_green(),
            paths.len().to_string().bright_white().bold()
        ));
        CruiseSummaryIndex::load(&paths)
    }

    fn decode_all(
        &self,
        decoder: &dyn RecordDecoder,
        discovery: &FileDiscovery,
        files: &[PathBuf],
    ) -> Result<Vec<FileRecordSet>> {
        let progress = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(files.len() as u64)
        };
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress.set_message(format!("Decoding {} files", decoder.kind()));

        let mut record_sets = Vec::with_capacity(files.len());
        for path in files {
            let source_name = discovery.relative_name(path);
            record_sets.push(decoder.decode_file(path, &source_name)?);
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(record_sets)
    }

    fn report_unmatched(&self, unmatched: &UnmatchedReport) -> Result<()> {
        if unmatched.is_empty() {
            debug!("All data file identifiers were found in the cruise summary files");
        } else {
            self.say(format!(
                "\n{}",
                "The following identifiers [expocode.station.cast] do not exist in the cruise summary files and were not written:"
                    .yellow()
            ));
            for identifier in unmatched.identifiers() {
                self.say(format!("  {}", identifier));
            }
        }

        if let Some(path) = &self.unmatched_report {
            write_unmatched_report(path, unmatched)?;
            debug!("Wrote unmatched identifier report to {}", path.display());
        }
        Ok(())
    }

    fn report(&self, stats: &ProcessingStats) {
        self.say(format!("\n{}", "Processing Summary".bright_green().bold()));
        self.say(format!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        ));
        self.say(format!(
            "  {} {}",
            "Files processed:".bright_cyan(),
            stats.files_processed.to_string().bright_white()
        ));
        if stats.files_skipped > 0 {
            self.say(format!(
                "  {} {}",
                "Files skipped:".bright_red(),
                stats.files_skipped.to_string().bright_red().bold()
            ));
        }
        self.say(format!(
            "  {} {}",
            "Rows written:".bright_cyan(),
            stats.rows_written.to_string().bright_white().bold()
        ));
        if !stats.unmatched_identifiers.is_empty() {
            self.say(format!(
                "  {} {}",
                "Unmatched identifiers:".bright_yellow(),
                stats.unmatched_identifiers.len().to_string().bright_yellow()
            ));
        }
    }

    fn say(&self, line: String) {
        if !self.quiet {
            println!("{}", line);
        }
    }
}

/// Data columns of one CTD cast, in file order
fn cast_table(record_set: FileRecordSet) -> Result<CombinedTable> {
    CombinedTable::from_columns(
        record_set
            .into_fields()
            .into_iter()
            .map(|series| (series.name, series.values))
            .collect(),
    )
}

/// Output path for `kind` when none is given: `<input>/../<short name>.csv`,
/// or `<input>/../ctd` for CTD
pub fn default_output_path(kind: DataKind, input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(input);
    match kind {
        DataKind::Ctd => parent.join(kind.short_name()),
        _ => parent.join(format!("{}.csv", kind.short_name())),
    }
}
