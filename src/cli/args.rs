//! Command-line argument definitions for the HOT processor
//!
//! One subcommand per data kind. Every subcommand shares the options in
//! [`CommonArgs`]; niskin adds the location of its format reference document.

use crate::config::{CompressionAlgorithm, OutputFormat, PipelineConfig};
use crate::error::{HotError, Result};
use crate::models::DataKind;
use crate::processor::default_output_path;
use crate::table::SortKey;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the HOT data processor
///
/// Converts Hawaii Ocean Time-series fixed-width data files into
/// comma-delimited tables joined with cruise summary metadata.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hot-processor",
    version,
    about = "Convert HOT fixed-width oceanographic data files to JGOFS-style tables",
    long_about = "Decodes Hawaii Ocean Time-series CTD, niskin bottle, particle flux and \
                  primary production files, joins bottle and CTD records with the cruise \
                  summary files, and writes sorted comma-delimited tables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands, one per data kind
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert CTD casts to per-cast CSV files plus a top-level index
    Ctd(CommonArgs),
    /// Convert niskin bottle files to one joined table
    Niskin(NiskinArgs),
    /// Convert sediment trap particle flux files to one table
    Flux(CommonArgs),
    /// Convert primary production files to one table
    PrimProd(CommonArgs),
}

impl Commands {
    pub fn kind(&self) -> DataKind {
        match self {
            Commands::Ctd(_) => DataKind::Ctd,
            Commands::Niskin(_) => DataKind::Niskin,
            Commands::Flux(_) => DataKind::ParticleFlux,
            Commands::PrimProd(_) => DataKind::PrimaryProduction,
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Ctd(args) | Commands::Flux(args) | Commands::PrimProd(args) => args,
            Commands::Niskin(args) => &args.common,
        }
    }

    pub fn format_file(&self) -> Option<&PathBuf> {
        match self {
            Commands::Niskin(args) => args.format_file.as_ref(),
            _ => None,
        }
    }
}

/// Options shared by every subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Directory holding the data files
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input: PathBuf,

    /// Directory holding the cruise summary files
    ///
    /// Defaults to `cruise.summaries` beside the input directory.
    #[arg(short = 's', long = "summaries", value_name = "DIR")]
    pub summaries: Option<PathBuf>,

    /// Output file, or output directory for ctd
    ///
    /// Defaults to `<kind>.csv` (or `ctd/`) beside the input directory.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Process only these data files instead of searching the input directory
    #[arg(long = "files", value_name = "FILE", num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Glob pattern for data file names
    #[arg(long = "pattern", value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Glob pattern for cruise summary file names
    #[arg(long = "summary-pattern", value_name = "GLOB")]
    pub summary_pattern: Option<String>,

    /// Output file format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Parquet compression algorithm
    #[arg(long = "compression", value_enum, default_value = "snappy")]
    pub compression: CompressionAlgorithm,

    /// Write rows in decoding order instead of sorting them
    #[arg(long = "no-sort")]
    pub no_sort: bool,

    /// Sort key as `column`, `column n` or `column rn`; repeat for secondary keys
    #[arg(long = "sort-key", value_name = "KEY")]
    pub sort_keys: Vec<SortKey>,

    /// Write unmatched identifiers to this file, one per line
    #[arg(long = "unmatched-report", value_name = "FILE")]
    pub unmatched_report: Option<PathBuf>,

    /// Data-comments file whose first line receives a version stamp
    #[arg(long = "comments-file", value_name = "FILE")]
    pub comments_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Arguments for the niskin subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct NiskinArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Format reference document listing the bottle file columns
    ///
    /// Defaults to `Readme.water.jgofs` in the input directory.
    #[arg(long = "format-file", value_name = "FILE")]
    pub format_file: Option<PathBuf>,
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn output_path(&self, kind: DataKind) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(kind, &self.input))
    }

    /// Pipeline configuration for `kind` with these options applied
    pub fn to_config(&self, kind: DataKind) -> PipelineConfig {
        let mut config = PipelineConfig::for_kind(kind)
            .with_output_format(self.format)
            .with_compression(self.compression);
        if let Some(pattern) = &self.pattern {
            config = config.with_data_pattern(pattern.clone());
        }
        if let Some(pattern) = &self.summary_pattern {
            config = config.with_summary_pattern(pattern.clone());
        }
        if !self.sort_keys.is_empty() {
            config = config.with_sort_keys(self.sort_keys.clone());
        }
        if self.no_sort {
            config = config.without_sort();
        }
        config
    }

    /// Check arguments that clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_dir() {
            return Err(HotError::Configuration {
                message: format!("input directory {} does not exist", self.input.display()),
            });
        }
        if let Some(missing) = self.files.iter().find(|path| !path.is_file()) {
            return Err(HotError::Configuration {
                message: format!("data file {} does not exist", missing.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_niskin_arguments() {
        let args = Args::try_parse_from([
            "hot-processor",
            "niskin",
            "-i",
            "water",
            "-o",
            "niskin.csv",
            "--format-file",
            "water.format",
            "--sort-key",
            "cruise_name n",
            "--sort-key",
            "ROSETTE rn",
            "--summary-pattern",
            "*.summary",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.command.kind(), DataKind::Niskin);
        assert_eq!(args.command.format_file(), Some(&PathBuf::from("water.format")));
        let common = args.command.common();
        assert_eq!(common.get_log_level(), "debug");

        let config = common.to_config(DataKind::Niskin);
        assert_eq!(
            config.sort_keys,
            vec![
                SortKey::numeric("cruise_name"),
                SortKey::numeric("ROSETTE").reversed()
            ]
        );
        assert_eq!(config.summary_pattern, "*.summary");
        assert_eq!(common.output_path(DataKind::Niskin), PathBuf::from("niskin.csv"));
    }

    #[test]
    fn test_prim_prod_defaults() {
        let args =
            Args::try_parse_from(["hot-processor", "prim-prod", "-i", "/data/hot/pp", "-q"]).unwrap();
        let common = args.command.common();

        assert_eq!(args.command.kind(), DataKind::PrimaryProduction);
        assert_eq!(common.get_log_level(), "error");
        assert_eq!(
            common.output_path(DataKind::PrimaryProduction),
            PathBuf::from("/data/hot/prim_prod.csv")
        );

        let config = common.to_config(DataKind::PrimaryProduction);
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.summary_pattern, "hot*.sum");
        assert!(config.sort_output);
    }

    #[test]
    fn test_format_and_no_sort() {
        let args = Args::try_parse_from([
            "hot-processor",
            "flux",
            "-i",
            "flux",
            "--format",
            "parquet",
            "--compression",
            "zstd",
            "--no-sort",
            "--files",
            "a.flux",
            "b.flux",
        ])
        .unwrap();
        let common = args.command.common();
        let config = common.to_config(DataKind::ParticleFlux);

        assert_eq!(config.output_format, OutputFormat::Parquet);
        assert_eq!(config.compression, CompressionAlgorithm::Zstd);
        assert!(!config.sort_output);
        assert_eq!(common.files.len(), 2);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["hot-processor", "ctd", "-i", "ctd", "-q", "-v"]);
        assert!(result.is_err());
    }
}
