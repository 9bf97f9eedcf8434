//! Pipeline tests for the processor module
//!
//! Each test builds a miniature HOT directory tree (a data directory beside
//! `cruise.summaries/`) and runs one pipeline end to end.

pub mod ctd_pipeline;
pub mod fixed_layout_pipeline;

use crate::summary::tests::SUMMARY_HEADER;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A data directory and its sibling summary directory inside a temp dir
pub struct HotFixture {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub summary_dir: PathBuf,
}

impl HotFixture {
    pub fn new(data_dir_name: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join(data_dir_name);
        let summary_dir = temp_dir.path().join("cruise.summaries");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(&summary_dir).unwrap();
        Self {
            temp_dir,
            data_dir,
            summary_dir,
        }
    }

    /// Write a file below the data directory, creating subdirectories
    pub fn write_data(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.data_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write a summary file from rows built with `summary_row`
    pub fn write_summary(&self, name: &str, rows: &[String]) -> PathBuf {
        let mut text = SUMMARY_HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        let path = self.summary_dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

/// Output lines of a written text file
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Value of `column` in a comma-separated data line, given the header line
pub fn cell<'a>(header: &str, line: &'a str, column: &str) -> &'a str {
    let index = header
        .split(',')
        .position(|name| name == column)
        .unwrap_or_else(|| panic!("column {} not in header {}", column, header));
    line.split(',').nth(index).unwrap()
}
