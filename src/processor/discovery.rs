//! File discovery for HOT data directories
//!
//! Lists data files and cruise summary files by glob pattern. Results are
//! sorted so that the reference schema and row order do not depend on the
//! order the file system returns entries in.

use crate::error::{HotError, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// File discovery component for one input directory
#[derive(Debug)]
pub struct FileDiscovery {
    root: PathBuf,
    recursive: bool,
}

impl FileDiscovery {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            recursive: false,
        }
    }

    /// Also search subdirectories, e.g. the per-cruise `hot-N/` directories of CTD data
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Files whose name matches `pattern`, sorted by path
    pub fn discover(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(HotError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input directory {} does not exist", self.root.display()),
            )));
        }

        let pattern = Pattern::new(pattern)?;
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(1)
            .max_depth(max_depth)
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if pattern.matches_with(&name, MATCH_OPTIONS) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        debug!(
            "Found {} files matching {} under {}",
            files.len(),
            pattern,
            self.root.display()
        );
        Ok(files)
    }

    /// Display name of a file relative to the discovery root; files outside
    /// the root are named by their file name alone
    pub fn relative_name(&self, path: &Path) -> String {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => path.file_name().map(Path::new).unwrap_or(path),
        };
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// Default summary directory: `cruise.summaries` beside the data directory
pub fn default_summary_dir(input: &Path) -> PathBuf {
    let parent = input
        .canonicalize()
        .ok()
        .and_then(|dir| dir.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| input.join(".."));
    parent.join(crate::constants::SUMMARY_DIR_NAME)
}
