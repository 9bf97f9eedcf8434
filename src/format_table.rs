//! Niskin format table parsing.
//!
//! The bottle data layout is described in a free-text reference document.
//! Its "Data Record Format" section starts at a line containing
//! `Column  Format` and continues with one line per field:
//!
//! ```text
//!         Column  Format  Item
//!           1-  8   i6    Station Number
//!           9- 16   i3    Cast Number
//! ```
//!
//! Column ranges are 1-based and inclusive; they are stored 0-based and
//! half-open so they can be used directly by the decoder.

use crate::constants::FORMAT_TABLE_ANCHOR;
use crate::error::{HotError, Result};
use crate::models::ByteRange;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Declared type of a column, e.g. `i6` or `f8.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub kind: char,
    pub width: String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// Free-text item label, e.g. "Station Number"
    pub label: String,
    pub range: ByteRange,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTable {
    entries: Vec<FormatEntry>,
}

fn table_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*-\s*(\d+)\s+([A-Za-z])(\S*)\s+(\S.*?)\s*$")
            .expect("format table pattern is valid")
    })
}

impl FormatTable {
    /// Load the table from a reference document on disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let table = Self::parse(&text, path)?;
        debug!(
            "Loaded {} format entries from {}",
            table.entries.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse the table from document text; `path` is only used in errors
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines().enumerate();

        if !lines
            .by_ref()
            .any(|(_, line)| line.trim().contains(FORMAT_TABLE_ANCHOR))
        {
            return Err(HotError::FormatTable {
                path: path.to_path_buf(),
                reason: format!("no line containing {:?}", FORMAT_TABLE_ANCHOR),
            });
        }

        let mut table = FormatTable::default();
        for (index, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let entry = parse_table_line(line).ok_or_else(|| HotError::MalformedFormatLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            })?;
            table.insert(entry);
        }

        if table.is_empty() {
            return Err(HotError::FormatTable {
                path: path.to_path_buf(),
                reason: "no column entries after the table heading".to_string(),
            });
        }

        Ok(table)
    }

    /// Insert an entry; a repeated label replaces the earlier definition in place
    pub fn insert(&mut self, entry: FormatEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.label == entry.label)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&FormatEntry> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_table_line(line: &str) -> Option<FormatEntry> {
    let captures = table_line_pattern().captures(line)?;
    let first: usize = captures[1].parse().ok()?;
    let last: usize = captures[2].parse().ok()?;
    if first == 0 || last < first {
        return None;
    }

    Some(FormatEntry {
        label: captures[5].to_string(),
        range: ByteRange::new(first - 1, last),
        field_type: FieldType {
            kind: captures[3].chars().next()?,
            width: captures[4].to_string(),
        },
    })
}
