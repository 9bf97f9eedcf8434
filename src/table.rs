//! Tabular assembly of decoded records.
//!
//! Per-file field series are concatenated into one column-oriented
//! [`CombinedTable`]. Every file is checked against the schema before its
//! columns are appended; a file with a different field set aborts the run
//! with a side-by-side listing of both field lists.

use crate::error::{HotError, Result};
use crate::models::{DataKind, FileRecordSet};
use polars::prelude::{Column, DataFrame};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Field names become column names with spaces replaced by underscores
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Column-oriented table of string values with equal-length columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedTable {
    columns: Vec<(String, Vec<String>)>,
    rows: usize,
}

impl CombinedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns, rejecting columns of unequal length
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> Result<Self> {
        let rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != rows) {
            return Err(HotError::RaggedTable {
                column: name.clone(),
                expected: rows,
                found: values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Append a column filled with a single value
    pub fn add_constant_column(&mut self, name: &str, value: &str) {
        let values = vec![value.to_string(); self.rows];
        match self.columns.iter_mut().find(|(column, _)| column == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<String>> {
        let position = self.columns.iter().position(|(column, _)| column == name)?;
        Some(self.columns.remove(position).1)
    }

    /// Drop every row whose value in `column` equals `value`; returns the number removed
    pub fn remove_rows_where(&mut self, column: &str, value: &str) -> usize {
        let Some(keep) = self
            .column(column)
            .map(|values| values.iter().map(|v| v != value).collect::<Vec<bool>>())
        else {
            return 0;
        };

        for (_, values) in self.columns.iter_mut() {
            let mut flags = keep.iter();
            values.retain(|_| *flags.next().unwrap_or(&true));
        }
        let removed = keep.iter().filter(|flag| !**flag).count();
        self.rows -= removed;
        removed
    }

    /// Order columns by byte-wise name comparison
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    /// Stable multi-key row sort.
    ///
    /// Keys naming a column the table does not have are skipped with a warning.
    pub fn sort_rows(&mut self, keys: &[SortKey]) {
        let resolved: Vec<(&SortKey, &[String])> = keys
            .iter()
            .filter_map(|key| match self.column(&key.column) {
                Some(values) => Some((key, values)),
                None => {
                    warn!("Sort key column {} is not in the table; skipping it", key.column);
                    None
                }
            })
            .collect();
        if resolved.is_empty() || self.rows < 2 {
            return;
        }

        let mut order: Vec<usize> = (0..self.rows).collect();
        order.sort_by(|&a, &b| {
            resolved
                .iter()
                .map(|(key, values)| key.compare(&values[a], &values[b]))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        for (_, values) in self.columns.iter_mut() {
            let sorted: Vec<String> = order
                .iter()
                .map(|&row| std::mem::take(&mut values[row]))
                .collect();
            *values = sorted;
        }
    }

    /// Convert to a polars frame of string columns.
    ///
    /// Empty values become nulls so the CSV writer emits an empty field
    /// rather than `""`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|(name, values)| {
                let values: Vec<Option<&str>> = values
                    .iter()
                    .map(|value| (!value.is_empty()).then_some(value.as_str()))
                    .collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

/// One sort key: a column compared numerically or lexically, optionally reversed.
///
/// Written as `column`, `column n`, `column r` or `column rn`, the way key
/// modifiers are written for `sort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey {
    pub column: String,
    pub numeric: bool,
    pub reverse: bool,
}

impl SortKey {
    pub fn lexical(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            numeric: false,
            reverse: false,
        }
    }

    pub fn numeric(column: impl Into<String>) -> Self {
        Self {
            numeric: true,
            ..Self::lexical(column)
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Compare two field values; leading blanks are ignored
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let (a, b) = (a.trim_start(), b.trim_start());
        let ordering = if self.numeric {
            leading_number(a)
                .partial_cmp(&leading_number(b))
                .unwrap_or(Ordering::Equal)
        } else {
            a.as_bytes().cmp(b.as_bytes())
        };
        if self.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Numeric value of the leading number in `text`; text without one sorts as zero
fn leading_number(text: &str) -> f64 {
    let mut end = 0;
    let mut seen_point = false;
    for (index, c) in text.char_indices() {
        match c {
            '-' if index == 0 => {}
            '0'..='9' => {}
            '.' if !seen_point => seen_point = true,
            _ => break,
        }
        end = index + c.len_utf8();
    }
    text[..end].parse().unwrap_or(0.0)
}

impl FromStr for SortKey {
    type Err = HotError;

    fn from_str(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let column = parts.next().ok_or_else(|| HotError::Configuration {
            message: "empty sort key".to_string(),
        })?;
        let mut key = SortKey::lexical(column);
        if let Some(modifiers) = parts.next() {
            for modifier in modifiers.chars() {
                match modifier {
                    'n' => key.numeric = true,
                    'r' => key.reverse = true,
                    other => {
                        return Err(HotError::Configuration {
                            message: format!("unknown sort modifier {:?} in {:?}", other, text),
                        });
                    }
                }
            }
        }
        if parts.next().is_some() {
            return Err(HotError::Configuration {
                message: format!("sort key {:?} has trailing text", text),
            });
        }
        Ok(key)
    }
}

impl TryFrom<String> for SortKey {
    type Error = HotError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = match (self.reverse, self.numeric) {
            (false, false) => "",
            (false, true) => " n",
            (true, false) => " r",
            (true, true) => " rn",
        };
        write!(f, "{}{}", self.column, modifiers)
    }
}

/// Side-by-side listing of two field lists, one pair per line
pub fn schema_diff(master_file: &str, master: &[String], file: &str, fields: &[String]) -> String {
    let mut lines = vec![
        format!("{:<20}{:<20}", master_file, file),
        "=".repeat(32),
    ];
    for row in 0..master.len().max(fields.len()) {
        lines.push(format!(
            "{:<20}{:<20}",
            master.get(row).map(String::as_str).unwrap_or(""),
            fields.get(row).map(String::as_str).unwrap_or("")
        ));
    }
    lines.join("\n")
}

/// Concatenates record sets of one kind into a [`CombinedTable`]
#[derive(Debug)]
pub struct TableAssembler {
    kind: DataKind,
    /// Source of the reference schema and its normalized field names
    schema: Option<(String, Vec<String>)>,
    columns: Vec<(String, Vec<String>)>,
    rows: usize,
}

impl TableAssembler {
    pub fn new(kind: DataKind) -> Self {
        Self {
            kind,
            schema: None,
            columns: Vec::new(),
            rows: 0,
        }
    }

    /// Validate every file against a declared field list instead of the first file
    pub fn with_declared_schema(mut self, fields: Vec<String>) -> Self {
        let fields = fields.iter().map(|name| normalize_name(name)).collect();
        self.schema = Some((format!("declared {} schema", self.kind), fields));
        self
    }

    /// Check a record set against the schema and append its columns
    pub fn append(&mut self, record_set: FileRecordSet) -> Result<()> {
        let names: Vec<String> = record_set
            .fields()
            .iter()
            .map(|series| normalize_name(&series.name))
            .collect();

        match &self.schema {
            Some((master_file, master)) => {
                if !same_fields(master, &names) {
                    return Err(HotError::SchemaMismatch {
                        kind: self.kind,
                        master_file: master_file.clone(),
                        file: record_set.source_name.clone(),
                        diff: schema_diff(master_file, master, &record_set.source_name, &names),
                    });
                }
            }
            None => {
                debug!(
                    "Using {} as the {} field schema",
                    record_set.source_name, self.kind
                );
                self.schema = Some((record_set.source_name.clone(), names.clone()));
            }
        }

        if self.columns.is_empty() {
            let order = self.schema.as_ref().map(|(_, names)| names.clone()).unwrap_or(names);
            self.columns = order.into_iter().map(|name| (name, Vec::new())).collect();
        }

        let added = record_set.row_count();
        for series in record_set.into_fields() {
            let name = normalize_name(&series.name);
            if let Some((_, values)) = self.columns.iter_mut().find(|(column, _)| *column == name) {
                values.extend(series.values);
            }
        }
        self.rows += added;
        Ok(())
    }

    pub fn finish(self) -> Result<CombinedTable> {
        let table = CombinedTable::from_columns(self.columns)?;
        if table.row_count() != self.rows {
            return Err(HotError::RaggedTable {
                column: table.column_names().first().map(|s| s.to_string()).unwrap_or_default(),
                expected: self.rows,
                found: table.row_count(),
            });
        }
        Ok(table)
    }
}

fn same_fields(master: &[String], fields: &[String]) -> bool {
    let mut a: Vec<&String> = master.iter().collect();
    let mut b: Vec<&String> = fields.iter().collect();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSeries;
    use std::path::PathBuf;

    fn record_set(name: &str, columns: &[(&str, &[&str])]) -> FileRecordSet {
        let rows = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        let fields = columns
            .iter()
            .map(|(column, values)| {
                let mut series = FieldSeries::new(*column);
                series.values = values.iter().map(|v| v.to_string()).collect();
                series
            })
            .collect();
        FileRecordSet::new(
            DataKind::Niskin,
            PathBuf::from(name),
            name.to_string(),
            Vec::new(),
            fields,
            rows,
        )
        .unwrap()
    }

    fn column(table: &CombinedTable, name: &str) -> Vec<String> {
        table.column(name).unwrap().to_vec()
    }

    #[test]
    fn test_files_are_concatenated_in_order() {
        let mut assembler = TableAssembler::new(DataKind::Niskin);
        assembler
            .append(record_set("hot1.gof", &[("Station Number", &["1", "1"]), ("B", &["x", "y"])]))
            .unwrap();
        assembler
            .append(record_set("hot2.gof", &[("B", &["z"]), ("Station Number", &["2"])]))
            .unwrap();
        let table = assembler.finish().unwrap();

        assert_eq!(table.column_names(), vec!["Station_Number", "B"]);
        assert_eq!(column(&table, "Station_Number"), vec!["1", "1", "2"]);
        assert_eq!(column(&table, "B"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_schema_mismatch_lists_both_sides() {
        let mut assembler = TableAssembler::new(DataKind::Niskin);
        assembler
            .append(record_set("hot1.gof", &[("A", &["1"]), ("B", &["2"])]))
            .unwrap();
        let result = assembler.append(record_set("hot2.gof", &[("A", &["1"]), ("C", &["2"]), ("D", &["3"])]));

        match result {
            Err(HotError::SchemaMismatch {
                master_file,
                file,
                diff,
                ..
            }) => {
                assert_eq!(master_file, "hot1.gof");
                assert_eq!(file, "hot2.gof");
                assert!(diff.starts_with("hot1.gof"));
                assert!(diff.contains("B"));
                assert!(diff.contains("C"));
                assert!(diff.contains("D"));
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_declared_schema_rejects_first_file() {
        let mut assembler = TableAssembler::new(DataKind::ParticleFlux)
            .with_declared_schema(vec!["Cruise".to_string(), "Depth".to_string()]);
        let result = assembler.append(record_set("hot1.flux", &[("Cruise", &["1"])]));
        assert!(matches!(result, Err(HotError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_ragged_columns_are_rejected() {
        let result = CombinedTable::from_columns(vec![
            ("A".to_string(), vec!["1".to_string(), "2".to_string()]),
            ("B".to_string(), vec!["1".to_string()]),
        ]);
        assert!(matches!(result, Err(HotError::RaggedTable { .. })));
    }

    #[test]
    fn test_remove_rows_and_constant_columns() {
        let mut table = CombinedTable::from_columns(vec![
            ("Ship".to_string(), vec!["A".into(), "MISSING".into(), "B".into()]),
            ("v".to_string(), vec!["1".into(), "2".into(), "3".into()]),
        ])
        .unwrap();

        assert_eq!(table.remove_rows_where("Ship", "MISSING"), 1);
        table.add_constant_column("lat", "22.75");

        assert_eq!(table.row_count(), 2);
        assert_eq!(column(&table, "v"), vec!["1", "3"]);
        assert_eq!(column(&table, "lat"), vec!["22.75", "22.75"]);
    }

    #[test]
    fn test_multi_key_sort() {
        let mut table = CombinedTable::from_columns(vec![
            ("cruise".to_string(), vec!["10".into(), " 9".into(), "10".into(), "9".into()]),
            ("rosette".to_string(), vec!["1".into(), "5".into(), "12".into(), "7".into()]),
            ("tag".to_string(), vec!["a".into(), "b".into(), "c".into(), "d".into()]),
        ])
        .unwrap();

        table.sort_rows(&[
            SortKey::numeric("cruise"),
            SortKey::numeric("rosette").reversed(),
            SortKey::lexical("missing"),
        ]);

        assert_eq!(column(&table, "tag"), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_lexical_sort_skips_leading_blanks_and_is_stable() {
        let mut table = CombinedTable::from_columns(vec![
            ("k".to_string(), vec!["  b".into(), "a".into(), "b".into()]),
            ("tag".to_string(), vec!["1".into(), "2".into(), "3".into()]),
        ])
        .unwrap();
        table.sort_rows(&[SortKey::lexical("k")]);
        assert_eq!(column(&table, "tag"), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("ROSETTE rn".parse::<SortKey>().unwrap(), SortKey::numeric("ROSETTE").reversed());
        assert_eq!("start_date_time".parse::<SortKey>().unwrap(), SortKey::lexical("start_date_time"));
        assert!("Depth x".parse::<SortKey>().is_err());
        assert_eq!(SortKey::numeric("Cruise").to_string(), "Cruise n");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("12.5abc"), 12.5);
        assert_eq!(leading_number("-3"), -3.0);
        assert_eq!(leading_number("x"), 0.0);
        assert_eq!(leading_number(""), 0.0);
    }

    #[test]
    fn test_columns_sort_alphabetically() {
        let mut table = CombinedTable::from_columns(vec![
            ("lat".to_string(), vec![]),
            ("CTDPRS".to_string(), vec![]),
            ("Ship".to_string(), vec![]),
        ])
        .unwrap();
        table.sort_columns();
        assert_eq!(table.column_names(), vec!["CTDPRS", "Ship", "lat"]);
    }

    #[test]
    fn test_to_dataframe_shape() {
        let table = CombinedTable::from_columns(vec![
            ("a".to_string(), vec!["1".into(), "2".into()]),
            ("b".to_string(), vec!["x".into(), "y".into()]),
        ])
        .unwrap();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_empty_values_become_nulls() {
        let table = CombinedTable::from_columns(vec![
            ("Cruise".to_string(), vec!["1".into(), "2".into()]),
            ("PIC".to_string(), vec!["".into(), " 0.5".into()]),
        ])
        .unwrap();
        let df = table.to_dataframe().unwrap();
        let pic = df.column("PIC").unwrap();
        assert_eq!(pic.null_count(), 1);
        assert_eq!(df.column("Cruise").unwrap().null_count(), 0);
    }
}
