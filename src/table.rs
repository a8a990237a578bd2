//! In-memory tabular data shared by the aggregator, the formatter and the
//! master merge.

use crate::error::{ReportError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fmt;
use std::path::Path;

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text content, if this cell holds text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric value used for ordering. Blank and non-numeric cells count as zero.
    pub fn as_sort_key(&self) -> f64 {
        match self {
            Cell::Number(n) if !n.is_nan() => *n,
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| !n.is_nan())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A rectangular table with named columns. Every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `(row, column name)`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Rename columns in place; names not present are ignored.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for column in self.columns.iter_mut() {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == column.as_str()) {
                *column = (*to).to_string();
            }
        }
    }

    /// Row-wise concatenation aligned by column name.
    ///
    /// The result keeps this table's column order, followed by any columns
    /// only `other` has. Cells for columns a table lacks are blank. Two tables
    /// with identical columns simply stack.
    pub fn concat(&self, other: &ReportTable) -> ReportTable {
        let mut columns = self.columns.clone();
        for name in &other.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        if columns.len() != self.columns.len() || columns.len() != other.columns.len() {
            log::debug!(
                "Merging tables with different schemas ({} vs {} columns)",
                self.columns.len(),
                other.columns.len()
            );
        }

        let mut merged = ReportTable::new(columns);
        for source in [self, other] {
            let mapping: Vec<Option<usize>> = merged
                .columns
                .iter()
                .map(|name| source.column_index(name))
                .collect();
            for row in &source.rows {
                let aligned = mapping
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                    .collect();
                merged.rows.push(aligned);
            }
        }
        merged
    }

    /// Read the first sheet of a workbook; the first row is the header.
    pub fn from_workbook(path: &Path) -> Result<ReportTable> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?;
        let columns = header.iter().map(|c| Cell::from(c).to_string()).collect();

        let mut table = ReportTable::new(columns);
        for row in rows {
            table.push_row(row.iter().map(Cell::from).collect());
        }
        Ok(table)
    }
}
