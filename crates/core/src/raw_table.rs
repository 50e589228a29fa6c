use serde::{Deserialize, Serialize};

/// A single cell. `None` marks a missing value (blank CSV field, padded OCR cell).
pub type Cell = Option<String>;

/// Untyped rectangular table as read from a statement, before any column
/// semantics are known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a table with positional `col_0`, `col_1`, … names.
    ///
    /// The width is that of the widest row: shorter rows are right-padded with
    /// missing cells, longer ones truncated.
    pub fn positional<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let rows: Vec<Vec<Cell>> = rows.into_iter().collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table = Self::new((0..width).map(|i| format!("col_{i}")).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(col).and_then(|c| c.as_deref()))
    }
}

/// Trimmed cell value, or `None` for a blank field.
pub fn cell(value: &str) -> Cell {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
