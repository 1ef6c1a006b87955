//! In-memory CSV tables

use crate::{write_atomic, StoreError};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Byte-order mark written at the start of every table file
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A header row plus string cells, every row as wide as the header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Column names in order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append a row, padding short rows with empty cells
    ///
    /// Cells beyond the header width are dropped.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() > self.headers.len() {
            debug!(
                cells = row.len(),
                columns = self.headers.len(),
                "Dropping cells beyond the header"
            );
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Cell value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Number of cells in `column` that are non-blank after trimming
    pub fn filled_count(&self, column: &str) -> Option<usize> {
        let index = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .filter(|row| !row[index].trim().is_empty())
                .count(),
        )
    }

    /// Share of non-blank cells in `column`, between 0.0 and 1.0
    ///
    /// An empty table has a fill rate of 0.0 for every column.
    pub fn fill_rate(&self, column: &str) -> Option<f64> {
        let filled = self.filled_count(column)?;
        if self.rows.is_empty() {
            return Some(0.0);
        }
        Some(filled as f64 / self.rows.len() as f64)
    }

    /// Concatenate tables row-wise
    ///
    /// Columns are the union of all headers in first-seen order; rows
    /// missing a column get an empty cell.
    pub fn concat<'a, I>(tables: I) -> Table
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let tables: Vec<&Table> = tables.into_iter().collect();

        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut combined = Table::new(headers);
        for table in tables {
            let mapping: Vec<Option<usize>> = combined
                .headers
                .iter()
                .map(|h| table.column_index(h))
                .collect();
            for row in &table.rows {
                let projected = mapping
                    .iter()
                    .map(|index| index.map(|i| row[i].clone()).unwrap_or_default())
                    .collect();
                combined.rows.push(projected);
            }
        }
        combined
    }

    /// Keep only the rows at `indices`, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Stable sort by the given columns; unknown columns are ignored
    pub fn sort_by_columns(&mut self, columns: &[&str]) {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        if indices.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            indices
                .iter()
                .map(|&i| a[i].cmp(&b[i]))
                .find(|ord| ord.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Read a CSV file, with or without a leading BOM
    ///
    /// Ragged rows are accepted and padded to the header width.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record.map_err(|e| StoreError::csv(path, e))?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        debug!(path = %path.display(), rows = table.len(), "Table loaded");
        Ok(table)
    }

    /// Write the table as UTF-8 CSV with a BOM, replacing any existing file
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();

        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
        writer
            .write_record(&self.headers)
            .map_err(|e| StoreError::csv(path, e))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| StoreError::csv(path, e))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::io(path, e.into_error()))?;

        write_atomic(path, &bytes)?;
        debug!(path = %path.display(), rows = self.len(), "Table written");
        Ok(())
    }
}
