//! Record tables for tabular reporting.
//!
//! A [`Table`] is an ordered set of named columns over rows of JSON values.
//! It is only as clever as reporting needs: build from records, add a
//! constant column, project, concatenate and render.

use crate::error::{AmlError, Result};
use crate::flatten::Row;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt::{self, Write};

/// Column-ordered table of JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from records. Columns appear in first-seen order and
    /// cells missing from a record are null.
    pub fn from_records<I: IntoIterator<Item = Row>>(records: I) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Append a record, adding any new columns.
    pub fn push_record(&mut self, mut record: Row) {
        for key in record.keys() {
            self.ensure_column(key);
        }
        let row = self
            .columns
            .iter()
            .map(|c| record.shift_remove(c).unwrap_or(Value::Null))
            .collect();
        self.rows.push(row);
    }

    fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
            for row in &mut self.rows {
                row.push(Value::Null);
            }
        }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, each aligned with [`columns`](Self::columns).
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rows as ordered records.
    #[must_use]
    pub fn records(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    /// Set every cell of `name` to `value`, adding the column if needed.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        match self.columns.iter().position(|c| *c == name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    /// Project onto `columns`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown column.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| AmlError::not_found("column", name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Stack tables vertically, unioning their columns.
    pub fn concat<I: IntoIterator<Item = Self>>(tables: I) -> Self {
        let mut out = Self::default();
        for table in tables {
            for column in &table.columns {
                out.ensure_column(column);
            }
            for record in table.records() {
                out.push_record(record);
            }
        }
        out
    }

    /// Render as aligned text.
    #[must_use]
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        push_line(&mut out, self.columns.iter().map(String::as_str), &widths);
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let _ = writeln!(out, "{}", "-".repeat(total));
        for row in &cells {
            push_line(&mut out, row.iter().map(String::as_str), &widths);
        }
        out
    }
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (i, (text, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let _ = write!(line, "{text:<width$}");
    }
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Display text for a single cell.
#[must_use]
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for record in self.records() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}
