//! Table data and the JSON input document

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::RendererResult;
use crate::json_helpers::{get_array_or_empty, get_object_opt, get_str_opt, value_to_text};
use crate::settings::Limits;

/// A header row plus a matrix of data rows, all cells already stringified
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableData {
    pub name: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Build a table, fitting every row to the header length
    pub fn new<H, R, C>(header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| fit_row(row.into_iter().map(Into::into).collect(), header.len()))
            .collect();
        Self { name: None, header, rows }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Nothing to draw without a header and at least one row
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() || self.rows.is_empty()
    }

    /// Truncate columns and rows to the configured limits
    pub fn truncated(mut self, limits: &Limits) -> Self {
        self.header.truncate(limits.cols);
        self.rows.truncate(limits.rows);
        let cols = self.header.len();
        for row in &mut self.rows {
            row.truncate(cols);
        }
        self
    }

    /// Cells of column `col`, header first
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> {
        self.header
            .get(col)
            .into_iter()
            .chain(self.rows.iter().filter_map(move |row| row.get(col)))
            .map(String::as_str)
    }
}

fn fit_row(mut row: Vec<String>, len: usize) -> Vec<String> {
    row.resize(len, String::new());
    row
}

/// A parsed input document: table data plus its raw `settings` block
#[derive(Debug, Clone, Default)]
pub struct TableDocument {
    pub data: TableData,
    pub settings: Option<Value>,
}

impl TableDocument {
    /// Interpret a JSON value shaped like `{tableName, header, data, settings}`
    pub fn from_value(doc: &Value) -> Self {
        let header: Vec<String> = get_array_or_empty(doc, "header")
            .iter()
            .map(value_to_text)
            .collect();
        let rows = get_array_or_empty(doc, "data")
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(value_to_text).collect(),
                scalar => vec![value_to_text(scalar)],
            })
            .map(|row| fit_row(row, header.len()))
            .collect();

        Self {
            data: TableData {
                name: get_str_opt(doc, "tableName").map(str::to_string),
                header,
                rows,
            },
            settings: get_object_opt(doc, "settings").cloned(),
        }
    }

    pub fn from_json_str(json: &str) -> RendererResult<Self> {
        let doc: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&doc))
    }

    pub fn load(path: &Path) -> RendererResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
