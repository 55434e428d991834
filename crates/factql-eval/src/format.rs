//! Output formatting
//!
//! Columns produced by the executor are rendered into one of six tabular
//! shapes. Row-wise layouts transpose the columns and suppress rows whose
//! values are all null (a group with no matching facts); columnar layouts
//! pass the columns through unchanged.

use crate::query::OutputFormat;
use factql_types::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The tabular result of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Rows as value tuples (`row_wise`)
    Rows(Vec<Vec<Value>>),
    /// Rows as header-to-value dicts (`row_wise_dicts`)
    RowDicts(Vec<IndexMap<String, Value>>),
    /// Rows as (headers, values) pairs (`row_wise_with_headers`)
    RowsWithHeaders(Vec<(Vec<String>, Vec<Value>)>),
    /// List of columns (`column_wise`)
    Columns(Vec<Vec<Value>>),
    /// Header-to-column dict (`column_wise_dicts`)
    ColumnDicts(IndexMap<String, Vec<Value>>),
    /// (headers, columns) pair (`column_wise_with_headers`)
    ColumnsWithHeaders {
        headers: Vec<String>,
        columns: Vec<Vec<Value>>,
    },
}

impl QueryOutput {
    /// Rows of a `row_wise` result
    pub fn as_rows(&self) -> Option<&[Vec<Value>]> {
        match self {
            Self::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Rows of a `row_wise_dicts` result
    pub fn as_row_dicts(&self) -> Option<&[IndexMap<String, Value>]> {
        match self {
            Self::RowDicts(rows) => Some(rows),
            _ => None,
        }
    }

    /// Number of rows (row-wise) or columns (column-wise)
    pub fn len(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::RowDicts(rows) => rows.len(),
            Self::RowsWithHeaders(rows) => rows.len(),
            Self::Columns(columns) => columns.len(),
            Self::ColumnDicts(columns) => columns.len(),
            Self::ColumnsWithHeaders { columns, .. } => columns.len(),
        }
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render headers and columns into the requested shape.
pub fn format_output(
    headers: Vec<String>,
    columns: Vec<Vec<Value>>,
    format: OutputFormat,
) -> QueryOutput {
    match format {
        OutputFormat::RowWise => QueryOutput::Rows(transpose(&columns)),
        OutputFormat::RowWiseDicts => QueryOutput::RowDicts(
            transpose(&columns)
                .into_iter()
                .map(|row| headers.iter().cloned().zip(row).collect())
                .collect(),
        ),
        OutputFormat::RowWiseWithHeaders => QueryOutput::RowsWithHeaders(
            transpose(&columns)
                .into_iter()
                .map(|row| (headers.clone(), row))
                .collect(),
        ),
        OutputFormat::ColumnWise => QueryOutput::Columns(columns),
        OutputFormat::ColumnWiseDicts => {
            QueryOutput::ColumnDicts(headers.into_iter().zip(columns).collect())
        }
        OutputFormat::ColumnWiseWithHeaders => {
            QueryOutput::ColumnsWithHeaders { headers, columns }
        }
    }
}

/// Transpose columns into rows, dropping rows whose values are all null.
/// The shortest column bounds the row count.
fn transpose(columns: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let row_count = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut rows = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let row: Vec<Value> = columns.iter().map(|column| column[i].clone()).collect();
        if row.iter().any(|v| !v.is_null()) {
            rows.push(row);
        }
    }
    rows
}
