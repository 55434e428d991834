//! Query specification
//!
//! [`QuerySpec`] is the declarative input to the executor: a select clause
//! in one of three equivalent surface forms, filters, group-by clauses and
//! output configuration.

use factql_ast::Expr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How expression-derived headers are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderDisplay {
    /// Human label resolved through the evaluator, falling back to the
    /// raw identifier
    #[default]
    Label,
    /// Raw identifier
    Name,
    /// Compact expression representation
    Repr,
}

/// Output shape, carrying layout (row- or column-wise) and flavor
/// (tuples, dicts, or header-paired).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Rows as value tuples
    RowWise,
    /// Rows as header-to-value dicts (the default)
    #[default]
    RowWiseDicts,
    /// Rows as (headers, values) pairs
    RowWiseWithHeaders,
    /// List of columns
    ColumnWise,
    /// Header-to-column dict
    ColumnWiseDicts,
    /// (headers, columns) pair
    ColumnWiseWithHeaders,
}

impl OutputFormat {
    /// Check if this format lays rows out one by one
    pub const fn is_row_wise(&self) -> bool {
        matches!(
            self,
            Self::RowWise | Self::RowWiseDicts | Self::RowWiseWithHeaders
        )
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row_wise" => Ok(Self::RowWise),
            "row_wise_dicts" => Ok(Self::RowWiseDicts),
            "row_wise_with_headers" => Ok(Self::RowWiseWithHeaders),
            "column_wise" => Ok(Self::ColumnWise),
            "column_wise_dicts" => Ok(Self::ColumnWiseDicts),
            "column_wise_with_headers" => Ok(Self::ColumnWiseWithHeaders),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// One entry of a list-form select clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectItem {
    /// `(header, expression)` pair
    Named(String, Expr),
    /// Bare expression; the header comes from the parallel `headers` list
    /// or from the expression's own display form
    Bare(Expr),
}

/// The select clause in one of its equivalent surface forms.
///
/// All forms normalize to the same `(headers, expressions)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Select {
    /// Ordered header-to-expression mapping
    Map(IndexMap<String, Expr>),
    /// List of pairs or bare expressions
    Items(Vec<SelectItem>),
}

impl From<Vec<Expr>> for Select {
    fn from(exprs: Vec<Expr>) -> Self {
        Self::Items(exprs.into_iter().map(SelectItem::Bare).collect())
    }
}

impl From<Vec<SelectItem>> for Select {
    fn from(items: Vec<SelectItem>) -> Self {
        Self::Items(items)
    }
}

impl From<IndexMap<String, Expr>> for Select {
    fn from(map: IndexMap<String, Expr>) -> Self {
        Self::Map(map)
    }
}

impl From<Vec<(&str, Expr)>> for Select {
    fn from(pairs: Vec<(&str, Expr)>) -> Self {
        Self::Items(
            pairs
                .into_iter()
                .map(|(h, e)| SelectItem::Named(h.to_string(), e))
                .collect(),
        )
    }
}

/// A column header: literal text, or an expression rendered at format time.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Text(String),
    Expr(Expr),
}

/// A declarative query over a fact collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Output columns
    pub select: Select,
    /// Positional headers for bare select entries
    #[serde(default)]
    pub headers: Vec<Option<String>>,
    /// Filters applied per fact set
    #[serde(default)]
    pub where_clauses: Vec<Expr>,
    /// Primary group-by; defaults to the context-id property
    #[serde(default)]
    pub context_group_by: Option<Vec<Expr>>,
    /// Secondary group-by for aggregate queries
    #[serde(default)]
    pub group_by: Vec<Expr>,
    /// Filters applied per fact-set list in aggregate queries
    #[serde(default)]
    pub having: Vec<Expr>,
    /// How expression-derived headers are rendered
    #[serde(default)]
    pub header_display: HeaderDisplay,
    /// Output shape
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl QuerySpec {
    /// Create a query returning the given columns
    pub fn new(select: impl Into<Select>) -> Self {
        Self {
            select: select.into(),
            headers: Vec::new(),
            where_clauses: Vec::new(),
            context_group_by: None,
            group_by: Vec::new(),
            having: Vec::new(),
            header_display: HeaderDisplay::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Set positional headers for bare select entries
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(|h| Some(h.into())).collect();
        self
    }

    /// Set the where clause
    pub fn with_where(mut self, exprs: Vec<Expr>) -> Self {
        self.where_clauses = exprs;
        self
    }

    /// Add one where filter
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_clauses.push(expr);
        self
    }

    /// Override the primary group-by
    pub fn with_context_group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.context_group_by = Some(exprs);
        self
    }

    /// Set the secondary group-by
    pub fn with_group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Set the having clause
    pub fn with_having(mut self, exprs: Vec<Expr>) -> Self {
        self.having = exprs;
        self
    }

    /// Set the header rendering mode
    pub fn with_header_display(mut self, display: HeaderDisplay) -> Self {
        self.header_display = display;
        self
    }

    /// Set the output shape
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Normalize the select clause to parallel header and expression lists.
    ///
    /// The three surface forms (mapping, pair list, bare list with
    /// positional headers) all produce the same result here.
    pub fn normalized_select(&self) -> (Vec<Header>, Vec<Expr>) {
        match &self.select {
            Select::Map(map) => {
                let headers = map.keys().map(|h| Header::Text(h.clone())).collect();
                let exprs = map.values().cloned().collect();
                (headers, exprs)
            }
            Select::Items(items) => {
                let mut headers = Vec::with_capacity(items.len());
                let mut exprs = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        SelectItem::Named(header, expr) => {
                            headers.push(Header::Text(header.clone()));
                            exprs.push(expr.clone());
                        }
                        SelectItem::Bare(expr) => {
                            match self.headers.get(i).and_then(|h| h.clone()) {
                                Some(header) => headers.push(Header::Text(header)),
                                None => headers.push(Header::Expr(expr.clone())),
                            }
                            exprs.push(expr.clone());
                        }
                    }
                }
                (headers, exprs)
            }
        }
    }
}
