//! The evaluator interface
//!
//! The engine never parses the underlying document format or resolves
//! domain metadata itself; everything domain-specific goes through this
//! trait. An adapter is read-only: all methods take `&self`, and the
//! engine makes no write calls.

use crate::fact::FactId;
use chrono::{NaiveDate, NaiveDateTime};
use factql_types::{PeriodFormats, Value};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors an evaluator adapter can raise while resolving identifiers.
///
/// Plain "no value" cases are `None` returns, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    /// A bare identifier resolved to more than one underlying concept
    #[error("ambiguous identifier {name}: matches {candidates:?}")]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },

    /// Adapter-internal failure
    #[error("evaluator error: {message}")]
    Internal { message: String },
}

impl EvaluatorError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// The capability set the query executor requires from a domain adapter.
///
/// Methods that resolve identifiers return `Result` because resolution can
/// be ambiguous; per-fact accessors return `Option`, where `None` means
/// "no value". The `fact` parameter of the concept-family methods may be
/// `None`, in which case the adapter resolves the bare `name` against its
/// own metadata (e.g. to label a concept no fact reports).
pub trait Evaluator {
    /// All facts, or all facts of one concept
    fn facts(&self, concept: Option<&str>) -> Result<Vec<FactId>, EvaluatorError>;

    /// Resolve a relative fiscal-year offset (0 = current, negative = that
    /// many years back) to an absolute year; positive offsets pass through
    fn year(&self, offset: i32) -> Option<i32>;

    /// Opaque concept reference (adapter-defined encoding)
    fn concept(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
    ) -> Result<Option<Value>, EvaluatorError>;

    /// Canonical concept identifier
    fn concept_name(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError>;

    /// Human concept label for a role
    fn concept_label(
        &self,
        fact: Option<FactId>,
        name: Option<&str>,
        role: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError>;

    /// Typed value of a fact, falling back to `default`
    fn concept_value(&self, fact: Option<FactId>, default: Option<&Value>) -> Option<Value>;

    /// Member reference on one dimensional axis, optionally falling back to
    /// the axis's declared default member
    fn dim_member(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
    ) -> Result<Option<Value>, EvaluatorError>;

    /// Member identifier on one axis (explicit members only)
    fn dim_member_name(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
    ) -> Result<Option<String>, EvaluatorError>;

    /// Member label on one axis
    fn dim_member_label(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
        role: Option<&str>,
    ) -> Result<Option<String>, EvaluatorError>;

    /// Member identifier for explicit members, typed value otherwise
    fn dim_member_value(
        &self,
        fact: FactId,
        axis: &str,
        include_defaults: bool,
        role: Option<&str>,
    ) -> Result<Option<Value>, EvaluatorError>;

    /// Axis identifiers present on a fact's context
    fn dim_axes(&self, fact: FactId) -> BTreeSet<String>;

    /// Period as a value: instant datetime, `[start, end]` list, or the
    /// supplied `forever` value for unbounded periods
    fn period(&self, fact: FactId, forever: Option<&Value>) -> Option<Value>;

    /// Period formatted as text
    fn period_str(&self, fact: FactId, formats: &PeriodFormats) -> Option<String>;

    /// Period start datetime
    fn start_datetime(&self, fact: FactId) -> Option<NaiveDateTime>;

    /// Period end datetime
    fn end_datetime(&self, fact: FactId) -> Option<NaiveDateTime>;

    /// Inclusive period end date
    fn end_date(&self, fact: FactId) -> Option<NaiveDate>;

    /// Fiscal year of the period end
    fn fiscal_year(&self, fact: FactId) -> Option<i32>;

    /// Context identifier; the default primary grouping key
    fn context_id(&self, fact: FactId) -> Option<String>;

    /// Grouping key that is stable for facts whose contexts differ only in
    /// period-type classification but not in the period's value
    fn context_hash_no_period_type(&self, fact: FactId) -> Option<u64>;
}
