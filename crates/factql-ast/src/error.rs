//! Construction-time expression errors

use thiserror::Error;

/// Result type for expression construction
pub type AstResult<T> = Result<T, ExprError>;

/// Errors raised while building expressions.
///
/// These are structural violations caught at construction time, before a
/// query ever runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// A `Distinct` projection used as an operand of a binary expression
    #[error("distinct projections cannot be combined with other expressions")]
    DistinctOperand,

    /// An aggregate nested inside another aggregating node
    #[error("cannot nest an aggregate inside {outer}")]
    NestedAggregate { outer: String },

    /// A `Distinct` projection with no expressions
    #[error("distinct requires at least one expression")]
    EmptyProjection,
}

impl ExprError {
    /// Create a nested-aggregate error
    pub fn nested_aggregate(outer: impl Into<String>) -> Self {
        Self::NestedAggregate { outer: outer.into() }
    }
}
