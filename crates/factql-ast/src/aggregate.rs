//! Aggregate and distinct-projection nodes

use crate::error::{AstResult, ExprError};
use crate::expression::Expr;
use factql_types::Value;
use serde::{Deserialize, Serialize};

/// Reduction applied by an aggregate expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    /// First value of the group
    First,
    /// Last value of the group
    Last,
    /// Number of values in the group
    Count,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Sum, folded from a configurable start value
    Sum { start: Value },
    /// Arithmetic mean, using the same start value as `Sum`
    Avg { start: Value },
    /// String join; every value must be a string
    Join { separator: String },
}

impl AggregateOp {
    /// Get the name used in display forms, e.g. `SUM(Revenue)`
    pub const fn name(&self) -> &'static str {
        match self {
            Self::First => "FIRST",
            Self::Last => "LAST",
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum { .. } => "SUM",
            Self::Avg { .. } => "AVG",
            Self::Join { .. } => "JOIN",
        }
    }
}

/// An aggregate expression: reduces one value per member of a fact-set list
/// down to a single value.
///
/// With `skip_missing` (the default) null inner results are dropped before
/// the reduction; if nothing remains, the result is `on_empty` and the
/// reducer is never invoked on an empty input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateExpr {
    pub op: AggregateOp,
    pub expr: Box<Expr>,
    pub skip_missing: bool,
    pub on_empty: Value,
}

impl AggregateExpr {
    /// Create an aggregate over a non-aggregate inner expression.
    ///
    /// Fails with [`ExprError::NestedAggregate`] if `expr` already
    /// aggregates.
    pub fn new(op: AggregateOp, expr: Expr) -> AstResult<Self> {
        if expr.is_aggregate() {
            return Err(ExprError::nested_aggregate(op.name()));
        }
        Ok(Self {
            op,
            expr: Box::new(expr),
            skip_missing: true,
            on_empty: Value::Null,
        })
    }

    /// Keep null inner results instead of dropping them
    pub fn keep_missing(mut self) -> Self {
        self.skip_missing = false;
        self
    }

    /// Set the value returned when the (filtered) input is empty
    pub fn with_on_empty(mut self, value: impl Into<Value>) -> Self {
        self.on_empty = value.into();
        self
    }
}

/// A distinct projection: evaluates each expression per fact set and
/// de-duplicates the projected values (tuples, when more than one
/// expression is given), preserving first-occurrence order.
///
/// Distinct cannot be combined with other expressions inside a binary
/// operator; it stands alone in a select clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistinctExpr {
    pub exprs: Vec<Expr>,
    /// Drop entries whose value (or every tuple element) is null
    pub skip_missing: bool,
}

impl DistinctExpr {
    /// Create a distinct projection over one or more non-aggregate
    /// expressions.
    pub fn new(exprs: Vec<Expr>) -> AstResult<Self> {
        if exprs.is_empty() {
            return Err(ExprError::EmptyProjection);
        }
        if exprs.iter().any(Expr::is_aggregate) {
            return Err(ExprError::nested_aggregate("DISTINCT"));
        }
        Ok(Self {
            exprs,
            skip_missing: false,
        })
    }

    /// Drop null entries before de-duplication
    pub fn skip_missing(mut self) -> Self {
        self.skip_missing = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_nested_aggregate() {
        let inner = Expr::aggregate(AggregateOp::Count, Expr::concept_value("Revenue")).unwrap();
        let err = AggregateExpr::new(AggregateOp::Sum { start: Value::Int(0) }, inner).unwrap_err();
        assert_eq!(err, ExprError::NestedAggregate { outer: "SUM".into() });
    }

    #[test]
    fn test_rejects_aggregate_in_distinct() {
        let agg = Expr::sum(Expr::concept_value("Revenue")).unwrap();
        assert!(DistinctExpr::new(vec![agg]).is_err());
        assert!(DistinctExpr::new(vec![]).is_err());
    }

    #[test]
    fn test_policy_builders() {
        let agg = AggregateExpr::new(AggregateOp::First, Expr::concept_value("X"))
            .unwrap()
            .keep_missing()
            .with_on_empty(0i64);
        assert!(!agg.skip_missing);
        assert_eq!(agg.on_empty, Value::Int(0));
    }
}
