//! Evaluation errors

use factql_ast::ExprError;
use factql_model::EvaluatorError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating expressions or executing a query.
///
/// All of these are local to one execution; the engine is deterministic and
/// pure, so nothing is retried internally. The host decides whether an error
/// aborts the whole query or is reported per query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Two facts in one fact set resolve to the same concept
    #[error(
        "duplicate concept {concept} in fact set; add clauses to the primary \
         group-by so each group holds at most one fact per concept"
    )]
    DuplicateConcept { concept: String },

    /// Error raised by the evaluator adapter (e.g. an ambiguous identifier)
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    /// Structurally invalid expression surfaced at query time
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// A non-aggregate expression disagreed across members of a group
    #[error("expression {expr} is not constant within its group; fix the group-by clause")]
    GroupMismatch { expr: String },

    /// A header was requested from a node with no display form
    #[error("{expr} has no display form and cannot be used as a header")]
    NotDisplayable { expr: String },

    /// An expression was evaluated against a target kind it does not support
    #[error("{expr} cannot be evaluated against {target}; expected {expected}")]
    UnsupportedTarget {
        expr: String,
        target: &'static str,
        expected: &'static str,
    },

    /// Operands of incompatible types for an operator
    #[error("cannot apply {op} to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Ordered comparison between unordered operand types
    #[error("cannot compare {lhs} with {rhs}")]
    Incomparable {
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow
    #[error("arithmetic overflow in {op}")]
    Overflow { op: &'static str },

    /// Malformed regex pattern in a match operator
    #[error("invalid regex pattern: {pattern}")]
    InvalidRegex { pattern: String },

    /// A single-value lookup matched a different number of rows
    #[error("expected exactly one row, found {rows}")]
    NoUniqueRow { rows: usize },

    /// Internal error (should not happen)
    #[error("internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    /// Create a duplicate-concept error
    pub fn duplicate_concept(concept: impl Into<String>) -> Self {
        Self::DuplicateConcept {
            concept: concept.into(),
        }
    }

    /// Create a group-mismatch error
    pub fn group_mismatch(expr: impl Into<String>) -> Self {
        Self::GroupMismatch { expr: expr.into() }
    }

    /// Create a not-displayable error
    pub fn not_displayable(expr: impl Into<String>) -> Self {
        Self::NotDisplayable { expr: expr.into() }
    }

    /// Create an unsupported-target error
    pub fn unsupported_target(
        expr: impl Into<String>,
        target: &'static str,
        expected: &'static str,
    ) -> Self {
        Self::UnsupportedTarget {
            expr: expr.into(),
            target,
            expected,
        }
    }

    /// Create an invalid-regex error
    pub fn invalid_regex(pattern: impl Into<String>) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
