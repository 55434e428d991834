//! Binary operators

use serde::{Deserialize, Serialize};

/// Binary operators recognized by the engine.
///
/// The set is fixed: arithmetic, comparison and text/set predicates. The
/// classification drives null propagation: a predicate with a null operand
/// evaluates to `false`, an arithmetic operator to null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    /// Addition (numeric) or concatenation (strings)
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Exponentiation
    Pow,
    /// Remainder
    Mod,

    // Comparison
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Greater than (proper superset for sets)
    Gt,
    /// Greater than or equal (superset for sets)
    Ge,
    /// Less than (proper subset for sets)
    Lt,
    /// Less than or equal (subset for sets)
    Le,

    // Text and set predicates
    /// Regex match anchored at the start of the operand
    Regex,
    /// Case-insensitive anchored regex match
    IRegex,
    /// Substring or collection membership test (left contains right)
    Contains,
    /// Case-insensitive substring test
    IContains,
    /// Membership test (left is in right)
    In,
    /// Negated membership test
    NotIn,
}

impl BinaryOp {
    /// Check if this is an arithmetic operator
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Pow | Self::Mod
        )
    }

    /// Check if this is a comparison operator
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le
        )
    }

    /// Check if this operator yields a boolean.
    ///
    /// Predicates return `false` rather than null when an operand is missing.
    pub const fn is_predicate(&self) -> bool {
        !self.is_arithmetic()
    }

    /// Get the operator name used in display forms
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
            Self::Mod => "mod",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Regex => "regex",
            Self::IRegex => "iregex",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::In => "in",
            Self::NotIn => "nin",
        }
    }
}
