//! Expression AST nodes
//!
//! Expressions are built once by the caller, validated structurally at
//! construction, and never mutated afterwards. Evaluation lives in
//! `factql-eval`; this module only knows the shape of the tree.

use crate::aggregate::{AggregateExpr, AggregateOp, DistinctExpr};
use crate::error::{AstResult, ExprError};
use crate::operator::BinaryOp;
use crate::property::{ConceptRef, DimRef, Property};
use factql_types::{PeriodFormats, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A query expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Fixed value
    Literal(Value),
    /// Named symbol; evaluates to itself, displays uppercased
    Constant(String),
    /// Relative fiscal year, resolved by the evaluator
    Year(YearExpr),
    /// Externally-resolved property
    Property(Property),
    /// Binary operator application
    Binary(BinaryExpr),
    /// Group reduction
    Aggregate(AggregateExpr),
    /// De-duplicated projection over a fact-set list
    Distinct(DistinctExpr),
}

/// A relative fiscal-year reference: offset 0 is the current (most recent)
/// year, -1 the one before, and so on. Positive offsets pass through as
/// absolute years.
///
/// This node has a value but no display form; using it as a header is an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearExpr {
    pub offset: i32,
}

/// A binary operator application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

impl Expr {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a constant: a symbol equal only to itself
    pub fn constant(label: impl Into<String>) -> Self {
        Self::Constant(label.into())
    }

    /// Create a relative fiscal-year reference
    pub fn year(offset: i32) -> Self {
        Self::Year(YearExpr { offset })
    }

    /// Apply a binary operator.
    ///
    /// Fails with [`ExprError::DistinctOperand`] if either operand is a
    /// `Distinct` projection; distinct stands alone in a select clause.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> AstResult<Self> {
        if matches!(lhs, Self::Distinct(_)) || matches!(rhs, Self::Distinct(_)) {
            return Err(ExprError::DistinctOperand);
        }
        Ok(Self::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    /// Create an aggregate expression
    pub fn aggregate(op: AggregateOp, expr: Expr) -> AstResult<Self> {
        Ok(Self::Aggregate(AggregateExpr::new(op, expr)?))
    }

    /// Create a distinct projection over one or more expressions
    pub fn distinct(exprs: Vec<Expr>) -> AstResult<Self> {
        Ok(Self::Distinct(DistinctExpr::new(exprs)?))
    }

    // --- property constructors ---

    /// Opaque concept reference for a named concept
    pub fn concept(name: impl Into<String>) -> Self {
        Self::Property(Property::Concept(ConceptRef::named(name)))
    }

    /// Canonical identifier of a named concept
    pub fn concept_name(name: impl Into<String>) -> Self {
        Self::Property(Property::ConceptName(ConceptRef::named(name)))
    }

    /// Human label of a named concept
    pub fn concept_label(name: impl Into<String>) -> Self {
        Self::Property(Property::ConceptLabel(ConceptRef::named(name)))
    }

    /// Typed value of the fact reported for a named concept
    pub fn concept_value(name: impl Into<String>) -> Self {
        Self::Property(Property::ConceptValue {
            concept: ConceptRef::named(name),
            default: None,
        })
    }

    /// Like [`Expr::concept_value`], with a default for missing facts
    pub fn concept_value_or(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::Property(Property::ConceptValue {
            concept: ConceptRef::named(name),
            default: Some(default.into()),
        })
    }

    /// Member reference on a dimensional axis
    pub fn dim_member(axis: impl Into<String>) -> Self {
        Self::Property(Property::DimMember(DimRef::new(axis)))
    }

    /// Member identifier on a dimensional axis
    pub fn dim_member_name(axis: impl Into<String>) -> Self {
        Self::Property(Property::DimMemberName(DimRef::new(axis)))
    }

    /// Member label on a dimensional axis
    pub fn dim_member_label(axis: impl Into<String>) -> Self {
        Self::Property(Property::DimMemberLabel(DimRef::new(axis)))
    }

    /// Member identifier or typed value on a dimensional axis
    pub fn dim_member_value(axis: impl Into<String>) -> Self {
        Self::Property(Property::DimMemberValue(DimRef::new(axis)))
    }

    /// The set of axis identifiers on the fact's context
    pub fn dim_axes() -> Self {
        Self::Property(Property::DimAxes)
    }

    /// Period of the fact as a value
    pub fn period() -> Self {
        Self::Property(Property::Period { forever: None })
    }

    /// Period of the fact, formatted as text
    pub fn period_str(formats: PeriodFormats) -> Self {
        Self::Property(Property::PeriodStr(formats))
    }

    /// Period start datetime
    pub fn start_datetime() -> Self {
        Self::Property(Property::StartDateTime)
    }

    /// Period end datetime
    pub fn end_datetime() -> Self {
        Self::Property(Property::EndDateTime)
    }

    /// Inclusive period end date
    pub fn end_date() -> Self {
        Self::Property(Property::EndDate)
    }

    /// Fiscal year of the period end
    pub fn fiscal_year() -> Self {
        Self::Property(Property::FiscalYear)
    }

    /// Context identifier (the default primary grouping key)
    pub fn context_id() -> Self {
        Self::Property(Property::ContextId)
    }

    /// Context hash that ignores period-type classification
    pub fn context_hash() -> Self {
        Self::Property(Property::ContextHash)
    }

    // --- aggregate constructors ---

    /// First value per group
    pub fn first(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::First, expr)
    }

    /// Last value per group
    pub fn last(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Last, expr)
    }

    /// Number of values per group
    pub fn count(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Count, expr)
    }

    /// Smallest value per group
    pub fn min(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Min, expr)
    }

    /// Largest value per group
    pub fn max(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Max, expr)
    }

    /// Sum per group, starting from zero
    pub fn sum(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Sum { start: Value::Int(0) }, expr)
    }

    /// Mean per group
    pub fn avg(expr: Expr) -> AstResult<Self> {
        Self::aggregate(AggregateOp::Avg { start: Value::Int(0) }, expr)
    }

    /// String join per group
    pub fn join(expr: Expr, separator: impl Into<String>) -> AstResult<Self> {
        Self::aggregate(
            AggregateOp::Join {
                separator: separator.into(),
            },
            expr,
        )
    }

    // --- operator builders ---

    /// `self == rhs`
    pub fn eq(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Eq, self, rhs.into())
    }

    /// `self != rhs`
    pub fn ne(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Ne, self, rhs.into())
    }

    /// `self > rhs` (proper superset for sets)
    pub fn gt(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Gt, self, rhs.into())
    }

    /// `self >= rhs` (superset for sets)
    pub fn ge(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Ge, self, rhs.into())
    }

    /// `self < rhs` (proper subset for sets)
    pub fn lt(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Lt, self, rhs.into())
    }

    /// `self <= rhs` (subset for sets)
    pub fn le(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Le, self, rhs.into())
    }

    /// `self + rhs`
    pub fn add(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Add, self, rhs.into())
    }

    /// `self - rhs`
    pub fn sub(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Sub, self, rhs.into())
    }

    /// `self * rhs`
    pub fn mul(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Mul, self, rhs.into())
    }

    /// `self / rhs`
    pub fn div(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Div, self, rhs.into())
    }

    /// `self ^ rhs`
    pub fn pow(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Pow, self, rhs.into())
    }

    /// `self % rhs`
    pub fn rem(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Mod, self, rhs.into())
    }

    /// Anchored regex match against the pattern
    pub fn matches(self, pattern: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Regex, self, pattern.into())
    }

    /// Case-insensitive anchored regex match
    pub fn imatches(self, pattern: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::IRegex, self, pattern.into())
    }

    /// Substring or membership test: `self` contains `rhs`
    pub fn contains(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::Contains, self, rhs.into())
    }

    /// Case-insensitive substring test
    pub fn icontains(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::IContains, self, rhs.into())
    }

    /// Membership test: `self` is in `rhs`
    pub fn is_in(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::In, self, rhs.into())
    }

    /// Negated membership test
    pub fn not_in(self, rhs: impl Into<Expr>) -> AstResult<Self> {
        Self::binary(BinaryOp::NotIn, self, rhs.into())
    }

    // --- structural queries ---

    /// All concept identifiers referenced transitively, used for fact
    /// discovery.
    pub fn concept_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_concept_names(&mut names);
        names
    }

    fn collect_concept_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Literal(_) | Self::Constant(_) | Self::Year(_) => {}
            Self::Property(p) => {
                if let Some(name) = p.concept_name() {
                    names.insert(name);
                }
            }
            Self::Binary(b) => {
                b.lhs.collect_concept_names(names);
                b.rhs.collect_concept_names(names);
            }
            Self::Aggregate(a) => a.expr.collect_concept_names(names),
            Self::Distinct(d) => {
                for expr in &d.exprs {
                    expr.collect_concept_names(names);
                }
            }
        }
    }

    /// Check if evaluating this expression depends on dimensional context.
    ///
    /// Queries with no dimensional expression anywhere get an implicit
    /// "no dimensions" filter appended to their where clause.
    pub fn has_dimension_property(&self) -> bool {
        match self {
            Self::Literal(_) | Self::Constant(_) | Self::Year(_) => false,
            Self::Property(p) => p.is_dimensional(),
            Self::Binary(b) => b.lhs.has_dimension_property() || b.rhs.has_dimension_property(),
            Self::Aggregate(a) => a.expr.has_dimension_property(),
            Self::Distinct(d) => d.exprs.iter().any(Expr::has_dimension_property),
        }
    }

    /// Check if this expression reduces a fact-set list to a single value.
    ///
    /// A binary expression aggregates when either operand does. `Distinct`
    /// is not an aggregate: it projects a column, it does not reduce to one
    /// value.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Self::Aggregate(_) => true,
            Self::Binary(b) => b.lhs.is_aggregate() || b.rhs.is_aggregate(),
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Constant(label) => write!(f, "{}", label.to_uppercase()),
            Self::Year(y) => write!(f, "Year({})", y.offset),
            Self::Property(p) => write!(f, "{p}"),
            Self::Binary(b) => write!(
                f,
                "({} ${} {})",
                b.lhs,
                b.op.symbol().to_ascii_uppercase(),
                b.rhs
            ),
            Self::Aggregate(a) => write!(f, "{}({})", a.op.name(), a.expr),
            Self::Distinct(d) => {
                write!(f, "DISTINCT(")?;
                for (i, expr) in d.exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{expr}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Self::Literal(v)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }
}

impl From<i32> for Expr {
    fn from(i: i32) -> Self {
        Self::Literal(Value::Int(i64::from(i)))
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Self {
        Self::Literal(Value::Int(i))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Self::Literal(Value::Str(s.to_string()))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Self::Literal(Value::Str(s))
    }
}
