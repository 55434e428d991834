//! Expression AST for the factql query engine
//!
//! This crate defines the immutable expression model: composable query
//! expressions built once at query-definition time and evaluated by the
//! executor in `factql-eval`. Nodes carry no evaluation state; everything
//! that needs domain knowledge (concept identity, labels, periods) is
//! resolved later through the `Evaluator` interface in `factql-model`.

mod aggregate;
mod error;
mod expression;
mod operator;
mod property;

pub use aggregate::{AggregateExpr, AggregateOp, DistinctExpr};
pub use error::{AstResult, ExprError};
pub use expression::{BinaryExpr, Expr, YearExpr};
pub use operator::BinaryOp;
pub use property::{ConceptRef, DimRef, Property};
