//! Binary-operator and aggregate-reducer implementations
//!
//! The engine dispatches here after null propagation has been handled: a
//! null operand never reaches these functions.

pub mod aggregate;
pub mod arithmetic;
pub mod comparison;
pub mod text;

use crate::error::EvalResult;
use factql_ast::BinaryOp;
use factql_types::Value;

/// Apply a binary operator to two non-null operands.
pub fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow
        | BinaryOp::Mod => arithmetic::apply(op, lhs, rhs),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt
        | BinaryOp::Le => comparison::apply(op, &lhs, &rhs),
        BinaryOp::Regex | BinaryOp::IRegex | BinaryOp::Contains | BinaryOp::IContains
        | BinaryOp::In | BinaryOp::NotIn => text::apply(op, &lhs, &rhs),
    }
}
