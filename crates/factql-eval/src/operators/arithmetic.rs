//! Arithmetic operators
//!
//! Mixed Int/Decimal operands promote to Decimal. `Add` also concatenates
//! strings. Division yields an Int only when it is exact; otherwise the
//! quotient is a Decimal.

use crate::error::{EvalError, EvalResult};
use factql_ast::BinaryOp;
use factql_types::Value;
use rust_decimal::{Decimal, MathematicalOps};

/// Apply an arithmetic operator to two non-null operands.
pub fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => add(lhs, rhs),
        BinaryOp::Sub => sub(lhs, rhs),
        BinaryOp::Mul => mul(lhs, rhs),
        BinaryOp::Div => div(lhs, rhs),
        BinaryOp::Pow => pow(lhs, rhs),
        BinaryOp::Mod => rem(lhs, rhs),
        _ => Err(EvalError::internal(format!(
            "{} is not an arithmetic operator",
            op.symbol()
        ))),
    }
}

fn type_mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn add(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "add" }),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (a, b) if a.is_numeric() && b.is_numeric() => numeric(BinaryOp::Add, &a, &b, |x, y| {
            x.checked_add(y)
        }),
        (a, b) => Err(type_mismatch(BinaryOp::Add, &a, &b)),
    }
}

fn sub(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_sub(b)
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "sub" }),
        (a, b) if a.is_numeric() && b.is_numeric() => numeric(BinaryOp::Sub, &a, &b, |x, y| {
            x.checked_sub(y)
        }),
        (a, b) => Err(type_mismatch(BinaryOp::Sub, &a, &b)),
    }
}

fn mul(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_mul(b)
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "mul" }),
        (a, b) if a.is_numeric() && b.is_numeric() => numeric(BinaryOp::Mul, &a, &b, |x, y| {
            x.checked_mul(y)
        }),
        (a, b) => Err(type_mismatch(BinaryOp::Mul, &a, &b)),
    }
}

fn div(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            if a % b == 0 {
                Ok(Value::Int(a / b))
            } else {
                numeric(BinaryOp::Div, &Value::Int(a), &Value::Int(b), |x, y| {
                    x.checked_div(y)
                })
            }
        }
        (a, b) if a.is_numeric() && b.is_numeric() => {
            if b.as_decimal().is_some_and(|d| d.is_zero()) {
                return Err(EvalError::DivisionByZero);
            }
            numeric(BinaryOp::Div, &a, &b, |x, y| x.checked_div(y))
        }
        (a, b) => Err(type_mismatch(BinaryOp::Div, &a, &b)),
    }
}

fn pow(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) if b >= 0 && b <= u32::MAX.into() => a
            .checked_pow(b as u32)
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "pow" }),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            numeric(BinaryOp::Pow, &a, &b, |x, y| x.checked_powd(y))
        }
        (a, b) => Err(type_mismatch(BinaryOp::Pow, &a, &b)),
    }
}

fn rem(lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Int(a % b))
        }
        (a, b) if a.is_numeric() && b.is_numeric() => {
            if b.as_decimal().is_some_and(|d| d.is_zero()) {
                return Err(EvalError::DivisionByZero);
            }
            numeric(BinaryOp::Mod, &a, &b, |x, y| x.checked_rem(y))
        }
        (a, b) => Err(type_mismatch(BinaryOp::Mod, &a, &b)),
    }
}

/// Apply a checked Decimal operation to promoted operands.
fn numeric(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    f: impl Fn(Decimal, Decimal) -> Option<Decimal>,
) -> EvalResult<Value> {
    let (Some(a), Some(b)) = (lhs.as_decimal(), rhs.as_decimal()) else {
        return Err(type_mismatch(op, lhs, rhs));
    };
    f(a, b)
        .map(Value::Decimal)
        .ok_or(EvalError::Overflow { op: op.symbol() })
}
