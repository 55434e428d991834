//! Text and set predicates
//!
//! `regex`/`iregex` match the operand against a pattern anchored at the
//! start of the string. `contains` tests substrings for strings and
//! membership for collections; `in`/`nin` test membership the other way
//! around.

use crate::error::{EvalError, EvalResult};
use factql_ast::BinaryOp;
use factql_types::Value;
use regex::RegexBuilder;

/// Apply a text or set predicate to two non-null operands.
pub fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Regex => regex_match(lhs, rhs, false)?,
        BinaryOp::IRegex => regex_match(lhs, rhs, true)?,
        BinaryOp::Contains => contains(lhs, rhs, false)?,
        BinaryOp::IContains => contains(lhs, rhs, true)?,
        BinaryOp::In => is_in(lhs, rhs)?,
        BinaryOp::NotIn => !is_in(lhs, rhs)?,
        _ => {
            return Err(EvalError::internal(format!(
                "{} is not a text or set operator",
                op.symbol()
            )));
        }
    };
    Ok(Value::Bool(result))
}

fn type_mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn regex_match(lhs: &Value, rhs: &Value, case_insensitive: bool) -> EvalResult<bool> {
    let op = if case_insensitive {
        BinaryOp::IRegex
    } else {
        BinaryOp::Regex
    };
    let (Some(text), Some(pattern)) = (lhs.as_str(), rhs.as_str()) else {
        return Err(type_mismatch(op, lhs, rhs));
    };
    // Anchor at the start only; the pattern may match a prefix
    let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|_| EvalError::invalid_regex(pattern))?;
    Ok(regex.is_match(text))
}

fn contains(lhs: &Value, rhs: &Value, case_insensitive: bool) -> EvalResult<bool> {
    match (lhs, rhs) {
        (Value::Str(haystack), Value::Str(needle)) => {
            if case_insensitive {
                Ok(haystack.to_lowercase().contains(&needle.to_lowercase()))
            } else {
                Ok(haystack.contains(needle.as_str()))
            }
        }
        (Value::List(items), needle) if !case_insensitive => Ok(items.contains(needle)),
        (Value::Set(items), needle) if !case_insensitive => Ok(items.contains(needle)),
        _ => Err(type_mismatch(
            if case_insensitive {
                BinaryOp::IContains
            } else {
                BinaryOp::Contains
            },
            lhs,
            rhs,
        )),
    }
}

fn is_in(lhs: &Value, rhs: &Value) -> EvalResult<bool> {
    match rhs {
        Value::Str(haystack) => match lhs.as_str() {
            Some(needle) => Ok(haystack.contains(needle)),
            None => Err(type_mismatch(BinaryOp::In, lhs, rhs)),
        },
        Value::List(items) => Ok(items.contains(lhs)),
        Value::Set(items) => Ok(items.contains(lhs)),
        _ => Err(type_mismatch(BinaryOp::In, lhs, rhs)),
    }
}
