//! Comparison operators
//!
//! Equality compares with numeric promotion and never fails: operands of
//! unrelated types are simply unequal. Ordered comparison is defined for
//! numerics, strings, dates and datetimes; for sets the operators read as
//! subset/superset tests, which is how dimension filters like
//! `dim_axes() >= {axis}` are written.

use crate::error::{EvalError, EvalResult};
use factql_ast::BinaryOp;
use factql_types::Value;
use std::cmp::Ordering;

/// Apply a comparison operator to two non-null operands.
pub fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Eq => values_equal(lhs, rhs),
        BinaryOp::Ne => !values_equal(lhs, rhs),
        BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le => {
            if let (Value::Set(a), Value::Set(b)) = (lhs, rhs) {
                match op {
                    BinaryOp::Gt => a.is_superset(b) && a != b,
                    BinaryOp::Ge => a.is_superset(b),
                    BinaryOp::Lt => a.is_subset(b) && a != b,
                    _ => a.is_subset(b),
                }
            } else {
                let ordering = compare(lhs, rhs).ok_or(EvalError::Incomparable {
                    lhs: lhs.type_name(),
                    rhs: rhs.type_name(),
                })?;
                match op {
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Ge => ordering != Ordering::Less,
                    BinaryOp::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                }
            }
        }
        _ => {
            return Err(EvalError::internal(format!(
                "{} is not a comparison operator",
                op.symbol()
            )));
        }
    };
    Ok(Value::Bool(result))
}

/// Value equality with Int/Decimal promotion.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(_), Value::Decimal(_)) | (Value::Decimal(_), Value::Int(_)) => {
            lhs.as_decimal() == rhs.as_decimal()
        }
        _ => lhs == rhs,
    }
}

/// Ordered comparison for scalar operands, `None` when the types have no
/// defined order relative to each other.
pub fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => Some(a.as_decimal()?.cmp(&b.as_decimal()?)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::str::FromStr;

    fn set(items: &[i64]) -> Value {
        Value::Set(items.iter().copied().map(Value::Int).collect::<BTreeSet<_>>())
    }

    #[rstest]
    #[case(BinaryOp::Eq, Value::Int(3), Value::Int(3), true)]
    #[case(BinaryOp::Ne, Value::Int(3), Value::Int(4), true)]
    #[case(BinaryOp::Gt, Value::Int(4), Value::Int(3), true)]
    #[case(BinaryOp::Ge, Value::Int(3), Value::Int(3), true)]
    #[case(BinaryOp::Lt, Value::Int(3), Value::Int(4), true)]
    #[case(BinaryOp::Le, Value::Int(4), Value::Int(3), false)]
    fn test_int_comparisons(
        #[case] op: BinaryOp,
        #[case] lhs: Value,
        #[case] rhs: Value,
        #[case] expected: bool,
    ) {
        assert_eq!(apply(op, &lhs, &rhs).unwrap(), Value::Bool(expected));
    }

    #[test]
    fn test_numeric_promotion() {
        let half = Value::Decimal(rust_decimal::Decimal::from_str("0.5").unwrap());
        assert_eq!(
            apply(BinaryOp::Lt, &half, &Value::Int(1)).unwrap(),
            Value::Bool(true)
        );
        let three = Value::Decimal(rust_decimal::Decimal::from_str("3.0").unwrap());
        assert_eq!(
            apply(BinaryOp::Eq, &Value::Int(3), &three).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_equality_across_types_is_false_not_error() {
        assert_eq!(
            apply(BinaryOp::Eq, &Value::Int(1), &Value::from("1")).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            apply(BinaryOp::Ne, &Value::Int(1), &Value::from("1")).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_ordered_comparison_across_types_errors() {
        assert!(matches!(
            apply(BinaryOp::Lt, &Value::Int(1), &Value::from("1")),
            Err(EvalError::Incomparable { .. })
        ));
    }

    #[test]
    fn test_set_superset_subset() {
        let axes = set(&[1, 2, 3]);
        let wanted = set(&[1, 2]);
        assert_eq!(apply(BinaryOp::Ge, &axes, &wanted).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Gt, &axes, &wanted).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Le, &wanted, &axes).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Ge, &wanted, &axes).unwrap(), Value::Bool(false));
        assert_eq!(apply(BinaryOp::Ge, &axes, &axes.clone()).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Gt, &axes, &axes.clone()).unwrap(), Value::Bool(false));
        // Empty-set equality is how the default dimension filter works
        assert_eq!(
            apply(BinaryOp::Eq, &Value::empty_set(), &Value::empty_set()).unwrap(),
            Value::Bool(true)
        );
    }
}
