//! Aggregate reducers
//!
//! Reducers are only ever invoked with a non-empty input; the engine
//! applies the `(skip_missing, on_empty)` policy first.

use crate::error::{EvalError, EvalResult};
use crate::operators::{arithmetic, comparison};
use factql_ast::{AggregateOp, BinaryOp};
use factql_types::Value;
use std::cmp::Ordering;

/// Reduce a non-empty list of values.
pub fn reduce(op: &AggregateOp, values: Vec<Value>) -> EvalResult<Value> {
    if values.is_empty() {
        return Err(EvalError::internal("aggregate reducer invoked on empty input"));
    }
    match op {
        AggregateOp::First => Ok(values[0].clone()),
        AggregateOp::Last => Ok(values[values.len() - 1].clone()),
        AggregateOp::Count => Ok(Value::Int(values.len() as i64)),
        AggregateOp::Min => extremum(values, Ordering::Less),
        AggregateOp::Max => extremum(values, Ordering::Greater),
        AggregateOp::Sum { start } => sum(values, start.clone()),
        AggregateOp::Avg { start } => {
            let count = Value::Int(values.len() as i64);
            let total = sum(values, start.clone())?;
            arithmetic::apply(BinaryOp::Div, total, count)
        }
        AggregateOp::Join { separator } => join(values, separator),
    }
}

fn extremum(values: Vec<Value>, keep: Ordering) -> EvalResult<Value> {
    let mut iter = values.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| EvalError::internal("empty extremum input"))?;
    for value in iter {
        let ordering = comparison::compare(&value, &best).ok_or(EvalError::Incomparable {
            lhs: value.type_name(),
            rhs: best.type_name(),
        })?;
        if ordering == keep {
            best = value;
        }
    }
    Ok(best)
}

fn sum(values: Vec<Value>, start: Value) -> EvalResult<Value> {
    values
        .into_iter()
        .try_fold(start, |acc, v| arithmetic::apply(BinaryOp::Add, acc, v))
}

fn join(values: Vec<Value>, separator: &str) -> EvalResult<Value> {
    let mut parts = Vec::with_capacity(values.len());
    for value in &values {
        match value.as_str() {
            Some(s) => parts.push(s),
            None => {
                return Err(EvalError::TypeMismatch {
                    op: "join",
                    lhs: "string",
                    rhs: value.type_name(),
                });
            }
        }
    }
    Ok(Value::Str(parts.join(separator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn test_first_last_count() {
        assert_eq!(reduce(&AggregateOp::First, ints(&[3, 1, 2])).unwrap(), Value::Int(3));
        assert_eq!(reduce(&AggregateOp::Last, ints(&[3, 1, 2])).unwrap(), Value::Int(2));
        assert_eq!(reduce(&AggregateOp::Count, ints(&[3, 1, 2])).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(reduce(&AggregateOp::Min, ints(&[3, 1, 2])).unwrap(), Value::Int(1));
        assert_eq!(reduce(&AggregateOp::Max, ints(&[3, 1, 2])).unwrap(), Value::Int(3));
        let mixed = vec![Value::Int(1), Value::from("a")];
        assert!(matches!(
            reduce(&AggregateOp::Min, mixed),
            Err(EvalError::Incomparable { .. })
        ));
    }

    #[test]
    fn test_sum_with_start() {
        let op = AggregateOp::Sum { start: Value::Int(0) };
        assert_eq!(reduce(&op, ints(&[100, 200])).unwrap(), Value::Int(300));
        let op = AggregateOp::Sum { start: Value::Int(10) };
        assert_eq!(reduce(&op, ints(&[1, 2])).unwrap(), Value::Int(13));
    }

    #[test]
    fn test_avg() {
        let op = AggregateOp::Avg { start: Value::Int(0) };
        assert_eq!(reduce(&op, ints(&[100, 200])).unwrap(), Value::Int(150));
        assert_eq!(
            reduce(&op, ints(&[1, 2])).unwrap(),
            Value::Decimal(Decimal::from_str("1.5").unwrap())
        );
    }

    #[test]
    fn test_join_requires_strings() {
        let op = AggregateOp::Join {
            separator: ", ".to_string(),
        };
        let names = vec![Value::from("A & Co"), Value::from("B LLP")];
        assert_eq!(reduce(&op, names).unwrap(), Value::from("A & Co, B LLP"));
        assert!(matches!(
            reduce(&op, ints(&[1])),
            Err(EvalError::TypeMismatch { .. })
        ));
    }
}
