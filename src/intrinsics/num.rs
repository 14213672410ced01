use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

fn as_float(value: &Value) -> Result<f64> {
    match value {
        Value::Int(int) => Ok(*int as f64),
        Value::Float(float) => Ok(*float),
        other => Err(RuntimeError::mismatch("a number", other)),
    }
}

/// Integers stay integers; any float operand makes the result a float.
fn combine(
    left: &Value,
    right: &Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::from("integer overflow")),
        _ => Ok(Value::Float(float(as_float(left)?, as_float(right)?))),
    }
}

fn fold(
    args: &[Value],
    init: Value,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Value> {
    args.iter()
        .try_fold(init, |acc, arg| combine(&acc, arg, int, float))
}

fn is_zero(value: &Value) -> bool {
    matches!(value, Value::Int(0)) || matches!(value, Value::Float(float) if *float == 0.0)
}

/// + : number... -> number
pub fn add(scope: CallScope<'_>) -> Result<Value> {
    fold(&scope.args, Value::Int(0), i64::checked_add, |a, b| a + b)
}

/// - : number -> number... -> number
pub fn sub(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_at_least(1)?;

    if scope.args.len() == 1 {
        return combine(&Value::Int(0), &scope.args[0], i64::checked_sub, |a, b| a - b);
    }

    fold(&scope.args[1..], scope.at(0), i64::checked_sub, |a, b| a - b)
}

/// * : number... -> number
pub fn mul(scope: CallScope<'_>) -> Result<Value> {
    fold(&scope.args, Value::Int(1), i64::checked_mul, |a, b| a * b)
}

/// / : number -> number... -> number
pub fn div(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_at_least(2)?;

    let mut result = scope.at(0);
    as_float(&result)?;

    for arg in scope.args.iter().skip(1) {
        if is_zero(arg) {
            return Err(RuntimeError::DivisionByZero);
        }
        result = combine(&result, arg, i64::checked_div, |a, b| a / b)?;
    }

    Ok(result)
}

/// mod : int -> int -> int
pub fn modulo(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;

    let left = scope.at(0).assert_number()?;
    let right = scope.at(1).assert_number()?;

    if right == 0 {
        return Err(RuntimeError::DivisionByZero);
    }

    left.checked_rem(right)
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::from("integer overflow"))
}
