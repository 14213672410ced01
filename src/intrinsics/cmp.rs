use std::cmp::Ordering;

use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

fn compare(scope: &CallScope<'_>, accept: fn(Ordering) -> bool) -> Result<Value> {
    scope.assert_arity(2)?;

    let left = scope.at(0);
    let right = scope.at(1);

    match left.compare(&right) {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None => Err(RuntimeError::TypeMismatch {
            expected: "comparable values",
            found: format!("{left} and {right}"),
        }),
    }
}

/// == : a -> a -> bool
pub fn eq(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;
    Ok(Value::Bool(scope.at(0).equals(&scope.at(1))))
}

/// != : a -> a -> bool
pub fn neq(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;
    Ok(Value::Bool(!scope.at(0).equals(&scope.at(1))))
}

/// < : a -> a -> bool
pub fn less_than(scope: CallScope<'_>) -> Result<Value> {
    compare(&scope, Ordering::is_lt)
}

/// > : a -> a -> bool
pub fn greater_than(scope: CallScope<'_>) -> Result<Value> {
    compare(&scope, Ordering::is_gt)
}

/// <= : a -> a -> bool
pub fn less_equal(scope: CallScope<'_>) -> Result<Value> {
    compare(&scope, Ordering::is_le)
}

/// >= : a -> a -> bool
pub fn greater_equal(scope: CallScope<'_>) -> Result<Value> {
    compare(&scope, Ordering::is_ge)
}

/// not : a -> bool
pub fn not(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;
    Ok(Value::Bool(!scope.at(0).is_truthy()))
}
