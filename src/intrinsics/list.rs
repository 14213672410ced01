use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

/// list : a... -> list a
pub fn list(scope: CallScope<'_>) -> Result<Value> {
    Ok(Value::list_from(scope.args))
}

/// cons : a -> b -> pair a b
pub fn cons(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;
    Ok(Value::cons(scope.at(0), scope.at(1)))
}

/// first : list a -> a
pub fn first(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    match scope.at(0) {
        Value::Pair(pair) => Ok(pair.head.clone()),
        other => Err(RuntimeError::mismatch("a non-empty list", other)),
    }
}

/// rest : list a -> list a
pub fn rest(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    match scope.at(0) {
        Value::Pair(pair) => Ok(pair.tail.clone()),
        other => Err(RuntimeError::mismatch("a non-empty list", other)),
    }
}

fn length(value: &Value) -> Result<usize> {
    match value {
        Value::Str(string) => Ok(string.chars().count()),
        Value::Raw(bytes) => Ok(bytes.len()),
        Value::Array(array) => Ok(array.borrow().len()),
        Value::Hash(hash) => Ok(hash.borrow().len()),
        other => other
            .to_vec()
            .map(|elements| elements.len())
            .ok_or_else(|| RuntimeError::mismatch("a sequence", other)),
    }
}

/// len : seq a -> int
pub fn len(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;
    Ok(Value::Int(length(&scope.at(0))? as i64))
}

/// empty? : seq a -> bool
pub fn is_empty(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;
    Ok(Value::Bool(length(&scope.at(0))? == 0))
}

/// list? : a -> bool
pub fn is_list(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;
    Ok(Value::Bool(scope.at(0).is_list()))
}

/// null? : a -> bool
pub fn is_null(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;
    Ok(Value::Bool(scope.at(0).is_null()))
}
