use std::{cell::RefCell, rc::Rc};

use crate::error::{Result, RuntimeError};
use crate::hash::Hash;
use crate::value::{CallScope, Value};

fn assert_hash(value: Value) -> Result<Rc<RefCell<Hash>>> {
    match value {
        Value::Hash(hash) => Ok(hash),
        other => Err(RuntimeError::mismatch("a hash", other)),
    }
}

/// hash : (k v)... -> hash k v
pub fn hash(scope: CallScope<'_>) -> Result<Value> {
    Ok(Value::hash(Hash::from_pairs("hash", &scope.args)?))
}

/// hget : hash k v -> k -> v
///
/// An optional third argument is returned when the key is absent.
pub fn hget(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_at_least(2)?;

    let hash = assert_hash(scope.at(0))?;
    let hash = hash.borrow();

    let value = match scope.args.get(2) {
        Some(default) => hash.get_or(&scope.at(1), default.clone()),
        None => hash.get(&scope.at(1)),
    };
    value
}

/// hset : hash k v -> k -> v -> v
pub fn hset(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(3)?;

    let hash = assert_hash(scope.at(0))?;
    let value = scope.at(2);
    hash.borrow_mut().set(scope.at(1), value.clone())?;

    Ok(value)
}

/// hdel : hash k v -> k -> nil
pub fn hdel(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;

    let hash = assert_hash(scope.at(0))?;
    hash.borrow_mut().delete(&scope.at(1))?;

    Ok(Value::Null)
}

/// hkeys : hash k v -> array k
pub fn hkeys(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    let hash = assert_hash(scope.at(0))?;
    let keys = hash.borrow().keys().to_vec();

    Ok(Value::array(keys))
}

/// record : symbol -> (k v)... -> Type k v
pub fn record(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_at_least(1)?;

    let type_name = match scope.at(0) {
        Value::Symbol(symbol) => symbol.name().to_string(),
        Value::Str(string) => string.to_string(),
        other => return Err(RuntimeError::mismatch("a type name", other)),
    };

    scope.env.externs().build(&type_name, &scope.args[1..])
}
