use std::{cell::RefCell, rc::Rc};

use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

fn assert_array(value: Value) -> Result<Rc<RefCell<Vec<Value>>>> {
    match value {
        Value::Array(array) => Ok(array),
        other => Err(RuntimeError::mismatch("an array", other)),
    }
}

fn index(value: &Value, len: usize) -> Result<usize> {
    let index = value.assert_number()?;
    if index < 0 || index as usize >= len {
        return Err(RuntimeError::IndexOutOfBounds { index, len });
    }
    Ok(index as usize)
}

/// array : a... -> array a
pub fn array(scope: CallScope<'_>) -> Result<Value> {
    Ok(Value::array(scope.args))
}

/// aget : array a -> int -> a
pub fn aget(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;

    let array = assert_array(scope.at(0))?;
    let array = array.borrow();
    let index = index(&scope.at(1), array.len())?;

    Ok(array[index].clone())
}

/// aset : array a -> int -> a -> a
pub fn aset(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(3)?;

    let array = assert_array(scope.at(0))?;
    let mut array = array.borrow_mut();
    let index = index(&scope.at(1), array.len())?;
    let value = scope.at(2);

    array[index] = value.clone();
    Ok(value)
}

/// append : array a -> a... -> array a
pub fn append(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_at_least(1)?;

    let array = assert_array(scope.at(0))?;
    let mut elements = array.borrow().clone();
    elements.extend(scope.args.into_iter().skip(1));

    Ok(Value::array(elements))
}

#[cfg(test)]
mod tests {
    use crate::environment::Environment;
    use crate::error::{Error, RuntimeError};

    #[test]
    fn arrays_are_indexed_and_updated() {
        let mut env = Environment::new();
        let value = env
            .eval_str("(def a [1 2 3]) (aset a 0 10) (aget a 0)")
            .unwrap();
        assert_eq!(value.to_string(), "10");
    }

    #[test]
    fn append_returns_a_new_array() {
        let mut env = Environment::new();
        let value = env
            .eval_str("(def a [1]) (def b (append a 2 3)) (list a b)")
            .unwrap();
        assert_eq!(value.to_string(), "([1] [1 2 3])");
    }

    #[test]
    fn out_of_bounds() {
        let err = Environment::new().eval_str("(aget [1 2] 2)").unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }
}
