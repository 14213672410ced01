use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

/// apply : (a... -> b) -> seq a -> b
pub fn apply(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;

    let function = scope.at(0);
    let args = scope.at(1);
    let args = args
        .to_sequence()
        .ok_or_else(|| RuntimeError::mismatch("a list or array", &args))?;

    scope.env.apply(&function, args)
}

/// map : (a -> b) -> seq a -> seq b
///
/// Lists map to lists and arrays to arrays.
pub fn map(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(2)?;

    let function = scope.at(0);
    let sequence = scope.at(1);
    let elements = sequence
        .to_sequence()
        .ok_or_else(|| RuntimeError::mismatch("a list or array", &sequence))?;

    let mapped = elements
        .into_iter()
        .map(|element| scope.env.apply(&function, vec![element]))
        .collect::<Result<Vec<_>>>()?;

    Ok(match sequence {
        Value::Array(_) => Value::array(mapped),
        _ => Value::list_from(mapped),
    })
}

#[cfg(test)]
mod tests {
    use crate::environment::Environment;

    fn eval(source: &str) -> String {
        Environment::new().eval_str(source).unwrap().to_string()
    }

    #[test]
    fn apply_spreads_the_arguments() {
        assert_eq!(eval("(apply + (list 1 2 3))"), "6");
        assert_eq!(eval("(apply (fn [a b] (- a b)) [10 4])"), "6");
    }

    #[test]
    fn map_keeps_the_sequence_kind() {
        assert_eq!(eval("(map (fn [x] (* x x)) (list 1 2 3))"), "(1 4 9)");
        assert_eq!(eval("(map (fn [x] (+ x 1)) [1 2])"), "[2 3]");
    }
}
