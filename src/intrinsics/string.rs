use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

/// Renders a value the way it reads when printed: strings and chars without quoting.
pub fn display(value: &Value) -> String {
    match value {
        Value::Str(string) => string.to_string(),
        Value::Char(chr) => chr.to_string(),
        other => other.to_string(),
    }
}

/// str : a... -> string
pub fn str(scope: CallScope<'_>) -> Result<Value> {
    let string = scope.args.iter().map(display).collect::<String>();
    Ok(Value::str(string))
}

/// symbol : string -> symbol
pub fn symbol(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    let name = match scope.at(0) {
        Value::Str(string) => string,
        Value::Symbol(symbol) => return Ok(Value::Symbol(symbol)),
        other => return Err(RuntimeError::mismatch("a string", other)),
    };

    Ok(Value::Symbol(scope.env.intern(&name)))
}

/// gensym : string? -> symbol
pub fn gensym(scope: CallScope<'_>) -> Result<Value> {
    let prefix = match scope.args.first() {
        Some(prefix) => display(prefix),
        None => "__gensym".to_string(),
    };

    Ok(Value::Symbol(scope.env.gensym(&prefix)))
}

/// type : a -> symbol
///
/// Typed hashes report their own type name.
pub fn type_of(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    let name = match scope.at(0) {
        Value::Hash(hash) => {
            let name = hash.borrow().type_name().to_string();
            name
        }
        other => other.type_name().to_string(),
    };

    Ok(Value::Symbol(scope.env.intern(&name)))
}

#[cfg(test)]
mod tests {
    use crate::environment::Environment;

    fn eval(source: &str) -> String {
        Environment::new().eval_str(source).unwrap().to_string()
    }

    #[test]
    fn str_concatenates_without_quotes() {
        assert_eq!(eval("(str \"a\" 1 #b nil)"), "\"a1bnil\"");
    }

    #[test]
    fn symbols_are_interned() {
        assert_eq!(eval("(== (symbol \"abc\") 'abc)"), "true");
        assert_eq!(eval("(== (gensym) (gensym))"), "false");
    }

    #[test]
    fn type_names() {
        assert_eq!(eval("(type 1)"), "int");
        assert_eq!(eval("(type (list 1))"), "pair");
        assert_eq!(eval("(type {})"), "hash");
        assert_eq!(eval("(type (record 'Point))"), "Point");
    }
}
