use crate::codec;
use crate::error::{Result, RuntimeError};
use crate::value::{CallScope, Value};

/// json/encode : a -> string
pub fn encode(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    let bytes = codec::encode(&scope.at(0))?;
    let json = String::from_utf8(bytes).map_err(|err| RuntimeError::User(err.to_string()))?;

    Ok(Value::str(json))
}

/// json/decode : string -> a
pub fn decode(scope: CallScope<'_>) -> Result<Value> {
    scope.assert_arity(1)?;

    let json = scope.at(0).assert_string()?;
    codec::decode(json.as_bytes())
}

#[cfg(test)]
mod tests {
    use crate::environment::Environment;

    #[test]
    fn json_round_trip() {
        let mut env = Environment::new();
        let value = env
            .eval_str("(json/decode (json/encode (hash \"a\" [1 2] \"b\" nil)))")
            .unwrap();
        assert_eq!(value.to_string(), "{\"a\" [1 2] \"b\" nil}");
    }
}
