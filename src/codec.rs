//! JSON encoding of values. Lists and arrays become JSON arrays, hashes become objects. A typed
//! hash records its type name under the `Atype` key so that decoding gives it back.

use serde_json::{Map, Number, Value as Json};

use crate::error::{Result, RuntimeError};
use crate::hash::Hash;
use crate::value::Value;

const TYPE_KEY: &str = "Atype";

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let json = to_json(value)?;
    serde_json::to_vec(&json).map_err(|err| RuntimeError::User(err.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Value> {
    let json: Json = serde_json::from_slice(bytes)
        .map_err(|err| RuntimeError::User(format!("invalid json: {err}")))?;
    from_json(&json)
}

fn key_string(key: &Value) -> String {
    match key {
        Value::Str(string) => string.to_string(),
        Value::Symbol(symbol) => symbol.name().to_string(),
        Value::Char(chr) => chr.to_string(),
        other => other.to_string(),
    }
}

fn to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(bool) => Json::Bool(*bool),
        Value::Int(int) => Json::Number((*int).into()),
        Value::Float(float) => Number::from_f64(*float)
            .map(Json::Number)
            .ok_or_else(|| RuntimeError::mismatch("a finite float", value))?,
        Value::Char(chr) => Json::String(chr.to_string()),
        Value::Str(string) => Json::String(string.to_string()),
        Value::Symbol(symbol) => Json::String(symbol.name().to_string()),
        Value::Raw(bytes) => Json::Array(bytes.iter().map(|byte| Json::from(*byte)).collect()),
        Value::Pair(_) => {
            let elements = value
                .to_vec()
                .ok_or_else(|| RuntimeError::mismatch("a proper list", value))?;
            Json::Array(elements.iter().map(to_json).collect::<Result<_>>()?)
        }
        Value::Array(array) => {
            Json::Array(array.borrow().iter().map(to_json).collect::<Result<_>>()?)
        }
        Value::Hash(hash) => {
            let hash = hash.borrow();
            let mut object = Map::new();
            if hash.type_name() != "hash" {
                object.insert(TYPE_KEY.to_string(), Json::String(hash.type_name().to_string()));
            }
            for (key, value) in hash.entries() {
                object.insert(key_string(&key), to_json(&value)?);
            }
            Json::Object(object)
        }
        Value::Function(_) | Value::Builtin(_) => {
            return Err(RuntimeError::mismatch("encodable data", value))
        }
    })
}

fn from_json(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(bool) => Value::Bool(*bool),
        Json::Number(number) => match number.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(string) => Value::str(string.as_str()),
        Json::Array(elements) => Value::array(elements.iter().map(from_json).collect::<Result<_>>()?),
        Json::Object(object) => {
            let type_name = match object.get(TYPE_KEY) {
                Some(Json::String(name)) => name.as_str(),
                _ => "hash",
            };

            let mut hash = Hash::new(type_name);
            for (key, value) in object {
                if key == TYPE_KEY {
                    continue;
                }
                hash.set(Value::str(key.as_str()), from_json(value)?)?;
            }
            Value::hash(hash)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_encode_as_arrays() {
        let list = Value::list_from([Value::Int(1), Value::str("two"), Value::Null]);
        assert_eq!(encode(&list).unwrap(), br#"[1,"two",null]"#);

        let back = decode(br#"[1,"two",null]"#).unwrap();
        assert_eq!(back.to_string(), "[1 \"two\" nil]");
    }

    #[test]
    fn typed_hashes_keep_their_type() {
        let mut hash = Hash::new("Point");
        hash.set(Value::str("x"), Value::Int(1)).unwrap();

        let bytes = encode(&Value::hash(hash)).unwrap();
        let value = decode(&bytes).unwrap();
        assert_eq!(value.to_string(), "(Point \"x\" 1)");
    }

    #[test]
    fn floats_stay_floats() {
        assert_eq!(decode(b"2.5").unwrap(), Value::Float(2.5));
        assert!(matches!(decode(b"3").unwrap(), Value::Int(3)));
    }

    #[test]
    fn functions_cannot_be_encoded() {
        let mut env = crate::environment::Environment::new();
        let function = env.eval_str("(fn [] 1)").unwrap();
        assert!(matches!(
            encode(&function),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(decode(b"{").is_err());
    }
}
