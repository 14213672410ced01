//! Registry of external record constructors. A typed hash whose type name has a registered
//! constructor carries the constructor's result alongside its fields.

use std::{any::Any, rc::Rc};

use fxhash::FxBuildHasher;
use im_rc::HashMap;

use crate::error::Result;
use crate::hash::Hash;
use crate::value::Value;

/// Builds a native record out of the fields of a typed hash.
pub type Constructor = fn(&Hash) -> Result<Rc<dyn Any>>;

#[derive(Clone, Default)]
pub struct Externs {
    constructors: HashMap<Rc<str>, Constructor, FxBuildHasher>,
}

impl std::fmt::Debug for Externs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl Externs {
    pub fn register(&mut self, type_name: &str, constructor: Constructor) {
        self.constructors.insert(type_name.into(), constructor);
    }

    /// Does the name resolve to an external constructor?
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Builds a hash of the given type from alternating keys and values, attaching the external
    /// record when a constructor is registered for the type.
    pub fn build(&self, type_name: &str, flat: &[Value]) -> Result<Value> {
        let mut hash = Hash::from_pairs(type_name, flat)?;

        if let Some(constructor) = self.constructors.get(type_name) {
            let record = constructor(&hash)?;
            hash.attach_record(record);
        }

        Ok(Value::hash(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    fn point(hash: &Hash) -> Result<Rc<dyn Any>> {
        let x = hash.get(&Value::str("x"))?.assert_number()?;
        let y = hash.get(&Value::str("y"))?.assert_number()?;
        Ok(Rc::new(Point { x, y }))
    }

    #[test]
    fn registered_types_get_a_record() {
        let mut externs = Externs::default();
        externs.register("Point", point);

        let value = externs
            .build("Point", &[Value::str("x"), Value::Int(1), Value::str("y"), Value::Int(2)])
            .unwrap();

        let Value::Hash(hash) = value else {
            panic!("expected a hash");
        };
        assert_eq!(hash.borrow().to_string(), "(Point \"x\" 1 \"y\" 2)");
        assert_eq!(*hash.borrow().record::<Point>().unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn constructor_failures_propagate() {
        let mut externs = Externs::default();
        externs.register("Point", point);

        let err = externs.build("Point", &[Value::str("x"), Value::Int(1)]).unwrap_err();
        assert!(matches!(err, RuntimeError::KeyNotFound(_)));
    }

    #[test]
    fn unknown_types_are_plain_hashes() {
        let externs = Externs::default();
        assert!(!externs.contains("Point"));

        let Value::Hash(hash) = externs.build("Point", &[]).unwrap() else {
            panic!("expected a hash");
        };
        assert!(hash.borrow().record::<Point>().is_none());
    }
}
