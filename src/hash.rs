//! Ordered hashes. Keys are bucketed by a normalized projection and collisions are resolved by
//! structural comparison, while a separate key-order list remembers insertion order.

use std::{any::Any, fmt::Debug, rc::Rc};

use fxhash::FxHashMap;

use crate::error::{Result, RuntimeError};
use crate::value::Value;

/// Projects a key to its bucket. Numbers that compare equal land in the same bucket.
pub fn hash_key(key: &Value) -> Result<i64> {
    match key {
        Value::Int(int) => Ok(*int),
        Value::Float(float) if float.fract() == 0.0 && float.is_finite() => Ok(*float as i64),
        Value::Float(float) => Ok(float.to_bits() as i64),
        Value::Char(chr) => Ok(*chr as i64),
        Value::Bool(bool) => Ok(*bool as i64),
        Value::Symbol(symbol) => Ok(symbol.id().index() as i64),
        Value::Str(string) => Ok(fxhash::hash64(&**string) as i64),
        other => Err(RuntimeError::CannotHash(other.to_string())),
    }
}

#[derive(Clone)]
pub struct Hash {
    type_name: Rc<str>,
    buckets: FxHashMap<i64, Vec<(Value, Value)>>,
    key_order: Vec<Value>,
    count: usize,
    record: Option<Rc<dyn Any>>,
}

impl Default for Hash {
    fn default() -> Self {
        Self::new("hash")
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hash")
            .field("type_name", &self.type_name)
            .field("keys", &self.key_order)
            .field("record", &self.record.is_some())
            .finish()
    }
}

impl Hash {
    pub fn new(type_name: impl Into<Rc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            buckets: FxHashMap::default(),
            key_order: Vec::new(),
            count: 0,
            record: None,
        }
    }

    /// Builds a hash out of alternating keys and values.
    pub fn from_pairs(type_name: impl Into<Rc<str>>, flat: &[Value]) -> Result<Self> {
        if flat.len() % 2 != 0 {
            return Err("hash requires even number of arguments".into());
        }

        let mut hash = Hash::new(type_name);
        for pair in flat.chunks(2) {
            hash.set(pair[0].clone(), pair[1].clone())?;
        }
        Ok(hash)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Replaces an existing binding in place, keeping its position, or appends a new key.
    pub fn set(&mut self, key: Value, value: Value) -> Result<()> {
        let bucket = self.buckets.entry(hash_key(&key)?).or_default();

        if let Some(entry) = bucket.iter_mut().find(|(k, _)| k.equals(&key)) {
            entry.1 = value;
            return Ok(());
        }

        bucket.push((key.clone(), value));
        self.key_order.push(key);
        self.count += 1;
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Value> {
        self.lookup(key)?
            .ok_or_else(|| RuntimeError::KeyNotFound(key.to_string()))
    }

    pub fn get_or(&self, key: &Value, default: Value) -> Result<Value> {
        Ok(self.lookup(key)?.unwrap_or(default))
    }

    fn lookup(&self, key: &Value) -> Result<Option<Value>> {
        let Some(bucket) = self.buckets.get(&hash_key(key)?) else {
            return Ok(None);
        };

        Ok(bucket
            .iter()
            .find(|(k, _)| k.equals(key))
            .map(|(_, value)| value.clone()))
    }

    /// Removes the key from its bucket and from the key order. Absent keys are ignored.
    pub fn delete(&mut self, key: &Value) -> Result<()> {
        let hashed = hash_key(key)?;
        let Some(bucket) = self.buckets.get_mut(&hashed) else {
            return Ok(());
        };

        let Some(index) = bucket.iter().position(|(k, _)| k.equals(key)) else {
            return Ok(());
        };

        bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&hashed);
        }

        if let Some(position) = self.key_order.iter().position(|k| k.equals(key)) {
            self.key_order.remove(position);
        }

        self.count -= 1;
        Ok(())
    }

    /// Number of keys.
    ///
    /// # Panics
    ///
    /// When the maintained count disagrees with the bucket contents or the key order. That can
    /// only happen if the hash itself is corrupted.
    pub fn len(&self) -> usize {
        let stored: usize = self.buckets.values().map(Vec::len).sum();
        if stored != self.count || self.key_order.len() != self.count {
            panic!(
                "hash count disagreement: buckets={stored}, count={}, key order={}",
                self.count,
                self.key_order.len()
            );
        }
        stored
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> &[Value] {
        &self.key_order
    }

    /// Key/value pairs in key order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.key_order
            .iter()
            .filter_map(|key| Some((key.clone(), self.lookup(key).ok()??)))
            .collect()
    }

    pub fn equals(&self, other: &Hash) -> bool {
        self.type_name == other.type_name
            && self.count == other.count
            && self.entries().iter().all(|(key, value)| {
                matches!(other.lookup(key), Ok(Some(found)) if found.equals(value))
            })
    }

    pub fn attach_record(&mut self, record: Rc<dyn Any>) {
        self.record = Some(record);
    }

    /// The external record attached by a registered constructor, if it has type `T`.
    pub fn record<T: Any>(&self) -> Option<Rc<T>> {
        self.record.clone()?.downcast::<T>().ok()
    }

    #[cfg(test)]
    pub(crate) fn corrupt_count(&mut self) {
        self.count += 1;
    }
}
