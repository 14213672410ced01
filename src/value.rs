//! This module defines the values that are manipulated by the compiler and the virtual machine.
//! The expression tree consumed by the generator is made of the same values.

use std::{
    cell::RefCell,
    cmp::Ordering,
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::environment::Environment;
use crate::error::{Result, RuntimeError};
use crate::hash::Hash;
use crate::instruction::Instruction;
use crate::scope::Scope;
use crate::symbol::Symbol;

/// A cons cell. A proper list is a chain of pairs terminated by [Value::Null].
#[derive(Debug, Clone)]
pub struct Pair {
    pub head: Value,
    pub tail: Value,
}

impl Drop for Pair {
    /// Unlinks the tail chain in a loop, so dropping a long list does not recurse once per cell.
    fn drop(&mut self) {
        let mut tail = std::mem::take(&mut self.tail);
        while let Value::Pair(pair) = tail {
            match Rc::try_unwrap(pair) {
                Ok(mut pair) => tail = std::mem::take(&mut pair.tail),
                Err(_) => break,
            }
        }
    }
}

/// A finished instruction sequence plus the metadata needed to call it.
pub struct Prototype {
    pub name: Rc<str>,
    pub arity: usize,
    pub variadic: bool,
    pub code: Vec<Instruction>,
    pub form: Value,
}

impl Debug for Prototype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prototype")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .field("code", &self.code.len())
            .finish()
    }
}

/// A closure: a prototype plus the scope it was created in. Macros carry no captured scope and
/// run against the global scope of whichever environment applies them.
#[derive(Debug, Clone)]
pub struct Function {
    pub proto: Rc<Prototype>,
    pub captured: Option<Scope>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.proto.name
    }
}

/// A scope for a built-in function call. The arguments are already evaluated.
pub struct CallScope<'a> {
    pub name: &'static str,
    pub args: Vec<Value>,
    pub env: &'a mut Environment,
}

impl CallScope<'_> {
    pub fn at(&self, nth: usize) -> Value {
        self.args.get(nth).cloned().unwrap_or(Value::Null)
    }

    pub fn assert_arity(&self, size: usize) -> Result<()> {
        if self.args.len() != size {
            Err(self.wrong_arity(size))
        } else {
            Ok(())
        }
    }

    pub fn assert_at_least(&self, size: usize) -> Result<()> {
        if self.args.len() < size {
            Err(self.wrong_arity(size))
        } else {
            Ok(())
        }
    }

    fn wrong_arity(&self, expected: usize) -> RuntimeError {
        RuntimeError::WrongArity {
            name: self.name.to_string(),
            expected,
            got: self.args.len(),
        }
    }
}

pub type Prim = fn(CallScope<'_>) -> Result<Value>;

/// Native functions that can be called from compiled code.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub call: Prim,
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(Rc<str>),
    Raw(Rc<[u8]>),
    Symbol(Symbol),
    Pair(Rc<Pair>),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<Hash>>),
    Function(Rc<Function>),
    Builtin(Builtin),
}

impl Value {
    pub fn cons(head: Value, tail: Value) -> Value {
        Value::Pair(Rc::new(Pair { head, tail }))
    }

    pub fn str(string: impl Into<Rc<str>>) -> Value {
        Value::Str(string.into())
    }

    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    pub fn hash(hash: Hash) -> Value {
        Value::Hash(Rc::new(RefCell::new(hash)))
    }

    /// Builds a proper list out of the values.
    pub fn list_from<I>(iter: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        iter.into_iter()
            .rev()
            .fold(Value::Null, |tail, head| Value::cons(head, tail))
    }

    /// Only `false` and `nil` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A pair is a list iff following its tails ends in `nil`. `nil` itself is the empty list.
    pub fn is_list(&self) -> bool {
        let mut current = self;
        loop {
            match current {
                Value::Null => return true,
                Value::Pair(pair) => current = &pair.tail,
                _ => return false,
            }
        }
    }

    /// Collects the elements of a proper list.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut elements = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Null => return Some(elements),
                Value::Pair(pair) => {
                    elements.push(pair.head.clone());
                    current = &pair.tail;
                }
                _ => return None,
            }
        }
    }

    /// Elements of a list or array.
    pub fn to_sequence(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(array) => Some(array.borrow().clone()),
            value => value.to_vec(),
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn assert_number(&self) -> Result<i64> {
        match self {
            Value::Int(int) => Ok(*int),
            _ => Err(RuntimeError::mismatch("an integer", self)),
        }
    }

    pub fn assert_string(&self) -> Result<Rc<str>> {
        match self {
            Value::Str(string) => Ok(string.clone()),
            _ => Err(RuntimeError::mismatch("a string", self)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Raw(_) => "raw",
            Value::Symbol(_) => "symbol",
            Value::Pair(_) => "pair",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    /// Orders comparable kinds: numbers (mixed int/float), strings, chars, symbols and booleans.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Symbol(a), Value::Symbol(b)) => Some(a.name().cmp(b.name())),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Structural equality over data, identity over functions.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => pairs_equal(a, b),
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b) || a.borrow().equals(&b.borrow()),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (a, b) => a.compare(b) == Some(Ordering::Equal),
        }
    }
}

fn pairs_equal(a: &Rc<Pair>, b: &Rc<Pair>) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    loop {
        if Rc::ptr_eq(&a, &b) {
            return true;
        }
        if !a.head.equals(&b.head) {
            return false;
        }

        let (next_a, next_b) = match (&a.tail, &b.tail) {
            (Value::Pair(x), Value::Pair(y)) => (x.clone(), y.clone()),
            (x, y) => return x.equals(y),
        };
        a = next_a;
        b = next_b;
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

fn write_spaced<'a>(
    f: &mut std::fmt::Formatter<'_>,
    values: impl IntoIterator<Item = &'a Value>,
) -> std::fmt::Result {
    for (i, value) in values.into_iter().enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Bool(bool) => write!(f, "{bool}"),
            Value::Int(int) => write!(f, "{int}"),
            Value::Float(float) if float.is_finite() && float.fract() == 0.0 => {
                write!(f, "{float:.1}")
            }
            Value::Float(float) => write!(f, "{float}"),
            Value::Char(' ') => write!(f, "#space"),
            Value::Char('\n') => write!(f, "#newline"),
            Value::Char('\t') => write!(f, "#tab"),
            Value::Char(chr) => write!(f, "#{chr}"),
            Value::Str(string) => write!(f, "{string:?}"),
            Value::Raw(bytes) => write!(f, "(raw {} bytes)", bytes.len()),
            Value::Symbol(symbol) => write!(f, "{symbol}"),
            Value::Pair(pair) => {
                write!(f, "(")?;
                let mut current = pair.clone();
                loop {
                    write!(f, "{}", current.head)?;
                    match &current.tail {
                        Value::Null => break,
                        Value::Pair(next) => {
                            write!(f, " ")?;
                            current = next.clone();
                        }
                        end => {
                            write!(f, " . {end}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Array(array) => {
                write!(f, "[")?;
                write_spaced(f, array.borrow().iter())?;
                write!(f, "]")
            }
            Value::Hash(hash) => write!(f, "{}", hash.borrow()),
            Value::Function(function) => write!(f, "(fn {})", function.name()),
            Value::Builtin(builtin) => write!(f, "(builtin {})", builtin.name),
        }
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries();
        let flat = entries.iter().flat_map(|(key, value)| [key, value]);
        if self.type_name() == "hash" {
            write!(f, "{{")?;
            write_spaced(f, flat)?;
            write!(f, "}}")
        } else {
            write!(f, "({}", self.type_name())?;
            for value in flat {
                write!(f, " {value}")?;
            }
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_is_only_false_and_nil() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::str("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn improper_pairs_are_not_lists() {
        let proper = Value::list_from(vec![Value::Int(1), Value::Int(2)]);
        let improper = Value::cons(Value::Int(1), Value::Int(2));

        assert!(proper.is_list());
        assert!(!improper.is_list());
        assert_eq!(proper.to_string(), "(1 2)");
        assert_eq!(improper.to_string(), "(1 . 2)");
    }

    #[test]
    fn mixed_numbers_compare() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert!(Value::Int(2).equals(&Value::Float(2.0)));
        assert_eq!(Value::Int(1).compare(&Value::str("1")), None);
    }

    #[test]
    fn long_lists_compare_and_drop_without_recursing() {
        let build = |last| {
            (1..300_000).fold(Value::cons(Value::Int(last), Value::Null), |tail, i| {
                Value::cons(Value::Int(i), tail)
            })
        };
        let (a, b, c) = (build(0), build(0), build(-1));

        assert!(a.equals(&a));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));

        let shared = Value::cons(Value::Int(0), a.clone());
        drop(a);
        assert!(shared.is_list());
        drop(shared);
        drop(b);
    }

    #[test]
    fn rendering() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Char('a').to_string(), "#a");
        assert_eq!(Value::str("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Value::array(vec![Value::Int(1), Value::Null]).to_string(), "[1 nil]");
    }
}
