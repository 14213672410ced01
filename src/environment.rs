//! An environment is the context in which an expression is compiled and run. It owns the symbol
//! table, the global scope, the control stack, the macro table and the external constructors.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
};

use fxhash::FxBuildHasher;
use tracing::debug;

use crate::error::{CompileError, Error, ReadError};
use crate::externs::{Constructor, Externs};
use crate::generator::Generator;
use crate::intrinsics;
use crate::reader;
use crate::scope::Scope;
use crate::stack::Stack;
use crate::symbol::{Symbol, SymbolId, SymbolTable};
use crate::value::{Builtin, Function, Prim, Prototype, Value};

pub type Macros = im_rc::HashMap<SymbolId, Rc<Function>, FxBuildHasher>;

/// Library-level configuration.
#[derive(Debug, Clone)]
pub struct EnvOptions {
    /// Relative `include` paths are resolved against this directory.
    pub include_root: PathBuf,
    /// Maximum number of nested closure calls before the run fails.
    pub max_depth: usize,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            include_root: PathBuf::from("."),
            max_depth: 10_000,
        }
    }
}

pub struct Environment {
    symbols: Rc<RefCell<SymbolTable>>,
    global: Scope,
    pub(crate) stack: Stack,
    pub(crate) depth: usize,
    macros: Macros,
    externs: Externs,
    options: EnvOptions,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::with_options(EnvOptions::default())
    }

    pub fn with_options(options: EnvOptions) -> Self {
        let global = Scope::global();
        let mut stack = Stack::new();
        stack.push_scope(global.clone());

        let mut env = Self {
            symbols: Rc::new(RefCell::new(SymbolTable::new())),
            global,
            stack,
            depth: 0,
            macros: Macros::default(),
            externs: Externs::default(),
            options,
        };
        env.register_intrinsics();
        env
    }

    pub fn register_intrinsics(&mut self) {
        use intrinsics::*;

        self.register_external("+", num::add);
        self.register_external("-", num::sub);
        self.register_external("*", num::mul);
        self.register_external("/", num::div);
        self.register_external("mod", num::modulo);

        self.register_external("==", cmp::eq);
        self.register_external("!=", cmp::neq);
        self.register_external("<", cmp::less_than);
        self.register_external(">", cmp::greater_than);
        self.register_external("<=", cmp::less_equal);
        self.register_external(">=", cmp::greater_equal);
        self.register_external("not", cmp::not);

        self.register_external("list", list::list);
        self.register_external("cons", list::cons);
        self.register_external("first", list::first);
        self.register_external("rest", list::rest);
        self.register_external("len", list::len);
        self.register_external("empty?", list::is_empty);
        self.register_external("list?", list::is_list);
        self.register_external("null?", list::is_null);

        self.register_external("array", vec::array);
        self.register_external("aget", vec::aget);
        self.register_external("aset", vec::aset);
        self.register_external("append", vec::append);

        self.register_external("hash", hashmap::hash);
        self.register_external("hget", hashmap::hget);
        self.register_external("hset", hashmap::hset);
        self.register_external("hdel", hashmap::hdel);
        self.register_external("hkeys", hashmap::hkeys);
        self.register_external("record", hashmap::record);

        self.register_external("str", string::str);
        self.register_external("symbol", string::symbol);
        self.register_external("gensym", string::gensym);
        self.register_external("type", string::type_of);

        self.register_external("print", io::print);
        self.register_external("println", io::println);

        self.register_external("apply", rt::apply);
        self.register_external("map", rt::map);

        self.register_external("json/encode", codec::encode);
        self.register_external("json/decode", codec::decode);
    }

    /// Binds a native function in the global scope.
    pub fn register_external(&mut self, name: &'static str, call: Prim) {
        self.define(name, Value::Builtin(Builtin { name, call }));
    }

    /// Registers a constructor for typed hashes named `type_name`.
    pub fn register_record(&mut self, type_name: &str, constructor: Constructor) {
        self.externs.register(type_name, constructor);
    }

    pub fn externs(&self) -> &Externs {
        &self.externs
    }

    pub fn options(&self) -> &EnvOptions {
        &self.options
    }

    pub fn global(&self) -> &Scope {
        &self.global
    }

    pub fn intern(&self, name: &str) -> Symbol {
        self.symbols.borrow_mut().intern(name)
    }

    pub fn gensym(&self, prefix: &str) -> Symbol {
        self.symbols.borrow_mut().gensym(prefix)
    }

    /// Binds a value in the global scope.
    pub fn define(&mut self, name: &str, value: Value) {
        let symbol = self.intern(name);
        self.global.bind(symbol.id(), value);
    }

    /// Reads a global binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        let symbol = self.intern(name);
        self.global.get_local(symbol.id())
    }

    pub fn has_macro(&self, symbol: &Symbol) -> bool {
        self.macros.contains_key(&symbol.id())
    }

    pub fn find_macro(&self, symbol: &Symbol) -> Option<Rc<Function>> {
        self.macros.get(&symbol.id()).cloned()
    }

    pub fn define_macro(&mut self, symbol: &Symbol, function: Rc<Function>) {
        debug!(name = symbol.name(), "defining macro");
        self.macros.insert(symbol.id(), function);
    }

    /// Forks the environment for macro expansion. The fork shares the symbol table, sees a
    /// copy-on-write copy of the global scope and of the macro table, and gets its own control
    /// stack, so whatever the macro does is invisible to this environment.
    pub fn duplicate(&self) -> Environment {
        let global = self.global.fork();
        let mut stack = Stack::new();
        stack.push_scope(global.clone());

        Environment {
            symbols: self.symbols.clone(),
            global,
            stack,
            depth: 0,
            macros: self.macros.clone(),
            externs: self.externs.clone(),
            options: self.options.clone(),
        }
    }

    /// Parses source text with this environment's symbol table.
    pub fn read(&self, input: &str, file: Option<String>) -> Result<Vec<Value>, ReadError> {
        reader::read(input, file, &mut self.symbols.borrow_mut())
    }

    /// Compiles one top-level expression.
    pub fn compile(&mut self, expr: &Value) -> Result<Rc<Prototype>, CompileError> {
        debug!(%expr, "compiling");
        Generator::new(self).compile_toplevel(expr)
    }

    /// Compiles and runs one expression.
    pub fn eval(&mut self, expr: &Value) -> Result<Value, Error> {
        let proto = self.compile(expr)?;
        Ok(self.run(&proto)?)
    }

    /// Reads, compiles and runs every top-level form of `input`, returning the value of the
    /// last one.
    pub fn eval_str(&mut self, input: &str) -> Result<Value, Error> {
        self.eval_source(input, None)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Value, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| CompileError::Include {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        debug!(path = %path.display(), "loading file");
        self.eval_source(&source, Some(path.display().to_string()))
    }

    fn eval_source(&mut self, input: &str, file: Option<String>) -> Result<Value, Error> {
        let mut last = Value::Null;
        for expr in self.read(input, file)? {
            last = self.eval(&expr)?;
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_isolates_globals() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));

        let mut fork = env.duplicate();
        fork.define("x", Value::Int(2));
        fork.define("y", Value::Int(3));

        assert_eq!(env.get("x"), Some(Value::Int(1)));
        assert_eq!(env.get("y"), None);
        assert_eq!(fork.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn closures_from_before_a_duplicate_write_the_fork() {
        let mut env = Environment::new();
        env.eval_str("(def n 0) (defn bump [] (set n (+ n 1)))").unwrap();

        let mut fork = env.duplicate();
        assert_eq!(fork.eval_str("(bump) (bump)").unwrap(), Value::Int(2));

        assert_eq!(fork.get("n"), Some(Value::Int(2)));
        assert_eq!(env.get("n"), Some(Value::Int(0)));
    }

    #[test]
    fn duplicate_shares_symbols() {
        let env = Environment::new();
        let fork = env.duplicate();

        let a = fork.intern("shared-name");
        assert_eq!(env.intern("shared-name"), a);
    }

    #[test]
    fn eval_str_returns_the_last_value() {
        let mut env = Environment::new();
        let value = env.eval_str("(def a 2) (+ a 40)").unwrap();
        assert_eq!(value, Value::Int(42));
        assert_eq!(env.eval_str("").unwrap(), Value::Null);
    }
}
