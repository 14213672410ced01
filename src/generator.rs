//! The generator turns expressions into instruction sequences. It dispatches on special forms,
//! expands macros by running them in a forked environment, and compiles every other list into a
//! call.
//!
//! A few shapes are worth knowing when reading the generated code:
//!
//! - `cond` and `and`/`or` are built back to front, so every branch already knows how long the
//!   code it skips is.
//! - A call in tail position to the function being compiled becomes a [Instruction::SelfTailCall]
//!   after removing the scopes opened since the function was entered. The check compares names,
//!   so recursion through an alias is an ordinary call.
//! - `for` loops record their `break`/`continue` targets as offsets from their `LoopStart`, which
//!   are only filled in once the whole loop has been laid out.

use std::{path::Path, rc::Rc};

use tracing::debug;

use crate::environment::Environment;
use crate::error::CompileError;
use crate::instruction::{Instruction, Loop, LoopOffsets};
use crate::symbol::{SpecialForm, Symbol};
use crate::value::{Function, Pair, Prototype, Value};

type Result<T, E = CompileError> = std::result::Result<T, E>;

pub struct Generator<'a> {
    env: &'a mut Environment,
    /// Name of the function being compiled, used to recognize self tail calls.
    function: Option<Rc<str>>,
    tail: bool,
    /// Scopes opened by `let` since the function was entered.
    scopes: usize,
    /// Enclosing `for` loops of the current function, innermost last.
    loops: Vec<Rc<Loop>>,
    code: Vec<Instruction>,
}

impl<'a> Generator<'a> {
    pub fn new(env: &'a mut Environment) -> Self {
        Self {
            env,
            function: None,
            tail: false,
            scopes: 0,
            loops: Vec::new(),
            code: Vec::new(),
        }
    }

    /// Compiles one top-level expression into a prototype that takes no arguments.
    pub fn compile_toplevel(mut self, expr: &Value) -> Result<Rc<Prototype>> {
        self.generate(expr)?;

        Ok(Rc::new(Prototype {
            name: "toplevel".into(),
            arity: 0,
            variadic: false,
            code: self.code,
            form: expr.clone(),
        }))
    }

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    /// Runs `f` against an empty instruction buffer and returns what it emitted.
    fn capture<F>(&mut self, tail: bool, f: F) -> Result<Vec<Instruction>>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let outer = std::mem::take(&mut self.code);
        let outer_tail = std::mem::replace(&mut self.tail, tail);

        let result = f(self);

        self.tail = outer_tail;
        let captured = std::mem::replace(&mut self.code, outer);
        result.map(|()| captured)
    }

    pub fn generate(&mut self, expr: &Value) -> Result<()> {
        match expr {
            Value::Symbol(symbol) => {
                self.emit(Instruction::Lookup(symbol.clone()));
                Ok(())
            }
            Value::Pair(pair) if expr.is_list() => {
                self.generate_call(pair, expr)
                    .map_err(|source| CompileError::Context {
                        form: expr.to_string(),
                        source: Box::new(source),
                    })
            }
            Value::Array(array) => {
                let elements = array.borrow().clone();
                self.generate_all(&elements)?;
                self.emit(Instruction::MakeArray(elements.len()));
                Ok(())
            }
            _ => {
                self.emit(Instruction::Push(expr.clone()));
                Ok(())
            }
        }
    }

    /// Generates each expression in order, none of them in tail position.
    fn generate_all(&mut self, exprs: &[Value]) -> Result<()> {
        let tail = std::mem::replace(&mut self.tail, false);
        let result = exprs.iter().try_for_each(|expr| self.generate(expr));
        self.tail = tail;
        result
    }

    /// Generates a value that is consumed by the surrounding form.
    fn generate_value(&mut self, expr: &Value) -> Result<()> {
        self.generate_all(std::slice::from_ref(expr))
    }

    fn generate_call(&mut self, pair: &Pair, form: &Value) -> Result<()> {
        let args = pair.tail.to_vec().unwrap_or_default();

        match &pair.head {
            Value::Symbol(symbol) => self.generate_call_by_symbol(symbol, &args, form),
            callee => {
                self.generate_all(&args)?;
                self.generate_value(callee)?;
                self.emit(Instruction::Dispatch { argc: args.len() });
                Ok(())
            }
        }
    }

    fn generate_call_by_symbol(&mut self, symbol: &Symbol, args: &[Value], form: &Value) -> Result<()> {
        if let Some(special) = symbol.special_form() {
            return self.generate_special(special, args, form);
        }

        if let Some(function) = self.env.find_macro(symbol) {
            let expansion = self.expand(&function, args)?;
            return self.generate(&expansion);
        }

        self.generate_all(args)?;

        if self.tail && self.function.as_deref() == Some(symbol.name()) {
            for _ in 0..self.scopes {
                self.emit(Instruction::RemoveScope);
            }
            self.emit(Instruction::SelfTailCall { argc: args.len() });
        } else {
            self.emit(Instruction::Call {
                name: symbol.clone(),
                argc: args.len(),
            });
        }

        Ok(())
    }

    fn generate_special(&mut self, special: SpecialForm, args: &[Value], form: &Value) -> Result<()> {
        match special {
            SpecialForm::And => self.generate_short_circuit(false, args),
            SpecialForm::Or => self.generate_short_circuit(true, args),
            SpecialForm::Cond => self.generate_cond(args),
            SpecialForm::Quote => self.generate_quote(args),
            SpecialForm::Def => self.generate_def("def", args),
            SpecialForm::Setq => self.generate_def("setq", args),
            SpecialForm::Mdef => self.generate_multi_def(args),
            SpecialForm::Set => self.generate_set(args),
            SpecialForm::Fn => self.generate_fn(args, form),
            SpecialForm::Defn => self.generate_defn(args, form),
            SpecialForm::Defmac => self.generate_defmac(args, form),
            SpecialForm::Begin => self.generate_begin(args),
            SpecialForm::Let => self.generate_let(false, args),
            SpecialForm::LetStar => self.generate_let(true, args),
            SpecialForm::Assert => self.generate_assert(args),
            SpecialForm::Macexpand => self.generate_macexpand(args),
            SpecialForm::SyntaxQuote => {
                let [expr] = args else {
                    return Err(CompileError::WrongArgs("syntax-quote"));
                };
                self.generate_syntax_quote(expr)
            }
            SpecialForm::Include => self.generate_include(args),
            SpecialForm::For => self.generate_for(args),
            SpecialForm::Break => self.generate_loop_exit(false, args),
            SpecialForm::Continue => self.generate_loop_exit(true, args),
        }
    }

    /// Applies a macro to the unevaluated arguments in a fork of the environment.
    fn expand(&mut self, function: &Rc<Function>, args: &[Value]) -> Result<Value> {
        debug!(name = function.name(), "expanding macro");

        let mut env = self.env.duplicate();
        env.apply(&Value::Function(function.clone()), args.to_vec())
            .map_err(|err| CompileError::Expansion(Box::new(err)))
    }

    /// Every expression but the last is evaluated for its effects and discarded.
    pub fn generate_begin(&mut self, exprs: &[Value]) -> Result<()> {
        let Some((last, init)) = exprs.split_last() else {
            return Err(CompileError::NoExpressions);
        };

        for expr in init {
            self.generate_value(expr)?;
            for _ in 0..pushed_values(expr) {
                self.emit(Instruction::Pop);
            }
        }

        self.generate(last)
    }

    fn generate_short_circuit(&mut self, or: bool, args: &[Value]) -> Result<()> {
        let Some((last, init)) = args.split_last() else {
            self.emit(Instruction::Push(Value::Bool(!or)));
            return Ok(());
        };

        let tail = self.tail;
        let mut code = self.capture(tail, |g| g.generate(last))?;

        for arg in init.iter().rev() {
            let mut guard = self.capture(false, |g| g.generate(arg))?;
            guard.push(Instruction::Dup);
            guard.push(Instruction::Branch {
                when: or,
                offset: code.len() as isize + 2,
            });
            guard.push(Instruction::Pop);
            guard.append(&mut code);
            code = guard;
        }

        self.code.append(&mut code);
        Ok(())
    }

    fn generate_cond(&mut self, args: &[Value]) -> Result<()> {
        let Some((default, clauses)) = args.split_last() else {
            return Err(CompileError::MissingDefault);
        };

        if clauses.len() % 2 != 0 {
            return Err(CompileError::MissingDefault);
        }

        let tail = self.tail;
        let mut code = self.capture(tail, |g| g.generate(default))?;

        for clause in clauses.chunks(2).rev() {
            let mut branch = self.capture(false, |g| g.generate(&clause[0]))?;
            let mut body = self.capture(tail, |g| g.generate(&clause[1]))?;

            branch.push(Instruction::Branch {
                when: false,
                offset: body.len() as isize + 2,
            });
            branch.append(&mut body);
            branch.push(Instruction::Jump(code.len() as isize + 1));
            branch.append(&mut code);
            code = branch;
        }

        self.code.append(&mut code);
        Ok(())
    }

    /// Pushes every argument verbatim. With more than one argument the form leaves several values
    /// on the stack, which only `begin` knows how to discard.
    fn generate_quote(&mut self, args: &[Value]) -> Result<()> {
        if args.is_empty() {
            return Err(CompileError::WrongArgs("quote"));
        }

        for expr in args {
            self.emit(Instruction::Push(expr.clone()));
        }
        Ok(())
    }

    fn expect_symbol<'v>(&self, form: &'static str, expr: &'v Value) -> Result<&'v Symbol> {
        expr.as_symbol().ok_or_else(|| CompileError::ExpectedSymbol {
            form,
            found: expr.to_string(),
        })
    }

    fn assert_not_macro(&self, symbol: &Symbol) -> Result<()> {
        if self.env.has_macro(symbol) {
            return Err(CompileError::MacroNameClash(symbol.name().to_string()));
        }
        Ok(())
    }

    fn generate_def(&mut self, form: &'static str, args: &[Value]) -> Result<()> {
        let [name, value] = args else {
            return Err(CompileError::WrongArgs(form));
        };

        let symbol = self.expect_symbol(form, name)?;
        self.assert_not_macro(symbol)?;

        self.generate_value(value)?;
        self.emit(Instruction::Dup);
        self.emit(Instruction::Bind(symbol.clone()));
        Ok(())
    }

    fn generate_set(&mut self, args: &[Value]) -> Result<()> {
        let [name, value] = args else {
            return Err(CompileError::WrongArgs("set"));
        };

        let symbol = self.expect_symbol("set", name)?;
        self.assert_not_macro(symbol)?;

        self.generate_value(value)?;
        self.emit(Instruction::Dup);
        self.emit(Instruction::Update(symbol.clone()));
        Ok(())
    }

    /// `(mdef a b c (list 1 2 3))` binds `a`, `b` and `c` positionally. Targets may also be
    /// quoted symbols, which is what macros building an `mdef` usually produce.
    fn generate_multi_def(&mut self, args: &[Value]) -> Result<()> {
        let Some((value, targets)) = args.split_last() else {
            return Err(CompileError::WrongArgs("mdef"));
        };

        if targets.is_empty() {
            return Err(CompileError::WrongArgs("mdef"));
        }

        let mut symbols = Vec::with_capacity(targets.len());
        for target in targets {
            let symbol = match target {
                Value::Symbol(symbol) => {
                    self.assert_not_macro(symbol)?;
                    symbol.clone()
                }
                target => quoted_symbol(target).ok_or_else(|| CompileError::ExpectedSymbol {
                    form: "mdef",
                    found: target.to_string(),
                })?,
            };
            symbols.push(symbol);
        }

        self.generate_value(value)?;
        self.emit(Instruction::Dup);
        self.emit(Instruction::BindList(symbols.into()));
        Ok(())
    }

    fn generate_fn(&mut self, args: &[Value], form: &Value) -> Result<()> {
        let [params, body @ ..] = args else {
            return Err(CompileError::Malformed {
                form: "fn",
                reason: "expected a parameter vector and a body",
            });
        };

        if body.is_empty() {
            return Err(CompileError::Malformed {
                form: "fn",
                reason: "expected a parameter vector and a body",
            });
        }

        let proto = self.build_function(None, params, body, form)?;
        self.emit(Instruction::PushClosure(proto));
        Ok(())
    }

    fn generate_defn(&mut self, args: &[Value], form: &Value) -> Result<()> {
        let [name, params, body @ ..] = args else {
            return Err(CompileError::WrongArgs("defn"));
        };

        if body.is_empty() {
            return Err(CompileError::WrongArgs("defn"));
        }

        let symbol = self.expect_symbol("defn", name)?;
        self.assert_not_macro(symbol)?;

        let proto = self.build_function(Some(symbol), params, body, form)?;
        self.emit(Instruction::PushClosure(proto));
        self.emit(Instruction::Dup);
        self.emit(Instruction::Bind(symbol.clone()));
        Ok(())
    }

    fn generate_defmac(&mut self, args: &[Value], form: &Value) -> Result<()> {
        let [name, params, body @ ..] = args else {
            return Err(CompileError::WrongArgs("defmac"));
        };

        if body.is_empty() {
            return Err(CompileError::WrongArgs("defmac"));
        }

        let symbol = self.expect_symbol("defmac", name)?;
        let proto = self.build_function(Some(symbol), params, body, form)?;

        self.env.define_macro(
            symbol,
            Rc::new(Function {
                proto,
                captured: None,
            }),
        );
        self.emit(Instruction::Push(Value::Null));
        Ok(())
    }

    /// Compiles a function body into its own prototype. Arguments arrive on the stack in
    /// evaluation order, so the parameters are bound last to first.
    fn build_function(
        &mut self,
        name: Option<&Symbol>,
        params: &Value,
        body: &[Value],
        form: &Value,
    ) -> Result<Rc<Prototype>> {
        let Value::Array(params) = params else {
            return Err(CompileError::Malformed {
                form: "fn",
                reason: "function arguments must be in vector",
            });
        };

        let mut symbols = params
            .borrow()
            .iter()
            .map(|param| self.expect_symbol("fn", param).cloned())
            .collect::<Result<Vec<_>>>()?;

        let variadic = symbols.len() >= 2 && symbols[symbols.len() - 2].name() == "&";
        if variadic {
            let marker = symbols.len() - 2;
            symbols.swap_remove(marker);
        }

        let arity = if variadic {
            symbols.len() - 1
        } else {
            symbols.len()
        };

        let name: Rc<str> = match name {
            Some(symbol) => symbol.name().into(),
            None => self.env.gensym("__anon").name().into(),
        };

        let mut generator = Generator {
            env: &mut *self.env,
            function: Some(name.clone()),
            tail: true,
            scopes: 0,
            loops: Vec::new(),
            code: Vec::new(),
        };

        for symbol in symbols.iter().rev() {
            generator.emit(Instruction::Bind(symbol.clone()));
        }
        generator.generate_begin(body)?;
        generator.emit(Instruction::Return);

        Ok(Rc::new(Prototype {
            name,
            arity,
            variadic,
            code: generator.code,
            form: form.clone(),
        }))
    }

    fn generate_let(&mut self, sequential: bool, args: &[Value]) -> Result<()> {
        let name = if sequential { "let*" } else { "let" };

        let [bindings, body @ ..] = args else {
            return Err(CompileError::Malformed {
                form: name,
                reason: "expected a binding vector and a body",
            });
        };

        let Value::Array(bindings) = bindings else {
            return Err(CompileError::Malformed {
                form: name,
                reason: "let bindings must be in array",
            });
        };

        let bindings = bindings.borrow().clone();
        if bindings.len() % 2 != 0 {
            return Err(CompileError::UnevenBindings(name));
        }

        let mut targets = Vec::with_capacity(bindings.len() / 2);
        let mut values = Vec::with_capacity(bindings.len() / 2);
        for pair in bindings.chunks(2) {
            targets.push(self.expect_symbol(name, &pair[0])?.clone());
            values.push(pair[1].clone());
        }

        self.emit(Instruction::AddScope);
        self.scopes += 1;

        if sequential {
            for (target, value) in targets.iter().zip(&values) {
                self.generate_value(value)?;
                self.emit(Instruction::Bind(target.clone()));
            }
        } else {
            self.generate_all(&values)?;
            for target in targets.iter().rev() {
                self.emit(Instruction::Bind(target.clone()));
            }
        }

        self.generate_begin(body)?;

        self.emit(Instruction::RemoveScope);
        self.scopes -= 1;
        Ok(())
    }

    fn generate_assert(&mut self, args: &[Value]) -> Result<()> {
        let [condition] = args else {
            return Err(CompileError::WrongArgs("assert"));
        };

        self.generate_value(condition)?;
        self.emit(Instruction::Branch {
            when: true,
            offset: 2,
        });
        self.emit(Instruction::Raise(condition.to_string().into()));
        self.emit(Instruction::Push(Value::Null));
        Ok(())
    }

    fn generate_macexpand(&mut self, args: &[Value]) -> Result<()> {
        let [expr] = args else {
            return Err(CompileError::WrongArgs("macexpand"));
        };

        let call = match expr {
            Value::Pair(pair) if expr.is_list() => pair
                .head
                .as_symbol()
                .and_then(|head| self.env.find_macro(head))
                .map(|function| (function, pair.tail.to_vec().unwrap_or_default())),
            _ => None,
        };

        let expansion = match call {
            Some((function, args)) => self.expand(&function, &args)?,
            None => expr.clone(),
        };

        self.emit(Instruction::Push(expansion));
        Ok(())
    }

    fn generate_syntax_quote(&mut self, expr: &Value) -> Result<()> {
        match expr {
            Value::Array(array) => {
                let elements = array.borrow().clone();
                self.generate_syntax_quote_array(&elements)
            }
            Value::Pair(_) if expr.is_list() => self.generate_syntax_quote_list(expr),
            Value::Hash(hash) => {
                let (type_name, entries) = {
                    let hash = hash.borrow();
                    (Rc::<str>::from(hash.type_name()), hash.entries())
                };
                self.generate_syntax_quote_hash(type_name, &entries)
            }
            _ => {
                self.emit(Instruction::Push(expr.clone()));
                Ok(())
            }
        }
    }

    fn generate_syntax_quote_list(&mut self, list: &Value) -> Result<()> {
        let body = list.to_vec().unwrap_or_default();

        if let [Value::Symbol(head), inner] = body.as_slice() {
            match head.name() {
                "unquote" => return self.generate_value(inner),
                "unquote-splicing" => {
                    self.generate_value(inner)?;
                    self.emit(Instruction::Explode);
                    return Ok(());
                }
                _ => {}
            }
        }

        self.emit(Instruction::PushMarker);
        for expr in &body {
            self.generate_syntax_quote(expr)?;
        }
        self.emit(Instruction::Squash);
        Ok(())
    }

    /// Wraps one member so that whatever it produces, spliced or not, lands flat on the stack.
    fn generate_syntax_quote_member(&mut self, expr: &Value) -> Result<()> {
        self.emit(Instruction::PushMarker);
        self.generate_syntax_quote(expr)?;
        self.emit(Instruction::Squash);
        self.emit(Instruction::Explode);
        Ok(())
    }

    fn generate_syntax_quote_array(&mut self, elements: &[Value]) -> Result<()> {
        self.emit(Instruction::PushMarker);
        for expr in elements {
            self.generate_syntax_quote_member(expr)?;
        }
        self.emit(Instruction::Vectorize);
        Ok(())
    }

    /// Pairs are emitted last to first, value before key, so that popping them back rebuilds the
    /// hash in its original order.
    fn generate_syntax_quote_hash(&mut self, type_name: Rc<str>, entries: &[(Value, Value)]) -> Result<()> {
        self.emit(Instruction::PushMarker);
        for (key, value) in entries.iter().rev() {
            self.generate_syntax_quote_member(value)?;
            self.generate_syntax_quote_member(key)?;
        }
        self.emit(Instruction::Hashize { type_name });
        Ok(())
    }

    fn generate_include(&mut self, args: &[Value]) -> Result<()> {
        if args.is_empty() {
            return Err(CompileError::WrongArgs("include"));
        }

        let mut exprs = Vec::new();
        for arg in args {
            self.collect_include(arg, &mut exprs)?;
        }

        if exprs.is_empty() {
            self.emit(Instruction::Push(Value::Null));
            return Ok(());
        }

        self.generate_begin(&exprs)
    }

    /// Reads every source named by `item`, which is a path or a list or array of them.
    fn collect_include(&mut self, item: &Value, exprs: &mut Vec<Value>) -> Result<()> {
        match item {
            Value::Str(path) => {
                let path = self.env.options().include_root.join(Path::new(&**path));
                debug!(path = %path.display(), "including");

                let include_error = |reason: String| CompileError::Include {
                    path: path.display().to_string(),
                    reason,
                };

                let source =
                    std::fs::read_to_string(&path).map_err(|err| include_error(err.to_string()))?;
                let read = self
                    .env
                    .read(&source, Some(path.display().to_string()))
                    .map_err(|err| include_error(err.to_string()))?;

                exprs.extend(read);
                Ok(())
            }
            Value::Array(array) => {
                let items = array.borrow().clone();
                items.iter().try_for_each(|item| self.collect_include(item, exprs))
            }
            Value::Pair(_) if item.is_list() => {
                let items = item.to_vec().unwrap_or_default();
                items.iter().try_for_each(|item| self.collect_include(item, exprs))
            }
            other => Err(CompileError::IncludeTarget(other.to_string())),
        }
    }

    /// C-style loop. The layout is:
    ///
    /// ```text
    ///   loop-start; loop-marker
    ///   init; pop-until
    ///   jump test
    /// advance:                      <- continue
    ///   advance; pop-until
    /// test:
    ///   test; branch-false exit
    ///   body; pop-until
    ///   jump advance
    /// exit:                         <- break
    ///   clear-marker; push nil
    /// ```
    ///
    /// The loop does not open a scope, so bindings made in the body stay visible after it.
    fn generate_for(&mut self, args: &[Value]) -> Result<()> {
        let [control, body @ ..] = args else {
            return Err(CompileError::Malformed {
                form: "for",
                reason: "expected a control vector and a body",
            });
        };

        if body.is_empty() {
            return Err(CompileError::Malformed {
                form: "for",
                reason: "expected a control vector and a body",
            });
        }

        let control = match control {
            Value::Array(array) if array.borrow().len() == 3 => array.borrow().clone(),
            _ => {
                return Err(CompileError::Malformed {
                    form: "for",
                    reason: "first argument must be a vector of [init predicate advance]",
                })
            }
        };

        let label = self.env.gensym("__loop");
        let lp = Rc::new(Loop::new(label.clone()));

        self.loops.push(lp.clone());
        let body = self.capture(false, |g| g.generate_begin(body));
        self.loops.pop();

        let mut body = body?;
        body.push(Instruction::PopUntilLoopMarker(label.clone()));

        let mut init = self.capture(false, |g| g.generate(&control[0]))?;
        init.push(Instruction::PopUntilLoopMarker(label.clone()));

        let mut test = self.capture(false, |g| g.generate(&control[1]))?;

        let mut advance = self.capture(false, |g| g.generate(&control[2]))?;
        advance.push(Instruction::PopUntilLoopMarker(label.clone()));

        let start = self.code.len();
        self.emit(Instruction::LoopStart(lp.clone()));
        self.emit(Instruction::PushLoopMarker(label.clone()));

        self.emit(Instruction::Label(format!("init of {label}").into()));
        self.code.append(&mut init);
        self.emit(Instruction::Jump(advance.len() as isize + 2));

        let continue_pos = self.code.len();
        self.emit(Instruction::Label(format!("advance of {label}").into()));
        self.code.append(&mut advance);
        self.emit(Instruction::Label(format!("test of {label}").into()));
        self.code.append(&mut test);
        self.emit(Instruction::Branch {
            when: false,
            offset: body.len() as isize + 3,
        });

        self.emit(Instruction::Label(format!("body of {label}").into()));
        self.code.append(&mut body);
        let back = continue_pos as isize - self.code.len() as isize;
        self.emit(Instruction::Jump(back));
        self.emit(Instruction::Label(format!("end of {label}").into()));

        let exit = self.code.len();
        self.emit(Instruction::ClearLoopMarker(label));
        self.emit(Instruction::Push(Value::Null));

        lp.finalize(LoopOffsets {
            loop_len: self.code.len() - start,
            break_offset: exit - start,
            continue_offset: continue_pos - start,
        });

        Ok(())
    }

    fn generate_loop_exit(&mut self, is_continue: bool, args: &[Value]) -> Result<()> {
        let name = if is_continue { "continue" } else { "break" };

        if !args.is_empty() {
            return Err(CompileError::WrongArgs(name));
        }

        let Some(lp) = self.loops.last().cloned() else {
            return Err(CompileError::OutsideLoop(name));
        };

        self.emit(if is_continue {
            Instruction::Continue(lp)
        } else {
            Instruction::Break(lp)
        });
        Ok(())
    }
}

/// Extracts `sym` from `(quote sym)`.
fn quoted_symbol(expr: &Value) -> Option<Symbol> {
    match expr.to_vec()?.as_slice() {
        [Value::Symbol(head), Value::Symbol(symbol)] if head.special_form() == Some(SpecialForm::Quote) => {
            Some(symbol.clone())
        }
        _ => None,
    }
}

/// Number of values an expression leaves on the stack. Only a multi-argument `quote` pushes more
/// than one.
fn pushed_values(expr: &Value) -> usize {
    match expr {
        Value::Pair(pair) if expr.is_list() => match &pair.head {
            Value::Symbol(head) if head.special_form() == Some(SpecialForm::Quote) => pair
                .tail
                .to_vec()
                .map_or(1, |args| args.len().max(1)),
            _ => 1,
        },
        _ => 1,
    }
}
