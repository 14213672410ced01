//! The execution engine. Closure calls push a [CallFrame] instead of recursing, so the depth of
//! a program is bounded by [EnvOptions::max_depth](crate::environment::EnvOptions) rather than by
//! the host stack. Built-ins that call back into user code go through [Environment::apply].

use std::rc::Rc;

use fxhash::FxHashMap;
use tracing::trace;

use crate::environment::Environment;
use crate::error::{Result, RuntimeError};
use crate::instruction::Instruction;
use crate::scope::{Scope, ScopeKind};
use crate::stack::Marker;
use crate::symbol::{Symbol, SymbolId};
use crate::value::{CallScope, Function, Prototype, Value};

struct CallFrame {
    proto: Rc<Prototype>,
    pc: usize,
    /// Stack position of the function scope. The top-level prototype has none.
    base: Option<usize>,
    /// Parent of the function scope, kept to rebuild it on self tail calls.
    parent: Scope,
    /// Position of each `LoopStart` executed by this frame.
    loop_starts: FxHashMap<SymbolId, usize>,
}

fn current(frames: &mut [CallFrame]) -> Result<&mut CallFrame> {
    frames
        .last_mut()
        .ok_or(RuntimeError::CorruptStack("no active call frame"))
}

fn goto(frames: &mut [CallFrame], from: usize, offset: isize) -> Result<()> {
    let target = from as isize + offset;
    if target < 0 {
        return Err(RuntimeError::CorruptStack("jump before the start of the code"));
    }
    current(frames)?.pc = target as usize;
    Ok(())
}

/// Checks the argument count and packs the extra arguments of a variadic function into a list.
fn pack_args(proto: &Prototype, mut args: Vec<Value>) -> Result<Vec<Value>> {
    let wrong_arity = |got| RuntimeError::WrongArity {
        name: proto.name.to_string(),
        expected: proto.arity,
        got,
    };

    if proto.variadic {
        if args.len() < proto.arity {
            return Err(wrong_arity(args.len()));
        }
        let rest = args.split_off(proto.arity);
        args.push(Value::list_from(rest));
    } else if args.len() != proto.arity {
        return Err(wrong_arity(args.len()));
    }

    Ok(args)
}

impl Environment {
    /// Runs a compiled top-level prototype. On failure the control stack is restored to the
    /// depth it had on entry.
    pub fn run(&mut self, proto: &Rc<Prototype>) -> Result<Value> {
        let entry = self.stack.len();
        let depth = self.depth;

        let frame = CallFrame {
            proto: proto.clone(),
            pc: 0,
            base: None,
            parent: self.global().clone(),
            loop_starts: FxHashMap::default(),
        };

        let result = self.execute(vec![frame]);

        self.stack.truncate(entry);
        self.depth = depth;
        result
    }

    /// Calls a closure or a built-in with already evaluated arguments.
    pub fn apply(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Builtin(builtin) => (builtin.call)(CallScope {
                name: builtin.name,
                args,
                env: self,
            }),
            Value::Function(function) => {
                let entry = self.stack.len();
                let depth = self.depth;

                let result = self
                    .enter(function, args)
                    .and_then(|frame| self.execute(vec![frame]));

                if result.is_err() {
                    self.stack.truncate(entry);
                    self.depth = depth;
                }
                result
            }
            other => Err(RuntimeError::NotCallable(other.to_string())),
        }
    }

    /// Resolves a symbol through the lexical chain of the current scope, then through this
    /// environment's global scope, then through the scopes live on the control stack.
    pub fn lookup(&self, symbol: &Symbol) -> Result<Value> {
        let id = symbol.id();

        self.stack
            .current_scope()
            .and_then(|scope| scope.lookup(id))
            .or_else(|| self.global().get_local(id))
            .or_else(|| self.stack.scopes().find_map(|scope| scope.get_local(id)))
            .ok_or_else(|| RuntimeError::UnboundSymbol(symbol.name().to_string()))
    }

    /// Replaces an existing binding, searched in the same order as [Environment::lookup].
    fn update(&self, symbol: &Symbol, value: Value) -> Result<()> {
        let id = symbol.id();

        if let Some(scope) = self.stack.current_scope() {
            if scope.update(id, value.clone()) {
                return Ok(());
            }
        }

        let global = self.global();
        if global.get_local(id).is_some() {
            global.bind(id, value);
            return Ok(());
        }

        match self.stack.scopes().find(|scope| scope.get_local(id).is_some()) {
            Some(scope) => {
                scope.bind(id, value);
                Ok(())
            }
            None => Err(RuntimeError::UnboundSymbol(symbol.name().to_string())),
        }
    }

    fn current_scope(&self) -> Scope {
        self.stack
            .current_scope()
            .cloned()
            .unwrap_or_else(|| self.global().clone())
    }

    fn enter(&mut self, function: &Function, args: Vec<Value>) -> Result<CallFrame> {
        let proto = &function.proto;
        let args = pack_args(proto, args)?;

        let max_depth = self.options().max_depth;
        if self.depth >= max_depth {
            return Err(RuntimeError::StackOverflow(max_depth));
        }
        self.depth += 1;

        trace!(name = %proto.name, argc = args.len(), depth = self.depth, "call");

        let parent = function
            .captured
            .clone()
            .unwrap_or_else(|| self.global().clone());

        let base = self.stack.len();
        self.stack
            .push_scope(Scope::child(&parent, ScopeKind::Function));
        for arg in args {
            self.stack.push_value(arg);
        }

        Ok(CallFrame {
            proto: proto.clone(),
            pc: 0,
            base: Some(base),
            parent,
            loop_starts: FxHashMap::default(),
        })
    }

    fn invoke(&mut self, callee: Value, args: Vec<Value>, frames: &mut Vec<CallFrame>) -> Result<()> {
        match callee {
            Value::Builtin(builtin) => {
                trace!(name = builtin.name, argc = args.len(), "builtin");
                let value = (builtin.call)(CallScope {
                    name: builtin.name,
                    args,
                    env: self,
                })?;
                self.stack.push_value(value);
                Ok(())
            }
            Value::Function(function) => {
                let frame = self.enter(&function, args)?;
                frames.push(frame);
                Ok(())
            }
            other => Err(RuntimeError::NotCallable(other.to_string())),
        }
    }

    /// Pops the finished frame. Returns the result once the outermost frame is done.
    fn return_from(&mut self, frames: &mut Vec<CallFrame>) -> Result<Option<Value>> {
        let value = self.stack.pop_value()?;
        let frame = frames
            .pop()
            .ok_or(RuntimeError::CorruptStack("return without a call frame"))?;

        if let Some(base) = frame.base {
            self.stack.truncate(base);
            self.depth -= 1;
        }

        if frames.is_empty() {
            return Ok(Some(value));
        }

        self.stack.push_value(value);
        Ok(None)
    }

    fn self_tail_call(&mut self, frames: &mut [CallFrame], argc: usize) -> Result<()> {
        let args = self.stack.pop_values(argc)?;
        let frame = current(frames)?;

        let Some(base) = frame.base else {
            return Err(RuntimeError::CorruptStack("tail call outside of a function"));
        };

        let args = pack_args(&frame.proto, args)?;

        self.stack.truncate(base);
        self.stack
            .push_scope(Scope::child(&frame.parent, ScopeKind::Function));
        for arg in args {
            self.stack.push_value(arg);
        }

        frame.pc = 0;
        frame.loop_starts.clear();
        Ok(())
    }

    fn explode(&mut self, value: Value) -> Result<()> {
        let members = value
            .to_sequence()
            .ok_or_else(|| RuntimeError::mismatch("a list or array to splice", &value))?;

        for member in members {
            self.stack.push_value(member);
        }
        Ok(())
    }

    fn execute(&mut self, mut frames: Vec<CallFrame>) -> Result<Value> {
        loop {
            let frame = current(&mut frames)?;
            let proto = frame.proto.clone();
            let pc = frame.pc;
            frame.pc += 1;

            let Some(instruction) = proto.code.get(pc) else {
                if let Some(value) = self.return_from(&mut frames)? {
                    return Ok(value);
                }
                continue;
            };

            match instruction {
                Instruction::Push(value) => self.stack.push_value(value.clone()),
                Instruction::PushClosure(proto) => {
                    let function = Function {
                        proto: proto.clone(),
                        captured: Some(self.current_scope()),
                    };
                    self.stack.push_value(Value::Function(Rc::new(function)));
                }
                Instruction::Dup => {
                    let value = self.stack.peek_value()?.clone();
                    self.stack.push_value(value);
                }
                Instruction::Pop => {
                    self.stack.pop_value()?;
                }
                Instruction::Lookup(symbol) => {
                    let value = self.lookup(symbol)?;
                    self.stack.push_value(value);
                }
                Instruction::Bind(symbol) => {
                    let value = self.stack.pop_value()?;
                    self.current_scope().bind(symbol.id(), value);
                }
                Instruction::BindList(symbols) => {
                    let value = self.stack.pop_value()?;
                    let values = value
                        .to_sequence()
                        .ok_or_else(|| RuntimeError::mismatch("a list or array", &value))?;

                    if values.len() != symbols.len() {
                        return Err(RuntimeError::Destructure {
                            expected: symbols.len(),
                            got: values.len(),
                        });
                    }

                    let scope = self.current_scope();
                    for (symbol, value) in symbols.iter().zip(values) {
                        scope.bind(symbol.id(), value);
                    }
                }
                Instruction::Update(symbol) => {
                    let value = self.stack.pop_value()?;
                    self.update(symbol, value)?;
                }
                Instruction::AddScope => {
                    let scope = Scope::child(&self.current_scope(), ScopeKind::Block);
                    self.stack.push_scope(scope);
                }
                Instruction::RemoveScope => {
                    self.stack.remove_top_scope()?;
                }
                Instruction::Call { name, argc } => {
                    let callee = self.lookup(name)?;
                    let args = self.stack.pop_values(*argc)?;
                    self.invoke(callee, args, &mut frames)?;
                }
                Instruction::Dispatch { argc } => {
                    let callee = self.stack.pop_value()?;
                    let args = self.stack.pop_values(*argc)?;
                    self.invoke(callee, args, &mut frames)?;
                }
                Instruction::SelfTailCall { argc } => self.self_tail_call(&mut frames, *argc)?,
                Instruction::Return => {
                    if let Some(value) = self.return_from(&mut frames)? {
                        return Ok(value);
                    }
                }
                Instruction::Jump(offset) => goto(&mut frames, pc, *offset)?,
                Instruction::Branch { when, offset } => {
                    if self.stack.pop_value()?.is_truthy() == *when {
                        goto(&mut frames, pc, *offset)?;
                    }
                }
                Instruction::Raise(message) => {
                    return Err(RuntimeError::AssertionFailed(message.to_string()));
                }
                Instruction::MakeArray(len) => {
                    let values = self.stack.pop_values(*len)?;
                    self.stack.push_value(Value::array(values));
                }
                Instruction::PushMarker => self.stack.push_marker(Marker::Quasi),
                Instruction::Squash => {
                    let values = self.stack.squash()?;
                    self.stack.push_value(Value::list_from(values));
                }
                Instruction::Explode => {
                    let value = self.stack.pop_value()?;
                    self.explode(value)?;
                }
                Instruction::Vectorize => {
                    let values = self.stack.squash()?;
                    self.stack.push_value(Value::array(values));
                }
                Instruction::Hashize { type_name } => {
                    let values = self.stack.squash()?;
                    if values.len() % 2 != 0 {
                        return Err("hash requires even number of arguments".into());
                    }

                    let flat = values
                        .rchunks(2)
                        .flat_map(|pair| [pair[1].clone(), pair[0].clone()])
                        .collect::<Vec<_>>();

                    let hash = self.externs().build(type_name, &flat)?;
                    self.stack.push_value(hash);
                }
                Instruction::LoopStart(lp) => {
                    current(&mut frames)?.loop_starts.insert(lp.label.id(), pc);
                }
                Instruction::PushLoopMarker(label) => {
                    self.stack.push_marker(Marker::Loop(label.id()));
                }
                Instruction::PopUntilLoopMarker(label) => {
                    self.stack.pop_until_marker(Marker::Loop(label.id()))?;
                }
                Instruction::ClearLoopMarker(label) => {
                    self.stack.clear_marker(Marker::Loop(label.id()))?;
                }
                Instruction::Break(lp) | Instruction::Continue(lp) => {
                    let offsets = lp
                        .offsets()
                        .ok_or(RuntimeError::CorruptStack("loop was never finalized"))?;
                    let offset = match instruction {
                        Instruction::Break(_) => offsets.break_offset,
                        _ => offsets.continue_offset,
                    };

                    let id = lp.label.id();
                    let start = *current(&mut frames)?
                        .loop_starts
                        .get(&id)
                        .ok_or(RuntimeError::CorruptStack("loop was never started"))?;

                    self.stack.pop_until_marker(Marker::Loop(id))?;
                    goto(&mut frames, start, offset as isize)?;
                }
                Instruction::Label(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvOptions;
    use crate::error::Error;

    fn eval(source: &str) -> Result<Value, Error> {
        Environment::new().eval_str(source)
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let value = eval("(defn adder [n] (fn [x] (+ x n))) (def add2 (adder 2)) (add2 40)").unwrap();
        assert_eq!(value, Value::Int(42));
    }

    #[test]
    fn variadic_arguments_are_collected_into_a_list() {
        let value = eval("(defn f [a & rest] rest) (f 1 2 3)").unwrap();
        assert_eq!(value.to_string(), "(2 3)");

        let value = eval("(defn f [a & rest] rest) (f 1)").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn wrong_arity_is_reported() {
        let err = eval("(defn f [a b] a) (f 1)").unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::WrongArity { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn dynamic_lookup_falls_back_to_the_caller() {
        let value = eval("(defn peek [] hidden) (defn outer [hidden] (peek)) (outer 7)").unwrap();
        assert_eq!(value, Value::Int(7));
    }

    #[test]
    fn runaway_recursion_overflows() {
        let mut env = Environment::with_options(EnvOptions {
            max_depth: 64,
            ..EnvOptions::default()
        });

        let err = env
            .eval_str("(defn down [n] (+ 1 (down (- n 1)))) (down 1000)")
            .unwrap_err();
        assert!(matches!(err, Error::Runtime(RuntimeError::StackOverflow(64))));
    }

    #[test]
    fn errors_restore_the_stack() {
        let mut env = Environment::new();
        let depth = env.stack.len();

        assert!(env.eval_str("(let [a 1] (+ a (missing)))").is_err());
        assert_eq!(env.stack.len(), depth);
        assert_eq!(env.depth, 0);
    }

    #[test]
    fn set_requires_an_existing_binding() {
        let err = eval("(set nowhere 1)").unwrap_err();
        assert!(matches!(err, Error::Runtime(RuntimeError::UnboundSymbol(name)) if name == "nowhere"));
    }

    #[test]
    fn apply_calls_builtins_and_closures() {
        let mut env = Environment::new();
        let plus = env.get("+").unwrap();
        assert_eq!(
            env.apply(&plus, vec![Value::Int(1), Value::Int(2)]).unwrap(),
            Value::Int(3)
        );

        let double = env.eval_str("(fn [x] (* x 2))").unwrap();
        assert_eq!(env.apply(&double, vec![Value::Int(21)]).unwrap(), Value::Int(42));

        assert!(matches!(
            env.apply(&Value::Int(1), vec![]),
            Err(RuntimeError::NotCallable(_))
        ));
    }
}
