//! The instruction set of the stack machine. Instructions are immutable once emitted.

use std::{cell::OnceCell, fmt::Display, rc::Rc};

use crate::symbol::Symbol;
use crate::value::{Prototype, Value};

/// Jump offsets of a `for` loop, relative to its `LoopStart` instruction. They are only known
/// once the whole loop has been generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOffsets {
    pub loop_len: usize,
    pub break_offset: usize,
    pub continue_offset: usize,
}

/// Links `break` and `continue` instructions to the loop they exit.
#[derive(Debug)]
pub struct Loop {
    pub label: Symbol,
    offsets: OnceCell<LoopOffsets>,
}

impl Loop {
    pub fn new(label: Symbol) -> Self {
        Self {
            label,
            offsets: OnceCell::new(),
        }
    }

    pub fn offsets(&self) -> Option<LoopOffsets> {
        self.offsets.get().copied()
    }

    pub(crate) fn finalize(&self, offsets: LoopOffsets) {
        let result = self.offsets.set(offsets);
        debug_assert!(result.is_ok(), "loop {} finalized twice", self.label);
    }
}

#[derive(Debug, Clone)]
pub enum Instruction {
    /// Pushes a literal.
    Push(Value),
    /// Pushes a closure over the current scope.
    PushClosure(Rc<Prototype>),
    Dup,
    Pop,
    /// Pushes the value bound to the symbol.
    Lookup(Symbol),
    /// Pops a value and binds it in the current scope.
    Bind(Symbol),
    /// Pops a sequence and binds its elements positionally.
    BindList(Rc<[Symbol]>),
    /// Pops a value and replaces the nearest existing binding.
    Update(Symbol),
    AddScope,
    RemoveScope,
    /// Calls the function bound to the symbol with the topmost `argc` values.
    Call { name: Symbol, argc: usize },
    /// Pops the callee, then calls it with the topmost `argc` values.
    Dispatch { argc: usize },
    /// Rebinds the running function's parameters and restarts it.
    SelfTailCall { argc: usize },
    Jump(isize),
    /// Pops a value and jumps when its truthiness equals `when`.
    Branch { when: bool, offset: isize },
    /// Aborts the evaluation with an assertion failure.
    Raise(Rc<str>),
    Return,
    /// Assembles the topmost `len` values into an array.
    MakeArray(usize),
    PushMarker,
    /// Collects everything down to the innermost marker into a list.
    Squash,
    /// Replaces the list or array on top with its members.
    Explode,
    /// Collects everything down to the innermost marker into an array.
    Vectorize,
    /// Collects key/value pairs down to the innermost marker into a hash.
    Hashize { type_name: Rc<str> },
    LoopStart(Rc<Loop>),
    PushLoopMarker(Symbol),
    PopUntilLoopMarker(Symbol),
    ClearLoopMarker(Symbol),
    Break(Rc<Loop>),
    Continue(Rc<Loop>),
    Label(Rc<str>),
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Instruction::*;

        match self {
            Push(value) => write!(f, "push {value}"),
            PushClosure(proto) => write!(f, "closure {}", proto.name),
            Dup => write!(f, "dup"),
            Pop => write!(f, "pop"),
            Lookup(symbol) => write!(f, "get {symbol}"),
            Bind(symbol) => write!(f, "bind {symbol}"),
            BindList(symbols) => {
                write!(f, "bindlist")?;
                for symbol in symbols.iter() {
                    write!(f, " {symbol}")?;
                }
                Ok(())
            }
            Update(symbol) => write!(f, "update {symbol}"),
            AddScope => write!(f, "scope+"),
            RemoveScope => write!(f, "scope-"),
            Call { name, argc } => write!(f, "call {name} {argc}"),
            Dispatch { argc } => write!(f, "dispatch {argc}"),
            SelfTailCall { argc } => write!(f, "tailcall {argc}"),
            Jump(offset) => write!(f, "jump {offset:+}"),
            Branch { when, offset } => write!(f, "branch-{when} {offset:+}"),
            Raise(message) => write!(f, "raise {message:?}"),
            Return => write!(f, "return"),
            MakeArray(len) => write!(f, "array {len}"),
            PushMarker => write!(f, "marker"),
            Squash => write!(f, "squash"),
            Explode => write!(f, "explode"),
            Vectorize => write!(f, "vectorize"),
            Hashize { type_name } => write!(f, "hashize {type_name}"),
            LoopStart(lp) => write!(f, "loop-start {}", lp.label),
            PushLoopMarker(label) => write!(f, "loop-marker {label}"),
            PopUntilLoopMarker(label) => write!(f, "pop-until {label}"),
            ClearLoopMarker(label) => write!(f, "clear-marker {label}"),
            Break(lp) => write!(f, "break {}", lp.label),
            Continue(lp) => write!(f, "continue {}", lp.label),
            Label(label) => write!(f, "; {label}"),
        }
    }
}

/// Renders a prototype and every prototype nested in it.
pub fn disassemble(proto: &Prototype) -> String {
    let mut out = String::new();
    write_proto(&mut out, proto);
    out
}

fn write_proto(out: &mut String, proto: &Prototype) {
    use std::fmt::Write;

    let variadic = if proto.variadic { "+" } else { "" };
    let _ = writeln!(out, "{} ({}{variadic}):", proto.name, proto.arity);
    for (pc, instruction) in proto.code.iter().enumerate() {
        let _ = writeln!(out, "  {pc:4}  {instruction}");
    }

    for instruction in &proto.code {
        if let Instruction::PushClosure(nested) = instruction {
            write_proto(out, nested);
        }
    }
}
