//! A small lisp that is compiled to bytecode and executed by a stack machine. Every toplevel form
//! goes through three steps:
//!
//! - The [reader] turns source text into values, lists are built from pairs and `[]`/`{}` read as
//!   arrays and hash constructors.
//! - The [generator] walks a value and emits [instruction::Instruction]s. Special forms, macro
//!   expansion, loops and syntax-quote are all resolved here.
//! - The [vm] executes the instructions against a value stack shared by every call.
//!
//! Values are reference counted, closures capture the scope they were created in and self tail
//! calls run in constant stack space.
//!
//! ```lisp
//! (defn fact [n acc] (cond (== n 0) acc (fact (- n 1) (* n acc))))
//! (fact 20 1)
//! ```

pub mod codec;
pub mod environment;
pub mod error;
pub mod externs;
pub mod generator;
pub mod hash;
pub mod instruction;
pub mod intrinsics;
pub mod reader;
pub mod scope;
pub mod stack;
pub mod symbol;
pub mod value;
pub mod vm;

pub use environment::{EnvOptions, Environment};
pub use error::{CompileError, Error, ReadError, RuntimeError};
pub use instruction::disassemble;
pub use value::Value;
