//! Definitions of errors that can occur while reading, compiling and running programs.

use thiserror::Error;

use crate::reader::Location;

/// Errors raised by the reader while turning text into values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("unmatched parenthesis at {0}")]
    UnmatchedParenthesis(Location),

    #[error("unclosed parenthesis at {0}")]
    UnclosedParenthesis(Location),

    #[error("unclosed string at {0}")]
    UnclosedString(Location),

    #[error("unmatched quote at {0}")]
    UnmatchedQuote(Location),

    #[error("invalid escape in string at {0}")]
    InvalidEscape(Location),

    #[error("invalid character literal at {0}")]
    InvalidChar(Location),
}

/// Errors raised while generating instructions. They always abort the compilation of the
/// enclosing form.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("wrong number of arguments to {0}")]
    WrongArgs(&'static str),

    #[error("malformed {form}: {reason}")]
    Malformed {
        form: &'static str,
        reason: &'static str,
    },

    #[error("{form}: expected a symbol but got {found}")]
    ExpectedSymbol { form: &'static str, found: String },

    #[error("already have macro named '{0}': refusing to bind a variable of the same name")]
    MacroNameClash(String),

    #[error("cond is missing its default case")]
    MissingDefault,

    #[error("uneven binding list in {0}")]
    UnevenBindings(&'static str),

    #[error("({0}) found but not inside a loop")]
    OutsideLoop(&'static str),

    #[error("no expressions found")]
    NoExpressions,

    #[error("include: expected a string, list or array but got {0}")]
    IncludeTarget(String),

    #[error("include '{path}': {reason}")]
    Include { path: String, reason: String },

    #[error("macro expansion failed: {0}")]
    Expansion(Box<RuntimeError>),

    #[error("error generating {form}:\n{source}")]
    Context {
        form: String,
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Strips the rendering context added while the error travelled through nested forms.
    pub fn root(&self) -> &CompileError {
        let mut error = self;
        while let CompileError::Context { source, .. } = error {
            error = source;
        }
        error
    }
}

/// Runtime errors that abort the current evaluation.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("symbol `{0}` not found")]
    UnboundSymbol(String),

    #[error("wrong arity calling {name}: expected {expected} arguments, got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("cannot call as function '{0}'")]
    NotCallable(String),

    #[error("expected {expected} but got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("key {0} not found")]
    KeyNotFound(String),

    #[error("cannot hash {0}")]
    CannotHash(String),

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("mdef expected {expected} values but got {got}")]
    Destructure { expected: usize, got: usize },

    #[error("call depth exceeded {0}")]
    StackOverflow(usize),

    #[error("corrupt control stack: {0}")]
    CorruptStack(&'static str),

    #[error("{0}")]
    User(String),
}

impl RuntimeError {
    pub fn mismatch(expected: &'static str, found: impl ToString) -> Self {
        RuntimeError::TypeMismatch {
            expected,
            found: found.to_string(),
        }
    }
}

impl From<String> for RuntimeError {
    fn from(value: String) -> Self {
        RuntimeError::User(value)
    }
}

impl From<&str> for RuntimeError {
    fn from(value: &str) -> Self {
        RuntimeError::User(value.to_string())
    }
}

/// Any failure of a read-compile-run cycle.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
