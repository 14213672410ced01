//! The control stack holds intermediate values, the scopes of the constructs currently being
//! executed, and markers used by loops and quasi-quotation. Push and pop are the only ways to
//! address it.

use crate::error::{Result, RuntimeError};
use crate::scope::Scope;
use crate::symbol::SymbolId;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Delimits the members of an aggregate being rebuilt by `syntax-quote`.
    Quasi,
    /// Delimits the frames owned by one running `for` loop.
    Loop(SymbolId),
}

#[derive(Debug, Clone)]
pub enum Frame {
    Value(Value),
    Scope(Scope),
    Marker(Marker),
}

#[derive(Debug, Default)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }

    pub fn push_value(&mut self, value: Value) {
        self.frames.push(Frame::Value(value));
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.frames.push(Frame::Scope(scope));
    }

    pub fn push_marker(&mut self, marker: Marker) {
        self.frames.push(Frame::Marker(marker));
    }

    pub fn pop_value(&mut self) -> Result<Value> {
        match self.frames.pop() {
            Some(Frame::Value(value)) => Ok(value),
            Some(frame) => {
                self.frames.push(frame);
                Err(RuntimeError::CorruptStack("expected a value on top of the stack"))
            }
            None => Err(RuntimeError::CorruptStack("stack underflow")),
        }
    }

    /// Pops `count` values, returning them in the order they were pushed.
    pub fn pop_values(&mut self, count: usize) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.pop_value()?);
        }
        values.reverse();
        Ok(values)
    }

    pub fn peek_value(&self) -> Result<&Value> {
        match self.frames.last() {
            Some(Frame::Value(value)) => Ok(value),
            Some(_) => Err(RuntimeError::CorruptStack("expected a value on top of the stack")),
            None => Err(RuntimeError::CorruptStack("stack underflow")),
        }
    }

    /// The innermost scope, which is where new bindings go.
    pub fn current_scope(&self) -> Option<&Scope> {
        self.scopes().next()
    }

    /// Every live scope frame, innermost first.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.frames.iter().rev().filter_map(|frame| match frame {
            Frame::Scope(scope) => Some(scope),
            _ => None,
        })
    }

    /// Removes the innermost scope frame while keeping the values computed above it.
    pub fn remove_top_scope(&mut self) -> Result<Scope> {
        let index = self
            .frames
            .iter()
            .rposition(|frame| !matches!(frame, Frame::Value(_)));

        match index.map(|index| (index, &self.frames[index])) {
            Some((index, Frame::Scope(scope))) => {
                let scope = scope.clone();
                self.frames.remove(index);
                Ok(scope)
            }
            _ => Err(RuntimeError::CorruptStack("no scope to remove")),
        }
    }

    fn marker_index(&self, marker: Marker) -> Result<usize> {
        self.frames
            .iter()
            .rposition(|frame| matches!(frame, Frame::Marker(m) if *m == marker))
            .ok_or(RuntimeError::CorruptStack("marker not found"))
    }

    /// Drops everything above the marker, keeping the marker itself.
    pub fn pop_until_marker(&mut self, marker: Marker) -> Result<()> {
        let index = self.marker_index(marker)?;
        self.frames.truncate(index + 1);
        Ok(())
    }

    /// Drops the marker and everything above it.
    pub fn clear_marker(&mut self, marker: Marker) -> Result<()> {
        let index = self.marker_index(marker)?;
        self.frames.truncate(index);
        Ok(())
    }

    /// Collects the values pushed since the innermost quasi marker and drops the marker.
    pub fn squash(&mut self) -> Result<Vec<Value>> {
        let index = self.marker_index(Marker::Quasi)?;
        let values = self
            .frames
            .drain(index + 1..)
            .map(|frame| match frame {
                Frame::Value(value) => Ok(value),
                _ => Err(RuntimeError::CorruptStack("non-value frame inside a quasi marker")),
            })
            .collect::<Result<Vec<_>>>()?;
        self.frames.truncate(index);
        Ok(values)
    }
}
