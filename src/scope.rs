//! Scopes map interned symbols to values. They are reference-counted nodes linked to their lexical
//! parent, so a closure can keep the chain it was created in alive after the control stack has
//! dropped it.

use std::{cell::RefCell, fmt::Debug, rc::Rc};

use fxhash::FxBuildHasher;
use im_rc::HashMap;

use crate::symbol::SymbolId;
use crate::value::Value;

pub type Bindings = HashMap<SymbolId, Value, FxBuildHasher>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// Introduced by a function call.
    Function,
    /// Introduced by `let` and `let*`.
    Block,
}

struct ScopeData {
    kind: ScopeKind,
    vars: RefCell<Bindings>,
    parent: Option<Scope>,
}

#[derive(Clone)]
pub struct Scope(Rc<ScopeData>);

impl Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.0.kind)
            .field("vars", &self.0.vars.borrow().len())
            .field("depth", &self.depth())
            .finish()
    }
}

impl Scope {
    pub fn global() -> Self {
        Self::with_bindings(ScopeKind::Global, Bindings::default(), None)
    }

    fn with_bindings(kind: ScopeKind, vars: Bindings, parent: Option<Scope>) -> Self {
        Scope(Rc::new(ScopeData {
            kind,
            vars: RefCell::new(vars),
            parent,
        }))
    }

    /// Creates an empty scope whose lexical parent is `parent`.
    pub fn child(parent: &Scope, kind: ScopeKind) -> Self {
        Self::with_bindings(kind, Bindings::default(), Some(parent.clone()))
    }

    pub fn is_global(&self) -> bool {
        self.0.kind == ScopeKind::Global
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent();
        }
        depth
    }

    /// Reads a binding of this node only.
    pub fn get_local(&self, id: SymbolId) -> Option<Value> {
        self.0.vars.borrow().get(&id).cloned()
    }

    /// The lexical chain from this node up to, but not including, the global scope.
    fn enclosing(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.parent())
            .take_while(|scope| !scope.is_global())
    }

    /// Walks the lexical chain. The global scope is skipped: a closure keeps the global node it
    /// was created under, and the environment resolves globals itself so a forked global wins.
    pub fn lookup(&self, id: SymbolId) -> Option<Value> {
        self.enclosing().find_map(|scope| scope.get_local(id))
    }

    pub fn bind(&self, id: SymbolId, value: Value) {
        self.0.vars.borrow_mut().insert(id, value);
    }

    /// Replaces the nearest existing binding below the global scope. Returns `false` when no
    /// such scope binds the symbol.
    pub fn update(&self, id: SymbolId, value: Value) -> bool {
        let Some(scope) = self.enclosing().find(|scope| scope.get_local(id).is_some()) else {
            return false;
        };
        scope.bind(id, value);
        true
    }

    /// A detached copy of this node's bindings. The map is persistent, so this does not copy
    /// the entries until one side writes.
    pub fn fork(&self) -> Scope {
        let vars = self.0.vars.borrow().clone();
        Self::with_bindings(self.0.kind, vars, self.0.parent.clone())
    }
}
