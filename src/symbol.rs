//! Symbol interning. Equal names always map to the same [SymbolId], so comparing symbols and
//! looking them up in scopes never touches the string itself.

use std::{
    fmt::{Debug, Display},
    hash::Hash,
    rc::Rc,
};

use fxhash::FxHashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An interned name.
#[derive(Clone)]
pub struct Symbol {
    name: Rc<str>,
    id: SymbolId,
}

impl Symbol {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// The special form this symbol names, if any.
    pub fn special_form(&self) -> Option<SpecialForm> {
        SpecialForm::from_id(self.id)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.id.0)
    }
}

macro_rules! special_forms {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Lists whose head is one of these symbols are compiled by the generator itself instead of
        /// being called.
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        pub enum SpecialForm {
            $($variant),*
        }

        impl SpecialForm {
            pub const ALL: &'static [SpecialForm] = &[$(SpecialForm::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(SpecialForm::$variant => $name),*
                }
            }
        }
    };
}

special_forms! {
    And => "and",
    Or => "or",
    Cond => "cond",
    Quote => "quote",
    Def => "def",
    Setq => "setq",
    Mdef => "mdef",
    Fn => "fn",
    Defn => "defn",
    Begin => "begin",
    Let => "let",
    LetStar => "let*",
    Assert => "assert",
    Defmac => "defmac",
    Macexpand => "macexpand",
    SyntaxQuote => "syntax-quote",
    Include => "include",
    For => "for",
    Set => "set",
    Break => "break",
    Continue => "continue",
}

impl SpecialForm {
    /// Special forms are interned first, so their ids are their positions in [SpecialForm::ALL].
    pub fn from_id(id: SymbolId) -> Option<SpecialForm> {
        SpecialForm::ALL.get(id.index()).copied()
    }
}

/// Maps names to ids and back.
#[derive(Debug)]
pub struct SymbolTable {
    ids: FxHashMap<Rc<str>, SymbolId>,
    names: Vec<Rc<str>>,
    gensym_counter: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            ids: FxHashMap::default(),
            names: Vec::new(),
            gensym_counter: 0,
        };

        for form in SpecialForm::ALL {
            table.intern(form.name());
        }

        table
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some((name, id)) = self.ids.get_key_value(name) {
            return Symbol {
                name: name.clone(),
                id: *id,
            };
        }

        let id = SymbolId(self.names.len() as u32);
        let name: Rc<str> = name.into();
        self.names.push(name.clone());
        self.ids.insert(name.clone(), id);

        Symbol { name, id }
    }

    pub fn lookup(&self, id: SymbolId) -> Option<Symbol> {
        self.names.get(id.index()).map(|name| Symbol {
            name: name.clone(),
            id,
        })
    }

    /// Creates a symbol whose name has never been interned before.
    pub fn gensym(&mut self, prefix: &str) -> Symbol {
        loop {
            self.gensym_counter += 1;
            let name = format!("{prefix}{}", self.gensym_counter);
            if !self.ids.contains_key(name.as_str()) {
                return self.intern(&name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = SymbolTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        let c = table.intern("bar");

        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, c);
    }

    #[test]
    fn special_forms_resolve_at_intern_time() {
        let mut table = SymbolTable::new();

        assert_eq!(table.intern("let*").special_form(), Some(SpecialForm::LetStar));
        assert_eq!(table.intern("for").special_form(), Some(SpecialForm::For));
        assert_eq!(table.intern("format").special_form(), None);
    }

    #[test]
    fn gensym_skips_taken_names() {
        let mut table = SymbolTable::new();
        table.intern("__loop1");

        let fresh = table.gensym("__loop");
        assert_eq!(fresh.name(), "__loop2");
        assert_eq!(table.lookup(fresh.id()), Some(fresh));
    }
}
