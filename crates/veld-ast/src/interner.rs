//! Name interning
//!
//! All identifier and property names are interned into `Atom`s so that name
//! comparisons and hash-table keys are cheap `u32` operations. The interner
//! lives on the [`Ast`](crate::Ast) and is append-only.

use rustc_hash::FxHashMap;
use std::fmt;

/// An interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub(crate) u32);

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

/// Append-only string interner.
#[derive(Debug, Default)]
pub struct NameInterner {
    map: FxHashMap<Box<str>, Atom>,
    names: Vec<Box<str>>,
}

impl NameInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        NameInterner::default()
    }

    /// Intern `name`, returning the existing atom if it was seen before.
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(&atom) = self.map.get(name) {
            return atom;
        }
        let atom = Atom(self.names.len() as u32);
        let boxed: Box<str> = name.into();
        self.names.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Atom> {
        self.map.get(name).copied()
    }

    /// Resolve an atom back to its string.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.names[atom.0 as usize]
    }

    /// Number of distinct interned names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedups() {
        let mut interner = NameInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        let c = interner.intern("foo");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a), "foo");
        assert_eq!(interner.resolve(b), "bar");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = NameInterner::new();
        assert!(interner.get("x").is_none());
        let x = interner.intern("x");
        assert_eq!(interner.get("x"), Some(x));
    }
}
