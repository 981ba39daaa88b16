//! Persistent scoped symbol table
//!
//! A stack of scopes where popped scopes are retained, not destroyed. Each
//! scope keeps a parent link, so any saved scope handle can be reactivated
//! later and lookups will see exactly the bindings that were visible there.
//! The type checker relies on this to re-enter the defining scope of a
//! generic declaration when it type checks a cloned specialization, long
//! after the resolver has moved on.

use rustc_hash::FxHashMap;
use veld_ast::Atom;

/// Handle to a scope in the table. Stays valid after the scope is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopePtr(usize);

#[derive(Debug)]
struct TableScope<V> {
    parent: Option<usize>,
    depth: usize,
    bindings: FxHashMap<Atom, V>,
}

/// Scoped map from names to values with persistent scopes.
#[derive(Debug)]
pub struct ScopedTable<V> {
    scopes: Vec<TableScope<V>>,
    active: Option<usize>,
}

impl<V> Default for ScopedTable<V> {
    fn default() -> Self {
        ScopedTable { scopes: Vec::new(), active: None }
    }
}

impl<V> ScopedTable<V> {
    pub fn new() -> Self {
        ScopedTable::default()
    }

    /// Open a new scope under the active one and make it active.
    pub fn push_scope(&mut self) -> ScopePtr {
        let depth = self.active.map(|a| self.scopes[a].depth + 1).unwrap_or(0);
        let idx = self.scopes.len();
        self.scopes.push(TableScope {
            parent: self.active,
            depth,
            bindings: FxHashMap::default(),
        });
        self.active = Some(idx);
        ScopePtr(idx)
    }

    /// Close the active scope. The scope's bindings are retained and can be
    /// seen again through [`activate`](ScopedTable::pop_scope).
    pub fn pop_scope(&mut self) {
        let active = self.active.expect("pop_scope with no active scope");
        self.active = self.scopes[active].parent;
    }

    /// The active scope, if any.
    pub fn current_scope(&self) -> Option<ScopePtr> {
        self.active.map(ScopePtr)
    }

    /// Make a previously saved scope active again, returning the scope that
    /// was active before. Pass the returned handle back to restore it.
    pub fn activate(&mut self, scope: Option<ScopePtr>) -> Option<ScopePtr> {
        let previous = self.current_scope();
        self.active = scope.map(|s| s.0);
        previous
    }

    /// Bind `name` in the active scope, replacing any binding of the same
    /// name in that scope.
    pub fn insert(&mut self, name: Atom, value: V) {
        let active = self.active.expect("insert with no active scope");
        self.scopes[active].bindings.insert(name, value);
    }

    /// Bind `name` in an arbitrary scope. Used to cache undeclared-global
    /// bindings in the outermost scope while a nested scope is active.
    pub fn insert_into(&mut self, scope: ScopePtr, name: Atom, value: V) {
        self.scopes[scope.0].bindings.insert(name, value);
    }

    /// Find `name` in the active scope chain, innermost first.
    pub fn lookup(&self, name: Atom) -> Option<&V> {
        let mut current = self.active;
        while let Some(idx) = current {
            let scope = &self.scopes[idx];
            if let Some(v) = scope.bindings.get(&name) {
                return Some(v);
            }
            current = scope.parent;
        }
        None
    }

    /// Find `name` in the active scope chain and allow updating it.
    pub fn lookup_mut(&mut self, name: Atom) -> Option<&mut V> {
        let mut current = self.active;
        while let Some(idx) = current {
            if self.scopes[idx].bindings.contains_key(&name) {
                return self.scopes[idx].bindings.get_mut(&name);
            }
            current = self.scopes[idx].parent;
        }
        None
    }

    /// Find `name` in the active scope only.
    pub fn lookup_in_current(&self, name: Atom) -> Option<&V> {
        let active = self.active?;
        self.scopes[active].bindings.get(&name)
    }

    /// Depth of the active scope; the outermost scope has depth 0.
    pub fn current_depth(&self) -> Option<usize> {
        self.active.map(|a| self.scopes[a].depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ast::NameInterner;

    #[test]
    fn test_shadowing_and_pop() {
        let mut names = NameInterner::new();
        let x = names.intern("x");
        let y = names.intern("y");

        let mut table: ScopedTable<u32> = ScopedTable::new();
        table.push_scope();
        table.insert(x, 1);
        table.push_scope();
        table.insert(x, 2);
        table.insert(y, 3);

        assert_eq!(table.lookup(x), Some(&2));
        assert_eq!(table.lookup(y), Some(&3));
        assert_eq!(table.lookup_in_current(x), Some(&2));

        table.pop_scope();
        assert_eq!(table.lookup(x), Some(&1));
        assert_eq!(table.lookup(y), None);
        assert_eq!(table.lookup_in_current(x), Some(&1));
    }

    #[test]
    fn test_reactivate_popped_scope() {
        let mut names = NameInterner::new();
        let x = names.intern("x");

        let mut table: ScopedTable<u32> = ScopedTable::new();
        table.push_scope();
        table.insert(x, 1);
        let inner = table.push_scope();
        table.insert(x, 2);
        table.pop_scope();
        table.pop_scope();
        assert_eq!(table.lookup(x), None);

        // Re-enter the inner scope: its whole chain is visible again.
        let saved = table.activate(Some(inner));
        assert_eq!(saved, None);
        assert_eq!(table.lookup(x), Some(&2));

        // New scopes grow from the reactivated point.
        table.push_scope();
        let y = names.intern("y");
        table.insert(y, 9);
        assert_eq!(table.lookup(x), Some(&2));
        assert_eq!(table.lookup(y), Some(&9));

        table.activate(saved);
        assert_eq!(table.lookup(x), None);
    }

    #[test]
    fn test_lookup_mut_updates_binding() {
        let mut names = NameInterner::new();
        let x = names.intern("x");

        let mut table: ScopedTable<u32> = ScopedTable::new();
        table.push_scope();
        table.insert(x, 1);
        table.push_scope();
        *table.lookup_mut(x).unwrap() = 5;
        table.pop_scope();
        assert_eq!(table.lookup(x), Some(&5));
    }
}
