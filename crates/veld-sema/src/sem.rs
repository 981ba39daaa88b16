//! Semantic context: declarations, lexical scopes, and function records
//!
//! The resolver populates a [`SemContext`] while walking the tree. All
//! semantic entities live in arenas here and are addressed by small ids;
//! the AST itself is never annotated. Side tables keyed by `NodeId` connect
//! tree positions to their semantic records, which keeps cloned generic
//! specializations cheap: clone the subtree, remap the table entries.

use rustc_hash::{FxHashMap, FxHashSet};
use veld_ast::{Atom, NodeId};

/// Identifier of a declaration in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(u32);

/// Identifier of a lexical scope in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

/// Identifier of a function record in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

/// What kind of declaration a name introduces. The kind decides scoping
/// (function-wide or block) and which redeclarations are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    // ==== Let-like declarations: block scoped, no redeclaration. ====
    Let,
    Const,
    Class,
    Import,
    /// Simple `catch (e)` parameter.
    Catch,
    /// The self-name binding of a named function expression.
    FunctionExprName,
    /// The self-name binding of a named class expression.
    ClassExprName,
    /// A function declaration inside a block.
    ScopedFunction,

    // ==== Var-like declarations: function scoped, redeclaration allowed. ====
    Var,
    Parameter,
    /// A declared property of the global object (`var` at the top level,
    /// or an ambient global).
    GlobalProperty,
    /// A global property created by reading or writing an undeclared name.
    UndeclaredGlobalProperty,
}

impl DeclKind {
    /// Block-scoped kinds that forbid redeclaration.
    pub fn is_let_like(&self) -> bool {
        matches!(
            self,
            DeclKind::Let
                | DeclKind::Const
                | DeclKind::Class
                | DeclKind::Import
                | DeclKind::Catch
                | DeclKind::FunctionExprName
                | DeclKind::ClassExprName
                | DeclKind::ScopedFunction
        )
    }

    /// Function-scoped kinds that may share a name with each other.
    pub fn is_var_like(&self) -> bool {
        matches!(
            self,
            DeclKind::Var
                | DeclKind::Parameter
                | DeclKind::GlobalProperty
                | DeclKind::UndeclaredGlobalProperty
        )
    }

    /// Kinds that live on the global object.
    pub fn is_global(&self) -> bool {
        matches!(self, DeclKind::GlobalProperty | DeclKind::UndeclaredGlobalProperty)
    }
}

/// Special roles a declaration can play beyond its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    NotSpecial,
    /// The implicit `arguments` object of a function.
    Arguments,
}

/// A single declaration of a name.
#[derive(Debug, Clone)]
pub struct Decl {
    pub name: Atom,
    pub kind: DeclKind,
    pub special: Special,
    /// The scope the declaration belongs to.
    pub scope: ScopeId,
    /// The declaring identifier node, when there is one in the tree.
    /// Implicit declarations (`arguments`, ambient globals) have none.
    pub ident: Option<NodeId>,
    /// Set by the checker on generic declarations. A generic decl has no
    /// concrete type of its own; only its specializations do.
    pub generic: bool,
}

/// A lexical scope. Scopes form a tree rooted at the global scope.
#[derive(Debug, Clone)]
pub struct LexicalScope {
    pub parent: Option<ScopeId>,
    /// The function this scope belongs to.
    pub function: FunctionId,
    /// Nesting depth from the global scope.
    pub depth: u32,
    /// Declarations made directly in this scope.
    pub decls: Vec<DeclId>,
    /// Function declarations hoisted into this scope, in source order.
    pub hoisted_functions: Vec<NodeId>,
    /// The AST node that created the scope.
    pub node: NodeId,
}

/// Per-function semantic record.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// The function-like node; the synthetic global function points at the
    /// `Program` node.
    pub node: NodeId,
    pub parent_function: Option<FunctionId>,
    /// Scope surrounding the function at its definition site.
    pub parent_scope: Option<ScopeId>,
    pub strict: bool,
    pub is_arrow: bool,
    pub is_async: bool,
    pub is_generator: bool,
    /// Scopes belonging to this function; the first is the function scope.
    pub scopes: Vec<ScopeId>,
    /// Lazily created declaration of the implicit `arguments` object.
    pub arguments_decl: Option<DeclId>,
    /// Number of labels allocated in the function so far.
    pub num_labels: u32,
    /// True if the function contains a direct `eval(...)` call.
    pub contains_direct_eval: bool,
}

/// All semantic information for one program.
#[derive(Debug, Default)]
pub struct SemContext {
    decls: Vec<Decl>,
    scopes: Vec<LexicalScope>,
    functions: Vec<FunctionInfo>,

    /// Identifier expression -> the declaration it references.
    expr_decls: FxHashMap<NodeId, DeclId>,
    /// Declaring identifier -> its declaration.
    ident_decls: FxHashMap<NodeId, DeclId>,
    /// Identifiers that cannot be statically resolved (e.g. in the reach of
    /// a direct `eval`).
    unresolvable: FxHashSet<NodeId>,
    /// Scope-creating node -> its scope.
    node_scopes: FxHashMap<NodeId, ScopeId>,
    /// Function-like node -> its function record.
    node_functions: FxHashMap<NodeId, FunctionId>,
    /// Labeled statement / break / continue -> label index in its function.
    label_indices: FxHashMap<NodeId, u32>,
    /// Break/continue/labeled statement -> the statement the label jumps to.
    label_targets: FxHashMap<NodeId, NodeId>,
}

impl SemContext {
    pub fn new() -> Self {
        SemContext::default()
    }

    // ==== Arena allocation ====

    pub fn new_function(
        &mut self,
        node: NodeId,
        parent_function: Option<FunctionId>,
        parent_scope: Option<ScopeId>,
        strict: bool,
        is_arrow: bool,
    ) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(FunctionInfo {
            node,
            parent_function,
            parent_scope,
            strict,
            is_arrow,
            is_async: false,
            is_generator: false,
            scopes: Vec::new(),
            arguments_decl: None,
            num_labels: 0,
            contains_direct_eval: false,
        });
        self.node_functions.insert(node, id);
        id
    }

    pub fn new_scope(
        &mut self,
        parent: Option<ScopeId>,
        function: FunctionId,
        node: NodeId,
    ) -> ScopeId {
        let depth = parent.map(|p| self.scope(p).depth + 1).unwrap_or(0);
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(LexicalScope {
            parent,
            function,
            depth,
            decls: Vec::new(),
            hoisted_functions: Vec::new(),
            node,
        });
        self.functions[function.0 as usize].scopes.push(id);
        self.node_scopes.insert(node, id);
        id
    }

    pub fn new_decl(&mut self, name: Atom, kind: DeclKind, scope: ScopeId) -> DeclId {
        self.new_decl_special(name, kind, scope, Special::NotSpecial, None)
    }

    pub fn new_decl_special(
        &mut self,
        name: Atom,
        kind: DeclKind,
        scope: ScopeId,
        special: Special,
        ident: Option<NodeId>,
    ) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl { name, kind, special, scope, ident, generic: false });
        self.scopes[scope.0 as usize].decls.push(id);
        id
    }

    // ==== Accessors ====

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &LexicalScope {
        &self.scopes[id.0 as usize]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut LexicalScope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionInfo {
        &mut self.functions[id.0 as usize]
    }

    /// The synthetic global function. Valid once the resolver has run.
    pub fn global_function(&self) -> FunctionId {
        FunctionId(0)
    }

    /// The global scope. Valid once the resolver has run.
    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    // ==== Side tables ====

    /// Record that identifier expression `node` references `decl`.
    pub fn set_expr_decl(&mut self, node: NodeId, decl: DeclId) {
        self.expr_decls.insert(node, decl);
    }

    /// The declaration referenced by an identifier expression.
    pub fn expr_decl(&self, node: NodeId) -> Option<DeclId> {
        self.expr_decls.get(&node).copied()
    }

    /// Record that identifier `node` declares `decl`.
    pub fn set_ident_decl(&mut self, node: NodeId, decl: DeclId) {
        self.ident_decls.insert(node, decl);
    }

    /// The declaration introduced by a declaring identifier.
    pub fn ident_decl(&self, node: NodeId) -> Option<DeclId> {
        self.ident_decls.get(&node).copied()
    }

    /// Mark an identifier as not statically resolvable.
    pub fn set_unresolvable(&mut self, node: NodeId) {
        self.unresolvable.insert(node);
    }

    pub fn is_unresolvable(&self, node: NodeId) -> bool {
        self.unresolvable.contains(&node)
    }

    /// The scope created by `node`, if it creates one.
    pub fn node_scope(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node).copied()
    }

    /// The function record of a function-like node.
    pub fn node_function(&self, node: NodeId) -> Option<FunctionId> {
        self.node_functions.get(&node).copied()
    }

    pub fn set_label_index(&mut self, node: NodeId, index: u32) {
        self.label_indices.insert(node, index);
    }

    /// The label index of a labeled statement, break, or continue.
    pub fn label_index(&self, node: NodeId) -> Option<u32> {
        self.label_indices.get(&node).copied()
    }

    pub fn set_label_target(&mut self, node: NodeId, target: NodeId) {
        self.label_targets.insert(node, target);
    }

    /// The statement a break/continue jumps to.
    pub fn label_target(&self, node: NodeId) -> Option<NodeId> {
        self.label_targets.get(&node).copied()
    }

    /// Allocate a fresh label index in `function`.
    pub fn alloc_label(&mut self, function: FunctionId) -> u32 {
        let info = &mut self.functions[function.0 as usize];
        let index = info.num_labels;
        info.num_labels += 1;
        index
    }

    /// The declaration of the implicit `arguments` object for `function`,
    /// created on first use. Arrow functions do not have their own
    /// `arguments`; the lookup walks to the closest enclosing non-arrow
    /// function. At the global level `arguments` is an undeclared global.
    pub fn func_arguments_decl(&mut self, function: FunctionId, name: Atom) -> DeclId {
        let mut current = function;
        while self.function(current).is_arrow {
            match self.function(current).parent_function {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if let Some(decl) = self.function(current).arguments_decl {
            return decl;
        }

        let decl = if current == self.global_function() {
            self.new_decl_special(
                name,
                DeclKind::UndeclaredGlobalProperty,
                self.global_scope(),
                Special::Arguments,
                None,
            )
        } else {
            let scope = self.function(current).scopes[0];
            self.new_decl_special(name, DeclKind::Var, scope, Special::Arguments, None)
        };
        self.functions[current.0 as usize].arguments_decl = Some(decl);
        decl
    }

    /// Copy the semantic records of a cloned subtree: for every original
    /// node with an entry in a side table, give its clone the same entry.
    /// Used when a generic declaration is specialized by cloning.
    pub fn clone_node_info(&mut self, node_map: &FxHashMap<NodeId, NodeId>) {
        for (&old, &new) in node_map {
            if let Some(&d) = self.expr_decls.get(&old) {
                self.expr_decls.insert(new, d);
            }
            if let Some(&d) = self.ident_decls.get(&old) {
                self.ident_decls.insert(new, d);
            }
            if self.unresolvable.contains(&old) {
                self.unresolvable.insert(new);
            }
            if let Some(&s) = self.node_scopes.get(&old) {
                self.node_scopes.insert(new, s);
            }
            if let Some(&f) = self.node_functions.get(&old) {
                self.node_functions.insert(new, f);
            }
            if let Some(&l) = self.label_indices.get(&old) {
                self.label_indices.insert(new, l);
            }
            if let Some(&t) = self.label_targets.get(&old) {
                let remapped = node_map.get(&t).copied().unwrap_or(t);
                self.label_targets.insert(new, remapped);
            }
        }
    }
}
