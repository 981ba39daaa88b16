//! Identifier resolution
//!
//! One walk over the program that builds the scope tree, declares every
//! name according to its hoisting rules, and links every identifier
//! reference to its declaration. Strict mode, label resolution, and the
//! sloppy-mode promotion of block-scoped functions all happen here.
//!
//! Error reporting never aborts the walk: a bad declaration is skipped and
//! resolution continues, so one mistake produces one diagnostic.

use crate::binding_table::{ScopePtr, ScopedTable};
use crate::collector::DeclCollector;
use crate::keywords::Keywords;
use crate::promoter;
use crate::sem::{DeclId, DeclKind, FunctionId, ScopeId, SemContext};
use rustc_hash::{FxHashMap, FxHashSet};
use veld_ast::{Ast, Atom, NodeId, NodeKind, Span, UnaryOp, VarKind};
use veld_diag::{Diagnostic, DiagnosticSink, ErrorCode};

/// Names treated as pre-declared properties of the global object.
const AMBIENT_GLOBALS: &[&str] = &["undefined", "globalThis", "Infinity", "NaN"];

const ERR_REDECLARED: ErrorCode = ErrorCode("E1001");
const ERR_UNDECLARED: ErrorCode = ErrorCode("E1002");
const ERR_BAD_DECL_NAME: ErrorCode = ErrorCode("E1003");
const ERR_DUP_LABEL: ErrorCode = ErrorCode("E1004");
const ERR_UNDEFINED_LABEL: ErrorCode = ErrorCode("E1005");
const ERR_CONTINUE_NOT_LOOP: ErrorCode = ErrorCode("E1006");
const ERR_BREAK_OUTSIDE: ErrorCode = ErrorCode("E1007");
const ERR_CONTINUE_OUTSIDE: ErrorCode = ErrorCode("E1008");
const ERR_DUP_PARAM: ErrorCode = ErrorCode("E1009");
const ERR_RETURN_OUTSIDE: ErrorCode = ErrorCode("E1010");
const ERR_AWAIT_OUTSIDE: ErrorCode = ErrorCode("E1011");
const ERR_YIELD_OUTSIDE: ErrorCode = ErrorCode("E1012");
const ERR_SUPER_OUTSIDE: ErrorCode = ErrorCode("E1013");
const ERR_NEW_TARGET_OUTSIDE: ErrorCode = ErrorCode("E1014");
const ERR_STRICT_DELETE: ErrorCode = ErrorCode("E1015");
const ERR_TOO_DEEP: ErrorCode = ErrorCode("E1016");

/// Nesting budget for the resolution walk.
const MAX_RESOLVE_DEPTH: u32 = 256;

/// A name binding visible in the binding table.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub decl: DeclId,
    /// The declaring identifier, for "first declared here" labels.
    pub ident: Option<NodeId>,
}

struct LabelEntry {
    name: Atom,
    index: u32,
    /// The labeled statement.
    stmt: NodeId,
    /// True if the label's body is (transitively) a loop.
    is_loop: bool,
}

/// Per-function resolution state.
struct FunctionContext {
    func: FunctionId,
    collector: DeclCollector,
    labels: Vec<LabelEntry>,
    loop_depth: u32,
    switch_depth: u32,
    /// Block-scoped function declarations promoted to function scope, with
    /// the function-scope decl each one reuses.
    promoted: FxHashMap<NodeId, DeclId>,
    /// True inside a class method (or an arrow nested in one), where
    /// `super` is meaningful.
    allow_super: bool,
}

/// Resolve `program`, returning the populated semantic context.
pub fn resolve_program(
    ast: &mut Ast,
    program: NodeId,
    sink: &mut DiagnosticSink,
    file_id: usize,
) -> SemContext {
    let kw = Keywords::new(&mut ast.names);
    let ambient: Vec<Atom> = AMBIENT_GLOBALS.iter().map(|n| ast.names.intern(n)).collect();
    let mut resolver = SemanticResolver {
        ast,
        sem: SemContext::new(),
        sink,
        file_id,
        kw,
        ambient,
        table: ScopedTable::new(),
        global_binding_scope: None,
        scope_stack: Vec::new(),
        funcs: Vec::new(),
        in_typeof: false,
        depth: 0,
    };
    resolver.run(program);
    resolver.sem
}

struct SemanticResolver<'a> {
    ast: &'a Ast,
    sem: SemContext,
    sink: &'a mut DiagnosticSink,
    file_id: usize,
    kw: Keywords,
    ambient: Vec<Atom>,
    table: ScopedTable<Binding>,
    global_binding_scope: Option<ScopePtr>,
    /// Stack of semantic scopes; the last entry is the current scope.
    scope_stack: Vec<ScopeId>,
    funcs: Vec<FunctionContext>,
    /// Set while resolving the direct identifier operand of `typeof`.
    in_typeof: bool,
    depth: u32,
}

impl<'a> SemanticResolver<'a> {
    fn run(&mut self, program: NodeId) {
        let body = match self.ast.kind(program) {
            NodeKind::Program { body } => body.clone(),
            _ => return,
        };
        let strict = self.scan_use_strict(&body);

        let global_fn = self.sem.new_function(program, None, None, strict, false);
        let global_scope = self.sem.new_scope(None, global_fn, program);
        self.scope_stack.push(global_scope);
        self.global_binding_scope = Some(self.table.push_scope());

        for &name in &self.ambient.clone() {
            let decl = self.sem.new_decl(name, DeclKind::GlobalProperty, global_scope);
            self.table.insert(name, Binding { decl, ident: None });
        }

        let collector = DeclCollector::run(self.ast, program);
        let promoted_nodes = promoter::find_promotable(self.ast, &collector, strict);
        self.funcs.push(FunctionContext {
            func: global_fn,
            collector,
            labels: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
            promoted: FxHashMap::default(),
            allow_super: false,
        });
        self.promote_functions(&promoted_nodes);
        self.process_declarations(program);

        for stmt in body {
            self.visit_stmt(stmt);
        }

        self.table.pop_scope();
        self.scope_stack.pop();
        self.funcs.pop();
    }

    // ==== Context helpers ====

    fn ctx(&self) -> &FunctionContext {
        self.funcs.last().expect("no active function")
    }

    fn ctx_mut(&mut self) -> &mut FunctionContext {
        self.funcs.last_mut().expect("no active function")
    }

    fn current_function(&self) -> FunctionId {
        self.ctx().func
    }

    fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().expect("no active scope")
    }

    fn in_global_function(&self) -> bool {
        self.funcs.len() == 1
    }

    fn strict(&self) -> bool {
        self.sem.function(self.current_function()).strict
    }

    fn span(&self, node: NodeId) -> Span {
        self.ast.span(node)
    }

    fn name_str(&self, name: Atom) -> &str {
        self.ast.names.resolve(name)
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: String, label: &str) {
        self.sink.report(
            Diagnostic::error(message)
                .with_code(code)
                .with_primary_label(self.file_id, span, label),
        );
    }

    /// Bump the recursion budget; on exhaustion report once and signal the
    /// caller to skip the subtree.
    fn enter(&mut self, node: NodeId) -> bool {
        self.depth += 1;
        if self.depth > MAX_RESOLVE_DEPTH {
            if self.depth == MAX_RESOLVE_DEPTH + 1 {
                self.error(
                    ERR_TOO_DEEP,
                    self.span(node),
                    "Nesting too deep to resolve".to_string(),
                    "too deeply nested",
                );
            }
            return false;
        }
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ==== Directives ====

    fn scan_use_strict(&self, stmts: &[NodeId]) -> bool {
        for &stmt in stmts {
            let NodeKind::ExpressionStatement { expression } = self.ast.kind(stmt) else {
                return false;
            };
            match self.ast.kind(*expression) {
                NodeKind::StringLiteral { value } => {
                    if self.ast.names.resolve(*value) == "use strict" {
                        return true;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    // ==== Declaration processing ====

    /// Declare everything the collector gathered for the scope created by
    /// `scope_node`. Runs when the scope is entered, before its statements
    /// are visited, which is what makes hoisting work.
    fn process_declarations(&mut self, scope_node: NodeId) {
        let Some(decls) = self.ctx().collector.scope_decls(scope_node) else {
            return;
        };
        let decls: Vec<NodeId> = decls.to_vec();
        let at_function_root = scope_node == self.ctx().collector.root();

        for decl_node in decls {
            match self.ast.kind(decl_node) {
                NodeKind::VariableDeclaration { kind, declarators } => {
                    let decl_kind = match kind {
                        VarKind::Var if self.in_global_function() => DeclKind::GlobalProperty,
                        VarKind::Var => DeclKind::Var,
                        VarKind::Let => DeclKind::Let,
                        VarKind::Const => DeclKind::Const,
                    };
                    for &d in declarators.clone().iter() {
                        if let NodeKind::VariableDeclarator { id, .. } = self.ast.kind(d) {
                            self.declare_pattern(*id, decl_kind);
                        }
                    }
                }
                NodeKind::FunctionDeclaration { id, .. } => {
                    let id = *id;
                    let kind = if self.in_global_function() && at_function_root {
                        DeclKind::GlobalProperty
                    } else if at_function_root {
                        DeclKind::Var
                    } else {
                        DeclKind::ScopedFunction
                    };
                    if let Some(&promoted) = self.ctx().promoted.get(&decl_node) {
                        // Promoted function: reuse the function-scope decl,
                        // adding a binding in this block.
                        if let Some(name) = self.ast.ident_name(id) {
                            self.sem.set_ident_decl(id, promoted);
                            self.table.insert(name, Binding { decl: promoted, ident: Some(id) });
                        }
                    } else {
                        self.declare_identifier(id, kind);
                    }
                    let scope = self.current_scope();
                    self.sem.scope_mut(scope).hoisted_functions.push(decl_node);
                }
                NodeKind::ClassDeclaration { id, .. } => {
                    self.declare_identifier(*id, DeclKind::Class);
                }
                NodeKind::ImportDeclaration { specifiers, .. } => {
                    for &s in specifiers.clone().iter() {
                        if let NodeKind::ImportSpecifier { local } = self.ast.kind(s) {
                            self.declare_identifier(*local, DeclKind::Import);
                        }
                    }
                }
                NodeKind::CatchClause { param: Some(param), .. } => {
                    let param = *param;
                    // A simple catch binding has its own relaxed kind; a
                    // destructured one declares ordinary lexical names.
                    let kind = match self.ast.kind(param) {
                        NodeKind::Identifier { .. } => DeclKind::Catch,
                        _ => DeclKind::Let,
                    };
                    self.declare_pattern(param, kind);
                }
                _ => {}
            }
        }
    }

    /// Declare every identifier bound by `pattern`.
    fn declare_pattern(&mut self, pattern: NodeId, kind: DeclKind) {
        match self.ast.kind(pattern) {
            NodeKind::Identifier { .. } => {
                self.declare_identifier(pattern, kind);
            }
            NodeKind::ArrayPattern { elements } => {
                for &e in elements.clone().iter() {
                    self.declare_pattern(e, kind);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for &p in properties.clone().iter() {
                    if let NodeKind::Property { value, .. } = self.ast.kind(p) {
                        self.declare_pattern(*value, kind);
                    }
                }
            }
            NodeKind::AssignmentPattern { left, .. } => {
                self.declare_pattern(*left, kind);
            }
            NodeKind::RestElement { argument } => {
                self.declare_pattern(*argument, kind);
            }
            _ => {}
        }
    }

    /// Declare one identifier, enforcing the redeclaration rules. Returns
    /// the declaration, which may be a reused earlier one.
    fn declare_identifier(&mut self, ident: NodeId, kind: DeclKind) -> Option<DeclId> {
        let name = self.ast.ident_name(ident)?;
        if !self.validate_declaration_name(ident, name, kind) {
            return None;
        }

        let scope = self.current_scope();
        let prev = self.table.lookup(name).copied();
        if let Some(prev_binding) = prev {
            let prev_decl = self.sem.decl(prev_binding.decl).clone();
            if prev_decl.scope == scope {
                // Same scope: var-like kinds coexist, lexical ones do not.
                if prev_decl.kind.is_var_like() && kind.is_var_like() {
                    self.sem.set_ident_decl(ident, prev_binding.decl);
                    return Some(prev_binding.decl);
                }
                if prev_decl.kind == DeclKind::ScopedFunction && kind == DeclKind::Var {
                    self.sem.set_ident_decl(ident, prev_binding.decl);
                    return Some(prev_binding.decl);
                }
                if prev_decl.kind == DeclKind::ScopedFunction && kind == DeclKind::ScopedFunction
                {
                    // Later function declaration wins; fresh decl, same name.
                    let decl = self.sem.new_decl(name, kind, scope);
                    self.sem.set_ident_decl(ident, decl);
                    self.table.insert(name, Binding { decl, ident: Some(ident) });
                    return Some(decl);
                }
                let mut diag = Diagnostic::error(format!(
                    "Identifier '{}' has already been declared",
                    self.name_str(name)
                ))
                .with_code(ERR_REDECLARED)
                .with_primary_label(self.file_id, self.span(ident), "redeclared here");
                if let Some(prev_ident) = prev_binding.ident {
                    diag = diag.with_secondary_label(
                        self.file_id,
                        self.span(prev_ident),
                        "first declared here",
                    );
                }
                self.sink.report(diag);
                return None;
            }
        }

        let decl = self.sem.new_decl(name, kind, scope);
        self.sem.set_ident_decl(ident, decl);
        self.table.insert(name, Binding { decl, ident: Some(ident) });
        Some(decl)
    }

    /// Check restrictions on the declared name itself. Returns false and
    /// reports if the declaration is invalid.
    fn validate_declaration_name(&mut self, ident: NodeId, name: Atom, kind: DeclKind) -> bool {
        if self.strict() && (name == self.kw.eval || name == self.kw.arguments) {
            if matches!(
                kind,
                DeclKind::Let
                    | DeclKind::Const
                    | DeclKind::Class
                    | DeclKind::Var
                    | DeclKind::GlobalProperty
                    | DeclKind::Parameter
                    | DeclKind::ScopedFunction
                    | DeclKind::Catch
                    | DeclKind::FunctionExprName
            ) {
                let text = self.name_str(name).to_string();
                self.error(
                    ERR_BAD_DECL_NAME,
                    self.span(ident),
                    format!("Cannot declare '{text}' in strict mode"),
                    "invalid binding name",
                );
                return false;
            }
        }
        if name == self.kw.let_ {
            if kind.is_let_like() {
                self.error(
                    ERR_BAD_DECL_NAME,
                    self.span(ident),
                    "'let' is disallowed as a lexically bound name".to_string(),
                    "invalid binding name",
                );
                return false;
            }
            if self.strict() && kind == DeclKind::Parameter {
                self.error(
                    ERR_BAD_DECL_NAME,
                    self.span(ident),
                    "'let' is disallowed as a parameter name in strict mode".to_string(),
                    "invalid binding name",
                );
                return false;
            }
        }
        true
    }

    // ==== Identifier references ====

    fn resolve_identifier(&mut self, ident: NodeId) {
        let Some(name) = self.ast.ident_name(ident) else { return };
        if let Some(binding) = self.table.lookup(name) {
            let decl = binding.decl;
            self.sem.set_expr_decl(ident, decl);
            return;
        }

        // `arguments` resolves to the implicit object of the closest
        // non-arrow function when no user declaration shadows it.
        if name == self.kw.arguments {
            let func = self.current_function();
            let decl = self.sem.func_arguments_decl(func, name);
            self.sem.set_expr_decl(ident, decl);
            return;
        }

        // In the reach of a direct `eval` the name may be introduced at
        // runtime; leave it explicitly unresolved.
        if self.sem.function(self.current_function()).contains_direct_eval {
            self.sem.set_unresolvable(ident);
            return;
        }

        // Otherwise the reference creates an undeclared global property.
        let global_scope = self.sem.global_scope();
        let decl = self.sem.new_decl(name, DeclKind::UndeclaredGlobalProperty, global_scope);
        if let Some(global) = self.global_binding_scope {
            self.table.insert_into(global, name, Binding { decl, ident: None });
        }
        self.sem.set_expr_decl(ident, decl);

        if self.strict() && !self.in_typeof {
            let text = self.name_str(name).to_string();
            self.sink.report(
                Diagnostic::warning(format!("Identifier '{text}' was not declared"))
                    .with_code(ERR_UNDECLARED)
                    .with_primary_label(self.file_id, self.span(ident), "not declared"),
            );
        }
    }

    // ==== Statements ====

    fn visit_stmt(&mut self, stmt: NodeId) {
        if !self.enter(stmt) {
            self.leave();
            return;
        }
        self.visit_stmt_inner(stmt);
        self.leave();
    }

    fn visit_stmt_inner(&mut self, stmt: NodeId) {
        match self.ast.kind(stmt) {
            NodeKind::VariableDeclaration { declarators, .. } => {
                for &d in declarators.clone().iter() {
                    if let NodeKind::VariableDeclarator { id, init } = self.ast.kind(d) {
                        let (id, init) = (*id, *init);
                        self.visit_pattern_defaults(id);
                        if let Some(init) = init {
                            self.visit_expr(init);
                        }
                    }
                }
            }
            NodeKind::FunctionDeclaration { .. } => {
                self.visit_function_like(stmt, false, false);
            }
            NodeKind::ClassDeclaration { .. } | NodeKind::ClassExpression { .. } => {
                self.visit_class(stmt);
            }
            NodeKind::TypeAliasDeclaration { .. } | NodeKind::ImportDeclaration { .. } => {
                // Type aliases and import bindings carry no value
                // expressions to resolve here.
            }
            NodeKind::Block { body } => {
                let body = body.clone();
                self.enter_scope(stmt);
                for s in body {
                    self.visit_stmt(s);
                }
                self.leave_scope();
            }
            NodeKind::EmptyStatement => {}
            NodeKind::ExpressionStatement { expression } => self.visit_expr(*expression),
            NodeKind::IfStatement { test, consequent, alternate } => {
                let (test, consequent, alternate) = (*test, *consequent, *alternate);
                self.visit_expr(test);
                self.visit_stmt(consequent);
                if let Some(alt) = alternate {
                    self.visit_stmt(alt);
                }
            }
            NodeKind::WhileStatement { test, body } => {
                let (test, body) = (*test, *body);
                self.visit_expr(test);
                self.visit_loop_body(body);
            }
            NodeKind::DoWhileStatement { body, test } => {
                let (body, test) = (*body, *test);
                self.visit_loop_body(body);
                self.visit_expr(test);
            }
            NodeKind::ForStatement { init, test, update, body } => {
                let (init, test, update, body) = (*init, *test, *update, *body);
                self.enter_scope(stmt);
                if let Some(init) = init {
                    self.visit_for_init(init);
                }
                if let Some(test) = test {
                    self.visit_expr(test);
                }
                if let Some(update) = update {
                    self.visit_expr(update);
                }
                self.visit_loop_body(body);
                self.leave_scope();
            }
            NodeKind::ForInStatement { left, right, body }
            | NodeKind::ForOfStatement { left, right, body } => {
                let (left, right, body) = (*left, *right, *body);
                self.enter_scope(stmt);
                self.visit_for_init(left);
                self.visit_expr(right);
                self.visit_loop_body(body);
                self.leave_scope();
            }
            NodeKind::SwitchStatement { discriminant, cases } => {
                let (discriminant, cases) = (*discriminant, cases.clone());
                self.visit_expr(discriminant);
                self.enter_scope(stmt);
                self.ctx_mut().switch_depth += 1;
                for case in cases {
                    if let NodeKind::SwitchCase { test, consequent } = self.ast.kind(case) {
                        let (test, consequent) = (*test, consequent.clone());
                        if let Some(test) = test {
                            self.visit_expr(test);
                        }
                        for s in consequent {
                            self.visit_stmt(s);
                        }
                    }
                }
                self.ctx_mut().switch_depth -= 1;
                self.leave_scope();
            }
            NodeKind::ReturnStatement { argument } => {
                let argument = *argument;
                if self.in_global_function() {
                    self.error(
                        ERR_RETURN_OUTSIDE,
                        self.span(stmt),
                        "'return' can only be used inside a function".to_string(),
                        "not inside a function",
                    );
                }
                if let Some(arg) = argument {
                    self.visit_expr(arg);
                }
            }
            NodeKind::BreakStatement { label } => {
                let label = *label;
                self.visit_break(stmt, label);
            }
            NodeKind::ContinueStatement { label } => {
                let label = *label;
                self.visit_continue(stmt, label);
            }
            NodeKind::LabeledStatement { label, body } => {
                let (label, body) = (*label, *body);
                self.visit_labeled(stmt, label, body);
            }
            NodeKind::ThrowStatement { argument } => self.visit_expr(*argument),
            NodeKind::TryStatement { block, handler, finalizer } => {
                let (block, handler, finalizer) = (*block, *handler, *finalizer);
                self.visit_stmt(block);
                if let Some(handler) = handler {
                    if let NodeKind::CatchClause { param, body } = self.ast.kind(handler) {
                        let (param, body) = (*param, *body);
                        self.enter_scope(handler);
                        if let Some(param) = param {
                            self.visit_pattern_defaults(param);
                        }
                        self.visit_stmt(body);
                        self.leave_scope();
                    }
                }
                if let Some(finalizer) = finalizer {
                    self.visit_stmt(finalizer);
                }
            }
            // An expression in statement position (shouldn't happen, but
            // stay total).
            _ => self.visit_expr(stmt),
        }
    }

    /// A `for`/`for-in`/`for-of` init clause: either a declaration whose
    /// names were declared at scope entry, or a plain assignment target.
    fn visit_for_init(&mut self, init: NodeId) {
        match self.ast.kind(init) {
            NodeKind::VariableDeclaration { .. } => self.visit_stmt(init),
            _ => self.visit_expr(init),
        }
    }

    fn visit_loop_body(&mut self, body: NodeId) {
        self.ctx_mut().loop_depth += 1;
        self.visit_stmt(body);
        self.ctx_mut().loop_depth -= 1;
    }

    fn enter_scope(&mut self, node: NodeId) {
        let func = self.current_function();
        let parent = self.current_scope();
        let scope = self.sem.new_scope(Some(parent), func, node);
        self.scope_stack.push(scope);
        self.table.push_scope();
        self.process_declarations(node);
    }

    fn leave_scope(&mut self) {
        self.table.pop_scope();
        self.scope_stack.pop();
    }

    // ==== Labels ====

    fn visit_labeled(&mut self, stmt: NodeId, label: NodeId, body: NodeId) {
        let Some(name) = self.ast.ident_name(label) else { return };
        if self.ctx().labels.iter().any(|l| l.name == name) {
            let text = self.name_str(name).to_string();
            self.error(
                ERR_DUP_LABEL,
                self.span(label),
                format!("Label '{text}' is already declared"),
                "duplicate label",
            );
            self.visit_stmt(body);
            return;
        }
        let func = self.current_function();
        let index = self.sem.alloc_label(func);
        self.sem.set_label_index(stmt, index);
        let is_loop = self.statement_is_loop(body);
        self.ctx_mut().labels.push(LabelEntry { name, index, stmt, is_loop });
        self.visit_stmt(body);
        self.ctx_mut().labels.pop();
    }

    fn statement_is_loop(&self, stmt: NodeId) -> bool {
        match self.ast.kind(stmt) {
            NodeKind::WhileStatement { .. }
            | NodeKind::DoWhileStatement { .. }
            | NodeKind::ForStatement { .. }
            | NodeKind::ForInStatement { .. }
            | NodeKind::ForOfStatement { .. } => true,
            NodeKind::LabeledStatement { body, .. } => self.statement_is_loop(*body),
            _ => false,
        }
    }

    fn visit_break(&mut self, stmt: NodeId, label: Option<NodeId>) {
        match label {
            Some(label) => {
                let Some(name) = self.ast.ident_name(label) else { return };
                match self.ctx().labels.iter().rev().find(|l| l.name == name) {
                    Some(entry) => {
                        let (index, target) = (entry.index, entry.stmt);
                        self.sem.set_label_index(stmt, index);
                        self.sem.set_label_target(stmt, target);
                    }
                    None => {
                        let text = self.name_str(name).to_string();
                        self.error(
                            ERR_UNDEFINED_LABEL,
                            self.span(label),
                            format!("Label '{text}' is not defined"),
                            "undefined label",
                        );
                    }
                }
            }
            None => {
                let ctx = self.ctx();
                if ctx.loop_depth == 0 && ctx.switch_depth == 0 {
                    self.error(
                        ERR_BREAK_OUTSIDE,
                        self.span(stmt),
                        "'break' can only be used inside a loop or switch".to_string(),
                        "not inside a loop or switch",
                    );
                }
            }
        }
    }

    fn visit_continue(&mut self, stmt: NodeId, label: Option<NodeId>) {
        match label {
            Some(label) => {
                let Some(name) = self.ast.ident_name(label) else { return };
                match self.ctx().labels.iter().rev().find(|l| l.name == name) {
                    Some(entry) if entry.is_loop => {
                        let (index, target) = (entry.index, entry.stmt);
                        self.sem.set_label_index(stmt, index);
                        self.sem.set_label_target(stmt, target);
                    }
                    Some(_) => {
                        let text = self.name_str(name).to_string();
                        self.error(
                            ERR_CONTINUE_NOT_LOOP,
                            self.span(label),
                            format!("Label '{text}' does not reference a loop"),
                            "not a loop label",
                        );
                    }
                    None => {
                        let text = self.name_str(name).to_string();
                        self.error(
                            ERR_UNDEFINED_LABEL,
                            self.span(label),
                            format!("Label '{text}' is not defined"),
                            "undefined label",
                        );
                    }
                }
            }
            None => {
                if self.ctx().loop_depth == 0 {
                    self.error(
                        ERR_CONTINUE_OUTSIDE,
                        self.span(stmt),
                        "'continue' can only be used inside a loop".to_string(),
                        "not inside a loop",
                    );
                }
            }
        }
    }

    // ==== Expressions ====

    fn visit_expr(&mut self, expr: NodeId) {
        if !self.enter(expr) {
            self.leave();
            return;
        }
        self.visit_expr_inner(expr);
        self.leave();
    }

    fn visit_expr_inner(&mut self, expr: NodeId) {
        match self.ast.kind(expr) {
            NodeKind::Identifier { .. } => self.resolve_identifier(expr),
            NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::NullLiteral
            | NodeKind::BigIntLiteral { .. }
            | NodeKind::This => {}
            NodeKind::Super => {
                if !self.ctx().allow_super {
                    self.error(
                        ERR_SUPER_OUTSIDE,
                        self.span(expr),
                        "'super' is only allowed inside a class method".to_string(),
                        "not inside a method",
                    );
                }
            }
            NodeKind::NewTarget => {
                // Arrows see the `new.target` of the enclosing function.
                let mut func = self.current_function();
                while self.sem.function(func).is_arrow {
                    match self.sem.function(func).parent_function {
                        Some(parent) => func = parent,
                        None => break,
                    }
                }
                if func == self.sem.global_function() {
                    self.error(
                        ERR_NEW_TARGET_OUTSIDE,
                        self.span(expr),
                        "'new.target' is only allowed inside a function".to_string(),
                        "not inside a function",
                    );
                }
            }
            NodeKind::TemplateLiteral { expressions, .. } => {
                for e in expressions.clone() {
                    self.visit_expr(e);
                }
            }
            NodeKind::ArrayExpression { elements } => {
                for e in elements.clone() {
                    if !matches!(self.ast.kind(e), NodeKind::Elision) {
                        self.visit_expr(e);
                    }
                }
            }
            NodeKind::ObjectExpression { properties } => {
                for p in properties.clone() {
                    match self.ast.kind(p) {
                        NodeKind::Property { key, value, computed } => {
                            let (key, value, computed) = (*key, *value, *computed);
                            if computed {
                                self.visit_expr(key);
                            }
                            self.visit_expr(value);
                        }
                        NodeKind::SpreadElement { argument } => self.visit_expr(*argument),
                        _ => {}
                    }
                }
            }
            NodeKind::UnaryExpression { op, argument } => {
                let (op, argument) = (*op, *argument);
                if op == UnaryOp::Delete && self.strict() {
                    self.check_strict_delete(argument);
                }
                // `typeof x` probes for existence; an undeclared name there
                // is not worth a warning.
                let probe = op == UnaryOp::Typeof
                    && matches!(self.ast.kind(argument), NodeKind::Identifier { .. });
                if probe {
                    self.in_typeof = true;
                }
                self.visit_expr(argument);
                if probe {
                    self.in_typeof = false;
                }
            }
            NodeKind::AwaitExpression { argument } => {
                let argument = *argument;
                if !self.sem.function(self.current_function()).is_async {
                    self.error(
                        ERR_AWAIT_OUTSIDE,
                        self.span(expr),
                        "'await' is only allowed inside an async function".to_string(),
                        "not inside an async function",
                    );
                }
                self.visit_expr(argument);
            }
            NodeKind::UpdateExpression { argument, .. }
            | NodeKind::SpreadElement { argument }
            | NodeKind::ImplicitCheckedCast { argument } => self.visit_expr(*argument),
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. }
            | NodeKind::AssignmentExpression { left, right, .. } => {
                let (left, right) = (*left, *right);
                self.visit_expr(left);
                self.visit_expr(right);
            }
            NodeKind::AssignmentPattern { left, right } => {
                let (left, right) = (*left, *right);
                self.visit_expr(left);
                self.visit_expr(right);
            }
            NodeKind::ArrayPattern { elements } => {
                for e in elements.clone() {
                    if !matches!(self.ast.kind(e), NodeKind::Elision) {
                        self.visit_expr(e);
                    }
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for p in properties.clone() {
                    if let NodeKind::Property { value, .. } = self.ast.kind(p) {
                        self.visit_expr(*value);
                    }
                }
            }
            NodeKind::RestElement { argument } => self.visit_expr(*argument),
            NodeKind::ConditionalExpression { test, consequent, alternate } => {
                let (test, consequent, alternate) = (*test, *consequent, *alternate);
                self.visit_expr(test);
                self.visit_expr(consequent);
                self.visit_expr(alternate);
            }
            NodeKind::CallExpression { callee, arguments, .. } => {
                let (callee, arguments) = (*callee, arguments.clone());
                self.note_direct_eval(callee);
                self.visit_expr(callee);
                for a in arguments {
                    self.visit_expr(a);
                }
            }
            NodeKind::NewExpression { callee, arguments, .. } => {
                let (callee, arguments) = (*callee, arguments.clone());
                self.visit_expr(callee);
                for a in arguments {
                    self.visit_expr(a);
                }
            }
            NodeKind::MemberExpression { object, property, computed } => {
                let (object, property, computed) = (*object, *property, *computed);
                self.visit_expr(object);
                if computed {
                    self.visit_expr(property);
                }
            }
            NodeKind::SequenceExpression { expressions } => {
                for e in expressions.clone() {
                    self.visit_expr(e);
                }
            }
            NodeKind::FunctionExpression { .. } | NodeKind::ArrowFunction { .. } => {
                self.visit_function_like(expr, false, false);
            }
            NodeKind::ClassExpression { .. } => self.visit_class(expr),
            NodeKind::YieldExpression { argument, .. } => {
                let argument = *argument;
                if !self.sem.function(self.current_function()).is_generator {
                    self.error(
                        ERR_YIELD_OUTSIDE,
                        self.span(expr),
                        "'yield' is only allowed inside a generator function".to_string(),
                        "not inside a generator",
                    );
                }
                if let Some(a) = argument {
                    self.visit_expr(a);
                }
            }
            _ => {}
        }
    }

    /// `delete x` on a resolvable local binding is illegal in strict mode.
    fn check_strict_delete(&mut self, argument: NodeId) {
        let Some(name) = self.ast.ident_name(argument) else { return };
        if let Some(binding) = self.table.lookup(name) {
            if !self.sem.decl(binding.decl).kind.is_global() {
                self.error(
                    ERR_STRICT_DELETE,
                    self.span(argument),
                    "Cannot delete a variable in strict mode".to_string(),
                    "local variable",
                );
            }
        }
    }

    /// Record a direct `eval(...)` call on the current function chain.
    fn note_direct_eval(&mut self, callee: NodeId) {
        if self.ast.ident_name(callee) == Some(self.kw.eval) {
            let func = self.current_function();
            self.sem.function_mut(func).contains_direct_eval = true;
        }
    }

    /// Visit the default-value expressions of a binding pattern. The bound
    /// identifiers themselves were declared at scope entry.
    fn visit_pattern_defaults(&mut self, pattern: NodeId) {
        match self.ast.kind(pattern) {
            NodeKind::Identifier { .. } => {}
            NodeKind::ArrayPattern { elements } => {
                for e in elements.clone() {
                    self.visit_pattern_defaults(e);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                for p in properties.clone() {
                    if let NodeKind::Property { value, .. } = self.ast.kind(p) {
                        self.visit_pattern_defaults(*value);
                    }
                }
            }
            NodeKind::AssignmentPattern { left, right } => {
                let (left, right) = (*left, *right);
                self.visit_pattern_defaults(left);
                self.visit_expr(right);
            }
            NodeKind::RestElement { argument } => self.visit_pattern_defaults(*argument),
            _ => {}
        }
    }

    // ==== Functions and classes ====

    fn visit_function_like(&mut self, node: NodeId, force_strict: bool, is_method: bool) {
        let is_arrow = self.ast.is_arrow(node);
        let body = self.ast.function_body(node);
        let params: Vec<NodeId> =
            self.ast.function_params(node).map(|p| p.to_vec()).unwrap_or_default();

        let body_stmts: Vec<NodeId> = match body.map(|b| self.ast.kind(b)) {
            Some(NodeKind::Block { body }) => body.clone(),
            _ => Vec::new(),
        };
        let strict = self.strict() || force_strict || self.scan_use_strict(&body_stmts);
        let allow_super = is_method || (is_arrow && self.ctx().allow_super);
        let (is_async, is_generator) = match self.ast.kind(node) {
            NodeKind::FunctionDeclaration { is_async, is_generator, .. }
            | NodeKind::FunctionExpression { is_async, is_generator, .. } => {
                (*is_async, *is_generator)
            }
            NodeKind::ArrowFunction { is_async, .. } => (*is_async, false),
            _ => (false, false),
        };

        let parent_func = self.current_function();
        let parent_scope = self.current_scope();
        let func = self.sem.new_function(node, Some(parent_func), Some(parent_scope), strict, is_arrow);
        self.sem.function_mut(func).is_async = is_async;
        self.sem.function_mut(func).is_generator = is_generator;

        // A named function expression binds its own name in a scope that
        // wraps the function scope, so parameters may shadow it.
        let mut name_scope_pushed = false;
        if let NodeKind::FunctionExpression { id: Some(id), .. } = self.ast.kind(node) {
            let id = *id;
            if let Some(name) = self.ast.ident_name(id) {
                let name_scope = self.sem.new_scope(Some(parent_scope), func, id);
                self.scope_stack.push(name_scope);
                self.table.push_scope();
                name_scope_pushed = true;
                let decl = self.sem.new_decl(name, DeclKind::FunctionExprName, name_scope);
                self.sem.set_ident_decl(id, decl);
                self.table.insert(name, Binding { decl, ident: Some(id) });
            }
        }

        let function_scope = {
            let parent = self.current_scope();
            self.sem.new_scope(Some(parent), func, node)
        };
        self.scope_stack.push(function_scope);
        self.table.push_scope();

        let collector = DeclCollector::run(self.ast, node);
        let promoted_nodes = promoter::find_promotable(self.ast, &collector, strict);
        self.funcs.push(FunctionContext {
            func,
            collector,
            labels: Vec::new(),
            loop_depth: 0,
            switch_depth: 0,
            promoted: FxHashMap::default(),
            allow_super,
        });

        self.declare_parameters(node, &params, strict);
        self.promote_functions(&promoted_nodes);
        self.process_declarations(node);

        for &param in &params {
            self.visit_pattern_defaults(param);
        }
        for stmt in body_stmts {
            self.visit_stmt(stmt);
        }

        self.funcs.pop();
        self.table.pop_scope();
        self.scope_stack.pop();
        if name_scope_pushed {
            self.table.pop_scope();
            self.scope_stack.pop();
        }
    }

    fn declare_parameters(&mut self, node: NodeId, params: &[NodeId], strict: bool) {
        // Duplicate parameter names are only tolerated for simple sloppy
        // parameter lists.
        let simple = params
            .iter()
            .all(|&p| matches!(self.ast.kind(p), NodeKind::Identifier { .. }));
        let unique_required = strict || !simple || self.ast.is_arrow(node);

        let mut seen = FxHashSet::default();
        for &param in params {
            let mut names = FxHashSet::default();
            promoter::collect_pattern_names(self.ast, param, &mut names);
            for name in names {
                if !seen.insert(name) && unique_required {
                    let text = self.name_str(name).to_string();
                    self.error(
                        ERR_DUP_PARAM,
                        self.span(param),
                        format!("Duplicate parameter name '{text}'"),
                        "duplicate parameter",
                    );
                }
            }
            self.declare_pattern(param, DeclKind::Parameter);
        }
    }

    /// Declare the function-scope side of each promoted block function.
    fn promote_functions(&mut self, promoted_nodes: &FxHashSet<NodeId>) {
        for &node in promoted_nodes {
            let NodeKind::FunctionDeclaration { id, .. } = self.ast.kind(node) else { continue };
            let id = *id;
            let Some(name) = self.ast.ident_name(id) else { continue };
            let kind = if self.in_global_function() {
                DeclKind::GlobalProperty
            } else {
                DeclKind::Var
            };
            let scope = self.current_scope();
            let decl = self.sem.new_decl(name, kind, scope);
            self.table.insert(name, Binding { decl, ident: Some(id) });
            self.ctx_mut().promoted.insert(node, decl);
        }
    }

    fn visit_class(&mut self, node: NodeId) {
        let (id, super_class, body) = match self.ast.kind(node) {
            NodeKind::ClassDeclaration { id, super_class, body, .. } => {
                (Some(*id), *super_class, *body)
            }
            NodeKind::ClassExpression { id, super_class, body, .. } => (*id, *super_class, *body),
            _ => return,
        };

        if let Some(sc) = super_class {
            self.visit_expr(sc);
        }

        // A class expression's name is visible inside the class only.
        let mut name_scope_pushed = false;
        if matches!(self.ast.kind(node), NodeKind::ClassExpression { .. }) {
            if let Some(id) = id {
                if let Some(name) = self.ast.ident_name(id) {
                    let func = self.current_function();
                    let parent = self.current_scope();
                    let scope = self.sem.new_scope(Some(parent), func, id);
                    self.scope_stack.push(scope);
                    self.table.push_scope();
                    name_scope_pushed = true;
                    let decl = self.sem.new_decl(name, DeclKind::ClassExprName, scope);
                    self.sem.set_ident_decl(id, decl);
                    self.table.insert(name, Binding { decl, ident: Some(id) });
                }
            }
        }

        // Class bodies are always strict.
        if let NodeKind::ClassBody { members } = self.ast.kind(body) {
            for member in members.clone() {
                match self.ast.kind(member) {
                    NodeKind::MethodDefinition { value, .. } => {
                        let value = *value;
                        self.visit_function_like(value, true, true);
                    }
                    NodeKind::ClassProperty { value: Some(value), .. } => {
                        let value = *value;
                        self.visit_expr(value);
                    }
                    _ => {}
                }
            }
        }

        if name_scope_pushed {
            self.table.pop_scope();
            self.scope_stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Special;
    use veld_ast::AstBuilder;

    fn resolve(mut b: AstBuilder, program: NodeId) -> (SemContext, DiagnosticSink, Ast) {
        let mut ast = b.finish();
        let mut sink = DiagnosticSink::new();
        let sem = resolve_program(&mut ast, program, &mut sink, 0);
        (sem, sink, ast)
    }

    fn error_codes(mut sink: DiagnosticSink) -> Vec<String> {
        sink.take_sorted()
            .into_iter()
            .filter_map(|d| d.code().map(|c| c.0.to_string()))
            .collect()
    }

    #[test]
    fn test_global_var_is_global_property() {
        let mut b = AstBuilder::new();
        let decl = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let use_x = b.ident("x");
        let stmt = b.expr_stmt(use_x);
        let program = b.program(vec![decl, stmt]);
        let (sem, sink, ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_x).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::GlobalProperty);
        assert_eq!(ast.names.resolve(sem.decl(d).name), "x");
    }

    #[test]
    fn test_let_shadowing_across_blocks() {
        let mut b = AstBuilder::new();
        let outer = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let inner = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let inner_use = b.ident("x");
        let inner_stmt = b.expr_stmt(inner_use);
        let block = b.block(vec![inner, inner_stmt]);
        let outer_use = b.ident("x");
        let outer_stmt = b.expr_stmt(outer_use);
        let program = b.program(vec![outer, block, outer_stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let inner_decl = sem.expr_decl(inner_use).unwrap();
        let outer_decl = sem.expr_decl(outer_use).unwrap();
        assert_ne!(inner_decl, outer_decl);
    }

    #[test]
    fn test_let_redeclaration_reports_error() {
        let mut b = AstBuilder::new();
        let first = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let second = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let program = b.program(vec![first, second]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1001"]);
    }

    #[test]
    fn test_var_redeclaration_reuses_decl() {
        let mut b = AstBuilder::new();
        let first = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let second = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let use_x = b.ident("x");
        let stmt = b.expr_stmt(use_x);
        let program = b.program(vec![first, second, stmt]);
        let (sem, sink, ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let first_id = match ast.kind(first) {
            NodeKind::VariableDeclaration { declarators, .. } => {
                match ast.kind(declarators[0]) {
                    NodeKind::VariableDeclarator { id, .. } => *id,
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(),
        };
        let second_id = match ast.kind(second) {
            NodeKind::VariableDeclaration { declarators, .. } => {
                match ast.kind(declarators[0]) {
                    NodeKind::VariableDeclarator { id, .. } => *id,
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(),
        };
        assert_eq!(sem.ident_decl(first_id), sem.ident_decl(second_id));
        assert_eq!(sem.expr_decl(use_x), sem.ident_decl(first_id));
    }

    #[test]
    fn test_var_then_let_reports_error() {
        let mut b = AstBuilder::new();
        let first = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let second = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let program = b.program(vec![first, second]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1001"]);
    }

    #[test]
    fn test_undeclared_reference_becomes_global() {
        let mut b = AstBuilder::new();
        let use_y = b.ident("y");
        let stmt = b.expr_stmt(use_y);
        let program = b.program(vec![stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_y).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::UndeclaredGlobalProperty);
        assert_eq!(sem.decl(d).scope, sem.global_scope());
    }

    #[test]
    fn test_undeclared_references_share_one_decl() {
        let mut b = AstBuilder::new();
        let first = b.ident("y");
        let s1 = b.expr_stmt(first);
        let body = b.block(vec![]);
        let func = b.func_decl("f", vec![], body);
        let second = b.ident("y");
        let s2 = b.expr_stmt(second);
        let program = b.program(vec![s1, func, s2]);
        let (sem, _sink, _ast) = resolve(b, program);

        assert_eq!(sem.expr_decl(first), sem.expr_decl(second));
    }

    #[test]
    fn test_strict_undeclared_reference_warns() {
        let mut b = AstBuilder::new();
        let directive = b.string("use strict");
        let d_stmt = b.expr_stmt(directive);
        let use_y = b.ident("y");
        let stmt = b.expr_stmt(use_y);
        let program = b.program(vec![d_stmt, stmt]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn test_deep_expression_nesting_reports_once_and_continues() {
        let mut b = AstBuilder::new();
        let mut e = b.number(1.0);
        for _ in 0..400 {
            e = b.unary(veld_ast::UnaryOp::Minus, e);
        }
        let deep = b.expr_stmt(e);
        let x_decl = b.var_decl(veld_ast::VarKind::Let, "x", None);
        let use_x = b.ident("x");
        let after = b.expr_stmt(use_x);
        let program = b.program(vec![deep, x_decl, after]);
        let (sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1016"]);
        // Resolution resumes after the truncated subtree.
        assert!(sem.expr_decl(use_x).is_some());
    }

    #[test]
    fn test_typeof_suppresses_undeclared_warning() {
        let mut b = AstBuilder::new();
        let directive = b.string("use strict");
        let d_stmt = b.expr_stmt(directive);
        let use_y = b.ident("y");
        let probe = b.unary(veld_ast::UnaryOp::Typeof, use_y);
        let stmt = b.expr_stmt(probe);
        let program = b.program(vec![d_stmt, stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 0);
        // The reference still binds to an undeclared global.
        let d = sem.expr_decl(use_y).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::UndeclaredGlobalProperty);
    }

    #[test]
    fn test_arguments_in_arrow_binds_to_enclosing_function() {
        let mut b = AstBuilder::new();
        let use_args = b.ident("arguments");
        let ret = b.return_stmt(Some(use_args));
        let arrow_body = b.block(vec![ret]);
        let arrow = b.arrow(vec![], arrow_body);
        let arrow_stmt = b.expr_stmt(arrow);
        let func_body = b.block(vec![arrow_stmt]);
        let func = b.func_decl("f", vec![], func_body);
        let program = b.program(vec![func]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_args).unwrap();
        assert_eq!(sem.decl(d).special, Special::Arguments);
        assert_eq!(sem.decl(d).kind, DeclKind::Var);
        let owner = sem.node_function(func).unwrap();
        assert_eq!(sem.function(owner).arguments_decl, Some(d));
    }

    #[test]
    fn test_parameter_shadows_global() {
        let mut b = AstBuilder::new();
        let global = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let param = b.ident("x");
        let use_x = b.ident("x");
        let ret = b.return_stmt(Some(use_x));
        let body = b.block(vec![ret]);
        let func = b.func_decl("f", vec![param], body);
        let program = b.program(vec![global, func]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_x).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::Parameter);
        assert_eq!(sem.ident_decl(param), Some(d));
    }

    #[test]
    fn test_labeled_break_resolves_target() {
        let mut b = AstBuilder::new();
        let brk = b.break_stmt(Some("outer"));
        let inner = b.block(vec![brk]);
        let cond = b.boolean(true);
        let loop_stmt = b.while_stmt(cond, inner);
        let labeled = b.labeled("outer", loop_stmt);
        let program = b.program(vec![labeled]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        assert_eq!(sem.label_target(brk), Some(labeled));
        assert_eq!(sem.label_index(brk), sem.label_index(labeled));
    }

    #[test]
    fn test_continue_to_non_loop_label_is_error() {
        let mut b = AstBuilder::new();
        let cont = b.continue_stmt(Some("l"));
        let cond = b.boolean(true);
        let body = b.block(vec![cont]);
        let loop_stmt = b.while_stmt(cond, body);
        let inner = b.block(vec![loop_stmt]);
        let labeled = b.labeled("l", inner);
        let program = b.program(vec![labeled]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1006"]);
    }

    #[test]
    fn test_break_outside_loop_is_error() {
        let mut b = AstBuilder::new();
        let brk = b.break_stmt(None);
        let program = b.program(vec![brk]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1007"]);
    }

    #[test]
    fn test_return_at_top_level_is_error() {
        let mut b = AstBuilder::new();
        let ret = b.return_stmt(None);
        let program = b.program(vec![ret]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1010"]);
    }

    #[test]
    fn test_sloppy_block_function_promoted() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let func = b.func_decl("f", vec![], body);
        let block = b.block(vec![func]);
        let use_f = b.ident("f");
        let stmt = b.expr_stmt(use_f);
        let program = b.program(vec![block, stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        // The reference after the block sees the promoted function-scope
        // declaration.
        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_f).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::GlobalProperty);
    }

    #[test]
    fn test_sibling_block_let_does_not_demote_function() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let func = b.func_decl("g", vec![], body);
        let first = b.block(vec![func]);
        let let_g = b.var_decl(veld_ast::VarKind::Let, "g", None);
        let second = b.block(vec![let_g]);
        let use_g = b.ident("g");
        let stmt = b.expr_stmt(use_g);
        let program = b.program(vec![first, second, stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        // `let g` in a sibling block is off the function's scope chain and
        // must not block promotion.
        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_g).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::GlobalProperty);
    }

    #[test]
    fn test_strict_block_function_stays_scoped() {
        let mut b = AstBuilder::new();
        let directive = b.string("use strict");
        let d_stmt = b.expr_stmt(directive);
        let body = b.block(vec![]);
        let func = b.func_decl("f", vec![], body);
        let block = b.block(vec![func]);
        let use_f = b.ident("f");
        let stmt = b.expr_stmt(use_f);
        let program = b.program(vec![d_stmt, block, stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        // Outside the block, `f` is unresolved and falls back to an
        // undeclared global. A warning is reported in strict mode.
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
        let d = sem.expr_decl(use_f).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::UndeclaredGlobalProperty);
    }

    #[test]
    fn test_strict_eval_declaration_is_error() {
        let mut b = AstBuilder::new();
        let directive = b.string("use strict");
        let d_stmt = b.expr_stmt(directive);
        let decl = b.var_decl(veld_ast::VarKind::Let, "eval", None);
        let program = b.program(vec![d_stmt, decl]);
        let (_sem, sink, _ast) = resolve(b, program);

        assert_eq!(error_codes(sink), vec!["E1003"]);
    }

    #[test]
    fn test_direct_eval_makes_names_unresolvable() {
        let mut b = AstBuilder::new();
        let eval_callee = b.ident("eval");
        let code = b.string("x");
        let eval_call = b.call(eval_callee, vec![code]);
        let eval_stmt = b.expr_stmt(eval_call);
        let use_x = b.ident("x");
        let ret = b.return_stmt(Some(use_x));
        let body = b.block(vec![eval_stmt, ret]);
        let func = b.func_decl("f", vec![], body);
        let program = b.program(vec![func]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        assert!(sem.is_unresolvable(use_x));
        let f = sem.node_function(func).unwrap();
        assert!(sem.function(f).contains_direct_eval);
    }

    #[test]
    fn test_ambient_globals_resolve() {
        let mut b = AstBuilder::new();
        let use_undef = b.ident("undefined");
        let stmt = b.expr_stmt(use_undef);
        let program = b.program(vec![stmt]);
        let (sem, sink, _ast) = resolve(b, program);

        assert!(!sink.has_errors());
        let d = sem.expr_decl(use_undef).unwrap();
        assert_eq!(sem.decl(d).kind, DeclKind::GlobalProperty);
    }
}
