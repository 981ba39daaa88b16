//! Statement-level type checking
//!
//! The checker runs after the resolver. Per scope it first resolves type
//! declarations (classes, aliases, generics), then assigns declared types
//! to the scope's value declarations, then checks statements in order.
//! Expression checking lives in `expr`, annotation resolution in `annot`,
//! and generic specialization in `generics`; all of them are methods on
//! [`FlowChecker`].

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use veld_ast::{Ast, NodeId, NodeKind, Span};
use veld_diag::{Diagnostic, DiagnosticSink, ErrorCode};
use veld_sema::{ScopePtr, ScopedTable, SemContext};
use veld_types::{can_a_flow_into_b, ClassId, TypeId, TypeKind, TypeTable};

use crate::generics::{GenericId, GenericRegistry};
use crate::info::FlowInfo;

pub(crate) const ERR_CANNOT_FLOW: ErrorCode = ErrorCode("E2001");
pub(crate) const ERR_UNDEFINED_TYPE: ErrorCode = ErrorCode("E2002");
pub(crate) const ERR_CIRCULAR_ALIAS: ErrorCode = ErrorCode("E2004");
pub(crate) const ERR_TYPE_ARG_COUNT: ErrorCode = ErrorCode("E2005");
pub(crate) const ERR_MISSING_TYPE_ARGS: ErrorCode = ErrorCode("E2006");
pub(crate) const ERR_NOT_GENERIC: ErrorCode = ErrorCode("E2007");
pub(crate) const ERR_NOT_CALLABLE: ErrorCode = ErrorCode("E2008");
pub(crate) const ERR_ARG_COUNT: ErrorCode = ErrorCode("E2009");
pub(crate) const ERR_UNKNOWN_MEMBER: ErrorCode = ErrorCode("E2010");
pub(crate) const ERR_BAD_OPERAND: ErrorCode = ErrorCode("E2011");
pub(crate) const ERR_CLASS_NEEDS_NEW: ErrorCode = ErrorCode("E2012");
pub(crate) const ERR_TOO_DEEP: ErrorCode = ErrorCode("E2013");
pub(crate) const ERR_DUP_TYPE_NAME: ErrorCode = ErrorCode("E2014");
pub(crate) const ERR_BAD_SUPERCLASS: ErrorCode = ErrorCode("E2015");

/// Nesting budget shared by expression checking and annotation resolution.
pub(crate) const MAX_CHECK_DEPTH: u32 = 256;

/// What a type name resolves to in the type binding table.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TypeBinding {
    Ty(TypeId),
    Generic(GenericId),
}

/// Per-function checking state.
pub(crate) struct FuncCtx {
    pub(crate) return_type: TypeId,
    /// Instance type of `this` inside class methods.
    pub(crate) this_ty: Option<TypeId>,
}

/// Work deferred until the current scope tree finishes: bodies of generic
/// specializations, which may trigger further specializations.
pub(crate) enum DeferredCheck {
    FunctionBody {
        node: NodeId,
        fn_ty: TypeId,
        type_scope: Option<ScopePtr>,
    },
    ClassBody {
        node: NodeId,
        class_id: ClassId,
        instance: TypeId,
        type_scope: Option<ScopePtr>,
    },
}

pub struct FlowChecker<'a> {
    pub(crate) ast: &'a mut Ast,
    pub(crate) sem: &'a mut SemContext,
    pub(crate) types: &'a mut TypeTable,
    pub(crate) flow: &'a mut FlowInfo,
    pub(crate) sink: &'a mut DiagnosticSink,
    pub(crate) file_id: usize,

    /// Scoped table of type names; scopes persist for generic recall.
    pub(crate) type_scope: ScopedTable<TypeBinding>,
    pub(crate) generics: GenericRegistry,
    pub(crate) deferred: VecDeque<DeferredCheck>,
    pub(crate) func_stack: Vec<FuncCtx>,
    /// Class declaration node -> its class id and instance type.
    pub(crate) class_nodes: FxHashMap<NodeId, (ClassId, TypeId)>,
    pub(crate) depth: u32,
}

impl<'a> FlowChecker<'a> {
    pub fn new(
        ast: &'a mut Ast,
        sem: &'a mut SemContext,
        types: &'a mut TypeTable,
        flow: &'a mut FlowInfo,
        sink: &'a mut DiagnosticSink,
        file_id: usize,
    ) -> Self {
        FlowChecker {
            ast,
            sem,
            types,
            flow,
            sink,
            file_id,
            type_scope: ScopedTable::new(),
            generics: GenericRegistry::new(),
            deferred: VecDeque::new(),
            func_stack: Vec::new(),
            class_nodes: FxHashMap::default(),
            depth: 0,
        }
    }

    /// Check the whole program, draining deferred generic work at the end.
    pub fn run(&mut self, program: NodeId) {
        let body = match self.ast.kind(program) {
            NodeKind::Program { body } => body.clone(),
            _ => return,
        };
        self.type_scope.push_scope();
        self.check_scope_stmts(program, &body);
        self.drain_deferred();
        self.type_scope.pop_scope();
    }

    // ==== Helpers ====

    pub(crate) fn span(&self, node: NodeId) -> Span {
        self.ast.span(node)
    }

    pub(crate) fn error(&mut self, code: ErrorCode, span: Span, message: String, label: &str) {
        self.sink.report(
            Diagnostic::error(message)
                .with_code(code)
                .with_primary_label(self.file_id, span, label),
        );
    }

    pub(crate) fn display_ty(&self, ty: TypeId) -> String {
        self.types.display(ty, &self.ast.names)
    }

    /// Check that `from` flows into `to` at `child`, reporting a flow error
    /// or splicing a runtime-checked cast in place when required.
    pub(crate) fn coerce(&mut self, parent: NodeId, child: NodeId, from: TypeId, to: TypeId) {
        let result = can_a_flow_into_b(self.types, from, to);
        if !result.can_flow {
            let from_text = self.display_ty(from);
            let to_text = self.display_ty(to);
            self.error(
                ERR_CANNOT_FLOW,
                self.span(child),
                format!("Type '{from_text}' is not compatible with type '{to_text}'"),
                "incompatible type",
            );
        } else if result.need_checked_cast {
            let span = self.span(child);
            let cast = self.ast.alloc(NodeKind::ImplicitCheckedCast { argument: child }, span);
            self.ast.replace_child(parent, child, cast);
            self.flow.set_node_type(cast, to);
        }
    }

    /// Check that `from` flows into `to`, reporting a flow error when it
    /// cannot. Unlike [`coerce`](FlowChecker::coerce) no cast is spliced;
    /// used where there is no expression node to wrap.
    pub(crate) fn require_flow(&mut self, at: NodeId, from: TypeId, to: TypeId) {
        if !can_a_flow_into_b(self.types, from, to).can_flow {
            let from_text = self.display_ty(from);
            let to_text = self.display_ty(to);
            self.error(
                ERR_CANNOT_FLOW,
                self.span(at),
                format!("Type '{from_text}' is not compatible with type '{to_text}'"),
                "incompatible type",
            );
        }
    }

    /// Bump the recursion budget; on exhaustion report once and signal the
    /// caller to truncate.
    pub(crate) fn enter(&mut self, span: Span) -> bool {
        self.depth += 1;
        if self.depth > MAX_CHECK_DEPTH {
            if self.depth == MAX_CHECK_DEPTH + 1 {
                self.error(
                    ERR_TOO_DEEP,
                    span,
                    "Nesting too deep to check".to_string(),
                    "too deeply nested",
                );
            }
            return false;
        }
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }

    // ==== Scope and statement checking ====

    /// Process one scope: declare its types, annotate its value
    /// declarations, then check its statements in order.
    pub(crate) fn check_scope_stmts(&mut self, scope_node: NodeId, stmts: &[NodeId]) {
        self.declare_scope_types(scope_node, stmts);
        self.annotate_scope_decls(scope_node, stmts);
        for &stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_block(&mut self, block: NodeId) {
        let body = match self.ast.kind(block) {
            NodeKind::Block { body } => body.clone(),
            _ => {
                self.check_stmt(block);
                return;
            }
        };
        self.type_scope.push_scope();
        self.check_scope_stmts(block, &body);
        self.type_scope.pop_scope();
    }

    pub(crate) fn check_stmt(&mut self, stmt: NodeId) {
        let span = self.span(stmt);
        if !self.enter(span) {
            self.leave();
            return;
        }
        self.check_stmt_inner(stmt);
        self.leave();
    }

    fn check_stmt_inner(&mut self, stmt: NodeId) {
        let kind = self.ast.kind(stmt).clone();
        match kind {
            NodeKind::VariableDeclaration { declarators, .. } => {
                for d in declarators {
                    self.check_declarator(d);
                }
            }
            NodeKind::FunctionDeclaration { id, .. } => {
                if self.is_generic_decl(id) {
                    return;
                }
                let fn_ty = self
                    .flow
                    .node_type(stmt)
                    .unwrap_or_else(|| self.types.any());
                self.check_function_body(stmt, fn_ty, None);
            }
            NodeKind::ClassDeclaration { id, .. } => {
                if self.is_generic_decl(id) {
                    return;
                }
                if let Some(&(class_id, instance)) = self.class_nodes.get(&stmt) {
                    self.check_class_members(stmt, class_id, instance);
                }
            }
            NodeKind::TypeAliasDeclaration { .. }
            | NodeKind::ImportDeclaration { .. }
            | NodeKind::EmptyStatement => {}
            NodeKind::Block { .. } => self.check_block(stmt),
            NodeKind::ExpressionStatement { expression } => {
                self.check_expr(stmt, expression, None);
            }
            NodeKind::IfStatement { test, consequent, alternate } => {
                self.check_expr(stmt, test, None);
                self.check_stmt(consequent);
                if let Some(alt) = alternate {
                    self.check_stmt(alt);
                }
            }
            NodeKind::WhileStatement { test, body } => {
                self.check_expr(stmt, test, None);
                self.check_stmt(body);
            }
            NodeKind::DoWhileStatement { body, test } => {
                self.check_stmt(body);
                self.check_expr(stmt, test, None);
            }
            NodeKind::ForStatement { init, test, update, body } => {
                self.type_scope.push_scope();
                if let Some(init) = init {
                    match self.ast.kind(init) {
                        NodeKind::VariableDeclaration { .. } => self.check_stmt(init),
                        _ => {
                            self.check_expr(stmt, init, None);
                        }
                    }
                }
                if let Some(test) = test {
                    self.check_expr(stmt, test, None);
                }
                if let Some(update) = update {
                    self.check_expr(stmt, update, None);
                }
                self.check_stmt(body);
                self.type_scope.pop_scope();
            }
            NodeKind::ForInStatement { left, right, body } => {
                self.type_scope.push_scope();
                self.check_expr(stmt, right, None);
                // Enumerated keys are always strings.
                let key_ty = self.types.string();
                self.check_for_target(stmt, left, key_ty);
                self.check_stmt(body);
                self.type_scope.pop_scope();
            }
            NodeKind::ForOfStatement { left, right, body } => {
                self.type_scope.push_scope();
                let iter_ty = self.check_expr(stmt, right, None);
                let element_ty = self.iterated_element_type(iter_ty);
                self.check_for_target(stmt, left, element_ty);
                self.check_stmt(body);
                self.type_scope.pop_scope();
            }
            NodeKind::SwitchStatement { discriminant, cases } => {
                self.check_expr(stmt, discriminant, None);
                self.type_scope.push_scope();
                for case in cases {
                    let case_kind = self.ast.kind(case).clone();
                    if let NodeKind::SwitchCase { test, consequent } = case_kind {
                        if let Some(test) = test {
                            // Case comparison is loose equality; any type is
                            // admissible.
                            self.check_expr(case, test, None);
                        }
                        for s in consequent {
                            self.check_stmt(s);
                        }
                    }
                }
                self.type_scope.pop_scope();
            }
            NodeKind::ReturnStatement { argument } => self.check_return(stmt, argument),
            NodeKind::BreakStatement { .. } | NodeKind::ContinueStatement { .. } => {}
            NodeKind::LabeledStatement { body, .. } => self.check_stmt(body),
            NodeKind::ThrowStatement { argument } => {
                self.check_expr(stmt, argument, None);
            }
            NodeKind::TryStatement { block, handler, finalizer } => {
                self.check_stmt(block);
                if let Some(handler) = handler {
                    let handler_kind = self.ast.kind(handler).clone();
                    if let NodeKind::CatchClause { param, body } = handler_kind {
                        if let Some(param) = param {
                            // The thrown value is untyped.
                            let any = self.types.any();
                            self.bind_pattern_type(param, any);
                        }
                        self.check_stmt(body);
                    }
                }
                if let Some(finalizer) = finalizer {
                    self.check_stmt(finalizer);
                }
            }
            _ => {
                // Expression in statement position.
                self.check_expr(stmt, stmt, None);
            }
        }
    }

    fn check_declarator(&mut self, declarator: NodeId) {
        let (id, init) = match self.ast.kind(declarator) {
            NodeKind::VariableDeclarator { id, init } => (*id, *init),
            _ => return,
        };
        match self.ast.kind(id) {
            NodeKind::Identifier { .. } => {}
            _ => {
                // Destructuring declarations bind everything as `any`.
                let any = self.types.any();
                self.bind_pattern_type(id, any);
                if let Some(init) = init {
                    self.check_expr(declarator, init, None);
                }
                return;
            }
        }
        let Some(decl) = self.sem.ident_decl(id) else { return };

        let mut declared = self.flow.decl_type(decl);
        if declared.is_none() {
            if let Some(ann) = self.ast.ident_annotation(id) {
                let ty = self.resolve_annotation(ann);
                self.flow.set_decl_type(decl, ty);
                declared = Some(ty);
            }
        }

        match (declared, init) {
            (Some(ty), Some(init)) => {
                let init_ty = self.check_expr(declarator, init, Some(ty));
                self.coerce(declarator, init, init_ty, ty);
                self.flow.set_node_type(id, ty);
            }
            (Some(ty), None) => {
                self.flow.set_node_type(id, ty);
            }
            (None, Some(init)) => {
                // No annotation: the declaration takes the initializer's
                // type.
                let init_ty = self.check_expr(declarator, init, None);
                self.flow.set_decl_type(decl, init_ty);
                self.flow.set_node_type(id, init_ty);
            }
            (None, None) => {
                let any = self.types.any();
                self.flow.set_decl_type(decl, any);
                self.flow.set_node_type(id, any);
            }
        }
    }

    /// The loop variable (or assignment target) of a for-in/for-of.
    fn check_for_target(&mut self, stmt: NodeId, left: NodeId, element_ty: TypeId) {
        match self.ast.kind(left) {
            NodeKind::VariableDeclaration { declarators, .. } => {
                let declarators = declarators.clone();
                for d in declarators {
                    if let NodeKind::VariableDeclarator { id, .. } = self.ast.kind(d) {
                        let id = *id;
                        self.bind_pattern_type(id, element_ty);
                    }
                }
            }
            _ => {
                let target_ty = self.check_expr(stmt, left, None);
                self.require_flow(left, element_ty, target_ty);
            }
        }
    }

    /// Element type produced by iterating a value with for-of.
    fn iterated_element_type(&mut self, iter_ty: TypeId) -> TypeId {
        match self.types.kind(iter_ty) {
            TypeKind::Array(element) => *element,
            TypeKind::String => self.types.string(),
            TypeKind::Tuple(t) => {
                let arms = t.elements.clone();
                veld_types::make_union(self.types, arms)
            }
            TypeKind::Any => self.types.any(),
            _ => self.types.any(),
        }
    }

    fn check_return(&mut self, stmt: NodeId, argument: Option<NodeId>) {
        let Some(ctx) = self.func_stack.last() else {
            // Top-level return was already reported by the resolver.
            if let Some(arg) = argument {
                self.check_expr(stmt, arg, None);
            }
            return;
        };
        let expected = ctx.return_type;
        match argument {
            Some(arg) => {
                let arg_ty = self.check_expr(stmt, arg, Some(expected));
                self.coerce(stmt, arg, arg_ty, expected);
            }
            None => {
                let void = self.types.void();
                let result = can_a_flow_into_b(self.types, void, expected);
                if !result.can_flow {
                    let expected_text = self.display_ty(expected);
                    self.error(
                        ERR_CANNOT_FLOW,
                        self.span(stmt),
                        format!("Return without a value in a function returning '{expected_text}'"),
                        "missing return value",
                    );
                }
            }
        }
    }

    /// Assign `ty` to every identifier bound by `pattern`; defaults are
    /// checked against it.
    pub(crate) fn bind_pattern_type(&mut self, pattern: NodeId, ty: TypeId) {
        let kind = self.ast.kind(pattern).clone();
        match kind {
            NodeKind::Identifier { .. } => {
                if let Some(decl) = self.sem.ident_decl(pattern) {
                    self.flow.set_decl_type(decl, ty);
                }
                self.flow.set_node_type(pattern, ty);
            }
            NodeKind::AssignmentPattern { left, right } => {
                self.bind_pattern_type(left, ty);
                let default_ty = self.check_expr(pattern, right, Some(ty));
                self.coerce(pattern, right, default_ty, ty);
            }
            NodeKind::ArrayPattern { elements } => {
                let any = self.types.any();
                for e in elements {
                    self.bind_pattern_type(e, any);
                }
            }
            NodeKind::ObjectPattern { properties } => {
                let any = self.types.any();
                for p in properties {
                    if let NodeKind::Property { value, .. } = self.ast.kind(p) {
                        let value = *value;
                        self.bind_pattern_type(value, any);
                    }
                }
            }
            NodeKind::RestElement { argument } => {
                let any = self.types.any();
                self.bind_pattern_type(argument, any);
            }
            _ => {}
        }
    }

    /// Check a function body against its signature type.
    pub(crate) fn check_function_body(
        &mut self,
        node: NodeId,
        fn_ty: TypeId,
        this_ty: Option<TypeId>,
    ) {
        let sig = match self.types.kind(fn_ty) {
            TypeKind::Function(f) => f.clone(),
            _ => {
                // Untyped function: everything is `any`.
                let any = self.types.any();
                veld_types::FunctionType {
                    this_ty: None,
                    params: Vec::new(),
                    return_type: any,
                    is_async: false,
                    is_generator: false,
                }
            }
        };
        self.flow.set_node_type(node, fn_ty);

        let params: Vec<NodeId> = self
            .ast
            .function_params(node)
            .map(|p| p.to_vec())
            .unwrap_or_default();
        let any = self.types.any();
        for (i, &param) in params.iter().enumerate() {
            let ty = sig.params.get(i).map(|p| p.ty).unwrap_or(any);
            self.bind_pattern_type(param, ty);
        }

        self.func_stack.push(FuncCtx {
            return_type: sig.return_type,
            this_ty: this_ty.or(sig.this_ty),
        });

        let body = self.ast.function_body(node);
        if let Some(body) = body {
            let stmts = match self.ast.kind(body) {
                NodeKind::Block { body } => body.clone(),
                _ => Vec::new(),
            };
            self.type_scope.push_scope();
            self.check_scope_stmts(body, &stmts);
            self.type_scope.pop_scope();

            self.check_implicit_return(node, body, sig.return_type);
        }

        self.func_stack.pop();
    }

    /// Falling off the end of a function returns `void`; the declared
    /// return type must accept that unless every path returns explicitly.
    fn check_implicit_return(&mut self, node: NodeId, body: NodeId, return_type: TypeId) {
        let void = self.types.void();
        if can_a_flow_into_b(self.types, void, return_type).can_flow {
            return;
        }
        if !body_has_return(self.ast, body) {
            let text = self.display_ty(return_type);
            self.error(
                ERR_CANNOT_FLOW,
                self.span(node),
                format!("Function with return type '{text}' must return a value"),
                "missing return",
            );
        }
    }

    /// Check the bodies of a completed class's members.
    pub(crate) fn check_class_members(
        &mut self,
        class_node: NodeId,
        class_id: ClassId,
        instance: TypeId,
    ) {
        let body = match self.ast.kind(class_node) {
            NodeKind::ClassDeclaration { body, .. } | NodeKind::ClassExpression { body, .. } => {
                *body
            }
            _ => return,
        };
        let members = match self.ast.kind(body) {
            NodeKind::ClassBody { members } => members.clone(),
            _ => return,
        };
        let _ = class_id;
        for member in members {
            let member_kind = self.ast.kind(member).clone();
            match member_kind {
                NodeKind::MethodDefinition { value, is_static, .. } => {
                    let fn_ty = self
                        .flow
                        .node_type(value)
                        .unwrap_or_else(|| self.types.any());
                    let this_ty = if is_static { None } else { Some(instance) };
                    self.check_function_body(value, fn_ty, this_ty);
                }
                NodeKind::ClassProperty { key, value: Some(value), .. } => {
                    let field_ty = self
                        .flow
                        .node_type(key)
                        .unwrap_or_else(|| self.types.any());
                    let value_ty = self.check_expr(member, value, Some(field_ty));
                    self.coerce(member, value, value_ty, field_ty);
                }
                _ => {}
            }
        }
    }

    /// Drain the deferred generic-specialization queue breadth-first.
    /// Checking one item may enqueue more.
    pub(crate) fn drain_deferred(&mut self) {
        while let Some(item) = self.deferred.pop_front() {
            match item {
                DeferredCheck::FunctionBody { node, fn_ty, type_scope } => {
                    let prev = self.type_scope.activate(type_scope);
                    self.check_function_body(node, fn_ty, None);
                    self.type_scope.activate(prev);
                }
                DeferredCheck::ClassBody { node, class_id, instance, type_scope } => {
                    let prev = self.type_scope.activate(type_scope);
                    self.check_class_members(node, class_id, instance);
                    self.type_scope.activate(prev);
                }
            }
        }
    }

    pub(crate) fn is_generic_decl(&self, ident: NodeId) -> bool {
        self.sem
            .ident_decl(ident)
            .map(|d| self.sem.decl(d).generic)
            .unwrap_or(false)
    }
}

/// True if any statement in the body (not nested functions) is a return.
fn body_has_return(ast: &Ast, node: NodeId) -> bool {
    if matches!(ast.kind(node), NodeKind::ReturnStatement { .. }) {
        return true;
    }
    if ast.is_function_like(node) {
        return false;
    }
    let mut found = false;
    ast.for_each_child(node, &mut |child| {
        if !found && body_has_return(ast, child) {
            found = true;
        }
    });
    found
}
