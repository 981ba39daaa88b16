//! Per-function declaration collection
//!
//! Before the resolver walks a function it needs to know, for every scope in
//! that function, which declarations the scope hoists: `var` declarations
//! surface at the function scope, lexical declarations stay in their block,
//! and function declarations inside blocks are recorded separately so the
//! sloppy-mode promotion rule can consider them. The collector walks one
//! function only; nested functions get their own collector when the
//! resolver reaches them.

use rustc_hash::FxHashMap;
use veld_ast::{Ast, NodeId, NodeKind, VarKind};

/// Declarations of one function, grouped by the scope-creating node that
/// owns them.
#[derive(Debug)]
pub struct DeclCollector {
    /// The function-like node (or `Program`) the collector ran on. Also the
    /// key of the function scope's declaration list.
    root: NodeId,
    scopes: FxHashMap<NodeId, Vec<NodeId>>,
    /// Function declarations found inside blocks, in source order.
    pub scoped_func_decls: Vec<NodeId>,
}

impl DeclCollector {
    /// Collect the declarations of the function rooted at `root` (a
    /// function-like node or the `Program`).
    pub fn run(ast: &Ast, root: NodeId) -> Self {
        let mut collector = DeclCollector {
            root,
            scopes: FxHashMap::default(),
            scoped_func_decls: Vec::new(),
        };
        collector.scopes.insert(root, Vec::new());
        let mut stack = vec![root];

        // The body block of a function does not open a scope of its own;
        // the function scope covers it.
        let body_stmts: Vec<NodeId> = match ast.kind(root) {
            NodeKind::Program { body } => body.clone(),
            _ if ast.is_function_like(root) => match ast.function_body(root) {
                Some(body) => ast.children(body),
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        for stmt in body_stmts {
            collector.visit(ast, stmt, &mut stack);
        }
        collector
    }

    /// The node the collector ran on.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Declarations hoisted into the scope created by `scope_node`.
    pub fn scope_decls(&self, scope_node: NodeId) -> Option<&[NodeId]> {
        self.scopes.get(&scope_node).map(|v| v.as_slice())
    }

    /// Declarations hoisted into the function scope.
    pub fn root_decls(&self) -> &[NodeId] {
        self.scopes[&self.root].as_slice()
    }

    /// True if `scope_node` opens a scope in this function.
    pub fn has_scope(&self, scope_node: NodeId) -> bool {
        self.scopes.contains_key(&scope_node)
    }

    fn add(&mut self, scope_node: NodeId, decl: NodeId) {
        self.scopes.entry(scope_node).or_default().push(decl);
    }

    fn visit(&mut self, ast: &Ast, id: NodeId, stack: &mut Vec<NodeId>) {
        match ast.kind(id) {
            NodeKind::VariableDeclaration { kind, .. } => {
                let target = if *kind == VarKind::Var { self.root } else { *stack.last().unwrap() };
                self.add(target, id);
                // Initializers can contain further statements only inside
                // nested functions, which are skipped below.
                for child in ast.children(id) {
                    self.visit(ast, child, stack);
                }
            }
            NodeKind::FunctionDeclaration { .. } => {
                let current = *stack.last().unwrap();
                self.add(current, id);
                if current != self.root {
                    self.scoped_func_decls.push(id);
                }
                // Nested function; its own collector will handle the body.
            }
            NodeKind::ClassDeclaration { .. } => {
                self.add(*stack.last().unwrap(), id);
                // Class bodies hold no hoistable declarations.
            }
            NodeKind::ImportDeclaration { .. } => {
                self.add(self.root, id);
            }
            NodeKind::FunctionExpression { .. }
            | NodeKind::ArrowFunction { .. }
            | NodeKind::ClassExpression { .. } => {}
            NodeKind::Block { .. }
            | NodeKind::ForStatement { .. }
            | NodeKind::ForInStatement { .. }
            | NodeKind::ForOfStatement { .. }
            | NodeKind::SwitchStatement { .. } => {
                stack.push(id);
                self.scopes.entry(id).or_default();
                for child in ast.children(id) {
                    self.visit(ast, child, stack);
                }
                stack.pop();
            }
            NodeKind::CatchClause { param, body } => {
                stack.push(id);
                self.scopes.entry(id).or_default();
                if param.is_some() {
                    self.add(id, id);
                }
                let body = *body;
                self.visit(ast, body, stack);
                stack.pop();
            }
            _ => {
                for child in ast.children(id) {
                    self.visit(ast, child, stack);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ast::AstBuilder;

    #[test]
    fn test_var_hoists_to_root_let_stays_in_block() {
        let mut b = AstBuilder::new();
        let var_init = b.number(1.0);
        let var_decl = b.var_decl(veld_ast::VarKind::Var, "a", Some(var_init));
        let let_decl = b.var_decl(veld_ast::VarKind::Let, "b", None);
        let block = b.block(vec![var_decl, let_decl]);
        let program = b.program(vec![block]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        assert_eq!(collector.root_decls(), &[var_decl]);
        assert_eq!(collector.scope_decls(block), Some(&[let_decl][..]));
    }

    #[test]
    fn test_scoped_function_recorded() {
        let mut b = AstBuilder::new();
        let inner_body = b.block(vec![]);
        let inner = b.func_decl("f", vec![], inner_body);
        let block = b.block(vec![inner]);
        let outer_body = b.block(vec![]);
        let top = b.func_decl("g", vec![], outer_body);
        let program = b.program(vec![block, top]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        // `g` is at the top level, `f` is block scoped.
        assert_eq!(collector.root_decls(), &[top]);
        assert_eq!(collector.scope_decls(block), Some(&[inner][..]));
        assert_eq!(collector.scoped_func_decls, vec![inner]);
    }

    #[test]
    fn test_does_not_enter_nested_functions() {
        let mut b = AstBuilder::new();
        let nested_var = b.var_decl(veld_ast::VarKind::Var, "x", None);
        let body = b.block(vec![nested_var]);
        let func = b.func_decl("f", vec![], body);
        let program = b.program(vec![func]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        assert_eq!(collector.root_decls(), &[func]);

        // The nested function's collector sees its own var.
        let inner = DeclCollector::run(&ast, func);
        assert_eq!(inner.root_decls(), &[nested_var]);
    }

    #[test]
    fn test_catch_clause_owns_its_param() {
        let mut b = AstBuilder::new();
        let try_block = b.block(vec![]);
        let param = b.ident("e");
        let catch_body = b.block(vec![]);
        let stmt = b.try_catch(try_block, Some(param), catch_body);
        let program = b.program(vec![stmt]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        // Find the catch clause node.
        let children = ast.children(stmt);
        let catch = children[1];
        assert_eq!(collector.scope_decls(catch), Some(&[catch][..]));
    }
}
