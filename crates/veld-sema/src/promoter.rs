//! Sloppy-mode promotion of block-scoped function declarations
//!
//! In sloppy mode a function declared inside a block is also visible as a
//! `var` of the enclosing function, provided no lexical declaration of the
//! same name sits on the scope chain between the block and the function
//! root. Lexical names in sibling blocks do not interfere. Strict mode
//! keeps the declaration block scoped. The promoter only decides which
//! declarations qualify; the resolver performs the actual double-binding.

use crate::collector::DeclCollector;
use rustc_hash::FxHashSet;
use veld_ast::{Ast, Atom, NodeId, NodeKind, VarKind};

/// The block-scoped function declarations of one function that qualify for
/// promotion to function scope.
pub fn find_promotable(ast: &Ast, collector: &DeclCollector, strict: bool) -> FxHashSet<NodeId> {
    let mut promotable = FxHashSet::default();
    if strict || collector.scoped_func_decls.is_empty() {
        return promotable;
    }

    let root = collector.root();
    let mut path = vec![scope_lexical_names(ast, collector, root)];
    // The body block of a function shares the function scope, mirroring
    // the collector's walk.
    let body: Vec<NodeId> = match ast.kind(root) {
        NodeKind::Program { body } => body.clone(),
        _ if ast.is_function_like(root) => match ast.function_body(root) {
            Some(body) => ast.children(body),
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    for stmt in body {
        visit(ast, collector, stmt, &mut path, &mut promotable);
    }
    promotable
}

/// Descend the scope tree with the lexical names of every scope on the
/// current path. A block-scoped function promotes when no scope on the path
/// declares its name lexically.
fn visit(
    ast: &Ast,
    collector: &DeclCollector,
    id: NodeId,
    path: &mut Vec<FxHashSet<Atom>>,
    promotable: &mut FxHashSet<NodeId>,
) {
    match ast.kind(id) {
        NodeKind::FunctionDeclaration { .. } => {
            // Only block-scoped declarations are candidates; the body
            // belongs to the nested function.
            if path.len() > 1 {
                if let Some(name) = function_name(ast, id) {
                    if !path.iter().any(|scope| scope.contains(&name)) {
                        promotable.insert(id);
                    }
                }
            }
        }
        NodeKind::FunctionExpression { .. }
        | NodeKind::ArrowFunction { .. }
        | NodeKind::ClassExpression { .. } => {}
        NodeKind::Block { .. }
        | NodeKind::ForStatement { .. }
        | NodeKind::ForInStatement { .. }
        | NodeKind::ForOfStatement { .. }
        | NodeKind::SwitchStatement { .. }
        | NodeKind::CatchClause { .. } => {
            path.push(scope_lexical_names(ast, collector, id));
            for child in ast.children(id) {
                visit(ast, collector, child, path, promotable);
            }
            path.pop();
        }
        _ => {
            for child in ast.children(id) {
                visit(ast, collector, child, path, promotable);
            }
        }
    }
}

fn function_name(ast: &Ast, func: NodeId) -> Option<Atom> {
    match ast.kind(func) {
        NodeKind::FunctionDeclaration { id, .. } => ast.ident_name(*id),
        _ => None,
    }
}

fn scope_lexical_names(
    ast: &Ast,
    collector: &DeclCollector,
    scope_node: NodeId,
) -> FxHashSet<Atom> {
    let mut names = FxHashSet::default();
    let Some(decls) = collector.scope_decls(scope_node) else { return names };
    for &decl in decls {
        match ast.kind(decl) {
            NodeKind::VariableDeclaration { kind, declarators } if *kind != VarKind::Var => {
                for &d in declarators {
                    if let NodeKind::VariableDeclarator { id, .. } = ast.kind(d) {
                        collect_pattern_names(ast, *id, &mut names);
                    }
                }
            }
            NodeKind::ClassDeclaration { id, .. } => {
                if let Some(name) = ast.ident_name(*id) {
                    names.insert(name);
                }
            }
            NodeKind::ImportDeclaration { specifiers, .. } => {
                for &s in specifiers {
                    if let NodeKind::ImportSpecifier { local } = ast.kind(s) {
                        if let Some(name) = ast.ident_name(*local) {
                            names.insert(name);
                        }
                    }
                }
            }
            NodeKind::CatchClause { param: Some(param), .. } => {
                collect_pattern_names(ast, *param, &mut names);
            }
            _ => {}
        }
    }
    names
}

pub(crate) fn collect_pattern_names(ast: &Ast, pattern: NodeId, out: &mut FxHashSet<Atom>) {
    match ast.kind(pattern) {
        NodeKind::Identifier { name, .. } => {
            out.insert(*name);
        }
        NodeKind::ArrayPattern { elements } => {
            for &e in elements {
                collect_pattern_names(ast, e, out);
            }
        }
        NodeKind::ObjectPattern { properties } => {
            for &p in properties {
                if let NodeKind::Property { value, .. } = ast.kind(p) {
                    collect_pattern_names(ast, *value, out);
                }
            }
        }
        NodeKind::AssignmentPattern { left, .. } => collect_pattern_names(ast, *left, out),
        NodeKind::RestElement { argument } => collect_pattern_names(ast, *argument, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ast::AstBuilder;

    #[test]
    fn test_promotes_when_name_is_free() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("f", vec![], body);
        let block = b.block(vec![inner]);
        let program = b.program(vec![block]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        let promotable = find_promotable(&ast, &collector, false);
        assert!(promotable.contains(&inner));
    }

    #[test]
    fn test_lexical_declaration_blocks_promotion() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("f", vec![], body);
        let block = b.block(vec![inner]);
        let let_f = b.var_decl(veld_ast::VarKind::Let, "f", None);
        let program = b.program(vec![let_f, block]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        let promotable = find_promotable(&ast, &collector, false);
        assert!(promotable.is_empty());
    }

    #[test]
    fn test_sibling_block_lexical_does_not_block_promotion() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("g", vec![], body);
        let first = b.block(vec![inner]);
        let let_g = b.var_decl(veld_ast::VarKind::Let, "g", None);
        let second = b.block(vec![let_g]);
        let program = b.program(vec![first, second]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        let promotable = find_promotable(&ast, &collector, false);
        assert!(promotable.contains(&inner));
    }

    #[test]
    fn test_unrelated_subtree_const_does_not_block_promotion() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("g", vec![], body);
        let const_g = b.var_decl(veld_ast::VarKind::Const, "g", None);
        let outer = b.block(vec![const_g]);
        let block = b.block(vec![inner]);
        let wrapper = b.block(vec![block]);
        let program = b.program(vec![outer, wrapper]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        // `const g` sits in a sibling subtree, so the nested function is
        // still free to promote.
        let promotable = find_promotable(&ast, &collector, false);
        assert!(promotable.contains(&inner));
    }

    #[test]
    fn test_enclosing_block_lexical_blocks_promotion() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("g", vec![], body);
        let block = b.block(vec![inner]);
        let let_g = b.var_decl(veld_ast::VarKind::Let, "g", None);
        let outer = b.block(vec![let_g, block]);
        let program = b.program(vec![outer]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        assert!(find_promotable(&ast, &collector, false).is_empty());
    }

    #[test]
    fn test_strict_mode_never_promotes() {
        let mut b = AstBuilder::new();
        let body = b.block(vec![]);
        let inner = b.func_decl("f", vec![], body);
        let block = b.block(vec![inner]);
        let program = b.program(vec![block]);
        let ast = b.finish();

        let collector = DeclCollector::run(&ast, program);
        assert!(find_promotable(&ast, &collector, true).is_empty());
    }
}
