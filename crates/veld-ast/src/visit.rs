//! Generic preorder traversal.
//!
//! Passes that only care about a handful of node kinds implement [`Visitor`]
//! and override `visit_node`, delegating to [`walk`] to descend. Passes with
//! heavy per-node dispatch (the resolver, the checker) match on
//! `ast.kind(id)` directly instead.

use crate::node::{Ast, NodeId};

/// A preorder AST visitor. The default implementation visits every node and
/// does nothing.
pub trait Visitor {
    fn visit_node(&mut self, ast: &Ast, id: NodeId) {
        walk(self, ast, id);
    }
}

/// Visit every direct child of `id` with `v`.
pub fn walk<V: Visitor + ?Sized>(v: &mut V, ast: &Ast, id: NodeId) {
    for child in ast.children(id) {
        v.visit_node(ast, child);
    }
}

/// Call `f` on `root` and every node beneath it, preorder.
pub fn preorder(ast: &Ast, root: NodeId, f: &mut impl FnMut(NodeId)) {
    f(root);
    for child in ast.children(root) {
        preorder(ast, child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::span::Span;

    struct IdentCounter {
        count: usize,
    }

    impl Visitor for IdentCounter {
        fn visit_node(&mut self, ast: &Ast, id: NodeId) {
            if matches!(ast.kind(id), NodeKind::Identifier { .. }) {
                self.count += 1;
            }
            walk(self, ast, id);
        }
    }

    #[test]
    fn test_visitor_reaches_all_nodes() {
        let mut ast = Ast::new();
        let a = ast.names.intern("a");
        let b = ast.names.intern("b");
        let left = ast.alloc(NodeKind::Identifier { name: a, annotation: None }, Span::dummy());
        let right = ast.alloc(NodeKind::Identifier { name: b, annotation: None }, Span::dummy());
        let add = ast.alloc(
            NodeKind::BinaryExpression { op: crate::node::BinaryOp::Add, left, right },
            Span::dummy(),
        );
        let stmt = ast.alloc(NodeKind::ExpressionStatement { expression: add }, Span::dummy());
        let program = ast.alloc(NodeKind::Program { body: vec![stmt] }, Span::dummy());

        let mut counter = IdentCounter { count: 0 };
        counter.visit_node(&ast, program);
        assert_eq!(counter.count, 2);

        let mut total = 0;
        preorder(&ast, program, &mut |_| total += 1);
        assert_eq!(total, 5);
    }
}
