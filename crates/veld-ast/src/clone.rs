//! Subtree cloning.
//!
//! Generic specialization works by cloning the generic declaration's subtree
//! and re-checking the clone under concrete type arguments. The clone keeps
//! the original untouched and reports an old-to-new id map so semantic side
//! tables can be remapped alongside the tree.

use crate::node::{Ast, NodeId};
use rustc_hash::FxHashMap;

/// Clone the subtree rooted at `root` into fresh arena nodes.
///
/// Returns the new root and a map from every original node id in the subtree
/// to its clone. Edges inside the subtree are rewritten to the clones; the
/// clone shares no nodes with the original.
pub fn clone_subtree(ast: &mut Ast, root: NodeId) -> (NodeId, FxHashMap<NodeId, NodeId>) {
    let mut map = FxHashMap::default();
    let mut clones = Vec::new();
    // Explicit worklist; input depth is unbounded.
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let kind = ast.kind(id).clone();
        let span = ast.span(id);
        stack.extend(ast.children(id));
        let new_id = ast.alloc(kind, span);
        map.insert(id, new_id);
        clones.push(new_id);
    }
    for &new_id in &clones {
        Ast::remap_edges(ast.kind_mut(new_id), &mut |slot| *slot = map[slot]);
    }
    (map[&root], map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, VarKind};
    use crate::span::Span;

    #[test]
    fn test_clone_is_disjoint_and_mapped() {
        let mut ast = Ast::new();
        let x = ast.names.intern("x");
        let ident = ast.alloc(NodeKind::Identifier { name: x, annotation: None }, Span::dummy());
        let init = ast.alloc(NodeKind::NumberLiteral { value: 3.0 }, Span::dummy());
        let declarator = ast.alloc(
            NodeKind::VariableDeclarator { id: ident, init: Some(init) },
            Span::dummy(),
        );
        let decl = ast.alloc(
            NodeKind::VariableDeclaration { kind: VarKind::Let, declarators: vec![declarator] },
            Span::dummy(),
        );

        let before = ast.len();
        let (new_decl, map) = clone_subtree(&mut ast, decl);
        assert_eq!(ast.len(), before + 4);
        assert_eq!(map.len(), 4);
        assert_ne!(new_decl, decl);

        // Original edges are untouched.
        assert_eq!(ast.children(decl), vec![declarator]);
        // Cloned edges point at clones.
        let new_declarator = map[&declarator];
        assert_eq!(ast.children(new_decl), vec![new_declarator]);
        assert_eq!(ast.children(new_declarator), vec![map[&ident], map[&init]]);
        // Payloads survive the clone.
        assert_eq!(ast.ident_name(map[&ident]), Some(x));
    }
}
