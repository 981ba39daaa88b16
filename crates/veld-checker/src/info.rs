//! Type assignments produced by the checker.
//!
//! Like the resolver, the checker never annotates the AST; types are kept
//! in side tables keyed by declaration and node ids. A missing entry means
//! the implicit `any`.

use rustc_hash::FxHashMap;
use veld_ast::NodeId;
use veld_sema::DeclId;
use veld_types::TypeId;

#[derive(Debug, Default)]
pub struct FlowInfo {
    decl_types: FxHashMap<DeclId, TypeId>,
    node_types: FxHashMap<NodeId, TypeId>,
}

impl FlowInfo {
    pub fn new() -> Self {
        FlowInfo::default()
    }

    pub fn set_decl_type(&mut self, decl: DeclId, ty: TypeId) {
        self.decl_types.insert(decl, ty);
    }

    pub fn decl_type(&self, decl: DeclId) -> Option<TypeId> {
        self.decl_types.get(&decl).copied()
    }

    pub fn set_node_type(&mut self, node: NodeId, ty: TypeId) {
        self.node_types.insert(node, ty);
    }

    pub fn node_type(&self, node: NodeId) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }
}
