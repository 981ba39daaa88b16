//! # veld-ast
//!
//! Arena-backed syntax tree for the Veld language, a statically-typed
//! JavaScript dialect. The tree is produced by the parser and consumed by
//! the semantic resolver and the type checker; node identities are stable
//! `u32` ids so later passes can attach side tables without touching the
//! tree itself.

pub mod build;
pub mod clone;
pub mod interner;
pub mod node;
pub mod span;
pub mod visit;

pub use build::AstBuilder;
pub use clone::clone_subtree;
pub use interner::{Atom, NameInterner};
pub use node::{
    AssignOp, Ast, BinaryOp, LogicalOp, MethodKind, Node, NodeId, NodeKind, PrimitiveKeyword,
    UnaryOp, UpdateOp, VarKind,
};
pub use span::Span;
pub use visit::{preorder, walk, Visitor};
