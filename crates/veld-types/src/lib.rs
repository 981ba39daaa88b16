//! # veld-types
//!
//! The type model for the Veld type checker: an arena of types with
//! forward-declarable slots, structural comparison with cycle handling,
//! canonical unions, and the assignability ("can flow") rules.

pub mod compare;
pub mod error;
pub mod flow;
pub mod ty;
pub mod union;

pub use compare::{compare, equals, CompareState};
pub use error::TypeError;
pub use flow::{can_a_flow_into_b, CanFlowResult};
pub use ty::{
    ClassId, ClassInfo, ClassMember, FunctionParam, FunctionType, ObjectField, TupleType, TypeId,
    TypeKind, TypeTable, UnionType,
};
pub use union::{make_nullable, make_union, union_contains};
