//! Semantic resolution for Veld programs.
//!
//! The entry point is [`resolve_program`]: it walks a parsed program,
//! builds the scope and declaration structure in a [`SemContext`], links
//! every identifier to its declaration, resolves labels, and reports
//! resolution errors. The type checker consumes the populated context.

pub mod binding_table;
pub mod collector;
pub mod keywords;
pub mod promoter;
pub mod resolver;
pub mod sem;

pub use binding_table::{ScopePtr, ScopedTable};
pub use collector::DeclCollector;
pub use keywords::Keywords;
pub use promoter::find_promotable;
pub use resolver::{resolve_program, Binding};
pub use sem::{
    Decl, DeclId, DeclKind, FunctionId, FunctionInfo, LexicalScope, ScopeId, SemContext, Special,
};
