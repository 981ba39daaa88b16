//! Static type checking for the Veld front end
//!
//! Runs over a resolved program and produces a [`FlowInfo`] side table
//! mapping declarations and expression nodes to types, reporting flow
//! errors along the way. Where a value of type `any` meets a typed
//! context the checker splices an [`ImplicitCheckedCast`] node so later
//! stages can emit the runtime check.
//!
//! [`ImplicitCheckedCast`]: veld_ast::NodeKind::ImplicitCheckedCast

mod annot;
mod check;
mod expr;
mod generics;
mod info;
mod scope_types;

pub use check::FlowChecker;
pub use info::FlowInfo;

use veld_ast::{Ast, NodeId};
use veld_diag::DiagnosticSink;
use veld_sema::{resolve_program, SemContext};
use veld_types::TypeTable;

/// Everything the front end knows about a program after checking.
pub struct CheckResult {
    pub sem: SemContext,
    pub types: TypeTable,
    pub flow: FlowInfo,
}

/// Resolve and type check a program. Diagnostics accumulate in `sink`;
/// the result is usable even when errors were reported.
pub fn check_program(
    ast: &mut Ast,
    program: NodeId,
    sink: &mut DiagnosticSink,
    file_id: usize,
) -> CheckResult {
    let mut sem = resolve_program(ast, program, sink, file_id);
    let mut types = TypeTable::new();
    let mut flow = FlowInfo::new();
    FlowChecker::new(ast, &mut sem, &mut types, &mut flow, sink, file_id).run(program);
    CheckResult { sem, types, flow }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veld_ast::{AstBuilder, VarKind};

    fn check(mut builder: AstBuilder, program: NodeId) -> (CheckResult, DiagnosticSink) {
        let mut sink = DiagnosticSink::new();
        let mut ast = builder.finish();
        let result = check_program(&mut ast, program, &mut sink, 0);
        (result, sink)
    }

    fn error_codes(mut sink: DiagnosticSink) -> Vec<String> {
        sink.take_sorted()
            .iter()
            .filter_map(|d| d.code())
            .map(|c| c.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_number_initializer_checks_against_annotation() {
        let mut b = AstBuilder::new();
        let number_ann = b.number_annot();
        let init = b.number(1.0);
        let decl = b.var_decl_typed(VarKind::Let, "n", number_ann, Some(init));
        let program = b.program(vec![decl]);
        let (_, sink) = check(b, program);
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_string_into_number_is_flow_error() {
        let mut b = AstBuilder::new();
        let number_ann = b.number_annot();
        let init = b.string("no");
        let decl = b.var_decl_typed(VarKind::Let, "n", number_ann, Some(init));
        let program = b.program(vec![decl]);
        let (_, sink) = check(b, program);
        assert_eq!(error_codes(sink), vec!["E2001"]);
    }
}
