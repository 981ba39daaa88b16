//! Integration tests for type aliases, recursive types, and generic
//! specialization.

use veld_ast::{Ast, AstBuilder, NodeId, NodeKind, VarKind};
use veld_checker::{check_program, CheckResult};
use veld_diag::DiagnosticSink;

fn check(builder: AstBuilder, program: NodeId) -> (Ast, CheckResult, DiagnosticSink) {
    let mut ast = builder.finish();
    let mut sink = DiagnosticSink::new();
    let result = check_program(&mut ast, program, &mut sink, 0);
    (ast, result, sink)
}

fn error_codes(mut sink: DiagnosticSink) -> Vec<String> {
    sink.take_sorted()
        .iter()
        .filter_map(|d| d.code())
        .map(|c| c.as_str().to_string())
        .collect()
}

/// `function id<T>(x: T): T { return x; }`
fn generic_identity(b: &mut AstBuilder) -> NodeId {
    let t_param = b.named_annot("T");
    let p = b.param("x", t_param);
    let t_ret = b.named_annot("T");
    let x = b.ident("x");
    let ret = b.return_stmt(Some(x));
    let body = b.block(vec![ret]);
    b.generic_func_decl("id", vec!["T"], vec![p], Some(t_ret), body)
}

#[test]
fn test_generic_call_with_matching_argument() {
    let mut b = AstBuilder::new();
    let f = generic_identity(&mut b);
    let callee = b.ident("id");
    let num = b.number_annot();
    let arg = b.number(1.0);
    let call = b.call_with_type_args(callee, vec![num], vec![arg]);
    let result_num = b.number_annot();
    let decl = b.var_decl_typed(VarKind::Let, "n", result_num, Some(call));
    let program = b.program(vec![f, decl]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_generic_call_checks_argument_against_binding() {
    let mut b = AstBuilder::new();
    let f = generic_identity(&mut b);
    let callee = b.ident("id");
    let s = b.string_annot();
    let arg = b.number(1.0);
    let call = b.call_with_type_args(callee, vec![s], vec![arg]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![f, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_generic_call_without_type_args_reported() {
    let mut b = AstBuilder::new();
    let f = generic_identity(&mut b);
    let callee = b.ident("id");
    let arg = b.number(1.0);
    let call = b.call(callee, vec![arg]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![f, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2006"]);
}

#[test]
fn test_specializations_are_memoized_per_argument_list() {
    let mut b = AstBuilder::new();
    let f = generic_identity(&mut b);

    let callee1 = b.ident("id");
    let num1 = b.number_annot();
    let arg1 = b.number(1.0);
    let call1 = b.call_with_type_args(callee1, vec![num1], vec![arg1]);
    let stmt1 = b.expr_stmt(call1);

    let callee2 = b.ident("id");
    let num2 = b.number_annot();
    let arg2 = b.number(2.0);
    let call2 = b.call_with_type_args(callee2, vec![num2], vec![arg2]);
    let stmt2 = b.expr_stmt(call2);

    let program = b.program(vec![f, stmt1, stmt2]);
    let (ast, result, sink) = check(b, program);
    assert!(!sink.has_errors());

    // Two calls with the same argument list share one cloned
    // specialization: template + clone + the two statements.
    let body = match ast.kind(program) {
        NodeKind::Program { body } => body.clone(),
        other => panic!("unexpected root: {other:?}"),
    };
    assert_eq!(body.len(), 4);
    // Both callees carry the same specialized signature.
    assert_eq!(
        result.flow.node_type(callee1),
        result.flow.node_type(callee2)
    );
}

#[test]
fn test_distinct_argument_lists_get_distinct_clones() {
    let mut b = AstBuilder::new();
    let f = generic_identity(&mut b);

    let callee1 = b.ident("id");
    let num = b.number_annot();
    let arg1 = b.number(1.0);
    let call1 = b.call_with_type_args(callee1, vec![num], vec![arg1]);
    let stmt1 = b.expr_stmt(call1);

    let callee2 = b.ident("id");
    let s = b.string_annot();
    let arg2 = b.string("x");
    let call2 = b.call_with_type_args(callee2, vec![s], vec![arg2]);
    let stmt2 = b.expr_stmt(call2);

    let program = b.program(vec![f, stmt1, stmt2]);
    let (ast, result, sink) = check(b, program);
    assert!(!sink.has_errors());

    let body = match ast.kind(program) {
        NodeKind::Program { body } => body.clone(),
        other => panic!("unexpected root: {other:?}"),
    };
    assert_eq!(body.len(), 5);
    assert_ne!(
        result.flow.node_type(callee1),
        result.flow.node_type(callee2)
    );
}

#[test]
fn test_generic_class_member_uses_binding() {
    let mut b = AstBuilder::new();
    let t = b.named_annot("T");
    let prop = b.class_property("value", Some(t));
    let cls = b.generic_class_decl("Box", vec!["T"], vec![prop]);

    let num = b.number_annot();
    let box_num = b.generic_annot("Box", vec![num]);
    let callee = b.ident("Box");
    let num_arg = b.number_annot();
    let instance = b.new_expr_with_type_args(callee, vec![num_arg], vec![]);
    let v_decl = b.var_decl_typed(VarKind::Let, "v", box_num, Some(instance));

    let v = b.ident("v");
    let member = b.member(v, "value");
    let num2 = b.number_annot();
    let n_decl = b.var_decl_typed(VarKind::Let, "n", num2, Some(member));

    let program = b.program(vec![cls, v_decl, n_decl]);
    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_generic_alias_instantiation() {
    let mut b = AstBuilder::new();
    let t = b.named_annot("T");
    let arr = b.array_annot(t);
    let alias = b.generic_type_alias("Box", vec!["T"], arr);

    let num = b.number_annot();
    let box_num = b.generic_annot("Box", vec![num]);
    let one = b.number(1.0);
    let init = b.array(vec![one]);
    let decl = b.var_decl_typed(VarKind::Let, "v", box_num, Some(init));
    let program = b.program(vec![alias, decl]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_type_arg_count_mismatch_reported() {
    let mut b = AstBuilder::new();
    let t = b.named_annot("T");
    let arr = b.array_annot(t);
    let alias = b.generic_type_alias("Box", vec!["T"], arr);

    let num = b.number_annot();
    let s = b.string_annot();
    let bad = b.generic_annot("Box", vec![num, s]);
    let decl = b.var_decl_typed(VarKind::Let, "v", bad, None);
    let program = b.program(vec![alias, decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2005"]);
}

#[test]
fn test_generic_reference_without_args_reported() {
    let mut b = AstBuilder::new();
    let t = b.named_annot("T");
    let arr = b.array_annot(t);
    let alias = b.generic_type_alias("Box", vec!["T"], arr);

    let bare = b.named_annot("Box");
    let decl = b.var_decl_typed(VarKind::Let, "v", bare, None);
    let program = b.program(vec![alias, decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2006"]);
}

#[test]
fn test_type_args_on_non_generic_reported() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let alias = b.type_alias("N", num);

    let s = b.string_annot();
    let bad = b.generic_annot("N", vec![s]);
    let decl = b.var_decl_typed(VarKind::Let, "v", bad, None);
    let program = b.program(vec![alias, decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2007"]);
}

#[test]
fn test_undefined_type_name_reported() {
    let mut b = AstBuilder::new();
    let missing = b.named_annot("Missing");
    let decl = b.var_decl_typed(VarKind::Let, "v", missing, None);
    let program = b.program(vec![decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2002"]);
}

#[test]
fn test_recursive_alias_builds_looping_union() {
    let mut b = AstBuilder::new();
    let s = b.string_annot();
    let t_ref = b.named_annot("T");
    let t_arr = b.array_annot(t_ref);
    let union = b.union_annot(vec![s, t_arr]);
    let alias = b.type_alias("T", union);

    let t_ann = b.named_annot("T");
    let id = b.typed_ident("v", t_ann);
    let init = b.string("x");
    let decl = b.var_decl_pattern(VarKind::Let, id, Some(init));
    let program = b.program(vec![alias, decl]);

    let (ast, result, sink) = check(b, program);
    assert!(!sink.has_errors());

    let decl_id = result.sem.ident_decl(id).unwrap();
    let ty = result.flow.decl_type(decl_id).unwrap();
    assert!(result.types.is_looping(ty));
    assert_eq!(result.types.display(ty, &ast.names), "string | ...[]");
}

#[test]
fn test_alias_chain_resolves_through_batch() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let a = b.type_alias("A", num);
    let a_ref = b.named_annot("A");
    let bb = b.type_alias("B", a_ref);

    let b_ann = b.named_annot("B");
    let init = b.number(1.0);
    let decl = b.var_decl_typed(VarKind::Let, "v", b_ann, Some(init));
    let program = b.program(vec![bb, a, decl]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_pure_alias_cycle_reported() {
    let mut b = AstBuilder::new();
    let b_ref = b.named_annot("B");
    let a = b.type_alias("A", b_ref);
    let a_ref = b.named_annot("A");
    let bb = b.type_alias("B", a_ref);
    let program = b.program(vec![a, bb]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2004"]);
}

#[test]
fn test_duplicate_type_name_reported() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let first = b.type_alias("T", num);
    let s = b.string_annot();
    let second = b.type_alias("T", s);
    let program = b.program(vec![first, second]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2014"]);
}
