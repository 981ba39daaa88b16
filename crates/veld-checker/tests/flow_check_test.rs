//! Integration tests for statement and expression flow checking
//!
//! Each test builds a small program, runs resolution and checking, and
//! asserts on the reported error codes or the recorded types.

use veld_ast::{Ast, AstBuilder, BinaryOp, NodeId, NodeKind, VarKind};
use veld_checker::{check_program, CheckResult};
use veld_diag::DiagnosticSink;
use veld_types::TypeKind;

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

#[test]
fn test_annotated_let_accepts_matching_initializer() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let id = b.typed_ident("n", num);
    let init = b.number(1.0);
    let decl = b.var_decl_pattern(VarKind::Let, id, Some(init));
    let program = b.program(vec![decl]);

    let (_, result, sink) = check(b, program);
    assert!(!sink.has_errors());
    let decl_id = result.sem.ident_decl(id).unwrap();
    assert_eq!(result.flow.decl_type(decl_id), Some(result.types.number()));
}

#[test]
fn test_unannotated_let_infers_from_initializer() {
    let mut b = AstBuilder::new();
    let id = b.ident("s");
    let init = b.string("hi");
    let decl = b.var_decl_pattern(VarKind::Let, id, Some(init));
    let program = b.program(vec![decl]);

    let (_, result, sink) = check(b, program);
    assert!(!sink.has_errors());
    let decl_id = result.sem.ident_decl(id).unwrap();
    assert_eq!(result.flow.decl_type(decl_id), Some(result.types.string()));
}

#[test]
fn test_union_source_does_not_flow_into_arm() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let s = b.string_annot();
    let ns = b.union_annot(vec![num, s]);
    let init = b.string("x");
    let a_decl = b.var_decl_typed(VarKind::Let, "a", ns, Some(init));

    let num2 = b.number_annot();
    let a_ref = b.ident("a");
    let n_decl = b.var_decl_typed(VarKind::Let, "n", num2, Some(a_ref));
    let program = b.program(vec![a_decl, n_decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_any_source_splices_checked_cast() {
    let mut b = AstBuilder::new();
    let any = b.prim(veld_ast::PrimitiveKeyword::Any);
    let a_init = b.number(1.0);
    let a_decl = b.var_decl_typed(VarKind::Let, "a", any, Some(a_init));

    let num = b.number_annot();
    let a_ref = b.ident("a");
    let n_decl = b.var_decl_typed(VarKind::Let, "n", num, Some(a_ref));
    let program = b.program(vec![a_decl, n_decl]);

    let (ast, result, sink) = check(b, program);
    assert!(!sink.has_errors());

    // The initializer was wrapped in an implicit runtime-checked cast.
    let declarator = ast.children(n_decl)[0];
    let init = match ast.kind(declarator) {
        NodeKind::VariableDeclarator { init: Some(init), .. } => *init,
        other => panic!("unexpected declarator: {other:?}"),
    };
    match ast.kind(init) {
        NodeKind::ImplicitCheckedCast { argument } => assert_eq!(*argument, a_ref),
        other => panic!("expected checked cast, got: {other:?}"),
    }
    assert_eq!(result.flow.node_type(init), Some(result.types.number()));
}

#[test]
fn test_return_value_checked_against_annotation() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let bad = b.string("x");
    let ret = b.return_stmt(Some(bad));
    let body = b.block(vec![ret]);
    let f = b.func_decl_typed("f", vec![], num, body);
    let program = b.program(vec![f]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_function_must_return_a_value() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let body = b.block(vec![]);
    let f = b.func_decl_typed("f", vec![], num, body);
    let program = b.program(vec![f]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_call_arguments_flow_into_parameters() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let p = b.param("x", num);
    let x = b.ident("x");
    let ret = b.return_stmt(Some(x));
    let body = b.block(vec![ret]);
    let num_ret = b.number_annot();
    let f = b.func_decl_typed("f", vec![p], num_ret, body);

    let callee = b.ident("f");
    let arg = b.string("no");
    let call = b.call(callee, vec![arg]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![f, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_call_arity_mismatch_reported() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let p = b.param("x", num);
    let body = b.block(vec![]);
    let f = b.func_decl("f", vec![p], body);

    let callee = b.ident("f");
    let call = b.call(callee, vec![]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![f, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2009"]);
}

#[test]
fn test_calling_a_number_is_not_callable() {
    let mut b = AstBuilder::new();
    let init = b.number(1.0);
    let decl = b.var_decl(VarKind::Let, "n", Some(init));
    let callee = b.ident("n");
    let call = b.call(callee, vec![]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![decl, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2008"]);
}

#[test]
fn test_class_constructor_requires_new() {
    let mut b = AstBuilder::new();
    let cls = b.class_decl("C", vec![]);
    let callee = b.ident("C");
    let call = b.call(callee, vec![]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![cls, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2012"]);
}

#[test]
fn test_instance_member_has_declared_type() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let prop = b.class_property("x", Some(num));
    let cls = b.class_decl("C", vec![prop]);

    let c = b.ident("C");
    let instance = b.new_expr(c, vec![]);
    let member = b.member(instance, "x");
    let num2 = b.number_annot();
    let decl = b.var_decl_typed(VarKind::Let, "n", num2, Some(member));
    let program = b.program(vec![cls, decl]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_unknown_member_reported() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let prop = b.class_property("x", Some(num));
    let cls = b.class_decl("C", vec![prop]);

    let c = b.ident("C");
    let instance = b.new_expr(c, vec![]);
    let member = b.member(instance, "y");
    let stmt = b.expr_stmt(member);
    let program = b.program(vec![cls, stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2010"]);
}

#[test]
fn test_member_lookup_walks_superclass() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let prop = b.class_property("x", Some(num));
    let base = b.class_decl("Base", vec![prop]);
    let derived = b.class_decl_extends("Derived", "Base", vec![]);

    let d = b.ident("Derived");
    let instance = b.new_expr(d, vec![]);
    let member = b.member(instance, "x");
    let num2 = b.number_annot();
    let decl = b.var_decl_typed(VarKind::Let, "n", num2, Some(member));
    let program = b.program(vec![base, derived, decl]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_method_this_is_the_instance() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let prop = b.class_property("x", Some(num));
    let this = b.this_expr();
    let this_x = b.member(this, "x");
    let ret = b.return_stmt(Some(this_x));
    let body = b.block(vec![ret]);
    let num_ret = b.number_annot();
    let method = b.method_typed("get", vec![], num_ret, body);
    let cls = b.class_decl("C", vec![prop, method]);
    let program = b.program(vec![cls]);

    let (_, _, sink) = check(b, program);
    assert!(!sink.has_errors());
}

#[test]
fn test_arithmetic_rejects_string_operand() {
    let mut b = AstBuilder::new();
    let left = b.string("a");
    let right = b.number(2.0);
    let mul = b.binary(BinaryOp::Mul, left, right);
    let stmt = b.expr_stmt(mul);
    let program = b.program(vec![stmt]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2011"]);
}

#[test]
fn test_plus_concatenates_strings() {
    let mut b = AstBuilder::new();
    let left = b.string("a");
    let right = b.number(2.0);
    let add = b.binary(BinaryOp::Add, left, right);
    let id = b.ident("s");
    let decl = b.var_decl_pattern(VarKind::Let, id, Some(add));
    let program = b.program(vec![decl]);

    let (_, result, sink) = check(b, program);
    assert!(!sink.has_errors());
    let decl_id = result.sem.ident_decl(id).unwrap();
    assert_eq!(result.flow.decl_type(decl_id), Some(result.types.string()));
}

#[test]
fn test_array_literal_checks_against_declared_element() {
    let mut b = AstBuilder::new();
    let num = b.number_annot();
    let arr_ann = b.array_annot(num);
    let good = b.number(1.0);
    let bad = b.string("x");
    let arr = b.array(vec![good, bad]);
    let decl = b.var_decl_typed(VarKind::Let, "xs", arr_ann, Some(arr));
    let program = b.program(vec![decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}

#[test]
fn test_array_literal_infers_element_union() {
    let mut b = AstBuilder::new();
    let one = b.number(1.0);
    let two = b.string("two");
    let arr = b.array(vec![one, two]);
    let id = b.ident("xs");
    let decl = b.var_decl_pattern(VarKind::Let, id, Some(arr));
    let program = b.program(vec![decl]);

    let (_, result, sink) = check(b, program);
    assert!(!sink.has_errors());
    let decl_id = result.sem.ident_decl(id).unwrap();
    let ty = result.flow.decl_type(decl_id).unwrap();
    match result.types.kind(ty) {
        TypeKind::Array(element) => {
            assert!(result.types.kind(*element).is_union());
        }
        other => panic!("expected array type, got: {other:?}"),
    }
}

#[test]
fn test_deeply_nested_annotation_reports_once() {
    let mut b = AstBuilder::new();
    let mut ann = b.number_annot();
    for _ in 0..400 {
        ann = b.array_annot(ann);
    }
    let decl = b.var_decl_typed(VarKind::Let, "v", ann, None);
    let program = b.program(vec![decl]);

    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2013"]);
}

#[test]
fn test_unannotated_function_calls_are_unchecked() {
    let mut b = AstBuilder::new();
    let p = b.param_untyped("x");
    let body = b.block(vec![]);
    let f = b.func_decl("f", vec![p], body);

    let callee = b.ident("f");
    let a1 = b.number(1.0);
    let a2 = b.string("two");
    let call = b.call(callee, vec![a1, a2]);
    let stmt = b.expr_stmt(call);
    let program = b.program(vec![f, stmt]);

    let (_, result, sink) = check(b, program);
    // No annotations anywhere: arity and argument types go unchecked.
    assert!(!sink.has_errors());
    let ty = result.flow.node_type(callee).unwrap();
    assert!(matches!(result.types.kind(ty), TypeKind::UntypedFunction));
}

#[test]
fn test_unannotated_function_expression_adopts_expected_signature() {
    let mut b = AstBuilder::new();
    let p = b.param_untyped("x");
    let s = b.string("oops");
    let ret = b.return_stmt(Some(s));
    let body = b.block(vec![ret]);
    let fexpr = b.function_expr(vec![p], body);

    let param_num = b.number_annot();
    let ret_num = b.number_annot();
    let ann = b.function_annot(vec![param_num], ret_num);
    let decl = b.var_decl_typed(VarKind::Let, "f", ann, Some(fexpr));
    let program = b.program(vec![decl]);

    // The expression has no annotations of its own, so it takes the
    // declared signature and the string return is caught against it.
    let (_, _, sink) = check(b, program);
    assert_eq!(error_codes(sink), vec!["E2001"]);
}
