//! Programmatic AST construction.
//!
//! A thin convenience layer over [`Ast::alloc`] used by the semantic passes'
//! test suites and by tooling that synthesizes trees without a source file.
//! Every node gets a dummy span.

use crate::node::{
    AssignOp, Ast, BinaryOp, MethodKind, NodeId, NodeKind, PrimitiveKeyword, UnaryOp, VarKind,
};
use crate::span::Span;

/// Builder wrapping an [`Ast`] arena.
#[derive(Debug, Default)]
pub struct AstBuilder {
    pub ast: Ast,
}

impl AstBuilder {
    pub fn new() -> Self {
        AstBuilder::default()
    }

    /// Take the finished arena out of the builder.
    pub fn finish(self) -> Ast {
        self.ast
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.ast.alloc(kind, Span::dummy())
    }

    // ==== Expressions ====

    pub fn ident(&mut self, name: &str) -> NodeId {
        let atom = self.ast.names.intern(name);
        self.alloc(NodeKind::Identifier { name: atom, annotation: None })
    }

    /// `name: T` identifier in a binding position.
    pub fn typed_ident(&mut self, name: &str, annotation: NodeId) -> NodeId {
        let atom = self.ast.names.intern(name);
        self.alloc(NodeKind::Identifier { name: atom, annotation: Some(annotation) })
    }

    pub fn this_expr(&mut self) -> NodeId {
        self.alloc(NodeKind::This)
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::NumberLiteral { value })
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        let atom = self.ast.names.intern(value);
        self.alloc(NodeKind::StringLiteral { value: atom })
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::BooleanLiteral { value })
    }

    pub fn null(&mut self) -> NodeId {
        self.alloc(NodeKind::NullLiteral)
    }

    pub fn array(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ArrayExpression { elements })
    }

    pub fn unary(&mut self, op: UnaryOp, argument: NodeId) -> NodeId {
        self.alloc(NodeKind::UnaryExpression { op, argument })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::BinaryExpression { op, left, right })
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(NodeKind::AssignmentExpression { op: AssignOp::Assign, left, right })
    }

    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::CallExpression { callee, type_args: None, arguments })
    }

    pub fn call_with_type_args(
        &mut self,
        callee: NodeId,
        type_args: Vec<NodeId>,
        arguments: Vec<NodeId>,
    ) -> NodeId {
        let type_args = self.alloc(NodeKind::TypeArgs { args: type_args });
        self.alloc(NodeKind::CallExpression { callee, type_args: Some(type_args), arguments })
    }

    pub fn new_expr(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::NewExpression { callee, type_args: None, arguments })
    }

    pub fn new_expr_with_type_args(
        &mut self,
        callee: NodeId,
        type_args: Vec<NodeId>,
        arguments: Vec<NodeId>,
    ) -> NodeId {
        let type_args = self.alloc(NodeKind::TypeArgs { args: type_args });
        self.alloc(NodeKind::NewExpression { callee, type_args: Some(type_args), arguments })
    }

    pub fn member(&mut self, object: NodeId, property: &str) -> NodeId {
        let property = self.ident(property);
        self.alloc(NodeKind::MemberExpression { object, property, computed: false })
    }

    pub fn arrow(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::ArrowFunction { params, return_type: None, body, is_async: false })
    }

    pub fn function_expr(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::FunctionExpression {
            id: None,
            params,
            return_type: None,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    // ==== Statements ====

    pub fn program(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Program { body })
    }

    pub fn block(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { body })
    }

    pub fn expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.alloc(NodeKind::ExpressionStatement { expression })
    }

    pub fn empty(&mut self) -> NodeId {
        self.alloc(NodeKind::EmptyStatement)
    }

    pub fn var_decl(&mut self, kind: VarKind, name: &str, init: Option<NodeId>) -> NodeId {
        let id = self.ident(name);
        self.var_decl_pattern(kind, id, init)
    }

    /// `let name: T = init`.
    pub fn var_decl_typed(
        &mut self,
        kind: VarKind,
        name: &str,
        annotation: NodeId,
        init: Option<NodeId>,
    ) -> NodeId {
        let id = self.typed_ident(name, annotation);
        self.var_decl_pattern(kind, id, init)
    }

    pub fn var_decl_pattern(
        &mut self,
        kind: VarKind,
        target: NodeId,
        init: Option<NodeId>,
    ) -> NodeId {
        let declarator = self.alloc(NodeKind::VariableDeclarator { id: target, init });
        self.alloc(NodeKind::VariableDeclaration { kind, declarators: vec![declarator] })
    }

    pub fn func_decl(&mut self, name: &str, params: Vec<NodeId>, body: NodeId) -> NodeId {
        let id = self.ident(name);
        self.alloc(NodeKind::FunctionDeclaration {
            id,
            type_params: None,
            params,
            return_type: None,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    pub fn func_decl_typed(
        &mut self,
        name: &str,
        params: Vec<NodeId>,
        return_type: NodeId,
        body: NodeId,
    ) -> NodeId {
        let id = self.ident(name);
        self.alloc(NodeKind::FunctionDeclaration {
            id,
            type_params: None,
            params,
            return_type: Some(return_type),
            body,
            is_async: false,
            is_generator: false,
        })
    }

    pub fn generic_func_decl(
        &mut self,
        name: &str,
        type_params: Vec<&str>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let id = self.ident(name);
        let type_params = self.type_params(type_params);
        self.alloc(NodeKind::FunctionDeclaration {
            id,
            type_params: Some(type_params),
            params,
            return_type,
            body,
            is_async: false,
            is_generator: false,
        })
    }

    pub fn return_stmt(&mut self, argument: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::ReturnStatement { argument })
    }

    pub fn if_stmt(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    ) -> NodeId {
        self.alloc(NodeKind::IfStatement { test, consequent, alternate })
    }

    pub fn while_stmt(&mut self, test: NodeId, body: NodeId) -> NodeId {
        self.alloc(NodeKind::WhileStatement { test, body })
    }

    pub fn labeled(&mut self, label: &str, body: NodeId) -> NodeId {
        let label = self.ident(label);
        self.alloc(NodeKind::LabeledStatement { label, body })
    }

    pub fn break_stmt(&mut self, label: Option<&str>) -> NodeId {
        let label = label.map(|l| self.ident(l));
        self.alloc(NodeKind::BreakStatement { label })
    }

    pub fn continue_stmt(&mut self, label: Option<&str>) -> NodeId {
        let label = label.map(|l| self.ident(l));
        self.alloc(NodeKind::ContinueStatement { label })
    }

    pub fn try_catch(
        &mut self,
        block: NodeId,
        param: Option<NodeId>,
        catch_body: NodeId,
    ) -> NodeId {
        let handler = self.alloc(NodeKind::CatchClause { param, body: catch_body });
        self.alloc(NodeKind::TryStatement { block, handler: Some(handler), finalizer: None })
    }

    // ==== Classes ====

    pub fn class_decl(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let id = self.ident(name);
        let body = self.alloc(NodeKind::ClassBody { members });
        self.alloc(NodeKind::ClassDeclaration {
            id,
            type_params: None,
            super_class: None,
            super_type_args: None,
            body,
        })
    }

    pub fn generic_class_decl(
        &mut self,
        name: &str,
        type_params: Vec<&str>,
        members: Vec<NodeId>,
    ) -> NodeId {
        let id = self.ident(name);
        let type_params = self.type_params(type_params);
        let body = self.alloc(NodeKind::ClassBody { members });
        self.alloc(NodeKind::ClassDeclaration {
            id,
            type_params: Some(type_params),
            super_class: None,
            super_type_args: None,
            body,
        })
    }

    pub fn class_decl_extends(
        &mut self,
        name: &str,
        super_name: &str,
        members: Vec<NodeId>,
    ) -> NodeId {
        let id = self.ident(name);
        let super_class = self.ident(super_name);
        let body = self.alloc(NodeKind::ClassBody { members });
        self.alloc(NodeKind::ClassDeclaration {
            id,
            type_params: None,
            super_class: Some(super_class),
            super_type_args: None,
            body,
        })
    }

    pub fn class_property(&mut self, name: &str, annotation: Option<NodeId>) -> NodeId {
        let key = self.ident(name);
        self.alloc(NodeKind::ClassProperty {
            key,
            type_annotation: annotation,
            value: None,
            is_static: false,
        })
    }

    pub fn method(&mut self, name: &str, params: Vec<NodeId>, body: NodeId) -> NodeId {
        let key = self.ident(name);
        let value = self.function_expr(params, body);
        self.alloc(NodeKind::MethodDefinition {
            key,
            value,
            kind: MethodKind::Method,
            is_static: false,
        })
    }

    pub fn method_typed(
        &mut self,
        name: &str,
        params: Vec<NodeId>,
        return_type: NodeId,
        body: NodeId,
    ) -> NodeId {
        let key = self.ident(name);
        let value = self.alloc(NodeKind::FunctionExpression {
            id: None,
            params,
            return_type: Some(return_type),
            body,
            is_async: false,
            is_generator: false,
        });
        self.alloc(NodeKind::MethodDefinition {
            key,
            value,
            kind: MethodKind::Method,
            is_static: false,
        })
    }

    pub fn constructor(&mut self, params: Vec<NodeId>, body: NodeId) -> NodeId {
        let key = self.ident("constructor");
        let value = self.function_expr(params, body);
        self.alloc(NodeKind::MethodDefinition {
            key,
            value,
            kind: MethodKind::Constructor,
            is_static: false,
        })
    }

    // ==== Type annotations ====

    pub fn prim(&mut self, keyword: PrimitiveKeyword) -> NodeId {
        self.alloc(NodeKind::PrimitiveAnnotation { keyword })
    }

    pub fn number_annot(&mut self) -> NodeId {
        self.prim(PrimitiveKeyword::Number)
    }

    pub fn string_annot(&mut self) -> NodeId {
        self.prim(PrimitiveKeyword::String)
    }

    pub fn named_annot(&mut self, name: &str) -> NodeId {
        let id = self.ident(name);
        self.alloc(NodeKind::NamedAnnotation { id, type_args: None })
    }

    pub fn generic_annot(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let id = self.ident(name);
        let type_args = self.alloc(NodeKind::TypeArgs { args });
        self.alloc(NodeKind::NamedAnnotation { id, type_args: Some(type_args) })
    }

    pub fn union_annot(&mut self, members: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::UnionAnnotation { members })
    }

    pub fn array_annot(&mut self, element: NodeId) -> NodeId {
        self.alloc(NodeKind::ArrayAnnotation { element })
    }

    pub fn tuple_annot(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::TupleAnnotation { elements })
    }

    pub fn nullable_annot(&mut self, inner: NodeId) -> NodeId {
        self.alloc(NodeKind::NullableAnnotation { inner })
    }

    pub fn function_annot(&mut self, params: Vec<NodeId>, return_type: NodeId) -> NodeId {
        let params = params
            .into_iter()
            .map(|annotation| self.ast.alloc(
                NodeKind::FunctionTypeParam { name: None, annotation },
                Span::dummy(),
            ))
            .collect();
        self.alloc(NodeKind::FunctionAnnotation { params, return_type })
    }

    pub fn type_alias(&mut self, name: &str, right: NodeId) -> NodeId {
        let id = self.ident(name);
        self.alloc(NodeKind::TypeAliasDeclaration { id, type_params: None, right })
    }

    pub fn generic_type_alias(
        &mut self,
        name: &str,
        type_params: Vec<&str>,
        right: NodeId,
    ) -> NodeId {
        let id = self.ident(name);
        let type_params = self.type_params(type_params);
        self.alloc(NodeKind::TypeAliasDeclaration { id, type_params: Some(type_params), right })
    }

    fn type_params(&mut self, names: Vec<&str>) -> NodeId {
        let params = names
            .into_iter()
            .map(|n| {
                let name = self.ident(n);
                self.ast.alloc(NodeKind::TypeParam { name }, Span::dummy())
            })
            .collect();
        self.alloc(NodeKind::TypeParams { params })
    }

    /// `name: T` function parameter.
    pub fn param(&mut self, name: &str, annotation: NodeId) -> NodeId {
        self.typed_ident(name, annotation)
    }

    /// Untyped function parameter.
    pub fn param_untyped(&mut self, name: &str) -> NodeId {
        self.ident(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_typed_function() {
        let mut b = AstBuilder::new();
        let num = b.number_annot();
        let p = b.param("x", num);
        let x = b.ident("x");
        let ret = b.return_stmt(Some(x));
        let body = b.block(vec![ret]);
        let f = b.func_decl("id", vec![p], body);
        let program = b.program(vec![f]);
        let ast = b.finish();
        assert_eq!(ast.children(program), vec![f]);
        assert!(ast.is_function_like(f));
        assert_eq!(ast.function_params(f).unwrap(), &[p]);
        assert_eq!(ast.ident_annotation(p), Some(num));
    }

    #[test]
    fn test_generic_alias_shape() {
        let mut b = AstBuilder::new();
        let t = b.named_annot("T");
        let arr = b.array_annot(t);
        let alias = b.generic_type_alias("Box", vec!["T"], arr);
        let ast = b.finish();
        match ast.kind(alias) {
            NodeKind::TypeAliasDeclaration { type_params: Some(tp), right, .. } => {
                assert_eq!(ast.children(*tp).len(), 1);
                assert_eq!(*right, arr);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
