//! Type annotation resolution
//!
//! Turns annotation subtrees into [`TypeId`]s against the checker's type
//! binding table, and assigns declared types to a scope's value
//! declarations before its statements are checked (so forward references
//! like calling a function above its declaration see the right signature).

use veld_ast::{Atom, NodeId, NodeKind, PrimitiveKeyword};
use veld_types::{
    make_nullable, make_union, FunctionParam, FunctionType, ObjectField, TupleType, TypeError,
    TypeId, TypeKind,
};

use crate::check::{
    FlowChecker, TypeBinding, ERR_MISSING_TYPE_ARGS, ERR_NOT_GENERIC, ERR_UNDEFINED_TYPE,
};

impl FlowChecker<'_> {
    /// Resolve a type annotation to a type.
    pub(crate) fn resolve_annotation(&mut self, node: NodeId) -> TypeId {
        let span = self.span(node);
        if !self.enter(span) {
            self.leave();
            return self.types.any();
        }
        let ty = self.resolve_annotation_inner(node);
        self.leave();
        ty
    }

    fn resolve_annotation_inner(&mut self, node: NodeId) -> TypeId {
        let kind = self.ast.kind(node).clone();
        match kind {
            NodeKind::PrimitiveAnnotation { keyword } => match keyword {
                PrimitiveKeyword::Void => self.types.void(),
                PrimitiveKeyword::Null => self.types.null(),
                PrimitiveKeyword::Boolean => self.types.boolean(),
                PrimitiveKeyword::String => self.types.string(),
                PrimitiveKeyword::Number => self.types.number(),
                PrimitiveKeyword::BigInt => self.types.bigint(),
                PrimitiveKeyword::Any => self.types.any(),
                PrimitiveKeyword::Mixed => self.types.mixed(),
            },
            NodeKind::NamedAnnotation { id, type_args } => {
                self.resolve_named_annotation(node, id, type_args)
            }
            NodeKind::UnionAnnotation { members } => {
                let arms: Vec<TypeId> =
                    members.iter().map(|&m| self.resolve_annotation(m)).collect();
                make_union(self.types, arms)
            }
            NodeKind::NullableAnnotation { inner } => {
                let inner_ty = self.resolve_annotation(inner);
                make_nullable(self.types, inner_ty)
            }
            NodeKind::ArrayAnnotation { element } => {
                let element_ty = self.resolve_annotation(element);
                self.types.alloc(TypeKind::Array(element_ty))
            }
            NodeKind::TupleAnnotation { elements } => {
                let element_tys: Vec<TypeId> =
                    elements.iter().map(|&e| self.resolve_annotation(e)).collect();
                self.types.alloc(TypeKind::Tuple(TupleType { elements: element_tys }))
            }
            NodeKind::FunctionAnnotation { params, return_type } => {
                let mut fn_params = Vec::with_capacity(params.len());
                for p in params {
                    if let NodeKind::FunctionTypeParam { name, annotation } = self.ast.kind(p) {
                        let (name, annotation) = (*name, *annotation);
                        let ty = self.resolve_annotation(annotation);
                        fn_params.push(FunctionParam { name, ty });
                    }
                }
                let ret = self.resolve_annotation(return_type);
                self.types.alloc(TypeKind::Function(FunctionType {
                    this_ty: None,
                    params: fn_params,
                    return_type: ret,
                    is_async: false,
                    is_generator: false,
                }))
            }
            NodeKind::ExactObjectAnnotation { fields } => {
                let mut object_fields = Vec::with_capacity(fields.len());
                for f in fields {
                    if let NodeKind::ObjectTypeField { name, annotation } = self.ast.kind(f) {
                        let (name, annotation) = (*name, *annotation);
                        let ty = self.resolve_annotation(annotation);
                        object_fields.push(ObjectField { name, ty });
                    }
                }
                self.types.alloc(TypeKind::ExactObject(object_fields))
            }
            _ => self.types.any(),
        }
    }

    /// A reference to a named type, possibly a generic instantiation.
    fn resolve_named_annotation(
        &mut self,
        node: NodeId,
        id: NodeId,
        type_args: Option<NodeId>,
    ) -> TypeId {
        let Some(name) = self.ast.ident_name(id) else {
            return self.types.any();
        };
        match self.type_scope.lookup(name).copied() {
            Some(TypeBinding::Ty(ty)) => {
                if type_args.is_some() {
                    let text = self.ast.names.resolve(name).to_string();
                    self.error(
                        ERR_NOT_GENERIC,
                        self.span(node),
                        TypeError::NotGeneric { name: text }.to_string(),
                        "not a generic type",
                    );
                }
                ty
            }
            Some(TypeBinding::Generic(generic)) => {
                let Some(args_node) = type_args else {
                    let text = self.ast.names.resolve(name).to_string();
                    self.error(
                        ERR_MISSING_TYPE_ARGS,
                        self.span(node),
                        TypeError::MissingTypeArgs { name: text }.to_string(),
                        "missing type arguments",
                    );
                    return self.types.any();
                };
                let args = self.resolve_type_args(args_node);
                self.instantiate_generic(generic, args, node)
            }
            None => {
                let text = self.ast.names.resolve(name).to_string();
                self.error(
                    ERR_UNDEFINED_TYPE,
                    self.span(node),
                    TypeError::UndefinedType { name: text }.to_string(),
                    "unknown type name",
                );
                self.types.any()
            }
        }
    }

    /// Resolve a `<T1, T2, ...>` argument list.
    pub(crate) fn resolve_type_args(&mut self, node: NodeId) -> Vec<TypeId> {
        let args = match self.ast.kind(node) {
            NodeKind::TypeArgs { args } => args.clone(),
            _ => return Vec::new(),
        };
        args.into_iter().map(|a| self.resolve_annotation(a)).collect()
    }

    // ==== Scope declaration annotation ====

    /// Assign declared types to the scope's value declarations. Runs after
    /// type declarations are resolved and before statements are checked.
    pub(crate) fn annotate_scope_decls(&mut self, owner: NodeId, stmts: &[NodeId]) {
        for &stmt in stmts {
            let kind = self.ast.kind(stmt).clone();
            match kind {
                NodeKind::FunctionDeclaration { id, type_params, .. } => {
                    if type_params.is_some() {
                        if let Some(decl) = self.sem.ident_decl(id) {
                            self.sem.decl_mut(decl).generic = true;
                        }
                        self.register_generic_function(stmt, owner);
                    } else {
                        let fn_ty = self.function_type_of(stmt);
                        self.flow.set_node_type(stmt, fn_ty);
                        if let Some(decl) = self.sem.ident_decl(id) {
                            self.flow.set_decl_type(decl, fn_ty);
                        }
                    }
                }
                NodeKind::VariableDeclaration { declarators, .. } => {
                    for d in declarators {
                        let id = match self.ast.kind(d) {
                            NodeKind::VariableDeclarator { id, .. } => *id,
                            _ => continue,
                        };
                        let Some(ann) = self.ast.ident_annotation(id) else { continue };
                        let ty = self.resolve_annotation(ann);
                        if let Some(decl) = self.sem.ident_decl(id) {
                            self.flow.set_decl_type(decl, ty);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// The signature type of a function-like node, from its annotations.
    /// A function with no annotations at all is untyped and its calls go
    /// unchecked; once any annotation appears, the missing slots are `any`.
    pub(crate) fn function_type_of(&mut self, node: NodeId) -> TypeId {
        let (params, return_ann, is_async, is_generator) = match self.ast.kind(node) {
            NodeKind::FunctionDeclaration { params, return_type, is_async, is_generator, .. }
            | NodeKind::FunctionExpression { params, return_type, is_async, is_generator, .. } => {
                (params.clone(), *return_type, *is_async, *is_generator)
            }
            NodeKind::ArrowFunction { params, return_type, is_async, .. } => {
                (params.clone(), *return_type, *is_async, false)
            }
            _ => (Vec::new(), None, false, false),
        };

        if return_ann.is_none() && !params.iter().any(|&p| self.param_is_annotated(p)) {
            return self.types.untyped_function();
        }

        let mut fn_params = Vec::with_capacity(params.len());
        for param in params {
            let (name, ty) = self.param_signature(param);
            fn_params.push(FunctionParam { name, ty });
        }
        let any = self.types.any();
        let return_type = match return_ann {
            Some(ann) => self.resolve_annotation(ann),
            None => any,
        };
        self.types.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: fn_params,
            return_type,
            is_async,
            is_generator,
        }))
    }

    fn param_is_annotated(&self, param: NodeId) -> bool {
        match self.ast.kind(param) {
            NodeKind::Identifier { annotation, .. } => annotation.is_some(),
            NodeKind::AssignmentPattern { left, .. } => self.param_is_annotated(*left),
            _ => false,
        }
    }

    fn param_signature(&mut self, param: NodeId) -> (Option<Atom>, TypeId) {
        let kind = self.ast.kind(param).clone();
        match kind {
            NodeKind::Identifier { name, annotation } => {
                let ty = match annotation {
                    Some(ann) => self.resolve_annotation(ann),
                    None => self.types.any(),
                };
                (Some(name), ty)
            }
            NodeKind::AssignmentPattern { left, .. } => self.param_signature(left),
            _ => (None, self.types.any()),
        }
    }
}
