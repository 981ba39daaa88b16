//! Expression type checking
//!
//! `check_expr` computes the type of an expression tree bottom-up,
//! recording a type for every visited node. A constraint type flows
//! downward where the surrounding context declares one (initializers,
//! arguments, returns) so literals can be checked against it directly
//! instead of inferring a type first and reconciling after.

use veld_ast::{Atom, BinaryOp, LogicalOp, NodeId, NodeKind, UnaryOp};
use veld_types::{
    make_union, ClassId, ClassMember, FunctionType, ObjectField, TypeId, TypeKind,
};

use crate::check::{
    FlowChecker, ERR_ARG_COUNT, ERR_BAD_OPERAND, ERR_CLASS_NEEDS_NEW, ERR_MISSING_TYPE_ARGS,
    ERR_NOT_CALLABLE, ERR_UNKNOWN_MEMBER,
};

impl FlowChecker<'_> {
    /// Type of an expression; `constraint` is the type the context expects,
    /// when it has one.
    pub(crate) fn check_expr(
        &mut self,
        parent: NodeId,
        expr: NodeId,
        constraint: Option<TypeId>,
    ) -> TypeId {
        let span = self.span(expr);
        if !self.enter(span) {
            self.leave();
            return self.types.any();
        }
        let ty = self.check_expr_inner(parent, expr, constraint);
        self.leave();
        self.flow.set_node_type(expr, ty);
        ty
    }

    fn check_expr_inner(
        &mut self,
        parent: NodeId,
        expr: NodeId,
        constraint: Option<TypeId>,
    ) -> TypeId {
        let kind = self.ast.kind(expr).clone();
        match kind {
            NodeKind::NumberLiteral { .. } => self.types.number(),
            NodeKind::StringLiteral { .. } => self.types.string(),
            NodeKind::BooleanLiteral { .. } => self.types.boolean(),
            NodeKind::NullLiteral => self.types.null(),
            NodeKind::BigIntLiteral { .. } => self.types.bigint(),
            NodeKind::TemplateLiteral { expressions, .. } => {
                for e in expressions {
                    self.check_expr(expr, e, None);
                }
                self.types.string()
            }

            NodeKind::Identifier { name, .. } => self.check_identifier(expr, name),
            NodeKind::This => self
                .func_stack
                .last()
                .and_then(|ctx| ctx.this_ty)
                .unwrap_or_else(|| self.types.any()),
            NodeKind::Super | NodeKind::NewTarget => self.types.any(),

            NodeKind::ArrayExpression { elements } => {
                self.check_array_literal(expr, &elements, constraint)
            }
            NodeKind::ObjectExpression { properties } => {
                self.check_object_literal(expr, &properties, constraint)
            }

            NodeKind::UnaryExpression { op, argument } => {
                let arg_ty = self.check_expr(expr, argument, None);
                match op {
                    UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => {
                        self.check_numeric_operand(argument, arg_ty, op.as_str());
                        if matches!(self.types.kind(arg_ty), TypeKind::BigInt) {
                            self.types.bigint()
                        } else {
                            self.types.number()
                        }
                    }
                    UnaryOp::Not | UnaryOp::Delete => self.types.boolean(),
                    UnaryOp::Typeof => self.types.string(),
                    UnaryOp::Void => self.types.void(),
                }
            }
            NodeKind::UpdateExpression { op: _, argument, .. } => {
                let arg_ty = self.check_expr(expr, argument, None);
                self.check_numeric_operand(argument, arg_ty, "++");
                if matches!(self.types.kind(arg_ty), TypeKind::BigInt) {
                    self.types.bigint()
                } else {
                    self.types.number()
                }
            }
            NodeKind::BinaryExpression { op, left, right } => {
                let left_ty = self.check_expr(expr, left, None);
                let right_ty = self.check_expr(expr, right, None);
                self.check_binary(expr, op, left, left_ty, right, right_ty)
            }
            NodeKind::LogicalExpression { op, left, right } => {
                let left_ty = self.check_expr(expr, left, constraint);
                let right_ty = self.check_expr(expr, right, constraint);
                match op {
                    // `a && b` can evaluate to either operand.
                    LogicalOp::And | LogicalOp::Or | LogicalOp::NullishCoalesce => {
                        make_union(self.types, vec![left_ty, right_ty])
                    }
                }
            }
            NodeKind::ConditionalExpression { test, consequent, alternate } => {
                self.check_expr(expr, test, None);
                let cons_ty = self.check_expr(expr, consequent, constraint);
                let alt_ty = self.check_expr(expr, alternate, constraint);
                make_union(self.types, vec![cons_ty, alt_ty])
            }
            NodeKind::AssignmentExpression { op, left, right } => {
                self.check_assignment(expr, op, left, right)
            }

            NodeKind::CallExpression { callee, type_args, arguments } => {
                self.check_call(expr, callee, type_args, &arguments)
            }
            NodeKind::NewExpression { callee, type_args, arguments } => {
                self.check_new(expr, callee, type_args, &arguments)
            }
            NodeKind::MemberExpression { object, property, computed } => {
                self.check_member(expr, object, property, computed)
            }
            NodeKind::SequenceExpression { expressions } => {
                let mut last = self.types.void();
                for e in expressions {
                    last = self.check_expr(expr, e, None);
                }
                last
            }

            NodeKind::FunctionExpression { .. } | NodeKind::ArrowFunction { .. } => {
                let fn_ty = self.function_expr_type(expr, constraint);
                self.check_function_body(expr, fn_ty, None);
                fn_ty
            }
            NodeKind::ClassExpression { .. } => {
                let name = match self.ast.kind(expr) {
                    NodeKind::ClassExpression { id: Some(id), .. } => self.ast.ident_name(*id),
                    _ => None,
                };
                let (class_id, instance, constructor) = self.types.alloc_class(name);
                self.class_nodes.insert(expr, (class_id, instance));
                self.complete_class_decl(expr, class_id, instance);
                self.check_class_members(expr, class_id, instance);
                constructor
            }

            NodeKind::SpreadElement { argument } => {
                self.check_expr(expr, argument, None);
                self.types.any()
            }
            NodeKind::YieldExpression { argument, .. } => {
                if let Some(arg) = argument {
                    self.check_expr(expr, arg, None);
                }
                self.types.any()
            }
            NodeKind::AwaitExpression { argument } => self.check_expr(expr, argument, constraint),
            NodeKind::ImplicitCheckedCast { argument } => {
                if let Some(ty) = self.flow.node_type(expr) {
                    return ty;
                }
                self.check_expr(expr, argument, constraint)
            }
            NodeKind::Elision => self.types.any(),

            _ => {
                let _ = parent;
                self.types.any()
            }
        }
    }

    fn check_identifier(&mut self, expr: NodeId, name: Atom) -> TypeId {
        if self.sem.is_unresolvable(expr) {
            return self.types.any();
        }
        let Some(decl) = self.sem.expr_decl(expr) else {
            return self.types.any();
        };
        if self.sem.decl(decl).generic {
            // A bare reference to a generic has no concrete type; only
            // instantiations do. Call expressions handle their callee
            // before descending here.
            let text = self.ast.names.resolve(name).to_string();
            self.error(
                ERR_MISSING_TYPE_ARGS,
                self.span(expr),
                format!("Generic '{text}' requires type arguments"),
                "missing type arguments",
            );
            return self.types.any();
        }
        self.flow.decl_type(decl).unwrap_or_else(|| self.types.any())
    }

    // ==== Literals ====

    fn check_array_literal(
        &mut self,
        expr: NodeId,
        elements: &[NodeId],
        constraint: Option<TypeId>,
    ) -> TypeId {
        // A declared element type checks each element in place.
        let expected = constraint.and_then(|c| match self.types.kind(c) {
            TypeKind::Array(element) => Some((c, *element)),
            _ => None,
        });
        if let Some((array_ty, element_ty)) = expected {
            for &e in elements {
                match self.ast.kind(e) {
                    NodeKind::Elision => {}
                    NodeKind::SpreadElement { .. } => {
                        self.check_expr(expr, e, None);
                    }
                    _ => {
                        let ty = self.check_expr(expr, e, Some(element_ty));
                        self.coerce(expr, e, ty, element_ty);
                    }
                }
            }
            return array_ty;
        }

        let mut element_tys = Vec::new();
        for &e in elements {
            match self.ast.kind(e) {
                NodeKind::Elision => {}
                NodeKind::SpreadElement { .. } => {
                    self.check_expr(expr, e, None);
                    element_tys.push(self.types.any());
                }
                _ => element_tys.push(self.check_expr(expr, e, None)),
            }
        }
        let element_ty = if element_tys.is_empty() {
            self.types.any()
        } else {
            make_union(self.types, element_tys)
        };
        self.types.alloc(TypeKind::Array(element_ty))
    }

    fn check_object_literal(
        &mut self,
        expr: NodeId,
        properties: &[NodeId],
        constraint: Option<TypeId>,
    ) -> TypeId {
        let expected = constraint.and_then(|c| match self.types.kind(c) {
            TypeKind::ExactObject(fields) => Some((c, fields.clone())),
            _ => None,
        });
        if let Some((object_ty, fields)) = expected {
            for &p in properties {
                let (key, value, computed) = match self.ast.kind(p) {
                    NodeKind::Property { key, value, computed } => (*key, *value, *computed),
                    _ => continue,
                };
                let name = if computed { None } else { self.ast.ident_name(key) };
                let field_ty = name.and_then(|n| {
                    fields.iter().find(|f| f.name == n).map(|f| f.ty)
                });
                match field_ty {
                    Some(field_ty) => {
                        self.flow.set_node_type(key, field_ty);
                        let ty = self.check_expr(p, value, Some(field_ty));
                        self.coerce(p, value, ty, field_ty);
                    }
                    None => {
                        if let Some(n) = name {
                            let text = self.ast.names.resolve(n).to_string();
                            let object_text = self.display_ty(object_ty);
                            self.error(
                                ERR_UNKNOWN_MEMBER,
                                self.span(key),
                                format!("Property '{text}' does not exist on '{object_text}'"),
                                "unknown property",
                            );
                        }
                        self.check_expr(p, value, None);
                    }
                }
            }
            return object_ty;
        }

        let mut inferred: Vec<ObjectField> = Vec::new();
        let mut exact = true;
        for &p in properties {
            let (key, value, computed) = match self.ast.kind(p) {
                NodeKind::Property { key, value, computed } => (*key, *value, *computed),
                _ => {
                    // Spread makes the shape unknowable.
                    self.check_expr(expr, p, None);
                    exact = false;
                    continue;
                }
            };
            let value_ty = self.check_expr(p, value, None);
            match (computed, self.ast.ident_name(key)) {
                (false, Some(name)) => inferred.push(ObjectField { name, ty: value_ty }),
                _ => {
                    self.check_expr(p, key, None);
                    exact = false;
                }
            }
        }
        if exact {
            self.types.alloc(TypeKind::ExactObject(inferred))
        } else {
            self.types.any()
        }
    }

    // ==== Operators ====

    fn check_numeric_operand(&mut self, node: NodeId, ty: TypeId, op: &str) {
        if !matches!(
            self.types.kind(ty),
            TypeKind::Number | TypeKind::BigInt | TypeKind::Any
        ) {
            let text = self.display_ty(ty);
            self.error(
                ERR_BAD_OPERAND,
                self.span(node),
                format!("Operator '{op}' cannot be applied to type '{text}'"),
                "invalid operand",
            );
        }
    }

    fn check_binary(
        &mut self,
        expr: NodeId,
        op: BinaryOp,
        left: NodeId,
        left_ty: TypeId,
        right: NodeId,
        right_ty: TypeId,
    ) -> TypeId {
        let _ = expr;
        if op.is_equality() || matches!(op, BinaryOp::In | BinaryOp::Instanceof) {
            return self.types.boolean();
        }
        if op.is_relational() {
            for (node, ty) in [(left, left_ty), (right, right_ty)] {
                if !matches!(
                    self.types.kind(ty),
                    TypeKind::Number | TypeKind::BigInt | TypeKind::String | TypeKind::Any
                ) {
                    let text = self.display_ty(ty);
                    self.error(
                        ERR_BAD_OPERAND,
                        self.span(node),
                        format!(
                            "Operator '{}' cannot be applied to type '{text}'",
                            op.as_str()
                        ),
                        "invalid operand",
                    );
                }
            }
            return self.types.boolean();
        }
        if op == BinaryOp::Add {
            // `+` concatenates when either side is a string.
            let left_kind = self.types.kind(left_ty).clone();
            let right_kind = self.types.kind(right_ty).clone();
            if matches!(left_kind, TypeKind::String) || matches!(right_kind, TypeKind::String) {
                return self.types.string();
            }
            if matches!(left_kind, TypeKind::Any) || matches!(right_kind, TypeKind::Any) {
                return self.types.any();
            }
        }
        self.check_numeric_operand(left, left_ty, op.as_str());
        self.check_numeric_operand(right, right_ty, op.as_str());
        if matches!(self.types.kind(left_ty), TypeKind::BigInt)
            && matches!(self.types.kind(right_ty), TypeKind::BigInt)
        {
            self.types.bigint()
        } else {
            self.types.number()
        }
    }

    fn check_assignment(
        &mut self,
        expr: NodeId,
        op: veld_ast::AssignOp,
        left: NodeId,
        right: NodeId,
    ) -> TypeId {
        let target_ty = self.assignment_target_type(expr, left);
        match op.binary_op() {
            None => {
                let right_ty = self.check_expr(expr, right, Some(target_ty));
                self.coerce(expr, right, right_ty, target_ty);
            }
            Some(bin) => {
                let right_ty = self.check_expr(expr, right, None);
                let result = self.check_binary(expr, bin, left, target_ty, right, right_ty);
                // The combined value is written back into the target.
                self.require_flow(expr, result, target_ty);
            }
        }
        target_ty
    }

    /// Type of an assignment target; assigning to an untyped target fixes
    /// its type as `any`.
    fn assignment_target_type(&mut self, expr: NodeId, left: NodeId) -> TypeId {
        match self.ast.kind(left) {
            NodeKind::Identifier { .. } => {
                let ty = match self.sem.expr_decl(left) {
                    Some(decl) => match self.flow.decl_type(decl) {
                        Some(ty) => ty,
                        None => {
                            let any = self.types.any();
                            self.flow.set_decl_type(decl, any);
                            any
                        }
                    },
                    None => self.types.any(),
                };
                self.flow.set_node_type(left, ty);
                ty
            }
            NodeKind::MemberExpression { .. } => self.check_expr(expr, left, None),
            // Destructuring assignment targets are unchecked.
            _ => {
                self.check_expr(expr, left, None);
                self.types.any()
            }
        }
    }

    // ==== Calls ====

    fn check_call(
        &mut self,
        expr: NodeId,
        callee: NodeId,
        type_args: Option<NodeId>,
        arguments: &[NodeId],
    ) -> TypeId {
        // A call to a generic function instantiates it first.
        if let Some(generic) = self.callee_generic(callee) {
            let Some(args_node) = type_args else {
                let text = self.ast.ident_str(callee).to_string();
                self.error(
                    ERR_MISSING_TYPE_ARGS,
                    self.span(callee),
                    format!("Generic '{text}' requires type arguments"),
                    "missing type arguments",
                );
                self.check_args_unchecked(expr, arguments);
                return self.types.any();
            };
            let args = self.resolve_type_args(args_node);
            let fn_ty = self.instantiate_generic(generic, args, expr);
            self.flow.set_node_type(callee, fn_ty);
            return self.check_call_to(expr, callee, fn_ty, arguments);
        }

        let callee_ty = self.check_expr(expr, callee, None);
        let result = self.check_call_to(expr, callee, callee_ty, arguments);
        // A method call must receive a compatible `this`.
        if let NodeKind::MemberExpression { object, computed: false, .. } = self.ast.kind(callee) {
            let object = *object;
            let this_ty = match self.types.kind(callee_ty) {
                TypeKind::Function(f) => f.this_ty,
                _ => None,
            };
            if let (Some(this_ty), Some(receiver_ty)) = (this_ty, self.flow.node_type(object)) {
                self.require_flow(object, receiver_ty, this_ty);
            }
        }
        result
    }

    fn check_call_to(
        &mut self,
        expr: NodeId,
        callee: NodeId,
        callee_ty: TypeId,
        arguments: &[NodeId],
    ) -> TypeId {
        let kind = self.types.kind(callee_ty).clone();
        match kind {
            TypeKind::Function(sig) => {
                self.check_call_args(expr, &sig, arguments);
                sig.return_type
            }
            TypeKind::UntypedFunction | TypeKind::Any => {
                self.check_args_unchecked(expr, arguments);
                self.types.any()
            }
            TypeKind::ClassConstructor(class_id) => {
                self.check_args_unchecked(expr, arguments);
                let name = self.class_display_name(class_id);
                self.error(
                    ERR_CLASS_NEEDS_NEW,
                    self.span(callee),
                    format!("Class '{name}' must be invoked with 'new'"),
                    "missing 'new'",
                );
                self.types.any()
            }
            _ => {
                self.check_args_unchecked(expr, arguments);
                let text = self.display_ty(callee_ty);
                self.error(
                    ERR_NOT_CALLABLE,
                    self.span(callee),
                    format!("Type '{text}' is not callable"),
                    "not callable",
                );
                self.types.any()
            }
        }
    }

    fn check_call_args(&mut self, expr: NodeId, sig: &FunctionType, arguments: &[NodeId]) {
        if arguments.len() != sig.params.len() {
            self.error(
                ERR_ARG_COUNT,
                self.span(expr),
                format!(
                    "Expected {} argument(s), found {}",
                    sig.params.len(),
                    arguments.len()
                ),
                "wrong argument count",
            );
        }
        let any = self.types.any();
        for (i, &arg) in arguments.iter().enumerate() {
            let expected = sig.params.get(i).map(|p| p.ty).unwrap_or(any);
            let arg_ty = self.check_expr(expr, arg, Some(expected));
            self.coerce(expr, arg, arg_ty, expected);
        }
    }

    fn check_args_unchecked(&mut self, expr: NodeId, arguments: &[NodeId]) {
        for &arg in arguments {
            self.check_expr(expr, arg, None);
        }
    }

    fn check_new(
        &mut self,
        expr: NodeId,
        callee: NodeId,
        type_args: Option<NodeId>,
        arguments: &[NodeId],
    ) -> TypeId {
        // `new` on a generic class instantiates it first.
        if let Some(generic) = self.callee_generic(callee) {
            let Some(args_node) = type_args else {
                let text = self.ast.ident_str(callee).to_string();
                self.error(
                    ERR_MISSING_TYPE_ARGS,
                    self.span(callee),
                    format!("Generic '{text}' requires type arguments"),
                    "missing type arguments",
                );
                self.check_args_unchecked(expr, arguments);
                return self.types.any();
            };
            let args = self.resolve_type_args(args_node);
            let instance = self.instantiate_generic(generic, args, expr);
            if let TypeKind::Class(class_id) = self.types.kind(instance) {
                let class_id = *class_id;
                self.check_constructor_args(expr, class_id, arguments);
            } else {
                self.check_args_unchecked(expr, arguments);
            }
            return instance;
        }

        let callee_ty = self.check_expr(expr, callee, None);
        let kind = self.types.kind(callee_ty).clone();
        match kind {
            TypeKind::ClassConstructor(class_id) => {
                self.check_constructor_args(expr, class_id, arguments);
                self.types.alloc(TypeKind::Class(class_id))
            }
            TypeKind::Any | TypeKind::UntypedFunction | TypeKind::Function(_) => {
                self.check_args_unchecked(expr, arguments);
                self.types.any()
            }
            _ => {
                self.check_args_unchecked(expr, arguments);
                let text = self.display_ty(callee_ty);
                self.error(
                    ERR_NOT_CALLABLE,
                    self.span(callee),
                    format!("Type '{text}' is not constructible"),
                    "not constructible",
                );
                self.types.any()
            }
        }
    }

    fn check_constructor_args(&mut self, expr: NodeId, class_id: ClassId, arguments: &[NodeId]) {
        let constructor = self.types.class(class_id).constructor;
        match constructor.map(|c| self.types.kind(c).clone()) {
            Some(TypeKind::Function(sig)) => self.check_call_args(expr, &sig, arguments),
            // Without a declared constructor arguments are unchecked.
            _ => self.check_args_unchecked(expr, arguments),
        }
    }

    /// The generic registry entry of a plain identifier callee, if any.
    fn callee_generic(&self, callee: NodeId) -> Option<crate::generics::GenericId> {
        if !matches!(self.ast.kind(callee), NodeKind::Identifier { .. }) {
            return None;
        }
        let decl = self.sem.expr_decl(callee)?;
        self.generics.by_decl(decl)
    }

    // ==== Member access ====

    fn check_member(
        &mut self,
        expr: NodeId,
        object: NodeId,
        property: NodeId,
        computed: bool,
    ) -> TypeId {
        let object_ty = self.check_expr(expr, object, None);
        if computed {
            let index_ty = self.check_expr(expr, property, None);
            return self.check_indexed(object, object_ty, property, index_ty);
        }
        let Some(name) = self.ast.ident_name(property) else {
            return self.types.any();
        };
        let object_kind = self.types.kind(object_ty).clone();
        match object_kind {
            TypeKind::Class(class_id) => {
                match self.find_instance_member(class_id, name) {
                    Some(member) => member.ty,
                    None => self.unknown_member(property, object_ty, name),
                }
            }
            TypeKind::ClassConstructor(class_id) => {
                match self.find_static_member(class_id, name) {
                    Some(member) => member.ty,
                    None => self.unknown_member(property, object_ty, name),
                }
            }
            TypeKind::ExactObject(fields) => {
                match fields.iter().find(|f| f.name == name) {
                    Some(field) => field.ty,
                    None => self.unknown_member(property, object_ty, name),
                }
            }
            TypeKind::Array(_) | TypeKind::String | TypeKind::Tuple(_) => {
                if self.ast.names.resolve(name) == "length" {
                    self.types.number()
                } else {
                    // Built-in members are untyped.
                    self.types.any()
                }
            }
            _ => self.types.any(),
        }
    }

    fn check_indexed(
        &mut self,
        object: NodeId,
        object_ty: TypeId,
        property: NodeId,
        index_ty: TypeId,
    ) -> TypeId {
        let _ = object;
        let object_kind = self.types.kind(object_ty).clone();
        match object_kind {
            TypeKind::Array(element) => {
                self.check_numeric_operand(property, index_ty, "[]");
                element
            }
            TypeKind::Tuple(t) => {
                // A constant index selects one element; otherwise any
                // element may come back.
                if let NodeKind::NumberLiteral { value } = self.ast.kind(property) {
                    let index = *value;
                    if index.fract() == 0.0 && index >= 0.0 && (index as usize) < t.elements.len()
                    {
                        return t.elements[index as usize];
                    }
                }
                make_union(self.types, t.elements.clone())
            }
            TypeKind::String => self.types.string(),
            _ => self.types.any(),
        }
    }

    fn find_instance_member(&self, class_id: ClassId, name: Atom) -> Option<ClassMember> {
        self.types
            .class(class_id)
            .find_member(self.types, name)
            .cloned()
    }

    fn find_static_member(&self, class_id: ClassId, name: Atom) -> Option<ClassMember> {
        let mut current = class_id;
        loop {
            let info = self.types.class(current);
            if let Some(m) = info.members.iter().find(|m| m.name == name && m.is_static) {
                return Some(m.clone());
            }
            match info.super_class.map(|t| self.types.kind(t)) {
                Some(TypeKind::Class(parent)) => current = *parent,
                _ => return None,
            }
        }
    }

    fn unknown_member(&mut self, property: NodeId, object_ty: TypeId, name: Atom) -> TypeId {
        let text = self.ast.names.resolve(name).to_string();
        let object_text = self.display_ty(object_ty);
        self.error(
            ERR_UNKNOWN_MEMBER,
            self.span(property),
            format!("Property '{text}' does not exist on '{object_text}'"),
            "unknown property",
        );
        self.types.any()
    }

    fn class_display_name(&self, class_id: ClassId) -> String {
        match self.types.class(class_id).name {
            Some(name) => self.ast.names.resolve(name).to_string(),
            None => "<anonymous>".to_string(),
        }
    }

    // ==== Function expressions ====

    /// Signature of a function-valued expression. Unannotated parameter and
    /// return slots adopt the context's expectation when it is a function
    /// type of the same arity.
    fn function_expr_type(&mut self, expr: NodeId, constraint: Option<TypeId>) -> TypeId {
        let own = self.function_type_of(expr);
        let Some(constraint) = constraint else { return own };
        let expected = match self.types.kind(constraint) {
            TypeKind::Function(f) => f.clone(),
            _ => return own,
        };
        if matches!(self.types.kind(own), TypeKind::UntypedFunction) {
            // An unannotated function adopts the expected signature
            // wholesale when the arity lines up.
            let arity = self.ast.function_params(expr).map(|p| p.len()).unwrap_or(0);
            if arity == expected.params.len() {
                return constraint;
            }
            return own;
        }
        let mut sig = match self.types.kind(own) {
            TypeKind::Function(f) => f.clone(),
            _ => return own,
        };
        if sig.params.len() != expected.params.len() {
            return own;
        }
        let any = self.types.any();
        let mut adopted = false;
        for (param, expected_param) in sig.params.iter_mut().zip(&expected.params) {
            if param.ty == any && expected_param.ty != any {
                param.ty = expected_param.ty;
                adopted = true;
            }
        }
        if sig.return_type == any && expected.return_type != any {
            sig.return_type = expected.return_type;
            adopted = true;
        }
        if adopted {
            self.types.alloc(TypeKind::Function(sig))
        } else {
            own
        }
    }
}
