//! Generic declarations and their specializations
//!
//! A generic function, class, or type alias is not checked where it is
//! declared; it is recorded as a template together with a handle to the
//! type scope that was active at its declaration site. Each distinct
//! argument list later produces one specialization. Function and class
//! specializations clone the declaration subtree next to the template so
//! the clone can be checked like ordinary code, with the type parameters
//! bound to the arguments; alias specializations only resolve the alias
//! body under that binding. Specializations are memoized by structural
//! equality of their argument lists, and their bodies are checked from the
//! deferred queue after the main walk, since checking one body can demand
//! further specializations.

use rustc_hash::FxHashMap;
use veld_ast::{clone_subtree, Atom, NodeId, NodeKind};
use veld_sema::{DeclId, ScopePtr};
use veld_types::{equals, TypeError, TypeId, TypeKind};

use crate::check::{DeferredCheck, FlowChecker, TypeBinding, ERR_TYPE_ARG_COUNT};

/// Identifies one registered generic declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GenericKind {
    Function,
    Class,
    Alias,
}

pub(crate) struct Specialization {
    pub(crate) args: Vec<TypeId>,
    /// Function type, class instance type, or alias type of the
    /// specialization.
    pub(crate) ty: TypeId,
}

pub(crate) struct GenericTemplate {
    /// The declaration statement.
    pub(crate) node: NodeId,
    /// The statement-list node holding the declaration; clones are
    /// inserted into it right after the template.
    pub(crate) owner: NodeId,
    pub(crate) kind: GenericKind,
    pub(crate) type_params: Vec<Atom>,
    /// Type scope active at the declaration site.
    pub(crate) captured_scope: Option<ScopePtr>,
    pub(crate) specializations: Vec<Specialization>,
}

#[derive(Default)]
pub struct GenericRegistry {
    templates: Vec<GenericTemplate>,
    by_decl: FxHashMap<DeclId, GenericId>,
}

impl GenericRegistry {
    pub(crate) fn new() -> Self {
        GenericRegistry::default()
    }

    pub(crate) fn register(&mut self, template: GenericTemplate) -> GenericId {
        let id = GenericId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    pub(crate) fn template(&self, id: GenericId) -> &GenericTemplate {
        &self.templates[id.0 as usize]
    }

    pub(crate) fn map_decl(&mut self, decl: DeclId, id: GenericId) {
        self.by_decl.insert(decl, id);
    }

    /// The generic a value declaration refers to, if it is one.
    pub(crate) fn by_decl(&self, decl: DeclId) -> Option<GenericId> {
        self.by_decl.get(&decl).copied()
    }

    pub(crate) fn add_specialization(&mut self, id: GenericId, args: Vec<TypeId>, ty: TypeId) {
        self.templates[id.0 as usize]
            .specializations
            .push(Specialization { args, ty });
    }
}

impl FlowChecker<'_> {
    // ==== Registration ====

    pub(crate) fn register_generic_function(&mut self, stmt: NodeId, owner: NodeId) -> GenericId {
        let id_node = match self.ast.kind(stmt) {
            NodeKind::FunctionDeclaration { id, .. } => Some(*id),
            _ => None,
        };
        let generic = self.register_template(stmt, owner, GenericKind::Function);
        if let Some(decl) = id_node.and_then(|id| self.sem.ident_decl(id)) {
            self.generics.map_decl(decl, generic);
        }
        generic
    }

    pub(crate) fn register_generic_class(&mut self, stmt: NodeId, owner: NodeId) -> GenericId {
        let id_node = match self.ast.kind(stmt) {
            NodeKind::ClassDeclaration { id, .. } => Some(*id),
            _ => None,
        };
        let generic = self.register_template(stmt, owner, GenericKind::Class);
        if let Some(decl) = id_node.and_then(|id| self.sem.ident_decl(id)) {
            self.generics.map_decl(decl, generic);
        }
        generic
    }

    pub(crate) fn register_generic_alias(&mut self, stmt: NodeId, owner: NodeId) -> GenericId {
        self.register_template(stmt, owner, GenericKind::Alias)
    }

    fn register_template(&mut self, stmt: NodeId, owner: NodeId, kind: GenericKind) -> GenericId {
        let type_params = self.type_param_names(stmt);
        self.generics.register(GenericTemplate {
            node: stmt,
            owner,
            kind,
            type_params,
            captured_scope: self.type_scope.current_scope(),
            specializations: Vec::new(),
        })
    }

    fn type_param_names(&self, stmt: NodeId) -> Vec<Atom> {
        let params_node = match self.ast.kind(stmt) {
            NodeKind::FunctionDeclaration { type_params, .. }
            | NodeKind::ClassDeclaration { type_params, .. }
            | NodeKind::TypeAliasDeclaration { type_params, .. } => *type_params,
            _ => None,
        };
        let Some(params_node) = params_node else { return Vec::new() };
        let params = match self.ast.kind(params_node) {
            NodeKind::TypeParams { params } => params.clone(),
            _ => return Vec::new(),
        };
        params
            .iter()
            .filter_map(|&p| match self.ast.kind(p) {
                NodeKind::TypeParam { name } => self.ast.ident_name(*name),
                _ => None,
            })
            .collect()
    }

    // ==== Instantiation ====

    /// The specialization of `generic` for `args`, creating it on first
    /// use. For classes the result is the instance type, for functions the
    /// signature, for aliases the aliased type.
    pub(crate) fn instantiate_generic(
        &mut self,
        generic: GenericId,
        args: Vec<TypeId>,
        at: NodeId,
    ) -> TypeId {
        let expected = self.generics.template(generic).type_params.len();
        if args.len() != expected {
            self.error(
                ERR_TYPE_ARG_COUNT,
                self.span(at),
                TypeError::TypeArgCountMismatch { expected, actual: args.len() }.to_string(),
                "wrong number of type arguments",
            );
            return self.types.any();
        }
        if let Some(ty) = self.find_specialization(generic, &args) {
            return ty;
        }
        match self.generics.template(generic).kind {
            GenericKind::Alias => self.specialize_alias(generic, args),
            GenericKind::Class => self.specialize_class(generic, args),
            GenericKind::Function => self.specialize_function(generic, args),
        }
    }

    fn find_specialization(&self, generic: GenericId, args: &[TypeId]) -> Option<TypeId> {
        self.generics
            .template(generic)
            .specializations
            .iter()
            .find(|s| {
                s.args.len() == args.len()
                    && s.args.iter().zip(args).all(|(&a, &b)| equals(self.types, a, b))
            })
            .map(|s| s.ty)
    }

    fn bind_type_params(&mut self, params: &[Atom], args: &[TypeId]) {
        for (&param, &arg) in params.iter().zip(args) {
            self.type_scope.insert(param, TypeBinding::Ty(arg));
        }
    }

    /// Resolve an alias body under a type-parameter binding. The result
    /// slot is memoized before the body resolves so a self-referential
    /// alias instantiation closes back on its own slot.
    fn specialize_alias(&mut self, generic: GenericId, args: Vec<TypeId>) -> TypeId {
        let template = self.generics.template(generic);
        let (node, captured, params) =
            (template.node, template.captured_scope, template.type_params.clone());
        let right = match self.ast.kind(node) {
            NodeKind::TypeAliasDeclaration { right, .. } => *right,
            _ => return self.types.any(),
        };

        let slot = self.types.forward_declare();
        self.generics.add_specialization(generic, args.clone(), slot);

        let previous = self.type_scope.activate(captured);
        self.type_scope.push_scope();
        self.bind_type_params(&params, &args);
        let body = self.resolve_annotation(right);
        self.type_scope.pop_scope();
        self.type_scope.activate(previous);

        if body == slot || !self.types.is_resolved(body) {
            // The body is the slot itself with no constructor in between.
            let id = match self.ast.kind(node) {
                NodeKind::TypeAliasDeclaration { id, .. } => *id,
                _ => node,
            };
            let name = self.ast.ident_str(id).to_string();
            self.error(
                crate::check::ERR_CIRCULAR_ALIAS,
                self.span(node),
                TypeError::CircularAlias { name }.to_string(),
                "circular alias",
            );
            if !self.types.is_resolved(slot) {
                self.types.resolve_forward(slot, TypeKind::Any);
            }
        } else if !self.types.is_resolved(slot) {
            let kind = self.types.kind(body).clone();
            self.types.resolve_forward(slot, kind);
        }
        slot
    }

    /// Clone a generic class declaration and complete the clone's class
    /// record with the type parameters bound. The body is checked from the
    /// deferred queue.
    fn specialize_class(&mut self, generic: GenericId, args: Vec<TypeId>) -> TypeId {
        let template = self.generics.template(generic);
        let (node, owner, captured, params) = (
            template.node,
            template.owner,
            template.captured_scope,
            template.type_params.clone(),
        );
        let clone = self.clone_template(node, owner);

        let name = match self.ast.kind(clone) {
            NodeKind::ClassDeclaration { id, .. } => self.ast.ident_name(*id),
            _ => None,
        };
        let (class_id, instance, constructor) = self.types.alloc_class(name);
        self.generics.add_specialization(generic, args.clone(), instance);
        self.class_nodes.insert(clone, (class_id, instance));
        if let Some(decl) = self.clone_ident_decl(clone) {
            self.flow.set_decl_type(decl, constructor);
        }

        let previous = self.type_scope.activate(captured);
        self.type_scope.push_scope();
        self.bind_type_params(&params, &args);
        let param_scope = self.type_scope.current_scope();
        self.complete_class_decl(clone, class_id, instance);
        self.type_scope.pop_scope();
        self.type_scope.activate(previous);

        self.deferred.push_back(DeferredCheck::ClassBody {
            node: clone,
            class_id,
            instance,
            type_scope: param_scope,
        });
        instance
    }

    /// Clone a generic function declaration and compute the clone's
    /// signature with the type parameters bound. The body is checked from
    /// the deferred queue.
    fn specialize_function(&mut self, generic: GenericId, args: Vec<TypeId>) -> TypeId {
        let template = self.generics.template(generic);
        let (node, owner, captured, params) = (
            template.node,
            template.owner,
            template.captured_scope,
            template.type_params.clone(),
        );
        let clone = self.clone_template(node, owner);

        let previous = self.type_scope.activate(captured);
        self.type_scope.push_scope();
        self.bind_type_params(&params, &args);
        let param_scope = self.type_scope.current_scope();
        let fn_ty = self.function_type_of(clone);
        self.type_scope.pop_scope();
        self.type_scope.activate(previous);

        self.generics.add_specialization(generic, args, fn_ty);
        self.flow.set_node_type(clone, fn_ty);
        if let Some(decl) = self.clone_ident_decl(clone) {
            self.flow.set_decl_type(decl, fn_ty);
        }

        self.deferred.push_back(DeferredCheck::FunctionBody {
            node: clone,
            fn_ty,
            type_scope: param_scope,
        });
        fn_ty
    }

    /// Clone a template declaration as its next sibling, carrying semantic
    /// records over and giving declarations inside the clone fresh
    /// identities so the specialization's types do not collide with the
    /// template's.
    fn clone_template(&mut self, node: NodeId, owner: NodeId) -> NodeId {
        let (clone, node_map) = clone_subtree(self.ast, node);
        self.sem.clone_node_info(&node_map);
        self.remap_cloned_decls(&node_map);
        self.ast.insert_stmt_after(owner, node, clone);
        clone
    }

    fn clone_ident_decl(&self, clone: NodeId) -> Option<DeclId> {
        let id = match self.ast.kind(clone) {
            NodeKind::FunctionDeclaration { id, .. } | NodeKind::ClassDeclaration { id, .. } => {
                *id
            }
            _ => return None,
        };
        self.sem.ident_decl(id)
    }

    /// Declarations whose declaring identifier lies inside the cloned
    /// subtree get fresh [`DeclId`]s; references to outer declarations stay
    /// shared with the template.
    fn remap_cloned_decls(&mut self, node_map: &FxHashMap<NodeId, NodeId>) {
        let mut decl_map: FxHashMap<DeclId, DeclId> = FxHashMap::default();
        for (&old, &new) in node_map {
            let Some(decl) = self.sem.ident_decl(old) else { continue };
            if decl_map.contains_key(&decl) {
                continue;
            }
            let original = self.sem.decl(decl).clone();
            let fresh = self.sem.new_decl_special(
                original.name,
                original.kind,
                original.scope,
                original.special,
                Some(new),
            );
            if original.generic {
                self.sem.decl_mut(fresh).generic = true;
            }
            // A recursive reference to the generic itself must still find
            // its registry entry through the fresh declaration.
            if let Some(generic) = self.generics.by_decl(decl) {
                self.generics.map_decl(fresh, generic);
            }
            decl_map.insert(decl, fresh);
        }
        for &new in node_map.values() {
            if let Some(decl) = self.sem.ident_decl(new) {
                if let Some(&fresh) = decl_map.get(&decl) {
                    self.sem.set_ident_decl(new, fresh);
                }
            }
            if let Some(decl) = self.sem.expr_decl(new) {
                if let Some(&fresh) = decl_map.get(&decl) {
                    self.sem.set_expr_decl(new, fresh);
                }
            }
        }
    }
}
