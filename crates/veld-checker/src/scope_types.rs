//! Per-scope type declaration resolution
//!
//! Classes, aliases, and generics in one scope may reference each other in
//! any order, including recursively, so resolution runs in three phases:
//!
//! 1. Forward declare: every class gets an empty nominal type, every
//!    non-generic alias an empty slot, every generic a registry entry; all
//!    names are bound immediately so later declarations resolve forward.
//! 2. Resolve aliases: each alias's right-hand annotation is resolved.
//!    Bare alias-to-alias chains are followed through the batch; a chain
//!    that returns to an alias already being followed has no constructor to
//!    anchor it and is a circularity error. Top-level unions are queued
//!    rather than canonicalized, because recursive arms cannot be sorted
//!    before the cycle structure is known.
//! 3. Complete: a reachability pass over the forward graph marks looping
//!    types, queued unions are canonicalized, and class bodies are parsed
//!    into member lists.

use rustc_hash::{FxHashMap, FxHashSet};
use veld_ast::{Atom, MethodKind, NodeId, NodeKind};
use veld_types::{
    make_union, ClassId, ClassMember, FunctionType, TypeError, TypeId, TypeKind, TypeTable,
};

use crate::check::{
    FlowChecker, TypeBinding, ERR_BAD_SUPERCLASS, ERR_CIRCULAR_ALIAS, ERR_DUP_TYPE_NAME,
};

#[derive(Clone, Copy, PartialEq)]
enum AliasState {
    Pending,
    InProgress,
    Done,
}

struct AliasEntry {
    stmt: NodeId,
    name: Atom,
    fwd: TypeId,
    right: NodeId,
    state: AliasState,
}

struct AliasBatch {
    entries: Vec<AliasEntry>,
    by_fwd: FxHashMap<TypeId, usize>,
    /// Unions whose slot is filled only after looping arms are known.
    pending_unions: Vec<(TypeId, Vec<TypeId>)>,
}

impl FlowChecker<'_> {
    /// Resolve the type declarations of one scope's statement list.
    pub(crate) fn declare_scope_types(&mut self, owner: NodeId, stmts: &[NodeId]) {
        let mut batch = AliasBatch {
            entries: Vec::new(),
            by_fwd: FxHashMap::default(),
            pending_unions: Vec::new(),
        };
        let mut classes: Vec<(NodeId, ClassId, TypeId)> = Vec::new();
        let mut declared: FxHashSet<Atom> = FxHashSet::default();

        // ---- Phase 1: forward declare ----
        for &stmt in stmts {
            let kind = self.ast.kind(stmt).clone();
            match kind {
                NodeKind::TypeAliasDeclaration { id, type_params, right } => {
                    let Some(name) = self.ast.ident_name(id) else { continue };
                    if !declared.insert(name) {
                        self.report_duplicate_type(id, name);
                        continue;
                    }
                    if type_params.is_some() {
                        let generic = self.register_generic_alias(stmt, owner);
                        self.type_scope.insert(name, TypeBinding::Generic(generic));
                    } else {
                        let fwd = self.types.forward_declare();
                        self.type_scope.insert(name, TypeBinding::Ty(fwd));
                        batch.by_fwd.insert(fwd, batch.entries.len());
                        batch.entries.push(AliasEntry {
                            stmt,
                            name,
                            fwd,
                            right,
                            state: AliasState::Pending,
                        });
                    }
                }
                NodeKind::ClassDeclaration { id, type_params, .. } => {
                    let Some(name) = self.ast.ident_name(id) else { continue };
                    if !declared.insert(name) {
                        self.report_duplicate_type(id, name);
                        continue;
                    }
                    if type_params.is_some() {
                        if let Some(decl) = self.sem.ident_decl(id) {
                            self.sem.decl_mut(decl).generic = true;
                        }
                        let generic = self.register_generic_class(stmt, owner);
                        self.type_scope.insert(name, TypeBinding::Generic(generic));
                    } else {
                        let (cid, instance, constructor) = self.types.alloc_class(Some(name));
                        self.type_scope.insert(name, TypeBinding::Ty(instance));
                        self.class_nodes.insert(stmt, (cid, instance));
                        if let Some(decl) = self.sem.ident_decl(id) {
                            self.flow.set_decl_type(decl, constructor);
                        }
                        classes.push((stmt, cid, instance));
                    }
                }
                _ => {}
            }
        }

        // ---- Phase 2: resolve alias bodies ----
        for i in 0..batch.entries.len() {
            self.process_alias(&mut batch, i);
        }

        // ---- Phase 3: complete ----
        find_looping(self.types, &batch.pending_unions);
        for (fwd, arms) in std::mem::take(&mut batch.pending_unions) {
            let union_ty = make_union(self.types, arms);
            if !self.types.is_resolved(fwd) {
                let kind = self.types.kind(union_ty).clone();
                self.types.resolve_forward(fwd, kind);
            }
        }
        for (stmt, cid, instance) in classes {
            self.complete_class_decl(stmt, cid, instance);
        }
    }

    fn report_duplicate_type(&mut self, id: NodeId, name: Atom) {
        let text = self.ast.names.resolve(name).to_string();
        self.error(
            ERR_DUP_TYPE_NAME,
            self.span(id),
            format!("Type '{text}' has already been declared in this scope"),
            "duplicate type name",
        );
    }

    fn process_alias(&mut self, batch: &mut AliasBatch, index: usize) {
        match batch.entries[index].state {
            AliasState::Done => return,
            AliasState::InProgress => {
                // A chain of bare aliases closed on itself.
                let name = batch.entries[index].name;
                let fwd = batch.entries[index].fwd;
                let stmt = batch.entries[index].stmt;
                let text = self.ast.names.resolve(name).to_string();
                self.error(
                    ERR_CIRCULAR_ALIAS,
                    self.span(stmt),
                    TypeError::CircularAlias { name: text }.to_string(),
                    "circular alias",
                );
                if !self.types.is_resolved(fwd) {
                    self.types.resolve_forward(fwd, TypeKind::Any);
                }
                batch.entries[index].state = AliasState::Done;
                return;
            }
            AliasState::Pending => {}
        }
        batch.entries[index].state = AliasState::InProgress;
        let fwd = batch.entries[index].fwd;
        let right = batch.entries[index].right;

        let rhs = self.ast.kind(right).clone();
        match rhs {
            // A bare reference to another type name: follow the chain so a
            // pure alias cycle is caught, then share the target's payload.
            NodeKind::NamedAnnotation { id, type_args: None } => {
                let target = self
                    .ast
                    .ident_name(id)
                    .and_then(|name| self.type_scope.lookup(name).copied());
                match target {
                    Some(TypeBinding::Ty(target_ty)) => {
                        if let Some(&j) = batch.by_fwd.get(&target_ty) {
                            self.process_alias(batch, j);
                        }
                        if self.types.is_resolved(target_ty) {
                            if !self.types.is_resolved(fwd) {
                                let kind = self.types.kind(target_ty).clone();
                                self.types.resolve_forward(fwd, kind);
                            }
                        } else if let Some(arms) = batch
                            .pending_unions
                            .iter()
                            .find(|(u, _)| *u == target_ty)
                            .map(|(_, arms)| arms.clone())
                        {
                            // The target is itself a queued union; this
                            // alias becomes the same union.
                            batch.pending_unions.push((fwd, arms));
                        } else if !self.types.is_resolved(fwd) {
                            self.types.resolve_forward(fwd, TypeKind::Any);
                        }
                    }
                    _ => {
                        // Generic or undefined: the general resolver
                        // reports and substitutes as needed.
                        let ty = self.resolve_annotation(right);
                        if !self.types.is_resolved(fwd) {
                            let kind = self.types.kind(ty).clone();
                            self.types.resolve_forward(fwd, kind);
                        }
                    }
                }
            }
            NodeKind::UnionAnnotation { members } => {
                let arms: Vec<TypeId> =
                    members.iter().map(|&m| self.resolve_annotation(m)).collect();
                batch.pending_unions.push((fwd, arms));
            }
            NodeKind::NullableAnnotation { inner } => {
                let inner_ty = self.resolve_annotation(inner);
                let arms = vec![self.types.void(), self.types.null(), inner_ty];
                batch.pending_unions.push((fwd, arms));
            }
            _ => {
                let ty = self.resolve_annotation(right);
                if !self.types.is_resolved(fwd) {
                    let kind = self.types.kind(ty).clone();
                    self.types.resolve_forward(fwd, kind);
                }
            }
        }
        if batch.entries[index].state == AliasState::InProgress {
            batch.entries[index].state = AliasState::Done;
        }
    }

    // ==== Class completion ====

    /// Parse a class declaration's body into the class record: superclass,
    /// member and constructor signatures. Bodies are only checked later.
    pub(crate) fn complete_class_decl(&mut self, node: NodeId, cid: ClassId, instance: TypeId) {
        let (super_class, super_type_args, body) = match self.ast.kind(node) {
            NodeKind::ClassDeclaration { super_class, super_type_args, body, .. }
            | NodeKind::ClassExpression { super_class, super_type_args, body, .. } => {
                (*super_class, *super_type_args, *body)
            }
            _ => return,
        };

        let super_ty = super_class.and_then(|sc| self.resolve_superclass(sc, super_type_args));

        let members = match self.ast.kind(body) {
            NodeKind::ClassBody { members } => members.clone(),
            _ => Vec::new(),
        };
        let mut class_members: Vec<ClassMember> = Vec::new();
        let mut constructor: Option<TypeId> = None;
        for member in members {
            let member_kind = self.ast.kind(member).clone();
            match member_kind {
                NodeKind::MethodDefinition { key, value, kind, is_static } => {
                    let base = self.function_type_of(value);
                    let this_ty = if is_static { None } else { Some(instance) };
                    let method_ty = match self.types.kind(base) {
                        TypeKind::Function(f) => {
                            let sig = FunctionType { this_ty, ..f.clone() };
                            self.types.alloc(TypeKind::Function(sig))
                        }
                        _ => base,
                    };
                    self.flow.set_node_type(value, method_ty);
                    if kind == MethodKind::Constructor {
                        constructor = Some(method_ty);
                    } else if let Some(name) = self.ast.ident_name(key) {
                        class_members.push(ClassMember {
                            name,
                            ty: method_ty,
                            is_method: true,
                            is_static,
                        });
                    }
                }
                NodeKind::ClassProperty { key, type_annotation, is_static, .. } => {
                    let ty = match type_annotation {
                        Some(ann) => self.resolve_annotation(ann),
                        None => self.types.any(),
                    };
                    self.flow.set_node_type(key, ty);
                    if let Some(name) = self.ast.ident_name(key) {
                        class_members.push(ClassMember { name, ty, is_method: false, is_static });
                    }
                }
                _ => {}
            }
        }
        self.types.complete_class(cid, super_ty, class_members, constructor);
    }

    /// The instance type a class extends, if it names a class.
    fn resolve_superclass(
        &mut self,
        super_class: NodeId,
        super_type_args: Option<NodeId>,
    ) -> Option<TypeId> {
        let name = self.ast.ident_name(super_class)?;
        let binding = self.type_scope.lookup(name).copied();
        let ty = match binding {
            Some(TypeBinding::Ty(ty)) => Some(ty),
            Some(TypeBinding::Generic(generic)) => {
                let args_node = super_type_args?;
                let args = self.resolve_type_args(args_node);
                Some(self.instantiate_generic(generic, args, super_class))
            }
            None => None,
        };
        match ty {
            Some(ty) if matches!(self.types.try_kind(ty), Some(TypeKind::Class(_))) => Some(ty),
            _ => {
                let text = self.ast.names.resolve(name).to_string();
                self.error(
                    ERR_BAD_SUPERCLASS,
                    self.span(super_class),
                    format!("'{text}' cannot be extended: it is not a class"),
                    "not a class",
                );
                None
            }
        }
    }
}

/// Mark every type on a cycle of the forward-declaration graph as looping.
/// Queued unions contribute their pending arms as edges; nominal classes
/// stop the walk, which is what lets recursion through a class terminate.
fn find_looping(types: &mut TypeTable, pending: &[(TypeId, Vec<TypeId>)]) {
    let pending_arms: FxHashMap<TypeId, &[TypeId]> =
        pending.iter().map(|(id, arms)| (*id, arms.as_slice())).collect();
    let mut visited: FxHashSet<TypeId> = FxHashSet::default();
    for &(root, _) in pending {
        let mut path = Vec::new();
        mark_cycles(types, &pending_arms, root, &mut path, &mut visited);
    }
}

fn mark_cycles(
    types: &mut TypeTable,
    pending_arms: &FxHashMap<TypeId, &[TypeId]>,
    id: TypeId,
    path: &mut Vec<TypeId>,
    visited: &mut FxHashSet<TypeId>,
) {
    if let Some(pos) = path.iter().position(|&p| p == id) {
        for &on_cycle in &path[pos..] {
            types.mark_looping(on_cycle);
        }
        types.mark_looping(id);
        return;
    }
    if visited.contains(&id) {
        return;
    }
    let children: Vec<TypeId> = match pending_arms.get(&id) {
        Some(arms) => arms.to_vec(),
        None => match types.try_kind(id) {
            Some(TypeKind::Union(u)) => u.arms.clone(),
            Some(TypeKind::Array(element)) => vec![*element],
            Some(TypeKind::Tuple(t)) => t.elements.clone(),
            Some(TypeKind::Function(f)) => {
                let mut out: Vec<TypeId> = f.params.iter().map(|p| p.ty).collect();
                out.push(f.return_type);
                out
            }
            Some(TypeKind::ExactObject(fields)) => fields.iter().map(|f| f.ty).collect(),
            // Nominal and primitive types stop the walk; unresolved slots
            // with no pending arms have nothing to follow.
            _ => Vec::new(),
        },
    };
    path.push(id);
    for child in children {
        mark_cycles(types, pending_arms, child, path, visited);
    }
    path.pop();
    visited.insert(id);
}
