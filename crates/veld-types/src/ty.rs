//! Core type definitions for the Veld type system
//!
//! Types live in a [`TypeTable`] arena and are addressed by [`TypeId`]. The
//! eight primitive types are allocated once and shared. A slot may be
//! allocated before its payload is known (a forward declaration); the type
//! declaration resolver fills such slots in exactly once, which is how
//! recursive aliases like `type T = string | T[]` acquire a stable identity
//! before their body is resolved.

use std::fmt::Write as _;
use veld_ast::{Atom, NameInterner};

/// Unique identifier for a type in the type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Unique identifier for a class in the type table. Classes are nominal:
/// two classes are the same type only if they share a `ClassId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

/// One parameter of a typed function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParam {
    /// Parameter name, kept for diagnostics.
    pub name: Option<Atom>,
    pub ty: TypeId,
}

/// Function type: (T1, T2, ..., Tn) => R
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    /// Type of `this` inside the function; `None` outside class methods.
    pub this_ty: Option<TypeId>,
    pub params: Vec<FunctionParam>,
    pub return_type: TypeId,
    pub is_async: bool,
    pub is_generator: bool,
}

/// Union type: T1 | T2 | ... | Tn, always canonical.
///
/// The arm list is partitioned: the first `num_non_looping` arms are
/// non-recursive and sorted by the structural order, the rest are recursive
/// arms deduplicated pairwise. Canonical form makes union equality a
/// memberwise walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub arms: Vec<TypeId>,
    pub num_non_looping: usize,
}

impl UnionType {
    /// The sorted non-recursive arms.
    pub fn non_looping(&self) -> &[TypeId] {
        &self.arms[..self.num_non_looping]
    }

    /// The recursive arms.
    pub fn looping(&self) -> &[TypeId] {
        &self.arms[self.num_non_looping..]
    }
}

/// Tuple type: [T1, T2, ..., Tn]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleType {
    pub elements: Vec<TypeId>,
}

/// One field of an exact object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectField {
    pub name: Atom,
    pub ty: TypeId,
}

/// The payload of a resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    // Primitives, one singleton each.
    Void,
    Null,
    Boolean,
    String,
    Number,
    BigInt,
    /// `any`: flows anywhere, anything flows into it; reads need a
    /// runtime-checked cast.
    Any,
    /// `mixed`: anything flows into it, it flows nowhere without narrowing.
    Mixed,

    Union(UnionType),
    /// Array type: T[]. Invariant in its element.
    Array(TypeId),
    Tuple(TupleType),
    Function(FunctionType),
    /// A function value with no usable signature; calls are unchecked.
    UntypedFunction,
    /// Instance type of a class.
    Class(ClassId),
    /// The constructor value of a class; `new` on it yields `Class(id)`.
    ClassConstructor(ClassId),
    /// `{| name: T, ... |}` exact object type, fields in declaration order.
    ExactObject(Vec<ObjectField>),
}

impl TypeKind {
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeKind::Void
                | TypeKind::Null
                | TypeKind::Boolean
                | TypeKind::String
                | TypeKind::Number
                | TypeKind::BigInt
                | TypeKind::Any
                | TypeKind::Mixed
        )
    }

    pub fn is_union(&self) -> bool {
        matches!(self, TypeKind::Union(_))
    }

    pub fn as_union(&self) -> Option<&UnionType> {
        match self {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            TypeKind::Function(f) => Some(f),
            _ => None,
        }
    }
}

/// One field or method of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    pub name: Atom,
    pub ty: TypeId,
    pub is_method: bool,
    pub is_static: bool,
}

/// A class definition. Allocated empty when the class name is first seen and
/// completed exactly once when the class body has been checked, so methods
/// can refer to the class's own instance type.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Class name; anonymous class expressions have none.
    pub name: Option<Atom>,
    /// Instance type of the superclass, if any.
    pub super_class: Option<TypeId>,
    pub members: Vec<ClassMember>,
    /// Type of the constructor function, if the class declares one.
    pub constructor: Option<TypeId>,
    complete: bool,
}

impl ClassInfo {
    /// True once the class body has been recorded.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Look up an instance member by name, walking the superclass chain
    /// through `table`.
    pub fn find_member<'a>(&'a self, table: &'a TypeTable, name: Atom) -> Option<&'a ClassMember> {
        if let Some(m) = self.members.iter().find(|m| m.name == name && !m.is_static) {
            return Some(m);
        }
        let super_ty = self.super_class?;
        match table.kind(super_ty) {
            TypeKind::Class(cid) => table.class(*cid).find_member(table, name),
            _ => None,
        }
    }
}

/// Arena of all types created during checking.
#[derive(Debug)]
pub struct TypeTable {
    /// `None` marks a forward-declared slot not yet resolved.
    slots: Vec<Option<TypeKind>>,
    /// Marks types reachable from their own definition.
    looping: Vec<bool>,
    classes: Vec<ClassInfo>,

    void_id: TypeId,
    null_id: TypeId,
    boolean_id: TypeId,
    string_id: TypeId,
    number_id: TypeId,
    bigint_id: TypeId,
    any_id: TypeId,
    mixed_id: TypeId,
    untyped_function_id: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        TypeTable::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = TypeTable {
            slots: Vec::new(),
            looping: Vec::new(),
            classes: Vec::new(),
            void_id: TypeId(0),
            null_id: TypeId(0),
            boolean_id: TypeId(0),
            string_id: TypeId(0),
            number_id: TypeId(0),
            bigint_id: TypeId(0),
            any_id: TypeId(0),
            mixed_id: TypeId(0),
            untyped_function_id: TypeId(0),
        };
        table.void_id = table.alloc(TypeKind::Void);
        table.null_id = table.alloc(TypeKind::Null);
        table.boolean_id = table.alloc(TypeKind::Boolean);
        table.string_id = table.alloc(TypeKind::String);
        table.number_id = table.alloc(TypeKind::Number);
        table.bigint_id = table.alloc(TypeKind::BigInt);
        table.any_id = table.alloc(TypeKind::Any);
        table.mixed_id = table.alloc(TypeKind::Mixed);
        table.untyped_function_id = table.alloc(TypeKind::UntypedFunction);
        table
    }

    pub fn void(&self) -> TypeId {
        self.void_id
    }
    pub fn null(&self) -> TypeId {
        self.null_id
    }
    pub fn boolean(&self) -> TypeId {
        self.boolean_id
    }
    pub fn string(&self) -> TypeId {
        self.string_id
    }
    pub fn number(&self) -> TypeId {
        self.number_id
    }
    pub fn bigint(&self) -> TypeId {
        self.bigint_id
    }
    pub fn any(&self) -> TypeId {
        self.any_id
    }
    pub fn mixed(&self) -> TypeId {
        self.mixed_id
    }
    /// The shared type of function values with no usable signature.
    pub fn untyped_function(&self) -> TypeId {
        self.untyped_function_id
    }

    /// Allocate a resolved type.
    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.slots.len() as u32);
        self.slots.push(Some(kind));
        self.looping.push(false);
        id
    }

    /// Allocate a forward-declared slot to be filled by [`resolve_forward`]
    /// later.
    ///
    /// [`resolve_forward`]: TypeTable::resolve_forward
    pub fn forward_declare(&mut self) -> TypeId {
        let id = TypeId(self.slots.len() as u32);
        self.slots.push(None);
        self.looping.push(false);
        id
    }

    /// Fill in a forward-declared slot. The slot must still be empty.
    pub fn resolve_forward(&mut self, id: TypeId, kind: TypeKind) {
        let slot = &mut self.slots[id.0 as usize];
        assert!(slot.is_none(), "forward type resolved twice");
        *slot = Some(kind);
    }

    /// The payload of a type. Panics on an unresolved forward slot; the
    /// declaration resolver guarantees all slots are filled before checking
    /// begins.
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("unresolved forward type")
    }

    /// The payload of a type, or `None` while it is still forward-declared.
    pub fn try_kind(&self, id: TypeId) -> Option<&TypeKind> {
        self.slots[id.0 as usize].as_ref()
    }

    /// True once the slot has a payload.
    pub fn is_resolved(&self, id: TypeId) -> bool {
        self.slots[id.0 as usize].is_some()
    }

    /// Number of allocated type slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mark a type as reachable from its own definition.
    pub fn mark_looping(&mut self, id: TypeId) {
        self.looping[id.0 as usize] = true;
    }

    pub fn is_looping(&self, id: TypeId) -> bool {
        self.looping[id.0 as usize]
    }

    /// Allocate an incomplete class and its instance/constructor types.
    /// Returns `(class_id, instance_type, constructor_type)`.
    pub fn alloc_class(&mut self, name: Option<Atom>) -> (ClassId, TypeId, TypeId) {
        let cid = ClassId(self.classes.len() as u32);
        self.classes.push(ClassInfo {
            name,
            super_class: None,
            members: Vec::new(),
            constructor: None,
            complete: false,
        });
        let instance = self.alloc(TypeKind::Class(cid));
        let constructor = self.alloc(TypeKind::ClassConstructor(cid));
        (cid, instance, constructor)
    }

    pub fn class(&self, cid: ClassId) -> &ClassInfo {
        &self.classes[cid.0 as usize]
    }

    /// Record a class's body. May be called once per class.
    pub fn complete_class(
        &mut self,
        cid: ClassId,
        super_class: Option<TypeId>,
        members: Vec<ClassMember>,
        constructor: Option<TypeId>,
    ) {
        let info = &mut self.classes[cid.0 as usize];
        assert!(!info.complete, "class completed twice");
        info.super_class = super_class;
        info.members = members;
        info.constructor = constructor;
        info.complete = true;
    }

    /// True if `sub` is `sup` or a transitive subclass of it.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut current = sub;
        loop {
            if current == sup {
                return true;
            }
            match self.class(current).super_class.map(|t| self.kind(t)) {
                Some(TypeKind::Class(parent)) => current = *parent,
                _ => return false,
            }
        }
    }

    /// Render a type for diagnostics. Recursive types print their revisited
    /// occurrence as `...`.
    pub fn display(&self, id: TypeId, names: &NameInterner) -> String {
        let mut out = String::new();
        let mut visiting = Vec::new();
        self.write_type(id, names, &mut visiting, &mut out);
        out
    }

    fn write_type(
        &self,
        id: TypeId,
        names: &NameInterner,
        visiting: &mut Vec<TypeId>,
        out: &mut String,
    ) {
        if visiting.contains(&id) {
            out.push_str("...");
            return;
        }
        let Some(kind) = self.try_kind(id) else {
            out.push_str("<forward>");
            return;
        };
        visiting.push(id);
        match kind {
            TypeKind::Void => out.push_str("void"),
            TypeKind::Null => out.push_str("null"),
            TypeKind::Boolean => out.push_str("boolean"),
            TypeKind::String => out.push_str("string"),
            TypeKind::Number => out.push_str("number"),
            TypeKind::BigInt => out.push_str("bigint"),
            TypeKind::Any => out.push_str("any"),
            TypeKind::Mixed => out.push_str("mixed"),
            TypeKind::Union(u) => {
                for (i, &arm) in u.arms.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    self.write_type(arm, names, visiting, out);
                }
            }
            TypeKind::Array(element) => {
                self.write_type(*element, names, visiting, out);
                out.push_str("[]");
            }
            TypeKind::Tuple(t) => {
                out.push('[');
                for (i, &e) in t.elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(e, names, visiting, out);
                }
                out.push(']');
            }
            TypeKind::Function(func) => {
                out.push('(');
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let Some(name) = p.name {
                        let _ = write!(out, "{}: ", names.resolve(name));
                    }
                    self.write_type(p.ty, names, visiting, out);
                }
                out.push_str(") => ");
                self.write_type(func.return_type, names, visiting, out);
            }
            TypeKind::UntypedFunction => out.push_str("function"),
            TypeKind::Class(cid) => match self.class(*cid).name {
                Some(name) => out.push_str(names.resolve(name)),
                None => out.push_str("<anonymous class>"),
            },
            TypeKind::ClassConstructor(cid) => {
                out.push_str("class ");
                match self.class(*cid).name {
                    Some(name) => out.push_str(names.resolve(name)),
                    None => out.push_str("<anonymous>"),
                }
            }
            TypeKind::ExactObject(fields) => {
                out.push_str("{|");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", names.resolve(field.name));
                    self.write_type(field.ty, names, visiting, out);
                }
                out.push_str("|}");
            }
        }
        visiting.pop();
    }
}
