//! Structural type comparison
//!
//! A total order over types: primitives and nominal kinds compare by rank
//! and id, structural kinds compare memberwise. Recursive types are handled
//! with a visited-pair stack; a pair already under comparison is assumed
//! equal, which gives recursive definitions like `type T = string | T[]`
//! and a structurally identical alias the same canonical shape. Completed
//! comparisons are cached.

use crate::ty::{TypeId, TypeKind, TypeTable};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Reusable comparison state: the in-progress pair stack plus a result
/// cache. One instance can serve many comparisons against the same table.
#[derive(Debug, Default)]
pub struct CompareState {
    /// Pairs currently being compared; a revisit is a cycle.
    visited: Vec<(TypeId, TypeId)>,
    cache: FxHashMap<(TypeId, TypeId), Ordering>,
}

impl CompareState {
    pub fn new() -> Self {
        CompareState::default()
    }
}

/// Compare two types under `state`.
pub fn compare(table: &TypeTable, state: &mut CompareState, a: TypeId, b: TypeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if let Some(&cached) = state.cache.get(&(a, b)) {
        return cached;
    }
    // A pair on the stack is a cycle through identical structure so far.
    if state.visited.contains(&(a, b)) {
        return Ordering::Equal;
    }

    // Unresolved forward slots only occur mid-resolution; order them by id
    // so the sort stays total.
    let (Some(ka), Some(kb)) = (table.try_kind(a), table.try_kind(b)) else {
        return a.cmp(&b);
    };

    let rank_cmp = rank(ka).cmp(&rank(kb));
    if rank_cmp != Ordering::Equal {
        state.cache.insert((a, b), rank_cmp);
        return rank_cmp;
    }

    state.visited.push((a, b));
    let result = compare_same_kind(table, state, ka, kb);
    state.visited.pop();
    state.cache.insert((a, b), result);
    result
}

/// True if the two types are structurally equal (nominally, for classes).
pub fn equals(table: &TypeTable, a: TypeId, b: TypeId) -> bool {
    let mut state = CompareState::new();
    compare(table, &mut state, a, b) == Ordering::Equal
}

fn compare_same_kind(
    table: &TypeTable,
    state: &mut CompareState,
    ka: &TypeKind,
    kb: &TypeKind,
) -> Ordering {
    use TypeKind::*;
    match (ka, kb) {
        // Primitives of the same rank are the same singleton; `a == b` was
        // already ruled out, but two ids can alias the same primitive only
        // through table misuse, so treat them as equal anyway.
        (Void, Void) | (Null, Null) | (Boolean, Boolean) | (String, String)
        | (Number, Number) | (BigInt, BigInt) | (Any, Any) | (Mixed, Mixed) => Ordering::Equal,

        (Union(ua), Union(ub)) => compare_lists(table, state, &ua.arms, &ub.arms),

        (Array(ea), Array(eb)) => compare(table, state, *ea, *eb),

        (Tuple(ta), Tuple(tb)) => compare_lists(table, state, &ta.elements, &tb.elements),

        (Function(fa), Function(fb)) => {
            let flags = (fa.is_async, fa.is_generator).cmp(&(fb.is_async, fb.is_generator));
            if flags != Ordering::Equal {
                return flags;
            }
            match (fa.this_ty, fb.this_ty) {
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(ta), Some(tb)) => {
                    let c = compare(table, state, ta, tb);
                    if c != Ordering::Equal {
                        return c;
                    }
                }
                (None, None) => {}
            }
            let count = fa.params.len().cmp(&fb.params.len());
            if count != Ordering::Equal {
                return count;
            }
            for (pa, pb) in fa.params.iter().zip(&fb.params) {
                let c = compare(table, state, pa.ty, pb.ty);
                if c != Ordering::Equal {
                    return c;
                }
            }
            compare(table, state, fa.return_type, fb.return_type)
        }

        (UntypedFunction, UntypedFunction) => Ordering::Equal,

        // Nominal kinds: identity of the class, not its shape.
        (Class(ca), Class(cb)) => ca.cmp(cb),
        (ClassConstructor(ca), ClassConstructor(cb)) => ca.cmp(cb),

        (ExactObject(fa), ExactObject(fb)) => {
            let count = fa.len().cmp(&fb.len());
            if count != Ordering::Equal {
                return count;
            }
            for (a, b) in fa.iter().zip(fb) {
                let name = a.name.cmp(&b.name);
                if name != Ordering::Equal {
                    return name;
                }
                let c = compare(table, state, a.ty, b.ty);
                if c != Ordering::Equal {
                    return c;
                }
            }
            Ordering::Equal
        }

        _ => unreachable!("compare_same_kind called with different ranks"),
    }
}

fn compare_lists(
    table: &TypeTable,
    state: &mut CompareState,
    a: &[TypeId],
    b: &[TypeId],
) -> Ordering {
    let count = a.len().cmp(&b.len());
    if count != Ordering::Equal {
        return count;
    }
    for (&x, &y) in a.iter().zip(b) {
        let c = compare(table, state, x, y);
        if c != Ordering::Equal {
            return c;
        }
    }
    Ordering::Equal
}

fn rank(kind: &TypeKind) -> u8 {
    use TypeKind::*;
    match kind {
        Void => 0,
        Null => 1,
        Boolean => 2,
        String => 3,
        Number => 4,
        BigInt => 5,
        Any => 6,
        Mixed => 7,
        Union(_) => 8,
        Array(_) => 9,
        Tuple(_) => 10,
        Function(_) => 11,
        UntypedFunction => 12,
        Class(_) => 13,
        ClassConstructor(_) => 14,
        ExactObject(_) => 15,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{FunctionParam, FunctionType};

    #[test]
    fn test_primitives_ordered_by_rank() {
        let table = TypeTable::new();
        let mut state = CompareState::new();
        assert_eq!(
            compare(&table, &mut state, table.void(), table.number()),
            Ordering::Less
        );
        assert_eq!(
            compare(&table, &mut state, table.number(), table.number()),
            Ordering::Equal
        );
    }

    #[test]
    fn test_structural_array_equality() {
        let mut table = TypeTable::new();
        let a = table.alloc(TypeKind::Array(table.number()));
        let b = table.alloc(TypeKind::Array(table.number()));
        let c = table.alloc(TypeKind::Array(table.string()));
        assert!(equals(&table, a, b));
        assert!(!equals(&table, a, c));
    }

    #[test]
    fn test_recursive_arrays_compare_equal() {
        // Two separately allocated `T = T[]` definitions are the same shape.
        let mut table = TypeTable::new();
        let f1 = table.forward_declare();
        table.resolve_forward(f1, TypeKind::Array(f1));
        let f2 = table.forward_declare();
        table.resolve_forward(f2, TypeKind::Array(f2));
        assert!(equals(&table, f1, f2));
    }

    #[test]
    fn test_classes_are_nominal() {
        let mut table = TypeTable::new();
        let (ca, ia, _) = table.alloc_class(None);
        let (cb, ib, _) = table.alloc_class(None);
        table.complete_class(ca, None, vec![], None);
        table.complete_class(cb, None, vec![], None);
        // Identical shape, different identity.
        assert!(!equals(&table, ia, ib));
        assert!(equals(&table, ia, ia));
    }

    #[test]
    fn test_function_compare() {
        let mut table = TypeTable::new();
        let f1 = table.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: vec![FunctionParam { name: None, ty: table.number() }],
            return_type: table.string(),
            is_async: false,
            is_generator: false,
        }));
        let f2 = table.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: vec![FunctionParam { name: None, ty: table.number() }],
            return_type: table.string(),
            is_async: false,
            is_generator: false,
        }));
        let f3 = table.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: vec![FunctionParam { name: None, ty: table.number() }],
            return_type: table.string(),
            is_async: true,
            is_generator: false,
        }));
        assert!(equals(&table, f1, f2));
        assert!(!equals(&table, f1, f3));
    }
}
