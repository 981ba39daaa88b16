//! Union canonicalization
//!
//! All unions are built through [`make_union`], which flattens nested
//! unions, sorts and deduplicates the non-recursive arms, deduplicates the
//! recursive arms by the slower pairwise walk, and collapses single-arm
//! results. Canonical form is what makes union equality and `canFlow`
//! checks a linear walk, and it is idempotent: re-canonicalizing a
//! canonical union returns an equal union.

use crate::compare::{compare, equals, CompareState};
use crate::ty::{TypeId, TypeKind, TypeTable, UnionType};
use std::cmp::Ordering;

/// Build the canonical union of `arms`. Returns the single member when the
/// union collapses; never returns an empty union (an empty arm list yields
/// `any`, though no syntax produces one).
pub fn make_union(table: &mut TypeTable, arms: Vec<TypeId>) -> TypeId {
    let mut flat = Vec::with_capacity(arms.len());
    for arm in arms {
        flatten_into(table, arm, &mut flat);
    }

    let (mut non_looping, looping): (Vec<_>, Vec<_>) =
        flat.into_iter().partition(|&t| !table.is_looping(t));

    let mut state = CompareState::new();
    non_looping.sort_by(|&a, &b| compare(table, &mut state, a, b));
    non_looping.dedup_by(|&mut a, &mut b| compare(table, &mut state, a, b) == Ordering::Equal);

    // Recursive arms cannot be sorted ahead of resolution, so dedup them
    // pairwise against everything kept so far.
    let num_non_looping = non_looping.len();
    let mut kept = non_looping;
    for arm in looping {
        if !kept.iter().any(|&k| compare(table, &mut state, k, arm) == Ordering::Equal) {
            kept.push(arm);
        }
    }

    match kept.len() {
        0 => table.any(),
        1 => kept[0],
        _ => table.alloc(TypeKind::Union(UnionType { arms: kept, num_non_looping })),
    }
}

/// `void | null | ty`, the expansion of `?ty`.
pub fn make_nullable(table: &mut TypeTable, ty: TypeId) -> TypeId {
    let arms = vec![table.void(), table.null(), ty];
    make_union(table, arms)
}

/// True if `union_ty` is a union with an arm equal to `arm`, or is itself
/// equal to `arm`.
pub fn union_contains(table: &TypeTable, union_ty: TypeId, arm: TypeId) -> bool {
    match table.kind(union_ty) {
        TypeKind::Union(u) => u.arms.iter().any(|&a| equals(table, a, arm)),
        _ => equals(table, union_ty, arm),
    }
}

fn flatten_into(table: &TypeTable, arm: TypeId, out: &mut Vec<TypeId>) {
    // A forward-declared arm is a recursive reference back into the union
    // being built; keep it opaque.
    match table.try_kind(arm) {
        Some(TypeKind::Union(u)) => out.extend_from_slice(&u.arms),
        _ => out.push(arm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::equals;

    #[test]
    fn test_duplicates_collapse() {
        let mut table = TypeTable::new();
        let arms = vec![table.number(), table.number()];
        let u = make_union(&mut table, arms);
        assert_eq!(u, table.number());
    }

    #[test]
    fn test_order_is_canonical() {
        let mut table = TypeTable::new();
        let arms1 = vec![table.string(), table.number()];
        let u1 = make_union(&mut table, arms1);
        let arms2 = vec![table.number(), table.string()];
        let u2 = make_union(&mut table, arms2);
        assert!(equals(&table, u1, u2));
    }

    #[test]
    fn test_nested_unions_flatten() {
        let mut table = TypeTable::new();
        let arms = vec![table.number(), table.string()];
        let inner = make_union(&mut table, arms);
        let arms = vec![inner, table.boolean()];
        let outer = make_union(&mut table, arms);
        let arms = vec![table.boolean(), table.string(), table.number()];
        let expected = make_union(&mut table, arms);
        assert!(equals(&table, outer, expected));
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        let mut table = TypeTable::new();
        let arms = vec![table.string(), table.number(), table.string()];
        let u = make_union(&mut table, arms);
        let again = make_union(&mut table, vec![u]);
        assert!(equals(&table, u, again));
        match table.kind(again) {
            TypeKind::Union(inner) => assert_eq!(inner.arms.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_looping_arms_kept_after_non_looping() {
        let mut table = TypeTable::new();
        let rec = table.forward_declare();
        table.resolve_forward(rec, TypeKind::Array(rec));
        table.mark_looping(rec);

        let arms = vec![rec, table.string(), rec];
        let u = make_union(&mut table, arms);
        match table.kind(u) {
            TypeKind::Union(inner) => {
                assert_eq!(inner.num_non_looping, 1);
                assert_eq!(inner.arms.len(), 2);
                assert_eq!(inner.non_looping(), &[table.string()]);
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_nullable_expansion() {
        let mut table = TypeTable::new();
        let number = table.number();
        let n = make_nullable(&mut table, number);
        assert!(union_contains(&table, n, table.void()));
        assert!(union_contains(&table, n, table.null()));
        assert!(union_contains(&table, n, table.number()));
        assert!(!union_contains(&table, n, table.string()));
    }
}
