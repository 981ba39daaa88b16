//! Assignability ("can flow") rules
//!
//! `can_a_flow_into_b` decides whether a value of type `a` may be used where
//! type `b` is expected, and whether doing so needs a runtime-checked cast.
//! Only `any` sources need a cast: `any` flows everywhere, but the checker
//! wraps the expression so the narrowing is verified at runtime.

use crate::compare::equals;
use crate::ty::{TypeId, TypeKind, TypeTable};

/// Maximum structural recursion while checking assignability. Recursive
/// function and object types can nest flows arbitrarily deep; beyond this
/// the check conservatively fails.
const MAX_FLOW_DEPTH: usize = 64;

/// Result of an assignability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFlowResult {
    pub can_flow: bool,
    /// True when the flow is only sound with a runtime-checked cast.
    pub need_checked_cast: bool,
}

impl CanFlowResult {
    pub fn allowed() -> Self {
        CanFlowResult { can_flow: true, need_checked_cast: false }
    }

    pub fn cast() -> Self {
        CanFlowResult { can_flow: true, need_checked_cast: true }
    }

    pub fn rejected() -> Self {
        CanFlowResult { can_flow: false, need_checked_cast: false }
    }
}

/// Can a value of type `a` be used where `b` is expected?
pub fn can_a_flow_into_b(table: &TypeTable, a: TypeId, b: TypeId) -> CanFlowResult {
    can_flow_rec(table, a, b, 0)
}

fn can_flow_rec(table: &TypeTable, a: TypeId, b: TypeId, depth: usize) -> CanFlowResult {
    if depth > MAX_FLOW_DEPTH {
        return CanFlowResult::rejected();
    }
    if equals(table, a, b) {
        return CanFlowResult::allowed();
    }

    let ka = table.kind(a);
    let kb = table.kind(b);

    // Everything flows into the top types.
    if matches!(kb, TypeKind::Any | TypeKind::Mixed) {
        return CanFlowResult::allowed();
    }
    // `any` flows anywhere, but only through a runtime check.
    if matches!(ka, TypeKind::Any) {
        return CanFlowResult::cast();
    }

    // A union source flows only if every arm flows.
    if let TypeKind::Union(ua) = ka {
        let mut need_cast = false;
        for &arm in &ua.arms {
            let r = can_flow_rec(table, arm, b, depth + 1);
            if !r.can_flow {
                return CanFlowResult::rejected();
            }
            need_cast |= r.need_checked_cast;
        }
        return CanFlowResult { can_flow: true, need_checked_cast: need_cast };
    }

    // A non-union source flows into a union if it flows into some arm.
    if let TypeKind::Union(ub) = kb {
        let mut cast_arm = false;
        for &arm in &ub.arms {
            let r = can_flow_rec(table, a, arm, depth + 1);
            if r.can_flow && !r.need_checked_cast {
                return CanFlowResult::allowed();
            }
            cast_arm |= r.can_flow;
        }
        return if cast_arm { CanFlowResult::cast() } else { CanFlowResult::rejected() };
    }

    match (ka, kb) {
        // Nominal subtyping: a subclass instance flows into its supertype.
        (TypeKind::Class(ca), TypeKind::Class(cb)) => {
            if table.is_subclass_of(*ca, *cb) {
                CanFlowResult::allowed()
            } else {
                CanFlowResult::rejected()
            }
        }

        (TypeKind::Function(fa), TypeKind::Function(fb)) => {
            if fa.is_async != fb.is_async || fa.is_generator != fb.is_generator {
                return CanFlowResult::rejected();
            }
            // `this` is contravariant.
            match (fa.this_ty, fb.this_ty) {
                (None, None) => {}
                (Some(ta), Some(tb)) => {
                    let r = can_flow_rec(table, tb, ta, depth + 1);
                    if !r.can_flow || r.need_checked_cast {
                        return CanFlowResult::rejected();
                    }
                }
                // A function that ignores `this` accepts any receiver.
                (None, Some(_)) => {}
                (Some(_), None) => return CanFlowResult::rejected(),
            }
            if fa.params.len() != fb.params.len() {
                return CanFlowResult::rejected();
            }
            // Parameters are contravariant, the return type covariant.
            for (pa, pb) in fa.params.iter().zip(&fb.params) {
                let r = can_flow_rec(table, pb.ty, pa.ty, depth + 1);
                if !r.can_flow || r.need_checked_cast {
                    return CanFlowResult::rejected();
                }
            }
            let r = can_flow_rec(table, fa.return_type, fb.return_type, depth + 1);
            if r.can_flow && !r.need_checked_cast {
                CanFlowResult::allowed()
            } else {
                CanFlowResult::rejected()
            }
        }

        // Arrays, tuples, and exact objects are invariant; only the equality
        // fast path above admits them.
        _ => CanFlowResult::rejected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{FunctionParam, FunctionType};
    use crate::union::make_union;

    #[test]
    fn test_reflexive() {
        let table = TypeTable::new();
        assert_eq!(
            can_a_flow_into_b(&table, table.number(), table.number()),
            CanFlowResult::allowed()
        );
    }

    #[test]
    fn test_any_flows_with_cast() {
        let table = TypeTable::new();
        let r = can_a_flow_into_b(&table, table.any(), table.number());
        assert!(r.can_flow);
        assert!(r.need_checked_cast);
    }

    #[test]
    fn test_everything_flows_into_mixed_and_any() {
        let table = TypeTable::new();
        assert_eq!(
            can_a_flow_into_b(&table, table.string(), table.mixed()),
            CanFlowResult::allowed()
        );
        assert_eq!(
            can_a_flow_into_b(&table, table.string(), table.any()),
            CanFlowResult::allowed()
        );
        // `mixed` does not flow back out without narrowing.
        assert!(!can_a_flow_into_b(&table, table.mixed(), table.string()).can_flow);
    }

    #[test]
    fn test_arm_flows_into_union() {
        let mut table = TypeTable::new();
        let arms = vec![table.number(), table.string()];
        let u = make_union(&mut table, arms);
        assert_eq!(can_a_flow_into_b(&table, table.number(), u), CanFlowResult::allowed());
        assert!(!can_a_flow_into_b(&table, table.boolean(), u).can_flow);
    }

    #[test]
    fn test_union_source_needs_every_arm() {
        let mut table = TypeTable::new();
        let arms = vec![table.number(), table.string()];
        let u = make_union(&mut table, arms);
        // number|string does not flow into number.
        assert!(!can_a_flow_into_b(&table, u, table.number()).can_flow);
        // But it flows into a wider union.
        let arms = vec![table.number(), table.string(), table.boolean()];
        let wider = make_union(&mut table, arms);
        assert!(can_a_flow_into_b(&table, u, wider).can_flow);
    }

    #[test]
    fn test_subclass_flows_into_superclass() {
        let mut table = TypeTable::new();
        let (base_cid, base_instance, _) = table.alloc_class(None);
        table.complete_class(base_cid, None, vec![], None);
        let (derived_cid, derived_instance, _) = table.alloc_class(None);
        table.complete_class(derived_cid, Some(base_instance), vec![], None);

        assert_eq!(
            can_a_flow_into_b(&table, derived_instance, base_instance),
            CanFlowResult::allowed()
        );
        assert!(!can_a_flow_into_b(&table, base_instance, derived_instance).can_flow);
    }

    #[test]
    fn test_function_variance() {
        let mut table = TypeTable::new();
        let (base_cid, base_instance, _) = table.alloc_class(None);
        table.complete_class(base_cid, None, vec![], None);
        let (derived_cid, derived_instance, _) = table.alloc_class(None);
        table.complete_class(derived_cid, Some(base_instance), vec![], None);

        let takes_base = table.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: vec![FunctionParam { name: None, ty: base_instance }],
            return_type: derived_instance,
            is_async: false,
            is_generator: false,
        }));
        let takes_derived = table.alloc(TypeKind::Function(FunctionType {
            this_ty: None,
            params: vec![FunctionParam { name: None, ty: derived_instance }],
            return_type: base_instance,
            is_async: false,
            is_generator: false,
        }));
        // Contravariant params, covariant return: (Base) => Derived flows
        // into (Derived) => Base but not the other way.
        assert!(can_a_flow_into_b(&table, takes_base, takes_derived).can_flow);
        assert!(!can_a_flow_into_b(&table, takes_derived, takes_base).can_flow);
    }

    #[test]
    fn test_arrays_are_invariant() {
        let mut table = TypeTable::new();
        let (base_cid, base_instance, _) = table.alloc_class(None);
        table.complete_class(base_cid, None, vec![], None);
        let (derived_cid, derived_instance, _) = table.alloc_class(None);
        table.complete_class(derived_cid, Some(base_instance), vec![], None);

        let base_arr = table.alloc(TypeKind::Array(base_instance));
        let derived_arr = table.alloc(TypeKind::Array(derived_instance));
        assert!(!can_a_flow_into_b(&table, derived_arr, base_arr).can_flow);
        assert!(can_a_flow_into_b(&table, base_arr, base_arr).can_flow);
    }
}
