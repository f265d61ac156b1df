//! Choosing among applicable candidates.
//!
//! A candidate is more specific than another when each of its parameter
//! types converts to the other's without boxing. If exactly one candidate is
//! more specific than all others it wins; otherwise the lowest total
//! conversion cost decides, then the number of exact argument matches.

use jtemplate_core::TypeParamDecl;
use jtemplate_registry::TypeTable;

use super::OverloadMatch;
use crate::conversion::find_conversion;

/// Select the best of the applicable candidates; `None` if ambiguous.
pub fn find_best_match(
    mut viable: Vec<OverloadMatch>,
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<OverloadMatch> {
    if viable.len() <= 1 {
        return viable.pop();
    }

    let maximal: Vec<usize> = (0..viable.len())
        .filter(|&i| {
            (0..viable.len()).all(|j| i == j || more_specific(&viable[i], &viable[j], table, params))
        })
        .collect();
    if let [winner] = maximal.as_slice() {
        return Some(viable.swap_remove(*winner));
    }

    viable.sort_by_key(|m| m.total_cost);
    let (best, second) = (&viable[0], &viable[1]);
    if best.total_cost < second.total_cost {
        return Some(viable.swap_remove(0));
    }
    match break_tie(best, second) {
        Some(true) => Some(viable.swap_remove(0)),
        Some(false) => Some(viable.swap_remove(1)),
        None => None,
    }
}

/// Whether `a` is at least as specific as `b` in every parameter position.
fn more_specific(a: &OverloadMatch, b: &OverloadMatch, table: &TypeTable, params: &[TypeParamDecl]) -> bool {
    a.param_types.len() == b.param_types.len()
        && a.param_types.iter().zip(&b.param_types).all(|(pa, pb)| {
            find_conversion(pa, pb, table, params).is_some_and(|c| !c.needs_boxing())
        })
}

/// `Some(true)` if `a` wins, `Some(false)` if `b` wins.
fn break_tie(a: &OverloadMatch, b: &OverloadMatch) -> Option<bool> {
    let a_exact = count_exact_matches(a);
    let b_exact = count_exact_matches(b);
    match a_exact.cmp(&b_exact) {
        std::cmp::Ordering::Greater => Some(true),
        std::cmp::Ordering::Less => Some(false),
        std::cmp::Ordering::Equal => None,
    }
}

fn count_exact_matches(m: &OverloadMatch) -> usize {
    m.arg_conversions
        .iter()
        .filter(|c| c.as_ref().is_some_and(|conv| conv.is_exact()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::overload::resolve_overload;
    use jtemplate_core::JavaType;

    #[test]
    fn null_argument_is_ambiguous_between_unrelated_overloads() {
        let table = Classpath::builtin().build().unwrap();
        let candidates = table.lookup_methods(&JavaType::class("java.lang.StringBuilder"), "append");
        assert!(resolve_overload(&candidates, &[Some(JavaType::Null)], &table, &[]).is_none());
    }

    #[test]
    fn single_candidate_is_returned() {
        let table = Classpath::builtin().build().unwrap();
        let candidates = table.lookup_methods(&JavaType::string(), "length");
        let m = resolve_overload(&candidates, &[], &table, &[]).unwrap();
        assert_eq!(m.method.declaring, "java.lang.String");
    }
}
