//! Overload resolution for method and constructor calls.
//!
//! Candidates are tried in the three invocation phases:
//!
//! 1. Strict: identity and widening conversions only
//! 2. Loose: boxing and unboxing allowed as well
//! 3. Variable arity: trailing arguments are matched against the element
//!    type of a varargs parameter
//!
//! The first phase with an applicable candidate wins; within a phase the
//! most specific candidate is chosen (see [`ranking`]). An ambiguous call
//! resolves to nothing rather than an error.

mod ranking;

pub use ranking::find_best_match;

use jtemplate_core::{JavaType, MethodType, TypeParamDecl, Wildcard};
use jtemplate_registry::{MemberMethod, TypeSubst, TypeTable, substitute};
use tracing::trace;

use crate::conversion::{Conversion, find_conversion};
use crate::inference::{infer, upper_bound};

/// Invocation phase in which a candidate was found applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Strict,
    Loose,
    Varargs,
}

/// An applicable candidate with its instantiated signature.
#[derive(Debug, Clone)]
pub struct OverloadMatch {
    pub method: MemberMethod,
    pub phase: Phase,
    /// Per argument; `None` for lambdas and method references.
    pub arg_conversions: Vec<Option<Conversion>>,
    pub total_cost: u32,
    /// Formal parameter types after substitution, expanded for varargs.
    pub param_types: Vec<JavaType>,
    /// Inferred method type arguments, in declaration order.
    pub type_args: Vec<JavaType>,
    pub return_type: JavaType,
}

impl OverloadMatch {
    pub fn method_type(&self) -> MethodType {
        self.method
            .to_method_type(self.type_args.clone(), self.return_type.clone())
    }
}

/// Pick the overload for a call with the given argument types.
///
/// `None` in `args` stands for an argument without a standalone type (a
/// lambda or method reference). `params` are the type variables in scope at
/// the call site.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_overload(
    candidates: &[MemberMethod],
    args: &[Option<JavaType>],
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<OverloadMatch> {
    for phase in [Phase::Strict, Phase::Loose, Phase::Varargs] {
        let viable: Vec<OverloadMatch> = candidates
            .iter()
            .filter_map(|c| try_match_candidate(c, args, phase, table, params))
            .collect();
        if !viable.is_empty() {
            let best = find_best_match(viable, table, params);
            if best.is_none() {
                trace!(?phase, "ambiguous overload");
            }
            return best;
        }
    }
    None
}

fn try_match_candidate(
    candidate: &MemberMethod,
    args: &[Option<JavaType>],
    phase: Phase,
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<OverloadMatch> {
    let declared = candidate.params();
    let formals = match phase {
        Phase::Strict | Phase::Loose => {
            if declared.len() != args.len() {
                return None;
            }
            declared
        }
        Phase::Varargs => expand_varargs(candidate, declared, args.len())?,
    };

    let sig = &candidate.sig;
    let subst = if sig.is_generic() {
        infer(&sig.type_params, &formals, args, table)?
    } else {
        TypeSubst::default()
    };
    let formals: Vec<JavaType> = formals.iter().map(|f| param_view(&substitute(f, &subst))).collect();

    let mut arg_conversions = Vec::with_capacity(args.len());
    let mut total_cost = 0;
    for (formal, arg) in formals.iter().zip(args) {
        match arg {
            None => {
                if !is_functional(formal, table) {
                    return None;
                }
                total_cost += Conversion::COST_WIDENING_REFERENCE;
                arg_conversions.push(None);
            }
            Some(actual) => {
                let conversion = find_conversion(actual, formal, table, params)?;
                if phase == Phase::Strict && conversion.needs_boxing() {
                    return None;
                }
                total_cost += conversion.cost;
                arg_conversions.push(Some(conversion));
            }
        }
    }

    let type_args = sig
        .type_params
        .iter()
        .map(|p| subst.get(&p.name).cloned().unwrap_or_else(JavaType::object))
        .collect();
    let return_type = upper_bound(&substitute(&candidate.return_type(), &subst));

    Some(OverloadMatch {
        method: candidate.clone(),
        phase,
        arg_conversions,
        total_cost,
        param_types: formals,
        type_args,
        return_type,
    })
}

/// Fixed parameters followed by the varargs element type once per remaining
/// argument.
fn expand_varargs(candidate: &MemberMethod, declared: Vec<JavaType>, arg_count: usize) -> Option<Vec<JavaType>> {
    if !candidate.sig.is_varargs || arg_count + 1 < declared.len() {
        return None;
    }
    let (last, fixed) = declared.split_last()?;
    let JavaType::Array(elem) = last else {
        return None;
    };
    let mut formals = fixed.to_vec();
    formals.extend(std::iter::repeat_n(elem.as_ref().clone(), arg_count - fixed.len()));
    Some(formals)
}

/// The type an argument must convert to for a formal that may be a
/// wildcard (`add(E)` on a `List<? super Integer>` accepts `Integer`).
fn param_view(formal: &JavaType) -> JavaType {
    match formal {
        JavaType::Wildcard(Wildcard::Super(bound)) => bound.as_ref().clone(),
        other => other.clone(),
    }
}

/// Interfaces and type variables can be the target of a lambda.
fn is_functional(formal: &JavaType, table: &TypeTable) -> bool {
    match formal {
        JavaType::Class(c) => table.get(&c.fqn).is_some_and(|info| info.is_interface()),
        JavaType::TypeVar(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use jtemplate_core::PrimitiveKind;

    fn table() -> TypeTable {
        Classpath::builtin().build().unwrap()
    }

    fn prim(p: PrimitiveKind) -> Option<JavaType> {
        Some(JavaType::Primitive(p))
    }

    fn resolve(table: &TypeTable, receiver: JavaType, name: &str, args: &[Option<JavaType>]) -> Option<OverloadMatch> {
        let candidates = table.lookup_methods(&receiver, name);
        resolve_overload(&candidates, args, table, &[])
    }

    #[test]
    fn exact_primitive_overload_wins() {
        let table = table();
        let sb = JavaType::class("java.lang.StringBuilder");
        let m = resolve(&table, sb.clone(), "append", &[prim(PrimitiveKind::Int)]).unwrap();
        assert_eq!(m.method.sig.params, vec![JavaType::Primitive(PrimitiveKind::Int)]);
        let m = resolve(&table, sb.clone(), "append", &[prim(PrimitiveKind::Long)]).unwrap();
        assert_eq!(m.method.sig.params, vec![JavaType::Primitive(PrimitiveKind::Long)]);
        let m = resolve(&table, sb, "append", &[prim(PrimitiveKind::Short)]).unwrap();
        assert_eq!(m.method.sig.params, vec![JavaType::Primitive(PrimitiveKind::Int)]);
    }

    #[test]
    fn strict_phase_beats_boxing() {
        let table = table();
        let sb = JavaType::class("java.lang.StringBuilder");
        let m = resolve(&table, sb.clone(), "append", &[Some(JavaType::class("java.lang.Integer"))]).unwrap();
        assert_eq!(m.phase, Phase::Strict);
        assert_eq!(m.method.sig.params, vec![JavaType::object()]);
    }

    #[test]
    fn most_specific_reference_overload() {
        let table = table();
        let sb = JavaType::class("java.lang.StringBuilder");
        let m = resolve(&table, sb, "append", &[Some(JavaType::string())]).unwrap();
        assert_eq!(m.method.sig.params, vec![JavaType::string()]);
    }

    #[test]
    fn generic_method_inference() {
        let table = table();
        let objects = JavaType::class("java.util.Objects");
        let m = resolve(&table, objects, "requireNonNull", &[Some(JavaType::string())]).unwrap();
        assert_eq!(m.return_type, JavaType::string());
        assert_eq!(m.type_args, vec![JavaType::string()]);
    }

    #[test]
    fn generic_receiver_substitution() {
        let table = table();
        let list = JavaType::generic("java.util.List", vec![JavaType::string()]);
        let m = resolve(&table, list.clone(), "get", &[prim(PrimitiveKind::Int)]).unwrap();
        assert_eq!(m.return_type, JavaType::string());
        assert!(resolve(&table, list, "add", &[Some(JavaType::object())]).is_none());
    }

    #[test]
    fn varargs_phase() {
        let table = table();
        let arrays = JavaType::class("java.util.Arrays");
        let m = resolve(
            &table,
            arrays,
            "asList",
            &[Some(JavaType::string()), Some(JavaType::string())],
        )
        .unwrap();
        assert_eq!(m.phase, Phase::Varargs);
        assert_eq!(m.return_type, JavaType::generic("java.util.List", vec![JavaType::string()]));
    }

    #[test]
    fn no_candidate_for_wrong_arity() {
        let table = table();
        let sb = JavaType::class("java.lang.StringBuilder");
        assert!(resolve(&table, sb, "append", &[]).is_none());
    }
}
