//! Type-variable substitution and erasure.

use jtemplate_core::{JavaType, TypeParamDecl, Wildcard};
use rustc_hash::FxHashMap;

use crate::class_info::ClassInfo;

/// Mapping from type-variable name to the type it stands for.
pub type TypeSubst = FxHashMap<String, JavaType>;

/// Replace every type variable bound in `subst`; unbound variables are left
/// as they are.
pub fn substitute(ty: &JavaType, subst: &TypeSubst) -> JavaType {
    if subst.is_empty() {
        return ty.clone();
    }
    match ty {
        JavaType::TypeVar(name) => subst.get(name).cloned().unwrap_or_else(|| ty.clone()),
        JavaType::Class(c) => JavaType::generic(
            c.fqn.clone(),
            c.args.iter().map(|a| substitute(a, subst)).collect(),
        ),
        JavaType::Array(elem) => JavaType::array(substitute(elem, subst)),
        JavaType::Wildcard(Wildcard::Extends(b)) => {
            JavaType::Wildcard(Wildcard::Extends(Box::new(substitute(b, subst))))
        }
        JavaType::Wildcard(Wildcard::Super(b)) => {
            JavaType::Wildcard(Wildcard::Super(Box::new(substitute(b, subst))))
        }
        _ => ty.clone(),
    }
}

/// Substitution from `info`'s type parameters to the arguments of `args`.
///
/// A raw reference (no arguments) maps every parameter to the erasure of its
/// first bound.
pub fn class_subst(info: &ClassInfo, args: &[JavaType]) -> TypeSubst {
    let mut subst = TypeSubst::default();
    if args.len() == info.type_params.len() {
        for (param, arg) in info.type_params.iter().zip(args) {
            subst.insert(param.name.clone(), arg.clone());
        }
    } else {
        for param in &info.type_params {
            subst.insert(param.name.clone(), erasure(&bound_of(param), &info.type_params));
        }
    }
    subst
}

/// The erased form of `ty`: arguments dropped and type variables replaced by
/// the erasure of their first bound among `params`.
pub fn erasure(ty: &JavaType, params: &[TypeParamDecl]) -> JavaType {
    match ty {
        JavaType::Class(c) => JavaType::class(c.fqn.clone()),
        JavaType::Array(elem) => JavaType::array(erasure(elem, params)),
        JavaType::TypeVar(name) => match params.iter().find(|p| &p.name == name) {
            Some(param) => match param.bounds.first() {
                Some(JavaType::TypeVar(other)) if other != name => {
                    erasure(&JavaType::TypeVar(other.clone()), params)
                }
                Some(JavaType::Class(c)) => JavaType::class(c.fqn.clone()),
                _ => JavaType::object(),
            },
            None => JavaType::object(),
        },
        JavaType::Wildcard(Wildcard::Extends(b)) => erasure(b, params),
        JavaType::Wildcard(_) => JavaType::object(),
        _ => ty.clone(),
    }
}

fn bound_of(param: &TypeParamDecl) -> JavaType {
    param.bounds.first().cloned().unwrap_or_else(JavaType::object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_info::ClassKind;
    use jtemplate_core::PrimitiveKind;

    fn map_info() -> ClassInfo {
        ClassInfo::new("java.util.Map", ClassKind::Interface)
            .with_type_params(vec![TypeParamDecl::new("K", vec![]), TypeParamDecl::new("V", vec![])])
    }

    #[test]
    fn substitutes_nested_variables() {
        let mut subst = TypeSubst::default();
        subst.insert("T".into(), JavaType::string());
        let ty = JavaType::generic(
            "java.util.List",
            vec![JavaType::Wildcard(Wildcard::Extends(Box::new(JavaType::TypeVar("T".into()))))],
        );
        assert_eq!(
            substitute(&ty, &subst).to_string(),
            "java.util.List<? extends java.lang.String>"
        );
        assert_eq!(
            substitute(&JavaType::array(JavaType::TypeVar("U".into())), &subst),
            JavaType::array(JavaType::TypeVar("U".into()))
        );
    }

    #[test]
    fn class_subst_for_parameterized_and_raw() {
        let info = map_info();
        let subst = class_subst(&info, &[JavaType::string(), JavaType::class("java.lang.Integer")]);
        assert_eq!(subst.get("V"), Some(&JavaType::class("java.lang.Integer")));

        let raw = class_subst(&info, &[]);
        assert_eq!(raw.get("K"), Some(&JavaType::object()));
    }

    #[test]
    fn erasure_uses_first_bound() {
        let params = vec![
            TypeParamDecl::new("T", vec![JavaType::class("java.lang.Number")]),
            TypeParamDecl::new(
                "C",
                vec![JavaType::generic("java.lang.Comparable", vec![JavaType::TypeVar("C".into())])],
            ),
        ];
        assert_eq!(erasure(&JavaType::TypeVar("T".into()), &params), JavaType::class("java.lang.Number"));
        assert_eq!(erasure(&JavaType::TypeVar("C".into()), &params), JavaType::class("java.lang.Comparable"));
        assert_eq!(erasure(&JavaType::TypeVar("X".into()), &params), JavaType::object());
        let int = JavaType::Primitive(PrimitiveKind::Int);
        assert_eq!(erasure(&int, &params), int);
    }
}
