//! Type-variable inference and bound checking.
//!
//! Used for generic method calls (`Collections.max(list)`) and for template
//! holes constrained by declared generic variables (`#{any(T)}`).

use jtemplate_core::{JavaType, PrimitiveKind, TypeParamDecl, Wildcard};
use jtemplate_registry::{TypeSubst, TypeTable, substitute};

/// How a variable that is already bound reacts to a new actual type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The first binding is fixed; later actuals must convert to it.
    Fixed,
    /// The binding widens to the least common supertype found so far.
    Widen,
}

/// Accumulates a substitution for a set of type variables.
#[derive(Debug, Clone)]
pub struct Inference<'a> {
    vars: &'a [TypeParamDecl],
    table: &'a TypeTable,
    binding: Binding,
    subst: TypeSubst,
}

impl<'a> Inference<'a> {
    pub fn new(vars: &'a [TypeParamDecl], table: &'a TypeTable, binding: Binding) -> Self {
        Self {
            vars,
            table,
            binding,
            subst: TypeSubst::default(),
        }
    }

    pub fn subst(&self) -> &TypeSubst {
        &self.subst
    }

    fn is_var(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
    }

    /// Unify `formal` (which may mention the variables) with `actual`.
    /// Returns `false` on a conflicting binding.
    pub fn unify(&mut self, formal: &JavaType, actual: &JavaType) -> bool {
        if actual.is_unknown() {
            return false;
        }
        match formal {
            JavaType::TypeVar(name) if self.is_var(name) => self.bind(name, actual),
            JavaType::Array(elem) => match actual {
                JavaType::Array(actual_elem) => {
                    if actual_elem.is_primitive() && elem.mentions_type_var_in(self.vars) {
                        return false;
                    }
                    self.unify(elem, actual_elem)
                }
                JavaType::Null => true,
                _ => !elem.mentions_type_var_in(self.vars),
            },
            JavaType::Class(class) if class.args.iter().any(|a| a.mentions_type_var_in(self.vars)) => {
                let actual = match actual {
                    JavaType::Primitive(_) => actual.boxed(),
                    JavaType::Null => return true,
                    other => other.clone(),
                };
                let Some(actual_class) = actual.as_class() else {
                    return true;
                };
                let Some(view) = self.table.as_super(actual_class, &class.fqn) else {
                    return true;
                };
                if view.args.len() != class.args.len() {
                    // Raw actual: nothing to learn.
                    return true;
                }
                class
                    .args
                    .iter()
                    .zip(&view.args)
                    .all(|(f, a)| self.unify_arg(f, a))
            }
            _ => true,
        }
    }

    fn unify_arg(&mut self, formal: &JavaType, actual: &JavaType) -> bool {
        match (formal, actual) {
            (JavaType::Wildcard(Wildcard::Extends(f)), JavaType::Wildcard(Wildcard::Extends(a)))
            | (JavaType::Wildcard(Wildcard::Super(f)), JavaType::Wildcard(Wildcard::Super(a))) => {
                self.unify(f, a)
            }
            (JavaType::Wildcard(Wildcard::Extends(f)), a) | (JavaType::Wildcard(Wildcard::Super(f)), a)
                if !matches!(a, JavaType::Wildcard(_)) =>
            {
                self.unify(f, a)
            }
            (JavaType::Wildcard(_), _) => true,
            (f, JavaType::Wildcard(Wildcard::Extends(a))) => self.unify(f, a),
            (_, JavaType::Wildcard(_)) => true,
            (f, a) => self.unify(f, a),
        }
    }

    fn bind(&mut self, name: &str, actual: &JavaType) -> bool {
        let actual = match actual {
            JavaType::Null => return true,
            JavaType::Primitive(PrimitiveKind::Void) => return false,
            JavaType::Primitive(_) => actual.boxed(),
            other => other.clone(),
        };
        let Some(existing) = self.subst.get(name).cloned() else {
            self.subst.insert(name.to_string(), actual);
            return true;
        };
        if existing == actual {
            return true;
        }
        let fits_existing = self.table.is_subtype_in(&actual, &existing, self.vars);
        match self.binding {
            Binding::Fixed => fits_existing,
            Binding::Widen => {
                if !fits_existing {
                    let widened = if self.table.is_subtype_in(&existing, &actual, self.vars) {
                        actual
                    } else {
                        JavaType::object()
                    };
                    self.subst.insert(name.to_string(), widened);
                }
                true
            }
        }
    }

    /// Default every unbound variable to its first bound (or `Object`), then
    /// check every bound with the substitution applied.
    pub fn finish(mut self) -> Option<TypeSubst> {
        for var in self.vars {
            if self.subst.contains_key(&var.name) {
                continue;
            }
            let default = var
                .bounds
                .first()
                .filter(|b| !b.mentions_type_var_in(self.vars))
                .cloned()
                .unwrap_or_else(JavaType::object);
            self.subst.insert(var.name.clone(), default);
        }
        check_bounds(self.vars, &self.subst, self.table).then_some(self.subst)
    }
}

/// Whether every variable's binding satisfies all of its bounds.
pub fn check_bounds(vars: &[TypeParamDecl], subst: &TypeSubst, table: &TypeTable) -> bool {
    vars.iter().all(|var| {
        let Some(bound_to) = subst.get(&var.name) else {
            return true;
        };
        var.bounds.iter().all(|bound| {
            let bound = substitute(bound, subst);
            table.is_subtype_in(bound_to, &bound, vars)
        })
    })
}

/// Infer method type arguments from call arguments.
///
/// `None` when a variable cannot be bound consistently or a bound is violated.
pub fn infer(
    vars: &[TypeParamDecl],
    formals: &[JavaType],
    actuals: &[Option<JavaType>],
    table: &TypeTable,
) -> Option<TypeSubst> {
    let mut inference = Inference::new(vars, table, Binding::Widen);
    for (formal, actual) in formals.iter().zip(actuals) {
        // Lambdas and method references carry no type to learn from.
        let Some(actual) = actual else { continue };
        if !inference.unify(formal, actual) {
            return None;
        }
    }
    inference.finish()
}

/// Replace wildcards at the top level of type arguments by their upper
/// bound, approximating capture conversion for member types.
pub fn upper_bound(ty: &JavaType) -> JavaType {
    match ty {
        JavaType::Wildcard(Wildcard::Extends(b)) => upper_bound(b),
        JavaType::Wildcard(_) => JavaType::object(),
        other => other.clone(),
    }
}

trait MentionsVars {
    fn mentions_type_var_in(&self, vars: &[TypeParamDecl]) -> bool;
}

impl MentionsVars for JavaType {
    fn mentions_type_var_in(&self, vars: &[TypeParamDecl]) -> bool {
        vars.iter().any(|v| self.mentions_type_var(&v.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;

    fn tv(name: &str) -> JavaType {
        JavaType::TypeVar(name.into())
    }

    fn table() -> TypeTable {
        Classpath::builtin().build().unwrap()
    }

    #[test]
    fn infers_from_generic_arguments() {
        let table = table();
        let vars = vec![TypeParamDecl::new("T", vec![])];
        let formals = vec![JavaType::generic("java.util.Collection", vec![tv("T")])];
        let actuals = vec![Some(JavaType::generic("java.util.ArrayList", vec![JavaType::string()]))];
        let subst = infer(&vars, &formals, &actuals, &table).unwrap();
        assert_eq!(subst.get("T"), Some(&JavaType::string()));
    }

    #[test]
    fn primitives_are_boxed() {
        let table = table();
        let vars = vec![TypeParamDecl::new("T", vec![])];
        let subst = infer(&vars, &[tv("T")], &[Some(JavaType::Primitive(PrimitiveKind::Int))], &table).unwrap();
        assert_eq!(subst.get("T"), Some(&JavaType::class("java.lang.Integer")));
    }

    #[test]
    fn violated_bound_fails() {
        let table = table();
        let vars = vec![TypeParamDecl::new("T", vec![JavaType::string()])];
        assert!(infer(&vars, &[tv("T")], &[Some(JavaType::object())], &table).is_none());
        assert!(infer(&vars, &[tv("T")], &[Some(JavaType::string())], &table).is_some());
    }

    #[test]
    fn recursive_bounds() {
        let table = table();
        let vars = vec![TypeParamDecl::new(
            "T",
            vec![JavaType::generic(
                "java.lang.Comparable",
                vec![JavaType::Wildcard(Wildcard::Super(Box::new(tv("T"))))],
            )],
        )];
        assert!(infer(&vars, &[tv("T")], &[Some(JavaType::string())], &table).is_some());
        assert!(infer(&vars, &[tv("T")], &[Some(JavaType::object())], &table).is_none());
    }

    #[test]
    fn fixed_binding_rejects_incompatible_reuse() {
        let table = table();
        let vars = vec![TypeParamDecl::new("T", vec![])];
        let mut fixed = Inference::new(&vars, &table, Binding::Fixed);
        assert!(fixed.unify(&tv("T"), &JavaType::string()));
        assert!(!fixed.unify(&tv("T"), &JavaType::object()));

        let mut widen = Inference::new(&vars, &table, Binding::Widen);
        assert!(widen.unify(&tv("T"), &JavaType::string()));
        assert!(widen.unify(&tv("T"), &JavaType::object()));
        assert_eq!(widen.finish().unwrap().get("T"), Some(&JavaType::object()));
    }
}
