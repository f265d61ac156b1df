//! Method invocations and instance creation.
//!
//! Arguments are attributed first; lambdas and method references are left
//! until the overload is known, then attributed against the chosen
//! parameter types. A call without exactly one applicable overload keeps
//! `method_type == None`.

use std::sync::Arc;

use jtemplate_core::{ClassType, JavaType, MethodType, TypeParamDecl};
use jtemplate_parser::ast::{Container, Expr, ExprKind, MethodCall, NewClass, Padded, TypeTreeKind};
use jtemplate_registry::{ClassInfo, MemberMethod, TypeSubst};
use tracing::trace;

use super::Attributor;
use super::expr::{NameKind, is_poly, typed};
use crate::inference::{Binding, Inference};
use crate::overload::{OverloadMatch, resolve_overload};

impl Attributor<'_> {
    pub(super) fn method_call(&mut self, expr: &Arc<Expr>, call: &MethodCall) -> Arc<Expr> {
        let name = call.name.as_str();
        let (select, candidates) = match &call.select {
            Some(select) => {
                let (target, kind) = self.operand(&select.elem, None);
                let receiver = self.scope.upper_bound(&target.java_type());
                let mut candidates = self.table.lookup_methods(&receiver, name);
                if kind == NameKind::Type {
                    candidates.retain(|m| m.sig.is_static);
                }
                let select = Padded {
                    elem: target,
                    after: select.after.clone(),
                };
                (Some(select), candidates)
            }
            None => (None, self.methods_in_scope(name)),
        };

        let (args, resolved) = self.call_args(&call.args, &candidates);
        if resolved.is_none() {
            trace!(method = name, candidates = candidates.len(), "unresolved method call");
        }
        let method_type = resolved.as_ref().map(OverloadMatch::method_type);
        let ty = resolved.map(|m| m.return_type).unwrap_or(JavaType::Unknown);
        let kind = ExprKind::MethodCall(MethodCall {
            select,
            name: call.name.clone(),
            args,
            method_type,
        });
        typed(expr, kind, ty)
    }

    /// Methods callable without a receiver: members of the enclosing
    /// classes (innermost first), then static imports.
    fn methods_in_scope(&self, name: &str) -> Vec<MemberMethod> {
        for class in self.scope.enclosing_classes() {
            let found = self.table.lookup_methods(&JavaType::Class(class.ty.clone()), name);
            if !found.is_empty() {
                return found;
            }
        }
        self.imports
            .static_sources(name)
            .flat_map(|class| self.table.lookup_methods(&JavaType::class(class), name))
            .filter(|m| m.sig.is_static)
            .collect()
    }

    /// Attribute call arguments and pick the overload.
    fn call_args(
        &mut self,
        args: &Container<Arc<Expr>>,
        candidates: &[MemberMethod],
    ) -> (Container<Arc<Expr>>, Option<OverloadMatch>) {
        let standalone: Vec<Arc<Expr>> = args
            .iter()
            .map(|a| if is_poly(a) { a.clone() } else { self.expr(a, None) })
            .collect();
        let arg_types: Vec<Option<JavaType>> = standalone
            .iter()
            .map(|a| (!is_poly(a)).then(|| a.java_type()))
            .collect();
        let resolved = resolve_overload(candidates, &arg_types, self.table, &self.type_params());

        let mut elems = Vec::with_capacity(args.elems.len());
        for (i, (padded, arg)) in args.elems.iter().zip(standalone).enumerate() {
            let arg = if is_poly(&arg) {
                let target = resolved.as_ref().and_then(|m| m.param_types.get(i)).cloned();
                self.expr(&arg, target.as_ref())
            } else {
                arg
            };
            elems.push(Padded {
                elem: arg,
                after: padded.after.clone(),
            });
        }
        let args = Container {
            before: args.before.clone(),
            elems,
            close: args.close.clone(),
        };
        (args, resolved)
    }

    pub(super) fn new_class(&mut self, expr: &Arc<Expr>, new: &NewClass, expected: Option<&JavaType>) -> Arc<Expr> {
        let declared = self.resolve_type(&new.clazz);
        let is_diamond = matches!(
            &new.clazz.kind,
            TypeTreeKind::Named(named) if named.args.as_ref().is_some_and(|a| a.is_empty())
        );

        let table = self.table;
        let info = declared.as_class().and_then(|c| table.get(&c.fqn));
        let (class, args, constructor_type) = match (declared.as_class(), info) {
            (Some(_), Some(info)) if is_diamond && !info.type_params.is_empty() => {
                self.diamond(info, &new.args, expected)
            }
            (Some(class), Some(_)) => {
                let candidates = table.constructors(class);
                let (args, resolved) = self.call_args(&new.args, &candidates);
                (Some(class.clone()), args, resolved.map(|m| m.method_type()))
            }
            _ => {
                let (args, _) = self.call_args(&new.args, &[]);
                (None, args, None)
            }
        };
        if class.is_some() && constructor_type.is_none() {
            trace!(class = %declared, "unresolved constructor");
        }

        let ty = class.map(JavaType::Class).unwrap_or(JavaType::Unknown);
        let clazz = self.type_tree_as(&new.clazz, ty.clone());
        let body = new.body.as_ref().map(|body| match ty.as_class() {
            Some(class) => {
                self.scope.push_class(class.clone(), false);
                let body = self.class_body(body);
                self.scope.pop_class();
                body
            }
            None => self.class_body(body),
        });
        let kind = ExprKind::NewClass(NewClass {
            clazz,
            args,
            body,
            constructor_type,
        });
        typed(expr, kind, ty)
    }

    /// `new C<>(args)`: class type arguments come from the expected type
    /// when there is one, otherwise they are inferred from the constructor
    /// arguments like method type arguments.
    fn diamond(
        &mut self,
        info: &ClassInfo,
        args: &Container<Arc<Expr>>,
        expected: Option<&JavaType>,
    ) -> (Option<ClassType>, Container<Arc<Expr>>, Option<MethodType>) {
        if let Some(class) = expected.and_then(|e| self.diamond_from_target(info, e)) {
            let candidates = self.table.constructors(&class);
            let (args, resolved) = self.call_args(args, &candidates);
            return (Some(class), args, resolved.map(|m| m.method_type()));
        }

        let class_vars = info.type_params.len();
        let candidates: Vec<MemberMethod> = info
            .constructors
            .iter()
            .map(|sig| {
                let mut sig = sig.clone();
                let mut vars: Vec<TypeParamDecl> = info.type_params.clone();
                vars.append(&mut sig.type_params);
                sig.type_params = vars;
                MemberMethod {
                    declaring: info.fqn.clone(),
                    sig,
                    subst: TypeSubst::default(),
                }
            })
            .collect();
        let (args, resolved) = self.call_args(args, &candidates);
        let Some(resolved) = resolved else {
            let raw = ClassType {
                fqn: info.fqn.clone(),
                args: Vec::new(),
            };
            return (Some(raw), args, None);
        };
        let class = ClassType {
            fqn: info.fqn.clone(),
            args: resolved.type_args[..class_vars].to_vec(),
        };
        let mut method_type = resolved.method_type();
        method_type.type_args.drain(..class_vars);
        (Some(class), args, Some(method_type))
    }

    fn diamond_from_target(&self, info: &ClassInfo, expected: &JavaType) -> Option<ClassType> {
        let target = expected.as_class()?;
        let this = info.this_type();
        let view = self.table.as_super(&this, &target.fqn)?;
        let mut inference = Inference::new(&info.type_params, self.table, Binding::Fixed);
        if !inference.unify(&JavaType::Class(view), expected) {
            return None;
        }
        let subst = inference.finish()?;
        let args = info
            .type_params
            .iter()
            .map(|p| subst.get(&p.name).cloned().unwrap_or_else(JavaType::object))
            .collect();
        Some(ClassType {
            fqn: info.fqn.clone(),
            args,
        })
    }
}
