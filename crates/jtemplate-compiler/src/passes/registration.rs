//! Registration pass: class declarations to [`ClassInfo`] entries.
//!
//! All classes of a batch are collected before any signature is resolved,
//! so supertypes and members may name classes declared later in the batch.

use std::sync::Arc;

use jtemplate_core::{ClassType, JavaType, RegistrationError};
use jtemplate_parser::ast::{self, ClassDecl, CompilationUnit, MethodDecl, Modifiers, StmtKind};
use jtemplate_registry::{ClassInfo, ClassKind, FieldSig, MethodSig, TypeTable};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::scope::Scope;
use crate::type_resolver::{Imports, TypeResolver, resolve_type_params};

/// Enters declared classes into a [`TypeTable`].
pub struct RegistrationPass<'t> {
    table: &'t mut TypeTable,
}

struct UnitContext<'a> {
    table: &'a TypeTable,
    imports: Imports,
    pending: &'a FxHashSet<String>,
    scope: Scope,
    infos: Vec<ClassInfo>,
}

impl<'t> RegistrationPass<'t> {
    pub fn new(table: &'t mut TypeTable) -> Self {
        Self { table }
    }

    /// Register every class of `unit`, returning their fully-qualified names.
    pub fn register_unit(&mut self, unit: &Arc<CompilationUnit>) -> Result<Vec<String>, RegistrationError> {
        self.register_units(std::slice::from_ref(unit))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register_units(&mut self, units: &[Arc<CompilationUnit>]) -> Result<Vec<String>, RegistrationError> {
        let mut pending = FxHashSet::default();
        for unit in units {
            let owner = unit.package_name().unwrap_or_default();
            for class in unit.classes() {
                collect_names(owner, class, &mut pending);
            }
        }

        let mut infos = Vec::new();
        for unit in units {
            let mut cx = UnitContext {
                table: &*self.table,
                imports: Imports::from_unit(unit),
                pending: &pending,
                scope: Scope::new(),
                infos: Vec::new(),
            };
            let owner = unit.package_name().unwrap_or_default();
            for class in unit.classes() {
                cx.class_info(owner, class);
            }
            infos.append(&mut cx.infos);
        }

        let mut names = Vec::with_capacity(infos.len());
        for info in infos {
            names.push(info.fqn.clone());
            self.table.register(info)?;
        }
        debug!(classes = names.len(), "registered classes");
        Ok(names)
    }

    /// Swap the classes `old` declares for those `new` declares, for a unit
    /// whose declarations were edited.
    pub fn replace_unit(
        &mut self,
        old: &Arc<CompilationUnit>,
        new: &Arc<CompilationUnit>,
    ) -> Result<Vec<String>, RegistrationError> {
        let mut stale = FxHashSet::default();
        let owner = old.package_name().unwrap_or_default();
        for class in old.classes() {
            collect_names(owner, class, &mut stale);
        }
        for fqn in &stale {
            self.table.unregister(fqn);
        }
        self.register_unit(new)
    }
}

fn qualify(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        name.to_string()
    } else {
        format!("{owner}.{name}")
    }
}

fn collect_names(owner: &str, class: &ClassDecl, out: &mut FxHashSet<String>) {
    let fqn = qualify(owner, class.name.as_str());
    for member in class.members() {
        if let Some(nested) = member.as_class() {
            collect_names(&fqn, nested, out);
        }
    }
    out.insert(fqn);
}

impl UnitContext<'_> {
    fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.table, &self.imports, &self.scope).with_pending(self.pending)
    }

    fn resolve(&self, tree: &ast::TypeTree) -> JavaType {
        self.resolver().resolve(tree)
    }

    fn class_info(&mut self, owner: &str, decl: &ClassDecl) {
        let fqn = qualify(owner, decl.name.as_str());
        let kind = match decl.kind {
            ast::ClassKind::Class => ClassKind::Class,
            ast::ClassKind::Interface => ClassKind::Interface,
        };
        let type_params = resolve_type_params(
            self.table,
            &self.imports,
            &mut self.scope,
            Some(self.pending),
            decl.type_params.as_ref(),
        );
        self.scope.push_type_params(type_params.clone());
        let this_type = ClassType {
            fqn: fqn.clone(),
            args: type_params.iter().map(|p| JavaType::TypeVar(p.name.clone())).collect(),
        };
        let is_static = kind == ClassKind::Interface || decl.flags().contains(Modifiers::STATIC);
        self.scope.push_class(this_type, is_static);

        let mut info = ClassInfo::new(fqn.clone(), kind).with_type_params(type_params);
        let extends: Vec<JavaType> = decl.extends.iter().flat_map(|l| l.iter()).map(|t| self.resolve(t)).collect();
        let implements: Vec<JavaType> = decl.implements.iter().flat_map(|l| l.iter()).map(|t| self.resolve(t)).collect();
        match kind {
            ClassKind::Class => {
                if let Some(superclass) = extends.into_iter().find(|t| !t.is_unknown()) {
                    info.superclass = Some(superclass);
                }
                info.interfaces = implements;
            }
            ClassKind::Interface => info.interfaces = extends,
        }
        info.interfaces.retain(|t| !t.is_unknown());

        for member in decl.members() {
            match &member.kind {
                StmtKind::Variables(vars) => {
                    let is_static = info.is_interface() || ast::modifier_flags(&vars.modifiers).contains(Modifiers::STATIC);
                    for var in &vars.vars {
                        let ty = self.resolver().resolve_declarator(vars, &var.elem);
                        info.fields.push(FieldSig::new(var.elem.name.as_str(), ty, is_static));
                    }
                }
                StmtKind::Method(method) => {
                    let sig = self.method_sig(method);
                    if method.is_constructor() {
                        info.constructors.push(sig);
                    } else {
                        info.methods.push(sig);
                    }
                }
                StmtKind::Class(nested) => self.class_info(&fqn, nested),
                _ => {}
            }
        }
        if kind == ClassKind::Class && info.constructors.is_empty() {
            info.constructors.push(MethodSig::constructor(Vec::new()));
        }

        self.scope.pop_class();
        self.scope.pop_type_params();
        self.infos.push(info);
    }

    fn method_sig(&mut self, method: &MethodDecl) -> MethodSig {
        let type_params = resolve_type_params(
            self.table,
            &self.imports,
            &mut self.scope,
            Some(self.pending),
            method.type_params.as_ref(),
        );
        self.scope.push_type_params(type_params.clone());

        let mut params = Vec::with_capacity(method.params.len());
        let mut is_varargs = false;
        for param in method.params.iter() {
            let Some(vars) = param.as_variables() else {
                continue;
            };
            is_varargs = vars.varargs.is_some();
            for var in &vars.vars {
                params.push(self.resolver().resolve_declarator(vars, &var.elem));
            }
        }

        let mut sig = match &method.return_type {
            Some(ret) => MethodSig::new(method.name.as_str(), params, self.resolve(ret)),
            None => MethodSig::constructor(params),
        }
        .with_type_params(type_params);
        let flags = method.flags();
        sig.is_static = flags.contains(Modifiers::STATIC);
        sig.is_default = flags.contains(Modifiers::DEFAULT);
        sig.is_varargs = is_varargs;

        self.scope.pop_type_params();
        sig
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_core::{PrimitiveKind, TypeParamDecl};
    use jtemplate_parser::Parser;
    use pretty_assertions::assert_eq;

    fn register(source: &str) -> TypeTable {
        let mut table = TypeTable::new();
        let unit = Parser::parse_compilation_unit(source).unwrap();
        RegistrationPass::new(&mut table).register_unit(&unit).unwrap();
        table
    }

    #[test]
    fn classes_and_members() {
        let table = register(
            "package p;\n\
             public class A<T extends B> extends B implements I {\n\
                 static int count;\n\
                 T value, values[];\n\
                 public A(T value) {}\n\
                 public <U> U map(U u, int... rest) { return u; }\n\
                 static class Inner {}\n\
             }\n\
             class B {}\n\
             interface I { int X = 1; void run(); default void stop() {} }",
        );
        let a = table.get("p.A").unwrap();
        assert_eq!(a.superclass, Some(JavaType::class("p.B")));
        assert_eq!(a.interfaces, vec![JavaType::class("p.I")]);
        assert_eq!(a.type_params, vec![TypeParamDecl::new("T", vec![JavaType::class("p.B")])]);
        assert_eq!(a.fields.len(), 3);
        assert!(a.field("count").unwrap().is_static);
        assert_eq!(a.field("values").unwrap().ty, JavaType::array(JavaType::TypeVar("T".into())));
        assert_eq!(a.constructors.len(), 1);
        assert_eq!(a.constructors[0].params, vec![JavaType::TypeVar("T".into())]);

        let map = a.methods_named("map").next().unwrap();
        assert!(map.is_varargs);
        assert_eq!(map.params[1], JavaType::array(JavaType::Primitive(PrimitiveKind::Int)));
        assert_eq!(map.return_type, JavaType::TypeVar("U".into()));

        assert!(table.contains("p.A.Inner"));
        assert_eq!(table.get("p.B").unwrap().constructors.len(), 1);
        let i = table.get("p.I").unwrap();
        assert!(i.is_interface());
        assert!(i.field("X").unwrap().is_static);
        assert!(i.constructors.is_empty());
        assert!(i.methods_named("run").next().unwrap().is_abstract());
        assert!(i.methods_named("stop").next().unwrap().is_default);
    }

    #[test]
    fn forward_references_across_units() {
        let mut table = TypeTable::new();
        let first = Parser::parse_compilation_unit("package a; import b.Y; public class X extends Y {}").unwrap();
        let second = Parser::parse_compilation_unit("package b; public class Y {}").unwrap();
        let names = RegistrationPass::new(&mut table).register_units(&[first, second]).unwrap();
        assert_eq!(names, vec!["a.X".to_string(), "b.Y".to_string()]);
        assert_eq!(table.get("a.X").unwrap().superclass, Some(JavaType::class("b.Y")));
    }

    #[test]
    fn duplicate_classes_are_rejected() {
        let mut table = TypeTable::new();
        let unit = Parser::parse_compilation_unit("class A {} class A {}").unwrap();
        let err = RegistrationPass::new(&mut table).register_unit(&unit).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateClass { .. }));
    }
}
