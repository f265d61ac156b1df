//! Resolution of type syntax and type names.
//!
//! Simple names are looked up in this order: type variables in scope,
//! classes nested in an enclosing class, single-type imports, the current
//! package, `java.lang`, then on-demand imports. A name that resolves to
//! nothing becomes [`JavaType::Unknown`].

use std::sync::Arc;

use jtemplate_core::{JavaType, TypeParamDecl, Wildcard};
use jtemplate_parser::ast::{
    BoundKind, CompilationUnit, Container, TypeParam, TypeTree, TypeTreeKind, VarDeclarator, VarDecls,
};
use jtemplate_registry::TypeTable;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::scope::Scope;

/// The import context of a compilation unit or template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imports {
    pub package: Option<String>,
    /// Simple name to fully-qualified name.
    single: FxHashMap<String, String>,
    on_demand: Vec<String>,
    /// `(class, member)` pairs of single static imports.
    static_members: Vec<(String, String)>,
    static_on_demand: Vec<String>,
}

impl Imports {
    pub fn new(package: Option<String>) -> Self {
        Self {
            package,
            ..Self::default()
        }
    }

    pub fn from_unit(unit: &CompilationUnit) -> Self {
        let mut imports = Self::new(unit.package_name().map(str::to_string));
        for import in &unit.imports {
            imports.add(import.name.as_str(), import.is_static());
        }
        imports
    }

    /// Add `a.b.C`, `a.b.*`, or with `is_static` `a.b.C.m` / `a.b.C.*`.
    pub fn add(&mut self, name: &str, is_static: bool) {
        let on_demand = name.strip_suffix(".*");
        match (is_static, on_demand) {
            (false, Some(package)) => self.on_demand.push(package.to_string()),
            (false, None) => {
                let simple = name.rsplit('.').next().unwrap_or(name);
                self.single.insert(simple.to_string(), name.to_string());
            }
            (true, Some(class)) => self.static_on_demand.push(class.to_string()),
            (true, None) => {
                if let Some((class, member)) = name.rsplit_once('.') {
                    self.static_members.push((class.to_string(), member.to_string()));
                }
            }
        }
    }

    /// Merge another import context; existing single-type imports win.
    pub fn extend(&mut self, other: &Imports) {
        for (simple, fqn) in &other.single {
            self.single.entry(simple.clone()).or_insert_with(|| fqn.clone());
        }
        self.on_demand.extend(other.on_demand.iter().cloned());
        self.static_members.extend(other.static_members.iter().cloned());
        self.static_on_demand.extend(other.static_on_demand.iter().cloned());
    }

    /// Classes that statically import a member called `member`.
    pub fn static_sources<'a>(&'a self, member: &'a str) -> impl Iterator<Item = &'a str> {
        self.static_members
            .iter()
            .filter(move |(_, m)| m == member)
            .map(|(class, _)| class.as_str())
            .chain(self.static_on_demand.iter().map(String::as_str))
    }
}

/// Resolves type trees and names against a type table, imports and scope.
pub struct TypeResolver<'a> {
    table: &'a TypeTable,
    imports: &'a Imports,
    scope: &'a Scope,
    /// Classes declared in the unit being registered, not yet in the table.
    pending: Option<&'a FxHashSet<String>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(table: &'a TypeTable, imports: &'a Imports, scope: &'a Scope) -> Self {
        Self {
            table,
            imports,
            scope,
            pending: None,
        }
    }

    pub fn with_pending(mut self, pending: &'a FxHashSet<String>) -> Self {
        self.pending = Some(pending);
        self
    }

    fn is_known(&self, fqn: &str) -> bool {
        self.table.contains(fqn) || self.pending.is_some_and(|p| p.contains(fqn))
    }

    /// Resolve a type tree.
    pub fn resolve(&self, tree: &TypeTree) -> JavaType {
        match &tree.kind {
            TypeTreeKind::Primitive(p) => JavaType::Primitive(*p),
            TypeTreeKind::Array(a) => match self.resolve(&a.elem) {
                JavaType::Unknown => JavaType::Unknown,
                elem => JavaType::array(elem),
            },
            TypeTreeKind::Wildcard(w) => match &w.bound {
                None => JavaType::Wildcard(Wildcard::Unbounded),
                Some(bound) => {
                    let ty = Box::new(self.resolve(&bound.bound));
                    JavaType::Wildcard(match bound.kind {
                        BoundKind::Extends => Wildcard::Extends(ty),
                        BoundKind::Super => Wildcard::Super(ty),
                    })
                }
            },
            TypeTreeKind::Named(named) => {
                let name: String = named.name.chars().filter(|c| !c.is_whitespace()).collect();
                if named.args.is_none() && self.scope.find_type_param(&name).is_some() {
                    return JavaType::TypeVar(name);
                }
                let Some(fqn) = self.resolve_class_name(&name) else {
                    return JavaType::Unknown;
                };
                let args = named
                    .args
                    .as_ref()
                    .map(|args| args.iter().map(|a| self.resolve(a)).collect())
                    .unwrap_or_default();
                JavaType::generic(fqn, args)
            }
        }
    }

    /// The type of one declarator, including `[]` after the name and a
    /// varargs ellipsis. Untyped lambda parameters are unknown.
    pub fn resolve_declarator(&self, decls: &VarDecls, var: &VarDeclarator) -> JavaType {
        let Some(tree) = &decls.type_tree else {
            return JavaType::Unknown;
        };
        let mut ty = self.resolve(tree);
        if ty.is_unknown() {
            return ty;
        }
        for _ in &var.dims {
            ty = JavaType::array(ty);
        }
        if decls.varargs.is_some() {
            ty = JavaType::array(ty);
        }
        ty
    }

    /// Resolve a simple or qualified class name to its fully-qualified name.
    pub fn resolve_class_name(&self, name: &str) -> Option<String> {
        match name.split_once('.') {
            None => self.resolve_simple(name),
            Some((first, rest)) => {
                if self.is_known(name) {
                    return Some(name.to_string());
                }
                let outer = self.resolve_simple(first)?;
                let fqn = format!("{outer}.{rest}");
                self.is_known(&fqn).then_some(fqn)
            }
        }
    }

    fn resolve_simple(&self, name: &str) -> Option<String> {
        for class in self.scope.enclosing_classes() {
            if class.ty.fqn.rsplit('.').next() == Some(name) {
                return Some(class.ty.fqn.clone());
            }
            let nested = format!("{}.{}", class.ty.fqn, name);
            if self.is_known(&nested) {
                return Some(nested);
            }
        }
        if let Some(fqn) = self.imports.single.get(name) {
            return Some(fqn.clone());
        }
        let in_package = match &self.imports.package {
            Some(package) => format!("{package}.{name}"),
            None => name.to_string(),
        };
        if self.is_known(&in_package) {
            return Some(in_package);
        }
        let lang = format!("java.lang.{name}");
        if self.is_known(&lang) {
            return Some(lang);
        }
        self.imports
            .on_demand
            .iter()
            .map(|package| format!("{package}.{name}"))
            .find(|fqn| self.is_known(fqn))
    }
}

/// Resolve a type parameter list. The parameters are visible in their own
/// bounds (`T extends Comparable<T>`).
pub fn resolve_type_params(
    table: &TypeTable,
    imports: &Imports,
    scope: &mut Scope,
    pending: Option<&FxHashSet<String>>,
    params: Option<&Container<Arc<TypeParam>>>,
) -> Vec<TypeParamDecl> {
    let Some(params) = params else {
        return Vec::new();
    };
    scope.push_type_params(params.iter().map(|p| TypeParamDecl::new(p.name.clone(), vec![])).collect());
    let decls = {
        let mut resolver = TypeResolver::new(table, imports, scope);
        if let Some(pending) = pending {
            resolver = resolver.with_pending(pending);
        }
        params
            .iter()
            .map(|p| TypeParamDecl::new(p.name.clone(), p.bound_types().map(|b| resolver.resolve(b)).collect()))
            .collect()
    };
    scope.pop_type_params();
    decls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use jtemplate_core::TypeParamDecl;
    use jtemplate_parser::Parser;

    fn resolve(source: &str, imports: &Imports, scope: &Scope) -> JavaType {
        let table = Classpath::builtin().build().unwrap();
        let tree = Parser::parse_type_str(source).unwrap();
        TypeResolver::new(&table, imports, scope).resolve(&tree)
    }

    #[test]
    fn java_lang_is_implicit() {
        let imports = Imports::default();
        let scope = Scope::new();
        assert_eq!(resolve("String", &imports, &scope), JavaType::string());
        assert_eq!(resolve("List", &imports, &scope), JavaType::Unknown);
    }

    #[test]
    fn single_and_on_demand_imports() {
        let mut imports = Imports::default();
        imports.add("java.util.List", false);
        let scope = Scope::new();
        assert_eq!(
            resolve("List<String>", &imports, &scope),
            JavaType::generic("java.util.List", vec![JavaType::string()])
        );
        let mut imports = Imports::default();
        imports.add("java.util.*", false);
        assert_eq!(resolve("Map.Entry", &imports, &scope), JavaType::class("java.util.Map.Entry"));
    }

    #[test]
    fn qualified_and_array_types() {
        let imports = Imports::default();
        let scope = Scope::new();
        assert_eq!(
            resolve("java.util.List<? extends Number>[]", &imports, &scope).to_string(),
            "java.util.List<? extends java.lang.Number>[]"
        );
    }

    #[test]
    fn type_variables_in_scope() {
        let imports = Imports::default();
        let mut scope = Scope::new();
        scope.push_type_params(vec![TypeParamDecl::new("T", vec![])]);
        assert_eq!(resolve("T", &imports, &scope), JavaType::TypeVar("T".into()));
        assert_eq!(resolve("T[]", &imports, &scope), JavaType::array(JavaType::TypeVar("T".into())));
    }

    #[test]
    fn static_import_sources() {
        let mut imports = Imports::default();
        imports.add("java.lang.Math.max", true);
        imports.add("java.util.Collections.*", true);
        let sources: Vec<_> = imports.static_sources("max").collect();
        assert_eq!(sources, vec!["java.lang.Math", "java.util.Collections"]);
    }
}
