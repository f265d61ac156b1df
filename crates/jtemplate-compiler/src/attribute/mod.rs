//! Attribution: static types for parsed trees.
//!
//! The [`Attributor`] rebuilds the nodes it visits with `ty`,
//! `method_type` and `constructor_type` filled in. Ids, prefixes and all
//! other fields are kept, so an attributed tree prints exactly like the
//! parsed one. Whatever cannot be resolved stays `None`; attribution never
//! fails.
//!
//! # Example
//!
//! ```ignore
//! let table = Classpath::builtin().build()?;
//! let unit = Parser::parse_compilation_unit(source)?;
//! let unit = attribute_unit(&unit, &table);
//! ```

mod calls;
mod expr;
mod stmt;

use std::sync::Arc;

use jtemplate_core::{JavaType, TypeParamDecl};
use jtemplate_parser::ast::{Annotation, CompilationUnit, Container, Expr, Modifier, Padded, Stmt, TypeTree, TypeTreeKind};
use jtemplate_registry::TypeTable;
use tracing::trace;

use crate::scope::Scope;
use crate::type_resolver::{Imports, TypeResolver};

/// Attributes trees against a type table, an import context and a scope.
pub struct Attributor<'a> {
    table: &'a TypeTable,
    imports: Imports,
    scope: Scope,
    /// Return types of the enclosing methods and lambdas, innermost last.
    returns: Vec<JavaType>,
}

impl<'a> Attributor<'a> {
    pub fn new(table: &'a TypeTable, imports: Imports) -> Self {
        Self {
            table,
            imports,
            scope: Scope::new(),
            returns: Vec::new(),
        }
    }

    /// Start from an existing scope (the context of a cursor).
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn table(&self) -> &'a TypeTable {
        self.table
    }

    pub fn imports(&self) -> &Imports {
        &self.imports
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Attribute every class of a compilation unit. The unit's classes are
    /// expected to be registered in the table already.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn attribute_unit(&mut self, unit: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
        trace!(classes = unit.types.len(), "attributing compilation unit");
        let types = unit.types.iter().map(|t| self.stmt(t)).collect();
        Arc::new(CompilationUnit {
            types,
            ..(**unit).clone()
        })
    }

    /// Attribute a standalone expression.
    pub fn attribute_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        self.expr(expr, None)
    }

    /// Attribute an expression in a context expecting `expected` (for
    /// lambdas, diamonds and array initializers).
    pub fn attribute_expr_as(&mut self, expr: &Arc<Expr>, expected: &JavaType) -> Arc<Expr> {
        self.expr(expr, Some(expected))
    }

    /// Attribute statements in the current frame; their declarations stay
    /// visible afterwards.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn attribute_stmts(&mut self, stmts: &[Arc<Stmt>]) -> Vec<Arc<Stmt>> {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }

    /// Attribute class members in the innermost enclosing class.
    pub fn attribute_members(&mut self, members: &[Arc<Stmt>]) -> Vec<Arc<Stmt>> {
        members.iter().map(|m| self.member(m)).collect()
    }

    /// Resolve a type tree and every type tree nested in it.
    pub fn attribute_type(&self, tree: &Arc<TypeTree>) -> Arc<TypeTree> {
        let ty = self.resolve_type(tree);
        self.type_tree_as(tree, ty)
    }

    pub fn attribute_annotation(&mut self, annotation: &Arc<Annotation>) -> Arc<Annotation> {
        let ty = self.resolver().resolve_class_name(&annotation.name).map(JavaType::class);
        let args = annotation.args.as_ref().map(|args| map_container(args, |e| self.expr(e, None)));
        Arc::new(Annotation {
            args,
            ty,
            ..(**annotation).clone()
        })
    }

    fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.table, &self.imports, &self.scope)
    }

    fn resolve_type(&self, tree: &TypeTree) -> JavaType {
        self.resolver().resolve(tree)
    }

    fn type_params(&self) -> Vec<TypeParamDecl> {
        self.scope.type_params()
    }

    /// Rebuild `tree` with `ty` on the root and resolved nested types.
    fn type_tree_as(&self, tree: &Arc<TypeTree>, ty: JavaType) -> Arc<TypeTree> {
        let kind = match &tree.kind {
            TypeTreeKind::Primitive(_) => tree.kind.clone(),
            TypeTreeKind::Named(named) => {
                let mut named = named.clone();
                named.args = named.args.as_ref().map(|args| map_container(args, |a| self.attribute_type(a)));
                TypeTreeKind::Named(named)
            }
            TypeTreeKind::Array(array) => {
                let mut array = array.clone();
                array.elem = self.attribute_type(&array.elem);
                TypeTreeKind::Array(array)
            }
            TypeTreeKind::Wildcard(wildcard) => {
                let mut wildcard = wildcard.clone();
                if let Some(bound) = &mut wildcard.bound {
                    bound.bound = self.attribute_type(&bound.bound);
                }
                TypeTreeKind::Wildcard(wildcard)
            }
        };
        Arc::new(TypeTree {
            kind,
            ty: known(ty),
            ..(**tree).clone()
        })
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) -> Vec<Modifier> {
        modifiers
            .iter()
            .map(|m| match m {
                Modifier::Annotation(a) => Modifier::Annotation(self.attribute_annotation(a)),
                Modifier::Keyword(_) => m.clone(),
            })
            .collect()
    }
}

/// Attribute a registered compilation unit with its own imports.
pub fn attribute_unit(unit: &Arc<CompilationUnit>, table: &TypeTable) -> Arc<CompilationUnit> {
    Attributor::new(table, Imports::from_unit(unit)).attribute_unit(unit)
}

/// `Unknown` is stored as `None`.
fn known(ty: JavaType) -> Option<JavaType> {
    (!ty.is_unknown()).then_some(ty)
}

fn map_container<T, U>(container: &Container<T>, mut f: impl FnMut(&T) -> U) -> Container<U> {
    Container {
        before: container.before.clone(),
        elems: container
            .elems
            .iter()
            .map(|p| Padded {
                elem: f(&p.elem),
                after: p.after.clone(),
            })
            .collect(),
        close: container.close.clone(),
    }
}
