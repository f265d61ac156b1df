//! The attributed snippet used for matching.

use std::sync::Arc;

use jtemplate_compiler::{Attributor, Imports, Scope, TypeResolver, resolve_type_params};
use jtemplate_core::{JavaType, TypeParamDecl};
use jtemplate_parser::ast::{Container, Tree};
use jtemplate_registry::TypeTable;
use tracing::trace;

use super::{JavaTemplate, Placeholder, PlaceholderKind};
use crate::Cursor;

/// A snippet attributed with each stub declared as a local of its
/// placeholder's constraint type.
#[derive(Debug)]
pub(crate) struct Pattern {
    pub tree: Tree,
    /// The table the pattern was attributed against.
    pub table: Arc<TypeTable>,
    pub kinds: Vec<PlaceholderKind>,
    /// Effective constraint per placeholder; `None` for untyped holes.
    pub types: Vec<Option<JavaType>>,
    /// The template's generic variables.
    pub generics: Vec<TypeParamDecl>,
    /// Every type variable in scope, for assignability checks.
    pub scope_params: Vec<TypeParamDecl>,
}

/// Scope, imports and placeholder types for attributing template code.
pub(crate) struct TemplateScope {
    pub imports: Imports,
    pub scope: Scope,
    pub generics: Vec<TypeParamDecl>,
    pub types: Vec<Option<JavaType>>,
}

impl TemplateScope {
    /// The scope template code is attributed in: the cursor's scope for
    /// context-sensitive templates, an empty one otherwise, plus the
    /// template's generic variables in a fresh frame.
    pub fn new(template: &JavaTemplate, table: &TypeTable, cursor: Option<&Cursor>) -> Self {
        let mut imports = template.template_imports();
        let mut scope = Scope::new();
        if let Some(cursor) = cursor.filter(|_| template.is_context_sensitive()) {
            let mut visible = cursor.imports();
            visible.extend(&imports);
            imports = visible;
            scope = cursor.scope();
        }

        let declared = Container::new(template.generic_types().to_vec());
        let generics = resolve_type_params(table, &imports, &mut scope, None, Some(&declared));
        scope.push_type_params(generics.clone());
        scope.push_frame();

        let types = {
            let resolver = TypeResolver::new(table, &imports, &scope);
            template
                .placeholders()
                .iter()
                .map(|p| {
                    let ty = p.constraint.as_ref().map(|c| resolver.resolve(c));
                    match p.kind {
                        PlaceholderKind::AnyArray => ty.map(JavaType::array),
                        PlaceholderKind::Any | PlaceholderKind::Literal => ty,
                    }
                })
                .collect()
        };
        Self {
            imports,
            scope,
            generics,
            types,
        }
    }

    /// Whether a placeholder's constraint mentions a template type variable.
    pub fn is_generic(&self, index: usize) -> bool {
        is_generic(&self.types[index], &self.generics)
    }
}

fn is_generic(ty: &Option<JavaType>, generics: &[TypeParamDecl]) -> bool {
    ty.as_ref()
        .is_some_and(|ty| generics.iter().any(|g| ty.mentions_type_var(&g.name)))
}

impl Pattern {
    /// Whether a placeholder's constraint mentions a template type variable.
    pub fn is_generic(&self, index: usize) -> bool {
        is_generic(&self.types[index], &self.generics)
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(template: &JavaTemplate, tree: &Tree, table: &Arc<TypeTable>, cursor: Option<&Cursor>) -> Pattern {
        let TemplateScope {
            imports,
            mut scope,
            generics,
            types,
        } = TemplateScope::new(template, table, cursor);
        for (index, ty) in types.iter().enumerate() {
            scope.declare(Placeholder::stub_name(index), ty.clone().unwrap_or(JavaType::Unknown));
        }
        let scope_params = scope.type_params();

        let mut attributor = Attributor::new(table, imports).with_scope(scope);
        let tree = match tree {
            Tree::Expr(expr) => Tree::Expr(attributor.attribute_expr(expr)),
            Tree::Stmt(stmt) => match attributor.attribute_stmts(std::slice::from_ref(stmt)).pop() {
                Some(stmt) => Tree::Stmt(stmt),
                None => tree.clone(),
            },
            other => other.clone(),
        };
        trace!(kind = tree.kind_name(), "attributed template pattern");

        Pattern {
            tree,
            table: table.clone(),
            kinds: template.placeholders().iter().map(|p| p.kind).collect(),
            types,
            generics,
            scope_params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use jtemplate_compiler::Classpath;
    use jtemplate_core::PrimitiveKind;

    #[test]
    fn stubs_take_their_constraint_types() {
        let table = Arc::new(Classpath::builtin().build().unwrap());
        let template = JavaTemplate::builder("#{any(java.lang.StringBuilder)}.append(#{any(int)})")
            .build()
            .unwrap();
        let tree = template.snippet().unwrap().tree().unwrap();
        let pattern = Pattern::build(&template, &tree, &table, None);
        assert_eq!(
            pattern.types,
            vec![
                Some(JavaType::class("java.lang.StringBuilder")),
                Some(JavaType::Primitive(PrimitiveKind::Int)),
            ]
        );
        let call = pattern.tree.as_expr().unwrap().as_method_call().unwrap();
        let method = call.method_type.as_ref().unwrap();
        assert_eq!(method.params, vec![JavaType::Primitive(PrimitiveKind::Int)]);
        assert!(!pattern.is_generic(0));
    }

    #[test]
    fn generic_constraints_resolve_to_type_variables() {
        let table = Classpath::builtin().build().unwrap();
        let template = JavaTemplate::builder("#{a:anyArray(T)}")
            .generic_types(["T extends Number"])
            .build()
            .unwrap();
        let scope = TemplateScope::new(&template, &table, None);
        assert_eq!(scope.types, vec![Some(JavaType::array(JavaType::TypeVar("T".into())))]);
        assert_eq!(scope.generics[0].bounds, vec![JavaType::class("java.lang.Number")]);
        assert!(scope.is_generic(0));
    }
}
