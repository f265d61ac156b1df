//! A position in a source file: the path from the compilation unit down to
//! one node.

use std::iter;
use std::sync::Arc;

use jtemplate_compiler::{Imports, LocalVar, Scope, resolve_type_params};
use jtemplate_core::JavaType;
use jtemplate_parser::ast::{
    ClassDecl, ClassKind, ExprKind, LambdaBody, MethodDecl, Modifiers, Stmt, StmtKind, Tree, modifier_flags,
};
use jtemplate_registry::TypeTable;

use crate::SourceFile;

/// An immutable path into a [`SourceFile`].
#[derive(Debug, Clone)]
pub struct Cursor {
    file: SourceFile,
    /// From the compilation unit down to the parent of `value`.
    ancestors: Vec<Tree>,
    value: Tree,
}

impl Cursor {
    /// A cursor at the root of `file`.
    pub fn new(file: SourceFile) -> Self {
        let value = Tree::Unit(file.unit().clone());
        Self {
            file,
            ancestors: Vec::new(),
            value,
        }
    }

    pub(crate) fn from_path(file: SourceFile, ancestors: Vec<Tree>, value: Tree) -> Self {
        Self { file, ancestors, value }
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// The node the cursor points at.
    pub fn value(&self) -> &Tree {
        &self.value
    }

    /// Nodes from the compilation unit down to the parent, outermost first.
    pub fn ancestors(&self) -> &[Tree] {
        &self.ancestors
    }

    /// Every node from the compilation unit down to the value.
    pub fn path(&self) -> impl Iterator<Item = &Tree> {
        self.ancestors.iter().chain(iter::once(&self.value))
    }

    pub fn parent_tree(&self) -> Option<&Tree> {
        self.ancestors.last()
    }

    pub fn parent(&self) -> Option<Cursor> {
        let (value, ancestors) = self.ancestors.split_last()?;
        Some(Cursor::from_path(self.file.clone(), ancestors.to_vec(), value.clone()))
    }

    /// A cursor at `tree`, a direct child of the value.
    pub fn child(&self, tree: impl Into<Tree>) -> Cursor {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.value.clone());
        Cursor::from_path(self.file.clone(), ancestors, tree.into())
    }

    /// The innermost class declaration containing the value, or the value
    /// itself when it is one.
    pub fn enclosing_class(&self) -> Option<&Arc<Stmt>> {
        self.innermost(|s| s.as_class().is_some())
    }

    /// The innermost method or constructor containing the value, or the value
    /// itself when it is one.
    pub fn enclosing_method(&self) -> Option<&Arc<Stmt>> {
        self.innermost(|s| s.as_method().is_some())
    }

    fn innermost(&self, pred: impl Fn(&Stmt) -> bool) -> Option<&Arc<Stmt>> {
        let mut path: Vec<&Tree> = self.path().collect();
        path.reverse();
        path.into_iter().filter_map(Tree::as_stmt).find(|s| pred(s))
    }

    /// The imports of the file.
    pub fn imports(&self) -> Imports {
        Imports::from_unit(self.file.unit())
    }

    /// Locals, parameters, type variables and enclosing classes visible at
    /// the value.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn scope(&self) -> Scope {
        let imports = self.imports();
        let mut builder = ScopeBuilder {
            table: self.file.table(),
            imports: &imports,
            scope: Scope::new(),
        };
        let path: Vec<&Tree> = self.path().collect();
        for (index, tree) in path.iter().enumerate() {
            let parent = index.checked_sub(1).map(|i| path[i]);
            builder.enter(tree, parent, path.get(index + 1).copied());
        }
        builder.scope
    }

    /// Variables visible at the value, sorted by name.
    pub fn visible_variables(&self) -> Vec<LocalVar> {
        self.scope().locals()
    }
}

/// Whether a block under `tree` is a class body.
pub(crate) fn is_class_like(tree: &Tree) -> bool {
    match tree {
        Tree::Stmt(stmt) => stmt.as_class().is_some(),
        Tree::Expr(expr) => matches!(expr.kind, ExprKind::NewClass(_)),
        _ => false,
    }
}

struct ScopeBuilder<'a> {
    table: &'a TypeTable,
    imports: &'a Imports,
    scope: Scope,
}

impl ScopeBuilder<'_> {
    /// Extend the scope with what `tree` declares for code inside `next`
    /// (`None` when `tree` is the cursor value itself).
    fn enter(&mut self, tree: &Tree, parent: Option<&Tree>, next: Option<&Tree>) {
        match tree {
            Tree::Stmt(stmt) => match &stmt.kind {
                StmtKind::Class(class) => self.class(class),
                StmtKind::Method(method) => self.method(method),
                StmtKind::Block(block) => {
                    if parent.is_some_and(is_class_like) {
                        // Members are not locals.
                        return;
                    }
                    self.scope.push_frame();
                    if block.static_init.is_some() {
                        self.scope.set_static(true);
                    }
                    let before = block
                        .stmts
                        .iter()
                        .take_while(|s| next.is_none_or(|n| n.id() != s.id));
                    for stmt in before {
                        self.declare_variables(stmt);
                    }
                }
                StmtKind::Variables(vars) if next.is_some() => {
                    if modifier_flags(&vars.modifiers).contains(Modifiers::STATIC) {
                        self.scope.set_static(true);
                    }
                }
                StmtKind::For(for_loop) => {
                    self.scope.push_frame();
                    if next.is_none_or(|n| n.id() != for_loop.init.id) {
                        self.declare_variables(&for_loop.init);
                    }
                }
                StmtKind::ForEach(for_each) => {
                    self.scope.push_frame();
                    if next.is_none_or(|n| n.id() == for_each.body.id) {
                        self.declare_variables(&for_each.var);
                    }
                }
                _ => {}
            },
            Tree::Expr(expr) => match &expr.kind {
                ExprKind::Lambda(lambda) => {
                    let in_body = match &lambda.body {
                        LambdaBody::Expr(e) => next.is_none_or(|n| n.id() == e.id),
                        LambdaBody::Block(b) => next.is_none_or(|n| n.id() == b.id),
                    };
                    self.scope.push_frame();
                    if in_body {
                        for param in lambda.params.iter() {
                            self.declare_variables(param);
                        }
                    }
                }
                ExprKind::NewClass(new) => {
                    let in_body = new.body.as_ref().is_some_and(|b| next.is_some_and(|n| n.id() == b.id));
                    if let (true, Some(JavaType::Class(class))) = (in_body, &expr.ty) {
                        self.scope.push_class(class.clone(), false);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn class(&mut self, decl: &ClassDecl) {
        let Some(JavaType::Class(this)) = &decl.ty else {
            return;
        };
        if decl.kind == ClassKind::Interface || decl.flags().contains(Modifiers::STATIC) {
            self.scope.set_static(true);
        }
        let type_params = self
            .table
            .get(&this.fqn)
            .map(|info| info.type_params.clone())
            .unwrap_or_default();
        self.scope.push_type_params(type_params);
        self.scope.push_class(this.clone(), false);
    }

    fn method(&mut self, method: &MethodDecl) {
        let type_params = resolve_type_params(
            self.table,
            self.imports,
            &mut self.scope,
            None,
            method.type_params.as_ref(),
        );
        self.scope.push_type_params(type_params);
        self.scope.set_static(method.flags().contains(Modifiers::STATIC));
        self.scope.push_frame();
        for param in method.params.iter() {
            self.declare_variables(param);
        }
    }

    fn declare_variables(&mut self, stmt: &Stmt) {
        let Some(vars) = stmt.as_variables() else {
            return;
        };
        for var in &vars.vars {
            let ty = var.elem.ty.clone().unwrap_or(JavaType::Unknown);
            self.scope.declare(var.elem.name.as_str(), ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_core::PrimitiveKind;

    fn names(vars: &[LocalVar]) -> Vec<&str> {
        vars.iter().map(|v| v.name.as_str()).collect()
    }

    const SOURCE: &str = "\
import java.util.List;

class A<E> {
    int field;

    <T extends Number> void m(int x, List<T> ts) {
        String before = \"\";
        for (int i = 0; i < x; i++) {
            ts.forEach(t -> t.intValue());
        }
        long after = 1L;
    }

    static void s() {
        int y = 0;
    }
}
";

    #[test]
    fn scope_collects_parameters_and_earlier_locals() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = file.find_expr("t.intValue()").unwrap();
        let scope = cursor.scope();
        assert_eq!(names(&scope.locals()), vec!["before", "i", "t", "ts", "x"]);
        assert_eq!(scope.lookup("x"), Some(&JavaType::Primitive(PrimitiveKind::Int)));
        assert!(scope.find_type_param("T").is_some());
        assert!(scope.find_type_param("E").is_some());
        assert_eq!(scope.enclosing_class().unwrap().ty.fqn, "A");
        assert!(!scope.enclosing_class().unwrap().is_static);
    }

    #[test]
    fn static_methods_are_static_contexts() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = file.find_stmt("int y = 0;").unwrap();
        let scope = cursor.scope();
        assert!(scope.enclosing_class().unwrap().is_static);
        assert!(scope.lookup("y").is_none());
        assert!(scope.lookup("x").is_none());
    }

    #[test]
    fn enclosing_declarations() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = file.find_expr("1L").unwrap();
        let method = cursor.enclosing_method().unwrap();
        assert_eq!(method.as_method().unwrap().name.as_str(), "m");
        let class = cursor.enclosing_class().unwrap();
        assert_eq!(class.as_class().unwrap().name.as_str(), "A");

        let parent = cursor.parent().unwrap();
        assert_eq!(parent.value().kind_name(), "variable declarations");
        assert_eq!(parent.ancestors().len(), cursor.ancestors().len() - 1);
        assert!(file.cursor().parent().is_none());
        assert_eq!(cursor.path().count(), cursor.ancestors().len() + 1);
    }

    #[test]
    fn imports_come_from_the_file() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let imports = file.cursor().imports();
        let mut expected = Imports::new(None);
        expected.add("java.util.List", false);
        assert_eq!(imports, expected);
    }
}
