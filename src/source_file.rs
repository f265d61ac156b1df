//! An attributed source file and the type table it was attributed against.

use std::sync::Arc;

use jtemplate_compiler::{Classpath, RegistrationPass, compile};
use jtemplate_core::{Error, RegistrationError};
use jtemplate_parser::Parser;
use jtemplate_parser::ast::visitor::{self, Visitor};
use jtemplate_parser::ast::{Annotation, CompilationUnit, Expr, Import, Print, Stmt, Tree, TypeParam, TypeTree};
use jtemplate_registry::TypeTable;
use tracing::debug;

use crate::Cursor;

/// A parsed, registered and attributed compilation unit.
///
/// Cheap to clone: both halves are shared.
#[derive(Debug, Clone)]
pub struct SourceFile {
    unit: Arc<CompilationUnit>,
    table: Arc<TypeTable>,
}

impl SourceFile {
    /// Parse and attribute `source` against the builtin classpath.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let classpath = Classpath::builtin().build()?;
        Self::parse_with(source, &classpath)
    }

    /// Parse and attribute `source` against `classpath`. The classes the
    /// source declares are registered into a copy of the table.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_with(source: &str, classpath: &TypeTable) -> Result<Self, Error> {
        let unit = Parser::parse_compilation_unit(source)?;
        let mut compilation = compile(std::slice::from_ref(&unit), classpath)?;
        let unit = compilation.units.pop().unwrap_or(unit);
        debug!(classes = unit.types.len(), table = compilation.table.id().as_u64(), "source file attributed");
        Ok(Self {
            unit,
            table: Arc::new(compilation.table),
        })
    }

    /// Wrap an already attributed unit.
    pub fn from_parts(unit: Arc<CompilationUnit>, table: Arc<TypeTable>) -> Self {
        Self { unit, table }
    }

    pub fn unit(&self) -> &Arc<CompilationUnit> {
        &self.unit
    }

    pub fn table(&self) -> &Arc<TypeTable> {
        &self.table
    }

    /// The same table with a different tree.
    pub(crate) fn with_unit(&self, unit: Arc<CompilationUnit>) -> Self {
        Self {
            unit,
            table: self.table.clone(),
        }
    }

    /// A tree whose declarations were edited: its classes are registered
    /// again into a copy of the table.
    pub(crate) fn redeclared(&self, unit: Arc<CompilationUnit>) -> Result<Self, RegistrationError> {
        let mut table = TypeTable::clone(&self.table);
        let classes = RegistrationPass::new(&mut table).replace_unit(&self.unit, &unit)?;
        debug!(classes = classes.len(), table = table.id().as_u64(), "declarations registered again");
        Ok(Self {
            unit,
            table: Arc::new(table),
        })
    }

    pub fn print(&self) -> String {
        self.unit.print()
    }

    /// A cursor at the compilation unit.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Cursors at every node, in source order.
    pub fn walk(&self) -> Vec<Cursor> {
        let mut walker = Walker {
            file: self,
            path: Vec::new(),
            cursors: Vec::new(),
        };
        walker.visit_unit(&self.unit);
        walker.cursors
    }

    /// The first node in source order satisfying `pred`.
    pub fn find(&self, pred: impl Fn(&Tree) -> bool) -> Option<Cursor> {
        self.walk().into_iter().find(|c| pred(c.value()))
    }

    pub fn find_all(&self, pred: impl Fn(&Tree) -> bool) -> Vec<Cursor> {
        self.walk().into_iter().filter(|c| pred(c.value())).collect()
    }

    /// The first expression printed exactly as `text` (ignoring its prefix).
    pub fn find_expr(&self, text: &str) -> Option<Cursor> {
        self.find(|t| t.as_expr().is_some_and(|e| e.print().trim_start() == text))
    }

    /// The first statement printed exactly as `text` (ignoring its prefix).
    pub fn find_stmt(&self, text: &str) -> Option<Cursor> {
        self.find(|t| t.as_stmt().is_some_and(|s| s.print().trim_start() == text))
    }

    /// The first method or constructor named `name`.
    pub fn find_method(&self, name: &str) -> Option<Cursor> {
        self.find(|t| t.as_stmt().and_then(|s| s.as_method()).is_some_and(|m| m.name.as_str() == name))
    }

    /// The first class or interface named `name`.
    pub fn find_class(&self, name: &str) -> Option<Cursor> {
        self.find(|t| t.as_stmt().and_then(|s| s.as_class()).is_some_and(|c| c.name.as_str() == name))
    }
}

/// Records a cursor per visited node.
struct Walker<'a> {
    file: &'a SourceFile,
    path: Vec<Tree>,
    cursors: Vec<Cursor>,
}

impl Walker<'_> {
    fn record(&mut self, tree: Tree, walk: impl FnOnce(&mut Self)) {
        self.cursors.push(Cursor::from_path(self.file.clone(), self.path.clone(), tree.clone()));
        self.path.push(tree);
        walk(self);
        self.path.pop();
    }
}

impl Visitor for Walker<'_> {
    fn visit_unit(&mut self, unit: &Arc<CompilationUnit>) {
        self.record(Tree::Unit(unit.clone()), |w| visitor::walk_unit(w, unit));
    }

    fn visit_import(&mut self, import: &Arc<Import>) {
        self.record(Tree::Import(import.clone()), |_| {});
    }

    fn visit_stmt(&mut self, stmt: &Arc<Stmt>) {
        self.record(Tree::Stmt(stmt.clone()), |w| visitor::walk_stmt(w, stmt));
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>) {
        self.record(Tree::Expr(expr.clone()), |w| visitor::walk_expr(w, expr));
    }

    fn visit_type(&mut self, ty: &Arc<TypeTree>) {
        self.record(Tree::Type(ty.clone()), |w| visitor::walk_type(w, ty));
    }

    fn visit_annotation(&mut self, annotation: &Arc<Annotation>) {
        self.record(Tree::Annotation(annotation.clone()), |w| {
            visitor::walk_annotation(w, annotation)
        });
    }

    fn visit_type_param(&mut self, param: &Arc<TypeParam>) {
        self.record(Tree::TypeParam(param.clone()), |w| visitor::walk_type_param(w, param));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_core::{JavaType, PrimitiveKind};

    const SOURCE: &str = "class A {\n    int m(int x) {\n        return x + 1;\n    }\n}\n";

    #[test]
    fn parse_prints_losslessly() {
        let file = SourceFile::parse(SOURCE).unwrap();
        assert_eq!(file.print(), SOURCE);
        assert!(file.table().contains("A"));
    }

    #[test]
    fn walk_visits_nodes_in_source_order() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let kinds: Vec<_> = file.walk().iter().map(|c| c.value().kind_name()).collect();
        assert_eq!(kinds[0], "compilation unit");
        assert_eq!(kinds[1], "class declaration");
        assert!(kinds.contains(&"return"));
        assert_eq!(kinds.last(), Some(&"literal"));
    }

    #[test]
    fn find_by_text() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let cursor = file.find_expr("x + 1").unwrap();
        let expr = cursor.value().as_expr().unwrap();
        assert_eq!(expr.java_type(), JavaType::Primitive(PrimitiveKind::Int));
        assert_eq!(cursor.ancestors().len(), 6);
        assert!(file.find_stmt("return x + 1;").is_some());
        assert!(file.find_method("m").is_some());
        assert!(file.find_class("B").is_none());
    }

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(SourceFile::parse("class {"), Err(Error::Parse(_))));
    }
}
