//! A handle to any node kind, used for cursor paths and splicing.

use std::sync::Arc;

use super::decl::{Annotation, CompilationUnit, Import};
use super::expr::Expr;
use super::node::{NodeId, Space};
use super::stmt::Stmt;
use super::types::{TypeParam, TypeTree};

/// Any addressable tree node.
#[derive(Debug, Clone)]
pub enum Tree {
    Unit(Arc<CompilationUnit>),
    Import(Arc<Import>),
    Stmt(Arc<Stmt>),
    Expr(Arc<Expr>),
    Type(Arc<TypeTree>),
    Annotation(Arc<Annotation>),
    TypeParam(Arc<TypeParam>),
}

impl Tree {
    pub fn id(&self) -> NodeId {
        match self {
            Tree::Unit(n) => n.id,
            Tree::Import(n) => n.id,
            Tree::Stmt(n) => n.id,
            Tree::Expr(n) => n.id,
            Tree::Type(n) => n.id,
            Tree::Annotation(n) => n.id,
            Tree::TypeParam(n) => n.id,
        }
    }

    /// Leading whitespace of the node (empty for compilation units).
    pub fn prefix(&self) -> Space {
        match self {
            Tree::Unit(_) => Space::empty(),
            Tree::Import(n) => n.prefix.clone(),
            Tree::Stmt(n) => n.prefix.clone(),
            Tree::Expr(n) => n.prefix.clone(),
            Tree::Type(n) => n.prefix.clone(),
            Tree::Annotation(n) => n.prefix.clone(),
            Tree::TypeParam(n) => n.prefix.clone(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Tree::Unit(_) => "compilation unit",
            Tree::Import(_) => "import",
            Tree::Stmt(s) => s.kind_name(),
            Tree::Expr(e) => e.kind_name(),
            Tree::Type(_) => "type",
            Tree::Annotation(_) => "annotation",
            Tree::TypeParam(_) => "type parameter",
        }
    }

    pub fn as_expr(&self) -> Option<&Arc<Expr>> {
        match self {
            Tree::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_stmt(&self) -> Option<&Arc<Stmt>> {
        match self {
            Tree::Stmt(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<&Arc<CompilationUnit>> {
        match self {
            Tree::Unit(u) => Some(u),
            _ => None,
        }
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        match (self, other) {
            (Tree::Unit(a), Tree::Unit(b)) => Arc::ptr_eq(a, b),
            (Tree::Import(a), Tree::Import(b)) => Arc::ptr_eq(a, b),
            (Tree::Stmt(a), Tree::Stmt(b)) => Arc::ptr_eq(a, b),
            (Tree::Expr(a), Tree::Expr(b)) => Arc::ptr_eq(a, b),
            (Tree::Type(a), Tree::Type(b)) => Arc::ptr_eq(a, b),
            (Tree::Annotation(a), Tree::Annotation(b)) => Arc::ptr_eq(a, b),
            (Tree::TypeParam(a), Tree::TypeParam(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Arc<Expr>> for Tree {
    fn from(e: Arc<Expr>) -> Self {
        Tree::Expr(e)
    }
}

impl From<Arc<Stmt>> for Tree {
    fn from(s: Arc<Stmt>) -> Self {
        Tree::Stmt(s)
    }
}
