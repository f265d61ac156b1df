//! Visitor pattern for read-only traversal of the AST.
//!
//! Each `visit_*` method has a default implementation that calls the matching
//! `walk_*` function, which visits the node's children in source order.
//! Override a `visit_*` method to observe a node kind; call the `walk_*`
//! function from the override to keep descending.

use std::sync::Arc;

use super::decl::*;
use super::expr::*;
use super::stmt::*;
use super::types::*;

/// Visitor trait for traversing AST nodes.
pub trait Visitor: Sized {
    fn visit_unit(&mut self, unit: &Arc<CompilationUnit>) {
        walk_unit(self, unit);
    }

    fn visit_import(&mut self, _import: &Arc<Import>) {}

    fn visit_stmt(&mut self, stmt: &Arc<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Arc<Expr>) {
        walk_expr(self, expr);
    }

    fn visit_type(&mut self, ty: &Arc<TypeTree>) {
        walk_type(self, ty);
    }

    fn visit_annotation(&mut self, annotation: &Arc<Annotation>) {
        walk_annotation(self, annotation);
    }

    fn visit_type_param(&mut self, param: &Arc<TypeParam>) {
        walk_type_param(self, param);
    }
}

pub fn walk_unit<V: Visitor>(visitor: &mut V, unit: &CompilationUnit) {
    for import in &unit.imports {
        visitor.visit_import(import);
    }
    for ty in &unit.types {
        visitor.visit_stmt(ty);
    }
}

fn walk_modifiers<V: Visitor>(visitor: &mut V, modifiers: &[Modifier]) {
    for annotation in annotations(modifiers) {
        visitor.visit_annotation(annotation);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(b) => {
            for s in &b.stmts {
                visitor.visit_stmt(s);
            }
        }
        StmtKind::Variables(v) => {
            walk_modifiers(visitor, &v.modifiers);
            if let Some(ty) = &v.type_tree {
                visitor.visit_type(ty);
            }
            for var in &v.vars {
                if let Some(init) = &var.elem.init {
                    visitor.visit_expr(&init.value);
                }
            }
        }
        StmtKind::Expr(e) => visitor.visit_expr(&e.expr),
        StmtKind::If(i) => {
            visitor.visit_expr(&i.cond.expr);
            visitor.visit_stmt(&i.then_stmt);
            if let Some(else_branch) = &i.else_branch {
                visitor.visit_stmt(&else_branch.stmt);
            }
        }
        StmtKind::While(w) => {
            visitor.visit_expr(&w.cond.expr);
            visitor.visit_stmt(&w.body);
        }
        StmtKind::DoWhile(d) => {
            visitor.visit_stmt(&d.body);
            visitor.visit_expr(&d.cond.expr);
        }
        StmtKind::For(f) => {
            visitor.visit_stmt(&f.init);
            if let Some(cond) = &f.cond {
                visitor.visit_expr(cond);
            }
            for e in f.update.iter() {
                visitor.visit_expr(e);
            }
            visitor.visit_stmt(&f.body);
        }
        StmtKind::ForEach(f) => {
            visitor.visit_stmt(&f.var);
            visitor.visit_expr(&f.iterable);
            visitor.visit_stmt(&f.body);
        }
        StmtKind::Return(r) => {
            if let Some(e) = &r.expr {
                visitor.visit_expr(e);
            }
        }
        StmtKind::Throw(t) => visitor.visit_expr(&t.expr),
        StmtKind::Assert(a) => {
            visitor.visit_expr(&a.cond);
            if let Some((_, detail)) = &a.detail {
                visitor.visit_expr(detail);
            }
        }
        StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Empty => {}
        StmtKind::Method(m) => {
            walk_modifiers(visitor, &m.modifiers);
            if let Some(tp) = &m.type_params {
                for p in tp.iter() {
                    visitor.visit_type_param(p);
                }
            }
            if let Some(rt) = &m.return_type {
                visitor.visit_type(rt);
            }
            for p in m.params.iter() {
                visitor.visit_stmt(p);
            }
            if let Some(throws) = &m.throws {
                for t in throws.iter() {
                    visitor.visit_type(t);
                }
            }
            if let Some(body) = &m.body {
                visitor.visit_stmt(body);
            }
        }
        StmtKind::Class(c) => {
            walk_modifiers(visitor, &c.modifiers);
            if let Some(tp) = &c.type_params {
                for p in tp.iter() {
                    visitor.visit_type_param(p);
                }
            }
            for t in c.extends.iter().chain(c.implements.iter()).flat_map(|l| l.iter()) {
                visitor.visit_type(t);
            }
            visitor.visit_stmt(&c.body);
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) => {}
        ExprKind::FieldAccess(f) => visitor.visit_expr(&f.target),
        ExprKind::MethodCall(m) => {
            if let Some(select) = &m.select {
                visitor.visit_expr(&select.elem);
            }
            for a in m.args.iter() {
                visitor.visit_expr(a);
            }
        }
        ExprKind::NewClass(n) => {
            visitor.visit_type(&n.clazz);
            for a in n.args.iter() {
                visitor.visit_expr(a);
            }
            if let Some(body) = &n.body {
                visitor.visit_stmt(body);
            }
        }
        ExprKind::NewArray(n) => {
            visitor.visit_type(&n.elem);
            for size in n.dims.iter().filter_map(|d| d.size.as_ref()) {
                visitor.visit_expr(size);
            }
            if let Some(init) = &n.init {
                visitor.visit_expr(init);
            }
        }
        ExprKind::ArrayInit(elems) => {
            for e in elems.iter() {
                visitor.visit_expr(e);
            }
        }
        ExprKind::Binary(b) => {
            visitor.visit_expr(&b.left);
            visitor.visit_expr(&b.right);
        }
        ExprKind::Unary(u) => visitor.visit_expr(&u.operand),
        ExprKind::Assign(a) => {
            visitor.visit_expr(&a.target);
            visitor.visit_expr(&a.value);
        }
        ExprKind::Ternary(t) => {
            visitor.visit_expr(&t.cond);
            visitor.visit_expr(&t.then_expr);
            visitor.visit_expr(&t.else_expr);
        }
        ExprKind::Paren(p) => visitor.visit_expr(&p.inner),
        ExprKind::Cast(c) => {
            visitor.visit_type(&c.clazz);
            visitor.visit_expr(&c.expr);
        }
        ExprKind::InstanceOf(i) => {
            visitor.visit_expr(&i.expr);
            visitor.visit_type(&i.clazz);
        }
        ExprKind::ArrayAccess(a) => {
            visitor.visit_expr(&a.array);
            visitor.visit_expr(&a.index);
        }
        ExprKind::Lambda(l) => {
            for p in l.params.iter() {
                visitor.visit_stmt(p);
            }
            match &l.body {
                LambdaBody::Expr(e) => visitor.visit_expr(e),
                LambdaBody::Block(b) => visitor.visit_stmt(b),
            }
        }
        ExprKind::MemberRef(r) => visitor.visit_expr(&r.target),
    }
}

pub fn walk_type<V: Visitor>(visitor: &mut V, ty: &TypeTree) {
    match &ty.kind {
        TypeTreeKind::Primitive(_) => {}
        TypeTreeKind::Named(n) => {
            if let Some(args) = &n.args {
                for a in args.iter() {
                    visitor.visit_type(a);
                }
            }
        }
        TypeTreeKind::Array(a) => visitor.visit_type(&a.elem),
        TypeTreeKind::Wildcard(w) => {
            if let Some(bound) = &w.bound {
                visitor.visit_type(&bound.bound);
            }
        }
    }
}

pub fn walk_annotation<V: Visitor>(visitor: &mut V, annotation: &Annotation) {
    if let Some(args) = &annotation.args {
        for a in args.iter() {
            visitor.visit_expr(a);
        }
    }
}

pub fn walk_type_param<V: Visitor>(visitor: &mut V, param: &TypeParam) {
    for b in param.bound_types() {
        visitor.visit_type(b);
    }
}
