//! Copy-on-write tree rewriting.
//!
//! A [`Fold`] returns a replacement for every node it visits. The default
//! `fold_*` methods rebuild a node only when one of its children changed, and
//! otherwise return the original `Arc`, so untouched subtrees stay shared
//! between the old and the new tree.

use std::sync::Arc;

use super::decl::*;
use super::expr::*;
use super::node::{Container, Name, NodeId, Padded, Space};
use super::stmt::*;
use super::types::*;

/// Copy-on-write transformer over AST nodes.
pub trait Fold: Sized {
    fn fold_unit(&mut self, unit: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
        walk_unit(self, unit)
    }

    fn fold_import(&mut self, import: &Arc<Import>) -> Arc<Import> {
        import.clone()
    }

    fn fold_stmt(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        walk_stmt(self, stmt)
    }

    fn fold_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        walk_expr(self, expr)
    }

    fn fold_type(&mut self, ty: &Arc<TypeTree>) -> Arc<TypeTree> {
        walk_type(self, ty)
    }

    fn fold_annotation(&mut self, annotation: &Arc<Annotation>) -> Arc<Annotation> {
        walk_annotation(self, annotation)
    }

    fn fold_type_param(&mut self, param: &Arc<TypeParam>) -> Arc<TypeParam> {
        walk_type_param(self, param)
    }

    /// Called for every stored whitespace run, except imports and the package.
    fn fold_space(&mut self, space: &Space) -> Space {
        space.clone()
    }
}

/// Folds children and records whether any of them changed.
struct Track<'f, F> {
    folder: &'f mut F,
    changed: bool,
}

impl<'f, F: Fold> Track<'f, F> {
    fn new(folder: &'f mut F) -> Self {
        Self {
            folder,
            changed: false,
        }
    }

    fn expr(&mut self, e: &Arc<Expr>) -> Arc<Expr> {
        let folded = self.folder.fold_expr(e);
        self.changed |= !Arc::ptr_eq(&folded, e);
        folded
    }

    fn opt_expr(&mut self, e: &Option<Arc<Expr>>) -> Option<Arc<Expr>> {
        e.as_ref().map(|e| self.expr(e))
    }

    fn stmt(&mut self, s: &Arc<Stmt>) -> Arc<Stmt> {
        let folded = self.folder.fold_stmt(s);
        self.changed |= !Arc::ptr_eq(&folded, s);
        folded
    }

    fn opt_stmt(&mut self, s: &Option<Arc<Stmt>>) -> Option<Arc<Stmt>> {
        s.as_ref().map(|s| self.stmt(s))
    }

    fn ty(&mut self, t: &Arc<TypeTree>) -> Arc<TypeTree> {
        let folded = self.folder.fold_type(t);
        self.changed |= !Arc::ptr_eq(&folded, t);
        folded
    }

    fn annotation(&mut self, a: &Arc<Annotation>) -> Arc<Annotation> {
        let folded = self.folder.fold_annotation(a);
        self.changed |= !Arc::ptr_eq(&folded, a);
        folded
    }

    fn type_param(&mut self, p: &Arc<TypeParam>) -> Arc<TypeParam> {
        let folded = self.folder.fold_type_param(p);
        self.changed |= !Arc::ptr_eq(&folded, p);
        folded
    }

    fn import(&mut self, i: &Arc<Import>) -> Arc<Import> {
        let folded = self.folder.fold_import(i);
        self.changed |= !Arc::ptr_eq(&folded, i);
        folded
    }

    fn space(&mut self, s: &Space) -> Space {
        let folded = self.folder.fold_space(s);
        self.changed |= folded != *s;
        folded
    }

    fn name(&mut self, n: &Name) -> Name {
        Name::new(self.space(&n.prefix), n.text.clone())
    }

    fn container<T>(&mut self, c: &Container<T>, mut f: impl FnMut(&mut Self, &T) -> T) -> Container<T> {
        Container {
            before: self.space(&c.before),
            elems: c
                .elems
                .iter()
                .map(|p| Padded {
                    elem: f(self, &p.elem),
                    after: self.space(&p.after),
                })
                .collect(),
            close: self.space(&c.close),
        }
    }

    fn exprs(&mut self, c: &Container<Arc<Expr>>) -> Container<Arc<Expr>> {
        self.container(c, |t, e| t.expr(e))
    }

    fn type_list(&mut self, list: &TypeList) -> TypeList {
        TypeList {
            keyword: self.space(&list.keyword),
            types: list
                .types
                .iter()
                .map(|p| Padded {
                    elem: self.ty(&p.elem),
                    after: self.space(&p.after),
                })
                .collect(),
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) -> Vec<Modifier> {
        modifiers
            .iter()
            .map(|m| match m {
                Modifier::Annotation(a) => Modifier::Annotation(self.annotation(a)),
                Modifier::Keyword(k) => Modifier::Keyword(KeywordModifier {
                    prefix: self.space(&k.prefix),
                    kind: k.kind,
                }),
            })
            .collect()
    }

    fn type_params(&mut self, tp: &Option<Container<Arc<TypeParam>>>) -> Option<Container<Arc<TypeParam>>> {
        tp.as_ref().map(|c| self.container(c, |t, p| t.type_param(p)))
    }

    fn paren_cond(&mut self, c: &ParenCond) -> ParenCond {
        ParenCond {
            open: self.space(&c.open),
            expr: self.expr(&c.expr),
            close: self.space(&c.close),
        }
    }
}

pub fn walk_unit<F: Fold>(folder: &mut F, unit: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
    let mut t = Track::new(folder);
    let imports = unit.imports.iter().map(|i| t.import(i)).collect();
    let types = unit.types.iter().map(|s| t.stmt(s)).collect();
    let eof = t.space(&unit.eof);
    if !t.changed {
        return unit.clone();
    }
    Arc::new(CompilationUnit {
        id: unit.id,
        package: unit.package.clone(),
        imports,
        types,
        eof,
    })
}

pub fn walk_stmt<F: Fold>(folder: &mut F, stmt: &Arc<Stmt>) -> Arc<Stmt> {
    let mut t = Track::new(folder);
    let prefix = t.space(&stmt.prefix);
    let kind = match &stmt.kind {
        StmtKind::Block(b) => StmtKind::Block(Block {
            static_init: b.static_init.as_ref().map(|s| t.space(s)),
            stmts: b.stmts.iter().map(|s| t.stmt(s)).collect(),
            end: t.space(&b.end),
        }),
        StmtKind::Variables(v) => StmtKind::Variables(VarDecls {
            modifiers: t.modifiers(&v.modifiers),
            type_tree: v.type_tree.as_ref().map(|ty| t.ty(ty)),
            varargs: v.varargs.as_ref().map(|s| t.space(s)),
            vars: v
                .vars
                .iter()
                .map(|p| Padded {
                    elem: VarDeclarator {
                        id: p.elem.id,
                        name: t.name(&p.elem.name),
                        dims: p.elem.dims.iter().map(|(o, c)| (t.space(o), t.space(c))).collect(),
                        init: p.elem.init.as_ref().map(|i| VarInit {
                            eq: t.space(&i.eq),
                            value: t.expr(&i.value),
                        }),
                        ty: p.elem.ty.clone(),
                    },
                    after: t.space(&p.after),
                })
                .collect(),
            semi: v.semi.as_ref().map(|s| t.space(s)),
        }),
        StmtKind::Expr(e) => StmtKind::Expr(ExprStmt {
            expr: t.expr(&e.expr),
            semi: t.space(&e.semi),
        }),
        StmtKind::If(i) => StmtKind::If(If {
            cond: t.paren_cond(&i.cond),
            then_stmt: t.stmt(&i.then_stmt),
            else_branch: i.else_branch.as_ref().map(|e| Else {
                keyword: t.space(&e.keyword),
                stmt: t.stmt(&e.stmt),
            }),
        }),
        StmtKind::While(w) => StmtKind::While(While {
            cond: t.paren_cond(&w.cond),
            body: t.stmt(&w.body),
        }),
        StmtKind::DoWhile(d) => StmtKind::DoWhile(DoWhile {
            body: t.stmt(&d.body),
            while_kw: t.space(&d.while_kw),
            cond: t.paren_cond(&d.cond),
            semi: t.space(&d.semi),
        }),
        StmtKind::For(f) => StmtKind::For(ForLoop {
            open: t.space(&f.open),
            init: t.stmt(&f.init),
            cond: t.opt_expr(&f.cond),
            cond_semi: t.space(&f.cond_semi),
            update: t.exprs(&f.update),
            body: t.stmt(&f.body),
        }),
        StmtKind::ForEach(f) => StmtKind::ForEach(ForEach {
            open: t.space(&f.open),
            var: t.stmt(&f.var),
            colon: t.space(&f.colon),
            iterable: t.expr(&f.iterable),
            close: t.space(&f.close),
            body: t.stmt(&f.body),
        }),
        StmtKind::Return(r) => StmtKind::Return(Return {
            expr: t.opt_expr(&r.expr),
            semi: t.space(&r.semi),
        }),
        StmtKind::Throw(th) => StmtKind::Throw(Throw {
            expr: t.expr(&th.expr),
            semi: t.space(&th.semi),
        }),
        StmtKind::Assert(a) => StmtKind::Assert(Assert {
            cond: t.expr(&a.cond),
            detail: a.detail.as_ref().map(|(s, e)| (t.space(s), t.expr(e))),
            semi: t.space(&a.semi),
        }),
        StmtKind::Break(j) => StmtKind::Break(Jump {
            label: j.label.as_ref().map(|l| t.name(l)),
            semi: t.space(&j.semi),
        }),
        StmtKind::Continue(j) => StmtKind::Continue(Jump {
            label: j.label.as_ref().map(|l| t.name(l)),
            semi: t.space(&j.semi),
        }),
        StmtKind::Empty => StmtKind::Empty,
        StmtKind::Method(m) => StmtKind::Method(MethodDecl {
            modifiers: t.modifiers(&m.modifiers),
            type_params: t.type_params(&m.type_params),
            return_type: m.return_type.as_ref().map(|r| t.ty(r)),
            name: t.name(&m.name),
            params: t.container(&m.params, |t, p| t.stmt(p)),
            throws: m.throws.as_ref().map(|l| t.type_list(l)),
            body: t.opt_stmt(&m.body),
            semi: m.semi.as_ref().map(|s| t.space(s)),
            method_type: m.method_type.clone(),
        }),
        StmtKind::Class(c) => StmtKind::Class(ClassDecl {
            modifiers: t.modifiers(&c.modifiers),
            keyword: t.space(&c.keyword),
            kind: c.kind,
            name: t.name(&c.name),
            type_params: t.type_params(&c.type_params),
            extends: c.extends.as_ref().map(|l| t.type_list(l)),
            implements: c.implements.as_ref().map(|l| t.type_list(l)),
            body: t.stmt(&c.body),
            ty: c.ty.clone(),
        }),
    };
    if !t.changed {
        return stmt.clone();
    }
    Arc::new(Stmt {
        id: stmt.id,
        prefix,
        kind,
    })
}

pub fn walk_expr<F: Fold>(folder: &mut F, expr: &Arc<Expr>) -> Arc<Expr> {
    let mut t = Track::new(folder);
    let prefix = t.space(&expr.prefix);
    let kind = match &expr.kind {
        ExprKind::Literal(l) => ExprKind::Literal(l.clone()),
        ExprKind::Ident(i) => ExprKind::Ident(i.clone()),
        ExprKind::FieldAccess(f) => ExprKind::FieldAccess(FieldAccess {
            target: t.expr(&f.target),
            dot: t.space(&f.dot),
            name: t.name(&f.name),
        }),
        ExprKind::MethodCall(m) => ExprKind::MethodCall(MethodCall {
            select: m.select.as_ref().map(|s| Padded {
                elem: t.expr(&s.elem),
                after: t.space(&s.after),
            }),
            name: t.name(&m.name),
            args: t.exprs(&m.args),
            method_type: m.method_type.clone(),
        }),
        ExprKind::NewClass(n) => ExprKind::NewClass(NewClass {
            clazz: t.ty(&n.clazz),
            args: t.exprs(&n.args),
            body: t.opt_stmt(&n.body),
            constructor_type: n.constructor_type.clone(),
        }),
        ExprKind::NewArray(n) => ExprKind::NewArray(NewArray {
            elem: t.ty(&n.elem),
            dims: n
                .dims
                .iter()
                .map(|d| ArrayDim {
                    open: t.space(&d.open),
                    size: t.opt_expr(&d.size),
                    close: t.space(&d.close),
                })
                .collect(),
            init: t.opt_expr(&n.init),
        }),
        ExprKind::ArrayInit(c) => ExprKind::ArrayInit(t.exprs(c)),
        ExprKind::Binary(b) => ExprKind::Binary(Binary {
            left: t.expr(&b.left),
            op_prefix: t.space(&b.op_prefix),
            op: b.op,
            right: t.expr(&b.right),
        }),
        ExprKind::Unary(u) => ExprKind::Unary(Unary {
            op: u.op,
            op_prefix: t.space(&u.op_prefix),
            operand: t.expr(&u.operand),
        }),
        ExprKind::Assign(a) => ExprKind::Assign(Assign {
            target: t.expr(&a.target),
            op_prefix: t.space(&a.op_prefix),
            op: a.op,
            value: t.expr(&a.value),
        }),
        ExprKind::Ternary(te) => ExprKind::Ternary(Ternary {
            cond: t.expr(&te.cond),
            question: t.space(&te.question),
            then_expr: t.expr(&te.then_expr),
            colon: t.space(&te.colon),
            else_expr: t.expr(&te.else_expr),
        }),
        ExprKind::Paren(p) => ExprKind::Paren(Paren {
            inner: t.expr(&p.inner),
            close: t.space(&p.close),
        }),
        ExprKind::Cast(c) => ExprKind::Cast(Cast {
            clazz: t.ty(&c.clazz),
            close: t.space(&c.close),
            expr: t.expr(&c.expr),
        }),
        ExprKind::InstanceOf(i) => ExprKind::InstanceOf(InstanceOf {
            expr: t.expr(&i.expr),
            keyword: t.space(&i.keyword),
            clazz: t.ty(&i.clazz),
        }),
        ExprKind::ArrayAccess(a) => ExprKind::ArrayAccess(ArrayAccess {
            array: t.expr(&a.array),
            open: t.space(&a.open),
            index: t.expr(&a.index),
            close: t.space(&a.close),
        }),
        ExprKind::Lambda(l) => ExprKind::Lambda(Lambda {
            parenthesized: l.parenthesized,
            params: t.container(&l.params, |t, p| t.stmt(p)),
            arrow: t.space(&l.arrow),
            body: match &l.body {
                LambdaBody::Expr(e) => LambdaBody::Expr(t.expr(e)),
                LambdaBody::Block(b) => LambdaBody::Block(t.stmt(b)),
            },
        }),
        ExprKind::MemberRef(r) => ExprKind::MemberRef(MemberRef {
            target: t.expr(&r.target),
            colons: t.space(&r.colons),
            name: t.name(&r.name),
        }),
    };
    if !t.changed {
        return expr.clone();
    }
    Arc::new(Expr {
        id: expr.id,
        prefix,
        kind,
        ty: expr.ty.clone(),
    })
}

pub fn walk_type<F: Fold>(folder: &mut F, ty: &Arc<TypeTree>) -> Arc<TypeTree> {
    let mut t = Track::new(folder);
    let prefix = t.space(&ty.prefix);
    let kind = match &ty.kind {
        TypeTreeKind::Primitive(p) => TypeTreeKind::Primitive(*p),
        TypeTreeKind::Named(n) => TypeTreeKind::Named(NamedType {
            name: n.name.clone(),
            args: n.args.as_ref().map(|c| t.container(c, |t, a| t.ty(a))),
        }),
        TypeTreeKind::Array(a) => TypeTreeKind::Array(ArrayType {
            elem: t.ty(&a.elem),
            open: t.space(&a.open),
            close: t.space(&a.close),
        }),
        TypeTreeKind::Wildcard(w) => TypeTreeKind::Wildcard(WildcardType {
            bound: w.bound.as_ref().map(|b| WildcardBound {
                kind: b.kind,
                keyword: t.space(&b.keyword),
                bound: t.ty(&b.bound),
            }),
        }),
    };
    if !t.changed {
        return ty.clone();
    }
    Arc::new(TypeTree {
        id: ty.id,
        prefix,
        kind,
        ty: ty.ty.clone(),
    })
}

pub fn walk_annotation<F: Fold>(folder: &mut F, annotation: &Arc<Annotation>) -> Arc<Annotation> {
    let mut t = Track::new(folder);
    let prefix = t.space(&annotation.prefix);
    let args = annotation.args.as_ref().map(|c| t.exprs(c));
    if !t.changed {
        return annotation.clone();
    }
    Arc::new(Annotation {
        id: annotation.id,
        prefix,
        name: annotation.name.clone(),
        args,
        ty: annotation.ty.clone(),
    })
}

pub fn walk_type_param<F: Fold>(folder: &mut F, param: &Arc<TypeParam>) -> Arc<TypeParam> {
    let mut t = Track::new(folder);
    let prefix = t.space(&param.prefix);
    let bounds = param.bounds.as_ref().map(|b| TypeBounds {
        keyword: t.space(&b.keyword),
        types: b
            .types
            .iter()
            .map(|p| Padded {
                elem: t.ty(&p.elem),
                after: t.space(&p.after),
            })
            .collect(),
    });
    if !t.changed {
        return param.clone();
    }
    Arc::new(TypeParam {
        id: param.id,
        prefix,
        name: param.name.clone(),
        bounds,
    })
}

/// Rebuilds a subtree with a new id on every node, so a copy can live next
/// to its original without the two being addressed as one.
pub struct FreshIds;

impl Fold for FreshIds {
    fn fold_stmt(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        let walked = walk_stmt(self, stmt);
        Arc::new(Stmt {
            id: NodeId::next(),
            ..(*walked).clone()
        })
    }

    fn fold_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        Arc::new(walk_expr(self, expr).with_fresh_id())
    }

    fn fold_type(&mut self, ty: &Arc<TypeTree>) -> Arc<TypeTree> {
        let walked = walk_type(self, ty);
        Arc::new(TypeTree {
            id: NodeId::next(),
            ..(*walked).clone()
        })
    }

    fn fold_annotation(&mut self, annotation: &Arc<Annotation>) -> Arc<Annotation> {
        let walked = walk_annotation(self, annotation);
        Arc::new(Annotation {
            id: NodeId::next(),
            ..(*walked).clone()
        })
    }

    fn fold_type_param(&mut self, param: &Arc<TypeParam>) -> Arc<TypeParam> {
        let walked = walk_type_param(self, param);
        Arc::new(TypeParam {
            id: NodeId::next(),
            ..(*walked).clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parser;
    use crate::ast::printer::Print;
    use crate::ast::visitor::{self, Visitor};

    #[derive(Default)]
    struct Ids(Vec<NodeId>);

    impl Visitor for Ids {
        fn visit_stmt(&mut self, stmt: &Arc<Stmt>) {
            self.0.push(stmt.id);
            visitor::walk_stmt(self, stmt);
        }

        fn visit_expr(&mut self, expr: &Arc<Expr>) {
            self.0.push(expr.id);
            visitor::walk_expr(self, expr);
        }

        fn visit_type(&mut self, ty: &Arc<TypeTree>) {
            self.0.push(ty.id);
            visitor::walk_type(self, ty);
        }
    }

    fn ids(expr: &Arc<Expr>) -> Vec<NodeId> {
        let mut ids = Ids::default();
        ids.visit_expr(expr);
        ids.0
    }

    #[test]
    fn fresh_ids_renumber_every_node() {
        let expr = Parser::parse_expression("  (String) f(a, x -> { return x + 1; })").unwrap();
        let copy = FreshIds.fold_expr(&expr);

        assert_eq!(copy.print(), expr.print());
        let (old, new) = (ids(&expr), ids(&copy));
        assert_eq!(old.len(), new.len());
        assert!(old.len() > 5);
        assert!(new.iter().all(|id| !old.contains(id)));
    }

    #[test]
    fn default_fold_keeps_ids_and_sharing() {
        struct Identity;
        impl Fold for Identity {}

        let expr = Parser::parse_expression("a + b * c").unwrap();
        let same = Identity.fold_expr(&expr);
        assert!(Arc::ptr_eq(&expr, &same));
        assert_eq!(ids(&expr), ids(&same));
    }
}
