//! Lossless source printing.
//!
//! Printing a freshly parsed tree reproduces its input byte-for-byte: every
//! node and punctuation position stores the whitespace that precedes it.

use std::sync::Arc;

use super::decl::*;
use super::expr::*;
use super::node::{Container, Space};
use super::stmt::*;
use super::tree::Tree;
use super::types::*;

/// Render a node back to Java source.
pub trait Print {
    fn print_to(&self, out: &mut Printer);

    fn print(&self) -> String {
        let mut printer = Printer::default();
        self.print_to(&mut printer);
        printer.finish()
    }
}

/// Output buffer for [`Print`].
#[derive(Debug, Default)]
pub struct Printer {
    out: String,
}

impl Printer {
    pub fn finish(self) -> String {
        self.out
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn space(&mut self, s: &Space) {
        self.out.push_str(s.as_str());
    }

    fn container<T>(&mut self, c: &Container<T>, open: &str, close: &str, mut f: impl FnMut(&mut Self, &T)) {
        self.space(&c.before);
        self.push(open);
        for (i, p) in c.elems.iter().enumerate() {
            if i > 0 {
                self.push(",");
            }
            f(self, &p.elem);
            self.space(&p.after);
        }
        self.space(&c.close);
        self.push(close);
    }

    fn type_list(&mut self, list: &TypeList, keyword: &str, sep: &str) {
        self.space(&list.keyword);
        self.push(keyword);
        for (i, p) in list.types.iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            p.elem.print_to(self);
            self.space(&p.after);
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) {
        for m in modifiers {
            match m {
                Modifier::Annotation(a) => a.print_to(self),
                Modifier::Keyword(k) => {
                    self.space(&k.prefix);
                    self.push(k.kind.as_str());
                }
            }
        }
    }

    fn paren_cond(&mut self, cond: &ParenCond) {
        self.space(&cond.open);
        self.push("(");
        cond.expr.print_to(self);
        self.space(&cond.close);
        self.push(")");
    }

    fn semi(&mut self, s: &Space) {
        self.space(s);
        self.push(";");
    }
}

impl<T: Print> Print for Arc<T> {
    fn print_to(&self, out: &mut Printer) {
        (**self).print_to(out)
    }
}

impl Print for CompilationUnit {
    fn print_to(&self, out: &mut Printer) {
        if let Some(package) = &self.package {
            out.space(&package.prefix);
            out.push("package");
            out.space(&package.name.prefix);
            out.push(&package.name.text);
            out.semi(&package.semi);
        }
        for import in &self.imports {
            import.print_to(out);
        }
        for ty in &self.types {
            ty.print_to(out);
        }
        out.space(&self.eof);
    }
}

impl Print for Import {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        out.push("import");
        if let Some(space) = &self.is_static {
            out.space(space);
            out.push("static");
        }
        out.space(&self.name.prefix);
        out.push(&self.name.text);
        out.semi(&self.semi);
    }
}

impl Print for Annotation {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        out.push("@");
        out.push(&self.name);
        if let Some(args) = &self.args {
            out.container(args, "(", ")", |out, e| e.print_to(out));
        }
    }
}

impl Print for TypeParam {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        out.push(&self.name);
        if let Some(bounds) = &self.bounds {
            out.space(&bounds.keyword);
            out.push("extends");
            for (i, p) in bounds.types.iter().enumerate() {
                if i > 0 {
                    out.push("&");
                }
                p.elem.print_to(out);
                out.space(&p.after);
            }
        }
    }
}

impl Print for TypeTree {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        match &self.kind {
            TypeTreeKind::Primitive(p) => out.push(p.name()),
            TypeTreeKind::Named(n) => {
                out.push(&n.name);
                if let Some(args) = &n.args {
                    out.container(args, "<", ">", |out, t| t.print_to(out));
                }
            }
            TypeTreeKind::Array(a) => {
                a.elem.print_to(out);
                out.space(&a.open);
                out.push("[");
                out.space(&a.close);
                out.push("]");
            }
            TypeTreeKind::Wildcard(w) => {
                out.push("?");
                if let Some(bound) = &w.bound {
                    out.space(&bound.keyword);
                    out.push(bound.kind.as_str());
                    bound.bound.print_to(out);
                }
            }
        }
    }
}

impl Print for Expr {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        match &self.kind {
            ExprKind::Literal(l) => out.push(&l.source),
            ExprKind::Ident(i) => out.push(&i.name),
            ExprKind::FieldAccess(f) => {
                f.target.print_to(out);
                out.space(&f.dot);
                out.push(".");
                out.space(&f.name.prefix);
                out.push(&f.name.text);
            }
            ExprKind::MethodCall(m) => {
                if let Some(select) = &m.select {
                    select.elem.print_to(out);
                    out.space(&select.after);
                    out.push(".");
                }
                out.space(&m.name.prefix);
                out.push(&m.name.text);
                out.container(&m.args, "(", ")", |out, e| e.print_to(out));
            }
            ExprKind::NewClass(n) => {
                out.push("new");
                n.clazz.print_to(out);
                out.container(&n.args, "(", ")", |out, e| e.print_to(out));
                if let Some(body) = &n.body {
                    body.print_to(out);
                }
            }
            ExprKind::NewArray(n) => {
                out.push("new");
                n.elem.print_to(out);
                for dim in &n.dims {
                    out.space(&dim.open);
                    out.push("[");
                    if let Some(size) = &dim.size {
                        size.print_to(out);
                    }
                    out.space(&dim.close);
                    out.push("]");
                }
                if let Some(init) = &n.init {
                    init.print_to(out);
                }
            }
            ExprKind::ArrayInit(elems) => {
                out.container(elems, "{", "}", |out, e| e.print_to(out));
            }
            ExprKind::Binary(b) => {
                b.left.print_to(out);
                out.space(&b.op_prefix);
                out.push(b.op.as_str());
                b.right.print_to(out);
            }
            ExprKind::Unary(u) => {
                if u.op.is_postfix() {
                    u.operand.print_to(out);
                    out.space(&u.op_prefix);
                    out.push(u.op.as_str());
                } else {
                    out.push(u.op.as_str());
                    u.operand.print_to(out);
                }
            }
            ExprKind::Assign(a) => {
                a.target.print_to(out);
                out.space(&a.op_prefix);
                out.push(a.op.as_str());
                a.value.print_to(out);
            }
            ExprKind::Ternary(t) => {
                t.cond.print_to(out);
                out.space(&t.question);
                out.push("?");
                t.then_expr.print_to(out);
                out.space(&t.colon);
                out.push(":");
                t.else_expr.print_to(out);
            }
            ExprKind::Paren(p) => {
                out.push("(");
                p.inner.print_to(out);
                out.space(&p.close);
                out.push(")");
            }
            ExprKind::Cast(c) => {
                out.push("(");
                c.clazz.print_to(out);
                out.space(&c.close);
                out.push(")");
                c.expr.print_to(out);
            }
            ExprKind::InstanceOf(i) => {
                i.expr.print_to(out);
                out.space(&i.keyword);
                out.push("instanceof");
                i.clazz.print_to(out);
            }
            ExprKind::ArrayAccess(a) => {
                a.array.print_to(out);
                out.space(&a.open);
                out.push("[");
                a.index.print_to(out);
                out.space(&a.close);
                out.push("]");
            }
            ExprKind::Lambda(l) => {
                if l.parenthesized {
                    out.container(&l.params, "(", ")", |out, p| p.print_to(out));
                } else if let Some(param) = l.params.get(0) {
                    param.print_to(out);
                }
                out.space(&l.arrow);
                out.push("->");
                match &l.body {
                    LambdaBody::Expr(e) => e.print_to(out),
                    LambdaBody::Block(b) => b.print_to(out),
                }
            }
            ExprKind::MemberRef(r) => {
                r.target.print_to(out);
                out.space(&r.colons);
                out.push("::");
                out.space(&r.name.prefix);
                out.push(&r.name.text);
            }
        }
    }
}

impl Print for Stmt {
    fn print_to(&self, out: &mut Printer) {
        out.space(&self.prefix);
        match &self.kind {
            StmtKind::Block(b) => {
                if let Some(space) = &b.static_init {
                    out.push("static");
                    out.space(space);
                }
                out.push("{");
                for stmt in &b.stmts {
                    stmt.print_to(out);
                }
                out.space(&b.end);
                out.push("}");
            }
            StmtKind::Variables(v) => {
                out.modifiers(&v.modifiers);
                if let Some(ty) = &v.type_tree {
                    ty.print_to(out);
                }
                if let Some(space) = &v.varargs {
                    out.space(space);
                    out.push("...");
                }
                for (i, p) in v.vars.iter().enumerate() {
                    if i > 0 {
                        out.push(",");
                    }
                    let var = &p.elem;
                    out.space(&var.name.prefix);
                    out.push(&var.name.text);
                    for (open, close) in &var.dims {
                        out.space(open);
                        out.push("[");
                        out.space(close);
                        out.push("]");
                    }
                    if let Some(init) = &var.init {
                        out.space(&init.eq);
                        out.push("=");
                        init.value.print_to(out);
                    }
                    out.space(&p.after);
                }
                if let Some(semi) = &v.semi {
                    out.semi(semi);
                }
            }
            StmtKind::Expr(e) => {
                e.expr.print_to(out);
                out.semi(&e.semi);
            }
            StmtKind::If(i) => {
                out.push("if");
                out.paren_cond(&i.cond);
                i.then_stmt.print_to(out);
                if let Some(else_branch) = &i.else_branch {
                    out.space(&else_branch.keyword);
                    out.push("else");
                    else_branch.stmt.print_to(out);
                }
            }
            StmtKind::While(w) => {
                out.push("while");
                out.paren_cond(&w.cond);
                w.body.print_to(out);
            }
            StmtKind::DoWhile(d) => {
                out.push("do");
                d.body.print_to(out);
                out.space(&d.while_kw);
                out.push("while");
                out.paren_cond(&d.cond);
                out.semi(&d.semi);
            }
            StmtKind::For(f) => {
                out.push("for");
                out.space(&f.open);
                out.push("(");
                f.init.print_to(out);
                if let Some(cond) = &f.cond {
                    cond.print_to(out);
                }
                out.semi(&f.cond_semi);
                out.container(&f.update, "", ")", |out, e| e.print_to(out));
                f.body.print_to(out);
            }
            StmtKind::ForEach(f) => {
                out.push("for");
                out.space(&f.open);
                out.push("(");
                f.var.print_to(out);
                out.space(&f.colon);
                out.push(":");
                f.iterable.print_to(out);
                out.space(&f.close);
                out.push(")");
                f.body.print_to(out);
            }
            StmtKind::Return(r) => {
                out.push("return");
                if let Some(e) = &r.expr {
                    e.print_to(out);
                }
                out.semi(&r.semi);
            }
            StmtKind::Throw(t) => {
                out.push("throw");
                t.expr.print_to(out);
                out.semi(&t.semi);
            }
            StmtKind::Assert(a) => {
                out.push("assert");
                a.cond.print_to(out);
                if let Some((colon, detail)) = &a.detail {
                    out.space(colon);
                    out.push(":");
                    detail.print_to(out);
                }
                out.semi(&a.semi);
            }
            StmtKind::Break(j) | StmtKind::Continue(j) => {
                out.push(if matches!(self.kind, StmtKind::Break(_)) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = &j.label {
                    out.space(&label.prefix);
                    out.push(&label.text);
                }
                out.semi(&j.semi);
            }
            StmtKind::Empty => out.push(";"),
            StmtKind::Method(m) => {
                out.modifiers(&m.modifiers);
                if let Some(tp) = &m.type_params {
                    out.container(tp, "<", ">", |out, p| p.print_to(out));
                }
                if let Some(rt) = &m.return_type {
                    rt.print_to(out);
                }
                out.space(&m.name.prefix);
                out.push(&m.name.text);
                out.container(&m.params, "(", ")", |out, p| p.print_to(out));
                if let Some(throws) = &m.throws {
                    out.type_list(throws, "throws", ",");
                }
                if let Some(body) = &m.body {
                    body.print_to(out);
                }
                if let Some(semi) = &m.semi {
                    out.semi(semi);
                }
            }
            StmtKind::Class(c) => {
                out.modifiers(&c.modifiers);
                out.space(&c.keyword);
                out.push(c.kind.as_str());
                out.space(&c.name.prefix);
                out.push(&c.name.text);
                if let Some(tp) = &c.type_params {
                    out.container(tp, "<", ">", |out, p| p.print_to(out));
                }
                if let Some(extends) = &c.extends {
                    out.type_list(extends, "extends", ",");
                }
                if let Some(implements) = &c.implements {
                    out.type_list(implements, "implements", ",");
                }
                c.body.print_to(out);
            }
        }
    }
}

impl Print for Tree {
    fn print_to(&self, out: &mut Printer) {
        match self {
            Tree::Unit(n) => n.print_to(out),
            Tree::Import(n) => n.print_to(out),
            Tree::Stmt(n) => n.print_to(out),
            Tree::Expr(n) => n.print_to(out),
            Tree::Type(n) => n.print_to(out),
            Tree::Annotation(n) => n.print_to(out),
            Tree::TypeParam(n) => n.print_to(out),
        }
    }
}

/// Print a node without its own leading whitespace.
pub fn print_trimmed<T: Print + ?Sized>(node: &T, prefix: &Space) -> String {
    let printed = node.print();
    match printed.strip_prefix(prefix.as_str()) {
        Some(rest) => rest.to_string(),
        None => printed,
    }
}
