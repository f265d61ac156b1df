//! Structural matching of a template against a subtree.
//!
//! The attributed pattern and the candidate are compared in lock step. A
//! placeholder stub captures whatever candidate expression sits at its
//! position, provided the candidate's static type converts to the
//! placeholder's constraint; everything else must have the same shape, the
//! same names and operators, and resolve to the same declarations.

use std::sync::Arc;

use jtemplate_compiler::{Binding, Inference, is_assignable};
use jtemplate_core::{JavaType, MethodType};
use jtemplate_parser::Lexer;
use jtemplate_parser::ast::{
    Container, Expr, ExprKind, LambdaBody, Print, Stmt, StmtKind, Tree, TypeTree, UnaryOp, modifier_flags,
};
use jtemplate_registry::{TypeSubst, TypeTable, substitute};
use tracing::{debug, trace};

use crate::instantiate::Substitution;
use crate::template::{JavaTemplate, Pattern, Placeholder, PlaceholderKind};
use crate::{Cursor, SourceFile};

/// The bindings of one successful match.
#[derive(Debug, Clone)]
pub struct Match {
    parameters: Vec<Arc<Expr>>,
    names: Vec<Option<String>>,
    type_vars: TypeSubst,
}

impl Match {
    /// The tree bound to placeholder `index`.
    pub fn parameter(&self, index: usize) -> Option<&Arc<Expr>> {
        self.parameters.get(index)
    }

    /// Bound trees in placeholder order.
    pub fn parameters(&self) -> &[Arc<Expr>] {
        &self.parameters
    }

    /// The tree bound to the placeholder called `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<Expr>> {
        let index = self.names.iter().position(|n| n.as_deref() == Some(name))?;
        self.parameters.get(index)
    }

    /// What a template type variable was unified with.
    pub fn type_var(&self, name: &str) -> Option<&JavaType> {
        self.type_vars.get(name)
    }

    pub fn type_vars(&self) -> &TypeSubst {
        &self.type_vars
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The bound trees as arguments for [`JavaTemplate::apply`].
    pub fn substitutions(&self) -> Vec<Substitution> {
        self.parameters.iter().cloned().map(Substitution::Tree).collect()
    }
}

impl JavaTemplate {
    /// Match the node at `cursor`.
    ///
    /// Expression templates match expressions and single-statement
    /// templates match statements; anything else is `None`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn matches(&self, cursor: &Cursor) -> Option<Match> {
        let pattern = self.pattern(cursor)?;
        let mut matcher = Matcher::new(&pattern);
        let matched = match (&pattern.tree, cursor.value()) {
            (Tree::Expr(p), Tree::Expr(c)) => matcher.expr(p, c),
            (Tree::Stmt(p), Tree::Stmt(c)) => matcher.stmt(p, c),
            _ => false,
        };
        self.conclude(matcher, matched, cursor.value())
    }

    /// Match `expr`, attributed in the file of `cursor`. An absent
    /// expression never matches.
    pub fn matches_expr(&self, expr: Option<&Arc<Expr>>, cursor: &Cursor) -> Option<Match> {
        let expr = expr?;
        let pattern = self.pattern(cursor)?;
        let Tree::Expr(p) = &pattern.tree else {
            return None;
        };
        let mut matcher = Matcher::new(&pattern);
        let matched = matcher.expr(p, expr);
        self.conclude(matcher, matched, &Tree::Expr(expr.clone()))
    }

    /// Every node of `file` the template matches, in source order.
    pub fn find_matches(&self, file: &SourceFile) -> Vec<(Cursor, Match)> {
        file.walk()
            .into_iter()
            .filter_map(|cursor| {
                let found = self.matches(&cursor)?;
                Some((cursor, found))
            })
            .collect()
    }

    fn conclude(&self, matcher: Matcher<'_>, matched: bool, candidate: &Tree) -> Option<Match> {
        let found = if matched { matcher.finish(self) } else { None };
        match &found {
            Some(found) => debug!(template = self.source(), bindings = found.len(), "template matched"),
            None => trace!(template = self.source(), candidate = candidate.kind_name(), "template did not match"),
        }
        found
    }
}

/// Lock-step comparison state.
struct Matcher<'a> {
    pattern: &'a Pattern,
    table: &'a TypeTable,
    bindings: Vec<Option<Arc<Expr>>>,
    inference: Inference<'a>,
}

impl<'a> Matcher<'a> {
    fn new(pattern: &'a Pattern) -> Self {
        Self {
            pattern,
            table: &pattern.table,
            bindings: vec![None; pattern.kinds.len()],
            inference: Inference::new(&pattern.generics, &pattern.table, Binding::Fixed),
        }
    }

    /// Check the collected type variables against their bounds and re-check
    /// generic holes with the substitution applied.
    fn finish(self, template: &JavaTemplate) -> Option<Match> {
        let Matcher {
            pattern,
            table,
            bindings,
            inference,
        } = self;
        let type_vars = if pattern.generics.is_empty() {
            TypeSubst::default()
        } else {
            inference.finish()?
        };
        for (index, binding) in bindings.iter().enumerate() {
            let (Some(expected), Some(bound)) = (&pattern.types[index], binding) else {
                continue;
            };
            if pattern.is_generic(index) {
                let expected = substitute(expected, &type_vars);
                if !is_assignable(&bound.java_type(), &expected, table, &pattern.scope_params) {
                    return None;
                }
            }
        }
        let parameters = bindings.into_iter().collect::<Option<Vec<_>>>()?;
        Some(Match {
            parameters,
            names: template.placeholders().iter().map(|p| p.name.clone()).collect(),
            type_vars,
        })
    }

    fn stub(&self, expr: &Expr) -> Option<usize> {
        let name = expr.ident_name()?;
        Placeholder::stub_index(name).filter(|index| *index < self.bindings.len())
    }

    /// Bind placeholder `index` to `candidate`.
    fn capture(&mut self, index: usize, candidate: &Arc<Expr>) -> bool {
        let kind = self.pattern.kinds[index];
        if kind == PlaceholderKind::Literal && !is_literal(candidate) {
            return false;
        }
        if let Some(bound) = &self.bindings[index] {
            return bound.ty == candidate.ty && same_tokens(&bound.print(), &candidate.print());
        }

        let actual = candidate.java_type();
        let fits = match &self.pattern.types[index] {
            None if kind == PlaceholderKind::AnyArray => matches!(actual, JavaType::Array(_)),
            None => true,
            Some(expected) if self.pattern.is_generic(index) => self.inference.unify(expected, &actual),
            Some(expected) => is_assignable(&actual, expected, self.table, &self.pattern.scope_params),
        };
        if !fits {
            trace!(placeholder = index, actual = %actual, "argument type does not fit the placeholder");
            return false;
        }
        self.bindings[index] = Some(candidate.clone());
        true
    }

    fn expr(&mut self, p: &Arc<Expr>, c: &Arc<Expr>) -> bool {
        if let Some(index) = self.stub(p) {
            return self.capture(index, c);
        }
        match &p.kind {
            ExprKind::Literal(pl) => {
                let ExprKind::Literal(cl) = &c.kind else {
                    return false;
                };
                pl.value == cl.value
            }
            ExprKind::Ident(pi) => {
                let ExprKind::Ident(ci) = &c.kind else {
                    return false;
                };
                pi.name == ci.name && compatible(&p.ty, &c.ty)
            }
            ExprKind::FieldAccess(pf) => {
                let ExprKind::FieldAccess(cf) = &c.kind else {
                    return false;
                };
                pf.name.text == cf.name.text && self.expr(&pf.target, &cf.target)
            }
            ExprKind::MethodCall(pm) => {
                let ExprKind::MethodCall(cm) = &c.kind else {
                    return false;
                };
                if pm.name.text != cm.name.text || pm.args.len() != cm.args.len() {
                    return false;
                }
                if !same_target(&pm.method_type, &cm.method_type) {
                    return false;
                }
                let static_call = pm.method_type.as_ref().is_some_and(|m| m.is_static);
                let selects = match (&pm.select, &cm.select) {
                    (Some(ps), Some(cs)) if static_call && ps.elem.ty.is_some() && ps.elem.ty == cs.elem.ty => true,
                    (Some(ps), Some(cs)) => self.expr(&ps.elem, &cs.elem),
                    (None, None) => true,
                    // `Math.max(a, b)` and a statically imported `max(a, b)`.
                    (Some(_), None) | (None, Some(_)) => static_call,
                };
                selects && self.exprs(&pm.args, &cm.args)
            }
            ExprKind::NewClass(pn) => {
                let ExprKind::NewClass(cn) = &c.kind else {
                    return false;
                };
                let bodies = match (&pn.body, &cn.body) {
                    (Some(pb), Some(cb)) => same_tokens(&pb.print(), &cb.print()),
                    (None, None) => true,
                    _ => false,
                };
                bodies
                    && same_target(&pn.constructor_type, &cn.constructor_type)
                    && self.type_tree(&pn.clazz, &cn.clazz)
                    && self.exprs(&pn.args, &cn.args)
            }
            ExprKind::NewArray(pn) => {
                let ExprKind::NewArray(cn) = &c.kind else {
                    return false;
                };
                pn.dims.len() == cn.dims.len()
                    && self.type_tree(&pn.elem, &cn.elem)
                    && pn
                        .dims
                        .iter()
                        .zip(&cn.dims)
                        .all(|(pd, cd)| self.opt_expr(&pd.size, &cd.size))
                    && self.opt_expr(&pn.init, &cn.init)
            }
            ExprKind::ArrayInit(pe) => {
                let ExprKind::ArrayInit(ce) = &c.kind else {
                    return false;
                };
                self.exprs(pe, ce)
            }
            ExprKind::Binary(pb) => {
                let ExprKind::Binary(cb) = &c.kind else {
                    return false;
                };
                pb.op == cb.op && self.expr(&pb.left, &cb.left) && self.expr(&pb.right, &cb.right)
            }
            ExprKind::Unary(pu) => {
                let ExprKind::Unary(cu) = &c.kind else {
                    return false;
                };
                pu.op == cu.op && self.expr(&pu.operand, &cu.operand)
            }
            ExprKind::Assign(pa) => {
                let ExprKind::Assign(ca) = &c.kind else {
                    return false;
                };
                pa.op == ca.op && self.expr(&pa.target, &ca.target) && self.expr(&pa.value, &ca.value)
            }
            ExprKind::Ternary(pt) => {
                let ExprKind::Ternary(ct) = &c.kind else {
                    return false;
                };
                self.expr(&pt.cond, &ct.cond)
                    && self.expr(&pt.then_expr, &ct.then_expr)
                    && self.expr(&pt.else_expr, &ct.else_expr)
            }
            ExprKind::Paren(pp) => {
                let ExprKind::Paren(cp) = &c.kind else {
                    return false;
                };
                self.expr(&pp.inner, &cp.inner)
            }
            ExprKind::Cast(pc) => {
                let ExprKind::Cast(cc) = &c.kind else {
                    return false;
                };
                self.type_tree(&pc.clazz, &cc.clazz) && self.expr(&pc.expr, &cc.expr)
            }
            ExprKind::InstanceOf(pi) => {
                let ExprKind::InstanceOf(ci) = &c.kind else {
                    return false;
                };
                self.expr(&pi.expr, &ci.expr) && self.type_tree(&pi.clazz, &ci.clazz)
            }
            ExprKind::ArrayAccess(pa) => {
                let ExprKind::ArrayAccess(ca) = &c.kind else {
                    return false;
                };
                self.expr(&pa.array, &ca.array) && self.expr(&pa.index, &ca.index)
            }
            ExprKind::Lambda(pl) => {
                let ExprKind::Lambda(cl) = &c.kind else {
                    return false;
                };
                let params = pl.params.len() == cl.params.len()
                    && pl.params.iter().zip(cl.params.iter()).all(|(pp, cp)| {
                        let names = |s: &Stmt| s.as_variables().map(|v| v.names().map(str::to_string).collect::<Vec<_>>());
                        names(pp) == names(cp)
                    });
                params
                    && match (&pl.body, &cl.body) {
                        (LambdaBody::Expr(pb), LambdaBody::Expr(cb)) => self.expr(pb, cb),
                        (LambdaBody::Block(pb), LambdaBody::Block(cb)) => self.stmt(pb, cb),
                        _ => false,
                    }
            }
            ExprKind::MemberRef(pr) => {
                let ExprKind::MemberRef(cr) = &c.kind else {
                    return false;
                };
                pr.name.text == cr.name.text && self.expr(&pr.target, &cr.target)
            }
        }
    }

    fn exprs(&mut self, p: &Container<Arc<Expr>>, c: &Container<Arc<Expr>>) -> bool {
        p.len() == c.len() && p.iter().zip(c.iter()).all(|(p, c)| self.expr(p, c))
    }

    fn opt_expr(&mut self, p: &Option<Arc<Expr>>, c: &Option<Arc<Expr>>) -> bool {
        match (p, c) {
            (Some(p), Some(c)) => self.expr(p, c),
            (None, None) => true,
            _ => false,
        }
    }

    /// Types compare by their resolved type when both are resolved, by
    /// spelling otherwise.
    fn type_tree(&self, p: &TypeTree, c: &TypeTree) -> bool {
        match (&p.ty, &c.ty) {
            (Some(pt), Some(ct)) => pt == ct,
            _ => same_tokens(&p.print(), &c.print()),
        }
    }

    fn stmt(&mut self, p: &Arc<Stmt>, c: &Arc<Stmt>) -> bool {
        match &p.kind {
            StmtKind::Block(pb) => {
                let StmtKind::Block(cb) = &c.kind else {
                    return false;
                };
                pb.static_init.is_some() == cb.static_init.is_some() && self.stmts(&pb.stmts, &cb.stmts)
            }
            StmtKind::Variables(pv) => {
                let StmtKind::Variables(cv) = &c.kind else {
                    return false;
                };
                let types = match (&pv.type_tree, &cv.type_tree) {
                    (Some(pt), Some(ct)) => self.type_tree(pt, ct),
                    (None, None) => true,
                    _ => false,
                };
                types
                    && modifier_flags(&pv.modifiers) == modifier_flags(&cv.modifiers)
                    && pv.vars.len() == cv.vars.len()
                    && pv.vars.iter().zip(&cv.vars).all(|(pd, cd)| {
                        let (pd, cd) = (&pd.elem, &cd.elem);
                        pd.name.text == cd.name.text
                            && pd.dims.len() == cd.dims.len()
                            && self.opt_expr(&pd.init.as_ref().map(|i| i.value.clone()), &cd.init.as_ref().map(|i| i.value.clone()))
                    })
            }
            StmtKind::Expr(pe) => {
                let StmtKind::Expr(ce) = &c.kind else {
                    return false;
                };
                self.expr(&pe.expr, &ce.expr)
            }
            StmtKind::If(pi) => {
                let StmtKind::If(ci) = &c.kind else {
                    return false;
                };
                let else_branches = match (&pi.else_branch, &ci.else_branch) {
                    (Some(pe), Some(ce)) => self.stmt(&pe.stmt, &ce.stmt),
                    (None, None) => true,
                    _ => false,
                };
                self.expr(&pi.cond.expr, &ci.cond.expr) && self.stmt(&pi.then_stmt, &ci.then_stmt) && else_branches
            }
            StmtKind::While(pw) => {
                let StmtKind::While(cw) = &c.kind else {
                    return false;
                };
                self.expr(&pw.cond.expr, &cw.cond.expr) && self.stmt(&pw.body, &cw.body)
            }
            StmtKind::DoWhile(pd) => {
                let StmtKind::DoWhile(cd) = &c.kind else {
                    return false;
                };
                self.stmt(&pd.body, &cd.body) && self.expr(&pd.cond.expr, &cd.cond.expr)
            }
            StmtKind::For(pf) => {
                let StmtKind::For(cf) = &c.kind else {
                    return false;
                };
                self.stmt(&pf.init, &cf.init)
                    && self.opt_expr(&pf.cond, &cf.cond)
                    && self.exprs(&pf.update, &cf.update)
                    && self.stmt(&pf.body, &cf.body)
            }
            StmtKind::ForEach(pf) => {
                let StmtKind::ForEach(cf) = &c.kind else {
                    return false;
                };
                self.stmt(&pf.var, &cf.var) && self.expr(&pf.iterable, &cf.iterable) && self.stmt(&pf.body, &cf.body)
            }
            StmtKind::Return(pr) => {
                let StmtKind::Return(cr) = &c.kind else {
                    return false;
                };
                self.opt_expr(&pr.expr, &cr.expr)
            }
            StmtKind::Throw(pt) => {
                let StmtKind::Throw(ct) = &c.kind else {
                    return false;
                };
                self.expr(&pt.expr, &ct.expr)
            }
            StmtKind::Assert(pa) => {
                let StmtKind::Assert(ca) = &c.kind else {
                    return false;
                };
                let details = match (&pa.detail, &ca.detail) {
                    (Some((_, pd)), Some((_, cd))) => self.expr(pd, cd),
                    (None, None) => true,
                    _ => false,
                };
                self.expr(&pa.cond, &ca.cond) && details
            }
            StmtKind::Break(pj) => {
                let StmtKind::Break(cj) = &c.kind else {
                    return false;
                };
                label(&pj.label) == label(&cj.label)
            }
            StmtKind::Continue(pj) => {
                let StmtKind::Continue(cj) = &c.kind else {
                    return false;
                };
                label(&pj.label) == label(&cj.label)
            }
            StmtKind::Empty => matches!(c.kind, StmtKind::Empty),
            StmtKind::Method(_) => c.as_method().is_some() && same_tokens(&p.print(), &c.print()),
            StmtKind::Class(_) => c.as_class().is_some() && same_tokens(&p.print(), &c.print()),
        }
    }

    fn stmts(&mut self, p: &[Arc<Stmt>], c: &[Arc<Stmt>]) -> bool {
        p.len() == c.len() && p.iter().zip(c).all(|(p, c)| self.stmt(p, c))
    }
}

fn label(name: &Option<jtemplate_parser::ast::Name>) -> Option<&str> {
    name.as_ref().map(|n| n.as_str())
}

/// Two resolved invocations must target the same declaration; a resolved
/// pattern never matches an unresolved candidate.
fn same_target(pattern: &Option<MethodType>, candidate: &Option<MethodType>) -> bool {
    match (pattern, candidate) {
        (Some(p), Some(c)) => p.same_signature(c),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn compatible(pattern: &Option<JavaType>, candidate: &Option<JavaType>) -> bool {
    match (pattern, candidate) {
        (Some(p), Some(c)) => p == c,
        _ => true,
    }
}

/// A literal, or a negated numeric literal.
pub(crate) fn is_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) => true,
        ExprKind::Unary(u) if u.op == UnaryOp::Neg => matches!(u.operand.kind, ExprKind::Literal(_)),
        _ => false,
    }
}

/// Whether two pieces of source have the same token sequence, ignoring
/// whitespace and comments.
fn same_tokens(a: &str, b: &str) -> bool {
    match (Lexer::new(a).tokenize(), Lexer::new(b).tokenize()) {
        (Ok(a), Ok(b)) => {
            a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.kind == y.kind && x.text == y.text)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(body: &str) -> SourceFile {
        SourceFile::parse(&format!(
            "import java.util.*;\nclass A {{\n    void m(StringBuilder sb, int i, long l, short s, Integer boxed, List<String> strings) {{\n{body}\n    }}\n}}\n"
        ))
        .unwrap()
    }

    fn expr_matches(template: &JavaTemplate, file: &SourceFile, text: &str) -> Option<Match> {
        let cursor = file.find_expr(text).unwrap_or_else(|| panic!("no expression `{text}`"));
        template.matches(&cursor)
    }

    #[test]
    fn typed_holes_accept_widening_conversions() {
        let template = JavaTemplate::builder("#{any(long)}").build().unwrap();
        let file = file("        l = i + s;");
        assert!(expr_matches(&template, &file, "i").is_some());
        assert!(expr_matches(&template, &file, "s").is_some());
        assert!(expr_matches(&template, &file, "l").is_some());

        let narrow = JavaTemplate::builder("#{any(short)}").build().unwrap();
        assert!(expr_matches(&narrow, &file, "i").is_none());
        assert!(expr_matches(&narrow, &file, "s").is_some());
    }

    #[test]
    fn boxing_and_unboxing() {
        let template = JavaTemplate::builder("#{any(long)}").build().unwrap();
        let file = file("        l = boxed;");
        assert!(expr_matches(&template, &file, "boxed").is_some());

        let object = JavaTemplate::builder("#{any(Object)}").build().unwrap();
        assert!(expr_matches(&object, &file, "l").is_some());
    }

    #[test]
    fn overloads_must_agree() {
        let template = JavaTemplate::builder("#{any(java.lang.StringBuilder)}.append(#{any(int)})")
            .build()
            .unwrap();
        let file = file("        sb.append(1);\n        sb.append(1 + 1);\n        sb.append(1L);\n        sb.append((long) 1);");
        let found = expr_matches(&template, &file, "sb.append(1)").unwrap();
        assert_eq!(found.parameter(0).unwrap().print().trim(), "sb");
        assert_eq!(found.parameter(1).unwrap().print().trim(), "1");
        assert!(expr_matches(&template, &file, "sb.append(1 + 1)").is_some());
        assert!(expr_matches(&template, &file, "sb.append(1L)").is_none());
        assert!(expr_matches(&template, &file, "sb.append((long) 1)").is_none());
    }

    #[test]
    fn named_back_references_bind_equal_trees() {
        let template = JavaTemplate::builder("#{a:any(int)} + #{a}").build().unwrap();
        let file = file("        i = i + i;\n        i = i + s;");
        let found = expr_matches(&template, &file, "i + i").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("a").unwrap().print().trim(), "i");
        assert!(expr_matches(&template, &file, "i + s").is_none());
    }

    #[test]
    fn literal_holes_need_literals() {
        let template = JavaTemplate::builder("#{literal(int)} * 2").build().unwrap();
        let file = file("        i = 3 * 2;\n        i = i * 2;\n        i = -4 * 2;");
        assert!(expr_matches(&template, &file, "3 * 2").is_some());
        assert!(expr_matches(&template, &file, "-4 * 2").is_some());
        assert!(expr_matches(&template, &file, "i * 2").is_none());
    }

    #[test]
    fn generic_holes_unify() {
        let template = JavaTemplate::builder("java.util.Objects.requireNonNull(#{x:any(T)})")
            .generic_types(["T extends CharSequence"])
            .build()
            .unwrap();
        let file = file("        Objects.requireNonNull(\"s\");\n        Objects.requireNonNull(boxed);");
        let found = expr_matches(&template, &file, "Objects.requireNonNull(\"s\")").unwrap();
        assert_eq!(found.type_var("T"), Some(&JavaType::string()));
        assert!(expr_matches(&template, &file, "Objects.requireNonNull(boxed)").is_none());
    }

    #[test]
    fn generic_holes_must_agree_with_each_other() {
        let template = JavaTemplate::builder("java.util.Objects.equals(#{a:any(java.util.List<T>)}, #{b:any(T)})")
            .generic_types(["T"])
            .build()
            .unwrap();
        let file = file("        Objects.equals(strings, \"x\");\n        Objects.equals(strings, boxed);");
        let found = expr_matches(&template, &file, "Objects.equals(strings, \"x\")").unwrap();
        assert_eq!(found.type_var("T"), Some(&JavaType::string()));
        assert!(expr_matches(&template, &file, "Objects.equals(strings, boxed)").is_none());

        // Each hole alone accepts `boxed`; only the binding from the first one rules it out.
        let alone = JavaTemplate::builder("java.util.Objects.equals(#{a:any(Object)}, #{b:any(T)})")
            .generic_types(["T"])
            .build()
            .unwrap();
        assert!(expr_matches(&alone, &file, "Objects.equals(strings, boxed)").is_some());
    }

    #[test]
    fn array_holes_need_arrays() {
        let file = file("        String[] names = {};\n        int[] counts = {};\n        Object o = names;\n        o = counts;\n        o = sb;\n        o = i;");
        let any_array = JavaTemplate::builder("#{anyArray}").build().unwrap();
        assert!(expr_matches(&any_array, &file, "names").is_some());
        assert!(expr_matches(&any_array, &file, "counts").is_some());
        assert!(expr_matches(&any_array, &file, "sb").is_none());
        assert!(expr_matches(&any_array, &file, "i").is_none());

        let strings = JavaTemplate::builder("#{anyArray(String)}").build().unwrap();
        assert!(expr_matches(&strings, &file, "names").is_some());
        assert!(expr_matches(&strings, &file, "counts").is_none());
        assert!(expr_matches(&strings, &file, "sb").is_none());
    }

    #[test]
    fn statements_match_statements() {
        let template = JavaTemplate::builder("if (#{any(boolean)}) { return; }").build().unwrap();
        let file = file("        if (i > 0) { return; }\n        if (i > 0) { i++; }");
        assert!(template.matches(&file.find_stmt("if (i > 0) { return; }").unwrap()).is_some());
        assert!(template.matches(&file.find_stmt("if (i > 0) { i++; }").unwrap()).is_none());
        assert!(template.matches(&file.find_expr("i > 0").unwrap()).is_none());
    }

    #[test]
    fn absent_candidates_and_repeated_matching() {
        let template = JavaTemplate::builder("#{any(int)} + 1").build().unwrap();
        let file = file("        i = i + 1;");
        let cursor = file.find_expr("i + 1").unwrap();
        assert!(template.matches_expr(None, &cursor).is_none());
        let first = template.matches(&cursor).unwrap();
        let second = template.matches(&cursor).unwrap();
        assert!(Arc::ptr_eq(first.parameter(0).unwrap(), second.parameter(0).unwrap()));
        assert_eq!(template.find_matches(&file).len(), 1);
    }
}
