//! Where an instantiated template goes, and how it is spliced in.
//!
//! Every variant accepts certain node kinds at the cursor and requires the
//! rendered template to parse in one [`Shape`]. Splicing rebuilds only the
//! path from the compilation unit to the edited node; everything else stays
//! shared with the original tree.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use jtemplate_compiler::{Attributor, Imports, Scope};
use jtemplate_core::{ParseError, ParseErrorKind, ParseErrors, Span, TemplateInstantiationError};
use jtemplate_parser::Parser;
use jtemplate_parser::ast::fold::{self, Fold};
use jtemplate_parser::ast::{
    Annotation, Block, CompilationUnit, Container, Expr, ExprKind, MethodCall, MethodDecl, Modifier, NewClass, NodeId,
    Padded, Space, Stmt, StmtKind, Tree, TypeList, TypeParam, TypeTree,
};
use jtemplate_registry::TypeTable;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::Cursor;
use crate::cursor::is_class_like;
use crate::format::{FormatOptions, line_like};

/// Orders annotations for [`Coordinates::AddAnnotation`].
#[derive(Clone, Copy)]
pub struct AnnotationOrder(pub fn(&Annotation, &Annotation) -> Ordering);

impl fmt::Debug for AnnotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnnotationOrder")
    }
}

/// Annotations sorted by simple name.
pub fn by_simple_name(a: &Annotation, b: &Annotation) -> Ordering {
    a.simple_name().cmp(b.simple_name())
}

/// Where [`JavaTemplate::apply`](crate::JavaTemplate::apply) puts the
/// rendered template, relative to the node at the cursor.
#[derive(Debug, Clone, Copy)]
pub enum Coordinates {
    /// Replace the expression, statement, annotation or type. A statement in
    /// a block may be replaced by several.
    Replace,
    /// Replace the statements of a method body.
    ReplaceBody,
    /// Replace the arguments of a method call or `new` expression.
    ReplaceArguments,
    /// Replace every annotation of a class, method or variable declaration.
    ReplaceAnnotations,
    /// Add annotations to a declaration, placed by the given order.
    AddAnnotation(AnnotationOrder),
    /// Insert before the first statement of a method body or block, or the
    /// first member of a class.
    FirstStatement,
    /// Insert after the last statement or member.
    LastStatement,
    /// Replace the `throws` clause of a method; an empty template removes it.
    ReplaceThrows,
    /// Insert before a statement or member.
    Before,
    /// Insert after a statement or member.
    After,
    /// Replace the formal parameters of a method.
    ReplaceParameters,
}

impl Coordinates {
    /// [`Coordinates::AddAnnotation`] ordered by simple name.
    pub fn add_annotation() -> Self {
        Coordinates::AddAnnotation(AnnotationOrder(by_simple_name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Coordinates::Replace => "replace",
            Coordinates::ReplaceBody => "replace body",
            Coordinates::ReplaceArguments => "replace arguments",
            Coordinates::ReplaceAnnotations => "replace annotations",
            Coordinates::AddAnnotation(_) => "add annotation",
            Coordinates::FirstStatement => "first statement",
            Coordinates::LastStatement => "last statement",
            Coordinates::ReplaceThrows => "replace throws",
            Coordinates::Before => "before",
            Coordinates::After => "after",
            Coordinates::ReplaceParameters => "replace parameters",
        }
    }

    fn incompatible(&self, tree: &Tree) -> TemplateInstantiationError {
        TemplateInstantiationError::IncompatibleCoordinates {
            coordinates: self.name(),
            node: tree.kind_name(),
        }
    }

    pub(crate) fn shape_error(&self, shape: Shape, errors: ParseErrors) -> TemplateInstantiationError {
        TemplateInstantiationError::FragmentShape {
            coordinates: self.name(),
            expected: shape.describe(),
            errors,
        }
    }

    /// The shape the template must parse in at `cursor`.
    pub(crate) fn shape(&self, cursor: &Cursor) -> Result<Shape, TemplateInstantiationError> {
        let value = cursor.value();
        let statements = || if is_member_position(cursor) { Shape::Members } else { Shape::Stmts };
        let shape = match (self, value) {
            (Coordinates::Replace, Tree::Expr(_)) => Some(Shape::Expr),
            (Coordinates::Replace, Tree::Stmt(_)) => Some(statements()),
            (Coordinates::Replace, Tree::Annotation(_)) => Some(Shape::Annotations),
            (Coordinates::Replace, Tree::Type(_)) => Some(Shape::Types),
            (Coordinates::Before | Coordinates::After, Tree::Stmt(_)) if is_list_position(cursor) => Some(statements()),
            (Coordinates::ReplaceBody, Tree::Stmt(stmt)) => stmt.as_method().map(|_| Shape::Stmts),
            (Coordinates::ReplaceArguments, Tree::Expr(expr)) => {
                matches!(expr.kind, ExprKind::MethodCall(_) | ExprKind::NewClass(_)).then_some(Shape::Exprs)
            }
            (Coordinates::ReplaceAnnotations | Coordinates::AddAnnotation(_), Tree::Stmt(stmt)) => {
                modifiers_of(stmt).map(|_| Shape::Annotations)
            }
            (Coordinates::FirstStatement | Coordinates::LastStatement, Tree::Stmt(stmt)) => match &stmt.kind {
                StmtKind::Method(method) => method.body.as_ref().map(|_| Shape::Stmts),
                StmtKind::Class(_) => Some(Shape::Members),
                StmtKind::Block(_) if cursor.parent_tree().is_some_and(is_class_like) => Some(Shape::Members),
                StmtKind::Block(_) => Some(Shape::Stmts),
                _ => None,
            },
            (Coordinates::ReplaceThrows, Tree::Stmt(stmt)) => stmt.as_method().map(|_| Shape::Types),
            (Coordinates::ReplaceParameters, Tree::Stmt(stmt)) => stmt.as_method().map(|_| Shape::Params),
            _ => None,
        };
        shape.ok_or_else(|| self.incompatible(value))
    }

    /// Whether an edit of this shape can change class or member signatures.
    pub(crate) fn changes_declarations(&self, shape: Shape) -> bool {
        matches!(shape, Shape::Members | Shape::Params | Shape::Types)
    }

    /// Indentation for continuation lines of the rendered fragment.
    pub(crate) fn indent(&self, cursor: &Cursor, format: &FormatOptions) -> String {
        let owner = line_indent(cursor);
        let Some(op) = self.body_edit() else {
            return owner;
        };
        match body_block(cursor.value()).and_then(|b| b.as_block()) {
            Some(block) => child_prefix(block, op, &owner, format)
                .indent()
                .map(str::to_string)
                .unwrap_or(owner),
            None => format!("{owner}{}", format.indent),
        }
    }

    fn body_edit(&self) -> Option<BodyEdit> {
        match self {
            Coordinates::ReplaceBody => Some(BodyEdit::Replace),
            Coordinates::FirstStatement => Some(BodyEdit::First),
            Coordinates::LastStatement => Some(BodyEdit::Last),
            _ => None,
        }
    }

    /// Splice `fragment` at the cursor and return the new compilation unit.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn splice(
        &self,
        cursor: &Cursor,
        fragment: Fragment,
        context: &SpliceContext<'_>,
    ) -> Result<Arc<CompilationUnit>, TemplateInstantiationError> {
        let edit = self.edit(cursor, fragment, context)?;
        trace!(coordinates = self.name(), node = cursor.value().kind_name(), "splicing");
        let mut splicer = Splicer {
            path: cursor.path().map(Tree::id).collect(),
            edit,
        };
        Ok(splicer.fold_unit(cursor.file().unit()))
    }

    fn edit(
        &self,
        cursor: &Cursor,
        fragment: Fragment,
        context: &SpliceContext<'_>,
    ) -> Result<Edit, TemplateInstantiationError> {
        let value = cursor.value();
        match (*self, fragment, value) {
            (Coordinates::Replace, Fragment::Expr(expr), Tree::Expr(original)) => {
                Ok(Edit::Expr(original.id, Arc::new(expr.with_prefix(original.prefix.clone()))))
            }
            (Coordinates::Replace, Fragment::Stmts(stmts) | Fragment::Members(stmts), Tree::Stmt(original)) => {
                let separator = line_like(&original.prefix, Space::single());
                let stmts: Vec<Arc<Stmt>> = stmts
                    .iter()
                    .enumerate()
                    .map(|(index, stmt)| {
                        let prefix = if index == 0 { original.prefix.clone() } else { separator.clone() };
                        Arc::new(stmt.with_prefix(prefix))
                    })
                    .collect();
                if is_list_position(cursor) {
                    Ok(Edit::Splice(original.id, stmts))
                } else {
                    let stmt = self.single(Shape::Stmts, stmts)?;
                    Ok(Edit::Stmt(original.id, stmt))
                }
            }
            (Coordinates::Replace, Fragment::Annotations(annotations), Tree::Annotation(original)) => {
                let annotation = self.single(Shape::Annotations, annotations)?;
                Ok(Edit::Annotation(
                    original.id,
                    Arc::new(annotation.with_prefix(original.prefix.clone())),
                ))
            }
            (Coordinates::Replace, Fragment::Types(types), Tree::Type(original)) => {
                let ty = self.single(Shape::Types, types)?;
                Ok(Edit::Type(
                    original.id,
                    Arc::new(TypeTree {
                        prefix: original.prefix.clone(),
                        ..(*ty).clone()
                    }),
                ))
            }
            (
                Coordinates::Before | Coordinates::After,
                Fragment::Stmts(stmts) | Fragment::Members(stmts),
                Tree::Stmt(original),
            ) => {
                let at_top = matches!(cursor.parent_tree(), Some(Tree::Unit(_)));
                let fallback = if at_top { Space::new("\n") } else { Space::single() };
                let separator = line_like(&original.prefix, fallback);
                let mut inserted: Vec<Arc<Stmt>> =
                    stmts.iter().map(|s| Arc::new(s.with_prefix(separator.clone()))).collect();
                let list = if matches!(self, Coordinates::After) {
                    let mut list = vec![original.clone()];
                    list.append(&mut inserted);
                    list
                } else if original.prefix.has_newline() || inserted.is_empty() {
                    inserted.push(original.clone());
                    inserted
                } else {
                    // The first inserted statement takes over the line start.
                    inserted[0] = Arc::new(inserted[0].with_prefix(original.prefix.clone()));
                    inserted.push(Arc::new(original.with_prefix(separator)));
                    inserted
                };
                Ok(Edit::Splice(original.id, list))
            }
            (
                Coordinates::ReplaceBody | Coordinates::FirstStatement | Coordinates::LastStatement,
                Fragment::Stmts(stmts) | Fragment::Members(stmts),
                Tree::Stmt(original),
            ) => {
                let op = self.body_edit().unwrap_or(BodyEdit::Replace);
                let owner = line_indent(cursor);
                let kind = match &original.kind {
                    StmtKind::Method(method) => {
                        let body = match &method.body {
                            Some(body) => edit_block(body, op, stmts, &owner, context.format),
                            None => return Err(self.incompatible(value)),
                        };
                        StmtKind::Method(MethodDecl {
                            body: Some(body),
                            ..method.clone()
                        })
                    }
                    StmtKind::Class(class) => {
                        let mut class = class.clone();
                        class.body = edit_block(&class.body, op, stmts, &owner, context.format);
                        StmtKind::Class(class)
                    }
                    StmtKind::Block(_) => {
                        return Ok(Edit::Stmt(
                            original.id,
                            edit_block(original, op, stmts, &owner, context.format),
                        ));
                    }
                    _ => return Err(self.incompatible(value)),
                };
                Ok(Edit::Stmt(original.id, rebuilt(original, kind)))
            }
            (Coordinates::ReplaceArguments, Fragment::Exprs(args), Tree::Expr(original)) => {
                let kind = match &original.kind {
                    ExprKind::MethodCall(call) => ExprKind::MethodCall(MethodCall {
                        args: merge_arguments(&call.args, args),
                        method_type: None,
                        ..call.clone()
                    }),
                    ExprKind::NewClass(new) => ExprKind::NewClass(NewClass {
                        args: merge_arguments(&new.args, args),
                        constructor_type: None,
                        ..new.clone()
                    }),
                    _ => return Err(self.incompatible(value)),
                };
                let call = Arc::new(Expr {
                    kind,
                    ty: None,
                    ..(**original).clone()
                });
                let mut attributor =
                    Attributor::new(context.table, context.imports.clone()).with_scope(cursor.scope());
                Ok(Edit::Expr(original.id, attributor.attribute_expr(&call)))
            }
            (
                Coordinates::ReplaceAnnotations | Coordinates::AddAnnotation(_),
                Fragment::Annotations(added),
                Tree::Stmt(original),
            ) => {
                let Some(modifiers) = modifiers_of(original) else {
                    return Err(self.incompatible(value));
                };
                let annotations = match *self {
                    Coordinates::AddAnnotation(AnnotationOrder(order)) => {
                        let mut annotations: Vec<Arc<Annotation>> =
                            jtemplate_parser::ast::annotations(modifiers).cloned().collect();
                        for annotation in added {
                            let at = annotations
                                .iter()
                                .position(|existing| order(annotation.as_ref(), existing.as_ref()) == Ordering::Less)
                                .unwrap_or(annotations.len());
                            annotations.insert(at, annotation);
                        }
                        annotations
                    }
                    _ => added,
                };
                let separator = if is_parameter(cursor) {
                    Space::single()
                } else {
                    Space::new(format!("\n{}", line_indent(cursor)))
                };
                Ok(Edit::Stmt(
                    original.id,
                    with_annotations(original, annotations, &separator),
                ))
            }
            (Coordinates::ReplaceThrows, Fragment::Types(types), Tree::Stmt(original)) => {
                let Some(method) = original.as_method() else {
                    return Err(self.incompatible(value));
                };
                let throws = (!types.is_empty()).then(|| TypeList {
                    keyword: method
                        .throws
                        .as_ref()
                        .map(|t| t.keyword.clone())
                        .unwrap_or_else(Space::single),
                    types: types
                        .iter()
                        .enumerate()
                        .map(|(index, ty)| {
                            let prefix = if index == 0 || ty.prefix.is_empty() {
                                Space::single()
                            } else {
                                ty.prefix.clone()
                            };
                            Padded::new(Arc::new(TypeTree {
                                prefix,
                                ..(**ty).clone()
                            }))
                        })
                        .collect(),
                });
                let method = MethodDecl {
                    throws,
                    ..method.clone()
                };
                Ok(Edit::Stmt(original.id, rebuilt(original, StmtKind::Method(method))))
            }
            (Coordinates::ReplaceParameters, Fragment::Params(params), Tree::Stmt(original)) => {
                let Some(method) = original.as_method() else {
                    return Err(self.incompatible(value));
                };
                let close = if !params.is_empty() {
                    Space::empty()
                } else if method.params.is_empty() {
                    method.params.close.clone()
                } else {
                    Space::empty()
                };
                let mut elems: Vec<Padded<Arc<Stmt>>> = params.into_iter().map(Padded::new).collect();
                if let (Some(first), Some(old)) = (elems.first_mut(), method.params.elems.first()) {
                    first.elem = Arc::new(first.elem.with_prefix(old.elem.prefix.clone()));
                }
                let method = MethodDecl {
                    params: Container {
                        before: method.params.before.clone(),
                        elems,
                        close,
                    },
                    method_type: None,
                    ..method.clone()
                };
                let stmt = rebuilt(original, StmtKind::Method(method));
                // Parameter types change the signature; attribute in the class.
                let scope = cursor.parent().map(|p| p.scope()).unwrap_or_else(Scope::new);
                let mut attributor = Attributor::new(context.table, context.imports.clone()).with_scope(scope);
                let stmt = attributor.attribute_members(std::slice::from_ref(&stmt)).pop().unwrap_or(stmt);
                Ok(Edit::Stmt(original.id, stmt))
            }
            _ => Err(self.incompatible(value)),
        }
    }

    fn single<T>(&self, shape: Shape, mut items: Vec<T>) -> Result<T, TemplateInstantiationError> {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return Ok(item);
            }
        }
        let error = ParseError::new(
            ParseErrorKind::TrailingInput,
            Span::default(),
            format!("expected exactly one, found {}", items.len()),
        );
        Err(self.shape_error(shape, error.into()))
    }
}

/// What a rendered template must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Expr,
    Exprs,
    Stmts,
    Members,
    Annotations,
    Types,
    Params,
}

impl Shape {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Shape::Expr => "an expression",
            Shape::Exprs => "an argument list",
            Shape::Stmts => "statements",
            Shape::Members => "class members",
            Shape::Annotations => "annotations",
            Shape::Types => "a type list",
            Shape::Params => "formal parameters",
        }
    }

    pub(crate) fn parse(self, source: &str) -> Result<Fragment, ParseErrors> {
        match self {
            Shape::Expr => Parser::parse_expression(source).map(Fragment::Expr),
            Shape::Exprs => Parser::parse_expression_list(source).map(Fragment::Exprs),
            Shape::Stmts => Parser::parse_statements(source).map(Fragment::Stmts),
            Shape::Members => Parser::parse_members(source).map(Fragment::Members),
            Shape::Annotations => Parser::parse_annotations(source).map(Fragment::Annotations),
            Shape::Types if source.trim().is_empty() => Ok(Fragment::Types(Vec::new())),
            Shape::Types => Parser::parse_type_list(source).map(Fragment::Types),
            Shape::Params => Parser::parse_parameters(source).map(Fragment::Params),
        }
    }
}

/// A parsed, rendered template.
#[derive(Debug, Clone)]
pub(crate) enum Fragment {
    Expr(Arc<Expr>),
    Exprs(Container<Arc<Expr>>),
    Stmts(Vec<Arc<Stmt>>),
    Members(Vec<Arc<Stmt>>),
    Annotations(Vec<Arc<Annotation>>),
    Types(Vec<Arc<TypeTree>>),
    Params(Vec<Arc<Stmt>>),
}

impl Fragment {
    pub(crate) fn attribute(self, attributor: &mut Attributor<'_>) -> Fragment {
        match self {
            Fragment::Expr(expr) => Fragment::Expr(attributor.attribute_expr(&expr)),
            Fragment::Exprs(args) => Fragment::Exprs(Container {
                elems: args
                    .elems
                    .iter()
                    .map(|p| Padded {
                        elem: attributor.attribute_expr(&p.elem),
                        after: p.after.clone(),
                    })
                    .collect(),
                before: args.before,
                close: args.close,
            }),
            Fragment::Stmts(stmts) => Fragment::Stmts(attributor.attribute_stmts(&stmts)),
            Fragment::Members(members) => Fragment::Members(attributor.attribute_members(&members)),
            Fragment::Annotations(annotations) => {
                Fragment::Annotations(annotations.iter().map(|a| attributor.attribute_annotation(a)).collect())
            }
            Fragment::Types(types) => Fragment::Types(types.iter().map(|t| attributor.attribute_type(t)).collect()),
            // Attributed with their method once spliced.
            Fragment::Params(params) => Fragment::Params(params),
        }
    }

    /// Run `folder` over every node of the fragment.
    pub(crate) fn fold<F: Fold>(self, folder: &mut F) -> Fragment {
        match self {
            Fragment::Expr(expr) => Fragment::Expr(folder.fold_expr(&expr)),
            Fragment::Exprs(args) => Fragment::Exprs(Container {
                before: folder.fold_space(&args.before),
                elems: args
                    .elems
                    .iter()
                    .map(|p| Padded {
                        elem: folder.fold_expr(&p.elem),
                        after: folder.fold_space(&p.after),
                    })
                    .collect(),
                close: folder.fold_space(&args.close),
            }),
            Fragment::Stmts(stmts) => Fragment::Stmts(stmts.iter().map(|s| folder.fold_stmt(s)).collect()),
            Fragment::Members(members) => Fragment::Members(members.iter().map(|s| folder.fold_stmt(s)).collect()),
            Fragment::Annotations(annotations) => {
                Fragment::Annotations(annotations.iter().map(|a| folder.fold_annotation(a)).collect())
            }
            Fragment::Types(types) => Fragment::Types(types.iter().map(|t| folder.fold_type(t)).collect()),
            Fragment::Params(params) => Fragment::Params(params.iter().map(|s| folder.fold_stmt(s)).collect()),
        }
    }
}

/// What the splice needs besides the fragment.
pub(crate) struct SpliceContext<'a> {
    pub table: &'a TypeTable,
    /// The file's imports plus the template's.
    pub imports: Imports,
    pub format: &'a FormatOptions,
}

/// Shifts every line of a fragment written at column zero to `indent`.
pub(crate) struct Reindent<'a> {
    indent: &'a str,
}

impl<'a> Reindent<'a> {
    pub(crate) fn new(indent: &'a str) -> Self {
        Self { indent }
    }
}

impl Fold for Reindent<'_> {
    fn fold_space(&mut self, space: &Space) -> Space {
        space.reindent("", self.indent)
    }
}

#[derive(Debug, Clone, Copy)]
enum BodyEdit {
    Replace,
    First,
    Last,
}

enum Edit {
    Expr(NodeId, Arc<Expr>),
    Stmt(NodeId, Arc<Stmt>),
    Type(NodeId, Arc<TypeTree>),
    Annotation(NodeId, Arc<Annotation>),
    /// Replace a statement of a block, or a top-level class, by a list.
    Splice(NodeId, Vec<Arc<Stmt>>),
}

/// Applies one [`Edit`], descending only along the cursor path.
struct Splicer {
    path: FxHashSet<NodeId>,
    edit: Edit,
}

impl Splicer {
    fn splice_list(&self, list: &[Arc<Stmt>]) -> Option<Vec<Arc<Stmt>>> {
        let Edit::Splice(target, stmts) = &self.edit else {
            return None;
        };
        let index = list.iter().position(|s| s.id == *target)?;
        let mut out = list[..index].to_vec();
        out.extend(stmts.iter().cloned());
        out.extend(list[index + 1..].iter().cloned());
        Some(out)
    }
}

impl Fold for Splicer {
    fn fold_unit(&mut self, unit: &Arc<CompilationUnit>) -> Arc<CompilationUnit> {
        match self.splice_list(&unit.types) {
            Some(types) => Arc::new(CompilationUnit {
                types,
                ..(**unit).clone()
            }),
            None => fold::walk_unit(self, unit),
        }
    }

    fn fold_stmt(&mut self, stmt: &Arc<Stmt>) -> Arc<Stmt> {
        if !self.path.contains(&stmt.id) {
            return stmt.clone();
        }
        if let Edit::Stmt(id, replacement) = &self.edit {
            if *id == stmt.id {
                return replacement.clone();
            }
        }
        if let StmtKind::Block(block) = &stmt.kind {
            if let Some(stmts) = self.splice_list(&block.stmts) {
                return rebuilt(
                    stmt,
                    StmtKind::Block(Block {
                        static_init: block.static_init.clone(),
                        stmts,
                        end: block.end.clone(),
                    }),
                );
            }
        }
        fold::walk_stmt(self, stmt)
    }

    fn fold_expr(&mut self, expr: &Arc<Expr>) -> Arc<Expr> {
        if !self.path.contains(&expr.id) {
            return expr.clone();
        }
        match &self.edit {
            Edit::Expr(id, replacement) if *id == expr.id => replacement.clone(),
            _ => fold::walk_expr(self, expr),
        }
    }

    fn fold_type(&mut self, ty: &Arc<TypeTree>) -> Arc<TypeTree> {
        if !self.path.contains(&ty.id) {
            return ty.clone();
        }
        match &self.edit {
            Edit::Type(id, replacement) if *id == ty.id => replacement.clone(),
            _ => fold::walk_type(self, ty),
        }
    }

    fn fold_annotation(&mut self, annotation: &Arc<Annotation>) -> Arc<Annotation> {
        if !self.path.contains(&annotation.id) {
            return annotation.clone();
        }
        match &self.edit {
            Edit::Annotation(id, replacement) if *id == annotation.id => replacement.clone(),
            _ => fold::walk_annotation(self, annotation),
        }
    }

    fn fold_type_param(&mut self, param: &Arc<TypeParam>) -> Arc<TypeParam> {
        if !self.path.contains(&param.id) {
            return param.clone();
        }
        fold::walk_type_param(self, param)
    }
}

fn rebuilt(stmt: &Stmt, kind: StmtKind) -> Arc<Stmt> {
    Arc::new(Stmt {
        id: stmt.id,
        prefix: stmt.prefix.clone(),
        kind,
    })
}

/// The indentation of the line the cursor's node starts on.
pub(crate) fn line_indent(cursor: &Cursor) -> String {
    let mut path: Vec<&Tree> = cursor.path().collect();
    path.reverse();
    path.into_iter()
        .filter_map(Tree::as_stmt)
        .find_map(|s| s.prefix.indent())
        .unwrap_or("")
        .to_string()
}

/// Whether the cursor's node is an element of a statement list.
fn is_list_position(cursor: &Cursor) -> bool {
    match cursor.parent_tree() {
        Some(Tree::Unit(_)) => true,
        Some(Tree::Stmt(parent)) => parent
            .as_block()
            .is_some_and(|b| b.stmts.iter().any(|s| s.id == cursor.value().id())),
        _ => false,
    }
}

/// Whether the cursor's node is a class member or top-level class.
fn is_member_position(cursor: &Cursor) -> bool {
    let ancestors = cursor.ancestors();
    match ancestors.split_last() {
        Some((Tree::Unit(_), _)) => true,
        Some((Tree::Stmt(parent), rest)) if parent.as_block().is_some() => rest.last().is_some_and(is_class_like),
        _ => false,
    }
}

fn is_parameter(cursor: &Cursor) -> bool {
    let id = cursor.value().id();
    match cursor.parent_tree() {
        Some(Tree::Stmt(parent)) => parent.as_method().is_some_and(|m| m.params.iter().any(|p| p.id == id)),
        Some(Tree::Expr(parent)) => matches!(parent.kind, ExprKind::Lambda(_)),
        _ => false,
    }
}

fn modifiers_of(stmt: &Stmt) -> Option<&[Modifier]> {
    match &stmt.kind {
        StmtKind::Method(method) => Some(&method.modifiers),
        StmtKind::Class(class) => Some(&class.modifiers),
        StmtKind::Variables(vars) => Some(&vars.modifiers),
        _ => None,
    }
}

/// The block whose statements the body coordinates edit.
fn body_block(tree: &Tree) -> Option<&Arc<Stmt>> {
    let stmt = tree.as_stmt()?;
    match &stmt.kind {
        StmtKind::Method(method) => method.body.as_ref(),
        StmtKind::Class(class) => Some(&class.body),
        StmtKind::Block(_) => Some(stmt),
        _ => None,
    }
}

/// Prefix of statements inserted into `block`: on their own line like
/// the neighbouring statement, or one level below `owner` in an empty block.
fn child_prefix(block: &Block, op: BodyEdit, owner: &str, format: &FormatOptions) -> Space {
    let neighbour = match op {
        BodyEdit::Last => block.stmts.last(),
        BodyEdit::First | BodyEdit::Replace => block.stmts.first(),
    };
    match neighbour {
        Some(stmt) => line_like(&stmt.prefix, Space::single()),
        None => format.nested_line(owner),
    }
}

fn edit_block(
    block_stmt: &Arc<Stmt>,
    op: BodyEdit,
    stmts: Vec<Arc<Stmt>>,
    owner: &str,
    format: &FormatOptions,
) -> Arc<Stmt> {
    let Some(block) = block_stmt.as_block() else {
        return block_stmt.clone();
    };
    let child = child_prefix(block, op, owner, format);
    let inserted: Vec<Arc<Stmt>> = stmts.iter().map(|s| Arc::new(s.with_prefix(child.clone()))).collect();
    let end = if !inserted.is_empty() && child.has_newline() && !block.end.has_newline() {
        Space::new(format!("\n{owner}"))
    } else {
        block.end.clone()
    };
    let stmts = match op {
        BodyEdit::Replace => inserted,
        BodyEdit::First => inserted.into_iter().chain(block.stmts.iter().cloned()).collect(),
        BodyEdit::Last => block.stmts.iter().cloned().chain(inserted).collect(),
    };
    rebuilt(
        block_stmt,
        StmtKind::Block(Block {
            static_init: block.static_init.clone(),
            stmts,
            end,
        }),
    )
}

/// `args` in the delimiters and outer spacing of `old`.
fn merge_arguments(old: &Container<Arc<Expr>>, args: Container<Arc<Expr>>) -> Container<Arc<Expr>> {
    let mut elems = args.elems;
    if let (Some(first), Some(previous)) = (elems.first_mut(), old.elems.first()) {
        first.elem = Arc::new(first.elem.with_prefix(previous.elem.prefix.clone()));
    }
    if let (Some(last), Some(previous)) = (elems.last_mut(), old.elems.last()) {
        last.after = previous.after.clone();
    }
    let close = if elems.is_empty() && old.elems.is_empty() {
        old.close.clone()
    } else {
        Space::empty()
    };
    Container {
        before: old.before.clone(),
        elems,
        close,
    }
}

/// Rebuild a declaration with `annotations` first, each followed by
/// `separator`, then the keyword modifiers.
fn with_annotations(stmt: &Arc<Stmt>, annotations: Vec<Arc<Annotation>>, separator: &Space) -> Arc<Stmt> {
    let Some(modifiers) = modifiers_of(stmt) else {
        return stmt.clone();
    };
    let keywords: Vec<&Modifier> = modifiers.iter().filter(|m| m.as_annotation().is_none()).collect();
    let has_annotations = !annotations.is_empty();

    let mut arranged: Vec<Modifier> = annotations
        .into_iter()
        .enumerate()
        .map(|(index, a)| {
            let prefix = if index == 0 { Space::empty() } else { separator.clone() };
            Modifier::Annotation(Arc::new(a.with_prefix(prefix)))
        })
        .collect();
    for (index, keyword) in keywords.iter().enumerate() {
        let keyword = match (index, has_annotations) {
            (0, true) => keyword.with_prefix(separator.clone()),
            (0, false) => keyword.with_prefix(Space::empty()),
            _ => (*keyword).clone(),
        };
        arranged.push(keyword);
    }
    // The token after the modifiers moves when no keyword separates it.
    let next = keywords
        .is_empty()
        .then(|| if has_annotations { separator.clone() } else { Space::empty() });

    let kind = match &stmt.kind {
        StmtKind::Method(method) => {
            let mut method = method.clone();
            method.modifiers = arranged;
            if let Some(next) = next {
                if let Some(type_params) = &mut method.type_params {
                    type_params.before = next;
                } else if let Some(return_type) = &method.return_type {
                    method.return_type = Some(Arc::new(TypeTree {
                        prefix: next,
                        ..(**return_type).clone()
                    }));
                } else {
                    method.name.prefix = next;
                }
            }
            StmtKind::Method(method)
        }
        StmtKind::Class(class) => {
            let mut class = class.clone();
            class.modifiers = arranged;
            if let Some(next) = next {
                class.keyword = next;
            }
            StmtKind::Class(class)
        }
        StmtKind::Variables(vars) => {
            let mut vars = vars.clone();
            vars.modifiers = arranged;
            if let (Some(next), Some(type_tree)) = (next, &vars.type_tree) {
                vars.type_tree = Some(Arc::new(TypeTree {
                    prefix: next,
                    ..(**type_tree).clone()
                }));
            }
            StmtKind::Variables(vars)
        }
        _ => return stmt.clone(),
    };
    rebuilt(stmt, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceFile;
    use jtemplate_parser::ast::Print;

    const SOURCE: &str = "\
class A {
    @Override
    public String toString() {
        return \"\";
    }

    void m(int x) {
        if (x > 0) foo(x);
    }
}
";

    #[test]
    fn shapes_follow_the_node_kind() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let method = file.find_method("toString").unwrap();
        assert_eq!(Coordinates::ReplaceBody.shape(&method).unwrap(), Shape::Stmts);
        assert_eq!(Coordinates::Before.shape(&method).unwrap(), Shape::Members);
        assert_eq!(Coordinates::ReplaceThrows.shape(&method).unwrap(), Shape::Types);
        assert_eq!(Coordinates::add_annotation().shape(&method).unwrap(), Shape::Annotations);

        let expr = file.find_expr("x > 0").unwrap();
        assert_eq!(Coordinates::Replace.shape(&expr).unwrap(), Shape::Expr);
        assert!(matches!(
            Coordinates::ReplaceBody.shape(&expr),
            Err(TemplateInstantiationError::IncompatibleCoordinates {
                coordinates: "replace body",
                node: "binary"
            })
        ));

        // The branch of an `if` is not in a statement list.
        let branch = file.find_stmt("foo(x);").unwrap();
        assert_eq!(Coordinates::Replace.shape(&branch).unwrap(), Shape::Stmts);
        assert!(Coordinates::Before.shape(&branch).is_err());
    }

    #[test]
    fn fragments_parse_per_shape() {
        assert!(matches!(Shape::Types.parse("  ").unwrap(), Fragment::Types(t) if t.is_empty()));
        assert!(matches!(Shape::Exprs.parse("a, -1, b").unwrap(), Fragment::Exprs(c) if c.len() == 3));
        assert!(matches!(Shape::Params.parse("int a, String b").unwrap(), Fragment::Params(p) if p.len() == 2));
        assert!(Shape::Expr.parse("return;").is_err());
    }

    #[test]
    fn indentation_of_inserted_statements() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let format = FormatOptions::default();
        let method = file.find_method("toString").unwrap();
        assert_eq!(line_indent(&method), "    ");
        assert_eq!(Coordinates::FirstStatement.indent(&method, &format), "        ");
        assert_eq!(Coordinates::Replace.indent(&file.find_expr("\"\"").unwrap(), &format), "        ");
    }

    #[test]
    fn annotations_are_normalized_before_keywords() {
        let file = SourceFile::parse(SOURCE).unwrap();
        let method = file.find_method("toString").unwrap();
        let stmt = method.value().as_stmt().unwrap();
        let annotations = Parser::parse_annotations("@Deprecated").unwrap();
        let separator = Space::new("\n    ");
        let printed = with_annotations(stmt, annotations, &separator).print();
        assert!(printed.starts_with("\n    @Deprecated\n    public String toString()"));

        let printed = with_annotations(stmt, Vec::new(), &separator).print();
        assert!(printed.starts_with("\n    public String toString()"));
    }

    #[test]
    fn arguments_keep_their_delimiters() {
        let old = Parser::parse_expression("f( a, b )").unwrap();
        let ExprKind::MethodCall(call) = &old.kind else {
            panic!("expected a call");
        };
        let Fragment::Exprs(args) = Shape::Exprs.parse("x, y, z").unwrap() else {
            panic!("expected arguments");
        };
        let merged = merge_arguments(&call.args, args);
        let printed: Vec<String> = merged.iter().map(|e| e.print()).collect();
        assert_eq!(printed, vec![" x", " y", " z"]);
        assert_eq!(merged.elems[2].after.as_str(), " ");
    }
}
