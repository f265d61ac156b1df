//! Expression attribution.

use std::sync::Arc;

use jtemplate_core::{JavaType, OBJECT, PrimitiveKind, STRING, Wildcard};
use jtemplate_parser::ast::{
    ArrayAccess, ArrayDim, Assign, Binary, BinaryOp, Cast, Expr, ExprKind, FieldAccess, InstanceOf, Lambda,
    LambdaBody, MemberRef, NewArray, Paren, Ternary, Unary, UnaryOp,
};
use jtemplate_registry::{MemberField, class_subst, substitute};

use super::{Attributor, known, map_container};
use crate::conversion::{binary_promotion, unary_promotion};
use crate::inference::upper_bound;

/// What a name expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NameKind {
    Value,
    Type,
    /// Nothing in scope; possibly a package prefix.
    Unresolved,
}

const BOOLEAN: JavaType = JavaType::Primitive(PrimitiveKind::Boolean);

/// Rebuild `expr` with a new kind and type.
pub(super) fn typed(expr: &Expr, kind: ExprKind, ty: JavaType) -> Arc<Expr> {
    Arc::new(Expr {
        id: expr.id,
        prefix: expr.prefix.clone(),
        kind,
        ty: known(ty),
    })
}

/// Lambdas and method references take their type from the context.
pub(super) fn is_poly(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Lambda(_) | ExprKind::MemberRef(_) => true,
        ExprKind::Paren(p) => is_poly(&p.inner),
        _ => false,
    }
}

/// Primitive view of a numeric or boolean operand, unboxing if needed.
fn primitive(ty: &JavaType) -> Option<PrimitiveKind> {
    ty.as_primitive().or_else(|| ty.unboxed())
}

/// The type a lambda parameter or result sees for a functional interface
/// type argument.
fn lambda_view(ty: &JavaType) -> JavaType {
    match ty {
        JavaType::Wildcard(Wildcard::Extends(b) | Wildcard::Super(b)) => (**b).clone(),
        JavaType::Wildcard(Wildcard::Unbounded) => JavaType::object(),
        other => other.clone(),
    }
}

impl Attributor<'_> {
    pub(super) fn expr(&mut self, expr: &Arc<Expr>, expected: Option<&JavaType>) -> Arc<Expr> {
        self.operand(expr, expected).0
    }

    /// Attribute an expression that may name a type (`Math` in `Math.max`).
    pub(super) fn operand(&mut self, expr: &Arc<Expr>, expected: Option<&JavaType>) -> (Arc<Expr>, NameKind) {
        match &expr.kind {
            ExprKind::Ident(ident) => {
                let (ty, kind) = self.resolve_name(&ident.name);
                (typed(expr, expr.kind.clone(), ty), kind)
            }
            ExprKind::FieldAccess(access) => self.field_access(expr, access),
            _ => (self.value(expr, expected), NameKind::Value),
        }
    }

    fn value(&mut self, expr: &Arc<Expr>, expected: Option<&JavaType>) -> Arc<Expr> {
        match &expr.kind {
            ExprKind::Literal(lit) => typed(expr, expr.kind.clone(), lit.value.java_type()),
            ExprKind::Ident(_) | ExprKind::FieldAccess(_) => self.operand(expr, expected).0,
            ExprKind::MethodCall(call) => self.method_call(expr, call),
            ExprKind::NewClass(new) => self.new_class(expr, new, expected),
            ExprKind::NewArray(new) => self.new_array(expr, new),
            ExprKind::ArrayInit(elems) => {
                let component = match expected {
                    Some(JavaType::Array(c)) => Some((**c).clone()),
                    _ => None,
                };
                let elems = map_container(elems, |e| self.expr(e, component.as_ref()));
                let ty = expected.filter(|t| matches!(t, JavaType::Array(_))).cloned().unwrap_or(JavaType::Unknown);
                typed(expr, ExprKind::ArrayInit(elems), ty)
            }
            ExprKind::Binary(bin) => {
                let left = self.expr(&bin.left, None);
                let right = self.expr(&bin.right, None);
                let ty = self.binary_type(bin.op, &left.java_type(), &right.java_type());
                let kind = ExprKind::Binary(Binary {
                    left,
                    right,
                    ..bin.clone()
                });
                typed(expr, kind, ty)
            }
            ExprKind::Unary(un) => {
                let operand = self.expr(&un.operand, None);
                let operand_ty = operand.java_type();
                let ty = match un.op {
                    UnaryOp::LogicalNot => BOOLEAN,
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitwiseNot => primitive(&operand_ty)
                        .and_then(unary_promotion)
                        .map(JavaType::Primitive)
                        .unwrap_or(JavaType::Unknown),
                    UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => operand_ty,
                };
                typed(expr, ExprKind::Unary(Unary { operand, ..un.clone() }), ty)
            }
            ExprKind::Assign(assign) => {
                let target = self.expr(&assign.target, None);
                let ty = target.java_type();
                let value = self.expr(&assign.value, Some(&ty));
                let kind = ExprKind::Assign(Assign {
                    target,
                    value,
                    ..assign.clone()
                });
                typed(expr, kind, ty)
            }
            ExprKind::Ternary(ternary) => {
                let cond = self.expr(&ternary.cond, Some(&BOOLEAN));
                let then_expr = self.expr(&ternary.then_expr, expected);
                let else_expr = self.expr(&ternary.else_expr, expected);
                let ty = self.conditional_type(&then_expr.java_type(), &else_expr.java_type());
                let kind = ExprKind::Ternary(Ternary {
                    cond,
                    then_expr,
                    else_expr,
                    ..ternary.clone()
                });
                typed(expr, kind, ty)
            }
            ExprKind::Paren(paren) => {
                let inner = self.expr(&paren.inner, expected);
                let ty = inner.java_type();
                typed(expr, ExprKind::Paren(Paren { inner, ..paren.clone() }), ty)
            }
            ExprKind::Cast(cast) => {
                let clazz = self.attribute_type(&cast.clazz);
                let ty = clazz.ty.clone().unwrap_or(JavaType::Unknown);
                let inner = self.expr(&cast.expr, Some(&ty));
                let kind = ExprKind::Cast(Cast {
                    clazz,
                    expr: inner,
                    ..cast.clone()
                });
                typed(expr, kind, ty)
            }
            ExprKind::InstanceOf(test) => {
                let inner = self.expr(&test.expr, None);
                let clazz = self.attribute_type(&test.clazz);
                let kind = ExprKind::InstanceOf(InstanceOf {
                    expr: inner,
                    clazz,
                    ..test.clone()
                });
                typed(expr, kind, BOOLEAN)
            }
            ExprKind::ArrayAccess(access) => {
                let array = self.expr(&access.array, None);
                let index = self.expr(&access.index, Some(&JavaType::Primitive(PrimitiveKind::Int)));
                let ty = match array.java_type() {
                    JavaType::Array(component) => *component,
                    _ => JavaType::Unknown,
                };
                let kind = ExprKind::ArrayAccess(ArrayAccess {
                    array,
                    index,
                    ..access.clone()
                });
                typed(expr, kind, ty)
            }
            ExprKind::Lambda(lambda) => self.lambda(expr, lambda, expected),
            ExprKind::MemberRef(member_ref) => {
                let (target, _) = self.operand(&member_ref.target, None);
                let ty = expected
                    .filter(|t| self.functional_signature(t).is_some())
                    .cloned()
                    .unwrap_or(JavaType::Unknown);
                let kind = ExprKind::MemberRef(MemberRef {
                    target,
                    ..member_ref.clone()
                });
                typed(expr, kind, ty)
            }
        }
    }

    /// Resolve a simple name: `this`/`super`, locals, fields of enclosing
    /// classes, statically imported fields, then type names.
    fn resolve_name(&self, name: &str) -> (JavaType, NameKind) {
        match name {
            "this" => {
                let ty = self
                    .scope
                    .enclosing_class()
                    .filter(|c| !c.is_static)
                    .map(|c| JavaType::Class(c.ty.clone()));
                return (ty.unwrap_or(JavaType::Unknown), NameKind::Value);
            }
            "super" => {
                let ty = self
                    .scope
                    .enclosing_class()
                    .and_then(|c| self.table.get(&c.ty.fqn))
                    .and_then(|info| info.superclass.clone());
                return (ty.unwrap_or(JavaType::Unknown), NameKind::Value);
            }
            _ => {}
        }
        if let Some(ty) = self.scope.lookup(name) {
            return (ty.clone(), NameKind::Value);
        }
        if let Some(field) = self.field_in_scope(name) {
            return (upper_bound(&field.ty), NameKind::Value);
        }
        match self.resolver().resolve_class_name(name) {
            Some(fqn) => (JavaType::class(fqn), NameKind::Type),
            None => (JavaType::Unknown, NameKind::Unresolved),
        }
    }

    fn field_in_scope(&self, name: &str) -> Option<MemberField> {
        self.scope
            .enclosing_classes()
            .find_map(|c| self.table.lookup_field(&JavaType::Class(c.ty.clone()), name))
            .or_else(|| {
                self.imports.static_sources(name).find_map(|class| {
                    self.table
                        .lookup_field(&JavaType::class(class), name)
                        .filter(|f| f.field.is_static)
                })
            })
    }

    fn field_access(&mut self, expr: &Arc<Expr>, access: &FieldAccess) -> (Arc<Expr>, NameKind) {
        let (target, target_kind) = self.operand(&access.target, None);
        let name = access.name.as_str();
        let (ty, name_kind) = match target_kind {
            // `java.util.List`: a package prefix followed by a class name.
            NameKind::Unresolved => match expr.qualified_name().and_then(|q| self.resolver().resolve_class_name(&q)) {
                Some(fqn) => (JavaType::class(fqn), NameKind::Type),
                None => (JavaType::Unknown, NameKind::Unresolved),
            },
            NameKind::Type => {
                let owner = target.java_type();
                let nested = owner
                    .as_class()
                    .map(|c| format!("{}.{name}", c.fqn))
                    .filter(|fqn| self.table.contains(fqn));
                match self.table.lookup_field(&owner, name).filter(|f| f.field.is_static) {
                    Some(field) => (upper_bound(&field.ty), NameKind::Value),
                    None => match nested {
                        Some(fqn) => (JavaType::class(fqn), NameKind::Type),
                        None => (JavaType::Unknown, NameKind::Value),
                    },
                }
            }
            NameKind::Value => {
                let owner = self.scope.upper_bound(&target.java_type());
                let ty = match owner {
                    JavaType::Array(_) if name == "length" => JavaType::Primitive(PrimitiveKind::Int),
                    owner => self
                        .table
                        .lookup_field(&owner, name)
                        .map(|f| upper_bound(&f.ty))
                        .unwrap_or(JavaType::Unknown),
                };
                (ty, NameKind::Value)
            }
        };
        let kind = ExprKind::FieldAccess(FieldAccess {
            target,
            ..access.clone()
        });
        (typed(expr, kind, ty), name_kind)
    }

    fn new_array(&mut self, expr: &Arc<Expr>, new: &NewArray) -> Arc<Expr> {
        let elem = self.attribute_type(&new.elem);
        let int = JavaType::Primitive(PrimitiveKind::Int);
        let dims: Vec<ArrayDim> = new
            .dims
            .iter()
            .map(|d| ArrayDim {
                size: d.size.as_ref().map(|s| self.expr(s, Some(&int))),
                ..d.clone()
            })
            .collect();
        let ty = match elem.ty.clone() {
            Some(mut ty) => {
                for _ in &dims {
                    ty = JavaType::array(ty);
                }
                ty
            }
            None => JavaType::Unknown,
        };
        let init = new.init.as_ref().map(|i| self.expr(i, Some(&ty)));
        typed(expr, ExprKind::NewArray(NewArray { elem, dims, init }), ty)
    }

    fn lambda(&mut self, expr: &Arc<Expr>, lambda: &Lambda, expected: Option<&JavaType>) -> Arc<Expr> {
        let signature = expected.and_then(|t| self.functional_signature(t));
        let (params, result) = match &signature {
            Some((params, result)) => (params.as_slice(), result.clone()),
            None => (&[][..], JavaType::Unknown),
        };

        self.scope.push_frame();
        let params = self.params(&lambda.params, params);
        let body = match &lambda.body {
            LambdaBody::Expr(e) => {
                let expected = Some(&result).filter(|r| !r.is_void() && !r.is_unknown());
                LambdaBody::Expr(self.expr(e, expected))
            }
            LambdaBody::Block(block) => {
                self.returns.push(result);
                let block = self.stmt(block);
                self.returns.pop();
                LambdaBody::Block(block)
            }
        };
        self.scope.pop_frame();

        let ty = match signature {
            Some(_) => expected.cloned().unwrap_or(JavaType::Unknown),
            None => JavaType::Unknown,
        };
        let kind = ExprKind::Lambda(Lambda {
            params,
            body,
            ..lambda.clone()
        });
        typed(expr, kind, ty)
    }

    /// Parameter and result types of the single abstract method of a
    /// functional interface type.
    pub(super) fn functional_signature(&self, ty: &JavaType) -> Option<(Vec<JavaType>, JavaType)> {
        let class = match self.scope.upper_bound(ty) {
            JavaType::Class(class) => class,
            _ => return None,
        };
        let info = self.table.get(&class.fqn).filter(|info| info.is_interface())?;
        let mut abstract_methods = info.methods.iter().filter(|m| m.is_abstract());
        match (abstract_methods.next(), abstract_methods.next()) {
            (Some(sig), None) => {
                let subst = class_subst(info, &class.args);
                let params = sig.params.iter().map(|p| lambda_view(&substitute(p, &subst))).collect();
                Some((params, lambda_view(&substitute(&sig.return_type, &subst))))
            }
            (None, _) => self
                .table
                .direct_supertypes(&class)
                .into_iter()
                .filter(|s| s.fqn != OBJECT)
                .find_map(|s| self.functional_signature(&JavaType::Class(s))),
            _ => None,
        }
    }

    fn binary_type(&self, op: BinaryOp, left: &JavaType, right: &JavaType) -> JavaType {
        if op.is_logical() || op.is_comparison() {
            return BOOLEAN;
        }
        if op == BinaryOp::Add && (left.is_class(STRING) || right.is_class(STRING)) {
            return JavaType::string();
        }
        let (Some(l), Some(r)) = (primitive(left), primitive(right)) else {
            return JavaType::Unknown;
        };
        let promoted = match op {
            BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::BitwiseXor
                if l == PrimitiveKind::Boolean && r == PrimitiveKind::Boolean =>
            {
                Some(PrimitiveKind::Boolean)
            }
            _ if op.is_shift() => unary_promotion(l).filter(|_| r.is_integral()),
            _ => binary_promotion(l, r),
        };
        promoted.map(JavaType::Primitive).unwrap_or(JavaType::Unknown)
    }

    /// Type of `c ? a : b`.
    fn conditional_type(&self, a: &JavaType, b: &JavaType) -> JavaType {
        if a == b {
            return a.clone();
        }
        match (a, b) {
            (JavaType::Unknown, _) | (_, JavaType::Unknown) => JavaType::Unknown,
            (JavaType::Null, other) | (other, JavaType::Null) => other.boxed(),
            _ => {
                if let (Some(x), Some(y)) = (primitive(a), primitive(b))
                    && let Some(p) = binary_promotion(x, y)
                {
                    return JavaType::Primitive(p);
                }
                let (a, b) = (a.boxed(), b.boxed());
                let params = self.type_params();
                if self.table.is_subtype_in(&a, &b, &params) {
                    b
                } else if self.table.is_subtype_in(&b, &a, &params) {
                    a
                } else {
                    JavaType::object()
                }
            }
        }
    }
}
