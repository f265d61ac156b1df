//! Expression AST nodes.
//!
//! The parser uses Pratt parsing with the following precedence levels:
//! 1. Assignment (=, +=, ...) - right associative
//! 2. Ternary (?:) - right associative
//! 3. Logical OR (||)
//! 4. Logical AND (&&)
//! 5. Bitwise OR (|)
//! 6. Bitwise XOR (^)
//! 7. Bitwise AND (&)
//! 8. Equality (==, !=)
//! 9. Relational (<, <=, >, >=, instanceof)
//! 10. Shift (<<, >>, >>>)
//! 11. Additive (+, -)
//! 12. Multiplicative (*, /, %)
//! 13. Prefix unary and casts
//! 14. Postfix (call, index, member, ++, --, ::)
//!
//! Every node owns the whitespace before its first token (`prefix`). When a
//! node starts with a child (`a + b`, `sb.append(x)`), the child's prefix is
//! empty and the whitespace lives on the outer node.

use std::sync::Arc;

use jtemplate_core::{JavaType, MethodType, PrimitiveKind};
use ordered_float::OrderedFloat;

use super::node::{Container, Name, NodeId, Padded, Space};
use super::ops::{AssignOp, BinaryOp, UnaryOp};
use super::stmt::Stmt;
use super::types::TypeTree;

/// An expression.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub prefix: Space,
    pub kind: ExprKind,
    /// Static type, filled in by attribution.
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    /// A simple name, including `this` and `super`.
    Ident(Ident),
    FieldAccess(FieldAccess),
    MethodCall(MethodCall),
    NewClass(NewClass),
    NewArray(NewArray),
    /// `{a, b}` in an initializer.
    ArrayInit(Container<Arc<Expr>>),
    Binary(Binary),
    Unary(Unary),
    Assign(Assign),
    Ternary(Ternary),
    Paren(Paren),
    Cast(Cast),
    InstanceOf(InstanceOf),
    ArrayAccess(ArrayAccess),
    Lambda(Lambda),
    MemberRef(MemberRef),
}

/// A literal with its exact source text.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    /// Source spelling (`2L`, `0x1F`, `'c'`), printed verbatim.
    pub source: String,
}

/// The value of a literal. Kinds are distinct: `1` and `1L` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Int(i64),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Char(char),
    String(String),
    Bool(bool),
    Null,
}

impl LiteralValue {
    /// The static type of a literal of this kind.
    pub fn java_type(&self) -> JavaType {
        match self {
            LiteralValue::Int(_) => JavaType::Primitive(PrimitiveKind::Int),
            LiteralValue::Long(_) => JavaType::Primitive(PrimitiveKind::Long),
            LiteralValue::Float(_) => JavaType::Primitive(PrimitiveKind::Float),
            LiteralValue::Double(_) => JavaType::Primitive(PrimitiveKind::Double),
            LiteralValue::Char(_) => JavaType::Primitive(PrimitiveKind::Char),
            LiteralValue::String(_) => JavaType::string(),
            LiteralValue::Bool(_) => JavaType::Primitive(PrimitiveKind::Boolean),
            LiteralValue::Null => JavaType::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
}

/// `target.name`
#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub target: Arc<Expr>,
    /// Whitespace before `.`.
    pub dot: Space,
    pub name: Name,
}

/// `select.name(args)` or `name(args)`
#[derive(Debug, Clone)]
pub struct MethodCall {
    /// The receiver; `after` is the whitespace before `.`.
    pub select: Option<Padded<Arc<Expr>>>,
    pub name: Name,
    pub args: Container<Arc<Expr>>,
    /// The resolved overload, when attribution found exactly one.
    pub method_type: Option<MethodType>,
}

/// `new T(args) { body }`
#[derive(Debug, Clone)]
pub struct NewClass {
    pub clazz: Arc<TypeTree>,
    pub args: Container<Arc<Expr>>,
    /// Anonymous class body (a block of members).
    pub body: Option<Arc<Stmt>>,
    pub constructor_type: Option<MethodType>,
}

/// `new int[n]`, `new String[] {a, b}`
#[derive(Debug, Clone)]
pub struct NewArray {
    pub elem: Arc<TypeTree>,
    pub dims: Vec<ArrayDim>,
    /// An [`ExprKind::ArrayInit`].
    pub init: Option<Arc<Expr>>,
}

#[derive(Debug, Clone)]
pub struct ArrayDim {
    /// Whitespace before `[`.
    pub open: Space,
    pub size: Option<Arc<Expr>>,
    /// Whitespace before `]`.
    pub close: Space,
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub left: Arc<Expr>,
    /// Whitespace before the operator.
    pub op_prefix: Space,
    pub op: BinaryOp,
    pub right: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: UnaryOp,
    /// Whitespace before a postfix operator; empty for prefix operators,
    /// whose whitespace is the expression prefix.
    pub op_prefix: Space,
    pub operand: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub target: Arc<Expr>,
    pub op_prefix: Space,
    pub op: AssignOp,
    pub value: Arc<Expr>,
}

/// `cond ? then_expr : else_expr`
#[derive(Debug, Clone)]
pub struct Ternary {
    pub cond: Arc<Expr>,
    pub question: Space,
    pub then_expr: Arc<Expr>,
    pub colon: Space,
    pub else_expr: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct Paren {
    pub inner: Arc<Expr>,
    /// Whitespace before `)`.
    pub close: Space,
}

/// `(T) expr`
#[derive(Debug, Clone)]
pub struct Cast {
    pub clazz: Arc<TypeTree>,
    pub close: Space,
    pub expr: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct InstanceOf {
    pub expr: Arc<Expr>,
    /// Whitespace before `instanceof`.
    pub keyword: Space,
    pub clazz: Arc<TypeTree>,
}

/// `array[index]`
#[derive(Debug, Clone)]
pub struct ArrayAccess {
    pub array: Arc<Expr>,
    pub open: Space,
    pub index: Arc<Expr>,
    pub close: Space,
}

/// `x -> body`, `(a, b) -> body`, `(int a) -> { ... }`
#[derive(Debug, Clone)]
pub struct Lambda {
    /// Whether the parameters are written in parentheses.
    pub parenthesized: bool,
    /// Parameter declarations ([`StmtKind::Variables`](super::StmtKind::Variables)
    /// without a type when inferred).
    pub params: Container<Arc<Stmt>>,
    /// Whitespace before `->`.
    pub arrow: Space,
    pub body: LambdaBody,
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Arc<Expr>),
    Block(Arc<Stmt>),
}

/// `target::name`
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub target: Arc<Expr>,
    pub colons: Space,
    pub name: Name,
}

impl Expr {
    pub fn new(prefix: Space, kind: ExprKind) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            kind,
            ty: None,
        }
    }

    /// A copy of this node with a different prefix (same id).
    pub fn with_prefix(&self, prefix: Space) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    /// A copy of this node with a fresh id.
    pub fn with_fresh_id(&self) -> Self {
        Self {
            id: NodeId::next(),
            ..self.clone()
        }
    }

    /// Static type, or [`JavaType::Unknown`] before attribution.
    pub fn java_type(&self) -> JavaType {
        self.ty.clone().unwrap_or(JavaType::Unknown)
    }

    /// The simple name if this is an identifier.
    pub fn ident_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(i) => Some(&i.name),
            _ => None,
        }
    }

    pub fn as_method_call(&self) -> Option<&MethodCall> {
        match &self.kind {
            ExprKind::MethodCall(m) => Some(m),
            _ => None,
        }
    }

    /// Dotted form of a name expression (`a`, `a.b.c`), if it is one.
    pub fn qualified_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(i) => Some(i.name.clone()),
            ExprKind::FieldAccess(f) => {
                let target = f.target.qualified_name()?;
                Some(format!("{}.{}", target, f.name.text))
            }
            _ => None,
        }
    }

    /// Short description of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "literal",
            ExprKind::Ident(_) => "identifier",
            ExprKind::FieldAccess(_) => "field access",
            ExprKind::MethodCall(_) => "method invocation",
            ExprKind::NewClass(_) => "new class",
            ExprKind::NewArray(_) => "new array",
            ExprKind::ArrayInit(_) => "array initializer",
            ExprKind::Binary(_) => "binary",
            ExprKind::Unary(_) => "unary",
            ExprKind::Assign(_) => "assignment",
            ExprKind::Ternary(_) => "ternary",
            ExprKind::Paren(_) => "parentheses",
            ExprKind::Cast(_) => "type cast",
            ExprKind::InstanceOf(_) => "instanceof",
            ExprKind::ArrayAccess(_) => "array access",
            ExprKind::Lambda(_) => "lambda",
            ExprKind::MemberRef(_) => "member reference",
        }
    }
}
