//! Statement AST nodes.
//!
//! Class members are statements too: a class body is a [`Block`] whose
//! statements are fields ([`StmtKind::Variables`]), methods, nested classes
//! and initializer blocks.

use std::sync::Arc;

use jtemplate_core::JavaType;

use super::decl::{ClassDecl, MethodDecl, Modifier};
use super::expr::Expr;
use super::node::{Container, Name, NodeId, Padded, Space};
use super::types::TypeTree;

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub prefix: Space,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Block),
    /// Local variables, fields and parameters.
    Variables(VarDecls),
    Expr(ExprStmt),
    If(If),
    While(While),
    DoWhile(DoWhile),
    For(ForLoop),
    ForEach(ForEach),
    Return(Return),
    Throw(Throw),
    Assert(Assert),
    Break(Jump),
    Continue(Jump),
    /// A lone `;`.
    Empty,
    Method(MethodDecl),
    Class(ClassDecl),
}

/// `{ stmts }`, `static { stmts }`
#[derive(Debug, Clone)]
pub struct Block {
    /// Whitespace before `{` when the block is a `static` initializer.
    pub static_init: Option<Space>,
    pub stmts: Vec<Arc<Stmt>>,
    /// Whitespace before `}`.
    pub end: Space,
}

/// `final int a = 1, b[];`
#[derive(Debug, Clone)]
pub struct VarDecls {
    pub modifiers: Vec<Modifier>,
    /// `None` for inferred lambda parameters.
    pub type_tree: Option<Arc<TypeTree>>,
    /// Whitespace before `...` for variable-arity parameters.
    pub varargs: Option<Space>,
    /// Declarators; `after` is the whitespace before each `,`.
    pub vars: Vec<Padded<VarDeclarator>>,
    /// Whitespace before `;`; `None` for parameters and loop variables.
    pub semi: Option<Space>,
}

#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub id: NodeId,
    pub name: Name,
    /// Extra `[]` after the name: `(before '[', before ']')`.
    pub dims: Vec<(Space, Space)>,
    pub init: Option<VarInit>,
    /// Declared type, filled in by attribution.
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub struct VarInit {
    /// Whitespace before `=`.
    pub eq: Space,
    pub value: Arc<Expr>,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Arc<Expr>,
    pub semi: Space,
}

/// `( expr )` after `if`/`while`.
#[derive(Debug, Clone)]
pub struct ParenCond {
    /// Whitespace before `(`.
    pub open: Space,
    pub expr: Arc<Expr>,
    /// Whitespace before `)`.
    pub close: Space,
}

#[derive(Debug, Clone)]
pub struct If {
    pub cond: ParenCond,
    pub then_stmt: Arc<Stmt>,
    pub else_branch: Option<Else>,
}

#[derive(Debug, Clone)]
pub struct Else {
    /// Whitespace before `else`.
    pub keyword: Space,
    pub stmt: Arc<Stmt>,
}

#[derive(Debug, Clone)]
pub struct While {
    pub cond: ParenCond,
    pub body: Arc<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DoWhile {
    pub body: Arc<Stmt>,
    /// Whitespace before `while`.
    pub while_kw: Space,
    pub cond: ParenCond,
    pub semi: Space,
}

/// `for (init; cond; update) body`
#[derive(Debug, Clone)]
pub struct ForLoop {
    /// Whitespace before `(`.
    pub open: Space,
    /// Variables, an expression statement, or [`StmtKind::Empty`]; prints
    /// its own `;`.
    pub init: Arc<Stmt>,
    pub cond: Option<Arc<Expr>>,
    /// Whitespace before the second `;`.
    pub cond_semi: Space,
    /// Update expressions; `close` is the whitespace before `)`.
    pub update: Container<Arc<Expr>>,
    pub body: Arc<Stmt>,
}

/// `for (T x : iterable) body`
#[derive(Debug, Clone)]
pub struct ForEach {
    pub open: Space,
    pub var: Arc<Stmt>,
    pub colon: Space,
    pub iterable: Arc<Expr>,
    pub close: Space,
    pub body: Arc<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub expr: Option<Arc<Expr>>,
    pub semi: Space,
}

#[derive(Debug, Clone)]
pub struct Throw {
    pub expr: Arc<Expr>,
    pub semi: Space,
}

/// `assert cond : detail;`
#[derive(Debug, Clone)]
pub struct Assert {
    pub cond: Arc<Expr>,
    pub detail: Option<(Space, Arc<Expr>)>,
    pub semi: Space,
}

/// `break label;`, `continue;`
#[derive(Debug, Clone)]
pub struct Jump {
    pub label: Option<Name>,
    pub semi: Space,
}

impl Stmt {
    pub fn new(prefix: Space, kind: StmtKind) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            kind,
        }
    }

    pub fn with_prefix(&self, prefix: Space) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.kind {
            StmtKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDecl> {
        match &self.kind {
            StmtKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            StmtKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_variables(&self) -> Option<&VarDecls> {
        match &self.kind {
            StmtKind::Variables(v) => Some(v),
            _ => None,
        }
    }

    /// Short description of the node kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Block(_) => "block",
            StmtKind::Variables(_) => "variable declarations",
            StmtKind::Expr(_) => "expression statement",
            StmtKind::If(_) => "if",
            StmtKind::While(_) => "while",
            StmtKind::DoWhile(_) => "do-while",
            StmtKind::For(_) => "for",
            StmtKind::ForEach(_) => "for-each",
            StmtKind::Return(_) => "return",
            StmtKind::Throw(_) => "throw",
            StmtKind::Assert(_) => "assert",
            StmtKind::Break(_) => "break",
            StmtKind::Continue(_) => "continue",
            StmtKind::Empty => "empty statement",
            StmtKind::Method(_) => "method declaration",
            StmtKind::Class(_) => "class declaration",
        }
    }
}

impl VarDecls {
    /// Declared variable names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.elem.name.as_str())
    }
}

impl VarDeclarator {
    pub fn new(name: Name) -> Self {
        Self {
            id: NodeId::next(),
            name,
            dims: Vec::new(),
            init: None,
            ty: None,
        }
    }
}

impl Block {
    pub fn new(stmts: Vec<Arc<Stmt>>, end: Space) -> Self {
        Self {
            static_init: None,
            stmts,
            end,
        }
    }
}

/// Parameters of a method or lambda.
pub type Params = Container<Arc<Stmt>>;
