//! Type syntax: `int`, `java.util.List<? extends T>`, `String[]`, and type
//! parameter declarations.

use std::sync::Arc;

use jtemplate_core::{JavaType, PrimitiveKind};

use super::node::{Container, NodeId, Padded, Space};

/// A type as written in source.
#[derive(Debug, Clone)]
pub struct TypeTree {
    pub id: NodeId,
    pub prefix: Space,
    pub kind: TypeTreeKind,
    /// The resolved type, filled in by attribution.
    pub ty: Option<JavaType>,
}

#[derive(Debug, Clone)]
pub enum TypeTreeKind {
    Primitive(PrimitiveKind),
    Named(NamedType),
    Array(ArrayType),
    Wildcard(WildcardType),
}

/// A possibly qualified, possibly parameterized class type.
#[derive(Debug, Clone)]
pub struct NamedType {
    /// Dotted name as written (`List`, `java.util.List`, `Map.Entry`).
    pub name: String,
    /// Type arguments; `Some` with no elements is the diamond `<>`.
    pub args: Option<Container<Arc<TypeTree>>>,
}

/// `elem[]`
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub elem: Arc<TypeTree>,
    /// Whitespace before `[`.
    pub open: Space,
    /// Whitespace before `]`.
    pub close: Space,
}

/// `?`, `? extends T`, `? super T`
#[derive(Debug, Clone)]
pub struct WildcardType {
    pub bound: Option<WildcardBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

impl BoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundKind::Extends => "extends",
            BoundKind::Super => "super",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WildcardBound {
    pub kind: BoundKind,
    /// Whitespace before the `extends`/`super` keyword.
    pub keyword: Space,
    pub bound: Arc<TypeTree>,
}

impl TypeTree {
    pub fn new(prefix: Space, kind: TypeTreeKind) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            kind,
            ty: None,
        }
    }

    /// A named type without arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(
            Space::empty(),
            TypeTreeKind::Named(NamedType {
                name: name.into(),
                args: None,
            }),
        )
    }

    pub fn with_prefix(&self, prefix: Space) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    /// The written name for named types.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TypeTreeKind::Named(n) => Some(&n.name),
            _ => None,
        }
    }

    /// Whether this is an unqualified, unparameterized name.
    pub fn is_simple_name(&self) -> bool {
        matches!(&self.kind, TypeTreeKind::Named(n) if n.args.is_none() && !n.name.contains('.'))
    }
}

/// A type parameter declaration: `T`, `T extends Comparable<? super T>`,
/// `T extends A & B`.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub id: NodeId,
    pub prefix: Space,
    pub name: String,
    pub bounds: Option<TypeBounds>,
}

#[derive(Debug, Clone)]
pub struct TypeBounds {
    /// Whitespace before `extends`.
    pub keyword: Space,
    /// Bounds separated by `&`; `after` is the whitespace before each `&`.
    pub types: Vec<Padded<Arc<TypeTree>>>,
}

impl TypeParam {
    pub fn new(prefix: Space, name: impl Into<String>, bounds: Option<TypeBounds>) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            name: name.into(),
            bounds,
        }
    }

    pub fn bound_types(&self) -> impl Iterator<Item = &Arc<TypeTree>> {
        self.bounds.iter().flat_map(|b| b.types.iter().map(|p| &p.elem))
    }
}
