//! Declarations: compilation units, imports, classes, methods, modifiers and
//! annotations.

use std::sync::Arc;

use bitflags::bitflags;
use jtemplate_core::{JavaType, MethodType};

use super::expr::Expr;
use super::node::{Container, Name, NodeId, Padded, Space};
use super::stmt::{Params, Stmt};
use super::types::{TypeParam, TypeTree};

// ============================================================================
// Modifiers and annotations
// ============================================================================

/// A declaration modifier keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKind {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
}

impl ModifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKind::Public => "public",
            ModifierKind::Protected => "protected",
            ModifierKind::Private => "private",
            ModifierKind::Static => "static",
            ModifierKind::Final => "final",
            ModifierKind::Abstract => "abstract",
            ModifierKind::Native => "native",
            ModifierKind::Synchronized => "synchronized",
            ModifierKind::Transient => "transient",
            ModifierKind::Volatile => "volatile",
            ModifierKind::Strictfp => "strictfp",
            ModifierKind::Default => "default",
        }
    }

    fn flag(&self) -> Modifiers {
        match self {
            ModifierKind::Public => Modifiers::PUBLIC,
            ModifierKind::Protected => Modifiers::PROTECTED,
            ModifierKind::Private => Modifiers::PRIVATE,
            ModifierKind::Static => Modifiers::STATIC,
            ModifierKind::Final => Modifiers::FINAL,
            ModifierKind::Abstract => Modifiers::ABSTRACT,
            ModifierKind::Native => Modifiers::NATIVE,
            ModifierKind::Synchronized => Modifiers::SYNCHRONIZED,
            ModifierKind::Transient => Modifiers::TRANSIENT,
            ModifierKind::Volatile => Modifiers::VOLATILE,
            ModifierKind::Strictfp => Modifiers::STRICTFP,
            ModifierKind::Default => Modifiers::DEFAULT,
        }
    }
}

bitflags! {
    /// Set of modifier keywords on a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const NATIVE = 1 << 6;
        const SYNCHRONIZED = 1 << 7;
        const TRANSIENT = 1 << 8;
        const VOLATILE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;
    }
}

/// One item in a modifier list, in source order.
#[derive(Debug, Clone)]
pub enum Modifier {
    Annotation(Arc<Annotation>),
    Keyword(KeywordModifier),
}

#[derive(Debug, Clone)]
pub struct KeywordModifier {
    pub prefix: Space,
    pub kind: ModifierKind,
}

impl Modifier {
    pub fn prefix(&self) -> &Space {
        match self {
            Modifier::Annotation(a) => &a.prefix,
            Modifier::Keyword(k) => &k.prefix,
        }
    }

    pub fn with_prefix(&self, prefix: Space) -> Modifier {
        match self {
            Modifier::Annotation(a) => Modifier::Annotation(Arc::new(a.with_prefix(prefix))),
            Modifier::Keyword(k) => Modifier::Keyword(KeywordModifier { prefix, kind: k.kind }),
        }
    }

    pub fn as_annotation(&self) -> Option<&Arc<Annotation>> {
        match self {
            Modifier::Annotation(a) => Some(a),
            Modifier::Keyword(_) => None,
        }
    }
}

/// Keyword flags of a modifier list.
pub fn modifier_flags(modifiers: &[Modifier]) -> Modifiers {
    modifiers
        .iter()
        .filter_map(|m| match m {
            Modifier::Keyword(k) => Some(k.kind.flag()),
            Modifier::Annotation(_) => None,
        })
        .fold(Modifiers::empty(), |acc, f| acc | f)
}

/// Annotations of a modifier list, in source order.
pub fn annotations(modifiers: &[Modifier]) -> impl Iterator<Item = &Arc<Annotation>> {
    modifiers.iter().filter_map(Modifier::as_annotation)
}

/// `@Name`, `@Name(args)`
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: NodeId,
    /// Whitespace before `@`.
    pub prefix: Space,
    /// Dotted name after `@`.
    pub name: String,
    pub args: Option<Container<Arc<Expr>>>,
    /// The annotation type, filled in by attribution.
    pub ty: Option<JavaType>,
}

impl Annotation {
    pub fn new(prefix: Space, name: impl Into<String>, args: Option<Container<Arc<Expr>>>) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            name: name.into(),
            args,
            ty: None,
        }
    }

    pub fn with_prefix(&self, prefix: Space) -> Self {
        Self {
            prefix,
            ..self.clone()
        }
    }

    /// Unqualified annotation name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

// ============================================================================
// Methods and classes
// ============================================================================

/// A comma or `&` separated list of types after a keyword (`throws A, B`).
#[derive(Debug, Clone)]
pub struct TypeList {
    /// Whitespace before the keyword.
    pub keyword: Space,
    /// `after` is the whitespace before each separator.
    pub types: Vec<Padded<Arc<TypeTree>>>,
}

impl TypeList {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeTree>> {
        self.types.iter().map(|p| &p.elem)
    }
}

/// A method or constructor declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub modifiers: Vec<Modifier>,
    pub type_params: Option<Container<Arc<TypeParam>>>,
    /// `None` for constructors.
    pub return_type: Option<Arc<TypeTree>>,
    pub name: Name,
    pub params: Params,
    pub throws: Option<TypeList>,
    /// A [`StmtKind::Block`](super::StmtKind::Block); `None` for abstract
    /// methods.
    pub body: Option<Arc<Stmt>>,
    /// Whitespace before `;` of a body-less method.
    pub semi: Option<Space>,
    /// Signature, filled in by attribution.
    pub method_type: Option<MethodType>,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn flags(&self) -> Modifiers {
        modifier_flags(&self.modifiers)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
        }
    }
}

/// A class or interface declaration.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub modifiers: Vec<Modifier>,
    /// Whitespace before the `class`/`interface` keyword.
    pub keyword: Space,
    pub kind: ClassKind,
    pub name: Name,
    pub type_params: Option<Container<Arc<TypeParam>>>,
    pub extends: Option<TypeList>,
    pub implements: Option<TypeList>,
    /// The member block.
    pub body: Arc<Stmt>,
    /// The declared type, filled in by attribution.
    pub ty: Option<JavaType>,
}

impl ClassDecl {
    pub fn flags(&self) -> Modifiers {
        modifier_flags(&self.modifiers)
    }

    pub fn members(&self) -> &[Arc<Stmt>] {
        self.body.as_block().map(|b| b.stmts.as_slice()).unwrap_or(&[])
    }
}

// ============================================================================
// Compilation unit
// ============================================================================

/// `package a.b;`
#[derive(Debug, Clone)]
pub struct Package {
    pub prefix: Space,
    pub name: Name,
    pub semi: Space,
}

/// `import a.b.C;`, `import static a.b.C.m;`, `import a.b.*;`
#[derive(Debug, Clone)]
pub struct Import {
    pub id: NodeId,
    pub prefix: Space,
    /// Whitespace before `static`.
    pub is_static: Option<Space>,
    /// Qualified name, possibly ending in `.*`.
    pub name: Name,
    pub semi: Space,
}

impl Import {
    pub fn new(prefix: Space, is_static: bool, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            prefix,
            is_static: is_static.then(Space::single),
            name: Name::new(Space::single(), name),
            semi: Space::empty(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.is_static.is_some()
    }

    pub fn is_on_demand(&self) -> bool {
        self.name.text.ends_with(".*")
    }

    /// The qualified name without a trailing `.*`.
    pub fn qualifier(&self) -> &str {
        self.name.text.strip_suffix(".*").unwrap_or(&self.name.text)
    }

    /// The last segment of a single-type import.
    pub fn simple_name(&self) -> &str {
        self.name.text.rsplit('.').next().unwrap_or(&self.name.text)
    }
}

/// A whole source file.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub id: NodeId,
    pub package: Option<Package>,
    pub imports: Vec<Arc<Import>>,
    /// Top-level [`StmtKind::Class`](super::StmtKind::Class) statements.
    pub types: Vec<Arc<Stmt>>,
    /// Trailing whitespace and comments.
    pub eof: Space,
}

impl CompilationUnit {
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.types.iter().filter_map(|s| s.as_class())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_ignore_annotations() {
        let modifiers = vec![
            Modifier::Annotation(Arc::new(Annotation::new(Space::empty(), "Override", None))),
            Modifier::Keyword(KeywordModifier {
                prefix: Space::single(),
                kind: ModifierKind::Public,
            }),
            Modifier::Keyword(KeywordModifier {
                prefix: Space::single(),
                kind: ModifierKind::Static,
            }),
        ];
        assert_eq!(modifier_flags(&modifiers), Modifiers::PUBLIC | Modifiers::STATIC);
        assert_eq!(annotations(&modifiers).count(), 1);
    }

    #[test]
    fn import_names() {
        let import = Import::new(Space::empty(), false, "java.util.*");
        assert!(import.is_on_demand());
        assert_eq!(import.qualifier(), "java.util");

        let import = Import::new(Space::empty(), true, "java.util.Collections.emptyList");
        assert!(import.is_static());
        assert_eq!(import.simple_name(), "emptyList");
    }

    #[test]
    fn annotation_simple_name() {
        let a = Annotation::new(Space::empty(), "java.lang.Deprecated", None);
        assert_eq!(a.simple_name(), "Deprecated");
    }
}
