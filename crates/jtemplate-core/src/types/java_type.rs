//! Static Java types attached to attributed syntax trees.

use std::fmt;

use super::PrimitiveKind;

/// Fully-qualified name of `java.lang.Object`.
pub const OBJECT: &str = "java.lang.Object";
/// Fully-qualified name of `java.lang.String`.
pub const STRING: &str = "java.lang.String";

/// A static type.
///
/// Type variables are referenced by name only; their bounds live in the
/// declaring scope ([`TypeParamDecl`]), which keeps recursive bounds such as
/// `T extends Comparable<? super T>` finite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JavaType {
    /// `int`, `boolean`, `void`, ...
    Primitive(PrimitiveKind),
    /// A class or interface, possibly parameterized.
    Class(ClassType),
    /// An array of the element type.
    Array(Box<JavaType>),
    /// A reference to a type variable in scope.
    TypeVar(String),
    /// A wildcard type argument.
    Wildcard(Wildcard),
    /// The type of the `null` literal.
    Null,
    /// Attribution could not determine a type.
    Unknown,
}

/// A class type: fully-qualified name plus type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub fqn: String,
    pub args: Vec<JavaType>,
}

/// A wildcard type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wildcard {
    /// `?`
    Unbounded,
    /// `? extends T`
    Extends(Box<JavaType>),
    /// `? super T`
    Super(Box<JavaType>),
}

/// A declared type variable with its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParamDecl {
    pub name: String,
    /// Upper bounds; empty means `Object`.
    pub bounds: Vec<JavaType>,
}

impl TypeParamDecl {
    pub fn new(name: impl Into<String>, bounds: Vec<JavaType>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

impl JavaType {
    /// `java.lang.Object`
    pub fn object() -> Self {
        Self::class(OBJECT)
    }

    /// `java.lang.String`
    pub fn string() -> Self {
        Self::class(STRING)
    }

    /// A raw or non-generic class type.
    pub fn class(fqn: impl Into<String>) -> Self {
        JavaType::Class(ClassType {
            fqn: fqn.into(),
            args: Vec::new(),
        })
    }

    /// A parameterized class type.
    pub fn generic(fqn: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Class(ClassType {
            fqn: fqn.into(),
            args,
        })
    }

    /// An array of `elem`.
    pub fn array(elem: JavaType) -> Self {
        JavaType::Array(Box::new(elem))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(p) if *p != PrimitiveKind::Void)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveKind::Void))
    }

    /// Class, array, type variable and null types.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            JavaType::Class(_) | JavaType::Array(_) | JavaType::TypeVar(_) | JavaType::Null
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, JavaType::Unknown)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            JavaType::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            JavaType::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this is the class type `fqn` (ignoring arguments).
    pub fn is_class(&self, fqn: &str) -> bool {
        matches!(self, JavaType::Class(c) if c.fqn == fqn)
    }

    /// The primitive this type unboxes to, for wrapper classes.
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        match self {
            JavaType::Class(c) => PrimitiveKind::unboxed(&c.fqn),
            _ => None,
        }
    }

    /// The wrapper type of a primitive, or the type itself.
    pub fn boxed(&self) -> JavaType {
        match self {
            JavaType::Primitive(p) => p.boxed().map(JavaType::class).unwrap_or(JavaType::Unknown),
            other => other.clone(),
        }
    }

    /// Whether the named type variable occurs anywhere in this type.
    pub fn mentions_type_var(&self, name: &str) -> bool {
        match self {
            JavaType::TypeVar(v) => v == name,
            JavaType::Class(c) => c.args.iter().any(|a| a.mentions_type_var(name)),
            JavaType::Array(e) => e.mentions_type_var(name),
            JavaType::Wildcard(Wildcard::Extends(b)) | JavaType::Wildcard(Wildcard::Super(b)) => {
                b.mentions_type_var(name)
            }
            _ => false,
        }
    }

    /// Simple (unqualified) name for class types.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            JavaType::Class(c) => Some(c.fqn.rsplit(['.', '$']).next().unwrap_or(c.fqn.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => write!(f, "{p}"),
            JavaType::Class(c) => write!(f, "{c}"),
            JavaType::Array(e) => write!(f, "{e}[]"),
            JavaType::TypeVar(name) => write!(f, "{name}"),
            JavaType::Wildcard(w) => write!(f, "{w}"),
            JavaType::Null => write!(f, "null"),
            JavaType::Unknown => write!(f, "<unknown>"),
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for Wildcard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wildcard::Unbounded => write!(f, "?"),
            Wildcard::Extends(b) => write!(f, "? extends {b}"),
            Wildcard::Super(b) => write!(f, "? super {b}"),
        }
    }
}

/// The resolved target of a method invocation or constructor call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    /// Fully-qualified name of the declaring class.
    pub declaring: String,
    /// Method name; `<init>` for constructors.
    pub name: String,
    /// Parameter types exactly as declared (type variables unsubstituted).
    pub params: Vec<JavaType>,
    /// Return type after substituting inferred type arguments.
    pub return_type: JavaType,
    /// Inferred method type arguments, in declaration order.
    pub type_args: Vec<JavaType>,
    pub is_static: bool,
    pub is_varargs: bool,
}

impl MethodType {
    /// Constructor name used for `new` expressions.
    pub const CONSTRUCTOR: &'static str = "<init>";

    /// Whether two resolved methods denote the same declaration.
    pub fn same_signature(&self, other: &MethodType) -> bool {
        self.declaring == other.declaring && self.name == other.name && self.params == other.params
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_generic_types() {
        let list = JavaType::generic(
            "java.util.List",
            vec![JavaType::Wildcard(Wildcard::Extends(Box::new(JavaType::TypeVar(
                "T".into(),
            ))))],
        );
        assert_eq!(list.to_string(), "java.util.List<? extends T>");
        assert_eq!(
            JavaType::array(JavaType::Primitive(PrimitiveKind::Int)).to_string(),
            "int[]"
        );
    }

    #[test]
    fn type_var_mentions() {
        let cmp = JavaType::generic(
            "java.lang.Comparable",
            vec![JavaType::Wildcard(Wildcard::Super(Box::new(JavaType::TypeVar("T".into()))))],
        );
        assert!(cmp.mentions_type_var("T"));
        assert!(!cmp.mentions_type_var("U"));
    }

    #[test]
    fn boxing_helpers() {
        let int = JavaType::Primitive(PrimitiveKind::Int);
        assert_eq!(int.boxed(), JavaType::class("java.lang.Integer"));
        assert_eq!(JavaType::class("java.lang.Long").unboxed(), Some(PrimitiveKind::Long));
        assert_eq!(JavaType::string().simple_name(), Some("String"));
    }

    #[test]
    fn signature_identity_ignores_return_substitution() {
        let a = MethodType {
            declaring: "java.util.List".into(),
            name: "get".into(),
            params: vec![JavaType::Primitive(PrimitiveKind::Int)],
            return_type: JavaType::string(),
            type_args: vec![],
            is_static: false,
            is_varargs: false,
        };
        let b = MethodType {
            return_type: JavaType::object(),
            ..a.clone()
        };
        assert!(a.same_signature(&b));
    }
}
