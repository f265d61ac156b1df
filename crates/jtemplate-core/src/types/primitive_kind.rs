//! Primitive type kinds for Java's built-in numeric, boolean and void types.

use std::fmt;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    /// All value-carrying primitives (everything except `void`).
    pub const VALUES: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// The keyword spelling of this primitive.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    /// Look up a primitive by its keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(PrimitiveKind::Boolean),
            "byte" => Some(PrimitiveKind::Byte),
            "short" => Some(PrimitiveKind::Short),
            "char" => Some(PrimitiveKind::Char),
            "int" => Some(PrimitiveKind::Int),
            "long" => Some(PrimitiveKind::Long),
            "float" => Some(PrimitiveKind::Float),
            "double" => Some(PrimitiveKind::Double),
            "void" => Some(PrimitiveKind::Void),
            _ => None,
        }
    }

    /// Whether this is a numeric primitive (`char` counts as numeric).
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Void)
    }

    /// Whether this is an integral primitive.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Fully-qualified name of the wrapper class.
    pub const fn boxed(self) -> Option<&'static str> {
        match self {
            PrimitiveKind::Boolean => Some("java.lang.Boolean"),
            PrimitiveKind::Byte => Some("java.lang.Byte"),
            PrimitiveKind::Short => Some("java.lang.Short"),
            PrimitiveKind::Char => Some("java.lang.Character"),
            PrimitiveKind::Int => Some("java.lang.Integer"),
            PrimitiveKind::Long => Some("java.lang.Long"),
            PrimitiveKind::Float => Some("java.lang.Float"),
            PrimitiveKind::Double => Some("java.lang.Double"),
            PrimitiveKind::Void => None,
        }
    }

    /// The primitive a wrapper class unboxes to.
    pub fn unboxed(fqn: &str) -> Option<Self> {
        Self::VALUES.into_iter().find(|p| p.boxed() == Some(fqn))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_round_trip() {
        for p in PrimitiveKind::VALUES {
            assert_eq!(PrimitiveKind::from_keyword(p.name()), Some(p));
        }
        assert_eq!(PrimitiveKind::from_keyword("String"), None);
    }

    #[test]
    fn boxing_pairs() {
        assert_eq!(PrimitiveKind::Int.boxed(), Some("java.lang.Integer"));
        assert_eq!(PrimitiveKind::unboxed("java.lang.Character"), Some(PrimitiveKind::Char));
        assert_eq!(PrimitiveKind::unboxed("java.lang.String"), None);
        assert_eq!(PrimitiveKind::Void.boxed(), None);
    }
}
