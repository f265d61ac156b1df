//! Method-invocation conversions.
//!
//! Used both to type-check call arguments during attribution and to decide
//! whether a candidate expression fits a typed template hole. Conversions are
//! tried in this order:
//!
//! 1. Identity
//! 2. Widening primitive (`int -> long`, `char -> int`, `float -> double`)
//! 3. Widening reference (subclass to superclass or interface, `null` to any
//!    reference type, wildcard containment for type arguments)
//! 4. Boxing, then widening reference (`int -> Integer -> Number`)
//! 5. Unboxing, then widening primitive (`Integer -> long`)
//!
//! Narrowing conversions are never implicit. A type attribution could not
//! determine ([`JavaType::Unknown`]) converts to nothing.

mod primitive;
mod reference;

pub use primitive::{binary_promotion, find_primitive_conversion, unary_promotion, widens};
pub use reference::{find_boxing_conversion, find_reference_conversion, find_unboxing_conversion};

use jtemplate_core::{JavaType, PrimitiveKind, TypeParamDecl};
use jtemplate_registry::TypeTable;

/// A conversion with its cost for overload ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub kind: ConversionKind,
    /// Lower is better.
    pub cost: u32,
    pub is_implicit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    Identity,
    WideningPrimitive {
        from: PrimitiveKind,
        to: PrimitiveKind,
    },
    WideningReference,
    NullToReference,
    Boxing {
        from: PrimitiveKind,
    },
    Unboxing {
        to: PrimitiveKind,
    },
}

impl Conversion {
    pub const COST_EXACT: u32 = 0;
    pub const COST_NULL_TO_REFERENCE: u32 = 1;
    pub const COST_WIDENING_REFERENCE: u32 = 2;
    pub const COST_PRIMITIVE_WIDENING: u32 = 3;
    pub const COST_BOXING: u32 = 20;
    pub const COST_UNBOXING: u32 = 20;

    pub(crate) fn identity() -> Self {
        Self {
            kind: ConversionKind::Identity,
            cost: Self::COST_EXACT,
            is_implicit: true,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }

    /// Whether the conversion is only allowed in loose invocation contexts.
    pub fn needs_boxing(&self) -> bool {
        matches!(self.kind, ConversionKind::Boxing { .. } | ConversionKind::Unboxing { .. })
    }
}

/// Find the implicit conversion from `from` to `to`, if any.
///
/// `params` supplies the bounds of type variables in scope.
pub fn find_conversion(
    from: &JavaType,
    to: &JavaType,
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<Conversion> {
    if from.is_unknown() || to.is_unknown() {
        return None;
    }
    if from == to {
        return Some(Conversion::identity());
    }
    match (from, to) {
        (JavaType::Primitive(a), JavaType::Primitive(b)) => find_primitive_conversion(*a, *b),
        (JavaType::Primitive(_), _) => find_boxing_conversion(from, to, table, params),
        (_, JavaType::Primitive(_)) => find_unboxing_conversion(from, to),
        _ => find_reference_conversion(from, to, table, params),
    }
}

/// Whether a value of type `from` may be passed where `to` is expected.
pub fn is_assignable(from: &JavaType, to: &JavaType, table: &TypeTable, params: &[TypeParamDecl]) -> bool {
    find_conversion(from, to, table, params).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;

    fn prim(p: PrimitiveKind) -> JavaType {
        JavaType::Primitive(p)
    }

    #[test]
    fn placeholder_compatibility_table() {
        let table = Classpath::builtin().build().unwrap();
        let long = prim(PrimitiveKind::Long);
        assert!(is_assignable(&prim(PrimitiveKind::Int), &long, &table, &[]));
        assert!(is_assignable(&long, &long, &table, &[]));
        assert!(!is_assignable(&long, &prim(PrimitiveKind::Int), &table, &[]));
        assert!(!is_assignable(&prim(PrimitiveKind::Int), &prim(PrimitiveKind::Short), &table, &[]));
        assert!(!is_assignable(&prim(PrimitiveKind::Boolean), &prim(PrimitiveKind::Int), &table, &[]));
        assert!(is_assignable(&JavaType::class("java.lang.Integer"), &long, &table, &[]));
        assert!(is_assignable(&JavaType::Null, &JavaType::string(), &table, &[]));
        assert!(!is_assignable(&JavaType::Unknown, &JavaType::object(), &table, &[]));
    }

    #[test]
    fn boxing_is_loose_only() {
        let table = Classpath::builtin().build().unwrap();
        let conv = find_conversion(&prim(PrimitiveKind::Int), &JavaType::object(), &table, &[]).unwrap();
        assert!(conv.needs_boxing());
        let conv = find_conversion(&prim(PrimitiveKind::Int), &prim(PrimitiveKind::Long), &table, &[]).unwrap();
        assert!(!conv.needs_boxing());
    }
}
