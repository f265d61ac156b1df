//! Reference, boxing and unboxing conversions.

use jtemplate_core::{JavaType, TypeParamDecl};
use jtemplate_registry::TypeTable;

use super::primitive::widens;
use super::{Conversion, ConversionKind};

/// `null` to any reference type, or widening reference conversion.
pub fn find_reference_conversion(
    from: &JavaType,
    to: &JavaType,
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<Conversion> {
    if matches!(from, JavaType::Null) {
        return to.is_reference().then(|| Conversion {
            kind: ConversionKind::NullToReference,
            cost: Conversion::COST_NULL_TO_REFERENCE,
            is_implicit: true,
        });
    }
    table.is_subtype_in(from, to, params).then(|| Conversion {
        kind: ConversionKind::WideningReference,
        cost: Conversion::COST_WIDENING_REFERENCE,
        is_implicit: true,
    })
}

/// Boxing a primitive, optionally followed by widening reference
/// conversion (`int -> Integer -> Number`).
pub fn find_boxing_conversion(
    from: &JavaType,
    to: &JavaType,
    table: &TypeTable,
    params: &[TypeParamDecl],
) -> Option<Conversion> {
    let primitive = from.as_primitive()?;
    let boxed = from.boxed();
    if boxed.is_unknown() || !to.is_reference() {
        return None;
    }
    (boxed == *to || table.is_subtype_in(&boxed, to, params)).then(|| Conversion {
        kind: ConversionKind::Boxing { from: primitive },
        cost: Conversion::COST_BOXING,
        is_implicit: true,
    })
}

/// Unboxing, optionally followed by widening primitive conversion
/// (`Integer -> long`).
pub fn find_unboxing_conversion(from: &JavaType, to: &JavaType) -> Option<Conversion> {
    let target = to.as_primitive()?;
    let unboxed = from.unboxed()?;
    (unboxed == target || widens(unboxed, target)).then(|| Conversion {
        kind: ConversionKind::Unboxing { to: target },
        cost: Conversion::COST_UNBOXING,
        is_implicit: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use jtemplate_core::PrimitiveKind;

    fn int() -> JavaType {
        JavaType::Primitive(PrimitiveKind::Int)
    }

    #[test]
    fn boxing_then_widening() {
        let table = Classpath::builtin().build().unwrap();
        assert!(find_boxing_conversion(&int(), &JavaType::class("java.lang.Integer"), &table, &[]).is_some());
        assert!(find_boxing_conversion(&int(), &JavaType::class("java.lang.Number"), &table, &[]).is_some());
        assert!(find_boxing_conversion(&int(), &JavaType::object(), &table, &[]).is_some());
        assert!(find_boxing_conversion(&int(), &JavaType::class("java.lang.Long"), &table, &[]).is_none());
    }

    #[test]
    fn unboxing_then_widening() {
        let integer = JavaType::class("java.lang.Integer");
        assert!(find_unboxing_conversion(&integer, &JavaType::Primitive(PrimitiveKind::Long)).is_some());
        assert!(find_unboxing_conversion(&integer, &JavaType::Primitive(PrimitiveKind::Short)).is_none());
        assert!(find_unboxing_conversion(&JavaType::string(), &int()).is_none());
    }

    #[test]
    fn null_and_subtypes() {
        let table = Classpath::builtin().build().unwrap();
        assert!(find_reference_conversion(&JavaType::Null, &JavaType::string(), &table, &[]).is_some());
        assert!(find_reference_conversion(&JavaType::Null, &int(), &table, &[]).is_none());
        let sb = JavaType::class("java.lang.StringBuilder");
        assert!(find_reference_conversion(&sb, &JavaType::class("java.lang.CharSequence"), &table, &[]).is_some());
        assert!(find_reference_conversion(&JavaType::object(), &JavaType::string(), &table, &[]).is_none());
    }
}
