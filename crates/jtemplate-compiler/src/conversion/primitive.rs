//! Primitive conversions and numeric promotion.

use jtemplate_core::PrimitiveKind;

use super::{Conversion, ConversionKind};

/// Whether `from` widens to `to` without loss of magnitude.
///
/// `byte -> short -> int -> long -> float -> double`, and `char -> int`.
/// `boolean` and `void` convert only to themselves.
pub fn widens(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short | Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => matches!(to, Double),
        Double | Boolean | Void => false,
    }
}

/// Identity or widening primitive conversion.
pub fn find_primitive_conversion(from: PrimitiveKind, to: PrimitiveKind) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::identity());
    }
    widens(from, to).then(|| Conversion {
        kind: ConversionKind::WideningPrimitive { from, to },
        cost: Conversion::COST_PRIMITIVE_WIDENING + widening_distance(from, to),
        is_implicit: true,
    })
}

/// Steps along the widening chain.
fn widening_distance(from: PrimitiveKind, to: PrimitiveKind) -> u32 {
    rank(to).saturating_sub(rank(from))
}

fn rank(p: PrimitiveKind) -> u32 {
    use PrimitiveKind::*;
    match p {
        Byte => 0,
        Short | Char => 1,
        Int => 2,
        Long => 3,
        Float => 4,
        Double => 5,
        Boolean | Void => 0,
    }
}

/// Unary numeric promotion: `byte`, `short` and `char` become `int`.
pub fn unary_promotion(p: PrimitiveKind) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    match p {
        Byte | Short | Char | Int => Some(Int),
        Long | Float | Double => Some(p),
        Boolean | Void => None,
    }
}

/// Binary numeric promotion of two numeric operands.
pub fn binary_promotion(a: PrimitiveKind, b: PrimitiveKind) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    Some(if a == Double || b == Double {
        Double
    } else if a == Float || b == Float {
        Float
    } else if a == Long || b == Long {
        Long
    } else {
        Int
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use PrimitiveKind::*;

    #[test]
    fn widening_table() {
        assert!(widens(Byte, Short));
        assert!(widens(Char, Int));
        assert!(widens(Int, Long));
        assert!(widens(Long, Float));
        assert!(widens(Float, Double));
        assert!(!widens(Short, Char));
        assert!(!widens(Char, Short));
        assert!(!widens(Int, Short));
        assert!(!widens(Long, Int));
        assert!(!widens(Boolean, Int));
        assert!(!widens(Int, Boolean));
    }

    #[test]
    fn identity_is_cheaper_than_widening() {
        let exact = find_primitive_conversion(Int, Int).unwrap();
        assert!(exact.is_exact());
        let to_long = find_primitive_conversion(Int, Long).unwrap();
        let to_double = find_primitive_conversion(Int, Double).unwrap();
        assert!(to_long.cost < to_double.cost);
        assert!(find_primitive_conversion(Long, Int).is_none());
    }

    #[test]
    fn promotions() {
        assert_eq!(unary_promotion(Char), Some(Int));
        assert_eq!(unary_promotion(Boolean), None);
        assert_eq!(binary_promotion(Int, Long), Some(Long));
        assert_eq!(binary_promotion(Short, Byte), Some(Int));
        assert_eq!(binary_promotion(Float, Long), Some(Float));
        assert_eq!(binary_promotion(Boolean, Int), None);
    }
}
