//! Operator definitions for Java expressions.
//!
//! Provides enums for binary, unary and assignment operators along with the
//! binding powers used by the Pratt expression parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `&`
    BitwiseAnd,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `>>>`
    ShiftRightUnsigned,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

/// Binding power of `instanceof`, which shares the relational level.
pub const INSTANCEOF_BINDING_POWER: u8 = 15;

impl BinaryOp {
    /// Binding power as `(left_bp, right_bp)`; all binary operators are
    /// left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            LogicalOr => (3, 4),
            LogicalAnd => (5, 6),
            BitwiseOr => (7, 8),
            BitwiseXor => (9, 10),
            BitwiseAnd => (11, 12),
            Equal | NotEqual => (13, 14),
            Less | LessEqual | Greater | GreaterEqual => (15, 16),
            ShiftLeft | ShiftRight | ShiftRightUnsigned => (17, 18),
            Add | Sub => (19, 20),
            Mul | Div | Mod => (21, 22),
        }
    }

    /// Convert a single token to a binary operator.
    ///
    /// `>>` and `>>>` span several `>` tokens and are recognized by the parser.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            PipePipe => BinaryOp::LogicalOr,
            AmpAmp => BinaryOp::LogicalAnd,
            Pipe => BinaryOp::BitwiseOr,
            Caret => BinaryOp::BitwiseXor,
            Amp => BinaryOp::BitwiseAnd,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            LessLess => BinaryOp::ShiftLeft,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalOr | BinaryOp::LogicalAnd)
    }

    pub fn is_shift(&self) -> bool {
        use BinaryOp::*;
        matches!(self, ShiftLeft | ShiftRight | ShiftRightUnsigned)
    }

    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseAnd => "&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            ShiftRightUnsigned => ">>>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prefix and postfix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    LogicalNot,
    /// `~x`
    BitwiseNot,
    /// `++x`
    PreInc,
    /// `--x`
    PreDec,
    /// `x++`
    PostInc,
    /// `x--`
    PostDec,
}

impl UnaryOp {
    /// Higher than all binary operators.
    pub fn binding_power() -> u8 {
        25
    }

    /// Convert a token in prefix position to a unary operator.
    pub fn from_prefix_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            Minus => UnaryOp::Neg,
            Plus => UnaryOp::Plus,
            Bang => UnaryOp::LogicalNot,
            Tilde => UnaryOp::BitwiseNot,
            PlusPlus => UnaryOp::PreInc,
            MinusMinus => UnaryOp::PreDec,
            _ => return None,
        })
    }

    /// Convert a token in postfix position to a unary operator.
    pub fn from_postfix_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::PlusPlus => Some(UnaryOp::PostInc),
            TokenKind::MinusMinus => Some(UnaryOp::PostDec),
            _ => None,
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    pub fn as_str(&self) -> &'static str {
        use UnaryOp::*;
        match self {
            Neg => "-",
            Plus => "+",
            LogicalNot => "!",
            BitwiseNot => "~",
            PreInc | PostInc => "++",
            PreDec | PostDec => "--",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    UshrAssign,
}

impl AssignOp {
    /// Lowest precedence, right-associative.
    pub fn binding_power() -> (u8, u8) {
        (2, 1)
    }

    /// Convert a single token to an assignment operator.
    ///
    /// `>>=` and `>>>=` span several tokens and are recognized by the parser.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use AssignOp::*;
        use TokenKind::*;
        Some(match token {
            Equal => Assign,
            PlusEqual => AddAssign,
            MinusEqual => SubAssign,
            StarEqual => MulAssign,
            SlashEqual => DivAssign,
            PercentEqual => ModAssign,
            AmpEqual => AndAssign,
            PipeEqual => OrAssign,
            CaretEqual => XorAssign,
            LessLessEqual => ShlAssign,
            _ => return None,
        })
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Assign)
    }

    /// The binary operator applied by a compound assignment.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        use AssignOp::*;
        Some(match self {
            Assign => return None,
            AddAssign => BinaryOp::Add,
            SubAssign => BinaryOp::Sub,
            MulAssign => BinaryOp::Mul,
            DivAssign => BinaryOp::Div,
            ModAssign => BinaryOp::Mod,
            AndAssign => BinaryOp::BitwiseAnd,
            OrAssign => BinaryOp::BitwiseOr,
            XorAssign => BinaryOp::BitwiseXor,
            ShlAssign => BinaryOp::ShiftLeft,
            ShrAssign => BinaryOp::ShiftRight,
            UshrAssign => BinaryOp::ShiftRightUnsigned,
        })
    }

    pub fn as_str(&self) -> &'static str {
        use AssignOp::*;
        match self {
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            AndAssign => "&=",
            OrAssign => "|=",
            XorAssign => "^=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            UshrAssign => ">>>=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_ordering() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().0);
        assert!(BinaryOp::Add.binding_power().0 > BinaryOp::ShiftLeft.binding_power().0);
        assert!(BinaryOp::LogicalAnd.binding_power().0 > BinaryOp::LogicalOr.binding_power().0);
        assert_eq!(BinaryOp::Less.binding_power().0, INSTANCEOF_BINDING_POWER);
    }

    #[test]
    fn compound_assignment_operators() {
        assert_eq!(AssignOp::AddAssign.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert_eq!(AssignOp::UshrAssign.to_string(), ">>>=");
    }

    #[test]
    fn unary_tokens() {
        assert_eq!(UnaryOp::from_prefix_token(TokenKind::Minus), Some(UnaryOp::Neg));
        assert_eq!(UnaryOp::from_postfix_token(TokenKind::PlusPlus), Some(UnaryOp::PostInc));
        assert!(UnaryOp::PostDec.is_postfix());
        assert_eq!(UnaryOp::PostDec.as_str(), "--");
    }
}
