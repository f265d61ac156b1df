//! Token types and definitions for the Java lexer.

use jtemplate_core::{PrimitiveKind, Span};
use std::fmt;

/// A token from the source code.
///
/// `prefix` holds the whitespace and comments that precede the token, so the
/// concatenation of `prefix + text` over every token reproduces the input.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub prefix: String,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, text: impl Into<String>, prefix: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            prefix: prefix.into(),
            span,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.text, self.span)
    }
}

/// All token types of the supported Java subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`, `0x2A`, `0b101`, `1_000`
    IntLiteral,
    /// `42L`
    LongLiteral,
    /// `1.5f`
    FloatLiteral,
    /// `1.5`, `1e3`, `2d`
    DoubleLiteral,
    /// `'c'`
    CharLiteral,
    /// `"text"` or a `"""` text block
    StringLiteral,
    Identifier,

    // =========================================
    // Keywords - Primitive types
    // =========================================
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,

    // =========================================
    // Keywords - Values
    // =========================================
    True,
    False,
    Null,
    This,
    Super,

    // =========================================
    // Keywords - Control flow
    // =========================================
    If,
    Else,
    For,
    While,
    Do,
    Return,
    Break,
    Continue,
    Throw,
    Assert,
    New,
    Instanceof,

    // =========================================
    // Keywords - Declarations
    // =========================================
    Class,
    Interface,
    Extends,
    Implements,
    Throws,
    Package,
    Import,

    // =========================================
    // Keywords - Modifiers
    // =========================================
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

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    Amp,
    Pipe,
    Caret,
    Tilde,
    LessLess,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    /// Always a single `>`; shifts are re-joined by the parser.
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    Bang,
    Question,
    Colon,
    ColonColon,
    Arrow,
    Dot,
    Ellipsis,
    At,

    // =========================================
    // Delimiters
    // =========================================
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,

    Eof,
    Error,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral
                | LongLiteral
                | FloatLiteral
                | DoubleLiteral
                | CharLiteral
                | StringLiteral
                | True
                | False
                | Null
        )
    }

    /// The primitive type named by a keyword token.
    pub fn primitive(self) -> Option<PrimitiveKind> {
        use TokenKind::*;
        Some(match self {
            Boolean => PrimitiveKind::Boolean,
            Byte => PrimitiveKind::Byte,
            Short => PrimitiveKind::Short,
            Char => PrimitiveKind::Char,
            Int => PrimitiveKind::Int,
            Long => PrimitiveKind::Long,
            Float => PrimitiveKind::Float,
            Double => PrimitiveKind::Double,
            Void => PrimitiveKind::Void,
            _ => return None,
        })
    }

    /// Whether the token is a declaration modifier keyword.
    pub fn is_modifier(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Public
                | Protected
                | Private
                | Static
                | Final
                | Abstract
                | Native
                | Synchronized
                | Transient
                | Volatile
                | Strictfp
                | Default
        )
    }

    /// Human-readable description used in error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            LongLiteral => "long literal",
            FloatLiteral => "float literal",
            DoubleLiteral => "double literal",
            CharLiteral => "character literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Boolean => "'boolean'",
            Byte => "'byte'",
            Short => "'short'",
            Char => "'char'",
            Int => "'int'",
            Long => "'long'",
            Float => "'float'",
            Double => "'double'",
            Void => "'void'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            This => "'this'",
            Super => "'super'",
            If => "'if'",
            Else => "'else'",
            For => "'for'",
            While => "'while'",
            Do => "'do'",
            Return => "'return'",
            Break => "'break'",
            Continue => "'continue'",
            Throw => "'throw'",
            Assert => "'assert'",
            New => "'new'",
            Instanceof => "'instanceof'",
            Class => "'class'",
            Interface => "'interface'",
            Extends => "'extends'",
            Implements => "'implements'",
            Throws => "'throws'",
            Package => "'package'",
            Import => "'import'",
            Public => "'public'",
            Protected => "'protected'",
            Private => "'private'",
            Static => "'static'",
            Final => "'final'",
            Abstract => "'abstract'",
            Native => "'native'",
            Synchronized => "'synchronized'",
            Transient => "'transient'",
            Volatile => "'volatile'",
            Strictfp => "'strictfp'",
            Default => "'default'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            Equal => "'='",
            PlusEqual => "'+='",
            MinusEqual => "'-='",
            StarEqual => "'*='",
            SlashEqual => "'/='",
            PercentEqual => "'%='",
            AmpEqual => "'&='",
            PipeEqual => "'|='",
            CaretEqual => "'^='",
            LessLessEqual => "'<<='",
            Amp => "'&'",
            Pipe => "'|'",
            Caret => "'^'",
            Tilde => "'~'",
            LessLess => "'<<'",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Bang => "'!'",
            Question => "'?'",
            Colon => "':'",
            ColonColon => "'::'",
            Arrow => "'->'",
            Dot => "'.'",
            Ellipsis => "'...'",
            At => "'@'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Eof => "end of input",
            Error => "error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword string to its [`TokenKind`], or `None` if not a keyword.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "boolean" => Boolean,
        "byte" => Byte,
        "short" => Short,
        "char" => Char,
        "int" => Int,
        "long" => Long,
        "float" => Float,
        "double" => Double,
        "void" => Void,

        "true" => True,
        "false" => False,
        "null" => Null,
        "this" => This,
        "super" => Super,

        "if" => If,
        "else" => Else,
        "for" => For,
        "while" => While,
        "do" => Do,
        "return" => Return,
        "break" => Break,
        "continue" => Continue,
        "throw" => Throw,
        "assert" => Assert,
        "new" => New,
        "instanceof" => Instanceof,

        "class" => Class,
        "interface" => Interface,
        "extends" => Extends,
        "implements" => Implements,
        "throws" => Throws,
        "package" => Package,
        "import" => Import,

        "public" => Public,
        "protected" => Protected,
        "private" => Private,
        "static" => Static,
        "final" => Final,
        "abstract" => Abstract,
        "native" => Native,
        "synchronized" => Synchronized,
        "transient" => Transient,
        "volatile" => Volatile,
        "strictfp" => Strictfp,
        "default" => Default,

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(lookup_keyword("instanceof"), Some(TokenKind::Instanceof));
        assert_eq!(lookup_keyword("var"), None);
        assert_eq!(lookup_keyword("String"), None);
    }

    #[test]
    fn primitive_keywords() {
        assert_eq!(TokenKind::Long.primitive(), Some(PrimitiveKind::Long));
        assert_eq!(TokenKind::Identifier.primitive(), None);
        assert!(TokenKind::Final.is_modifier());
        assert!(TokenKind::Null.is_literal());
    }
}
