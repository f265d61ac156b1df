//! Unified error types for jtemplate.
//!
//! ## Error Hierarchy
//!
//! ```text
//! Error (top-level wrapper)
//! ├── LexError                    - tokenization errors
//! ├── ParseErrors                 - parser errors (with ParseErrorKind)
//! ├── RegistrationError           - building the type table
//! ├── TemplateSyntaxError         - malformed template at compile time
//! └── TemplateInstantiationError  - failed `apply` of a template
//! ```
//!
//! A template that simply does not match a candidate is *not* an error; the
//! matcher reports it as `None`. Likewise a generic constraint that cannot be
//! satisfied during instantiation leaves the resolved method type empty
//! instead of failing.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis (tokenization).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A character literal was not properly terminated.
    #[error("unterminated character literal at {span}")]
    UnterminatedChar { span: Span },

    /// A block comment was not properly terminated.
    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    /// A numeric literal could not be scanned.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The lexer rejected the input.
    Lexical,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// A statement was expected.
    ExpectedStatement,
    /// A declaration (class member) was expected.
    ExpectedDeclaration,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// Input remained after a complete fragment was parsed.
    TrailingInput,
    /// A literal value could not be interpreted.
    InvalidLiteral,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::TrailingInput => "trailing input",
            ParseErrorKind::InvalidLiteral => "invalid literal",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected token: {token}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!("Error at {}:{}: {}\n", self.span.line, self.span.col, self.kind);
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }
        if let Some(line_text) = source.lines().nth(self.span.line.saturating_sub(1) as usize) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }
        output
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, error.span(), error.to_string())
    }
}

/// A collection of parse errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// The first recorded error, if any.
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<LexError> for ParseErrors {
    fn from(error: LexError) -> Self {
        ParseError::from(error).into()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors that occur while populating a type table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A class with the same fully-qualified name is already registered.
    #[error("class '{fqn}' is already registered")]
    DuplicateClass { fqn: String },

    /// A classpath source did not parse.
    #[error("classpath source '{name}' does not parse: {errors}")]
    Source {
        name: String,
        #[source]
        errors: ParseErrors,
    },
}

// ============================================================================
// Template Errors
// ============================================================================

/// A template string could not be compiled.
///
/// Raised by the template builder; fatal for that template and never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateSyntaxError {
    /// `#{` without a closing `}`.
    #[error("unterminated placeholder starting at byte {offset}")]
    UnterminatedPlaceholder { offset: usize },

    /// Parentheses inside a placeholder do not balance.
    #[error("unbalanced parentheses in placeholder at byte {offset}")]
    UnbalancedParentheses { offset: usize },

    /// The placeholder kind keyword is not one of `any`, `anyArray`, `literal`.
    #[error("unknown placeholder kind '{keyword}' at byte {offset}")]
    UnknownPlaceholderKind { keyword: String, offset: usize },

    /// The placeholder name is not a Java identifier.
    #[error("invalid placeholder name '{name}' at byte {offset}")]
    InvalidPlaceholderName { name: String, offset: usize },

    /// A named placeholder was declared twice with a kind or constraint.
    #[error("placeholder '{name}' redeclared at byte {offset}")]
    DuplicatePlaceholder { name: String, offset: usize },

    /// The type constraint of a placeholder is not a Java type.
    #[error("invalid type constraint '{text}': {errors}")]
    InvalidConstraint {
        text: String,
        #[source]
        errors: ParseErrors,
    },

    /// A generic type declaration is not a Java type parameter.
    #[error("invalid generic type declaration '{text}': {errors}")]
    InvalidGenericType {
        text: String,
        #[source]
        errors: ParseErrors,
    },

    /// An import entry is not a qualified name.
    #[error("invalid import '{text}'")]
    InvalidImport { text: String },

    /// A placeholder constraint refers to a type variable that was not declared.
    #[error("placeholder {placeholder} refers to undeclared type variable '{name}'")]
    UndeclaredTypeVariable { name: String, placeholder: usize },

    /// A source passed to `depends_on` is not a valid compilation unit.
    #[error("dependency {index} does not parse: {errors}")]
    InvalidDependency {
        index: usize,
        #[source]
        errors: ParseErrors,
    },

    /// The stubbed snippet is not valid Java.
    #[error("template snippet does not parse: {errors}")]
    Snippet {
        #[source]
        errors: ParseErrors,
    },
}

/// A template could not be applied at the requested location.
///
/// Local to a single `apply` call: the original tree is never modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateInstantiationError {
    /// The number of substitution arguments differs from the placeholder count.
    #[error("template expects {expected} arguments, {found} supplied")]
    ArgumentCount { expected: usize, found: usize },

    /// A substitution argument's type is incompatible with its placeholder.
    #[error("argument {index} has type {found}, which is not assignable to {expected}")]
    IncompatibleArgument {
        index: usize,
        expected: String,
        found: String,
    },

    /// A substitution argument is not a valid Java expression.
    #[error("argument {index} is not a valid expression: {errors}")]
    InvalidArgument {
        index: usize,
        #[source]
        errors: ParseErrors,
    },

    /// The coordinates cannot be used at the cursor's node.
    #[error("coordinates {coordinates} cannot be applied to {node}")]
    IncompatibleCoordinates {
        coordinates: &'static str,
        node: &'static str,
    },

    /// The rendered template does not have the shape the coordinates require.
    #[error("coordinates {coordinates} require {expected}: {errors}")]
    FragmentShape {
        coordinates: &'static str,
        expected: &'static str,
        #[source]
        errors: ParseErrors,
    },

    /// The template itself failed to compile lazily.
    #[error(transparent)]
    Template(#[from] TemplateSyntaxError),

    /// The edited declarations could not be registered again.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

// ============================================================================
// Umbrella
// ============================================================================

/// Any error produced by the workspace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseErrors),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    TemplateSyntax(#[from] TemplateSyntaxError),

    #[error(transparent)]
    TemplateInstantiation(#[from] TemplateInstantiationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::expected_token(Span::new(4, 1, 5, 1), "';'", "'}'");
        assert_eq!(err.to_string(), "expected token at 1:5: expected ';', found '}'");
    }

    #[test]
    fn display_with_source_points_at_column() {
        let err = ParseError::unexpected_token(Span::new(6, 2, 3, 2), "++");
        let rendered = err.display_with_source("int x;\n  ++;\n");
        assert!(rendered.contains("  2 |   ++;"));
        assert!(rendered.contains("|   ^~"));
    }

    #[test]
    fn lex_error_converts_to_parse_error() {
        let lex = LexError::UnexpectedChar {
            ch: '#',
            span: Span::new(0, 1, 1, 1),
        };
        let errors: ParseErrors = lex.into();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.kind), Some(ParseErrorKind::Lexical));
    }

    #[test]
    fn instantiation_error_wraps_syntax_error() {
        let err: Error = TemplateInstantiationError::from(TemplateSyntaxError::UnterminatedPlaceholder {
            offset: 3,
        })
        .into();
        assert_eq!(err.to_string(), "unterminated placeholder starting at byte 3");
    }
}
