//! Parser state and fragment entry points.
//!
//! The parser works over the complete token vector produced by the
//! [`Lexer`](crate::lexer::Lexer), which makes speculative parsing (casts,
//! local variable declarations, lambdas) a matter of saving and restoring a
//! position.
//!
//! Trivia handling: the whitespace before a token belongs to the first node
//! that starts at that token. [`Parser::take_prefix`] hands the whitespace out
//! once; any later request for the same token's prefix gets an empty
//! [`Space`].

use std::sync::Arc;

use jtemplate_core::{ParseError, ParseErrorKind, ParseErrors};
use tracing::trace;

use super::decl::{Annotation, CompilationUnit};
use super::expr::Expr;
use super::node::{Container, Name, Space};
use super::stmt::Stmt;
use super::types::{TypeParam, TypeTree};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser for the supported Java subset.
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) position: usize,
    /// Whether the current token's prefix has already been handed out.
    prefix_taken: bool,
}

/// A saved parser position for backtracking.
#[derive(Debug, Clone, Copy)]
pub(super) struct Checkpoint {
    position: usize,
    prefix_taken: bool,
}

impl Parser {
    /// Tokenize `source` and create a parser positioned at its first token.
    pub fn new(source: &str) -> Result<Self, ParseErrors> {
        let tokens = Lexer::new(source).tokenize().map_err(|errors| {
            let mut out = ParseErrors::new();
            for e in errors {
                out.push(ParseError::from(e));
            }
            out
        })?;
        Ok(Self {
            tokens,
            position: 0,
            prefix_taken: false,
        })
    }

    // =========================================
    // Fragment entry points
    // =========================================

    /// Parse a whole source file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_compilation_unit(source: &str) -> Result<Arc<CompilationUnit>, ParseErrors> {
        trace!(len = source.len(), "parsing compilation unit");
        Self::run(source, |p| p.compilation_unit().map(Arc::new))
    }

    /// Parse a single expression.
    pub fn parse_expression(source: &str) -> Result<Arc<Expr>, ParseErrors> {
        Self::run(source, |p| p.parse_expr(0).map(Arc::new))
    }

    /// Parse a comma-separated expression list such as call arguments.
    ///
    /// Trailing whitespace of the input is kept as the last element's `after`.
    pub fn parse_expression_list(source: &str) -> Result<Container<Arc<Expr>>, ParseErrors> {
        Self::run(source, |p| {
            p.parse_container_rest(TokenKind::Eof, |p| p.parse_expr(0).map(Arc::new))
        })
    }

    /// Parse a sequence of block statements.
    pub fn parse_statements(source: &str) -> Result<Vec<Arc<Stmt>>, ParseErrors> {
        Self::run(source, |p| {
            let mut stmts = Vec::new();
            while !p.check(TokenKind::Eof) {
                stmts.push(Arc::new(p.parse_block_stmt()?));
            }
            Ok(stmts)
        })
    }

    /// Parse a sequence of class members.
    pub fn parse_members(source: &str) -> Result<Vec<Arc<Stmt>>, ParseErrors> {
        Self::run(source, |p| {
            let mut members = Vec::new();
            while !p.check(TokenKind::Eof) {
                members.push(Arc::new(p.parse_member(None)?));
            }
            Ok(members)
        })
    }

    /// Parse a sequence of annotations.
    pub fn parse_annotations(source: &str) -> Result<Vec<Arc<Annotation>>, ParseErrors> {
        Self::run(source, |p| {
            let mut annotations = Vec::new();
            while !p.check(TokenKind::Eof) {
                annotations.push(Arc::new(p.parse_annotation()?));
            }
            Ok(annotations)
        })
    }

    /// Parse a type.
    pub fn parse_type_str(source: &str) -> Result<Arc<TypeTree>, ParseErrors> {
        Self::run(source, |p| p.parse_type().map(Arc::new))
    }

    /// Parse a comma-separated list of types (a `throws` clause body).
    pub fn parse_type_list(source: &str) -> Result<Vec<Arc<TypeTree>>, ParseErrors> {
        Self::run(source, |p| {
            let mut types = vec![Arc::new(p.parse_type()?)];
            while p.eat(TokenKind::Comma).is_some() {
                types.push(Arc::new(p.parse_type()?));
            }
            Ok(types)
        })
    }

    /// Parse a comma-separated list of formal parameters.
    pub fn parse_parameters(source: &str) -> Result<Vec<Arc<Stmt>>, ParseErrors> {
        Self::run(source, |p| {
            let mut params = Vec::new();
            if p.check(TokenKind::Eof) {
                return Ok(params);
            }
            params.push(Arc::new(p.parse_param()?));
            while p.eat(TokenKind::Comma).is_some() {
                params.push(Arc::new(p.parse_param()?));
            }
            Ok(params)
        })
    }

    /// Parse a type parameter declaration such as `T extends Number`.
    pub fn parse_type_parameter(source: &str) -> Result<Arc<TypeParam>, ParseErrors> {
        Self::run(source, |p| p.parse_type_param().map(Arc::new))
    }

    fn run<T>(source: &str, f: impl FnOnce(&mut Parser) -> Result<T, ParseError>) -> Result<T, ParseErrors> {
        let mut parser = Parser::new(source)?;
        let result = f(&mut parser).and_then(|value| {
            parser.expect_eof()?;
            Ok(value)
        });
        result.map_err(ParseErrors::from)
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.check(TokenKind::Eof) {
            Ok(())
        } else {
            let token = self.peek();
            Err(ParseError::new(
                ParseErrorKind::TrailingInput,
                token.span,
                format!("unexpected {} after end of fragment", token.kind),
            ))
        }
    }

    /// Whitespace left before the end of input.
    pub(super) fn eof_space(&mut self) -> Space {
        self.take_prefix()
    }

    // =========================================
    // Token access
    // =========================================

    pub(super) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Look `n` tokens ahead; past the end this is the EOF token.
    pub(super) fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(super) fn check_nth(&self, n: usize, kind: TokenKind) -> bool {
        self.peek_nth(n).kind == kind
    }

    /// Whether token `n` is `kind` and directly touches the previous token.
    pub(super) fn check_joined(&self, n: usize, kind: TokenKind) -> bool {
        let token = self.peek_nth(n);
        token.kind == kind && token.prefix.is_empty()
    }

    /// Hand out the current token's prefix, once.
    pub(super) fn take_prefix(&mut self) -> Space {
        if self.prefix_taken {
            Space::empty()
        } else {
            self.prefix_taken = true;
            Space::new(self.peek().prefix.clone())
        }
    }

    /// Consume the current token, returning the whitespace before it.
    pub(super) fn advance(&mut self) -> Space {
        let space = self.take_prefix();
        if self.peek().kind != TokenKind::Eof {
            self.position += 1;
        }
        self.prefix_taken = false;
        space
    }

    /// Consume the current token and return it with its whitespace.
    pub(super) fn advance_token(&mut self) -> (Space, Token) {
        let token = self.peek().clone();
        (self.advance(), token)
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Space> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Space, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(kind.description()))
        }
    }

    pub(super) fn expect_ident(&mut self) -> Result<Name, ParseError> {
        if self.check(TokenKind::Identifier) {
            let (space, token) = self.advance_token();
            Ok(Name::new(space, token.text))
        } else {
            let token = self.peek();
            Err(ParseError::expected_identifier(token.span, &token.text))
        }
    }

    pub(super) fn error_expected(&self, what: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {what}, found end of input"),
            )
        } else {
            ParseError::expected_token(token.span, what, &token.text)
        }
    }

    pub(super) fn error_at(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, self.peek().span, message)
    }

    // =========================================
    // Backtracking
    // =========================================

    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            prefix_taken: self.prefix_taken,
        }
    }

    pub(super) fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.prefix_taken = checkpoint.prefix_taken;
    }

    /// Run `f` speculatively: the parser position is always restored.
    pub(super) fn lookahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let checkpoint = self.checkpoint();
        let result = f(self);
        self.restore(checkpoint);
        result
    }

    /// Index of the token matching the opening delimiter at `open_at` tokens
    /// ahead, as an offset from the current position.
    pub(super) fn matching_close(&self, open_at: usize, open: TokenKind, close: TokenKind) -> Option<usize> {
        let mut depth = 0usize;
        let mut n = open_at;
        loop {
            let kind = self.peek_nth(n).kind;
            if kind == TokenKind::Eof {
                return None;
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return Some(n);
                }
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::Print;
    use pretty_assertions::assert_eq;

    #[test]
    fn trailing_input_is_rejected() {
        let errors = Parser::parse_expression("a b").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::TrailingInput);
    }

    #[test]
    fn lexical_errors_surface_as_parse_errors() {
        let errors = Parser::parse_expression("\"open").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::Lexical);
    }

    #[test]
    fn expression_list_keeps_spacing() {
        let list = Parser::parse_expression_list("a , -1,  b").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.elems[0].after.as_str(), " ");
        assert_eq!(list.get(2).unwrap().prefix.as_str(), "  ");
        assert_eq!(list.get(1).unwrap().print(), " -1");
    }

    #[test]
    fn empty_expression_list() {
        assert!(Parser::parse_expression_list("").unwrap().is_empty());
    }

    #[test]
    fn fragment_entry_points() {
        assert_eq!(Parser::parse_type_list("A, B").unwrap().len(), 2);
        assert_eq!(Parser::parse_parameters("int a, String... rest").unwrap().len(), 2);
        assert_eq!(Parser::parse_annotations("@A @B(1)").unwrap().len(), 2);
        assert_eq!(Parser::parse_type_parameter("T extends Number").unwrap().name, "T");
        assert_eq!(Parser::parse_members("int x; void f() {}").unwrap().len(), 2);
        assert_eq!(Parser::parse_statements("a(); b();").unwrap().len(), 2);
    }
}
