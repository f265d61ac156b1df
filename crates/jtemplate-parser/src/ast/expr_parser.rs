//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! The prefix position handles literals, names, parentheses (grouping, casts
//! and lambdas), `new` and prefix operators; the loop in [`Parser::parse_expr`]
//! then consumes postfix, binary, `instanceof`, ternary and assignment
//! operators by binding power.

use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

use jtemplate_core::{ParseError, ParseErrorKind};
use ordered_float::OrderedFloat;

use super::expr::*;
use super::node::{Container, Name, Padded, Space};
use super::ops::{AssignOp, BinaryOp, INSTANCEOF_BINDING_POWER, UnaryOp};
use super::parser::Parser;
use super::stmt::{Stmt, StmtKind, VarDeclarator, VarDecls};
use crate::lexer::{Token, TokenKind};

/// Postfix operators bind tighter than anything else.
const POSTFIX_BINDING_POWER: u8 = 27;

/// Ternary sits just above assignment and is right-associative.
const TERNARY_BINDING_POWER: u8 = 2;

/// Move the prefix of `expr` out so the enclosing node can own it.
fn hoist(mut expr: Expr) -> (Space, Arc<Expr>) {
    let prefix = std::mem::take(&mut expr.prefix);
    (prefix, Arc::new(expr))
}

impl Parser {
    /// Parse an expression with a minimum binding power.
    pub(super) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            if let Some(op) = UnaryOp::from_postfix_token(kind) {
                if POSTFIX_BINDING_POWER < min_bp {
                    break;
                }
                let op_prefix = self.advance();
                let (prefix, operand) = hoist(lhs);
                lhs = Expr::new(prefix, ExprKind::Unary(Unary { op, op_prefix, operand }));
                continue;
            }

            match kind {
                TokenKind::Dot => {
                    lhs = self.parse_member_access(lhs)?;
                    continue;
                }
                TokenKind::LeftBracket => {
                    lhs = self.parse_index(lhs)?;
                    continue;
                }
                TokenKind::ColonColon => {
                    lhs = self.parse_member_ref(lhs)?;
                    continue;
                }
                TokenKind::Question => {
                    if TERNARY_BINDING_POWER < min_bp {
                        break;
                    }
                    lhs = self.parse_ternary(lhs)?;
                    continue;
                }
                TokenKind::Instanceof => {
                    if INSTANCEOF_BINDING_POWER < min_bp {
                        break;
                    }
                    let keyword = self.advance();
                    let clazz = Arc::new(self.parse_type()?);
                    let (prefix, expr) = hoist(lhs);
                    lhs = Expr::new(prefix, ExprKind::InstanceOf(InstanceOf { expr, keyword, clazz }));
                    continue;
                }
                _ => {}
            }

            if let Some((op, width)) = self.peek_assign_op() {
                let (l_bp, r_bp) = AssignOp::binding_power();
                if l_bp < min_bp {
                    break;
                }
                let op_prefix = self.advance_n(width);
                let value = Arc::new(self.parse_expr(r_bp)?);
                let (prefix, target) = hoist(lhs);
                lhs = Expr::new(
                    prefix,
                    ExprKind::Assign(Assign {
                        target,
                        op_prefix,
                        op,
                        value,
                    }),
                );
                continue;
            }

            if let Some((op, width)) = self.peek_binary_op() {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                let op_prefix = self.advance_n(width);
                let right = Arc::new(self.parse_expr(r_bp)?);
                let (prefix, left) = hoist(lhs);
                lhs = Expr::new(
                    prefix,
                    ExprKind::Binary(Binary {
                        left,
                        op_prefix,
                        op,
                        right,
                    }),
                );
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Consume `width` tokens that form one operator, returning the
    /// whitespace before the first.
    fn advance_n(&mut self, width: usize) -> Space {
        let space = self.advance();
        for _ in 1..width {
            self.advance();
        }
        space
    }

    /// The binary operator at the cursor and how many tokens it spans.
    ///
    /// The lexer emits `>` one at a time so nested type arguments close
    /// correctly; adjacent `>` tokens form the shift operators here.
    fn peek_binary_op(&self) -> Option<(BinaryOp, usize)> {
        if self.check(TokenKind::Greater) && self.check_joined(1, TokenKind::Greater) {
            if self.check_joined(2, TokenKind::Greater) {
                return Some((BinaryOp::ShiftRightUnsigned, 3));
            }
            return Some((BinaryOp::ShiftRight, 2));
        }
        BinaryOp::from_token(self.peek().kind).map(|op| (op, 1))
    }

    fn peek_assign_op(&self) -> Option<(AssignOp, usize)> {
        if self.check(TokenKind::Greater) {
            if self.check_joined(1, TokenKind::GreaterEqual) {
                return Some((AssignOp::ShrAssign, 2));
            }
            if self.check_joined(1, TokenKind::Greater) && self.check_joined(2, TokenKind::GreaterEqual) {
                return Some((AssignOp::UshrAssign, 3));
            }
            return None;
        }
        AssignOp::from_token(self.peek().kind).map(|op| (op, 1))
    }

    /// Parse a prefix expression (the start of an expression).
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let kind = self.peek().kind;

        if kind.is_literal() {
            let (prefix, token) = self.advance_token();
            let value = parse_literal(&token)?;
            return Ok(Expr::new(
                prefix,
                ExprKind::Literal(Literal {
                    value,
                    source: token.text,
                }),
            ));
        }

        if let Some(op) = UnaryOp::from_prefix_token(kind) {
            let prefix = self.advance();
            let operand = Arc::new(self.parse_expr(UnaryOp::binding_power())?);
            return Ok(Expr::new(
                prefix,
                ExprKind::Unary(Unary {
                    op,
                    op_prefix: Space::empty(),
                    operand,
                }),
            ));
        }

        match kind {
            TokenKind::Identifier if self.check_nth(1, TokenKind::Arrow) => self.parse_bare_lambda(),
            TokenKind::Identifier | TokenKind::This | TokenKind::Super => {
                let (prefix, token) = self.advance_token();
                if self.check(TokenKind::LeftParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr::new(
                        prefix,
                        ExprKind::MethodCall(MethodCall {
                            select: None,
                            name: Name::new(Space::empty(), token.text),
                            args,
                            method_type: None,
                        }),
                    ));
                }
                Ok(Expr::new(prefix, ExprKind::Ident(Ident { name: token.text })))
            }
            TokenKind::LeftParen => {
                if self.is_parenthesized_lambda() {
                    self.parse_parenthesized_lambda()
                } else if self.is_cast() {
                    self.parse_cast()
                } else {
                    let prefix = self.advance();
                    let inner = Arc::new(self.parse_expr(0)?);
                    let close = self.expect(TokenKind::RightParen)?;
                    Ok(Expr::new(prefix, ExprKind::Paren(Paren { inner, close })))
                }
            }
            TokenKind::New => self.parse_new(),
            TokenKind::LeftBrace => self.parse_array_init(),
            // `int.class`
            _ if kind.primitive().is_some() && self.check_nth(1, TokenKind::Dot) => {
                let (prefix, token) = self.advance_token();
                Ok(Expr::new(prefix, ExprKind::Ident(Ident { name: token.text })))
            }
            TokenKind::Eof => Err(self.error_at(ParseErrorKind::UnexpectedEof, "expected expression, found end of input")),
            _ => {
                let token = self.peek();
                Err(ParseError::expected_expression(token.span, &token.text))
            }
        }
    }

    /// `(args)`
    pub(super) fn parse_args(&mut self) -> Result<Container<Arc<Expr>>, ParseError> {
        self.parse_container(TokenKind::LeftParen, TokenKind::RightParen, |p| {
            p.parse_expr(0).map(Arc::new)
        })
    }

    /// `{a, b}`
    pub(super) fn parse_array_init(&mut self) -> Result<Expr, ParseError> {
        let prefix = self.take_prefix();
        let elems = self.parse_container(TokenKind::LeftBrace, TokenKind::RightBrace, |p| {
            p.parse_expr(0).map(Arc::new)
        })?;
        Ok(Expr::new(prefix, ExprKind::ArrayInit(elems)))
    }

    fn parse_member_access(&mut self, lhs: Expr) -> Result<Expr, ParseError> {
        let dot = self.advance();
        let token = self.peek();
        let name = match token.kind {
            TokenKind::Identifier | TokenKind::Class | TokenKind::This | TokenKind::Super => {
                let (space, token) = self.advance_token();
                Name::new(space, token.text)
            }
            _ => return Err(ParseError::expected_identifier(token.span, &token.text)),
        };

        let (prefix, target) = hoist(lhs);
        if self.check(TokenKind::LeftParen) {
            let args = self.parse_args()?;
            return Ok(Expr::new(
                prefix,
                ExprKind::MethodCall(MethodCall {
                    select: Some(Padded {
                        elem: target,
                        after: dot,
                    }),
                    name,
                    args,
                    method_type: None,
                }),
            ));
        }
        Ok(Expr::new(prefix, ExprKind::FieldAccess(FieldAccess { target, dot, name })))
    }

    fn parse_index(&mut self, lhs: Expr) -> Result<Expr, ParseError> {
        let open = self.advance();
        let index = Arc::new(self.parse_expr(0)?);
        let close = self.expect(TokenKind::RightBracket)?;
        let (prefix, array) = hoist(lhs);
        Ok(Expr::new(
            prefix,
            ExprKind::ArrayAccess(ArrayAccess {
                array,
                open,
                index,
                close,
            }),
        ))
    }

    fn parse_member_ref(&mut self, lhs: Expr) -> Result<Expr, ParseError> {
        let colons = self.advance();
        let token = self.peek();
        let name = match token.kind {
            TokenKind::Identifier | TokenKind::New => {
                let (space, token) = self.advance_token();
                Name::new(space, token.text)
            }
            _ => return Err(ParseError::expected_identifier(token.span, &token.text)),
        };
        let (prefix, target) = hoist(lhs);
        Ok(Expr::new(prefix, ExprKind::MemberRef(MemberRef { target, colons, name })))
    }

    fn parse_ternary(&mut self, cond: Expr) -> Result<Expr, ParseError> {
        let question = self.advance();
        let then_expr = Arc::new(self.parse_expr(0)?);
        let colon = self.expect(TokenKind::Colon)?;
        let else_expr = Arc::new(self.parse_expr(TERNARY_BINDING_POWER)?);
        let (prefix, cond) = hoist(cond);
        Ok(Expr::new(
            prefix,
            ExprKind::Ternary(Ternary {
                cond,
                question,
                then_expr,
                colon,
                else_expr,
            }),
        ))
    }

    // =========================================
    // Parentheses: casts and lambdas
    // =========================================

    fn is_parenthesized_lambda(&self) -> bool {
        self.matching_close(0, TokenKind::LeftParen, TokenKind::RightParen)
            .is_some_and(|close| self.check_nth(close + 1, TokenKind::Arrow))
    }

    /// Whether the `(` at the cursor starts a cast.
    ///
    /// A primitive type in parentheses is always a cast; a reference type
    /// is a cast when the token after `)` can only start an operand.
    fn is_cast(&mut self) -> bool {
        let primitive = self.peek_nth(1).kind.primitive().is_some();
        self.lookahead(|p| {
            p.advance();
            if p.try_parse_type().is_none() || p.eat(TokenKind::RightParen).is_none() {
                return false;
            }
            if primitive {
                return true;
            }
            matches!(
                p.peek().kind,
                TokenKind::Identifier
                    | TokenKind::LeftParen
                    | TokenKind::This
                    | TokenKind::Super
                    | TokenKind::New
                    | TokenKind::Bang
                    | TokenKind::Tilde
            ) || p.peek().kind.is_literal()
        })
    }

    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        let prefix = self.advance();
        let clazz = Arc::new(self.parse_type()?);
        let close = self.expect(TokenKind::RightParen)?;
        let expr = Arc::new(self.parse_expr(UnaryOp::binding_power())?);
        Ok(Expr::new(prefix, ExprKind::Cast(Cast { clazz, close, expr })))
    }

    /// `x -> body`
    fn parse_bare_lambda(&mut self) -> Result<Expr, ParseError> {
        let prefix = self.take_prefix();
        let name = self.expect_ident()?;
        let param = Arc::new(inferred_param(name));
        let arrow = self.expect(TokenKind::Arrow)?;
        let body = self.parse_lambda_body()?;
        Ok(Expr::new(
            prefix,
            ExprKind::Lambda(Lambda {
                parenthesized: false,
                params: Container::new(vec![param]),
                arrow,
                body,
            }),
        ))
    }

    /// `(a, b) -> body` or `(int a, int b) -> body`
    fn parse_parenthesized_lambda(&mut self) -> Result<Expr, ParseError> {
        let prefix = self.take_prefix();
        let inferred = self.check_nth(1, TokenKind::Identifier)
            && matches!(self.peek_nth(2).kind, TokenKind::Comma | TokenKind::RightParen);
        let params = self.parse_container(TokenKind::LeftParen, TokenKind::RightParen, |p| {
            if inferred {
                let name = p.expect_ident()?;
                Ok(Arc::new(inferred_param(name)))
            } else {
                p.parse_param().map(Arc::new)
            }
        })?;
        let arrow = self.expect(TokenKind::Arrow)?;
        let body = self.parse_lambda_body()?;
        Ok(Expr::new(
            prefix,
            ExprKind::Lambda(Lambda {
                parenthesized: true,
                params,
                arrow,
                body,
            }),
        ))
    }

    fn parse_lambda_body(&mut self) -> Result<LambdaBody, ParseError> {
        if self.check(TokenKind::LeftBrace) {
            Ok(LambdaBody::Block(Arc::new(self.parse_block()?)))
        } else {
            Ok(LambdaBody::Expr(Arc::new(self.parse_expr(0)?)))
        }
    }

    // =========================================
    // Instance creation
    // =========================================

    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let prefix = self.advance();
        let clazz = self.parse_non_array_type()?;

        if self.check(TokenKind::LeftBracket) {
            let mut dims = Vec::new();
            while self.check(TokenKind::LeftBracket) {
                let open = self.advance();
                let size = if self.check(TokenKind::RightBracket) {
                    None
                } else {
                    Some(Arc::new(self.parse_expr(0)?))
                };
                let close = self.expect(TokenKind::RightBracket)?;
                dims.push(ArrayDim { open, size, close });
            }
            let init = if self.check(TokenKind::LeftBrace) {
                Some(Arc::new(self.parse_array_init()?))
            } else {
                None
            };
            return Ok(Expr::new(
                prefix,
                ExprKind::NewArray(NewArray {
                    elem: Arc::new(clazz),
                    dims,
                    init,
                }),
            ));
        }

        let args = self.parse_args()?;
        let body = if self.check(TokenKind::LeftBrace) {
            Some(Arc::new(self.parse_class_body(None)?))
        } else {
            None
        };
        Ok(Expr::new(
            prefix,
            ExprKind::NewClass(NewClass {
                clazz: Arc::new(clazz),
                args,
                body,
                constructor_type: None,
            }),
        ))
    }
}

/// A lambda parameter without a declared type.
fn inferred_param(name: Name) -> Stmt {
    let prefix = name.prefix.clone();
    let name = Name::new(Space::empty(), name.text);
    Stmt::new(
        prefix,
        StmtKind::Variables(VarDecls {
            modifiers: Vec::new(),
            type_tree: None,
            varargs: None,
            vars: vec![Padded::new(VarDeclarator::new(name))],
            semi: None,
        }),
    )
}

// =========================================
// Literals
// =========================================

fn invalid_literal(token: &Token, detail: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral,
        token.span,
        format!("invalid literal '{}': {}", token.text, detail),
    )
}

/// Split a numeric literal into its radix and digits.
fn radix_digits(text: &str) -> (u32, &str) {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (2, bin)
    } else if text.len() > 1 && text.starts_with('0') {
        (8, &text[1..])
    } else {
        (10, text)
    }
}

/// Compute the value of a literal token.
fn parse_literal(token: &Token) -> Result<LiteralValue, ParseError> {
    let text = token.text.as_str();
    match token.kind {
        TokenKind::True => Ok(LiteralValue::Bool(true)),
        TokenKind::False => Ok(LiteralValue::Bool(false)),
        TokenKind::Null => Ok(LiteralValue::Null),
        TokenKind::IntLiteral => {
            let digits = text.replace('_', "");
            let (radix, digits) = radix_digits(&digits);
            let value = u64::from_str_radix(digits, radix).map_err(|e| invalid_literal(token, &e.to_string()))?;
            if radix == 10 {
                // 2147483648 is only legal as the operand of unary minus.
                if value > 1 << 31 {
                    return Err(invalid_literal(token, "integer number too large"));
                }
                Ok(LiteralValue::Int(value as i64))
            } else {
                let bits = u32::try_from(value).map_err(|_| invalid_literal(token, "integer number too large"))?;
                Ok(LiteralValue::Int(i64::from(bits as i32)))
            }
        }
        TokenKind::LongLiteral => {
            let digits = text.trim_end_matches(['l', 'L']).replace('_', "");
            let (radix, digits) = radix_digits(&digits);
            let value = u64::from_str_radix(digits, radix).map_err(|e| invalid_literal(token, &e.to_string()))?;
            if radix == 10 && value > 1 << 63 {
                return Err(invalid_literal(token, "long number too large"));
            }
            Ok(LiteralValue::Long(value as i64))
        }
        TokenKind::FloatLiteral => {
            let digits = text.trim_end_matches(['f', 'F']).replace('_', "");
            let value = digits.parse::<f32>().map_err(|e| invalid_literal(token, &e.to_string()))?;
            Ok(LiteralValue::Float(OrderedFloat(value)))
        }
        TokenKind::DoubleLiteral => {
            let digits = text.trim_end_matches(['d', 'D']).replace('_', "");
            let value = digits.parse::<f64>().map_err(|e| invalid_literal(token, &e.to_string()))?;
            Ok(LiteralValue::Double(OrderedFloat(value)))
        }
        TokenKind::CharLiteral => {
            let inner = text
                .strip_prefix('\'')
                .and_then(|t| t.strip_suffix('\''))
                .ok_or_else(|| invalid_literal(token, "unterminated character"))?;
            let value = unescape(inner).map_err(|detail| invalid_literal(token, detail))?;
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(LiteralValue::Char(c)),
                _ => Err(invalid_literal(token, "character literal must hold one character")),
            }
        }
        TokenKind::StringLiteral => {
            let value = if let Some(block) = text.strip_prefix("\"\"\"") {
                let body = block
                    .strip_suffix("\"\"\"")
                    .ok_or_else(|| invalid_literal(token, "unterminated text block"))?;
                text_block_content(body)
            } else {
                text.strip_prefix('"')
                    .and_then(|t| t.strip_suffix('"'))
                    .ok_or_else(|| invalid_literal(token, "unterminated string"))?
                    .to_string()
            };
            unescape(&value)
                .map(LiteralValue::String)
                .map_err(|detail| invalid_literal(token, detail))
        }
        _ => Err(invalid_literal(token, "not a literal")),
    }
}

/// Strip the incidental indentation of a text block body (the text between
/// the delimiters, starting with the line break after the opening `"""`).
fn text_block_content(body: &str) -> String {
    let body = match body.split_once('\n') {
        Some((_, rest)) => rest,
        None => return String::new(),
    };
    let lines: Vec<&str> = body.split('\n').collect();
    let last = lines.len() - 1;
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| *i == last || !line.trim().is_empty())
        .map(|(_, line)| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(body.len());
    for (i, line) in lines.iter().enumerate() {
        let stripped = line.get(indent..).unwrap_or("").trim_end();
        out.push_str(stripped);
        if i < last {
            out.push('\n');
        }
    }
    out
}

/// Resolve escape sequences.
fn unescape(text: &str) -> Result<String, &'static str> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or("dangling backslash")?;
        match escaped {
            'b' => out.push('\u{8}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'f' => out.push('\u{c}'),
            'r' => out.push('\r'),
            's' => out.push(' '),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            // Line continuation inside text blocks.
            '\n' => {}
            '0'..='7' => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                let max_digits = if escaped <= '3' { 3 } else { 2 };
                for _ in 1..max_digits {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or("invalid octal escape")?);
            }
            'u' => {
                let mut code = unicode_escape(&mut chars)?;
                if (0xD800..0xDC00).contains(&code) {
                    // A high surrogate pairs with the escape that follows it.
                    let mut ahead = chars.clone();
                    let low = match (ahead.next(), ahead.next()) {
                        (Some('\\'), Some('u')) => unicode_escape(&mut ahead)?,
                        _ => return Err("unpaired surrogate"),
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err("unpaired surrogate");
                    }
                    chars = ahead;
                    code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                }
                out.push(char::from_u32(code).ok_or("invalid unicode escape")?);
            }
            _ => return Err("invalid escape sequence"),
        }
    }
    Ok(out)
}

/// The code unit of a `\uXXXX` escape whose `\u` was consumed; Java allows
/// any number of `u`s.
fn unicode_escape(chars: &mut Peekable<Chars<'_>>) -> Result<u32, &'static str> {
    while chars.peek() == Some(&'u') {
        chars.next();
    }
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err("invalid unicode escape");
    }
    u32::from_str_radix(&hex, 16).map_err(|_| "invalid unicode escape")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::Print;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Arc<Expr> {
        Parser::parse_expression(source).unwrap()
    }

    fn round_trip(source: &str) {
        assert_eq!(parse(source).print(), source);
    }

    fn literal(source: &str) -> LiteralValue {
        match &parse(source).kind {
            ExprKind::Literal(l) => l.value.clone(),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn precedence() {
        let expr = parse("a + b * c");
        let ExprKind::Binary(b) = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(b.op, BinaryOp::Add);
        assert!(matches!(b.right.kind, ExprKind::Binary(ref r) if r.op == BinaryOp::Mul));
    }

    #[test]
    fn left_associative() {
        let expr = parse("a - b - c");
        let ExprKind::Binary(b) = &expr.kind else {
            panic!("expected binary");
        };
        assert!(matches!(b.left.kind, ExprKind::Binary(_)));
        assert_eq!(b.right.ident_name(), Some("c"));
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("a = b = c");
        let ExprKind::Assign(a) = &expr.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(a.value.kind, ExprKind::Assign(_)));
    }

    #[test]
    fn shifts_join_adjacent_greater_tokens() {
        let expr = parse("a >> 2");
        assert!(matches!(expr.kind, ExprKind::Binary(ref b) if b.op == BinaryOp::ShiftRight));
        let expr = parse("a >>> 2");
        assert!(matches!(expr.kind, ExprKind::Binary(ref b) if b.op == BinaryOp::ShiftRightUnsigned));
        let expr = parse("a >>= 2");
        assert!(matches!(expr.kind, ExprKind::Assign(ref a) if a.op == AssignOp::ShrAssign));
        let expr = parse("a >>>= 2");
        assert!(matches!(expr.kind, ExprKind::Assign(ref a) if a.op == AssignOp::UshrAssign));
        round_trip("a >>> 2 >> b");
    }

    #[test]
    fn prefix_is_hoisted_to_outer_node() {
        let expr = parse("  a.b(c)");
        assert_eq!(expr.prefix.as_str(), "  ");
        let call = expr.as_method_call().unwrap();
        assert!(call.select.as_ref().unwrap().elem.prefix.is_empty());
    }

    #[test]
    fn method_calls_and_fields() {
        let expr = parse("System.out.println(\"hi\")");
        let call = expr.as_method_call().unwrap();
        assert_eq!(call.name.text, "println");
        assert_eq!(call.args.len(), 1);
        let select = &call.select.as_ref().unwrap().elem;
        assert_eq!(select.qualified_name().as_deref(), Some("System.out"));
    }

    #[test]
    fn round_trips() {
        round_trip("a.b( c ,d ).e");
        round_trip("x ? y : z");
        round_trip("(String) o");
        round_trip("(int)(a + b)");
        round_trip("(a + b) * c");
        round_trip("new ArrayList<>()");
        round_trip("new int[] {1, 2}");
        round_trip("new String[n][]");
        round_trip("o instanceof String");
        round_trip("a[i++]");
        round_trip("-x + ~y");
        round_trip("!done");
        round_trip("String::valueOf");
        round_trip("x -> x + 1");
        round_trip("(a, b) -> a.compareTo(b)");
        round_trip("(int a) -> { return a; }");
        round_trip("() -> {}");
        round_trip("new Object() { }");
        round_trip("Foo.class");
        round_trip("int.class");
    }

    #[test]
    fn casts_versus_parentheses() {
        assert!(matches!(parse("(String) o").kind, ExprKind::Cast(_)));
        assert!(matches!(parse("(a) + b").kind, ExprKind::Binary(_)));
        assert!(matches!(parse("(int) -1").kind, ExprKind::Cast(_)));
    }

    #[test]
    fn integer_literals() {
        assert_eq!(literal("42"), LiteralValue::Int(42));
        assert_eq!(literal("0x1F"), LiteralValue::Int(31));
        assert_eq!(literal("0b101"), LiteralValue::Int(5));
        assert_eq!(literal("017"), LiteralValue::Int(15));
        assert_eq!(literal("1_000"), LiteralValue::Int(1000));
        assert_eq!(literal("0xFFFFFFFF"), LiteralValue::Int(-1));
        assert_eq!(literal("2L"), LiteralValue::Long(2));
    }

    #[test]
    fn other_literals() {
        assert_eq!(literal("1.5f"), LiteralValue::Float(OrderedFloat(1.5)));
        assert_eq!(literal("2.0"), LiteralValue::Double(OrderedFloat(2.0)));
        assert_eq!(literal("'\\n'"), LiteralValue::Char('\n'));
        assert_eq!(literal("'\\u0041'"), LiteralValue::Char('A'));
        assert_eq!(literal("'\\uuu0041'"), LiteralValue::Char('A'));
        assert_eq!(literal("\"\\uD834\\uDD1E\""), LiteralValue::String("\u{1D11E}".into()));
        assert_eq!(literal("\"a\\tb\""), LiteralValue::String("a\tb".into()));
        assert_eq!(literal("true"), LiteralValue::Bool(true));
        assert_eq!(literal("null"), LiteralValue::Null);
    }

    #[test]
    fn text_blocks() {
        let value = literal("\"\"\"\n    hello\n      world\n    \"\"\"");
        assert_eq!(value, LiteralValue::String("hello\n  world\n".into()));
    }

    #[test]
    fn literal_kinds_differ() {
        assert_ne!(literal("1"), literal("1L"));
    }

    #[test]
    fn oversized_int_is_rejected() {
        let errors = Parser::parse_expression("3000000000").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::InvalidLiteral);
    }

    #[test]
    fn missing_operand() {
        let errors = Parser::parse_expression("a +").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::UnexpectedEof);
    }
}
