//! Main lexer implementation.
//!
//! The [`Lexer`] converts Java source text into a vector of [`Token`]s. It
//! dispatches on the first character of each token. Whitespace and comments
//! are not discarded: they are attached to the following token as its prefix
//! so the token stream can be printed back byte-for-byte.

use jtemplate_core::{LexError, Span};

use super::cursor::{is_ident_continue, is_ident_start, Cursor};
use super::token::{lookup_keyword, Token, TokenKind};

/// Lexer for Java source code.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole input. The last token is always [`TokenKind::Eof`],
    /// whose prefix is the trailing trivia of the source.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<LexError>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        if self.errors.is_empty() {
            Ok(tokens)
        } else {
            Err(self.errors)
        }
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token {
        let prefix = self.scan_trivia();

        let start = self.position();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, "", prefix, Span::point(start.0, start.1, start.2));
        };

        let kind = match c {
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(start),
            c if is_ident_start(c) => {
                let ident = self.cursor.eat_while(is_ident_continue);
                Ok(lookup_keyword(ident).unwrap_or(TokenKind::Identifier))
            }
            _ => self.scan_operator(start),
        };

        match kind {
            Ok(kind) => self.make_token(kind, prefix, start),
            Err(error) => {
                self.errors.push(error);
                let text = self.cursor.slice_from(start.0).to_string();
                Token::new(TokenKind::Error, text, prefix, self.span_from(start))
            }
        }
    }

    fn position(&self) -> (u32, u32, u32) {
        (self.cursor.offset(), self.cursor.line(), self.cursor.column())
    }

    fn span_from(&self, start: (u32, u32, u32)) -> Span {
        Span::new(start.0, start.1, start.2, self.cursor.offset() - start.0)
    }

    fn make_token(&self, kind: TokenKind, prefix: String, start: (u32, u32, u32)) -> Token {
        let text = self.cursor.slice_from(start.0);
        Token::new(kind, text, prefix, self.span_from(start))
    }

    // =========================================
    // Scanning: Trivia
    // =========================================

    /// Collect whitespace and comments preceding the next token.
    fn scan_trivia(&mut self) -> String {
        let start = self.cursor.offset();
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_nth(1) == Some('/') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.peek_nth(1) == Some('*') => {
                    let comment_start = self.position();
                    self.cursor.advance_n(2);
                    loop {
                        if self.cursor.is_eof() {
                            self.errors.push(LexError::UnterminatedComment {
                                span: self.span_from(comment_start),
                            });
                            break;
                        }
                        if self.cursor.check_str("*/") {
                            self.cursor.advance_n(2);
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
        self.cursor.slice_from(start).to_string()
    }

    // =========================================
    // Scanning: Strings and characters
    // =========================================

    fn scan_string(&mut self, start: (u32, u32, u32)) -> Result<TokenKind, LexError> {
        if self.cursor.check_str("\"\"\"") {
            self.cursor.advance_n(3);
            loop {
                if self.cursor.is_eof() {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                if self.cursor.check_str("\"\"\"") {
                    self.cursor.advance_n(3);
                    return Ok(TokenKind::StringLiteral);
                }
                if self.cursor.advance() == Some('\\') {
                    self.cursor.advance();
                }
            }
        }

        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString {
                        span: self.span_from(start),
                    });
                }
                Some('\\') => {
                    self.cursor.advance_n(2);
                }
                Some('"') => {
                    self.cursor.advance();
                    return Ok(TokenKind::StringLiteral);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_char(&mut self, start: (u32, u32, u32)) -> Result<TokenKind, LexError> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedChar {
                        span: self.span_from(start),
                    });
                }
                Some('\\') => {
                    self.cursor.advance_n(2);
                }
                Some('\'') => {
                    self.cursor.advance();
                    return Ok(TokenKind::CharLiteral);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    fn scan_number(&mut self, start: (u32, u32, u32)) -> Result<TokenKind, LexError> {
        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.advance_n(2);
                let digits = self.cursor.eat_while(|c| c == '_' || c.is_digit(radix));
                if digits.is_empty() {
                    return Err(LexError::InvalidNumber {
                        span: self.span_from(start),
                        detail: "expected digits after radix prefix".into(),
                    });
                }
                return Ok(self.integer_suffix());
            }
        }

        self.consume_decimal_digits();
        let mut is_float = false;

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.consume_decimal_digits();
            is_float = true;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if self.consume_decimal_digits().is_empty() {
                return Err(LexError::InvalidNumber {
                    span: self.span_from(start),
                    detail: "missing exponent digits".into(),
                });
            }
            is_float = true;
        }

        match self.cursor.peek() {
            Some('f' | 'F') => {
                self.cursor.advance();
                Ok(TokenKind::FloatLiteral)
            }
            Some('d' | 'D') => {
                self.cursor.advance();
                Ok(TokenKind::DoubleLiteral)
            }
            _ if is_float => Ok(TokenKind::DoubleLiteral),
            _ => Ok(self.integer_suffix()),
        }
    }

    fn integer_suffix(&mut self) -> TokenKind {
        if self.cursor.eat('L') || self.cursor.eat('l') {
            TokenKind::LongLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn consume_decimal_digits(&mut self) -> &'src str {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_')
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    fn scan_operator(&mut self, start: (u32, u32, u32)) -> Result<TokenKind, LexError> {
        let Some(c) = self.cursor.advance() else {
            return Ok(TokenKind::Eof);
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (';', _) => TokenKind::Semicolon,
            (',', _) => TokenKind::Comma,
            ('~', _) => TokenKind::Tilde,
            ('?', _) => TokenKind::Question,
            ('@', _) => TokenKind::At,

            ('.', Some('.')) if self.cursor.peek_nth(1) == Some('.') => {
                self.cursor.advance_n(2);
                TokenKind::Ellipsis
            }
            ('.', _) => TokenKind::Dot,

            (':', Some(':')) => { self.cursor.advance(); TokenKind::ColonColon }
            (':', _) => TokenKind::Colon,

            ('+', Some('+')) => { self.cursor.advance(); TokenKind::PlusPlus }
            ('+', Some('=')) => { self.cursor.advance(); TokenKind::PlusEqual }
            ('+', _) => TokenKind::Plus,

            ('-', Some('-')) => { self.cursor.advance(); TokenKind::MinusMinus }
            ('-', Some('=')) => { self.cursor.advance(); TokenKind::MinusEqual }
            ('-', Some('>')) => { self.cursor.advance(); TokenKind::Arrow }
            ('-', _) => TokenKind::Minus,

            ('*', Some('=')) => { self.cursor.advance(); TokenKind::StarEqual }
            ('*', _) => TokenKind::Star,

            ('/', Some('=')) => { self.cursor.advance(); TokenKind::SlashEqual }
            ('/', _) => TokenKind::Slash,

            ('%', Some('=')) => { self.cursor.advance(); TokenKind::PercentEqual }
            ('%', _) => TokenKind::Percent,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => { self.cursor.advance(); TokenKind::LessEqual }
            ('<', Some('<')) => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::LessLessEqual
                } else {
                    TokenKind::LessLess
                }
            }
            ('<', _) => TokenKind::Less,

            // `>>` and `>>>` stay split so `List<List<T>>` closes both lists.
            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GreaterEqual }
            ('>', _) => TokenKind::Greater,

            ('&', Some('=')) => { self.cursor.advance(); TokenKind::AmpEqual }
            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AmpAmp }
            ('&', _) => TokenKind::Amp,

            ('|', Some('=')) => { self.cursor.advance(); TokenKind::PipeEqual }
            ('|', Some('|')) => { self.cursor.advance(); TokenKind::PipePipe }
            ('|', _) => TokenKind::Pipe,

            ('^', Some('=')) => { self.cursor.advance(); TokenKind::CaretEqual }
            ('^', _) => TokenKind::Caret,

            _ => {
                return Err(LexError::UnexpectedChar {
                    ch: c,
                    span: self.span_from(start),
                });
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn empty_source() {
        let tokens = Lexer::new("").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn trivia_is_preserved() {
        let source = "  // lead\n int /* mid */ x ;\n";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let printed: String = tokens.iter().map(|t| format!("{}{}", t.prefix, t.text)).collect();
        assert_eq!(printed, source);
        assert_eq!(tokens[0].prefix, "  // lead\n ");
        assert_eq!(tokens[1].prefix, " /* mid */ ");
        assert_eq!(tokens.last().unwrap().prefix, "\n");
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            token_kinds("class Foo extends $bar_1"),
            vec![
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Extends,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn integer_literals() {
        assert_eq!(
            tokenize("42 0x2A 0b101 1_000 2L 017"),
            vec![
                (TokenKind::IntLiteral, "42".to_string()),
                (TokenKind::IntLiteral, "0x2A".to_string()),
                (TokenKind::IntLiteral, "0b101".to_string()),
                (TokenKind::IntLiteral, "1_000".to_string()),
                (TokenKind::LongLiteral, "2L".to_string()),
                (TokenKind::IntLiteral, "017".to_string()),
            ]
        );
    }

    #[test]
    fn floating_literals() {
        assert_eq!(
            tokenize("2.5 3.5f 1e10 2d .5"),
            vec![
                (TokenKind::DoubleLiteral, "2.5".to_string()),
                (TokenKind::FloatLiteral, "3.5f".to_string()),
                (TokenKind::DoubleLiteral, "1e10".to_string()),
                (TokenKind::DoubleLiteral, "2d".to_string()),
                (TokenKind::DoubleLiteral, ".5".to_string()),
            ]
        );
    }

    #[test]
    fn char_and_string_literals() {
        assert_eq!(
            tokenize(r#"'c' '\'' "a\"b""#),
            vec![
                (TokenKind::CharLiteral, "'c'".to_string()),
                (TokenKind::CharLiteral, r"'\''".to_string()),
                (TokenKind::StringLiteral, r#""a\"b""#.to_string()),
            ]
        );
    }

    #[test]
    fn greater_is_never_joined() {
        assert_eq!(
            token_kinds("a >>= b >> c >= d"),
            vec![
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::Greater,
                TokenKind::Identifier,
                TokenKind::GreaterEqual,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn lambda_and_method_ref_tokens() {
        assert_eq!(
            token_kinds("x -> String::valueOf"),
            vec![
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::ColonColon,
                TokenKind::Identifier,
            ]
        );
        assert_eq!(token_kinds("String... args")[1], TokenKind::Ellipsis);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let errors = Lexer::new("\"abc").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let errors = Lexer::new("int x; /* open").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn unexpected_character() {
        let errors = Lexer::new("int # x").tokenize().unwrap_err();
        assert!(matches!(errors[0], LexError::UnexpectedChar { ch: '#', .. }));
    }

    #[test]
    fn spans_track_lines() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
        assert_eq!(tokens[1].span.offset, 4);
    }
}
