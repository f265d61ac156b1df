//! Statement parsing.
//!
//! Local variable declarations are told apart from expression statements by
//! speculatively parsing a type followed by a name.

use std::sync::Arc;

use jtemplate_core::{ParseError, ParseErrorKind};

use super::node::{Container, Name, Padded, Space};
use super::parser::Parser;
use super::stmt::*;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a statement that may appear directly inside a block.
    pub(super) fn parse_block_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Final | TokenKind::At => {
                let prefix = self.take_prefix();
                let modifiers = self.parse_modifiers()?;
                if matches!(self.peek().kind, TokenKind::Class | TokenKind::Interface) {
                    return self.parse_class_decl(prefix, modifiers);
                }
                self.parse_local_vars(prefix, modifiers)
            }
            TokenKind::Class | TokenKind::Interface => {
                let prefix = self.take_prefix();
                self.parse_class_decl(prefix, Vec::new())
            }
            _ if self.is_local_var_decl() => {
                let prefix = self.take_prefix();
                self.parse_local_vars(prefix, Vec::new())
            }
            _ => self.parse_stmt(),
        }
    }

    /// Parse a statement (no declarations).
    pub(super) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Semicolon => {
                let prefix = self.advance();
                Ok(Stmt::new(prefix, StmtKind::Empty))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => {
                let prefix = self.advance();
                let cond = self.parse_paren_cond()?;
                let body = Arc::new(self.parse_stmt()?);
                Ok(Stmt::new(prefix, StmtKind::While(While { cond, body })))
            }
            TokenKind::Do => {
                let prefix = self.advance();
                let body = Arc::new(self.parse_stmt()?);
                let while_kw = self.expect(TokenKind::While)?;
                let cond = self.parse_paren_cond()?;
                let semi = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(
                    prefix,
                    StmtKind::DoWhile(DoWhile {
                        body,
                        while_kw,
                        cond,
                        semi,
                    }),
                ))
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                let prefix = self.advance();
                let expr = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(Arc::new(self.parse_expr(0)?))
                };
                let semi = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(prefix, StmtKind::Return(Return { expr, semi })))
            }
            TokenKind::Throw => {
                let prefix = self.advance();
                let expr = Arc::new(self.parse_expr(0)?);
                let semi = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(prefix, StmtKind::Throw(Throw { expr, semi })))
            }
            TokenKind::Assert => {
                let prefix = self.advance();
                let cond = Arc::new(self.parse_expr(0)?);
                let detail = match self.eat(TokenKind::Colon) {
                    Some(colon) => Some((colon, Arc::new(self.parse_expr(0)?))),
                    None => None,
                };
                let semi = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(prefix, StmtKind::Assert(Assert { cond, detail, semi })))
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = kind == TokenKind::Break;
                let prefix = self.advance();
                let label = if self.check(TokenKind::Identifier) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                let semi = self.expect(TokenKind::Semicolon)?;
                let jump = Jump { label, semi };
                let kind = if is_break {
                    StmtKind::Break(jump)
                } else {
                    StmtKind::Continue(jump)
                };
                Ok(Stmt::new(prefix, kind))
            }
            TokenKind::Eof => Err(self.error_at(ParseErrorKind::UnexpectedEof, "expected statement, found end of input")),
            TokenKind::RightBrace | TokenKind::RightParen | TokenKind::Else => {
                let token = self.peek();
                Err(ParseError::new(
                    ParseErrorKind::ExpectedStatement,
                    token.span,
                    format!("expected statement, found '{}'", token.text),
                ))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    /// `{ stmts }`
    pub(super) fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let prefix = self.expect(TokenKind::LeftBrace)?;
        let block = self.parse_block_rest()?;
        Ok(Stmt::new(prefix, StmtKind::Block(block)))
    }

    /// Statements up to and including the closing `}`.
    pub(super) fn parse_block_rest(&mut self) -> Result<Block, ParseError> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_expected("'}'"));
            }
            stmts.push(Arc::new(self.parse_block_stmt()?));
        }
        let end = self.advance();
        Ok(Block::new(stmts, end))
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let mut expr = self.parse_expr(0)?;
        let prefix = std::mem::take(&mut expr.prefix);
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::new(
            prefix,
            StmtKind::Expr(ExprStmt {
                expr: Arc::new(expr),
                semi,
            }),
        ))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let prefix = self.advance();
        let cond = self.parse_paren_cond()?;
        let then_stmt = Arc::new(self.parse_stmt()?);
        let else_branch = match self.eat(TokenKind::Else) {
            Some(keyword) => Some(Else {
                keyword,
                stmt: Arc::new(self.parse_stmt()?),
            }),
            None => None,
        };
        Ok(Stmt::new(
            prefix,
            StmtKind::If(If {
                cond,
                then_stmt,
                else_branch,
            }),
        ))
    }

    fn parse_paren_cond(&mut self) -> Result<ParenCond, ParseError> {
        let open = self.expect(TokenKind::LeftParen)?;
        let expr = Arc::new(self.parse_expr(0)?);
        let close = self.expect(TokenKind::RightParen)?;
        Ok(ParenCond { open, expr, close })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let prefix = self.advance();
        let open = self.expect(TokenKind::LeftParen)?;

        if self.is_foreach_header() {
            let var_prefix = self.take_prefix();
            let modifiers = self.parse_modifiers()?;
            let type_tree = Some(Arc::new(self.parse_type()?));
            let name = self.expect_ident()?;
            let var = Arc::new(Stmt::new(
                var_prefix,
                StmtKind::Variables(VarDecls {
                    modifiers,
                    type_tree,
                    varargs: None,
                    vars: vec![Padded::new(VarDeclarator::new(name))],
                    semi: None,
                }),
            ));
            let colon = self.expect(TokenKind::Colon)?;
            let iterable = Arc::new(self.parse_expr(0)?);
            let close = self.expect(TokenKind::RightParen)?;
            let body = Arc::new(self.parse_stmt()?);
            return Ok(Stmt::new(
                prefix,
                StmtKind::ForEach(ForEach {
                    open,
                    var,
                    colon,
                    iterable,
                    close,
                    body,
                }),
            ));
        }

        let init = if self.check(TokenKind::Semicolon) {
            let space = self.advance();
            Stmt::new(space, StmtKind::Empty)
        } else if self.check(TokenKind::Final) || self.is_local_var_decl() {
            let var_prefix = self.take_prefix();
            let modifiers = self.parse_modifiers()?;
            self.parse_local_vars(var_prefix, modifiers)?
        } else {
            self.parse_expr_stmt()?
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Arc::new(self.parse_expr(0)?))
        };
        let cond_semi = self.expect(TokenKind::Semicolon)?;
        let update = self.parse_container_rest(TokenKind::RightParen, |p| p.parse_expr(0).map(Arc::new))?;
        let body = Arc::new(self.parse_stmt()?);

        Ok(Stmt::new(
            prefix,
            StmtKind::For(ForLoop {
                open,
                init: Arc::new(init),
                cond,
                cond_semi,
                update,
                body,
            }),
        ))
    }

    fn is_foreach_header(&mut self) -> bool {
        self.lookahead(|p| {
            if p.parse_modifiers().is_err() || p.try_parse_type().is_none() {
                return false;
            }
            p.eat(TokenKind::Identifier).is_some() && p.check(TokenKind::Colon)
        })
    }

    /// Whether the cursor is at `Type name` followed by something only a
    /// declarator can continue with.
    fn is_local_var_decl(&mut self) -> bool {
        if !matches!(self.peek().kind, TokenKind::Identifier) && self.peek().kind.primitive().is_none() {
            return false;
        }
        self.lookahead(|p| {
            if p.try_parse_type().is_none() || p.eat(TokenKind::Identifier).is_none() {
                return false;
            }
            matches!(
                p.peek().kind,
                TokenKind::Equal | TokenKind::Semicolon | TokenKind::Comma | TokenKind::Colon | TokenKind::LeftBracket
            )
        })
    }

    /// `Type a = 1, b;` after the modifiers.
    pub(super) fn parse_local_vars(
        &mut self,
        prefix: Space,
        modifiers: Vec<super::decl::Modifier>,
    ) -> Result<Stmt, ParseError> {
        let type_tree = Arc::new(self.parse_type()?);
        let vars = self.parse_declarators()?;
        let semi = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::new(
            prefix,
            StmtKind::Variables(VarDecls {
                modifiers,
                type_tree: Some(type_tree),
                varargs: None,
                vars,
                semi: Some(semi),
            }),
        ))
    }

    /// `a = 1, b[] = {}`
    pub(super) fn parse_declarators(&mut self) -> Result<Vec<Padded<VarDeclarator>>, ParseError> {
        let first = self.expect_ident()?;
        self.parse_declarators_from(first)
    }

    /// Declarators whose first name has already been consumed.
    pub(super) fn parse_declarators_from(&mut self, first: Name) -> Result<Vec<Padded<VarDeclarator>>, ParseError> {
        let mut vars = Vec::new();
        let mut name = first;
        loop {
            let mut var = VarDeclarator::new(name);
            var.dims = self.parse_dims()?;
            if let Some(eq) = self.eat(TokenKind::Equal) {
                let value = if self.check(TokenKind::LeftBrace) {
                    self.parse_array_init()?
                } else {
                    self.parse_expr(0)?
                };
                var.init = Some(VarInit {
                    eq,
                    value: Arc::new(value),
                });
            }
            match self.eat(TokenKind::Comma) {
                Some(after) => vars.push(Padded { elem: var, after }),
                None => {
                    vars.push(Padded::new(var));
                    break;
                }
            }
            name = self.expect_ident()?;
        }
        Ok(vars)
    }

    /// `[]` pairs after a declarator name.
    fn parse_dims(&mut self) -> Result<Vec<(Space, Space)>, ParseError> {
        let mut dims = Vec::new();
        while self.check(TokenKind::LeftBracket) {
            let open = self.advance();
            let close = self.expect(TokenKind::RightBracket)?;
            dims.push((open, close));
        }
        Ok(dims)
    }

    /// A formal parameter: `final int... xs`.
    pub(super) fn parse_param(&mut self) -> Result<Stmt, ParseError> {
        let prefix = self.take_prefix();
        let modifiers = self.parse_modifiers()?;
        let type_tree = Arc::new(self.parse_type()?);
        let varargs = self.eat(TokenKind::Ellipsis);
        let mut var = VarDeclarator::new(self.expect_ident()?);
        var.dims = self.parse_dims()?;
        Ok(Stmt::new(
            prefix,
            StmtKind::Variables(VarDecls {
                modifiers,
                type_tree: Some(type_tree),
                varargs,
                vars: vec![Padded::new(var)],
                semi: None,
            }),
        ))
    }

    /// `(params)`
    pub(super) fn parse_params(&mut self) -> Result<Params, ParseError> {
        let params: Container<Arc<Stmt>> =
            self.parse_container(TokenKind::LeftParen, TokenKind::RightParen, |p| {
                p.parse_param().map(Arc::new)
            })?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::Print;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Arc<Stmt>> {
        Parser::parse_statements(source).unwrap()
    }

    fn round_trip(source: &str) {
        let printed: String = parse(source).iter().map(|s| s.print()).collect();
        assert_eq!(printed, source);
    }

    #[test]
    fn local_variables_versus_expressions() {
        let stmts = parse("int a = 1; a = 2; List<String> xs; xs.add(\"x\"); a[0] = 1; String[] names = {};");
        let kinds: Vec<_> = stmts.iter().map(|s| s.kind_name()).collect();
        assert_eq!(
            kinds,
            vec![
                "variable declarations",
                "expression statement",
                "variable declarations",
                "expression statement",
                "expression statement",
                "variable declarations",
            ]
        );
        let vars = stmts[0].as_variables().unwrap();
        assert_eq!(vars.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn control_flow_round_trips() {
        round_trip("if (a) { b(); } else c();");
        round_trip("\n  while (i < n) i++;");
        round_trip("do { x--; } while (x > 0);");
        round_trip("for (int i = 0; i < n; i++) { }");
        round_trip("for (;;) break;");
        round_trip("for (final String s : names) print(s);");
        round_trip("return;");
        round_trip("return a ;");
        round_trip("throw new IllegalStateException();");
        round_trip("assert x > 0 : \"positive\";");
        round_trip("continue loop;");
        round_trip("int a, b[], c = 3;");
    }

    #[test]
    fn statement_prefix_is_owned_by_statement() {
        let stmts = parse("\n    foo();");
        assert_eq!(stmts[0].prefix.as_str(), "\n    ");
        let StmtKind::Expr(e) = &stmts[0].kind else {
            panic!("expected expression statement");
        };
        assert!(e.expr.prefix.is_empty());
    }

    #[test]
    fn missing_semicolon() {
        let errors = Parser::parse_statements("foo()").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn unclosed_block() {
        assert!(Parser::parse_statements("{ a();").is_err());
    }
}
