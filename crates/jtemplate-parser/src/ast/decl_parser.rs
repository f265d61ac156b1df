//! Declaration parsing: compilation units, imports, classes, members,
//! modifiers and annotations.

use std::sync::Arc;

use jtemplate_core::{ParseError, ParseErrorKind};

use super::decl::*;
use super::node::{Name, Padded, Space};
use super::parser::Parser;
use super::stmt::{Block, Stmt, StmtKind, VarDecls};
use crate::lexer::TokenKind;

fn modifier_kind(kind: TokenKind) -> Option<ModifierKind> {
    Some(match kind {
        TokenKind::Public => ModifierKind::Public,
        TokenKind::Protected => ModifierKind::Protected,
        TokenKind::Private => ModifierKind::Private,
        TokenKind::Static => ModifierKind::Static,
        TokenKind::Final => ModifierKind::Final,
        TokenKind::Abstract => ModifierKind::Abstract,
        TokenKind::Native => ModifierKind::Native,
        TokenKind::Synchronized => ModifierKind::Synchronized,
        TokenKind::Transient => ModifierKind::Transient,
        TokenKind::Volatile => ModifierKind::Volatile,
        TokenKind::Strictfp => ModifierKind::Strictfp,
        TokenKind::Default => ModifierKind::Default,
        _ => return None,
    })
}

impl Parser {
    pub(super) fn compilation_unit(&mut self) -> Result<CompilationUnit, ParseError> {
        let package = if self.check(TokenKind::Package) {
            let prefix = self.advance();
            let name = self.parse_qualified_name(false)?;
            let semi = self.expect(TokenKind::Semicolon)?;
            Some(Package { prefix, name, semi })
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            let prefix = self.advance();
            let is_static = self.eat(TokenKind::Static);
            let name = self.parse_qualified_name(true)?;
            let semi = self.expect(TokenKind::Semicolon)?;
            imports.push(Arc::new(Import {
                id: super::node::NodeId::next(),
                prefix,
                is_static,
                name,
                semi,
            }));
        }

        let mut types = Vec::new();
        while !self.check(TokenKind::Eof) {
            let prefix = self.take_prefix();
            let modifiers = self.parse_modifiers()?;
            if !matches!(self.peek().kind, TokenKind::Class | TokenKind::Interface) {
                let token = self.peek();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedDeclaration,
                    token.span,
                    format!("expected class or interface, found '{}'", token.text),
                ));
            }
            types.push(Arc::new(self.parse_class_decl(prefix, modifiers)?));
        }

        Ok(CompilationUnit {
            id: super::node::NodeId::next(),
            package,
            imports,
            types,
            eof: self.eof_space(),
        })
    }

    /// `a.b.c`, optionally ending in `.*`.
    fn parse_qualified_name(&mut self, allow_star: bool) -> Result<Name, ParseError> {
        let first = self.expect_ident()?;
        let mut text = first.text;
        while self.check(TokenKind::Dot) {
            let next = self.peek_nth(1).kind;
            if next != TokenKind::Identifier && !(allow_star && next == TokenKind::Star) {
                break;
            }
            let dot = self.advance();
            let (space, token) = self.advance_token();
            text.push_str(dot.as_str());
            text.push('.');
            text.push_str(space.as_str());
            text.push_str(&token.text);
            if token.kind == TokenKind::Star {
                break;
            }
        }
        Ok(Name::new(first.prefix, text))
    }

    /// Annotations and modifier keywords in source order.
    pub(super) fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, ParseError> {
        let mut modifiers = Vec::new();
        loop {
            let kind = self.peek().kind;
            if kind == TokenKind::At && !self.check_nth(1, TokenKind::Interface) {
                modifiers.push(Modifier::Annotation(Arc::new(self.parse_annotation()?)));
                continue;
            }
            // `static {` starts an initializer, not a modifier list.
            if kind == TokenKind::Static && self.check_nth(1, TokenKind::LeftBrace) {
                break;
            }
            match modifier_kind(kind) {
                Some(kind) => {
                    let prefix = self.advance();
                    modifiers.push(Modifier::Keyword(KeywordModifier { prefix, kind }));
                }
                None => break,
            }
        }
        Ok(modifiers)
    }

    /// `@Name`, `@Name(value)`, `@Name(key = value, ...)`
    pub(super) fn parse_annotation(&mut self) -> Result<Annotation, ParseError> {
        let prefix = self.expect(TokenKind::At)?;
        let name = self.parse_qualified_name(false)?;
        let args = if self.check(TokenKind::LeftParen) {
            Some(self.parse_args()?)
        } else {
            None
        };
        let mut name_text = name.prefix.as_str().to_string();
        name_text.push_str(&name.text);
        Ok(Annotation::new(prefix, name_text, args))
    }

    /// A class or interface declaration after its modifiers.
    pub(super) fn parse_class_decl(&mut self, prefix: Space, modifiers: Vec<Modifier>) -> Result<Stmt, ParseError> {
        let kind = match self.peek().kind {
            TokenKind::Class => ClassKind::Class,
            TokenKind::Interface => ClassKind::Interface,
            _ => return Err(self.error_expected("'class' or 'interface'")),
        };
        let keyword = self.advance();
        let name = self.expect_ident()?;
        let type_params = if self.check(TokenKind::Less) {
            Some(self.parse_type_params()?)
        } else {
            None
        };
        let extends = if self.check(TokenKind::Extends) {
            Some(self.parse_type_list_clause()?)
        } else {
            None
        };
        let implements = if self.check(TokenKind::Implements) {
            Some(self.parse_type_list_clause()?)
        } else {
            None
        };
        let body = Arc::new(self.parse_class_body(Some(&name.text))?);

        Ok(Stmt::new(
            prefix,
            StmtKind::Class(ClassDecl {
                modifiers,
                keyword,
                kind,
                name,
                type_params,
                extends,
                implements,
                body,
                ty: None,
            }),
        ))
    }

    /// `extends A, B` / `implements A` / `throws A, B`, starting at the keyword.
    fn parse_type_list_clause(&mut self) -> Result<TypeList, ParseError> {
        let keyword = self.advance();
        let mut types = Vec::new();
        loop {
            let ty = Arc::new(self.parse_type()?);
            match self.eat(TokenKind::Comma) {
                Some(after) => types.push(Padded { elem: ty, after }),
                None => {
                    types.push(Padded::new(ty));
                    break;
                }
            }
        }
        Ok(TypeList { keyword, types })
    }

    /// `{ members }` of a class, interface or anonymous class.
    pub(super) fn parse_class_body(&mut self, class_name: Option<&str>) -> Result<Stmt, ParseError> {
        let prefix = self.expect(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_expected("'}'"));
            }
            members.push(Arc::new(self.parse_member(class_name)?));
        }
        let end = self.advance();
        Ok(Stmt::new(prefix, StmtKind::Block(Block::new(members, end))))
    }

    /// A field, method, constructor, initializer or nested type.
    pub(super) fn parse_member(&mut self, class_name: Option<&str>) -> Result<Stmt, ParseError> {
        let prefix = self.take_prefix();

        let kind = self.peek().kind;
        match kind {
            TokenKind::Semicolon => {
                self.advance();
                return Ok(Stmt::new(prefix, StmtKind::Empty));
            }
            TokenKind::LeftBrace => {
                self.advance();
                let block = self.parse_block_rest()?;
                return Ok(Stmt::new(prefix, StmtKind::Block(block)));
            }
            TokenKind::Static if self.check_nth(1, TokenKind::LeftBrace) => {
                self.advance();
                let brace = self.advance();
                let mut block = self.parse_block_rest()?;
                block.static_init = Some(brace);
                return Ok(Stmt::new(prefix, StmtKind::Block(block)));
            }
            _ => {}
        }

        let modifiers = self.parse_modifiers()?;
        if matches!(self.peek().kind, TokenKind::Class | TokenKind::Interface) {
            return self.parse_class_decl(prefix, modifiers);
        }

        let type_params = if self.check(TokenKind::Less) {
            Some(self.parse_type_params()?)
        } else {
            None
        };

        let is_constructor = self.check(TokenKind::Identifier)
            && self.check_nth(1, TokenKind::LeftParen)
            && class_name.is_none_or(|c| c == self.peek().text);
        let return_type = if is_constructor {
            None
        } else {
            Some(Arc::new(self.parse_type()?))
        };
        let name = self.expect_ident()?;

        if !self.check(TokenKind::LeftParen) {
            let Some(type_tree) = return_type else {
                return Err(self.error_expected("'('"));
            };
            if type_params.is_some() {
                return Err(self.error_expected("'('"));
            }
            return self.parse_field_rest(prefix, modifiers, type_tree, name);
        }

        let params = self.parse_params()?;
        let throws = if self.check(TokenKind::Throws) {
            Some(self.parse_type_list_clause()?)
        } else {
            None
        };
        let (body, semi) = if self.check(TokenKind::LeftBrace) {
            (Some(Arc::new(self.parse_block()?)), None)
        } else {
            (None, Some(self.expect(TokenKind::Semicolon)?))
        };

        Ok(Stmt::new(
            prefix,
            StmtKind::Method(MethodDecl {
                modifiers,
                type_params,
                return_type,
                name,
                params,
                throws,
                body,
                semi,
                method_type: None,
            }),
        ))
    }

    /// The declarators of a field whose type and first name were consumed.
    fn parse_field_rest(
        &mut self,
        prefix: Space,
        modifiers: Vec<Modifier>,
        type_tree: Arc<super::types::TypeTree>,
        name: Name,
    ) -> Result<Stmt, ParseError> {
        let vars = self.parse_declarators_from(name)?;
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::printer::Print;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"package com.example;

import java.util.List;
import static java.util.Collections.*;

@Deprecated
public class Greeter<T extends Comparable<T>> extends Base implements Runnable, Cloneable {
    private static final String NAME = "x", OTHER;
    static { init(); }

    public Greeter(String name) { super(); }

    @Override
    public void run() throws Exception {
        for (String s : List.of("a")) {
            System.out.println(s);
        }
    }

    abstract <R> R map(java.util.function.Function<T, R> f);

    interface Inner { void f(); }
}
"#;

    #[test]
    fn compilation_unit_round_trips() {
        let unit = Parser::parse_compilation_unit(SOURCE).unwrap();
        assert_eq!(unit.print(), SOURCE);
    }

    #[test]
    fn compilation_unit_structure() {
        let unit = Parser::parse_compilation_unit(SOURCE).unwrap();
        assert_eq!(unit.package_name(), Some("com.example"));
        assert_eq!(unit.imports.len(), 2);
        assert!(unit.imports[1].is_static());
        assert!(unit.imports[1].is_on_demand());

        let class = unit.classes().next().unwrap();
        assert_eq!(class.name.text, "Greeter");
        assert_eq!(annotations(&class.modifiers).count(), 1);
        assert!(class.flags().contains(Modifiers::PUBLIC));

        let kinds: Vec<_> = class.members().iter().map(|m| m.kind_name()).collect();
        assert_eq!(
            kinds,
            vec![
                "variable declarations",
                "block",
                "method declaration",
                "method declaration",
                "method declaration",
                "class declaration",
            ]
        );
        let constructor = class.members()[2].as_method().unwrap();
        assert!(constructor.is_constructor());
        let generic = class.members()[4].as_method().unwrap();
        assert!(generic.type_params.is_some());
        assert!(generic.body.is_none());
    }

    #[test]
    fn members_keep_their_indentation() {
        let members = Parser::parse_members("\n    int x;\n    void f() {}").unwrap();
        assert_eq!(members[0].prefix.as_str(), "\n    ");
        assert_eq!(members[1].prefix.as_str(), "\n    ");
    }

    #[test]
    fn annotations_with_arguments() {
        let annotations = Parser::parse_annotations("@SuppressWarnings(\"unchecked\") @Named(value = \"a\")").unwrap();
        assert_eq!(annotations[0].name, "SuppressWarnings");
        assert_eq!(annotations[1].args.as_ref().unwrap().len(), 1);
        assert_eq!(annotations[1].prefix.as_str(), " ");
    }

    #[test]
    fn top_level_statement_is_rejected() {
        let errors = Parser::parse_compilation_unit("int x;").unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ParseErrorKind::ExpectedDeclaration);
    }
}
