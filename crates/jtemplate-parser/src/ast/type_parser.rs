//! Type parsing: primitive and named types, type arguments, wildcards,
//! array suffixes and type parameter declarations.

use std::sync::Arc;

use jtemplate_core::ParseError;

use super::node::{Container, Padded, Space};
use super::parser::Parser;
use super::types::*;
use crate::lexer::TokenKind;

impl Parser {
    /// Parse a type, including any `[]` suffixes.
    pub(super) fn parse_type(&mut self) -> Result<TypeTree, ParseError> {
        let ty = self.parse_non_array_type()?;
        self.parse_array_suffix(ty)
    }

    /// Wrap `ty` in one array level per `[]` that follows.
    pub(super) fn parse_array_suffix(&mut self, mut ty: TypeTree) -> Result<TypeTree, ParseError> {
        while self.check(TokenKind::LeftBracket) && self.check_nth(1, TokenKind::RightBracket) {
            let open = self.advance();
            let close = self.advance();
            let prefix = std::mem::take(&mut ty.prefix);
            ty = TypeTree::new(
                prefix,
                TypeTreeKind::Array(ArrayType {
                    elem: Arc::new(ty),
                    open,
                    close,
                }),
            );
        }
        Ok(ty)
    }

    /// Parse a primitive or (possibly qualified, possibly parameterized)
    /// class type without array suffixes.
    pub(super) fn parse_non_array_type(&mut self) -> Result<TypeTree, ParseError> {
        let token = self.peek();
        if let Some(primitive) = token.kind.primitive() {
            let prefix = self.advance();
            return Ok(TypeTree::new(prefix, TypeTreeKind::Primitive(primitive)));
        }
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::expected_type(token.span, &token.text));
        }

        let (prefix, first) = self.advance_token();
        let mut name = first.text;
        while self.check(TokenKind::Dot) && self.check_nth(1, TokenKind::Identifier) {
            let dot = self.advance();
            let (space, segment) = self.advance_token();
            name.push_str(dot.as_str());
            name.push('.');
            name.push_str(space.as_str());
            name.push_str(&segment.text);
        }

        let args = if self.check(TokenKind::Less) {
            Some(self.parse_type_args()?)
        } else {
            None
        };

        Ok(TypeTree::new(prefix, TypeTreeKind::Named(NamedType { name, args })))
    }

    /// `<A, ? extends B>`; `<>` is accepted as the diamond.
    pub(super) fn parse_type_args(&mut self) -> Result<Container<Arc<TypeTree>>, ParseError> {
        self.parse_container(TokenKind::Less, TokenKind::Greater, |p| {
            p.parse_type_arg().map(Arc::new)
        })
    }

    fn parse_type_arg(&mut self) -> Result<TypeTree, ParseError> {
        if !self.check(TokenKind::Question) {
            return self.parse_type();
        }
        let prefix = self.advance();
        let kind = match self.peek().kind {
            TokenKind::Extends => Some(BoundKind::Extends),
            TokenKind::Super => Some(BoundKind::Super),
            _ => None,
        };
        let bound = match kind {
            Some(kind) => {
                let keyword = self.advance();
                let bound = Arc::new(self.parse_type()?);
                Some(WildcardBound { kind, keyword, bound })
            }
            None => None,
        };
        Ok(TypeTree::new(prefix, TypeTreeKind::Wildcard(WildcardType { bound })))
    }

    /// `<T, U extends Comparable<U>>`
    pub(super) fn parse_type_params(&mut self) -> Result<Container<Arc<TypeParam>>, ParseError> {
        self.parse_container(TokenKind::Less, TokenKind::Greater, |p| {
            p.parse_type_param().map(Arc::new)
        })
    }

    pub(super) fn parse_type_param(&mut self) -> Result<TypeParam, ParseError> {
        let prefix = self.take_prefix();
        let name = self.expect_ident()?;
        let bounds = if self.check(TokenKind::Extends) {
            let keyword = self.advance();
            let mut types = Vec::new();
            loop {
                let bound = Arc::new(self.parse_type()?);
                match self.eat(TokenKind::Amp) {
                    Some(after) => types.push(Padded { elem: bound, after }),
                    None => {
                        types.push(Padded::new(bound));
                        break;
                    }
                }
            }
            Some(TypeBounds { keyword, types })
        } else {
            None
        };
        Ok(TypeParam::new(prefix, name.text, bounds))
    }

    /// Try to parse a type without committing to it.
    pub(super) fn try_parse_type(&mut self) -> Option<TypeTree> {
        let checkpoint = self.checkpoint();
        match self.parse_type() {
            Ok(ty) => Some(ty),
            Err(_) => {
                self.restore(checkpoint);
                None
            }
        }
    }

    /// Parse `open elem, elem close`, recording the whitespace around every
    /// delimiter.
    pub(super) fn parse_container<T>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        f: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Container<T>, ParseError> {
        let before = self.expect(open)?;
        let mut container = self.parse_container_rest(close, f)?;
        container.before = before;
        Ok(container)
    }

    /// The elements and closing delimiter of a list whose opening delimiter
    /// has been consumed.
    pub(super) fn parse_container_rest<T>(
        &mut self,
        close: TokenKind,
        mut f: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Container<T>, ParseError> {
        if self.check(close) {
            let close = self.advance();
            return Ok(Container {
                before: Space::empty(),
                elems: Vec::new(),
                close,
            });
        }

        let mut elems = Vec::new();
        loop {
            let elem = f(self)?;
            if let Some(after) = self.eat(TokenKind::Comma) {
                elems.push(Padded { elem, after });
                continue;
            }
            let after = self.expect(close)?;
            elems.push(Padded { elem, after });
            break;
        }
        Ok(Container {
            before: Space::empty(),
            elems,
            close: Space::empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::printer::Print;
    use crate::ast::*;

    fn round_trip(source: &str) {
        let ty = Parser::parse_type_str(source).unwrap();
        assert_eq!(ty.print(), source);
    }

    #[test]
    fn primitive_and_named() {
        let ty = Parser::parse_type_str("int").unwrap();
        assert!(matches!(ty.kind, TypeTreeKind::Primitive(jtemplate_core::PrimitiveKind::Int)));
        let ty = Parser::parse_type_str("java.util.List").unwrap();
        assert_eq!(ty.name(), Some("java.util.List"));
    }

    #[test]
    fn nested_generics_close_separately() {
        round_trip("Map<String, List<Integer>>");
        round_trip("Map< K ,V >");
        let ty = Parser::parse_type_str("List<List<String>>").unwrap();
        let TypeTreeKind::Named(named) = &ty.kind else {
            panic!("expected named type");
        };
        assert_eq!(named.args.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn wildcards_and_arrays() {
        round_trip("List<? extends Number>");
        round_trip("Comparator<? super T>");
        round_trip("Class<?>");
        round_trip("String [][]");
        let ty = Parser::parse_type_str("int[]").unwrap();
        assert!(matches!(ty.kind, TypeTreeKind::Array(_)));
    }

    #[test]
    fn type_parameter_bounds() {
        let param = Parser::parse_type_parameter("T extends Number & Comparable<T>").unwrap();
        assert_eq!(param.name, "T");
        assert_eq!(param.bound_types().count(), 2);
        assert_eq!(param.print(), "T extends Number & Comparable<T>");
    }

    #[test]
    fn not_a_type() {
        assert!(Parser::parse_type_str("1").is_err());
    }
}
