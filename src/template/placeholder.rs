//! Placeholder syntax.
//!
//! A template is plain Java text with holes:
//!
//! | Syntax                     | Meaning                                        |
//! |----------------------------|------------------------------------------------|
//! | `#{}`                      | positional, untyped                            |
//! | `#{name}`                  | named, untyped; a back-reference once declared |
//! | `#{any(T)}`                | positional, value assignable to `T`            |
//! | `#{name:any(T)}`           | named, value assignable to `T`                 |
//! | `#{anyArray(T)}`           | value assignable to `T[]`                      |
//! | `#{literal}`, `#{literal(T)}` | a literal (optionally of type `T`)          |

use std::sync::Arc;

use jtemplate_core::TemplateSyntaxError;
use jtemplate_parser::Parser;
use jtemplate_parser::ast::TypeTree;
use jtemplate_parser::lexer::{is_ident_continue, is_ident_start, lookup_keyword};

/// What a placeholder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Any,
    AnyArray,
    Literal,
}

impl PlaceholderKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "any" => Some(PlaceholderKind::Any),
            "anyArray" => Some(PlaceholderKind::AnyArray),
            "literal" => Some(PlaceholderKind::Literal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::Any => "any",
            PlaceholderKind::AnyArray => "anyArray",
            PlaceholderKind::Literal => "literal",
        }
    }
}

/// One declared hole. Back-references do not create new placeholders.
#[derive(Debug, Clone)]
pub struct Placeholder {
    pub name: Option<String>,
    pub kind: PlaceholderKind,
    /// The type constraint as written; `None` when untyped.
    pub constraint: Option<Arc<TypeTree>>,
    /// Byte offset of the `#{` that declared it.
    pub offset: usize,
}

impl Placeholder {
    /// Identifier the hole is replaced with in the parsed snippet.
    pub fn stub_name(index: usize) -> String {
        format!("__p{index}__")
    }

    /// Placeholder index of a stub identifier.
    pub fn stub_index(ident: &str) -> Option<usize> {
        ident.strip_prefix("__p")?.strip_suffix("__")?.parse().ok()
    }
}

/// A piece of template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Refers to `placeholders[index]`.
    Hole(usize),
}

/// The result of scanning a template string.
#[derive(Debug, Clone, Default)]
pub struct Scanned {
    pub segments: Vec<Segment>,
    pub placeholders: Vec<Placeholder>,
}

impl Scanned {
    /// Template text with every hole replaced by `hole(index)`.
    pub fn render(&self, mut hole: impl FnMut(usize) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Hole(index) => out.push_str(&hole(*index)),
            }
        }
        out
    }
}

/// Split `source` into text and placeholder segments.
pub fn scan(source: &str) -> Result<Scanned, TemplateSyntaxError> {
    let mut scanned = Scanned::default();
    let mut text = String::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("#{") {
        text.push_str(&rest[..start]);
        let hole_offset = offset + start;
        let body_start = start + 2;
        let body_len = placeholder_len(&rest[body_start..], hole_offset)?;
        let body = &rest[body_start..body_start + body_len];

        if !text.is_empty() {
            scanned.segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        let index = declare(&mut scanned.placeholders, body, hole_offset)?;
        scanned.segments.push(Segment::Hole(index));

        let consumed = body_start + body_len + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    text.push_str(rest);
    if !text.is_empty() {
        scanned.segments.push(Segment::Text(text));
    }
    Ok(scanned)
}

/// Length of a placeholder body up to its closing `}`.
fn placeholder_len(body: &str, offset: usize) -> Result<usize, TemplateSyntaxError> {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(TemplateSyntaxError::UnbalancedParentheses { offset })?;
            }
            '}' if depth == 0 => return Ok(i),
            '}' => return Err(TemplateSyntaxError::UnbalancedParentheses { offset }),
            _ => {}
        }
    }
    Err(TemplateSyntaxError::UnterminatedPlaceholder { offset })
}

/// Record one placeholder occurrence and return its index.
fn declare(placeholders: &mut Vec<Placeholder>, body: &str, offset: usize) -> Result<usize, TemplateSyntaxError> {
    let body = body.trim();
    let existing = |name: &str| placeholders.iter().position(|p| p.name.as_deref() == Some(name));

    let (name, spec) = match body.split_once(':') {
        Some((name, spec)) => (Some(name.trim()), spec.trim()),
        None if body.is_empty() => (None, ""),
        None if body.contains('(') || PlaceholderKind::from_keyword(body).is_some() => (None, body),
        None => {
            // `#{name}`: back-reference or untyped named hole.
            check_name(body, offset)?;
            if let Some(index) = existing(body) {
                return Ok(index);
            }
            placeholders.push(Placeholder {
                name: Some(body.to_string()),
                kind: PlaceholderKind::Any,
                constraint: None,
                offset,
            });
            return Ok(placeholders.len() - 1);
        }
    };

    if let Some(name) = name {
        check_name(name, offset)?;
        if existing(name).is_some() {
            return Err(TemplateSyntaxError::DuplicatePlaceholder {
                name: name.to_string(),
                offset,
            });
        }
    }

    let (kind, constraint) = if spec.is_empty() {
        (PlaceholderKind::Any, None)
    } else {
        parse_spec(spec, offset)?
    };
    placeholders.push(Placeholder {
        name: name.map(str::to_string),
        kind,
        constraint,
        offset,
    });
    Ok(placeholders.len() - 1)
}

fn kind_keyword(spec: &str) -> &str {
    spec.split('(').next().unwrap_or(spec).trim()
}

/// `kind` or `kind(constraint)`.
fn parse_spec(spec: &str, offset: usize) -> Result<(PlaceholderKind, Option<Arc<TypeTree>>), TemplateSyntaxError> {
    let keyword = kind_keyword(spec);
    let kind = PlaceholderKind::from_keyword(keyword).ok_or_else(|| TemplateSyntaxError::UnknownPlaceholderKind {
        keyword: keyword.to_string(),
        offset,
    })?;
    let Some(open) = spec.find('(') else {
        return Ok((kind, None));
    };
    let inner = spec[open + 1..]
        .strip_suffix(')')
        .ok_or(TemplateSyntaxError::UnbalancedParentheses { offset })?
        .trim();
    if inner.is_empty() {
        return Ok((kind, None));
    }
    let constraint = Parser::parse_type_str(inner).map_err(|errors| TemplateSyntaxError::InvalidConstraint {
        text: inner.to_string(),
        errors,
    })?;
    Ok((kind, Some(constraint)))
}

fn check_name(name: &str, offset: usize) -> Result<(), TemplateSyntaxError> {
    if is_java_identifier(name) {
        Ok(())
    } else {
        Err(TemplateSyntaxError::InvalidPlaceholderName {
            name: name.to_string(),
            offset,
        })
    }
}

pub(crate) fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue) && lookup_keyword(name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_parser::ast::print_trimmed;

    fn constraint(p: &Placeholder) -> String {
        let tree = p.constraint.as_ref().unwrap();
        print_trimmed(tree, &tree.prefix)
    }

    #[test]
    fn positional_and_typed_holes() {
        let scanned = scan("#{any(java.lang.StringBuilder)}.append(#{any(int)})").unwrap();
        assert_eq!(scanned.placeholders.len(), 2);
        assert_eq!(constraint(&scanned.placeholders[0]), "java.lang.StringBuilder");
        assert_eq!(constraint(&scanned.placeholders[1]), "int");
        assert_eq!(
            scanned.segments,
            vec![
                Segment::Hole(0),
                Segment::Text(".append(".into()),
                Segment::Hole(1),
                Segment::Text(")".into()),
            ]
        );
        assert_eq!(scanned.render(Placeholder::stub_name), "__p0__.append(__p1__)");
    }

    #[test]
    fn named_holes_and_back_references() {
        let scanned = scan("#{a:any(int)} + #{b} + #{a} + #{}").unwrap();
        assert_eq!(scanned.placeholders.len(), 3);
        assert_eq!(scanned.placeholders[0].name.as_deref(), Some("a"));
        assert_eq!(scanned.placeholders[1].name.as_deref(), Some("b"));
        assert!(scanned.placeholders[1].constraint.is_none());
        assert_eq!(scanned.placeholders[2].name, None);
        assert_eq!(scanned.render(Placeholder::stub_name), "__p0__ + __p1__ + __p0__ + __p2__");
    }

    #[test]
    fn kinds_without_constraint() {
        let scanned = scan("#{literal} #{anyArray(String)} #{any}").unwrap();
        let kinds: Vec<_> = scanned.placeholders.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![PlaceholderKind::Literal, PlaceholderKind::AnyArray, PlaceholderKind::Any]
        );
        assert!(scanned.placeholders[2].constraint.is_none());
    }

    #[test]
    fn generic_constraints_keep_nested_parentheses_balanced() {
        let scanned = scan("foo(#{x:any(java.util.List<? extends T>)})").unwrap();
        assert_eq!(constraint(&scanned.placeholders[0]), "java.util.List<? extends T>");
    }

    #[test]
    fn malformed_placeholders() {
        assert_eq!(
            scan("a + #{any(int)").unwrap_err(),
            TemplateSyntaxError::UnterminatedPlaceholder { offset: 4 }
        );
        assert_eq!(
            scan("#{any(int}").unwrap_err(),
            TemplateSyntaxError::UnbalancedParentheses { offset: 0 }
        );
        assert!(matches!(
            scan("#{some(int)}").unwrap_err(),
            TemplateSyntaxError::UnknownPlaceholderKind { keyword, .. } if keyword == "some"
        ));
        assert!(matches!(
            scan("#{1x:any(int)}").unwrap_err(),
            TemplateSyntaxError::InvalidPlaceholderName { name, .. } if name == "1x"
        ));
        assert!(matches!(
            scan("#{a:any(int)} #{a:any(long)}").unwrap_err(),
            TemplateSyntaxError::DuplicatePlaceholder { name, offset: 14 } if name == "a"
        ));
        assert!(matches!(
            scan("#{any(int int)}").unwrap_err(),
            TemplateSyntaxError::InvalidConstraint { text, .. } if text == "int int"
        ));
    }

    #[test]
    fn stub_names_round_trip() {
        assert_eq!(Placeholder::stub_index(&Placeholder::stub_name(12)), Some(12));
        assert_eq!(Placeholder::stub_index("p1"), None);
    }
}
