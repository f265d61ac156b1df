//! Java source parser.
//!
//! This crate provides the lexer and parser for the Java subset that code
//! templates are written in. It includes:
//! - Lossless lexical analysis (every token keeps the whitespace and comments
//!   before it)
//! - Abstract Syntax Tree (AST) definitions
//! - Fragment parsers for expressions, statements, members, types and more
//! - Printing back to source, byte-for-byte for unmodified trees
//! - Visitor and fold traversals
//!
//! # Example
//!
//! ```
//! use jtemplate_parser::Parser;
//! use jtemplate_parser::ast::printer::Print;
//!
//! let source = r#"
//! class Greeter {
//!     String greet(String name) {
//!         return "Hello, " + name;
//!     }
//! }
//! "#;
//!
//! let unit = Parser::parse_compilation_unit(source).unwrap();
//! assert_eq!(unit.print(), source);
//! ```

pub mod ast;
pub mod lexer;

pub use ast::Parser;
pub use lexer::{Lexer, Token, TokenKind};
