//! Abstract Syntax Tree (AST) for Java.
//!
//! Nodes are immutable and shared through [`Arc`](std::sync::Arc). Edits build
//! new trees with [`fold::Fold`], which reuses every unchanged subtree and keeps
//! node ids stable.

// Core types
pub mod node;
pub mod ops;

mod parser;
mod type_parser;
pub mod types;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod decl;
mod decl_parser;

pub mod fold;
pub mod printer;
pub mod tree;
pub mod visitor;

// Re-export error types from core
pub use jtemplate_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use printer::{Print, Printer, print_trimmed};
pub use stmt::*;
pub use tree::Tree;
pub use types::*;
