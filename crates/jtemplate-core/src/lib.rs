//! Core types shared across the jtemplate workspace.
//!
//! - [`Span`]: source locations
//! - [`error`]: the error hierarchy for lexing, parsing and templates
//! - [`types`]: the static Java type model

pub mod error;
mod span;
pub mod types;

pub use error::{
    Error, LexError, ParseError, ParseErrorKind, ParseErrors, RegistrationError,
    TemplateInstantiationError, TemplateSyntaxError,
};
pub use span::Span;
pub use types::{
    ClassType, JavaType, MethodType, OBJECT, PrimitiveKind, STRING, TypeParamDecl, Wildcard,
};
