//! Java type model shared by the parser, the attribution engine and templates.

mod java_type;
mod primitive_kind;

pub use java_type::{ClassType, JavaType, MethodType, OBJECT, STRING, TypeParamDecl, Wildcard};
pub use primitive_kind::PrimitiveKind;
