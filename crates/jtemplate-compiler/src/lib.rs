//! Java type attribution.
//!
//! A 2-pass front end for the Java subset handled by `jtemplate-parser`.
//!
//! ## Architecture
//!
//! - **Pass 1 (Registration)**: Register all classes with complete member signatures
//! - **Pass 2 (Attribution)**: Type expressions, variables and calls in method bodies
//!
//! ## Modules
//!
//! - [`attribute`]: Attribution of units, statements and expressions
//! - [`classpath`]: Builtin JDK stubs and extra sources
//! - [`conversion`]: Method-invocation conversions (widening, boxing, ...)
//! - [`inference`]: Type-variable inference and bound checking
//! - [`overload`]: Overload resolution for method and constructor calls
//! - [`passes`]: The registration pass
//! - [`scope`]: Lexical scope during attribution
//! - [`type_resolver`]: Type resolution from type syntax to [`JavaType`]

pub mod attribute;
pub mod classpath;
pub mod conversion;
pub mod inference;
pub mod overload;
pub mod passes;
pub mod scope;
pub mod type_resolver;

use std::sync::Arc;

pub use attribute::{Attributor, attribute_unit};
pub use classpath::Classpath;
pub use conversion::{Conversion, ConversionKind, find_conversion, is_assignable};
pub use inference::{Binding, Inference, check_bounds, infer};
pub use overload::{OverloadMatch, Phase, resolve_overload};
pub use passes::RegistrationPass;
pub use scope::{EnclosingClass, LocalVar, Scope};
pub use type_resolver::{Imports, TypeResolver, resolve_type_params};

// Re-export RegistrationError from core for convenience
pub use jtemplate_core::RegistrationError;

use jtemplate_parser::ast::CompilationUnit;
use jtemplate_registry::TypeTable;

/// Attributed compilation units together with the table they were
/// attributed against.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub table: TypeTable,
    pub units: Vec<Arc<CompilationUnit>>,
}

/// Register `units` on top of `classpath` and attribute them.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile(units: &[Arc<CompilationUnit>], classpath: &TypeTable) -> Result<Compilation, RegistrationError> {
    let mut table = classpath.clone();
    RegistrationPass::new(&mut table).register_units(units)?;
    let units = units.iter().map(|unit| attribute_unit(unit, &table)).collect();
    Ok(Compilation { table, units })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_core::JavaType;
    use jtemplate_parser::Parser;

    #[test]
    fn compile_leaves_the_classpath_untouched() {
        let classpath = Classpath::builtin().build().unwrap();
        let unit = Parser::parse_compilation_unit("package p; class A { String s() { return \"\"; } }").unwrap();
        let compilation = compile(&[unit], &classpath).unwrap();
        assert!(compilation.table.contains("p.A"));
        assert!(!classpath.contains("p.A"));
        assert_ne!(compilation.table.id(), classpath.id());
        let class = compilation.units[0].classes().next().unwrap();
        assert_eq!(class.ty, Some(JavaType::class("p.A")));
    }
}
