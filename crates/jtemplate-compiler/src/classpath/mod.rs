//! Java stub sources that make up a type table.
//!
//! The builtin classpath covers the parts of `java.lang`, `java.io`,
//! `java.util` and `java.util.function` that templates commonly mention.
//! Further stubs (a template's `depends_on` sources, or the classes of the
//! file being edited) are layered on top with [`Classpath::with_source`].

use std::sync::{Arc, OnceLock};

use jtemplate_core::RegistrationError;
use jtemplate_parser::Parser;
use jtemplate_parser::ast::CompilationUnit;
use jtemplate_registry::TypeTable;
use tracing::debug;

use crate::passes::RegistrationPass;

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("java/lang", include_str!("stubs/java_lang.java")),
    ("java/io", include_str!("stubs/java_io.java")),
    ("java/util", include_str!("stubs/java_util.java")),
    ("java/util/function", include_str!("stubs/java_util_function.java")),
];

/// An ordered set of Java stub sources.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    include_builtin: bool,
    sources: Vec<(String, String)>,
}

impl Classpath {
    /// No classes at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The builtin JDK stubs.
    pub fn builtin() -> Self {
        Self {
            include_builtin: true,
            sources: Vec::new(),
        }
    }

    /// Add a Java source whose classes are registered after the ones already
    /// on the classpath.
    pub fn with_source(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.push((name.into(), source.into()));
        self
    }

    /// Parse every source and register its classes in a fresh table.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&self) -> Result<TypeTable, RegistrationError> {
        let mut table = if self.include_builtin {
            builtin_table()?
        } else {
            TypeTable::new()
        };
        self.load_into(&mut table)?;
        Ok(table)
    }

    /// Register the extra sources (not the builtin stubs) into `table`.
    pub fn load_into(&self, table: &mut TypeTable) -> Result<(), RegistrationError> {
        if self.sources.is_empty() {
            return Ok(());
        }
        let units = parse_sources(self.sources.iter().map(|(n, s)| (n.as_str(), s.as_str())))?;
        RegistrationPass::new(table).register_units(&units)?;
        Ok(())
    }
}

fn parse_sources<'a>(
    sources: impl Iterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<Arc<CompilationUnit>>, RegistrationError> {
    sources
        .map(|(name, source)| {
            Parser::parse_compilation_unit(source).map_err(|errors| RegistrationError::Source {
                name: name.to_string(),
                errors,
            })
        })
        .collect()
}

/// The builtin stubs are parsed and registered once per process; callers
/// get a clone.
fn builtin_table() -> Result<TypeTable, RegistrationError> {
    static BUILTIN: OnceLock<Result<TypeTable, RegistrationError>> = OnceLock::new();
    BUILTIN
        .get_or_init(|| {
            let units = parse_sources(BUILTIN_SOURCES.iter().copied())?;
            let mut table = TypeTable::new();
            let registered = RegistrationPass::new(&mut table).register_units(&units)?;
            debug!(classes = registered.len(), "registered builtin classpath");
            Ok(table)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jtemplate_core::JavaType;

    #[test]
    fn builtin_stubs_register() {
        let table = Classpath::builtin().build().unwrap();
        for fqn in [
            "java.lang.Object",
            "java.lang.String",
            "java.lang.StringBuilder",
            "java.lang.Integer",
            "java.lang.Math",
            "java.lang.System",
            "java.io.PrintStream",
            "java.util.List",
            "java.util.ArrayList",
            "java.util.Map.Entry",
            "java.util.Objects",
            "java.util.Optional",
            "java.util.function.Function",
        ] {
            assert!(table.contains(fqn), "missing {fqn}");
        }
        assert!(table.is_subtype(
            &JavaType::generic("java.util.ArrayList", vec![JavaType::string()]),
            &JavaType::generic("java.lang.Iterable", vec![JavaType::string()]),
        ));
        assert!(table.is_subtype(&JavaType::class("java.lang.Integer"), &JavaType::class("java.lang.Number")));
    }

    #[test]
    fn builtin_tables_are_independent() {
        let mut first = Classpath::builtin().build().unwrap();
        let second = Classpath::builtin().build().unwrap();
        first
            .register(jtemplate_registry::ClassInfo::new("a.B", jtemplate_registry::ClassKind::Class))
            .unwrap();
        assert!(!second.contains("a.B"));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn extra_sources_layer_on_top() {
        let table = Classpath::builtin()
            .with_source("B.java", "package p; public class B { public static void foo(int a, int b, int c) {} }")
            .build()
            .unwrap();
        assert!(table.contains("p.B"));
        assert_eq!(table.get("p.B").unwrap().methods.len(), 1);
    }

    #[test]
    fn unparsable_source_is_reported() {
        let err = Classpath::empty().with_source("Bad.java", "class {").build().unwrap_err();
        assert!(matches!(err, RegistrationError::Source { name, .. } if name == "Bad.java"));
    }
}
