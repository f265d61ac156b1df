//! Compiled templates.
//!
//! A [`JavaTemplate`] is built once from its source and options and is
//! immutable afterwards. Placeholder syntax, generic declarations, imports
//! and dependency sources are checked eagerly by [`JavaTemplateBuilder::build`];
//! the stubbed snippet is parsed on first use and attributed patterns are
//! cached per type table.

mod pattern;
mod placeholder;

use std::sync::{Arc, OnceLock, RwLock};

use jtemplate_compiler::{Imports, RegistrationPass};
use jtemplate_core::TemplateSyntaxError;
use jtemplate_parser::Parser;
use jtemplate_parser::ast::{CompilationUnit, Expr, Stmt, Tree, TypeParam, TypeTree, TypeTreeKind};
use jtemplate_registry::{TableId, TypeTable};
use rustc_hash::FxHashMap;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use crate::format::FormatOptions;

pub(crate) use pattern::{Pattern, TemplateScope};
pub use placeholder::{Placeholder, PlaceholderKind, Segment};
pub(crate) use placeholder::{Scanned, is_java_identifier};

/// Options for building a [`JavaTemplate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JavaTemplateBuilder {
    source: String,
    generic_types: Vec<String>,
    imports: Vec<String>,
    static_imports: Vec<String>,
    depends_on: Vec<String>,
    context_sensitive: bool,
    format: FormatOptions,
}

impl JavaTemplateBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Declare type variables usable in placeholder constraints, written as
    /// Java type parameters (`T`, `T extends Comparable<? super T>`).
    pub fn generic_types<I, S>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generic_types.extend(declarations.into_iter().map(Into::into));
        self
    }

    /// Fully-qualified names (or `pkg.*`) the snippet refers to.
    pub fn imports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(names.into_iter().map(Into::into));
        self
    }

    /// Static members (`java.util.Collections.emptyList` or `pkg.Class.*`).
    pub fn static_imports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_imports.extend(names.into_iter().map(Into::into));
        self
    }

    /// Java sources whose classes the snippet needs but the classpath lacks.
    pub fn depends_on<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Resolve free names in the snippet against the code around the cursor.
    pub fn context_sensitive(mut self) -> Self {
        self.context_sensitive = true;
        self
    }

    pub fn format(mut self, format: FormatOptions) -> Self {
        self.format = format;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Order-sensitive hash of every option.
    pub(crate) fn fingerprint(&self) -> u64 {
        const SEP: u64 = 0x9e37_79b9_7f4a_7c15;
        let lists = [
            &self.generic_types,
            &self.imports,
            &self.static_imports,
            &self.depends_on,
        ];
        let mut hash = xxh64(self.source.as_bytes(), 0) ^ u64::from(self.context_sensitive);
        hash = hash.wrapping_mul(SEP) ^ xxh64(self.format.indent.as_bytes(), 1);
        for (marker, list) in lists.into_iter().enumerate() {
            hash = hash.wrapping_mul(SEP).wrapping_add(marker as u64);
            for item in list {
                hash = hash.wrapping_mul(SEP) ^ xxh64(item.as_bytes(), marker as u64 + 2);
            }
        }
        hash
    }

    /// Compile the template.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(self) -> Result<JavaTemplate, TemplateSyntaxError> {
        let scanned = placeholder::scan(&self.source)?;

        let generic_types = self
            .generic_types
            .iter()
            .map(|text| {
                Parser::parse_type_parameter(text).map_err(|errors| TemplateSyntaxError::InvalidGenericType {
                    text: text.clone(),
                    errors,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_type_variables(&scanned, &generic_types)?;

        for name in self.imports.iter().chain(&self.static_imports) {
            if !is_import_name(name) {
                return Err(TemplateSyntaxError::InvalidImport { text: name.clone() });
            }
        }

        let dependencies = self
            .depends_on
            .iter()
            .enumerate()
            .map(|(index, source)| {
                Parser::parse_compilation_unit(source)
                    .map_err(|errors| TemplateSyntaxError::InvalidDependency { index, errors })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            placeholders = scanned.placeholders.len(),
            generic_types = generic_types.len(),
            context_sensitive = self.context_sensitive,
            "compiled template"
        );
        Ok(JavaTemplate {
            options: self,
            scanned,
            generic_types,
            dependencies,
            snippet: OnceLock::new(),
            environments: RwLock::new(FxHashMap::default()),
        })
    }
}

/// A compiled code template.
///
/// Safe to share between threads; the lazily filled caches converge on the
/// same values whichever thread fills them first.
#[derive(Debug)]
pub struct JavaTemplate {
    options: JavaTemplateBuilder,
    scanned: Scanned,
    generic_types: Vec<Arc<TypeParam>>,
    dependencies: Vec<Arc<CompilationUnit>>,
    snippet: OnceLock<Result<Snippet, TemplateSyntaxError>>,
    /// Keyed by the id of the table the template is used against.
    environments: RwLock<FxHashMap<TableId, Arc<Environment>>>,
}

/// The stubbed snippet in the shape it parses as.
#[derive(Debug, Clone)]
pub(crate) enum Snippet {
    Expr(Arc<Expr>),
    Stmt(Arc<Stmt>),
    /// Valid only as a fragment of another kind (members, annotations,
    /// parameters, ...); usable for instantiation, never matched.
    Fragment,
}

impl Snippet {
    fn parse(source: &str) -> Result<Snippet, TemplateSyntaxError> {
        if let Ok(expr) = Parser::parse_expression(source) {
            return Ok(Snippet::Expr(expr));
        }
        let errors = match Parser::parse_statements(source) {
            Ok(stmts) if stmts.len() == 1 => return Ok(Snippet::Stmt(stmts[0].clone())),
            Ok(_) => return Ok(Snippet::Fragment),
            Err(errors) => errors,
        };
        let fragment = Parser::parse_members(source).is_ok()
            || Parser::parse_annotations(source).is_ok()
            || Parser::parse_type_list(source).is_ok()
            || Parser::parse_parameters(source).is_ok();
        if fragment {
            Ok(Snippet::Fragment)
        } else {
            Err(TemplateSyntaxError::Snippet { errors })
        }
    }

    pub(crate) fn tree(&self) -> Option<Tree> {
        match self {
            Snippet::Expr(e) => Some(Tree::Expr(e.clone())),
            Snippet::Stmt(s) => Some(Tree::Stmt(s.clone())),
            Snippet::Fragment => None,
        }
    }
}

/// A type table extended with the template's dependencies, and the
/// attributed pattern for it.
#[derive(Debug)]
pub(crate) struct Environment {
    pub table: Arc<TypeTable>,
    pattern: OnceLock<Option<Arc<Pattern>>>,
}

impl JavaTemplate {
    pub fn builder(source: impl Into<String>) -> JavaTemplateBuilder {
        JavaTemplateBuilder::new(source)
    }

    pub fn source(&self) -> &str {
        &self.options.source
    }

    /// Declared placeholders; back-references are not repeated.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.scanned.placeholders
    }

    /// Number of substitution arguments `apply` expects.
    pub fn parameter_count(&self) -> usize {
        self.scanned.placeholders.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.scanned.segments
    }

    pub fn generic_types(&self) -> &[Arc<TypeParam>] {
        &self.generic_types
    }

    pub fn imports(&self) -> &[String] {
        &self.options.imports
    }

    pub fn static_imports(&self) -> &[String] {
        &self.options.static_imports
    }

    pub fn is_context_sensitive(&self) -> bool {
        self.options.context_sensitive
    }

    pub fn format_options(&self) -> &FormatOptions {
        &self.options.format
    }

    /// The options this template was built from.
    pub fn options(&self) -> &JavaTemplateBuilder {
        &self.options
    }

    /// The template text with each placeholder replaced by its stub name.
    pub fn stubbed_source(&self) -> String {
        self.scanned.render(Placeholder::stub_name)
    }

    /// Parse the stubbed snippet now instead of on first use.
    pub fn validate(&self) -> Result<(), TemplateSyntaxError> {
        self.snippet().map(|_| ())
    }

    pub(crate) fn snippet(&self) -> Result<&Snippet, TemplateSyntaxError> {
        self.snippet
            .get_or_init(|| Snippet::parse(&self.stubbed_source()))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub(crate) fn scanned(&self) -> &Scanned {
        &self.scanned
    }

    /// The template's own import context.
    pub(crate) fn template_imports(&self) -> Imports {
        let mut imports = Imports::new(None);
        for name in &self.options.imports {
            imports.add(name, false);
        }
        for name in &self.options.static_imports {
            imports.add(name, true);
        }
        imports
    }

    /// The table to attribute against, with dependencies registered.
    pub(crate) fn environment(&self, base: &Arc<TypeTable>) -> Arc<Environment> {
        let key = base.id();
        let cached = self
            .environments
            .read()
            .ok()
            .and_then(|environments| environments.get(&key).cloned());
        if let Some(environment) = cached {
            return environment;
        }
        let environment = Arc::new(Environment {
            table: self.extend_table(base),
            pattern: OnceLock::new(),
        });
        match self.environments.write() {
            Ok(mut environments) => environments.entry(key).or_insert(environment).clone(),
            Err(_) => environment,
        }
    }

    fn extend_table(&self, base: &Arc<TypeTable>) -> Arc<TypeTable> {
        let missing: Vec<Arc<CompilationUnit>> = self
            .dependencies
            .iter()
            .filter(|unit| {
                let package = unit.package_name();
                unit.classes().any(|class| {
                    let fqn = match package {
                        Some(package) => format!("{package}.{}", class.name.as_str()),
                        None => class.name.as_str().to_string(),
                    };
                    !base.contains(&fqn)
                })
            })
            .cloned()
            .collect();
        if missing.is_empty() {
            return base.clone();
        }
        let mut table = (**base).clone();
        match RegistrationPass::new(&mut table).register_units(&missing) {
            Ok(classes) => {
                debug!(classes = classes.len(), "registered template dependencies");
                Arc::new(table)
            }
            Err(err) => {
                debug!(error = %err, "template dependencies not registered");
                base.clone()
            }
        }
    }

    /// The attributed pattern for matching at `cursor`, or `None` when the
    /// snippet cannot be matched.
    pub(crate) fn pattern(&self, cursor: &crate::Cursor) -> Option<Arc<Pattern>> {
        let snippet = match self.snippet() {
            Ok(snippet) => snippet,
            Err(err) => {
                debug!(error = %err, "template snippet does not parse");
                return None;
            }
        };
        let tree = snippet.tree()?;
        let environment = self.environment(cursor.file().table());
        if self.is_context_sensitive() {
            return Some(Arc::new(Pattern::build(self, &tree, &environment.table, Some(cursor))));
        }
        environment
            .pattern
            .get_or_init(|| Some(Arc::new(Pattern::build(self, &tree, &environment.table, None))))
            .clone()
    }
}

/// Constraints may only mention declared type variables. A bare name made
/// of one capital letter and optional digits is taken as a type variable.
fn check_type_variables(scanned: &Scanned, generic_types: &[Arc<TypeParam>]) -> Result<(), TemplateSyntaxError> {
    for (index, placeholder) in scanned.placeholders.iter().enumerate() {
        let Some(constraint) = &placeholder.constraint else {
            continue;
        };
        if let Some(name) = undeclared_variable(constraint, generic_types) {
            return Err(TemplateSyntaxError::UndeclaredTypeVariable {
                name,
                placeholder: index,
            });
        }
    }
    Ok(())
}

fn undeclared_variable(tree: &TypeTree, declared: &[Arc<TypeParam>]) -> Option<String> {
    match &tree.kind {
        TypeTreeKind::Primitive(_) => None,
        TypeTreeKind::Named(named) => {
            if named.args.is_none() && looks_like_type_variable(&named.name) && !declared.iter().any(|p| p.name == named.name)
            {
                return Some(named.name.clone());
            }
            named
                .args
                .iter()
                .flat_map(|args| args.iter())
                .find_map(|arg| undeclared_variable(arg, declared))
        }
        TypeTreeKind::Array(array) => undeclared_variable(&array.elem, declared),
        TypeTreeKind::Wildcard(wildcard) => wildcard
            .bound
            .as_ref()
            .and_then(|bound| undeclared_variable(&bound.bound, declared)),
    }
}

fn looks_like_type_variable(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_digit())
}

fn is_import_name(name: &str) -> bool {
    let mut parts = name.split('.').peekable();
    let mut count = 0;
    while let Some(part) = parts.next() {
        count += 1;
        let last = parts.peek().is_none();
        if !(is_java_identifier(part) || (last && part == "*" && count > 1)) {
            return false;
        }
    }
    count > 0
}
