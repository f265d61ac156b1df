//! Structural Java code templates.
//!
//! A [`JavaTemplate`] is a Java snippet with typed holes (`#{}`,
//! `#{any(java.util.List<T>)}`, `#{name:literal}`) that can be used two ways:
//!
//! - **Matching**: [`JavaTemplate::matches`] compares the attributed snippet
//!   against the subtree under a [`Cursor`] and captures one expression per
//!   hole when the shapes, names, resolved declarations and types agree.
//! - **Instantiation**: [`JavaTemplate::apply`] fills the holes with
//!   [`Substitution`]s and splices the result into the file at the
//!   [`Coordinates`] relative to the cursor, producing a new [`SourceFile`].
//!
//! Trees are immutable and shared (`Arc`); every edit returns a new file and
//! leaves untouched subtrees physically shared with the old one. Printing a
//! file that was never edited reproduces its source byte for byte.
//!
//! ```
//! use jtemplate::{Coordinates, JavaTemplate, SourceFile};
//!
//! let file = SourceFile::parse("class A { int f(int x) { return x * 2; } }").unwrap();
//! let cursor = file.find_expr("x * 2").unwrap();
//!
//! let pattern = JavaTemplate::builder("#{any(int)} * 2").build().unwrap();
//! let found = pattern.matches(&cursor).unwrap();
//!
//! let rewrite = JavaTemplate::builder("#{any(int)} << 1").build().unwrap();
//! let file = rewrite
//!     .apply(&cursor, Coordinates::Replace, &found.substitutions())
//!     .unwrap();
//! assert_eq!(file.print(), "class A { int f(int x) { return x << 1; } }");
//! ```

pub mod cache;
pub mod coordinates;
pub mod cursor;
pub mod format;
pub mod instantiate;
pub mod matcher;
pub mod source_file;
pub mod template;

pub use cache::TemplateCache;
pub use coordinates::{AnnotationOrder, Coordinates, by_simple_name};
pub use cursor::Cursor;
pub use format::FormatOptions;
pub use instantiate::Substitution;
pub use matcher::Match;
pub use source_file::SourceFile;
pub use template::{JavaTemplate, JavaTemplateBuilder, Placeholder, PlaceholderKind, Segment};

pub use jtemplate_core::{Error, ParseErrors, TemplateInstantiationError, TemplateSyntaxError};
