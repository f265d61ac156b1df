//! Compiler passes.
//!
//! - [`RegistrationPass`]: enter the classes of one or more compilation
//!   units into a [`TypeTable`](jtemplate_registry::TypeTable) with complete
//!   member signatures, before any body is attributed.

mod registration;

pub use registration::RegistrationPass;
