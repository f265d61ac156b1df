//! Type registry for jtemplate.
//!
//! [`TypeTable`] stores the classes visible to attribution: the builtin
//! classpath, classes registered from `depends_on` sources and the classes of
//! the compilation unit being attributed. It answers subtype questions with
//! generic substitution and looks up inherited members.

mod class_info;
mod generics;
mod table;

pub use class_info::{ClassInfo, ClassKind, FieldSig, MethodSig};
pub use generics::{TypeSubst, class_subst, erasure, substitute};
pub use table::{MemberField, MemberMethod, TableId, TypeTable};
