//! The type table: registered classes plus subtyping and member lookup.
//!
//! Every [`TypeTable`] carries a [`TableId`] that changes whenever a class is
//! registered, so attribution results cached against one table state are
//! never reused against another.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use jtemplate_core::{ClassType, JavaType, MethodType, OBJECT, RegistrationError, TypeParamDecl, Wildcard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::class_info::{ClassInfo, FieldSig, MethodSig};
use crate::generics::{TypeSubst, class_subst, substitute};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a type table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u64);

impl TableId {
    fn next() -> Self {
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A method found by member lookup, with the receiver's class substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberMethod {
    /// Fully-qualified name of the declaring class.
    pub declaring: String,
    pub sig: MethodSig,
    /// Declaring-class type parameters mapped to the receiver's arguments.
    pub subst: TypeSubst,
}

impl MemberMethod {
    /// Parameter types with class type variables substituted.
    pub fn params(&self) -> Vec<JavaType> {
        self.sig.params.iter().map(|p| substitute(p, &self.subst)).collect()
    }

    /// Return type with class type variables substituted.
    pub fn return_type(&self) -> JavaType {
        substitute(&self.sig.return_type, &self.subst)
    }

    /// The resolved method, given the inferred method type arguments and the
    /// final return type.
    pub fn to_method_type(&self, type_args: Vec<JavaType>, return_type: JavaType) -> MethodType {
        MethodType {
            declaring: self.declaring.clone(),
            name: self.sig.name.clone(),
            params: self.sig.params.clone(),
            return_type,
            type_args,
            is_static: self.sig.is_static,
            is_varargs: self.sig.is_varargs,
        }
    }
}

/// A field found by member lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberField {
    pub declaring: String,
    pub field: FieldSig,
    /// Field type with class type variables substituted.
    pub ty: JavaType,
}

/// Registered classes, keyed by fully-qualified name.
///
/// Clones keep the id of the original until one of them registers a class.
#[derive(Debug, Clone)]
pub struct TypeTable {
    id: TableId,
    classes: FxHashMap<String, ClassInfo>,
    by_simple_name: FxHashMap<String, Vec<String>>,
    packages: FxHashSet<String>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            id: TableId::next(),
            classes: FxHashMap::default(),
            by_simple_name: FxHashMap::default(),
            packages: FxHashSet::default(),
        }
    }

    /// Current identity; changes on every successful registration.
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn register(&mut self, info: ClassInfo) -> Result<(), RegistrationError> {
        if self.classes.contains_key(&info.fqn) {
            return Err(RegistrationError::DuplicateClass { fqn: info.fqn });
        }
        // Nested classes (`a.b.Outer.Inner`) count the enclosing class'
        // package only.
        let mut package = info.fqn.as_str();
        while let Some((head, _)) = package.rsplit_once('.') {
            package = head;
            if !self.classes.contains_key(head) {
                break;
            }
        }
        if package != info.fqn {
            self.packages.insert(package.to_string());
        }
        self.by_simple_name
            .entry(info.simple_name().to_string())
            .or_default()
            .push(info.fqn.clone());
        self.classes.insert(info.fqn.clone(), info);
        self.id = TableId::next();
        Ok(())
    }

    /// Remove a class. The table gets a new id when one was removed; the
    /// packages it contributed stay known.
    pub fn unregister(&mut self, fqn: &str) -> Option<ClassInfo> {
        let info = self.classes.remove(fqn)?;
        if let Some(names) = self.by_simple_name.get_mut(info.simple_name()) {
            names.retain(|name| name != fqn);
        }
        self.by_simple_name.retain(|_, names| !names.is_empty());
        self.id = TableId::next();
        Some(info)
    }

    pub fn get(&self, fqn: &str) -> Option<&ClassInfo> {
        self.classes.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Fully-qualified names of every class with this simple name.
    pub fn by_simple_name(&self, name: &str) -> &[String] {
        self.by_simple_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    // =========================================
    // Subtyping
    // =========================================

    /// Direct supertypes of `ty` with its arguments substituted in.
    ///
    /// Interfaces without superinterfaces have `Object` as supertype.
    pub fn direct_supertypes(&self, ty: &ClassType) -> Vec<ClassType> {
        let Some(info) = self.get(&ty.fqn) else {
            return Vec::new();
        };
        let subst = class_subst(info, &ty.args);
        let mut out: Vec<ClassType> = info
            .declared_supertypes()
            .filter_map(|s| match substitute(s, &subst) {
                JavaType::Class(c) => Some(c),
                _ => None,
            })
            .collect();
        if info.is_interface() && out.iter().all(|c| c.fqn != OBJECT) {
            out.push(ClassType {
                fqn: OBJECT.to_string(),
                args: Vec::new(),
            });
        }
        out
    }

    /// View `ty` as its supertype `target`, if it has one.
    pub fn as_super(&self, ty: &ClassType, target: &str) -> Option<ClassType> {
        if ty.fqn == target {
            return Some(ty.clone());
        }
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.fqn.clone()) {
                continue;
            }
            for sup in self.direct_supertypes(&current) {
                if sup.fqn == target {
                    return Some(sup);
                }
                queue.push_back(sup);
            }
        }
        // Unregistered classes still extend Object.
        (target == OBJECT).then(|| ClassType {
            fqn: OBJECT.to_string(),
            args: Vec::new(),
        })
    }

    /// Whether class `sub` is `sup` or inherits from it.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        let ty = ClassType {
            fqn: sub.to_string(),
            args: Vec::new(),
        };
        self.as_super(&ty, sup).is_some()
    }

    /// Reference subtyping; type variables are only subtypes of themselves
    /// and `Object`.
    pub fn is_subtype(&self, sub: &JavaType, sup: &JavaType) -> bool {
        self.is_subtype_in(sub, sup, &[])
    }

    /// Subtyping where type variables declared in `params` are related
    /// through their bounds.
    pub fn is_subtype_in(&self, sub: &JavaType, sup: &JavaType, params: &[TypeParamDecl]) -> bool {
        if sub.is_unknown() || sup.is_unknown() {
            return false;
        }
        if sub == sup {
            return true;
        }
        match (sub, sup) {
            (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => false,
            (JavaType::Null, _) => sup.is_reference(),
            (_, JavaType::Class(c)) if c.fqn == OBJECT => sub.is_reference(),
            (JavaType::TypeVar(name), _) => {
                let bounds = params
                    .iter()
                    .find(|p| &p.name == name)
                    .map(|p| p.bounds.as_slice())
                    .unwrap_or(&[]);
                bounds.iter().any(|b| self.is_subtype_in(b, sup, params))
            }
            (JavaType::Array(a), JavaType::Array(b)) => match (a.as_ref(), b.as_ref()) {
                (JavaType::Primitive(x), JavaType::Primitive(y)) => x == y,
                (a, b) => self.is_subtype_in(a, b, params),
            },
            (JavaType::Array(_), JavaType::Class(c)) => {
                c.fqn == "java.lang.Cloneable" || c.fqn == "java.io.Serializable"
            }
            (JavaType::Class(a), JavaType::Class(b)) => match self.as_super(a, &b.fqn) {
                Some(view) if b.args.is_empty() || view.args.is_empty() => true,
                Some(view) => {
                    view.args.len() == b.args.len()
                        && view
                            .args
                            .iter()
                            .zip(&b.args)
                            .all(|(arg, target)| self.type_arg_contains(arg, target, params))
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Type argument containment: whether `arg` fits `target`.
    fn type_arg_contains(&self, arg: &JavaType, target: &JavaType, params: &[TypeParamDecl]) -> bool {
        match target {
            JavaType::Wildcard(Wildcard::Unbounded) => true,
            JavaType::Wildcard(Wildcard::Extends(bound)) => match arg {
                JavaType::Wildcard(Wildcard::Extends(a)) => self.is_subtype_in(a, bound, params),
                JavaType::Wildcard(Wildcard::Unbounded) | JavaType::Wildcard(Wildcard::Super(_)) => {
                    bound.is_class(OBJECT)
                }
                _ => self.is_subtype_in(arg, bound, params),
            },
            JavaType::Wildcard(Wildcard::Super(bound)) => match arg {
                JavaType::Wildcard(Wildcard::Super(a)) => self.is_subtype_in(bound, a, params),
                JavaType::Wildcard(_) => false,
                _ => self.is_subtype_in(bound, arg, params),
            },
            _ => arg == target,
        }
    }

    // =========================================
    // Member lookup
    // =========================================

    /// Every class reachable from `receiver`, nearest first, each with its
    /// substitution.
    fn hierarchy(&self, receiver: &ClassType) -> Vec<(&ClassInfo, TypeSubst)> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::from([receiver.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.fqn.clone()) {
                continue;
            }
            let Some(info) = self.get(&current.fqn) else {
                continue;
            };
            out.push((info, class_subst(info, &current.args)));
            queue.extend(self.direct_supertypes(&current));
        }
        out
    }

    fn receiver_class(receiver: &JavaType) -> Option<ClassType> {
        match receiver {
            JavaType::Class(c) => Some(c.clone()),
            // Arrays expose Object's methods.
            JavaType::Array(_) | JavaType::TypeVar(_) => Some(ClassType {
                fqn: OBJECT.to_string(),
                args: Vec::new(),
            }),
            _ => None,
        }
    }

    /// Methods called `name` visible on `receiver`; overridden declarations
    /// are hidden by the nearest override.
    pub fn lookup_methods(&self, receiver: &JavaType, name: &str) -> Vec<MemberMethod> {
        let Some(class) = Self::receiver_class(receiver) else {
            return Vec::new();
        };
        let mut found: Vec<MemberMethod> = Vec::new();
        for (info, subst) in self.hierarchy(&class) {
            for sig in info.methods_named(name) {
                let candidate = MemberMethod {
                    declaring: info.fqn.clone(),
                    sig: sig.clone(),
                    subst: subst.clone(),
                };
                let params = candidate.params();
                if found.iter().any(|m| m.params() == params) {
                    continue;
                }
                found.push(candidate);
            }
        }
        found
    }

    pub fn lookup_field(&self, receiver: &JavaType, name: &str) -> Option<MemberField> {
        let class = Self::receiver_class(receiver)?;
        self.hierarchy(&class).into_iter().find_map(|(info, subst)| {
            info.field(name).map(|field| MemberField {
                declaring: info.fqn.clone(),
                ty: substitute(&field.ty, &subst),
                field: field.clone(),
            })
        })
    }

    /// Constructors of `class`, substituted with its arguments.
    pub fn constructors(&self, class: &ClassType) -> Vec<MemberMethod> {
        let Some(info) = self.get(&class.fqn) else {
            return Vec::new();
        };
        let subst = class_subst(info, &class.args);
        info.constructors
            .iter()
            .map(|sig| MemberMethod {
                declaring: info.fqn.clone(),
                sig: sig.clone(),
                subst: subst.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_info::ClassKind;
    use jtemplate_core::PrimitiveKind;

    fn tv(name: &str) -> JavaType {
        JavaType::TypeVar(name.into())
    }

    fn table() -> TypeTable {
        let mut table = TypeTable::new();
        table
            .register(
                ClassInfo::new(OBJECT, ClassKind::Class)
                    .with_method(MethodSig::new("toString", vec![], JavaType::string()))
                    .with_method(MethodSig::new(
                        "equals",
                        vec![JavaType::object()],
                        JavaType::Primitive(PrimitiveKind::Boolean),
                    )),
            )
            .unwrap();
        table
            .register(
                ClassInfo::new("java.lang.String", ClassKind::Class)
                    .implements(JavaType::generic("java.lang.Comparable", vec![JavaType::string()]))
                    .with_method(MethodSig::new("toString", vec![], JavaType::string())),
            )
            .unwrap();
        table
            .register(
                ClassInfo::new("java.lang.Comparable", ClassKind::Interface)
                    .with_type_params(vec![TypeParamDecl::new("T", vec![])])
                    .with_method(MethodSig::new(
                        "compareTo",
                        vec![tv("T")],
                        JavaType::Primitive(PrimitiveKind::Int),
                    )),
            )
            .unwrap();
        table
            .register(
                ClassInfo::new("java.util.Collection", ClassKind::Interface)
                    .with_type_params(vec![TypeParamDecl::new("E", vec![])])
                    .with_method(MethodSig::new(
                        "add",
                        vec![tv("E")],
                        JavaType::Primitive(PrimitiveKind::Boolean),
                    )),
            )
            .unwrap();
        table
            .register(
                ClassInfo::new("java.util.List", ClassKind::Interface)
                    .with_type_params(vec![TypeParamDecl::new("E", vec![])])
                    .implements(JavaType::generic("java.util.Collection", vec![tv("E")]))
                    .with_method(MethodSig::new("get", vec![JavaType::Primitive(PrimitiveKind::Int)], tv("E"))),
            )
            .unwrap();
        table
            .register(
                ClassInfo::new("java.util.ArrayList", ClassKind::Class)
                    .with_type_params(vec![TypeParamDecl::new("E", vec![])])
                    .implements(JavaType::generic("java.util.List", vec![tv("E")]))
                    .with_field(FieldSig::new("size", JavaType::Primitive(PrimitiveKind::Int), false))
                    .with_constructor(MethodSig::constructor(vec![])),
            )
            .unwrap();
        table
    }

    fn list_of(arg: JavaType) -> JavaType {
        JavaType::generic("java.util.List", vec![arg])
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut table = table();
        let err = table
            .register(ClassInfo::new("java.lang.String", ClassKind::Class))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateClass { fqn } if fqn == "java.lang.String"));
    }

    #[test]
    fn id_changes_on_register() {
        let mut table = table();
        let before = table.id();
        table.register(ClassInfo::new("a.B", ClassKind::Class)).unwrap();
        assert_ne!(before, table.id());
        assert!(table.has_package("a"));
        assert!(table.has_package("java.util"));
        assert_eq!(table.by_simple_name("B"), ["a.B".to_string()]);
    }

    #[test]
    fn unregister_forgets_the_class() {
        let mut table = table();
        let before = table.id();
        let removed = table.unregister("java.util.ArrayList").unwrap();
        assert_eq!(removed.fqn, "java.util.ArrayList");
        assert_ne!(table.id(), before);
        assert!(!table.contains("java.util.ArrayList"));
        assert!(table.by_simple_name("ArrayList").is_empty());
        assert!(table.unregister("java.util.ArrayList").is_none());

        // The name is free to be registered again.
        table.register(ClassInfo::new("java.util.ArrayList", ClassKind::Class)).unwrap();
        assert_eq!(table.by_simple_name("ArrayList"), ["java.util.ArrayList".to_string()]);
    }

    #[test]
    fn nested_class_package() {
        let mut table = TypeTable::new();
        table.register(ClassInfo::new("p.Outer", ClassKind::Class)).unwrap();
        table.register(ClassInfo::new("p.Outer.Inner", ClassKind::Class)).unwrap();
        assert!(table.has_package("p"));
        assert!(!table.has_package("p.Outer"));
    }

    #[test]
    fn generic_supertype_views() {
        let table = table();
        let array_list = ClassType {
            fqn: "java.util.ArrayList".into(),
            args: vec![JavaType::string()],
        };
        let view = table.as_super(&array_list, "java.util.Collection").unwrap();
        assert_eq!(view.args, vec![JavaType::string()]);
        assert!(table.is_subclass("java.util.ArrayList", OBJECT));
        assert!(!table.is_subclass("java.lang.String", "java.util.List"));
    }

    #[test]
    fn subtyping_rules() {
        let table = table();
        let int = JavaType::Primitive(PrimitiveKind::Int);
        assert!(table.is_subtype(&JavaType::Null, &JavaType::string()));
        assert!(!table.is_subtype(&JavaType::Null, &int));
        assert!(table.is_subtype(&JavaType::string(), &JavaType::object()));
        assert!(table.is_subtype(
            &JavaType::string(),
            &JavaType::generic("java.lang.Comparable", vec![JavaType::string()])
        ));
        assert!(table.is_subtype(&JavaType::array(JavaType::string()), &JavaType::array(JavaType::object())));
        assert!(!table.is_subtype(&JavaType::array(int.clone()), &JavaType::array(JavaType::object())));
        assert!(table.is_subtype(&JavaType::array(int.clone()), &JavaType::object()));
        assert!(!table.is_subtype(&JavaType::Unknown, &JavaType::object()));
        assert!(!table.is_subtype(&int, &JavaType::object()));
    }

    #[test]
    fn generic_argument_containment() {
        let table = table();
        let list_string = list_of(JavaType::string());
        let list_object = list_of(JavaType::object());
        assert!(!table.is_subtype(&list_string, &list_object));
        assert!(table.is_subtype(
            &list_string,
            &list_of(JavaType::Wildcard(Wildcard::Extends(Box::new(JavaType::object()))))
        ));
        assert!(table.is_subtype(
            &list_object,
            &list_of(JavaType::Wildcard(Wildcard::Super(Box::new(JavaType::string()))))
        ));
        assert!(table.is_subtype(&list_string, &list_of(JavaType::Wildcard(Wildcard::Unbounded))));
        assert!(table.is_subtype(&list_string, &JavaType::class("java.util.List")));
    }

    #[test]
    fn wildcard_arguments_contain_wildcards() {
        let table = table();
        let extends = |ty| list_of(JavaType::Wildcard(Wildcard::Extends(Box::new(ty))));
        let sup = |ty| list_of(JavaType::Wildcard(Wildcard::Super(Box::new(ty))));
        let any = list_of(JavaType::Wildcard(Wildcard::Unbounded));

        assert!(table.is_subtype(&extends(JavaType::string()), &extends(JavaType::object())));
        assert!(!table.is_subtype(&extends(JavaType::object()), &extends(JavaType::string())));
        assert!(table.is_subtype(&sup(JavaType::object()), &sup(JavaType::string())));
        assert!(!table.is_subtype(&sup(JavaType::string()), &sup(JavaType::object())));
        assert!(table.is_subtype(&any, &extends(JavaType::object())));
        assert!(!table.is_subtype(&any, &extends(JavaType::string())));
        assert!(!table.is_subtype(&any, &sup(JavaType::string())));

        assert!(table.contains("java.util.List"));
        assert!(!table.contains("java.util.Map"));
    }

    #[test]
    fn type_variables_use_bounds() {
        let table = table();
        let params = vec![TypeParamDecl::new("T", vec![JavaType::string()])];
        assert!(table.is_subtype_in(&tv("T"), &JavaType::string(), &params));
        assert!(!table.is_subtype(&tv("T"), &JavaType::string()));
        assert!(table.is_subtype(&tv("T"), &JavaType::object()));
    }

    #[test]
    fn method_lookup_walks_hierarchy() {
        let table = table();
        let receiver = JavaType::generic("java.util.ArrayList", vec![JavaType::string()]);
        let add = table.lookup_methods(&receiver, "add");
        assert_eq!(add.len(), 1);
        assert_eq!(add[0].declaring, "java.util.Collection");
        assert_eq!(add[0].params(), vec![JavaType::string()]);

        let get = table.lookup_methods(&receiver, "get");
        assert_eq!(get[0].return_type(), JavaType::string());
    }

    #[test]
    fn overrides_hide_inherited_methods() {
        let table = table();
        let methods = table.lookup_methods(&JavaType::string(), "toString");
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].declaring, "java.lang.String");

        let from_interface = table.lookup_methods(&list_of(JavaType::string()), "equals");
        assert_eq!(from_interface.len(), 1);
        assert_eq!(from_interface[0].declaring, OBJECT);
    }

    #[test]
    fn fields_and_constructors() {
        let table = table();
        let receiver = JavaType::generic("java.util.ArrayList", vec![JavaType::string()]);
        let field = table.lookup_field(&receiver, "size").unwrap();
        assert_eq!(field.ty, JavaType::Primitive(PrimitiveKind::Int));
        assert!(table.lookup_field(&receiver, "missing").is_none());

        let ctors = table.constructors(receiver.as_class().unwrap());
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].sig.name, MethodType::CONSTRUCTOR);
    }
}
