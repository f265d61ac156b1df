//! Class, method and field metadata.

use jtemplate_core::{ClassType, JavaType, MethodType, OBJECT, PrimitiveKind, TypeParamDecl};

/// Whether a type is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

/// A registered class or interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    /// Fully-qualified name; nested classes use `Outer.Inner`.
    pub fqn: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParamDecl>,
    /// `None` for interfaces and `java.lang.Object`.
    pub superclass: Option<JavaType>,
    pub interfaces: Vec<JavaType>,
    pub fields: Vec<FieldSig>,
    pub methods: Vec<MethodSig>,
    pub constructors: Vec<MethodSig>,
}

impl ClassInfo {
    pub fn new(fqn: impl Into<String>, kind: ClassKind) -> Self {
        let fqn = fqn.into();
        let superclass = (kind == ClassKind::Class && fqn != OBJECT).then(JavaType::object);
        Self {
            fqn,
            kind,
            type_params: Vec::new(),
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.fqn.rsplit('.').next().unwrap_or(&self.fqn)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// The class parameterized by its own type variables (`List<E>`).
    pub fn this_type(&self) -> ClassType {
        ClassType {
            fqn: self.fqn.clone(),
            args: self
                .type_params
                .iter()
                .map(|p| JavaType::TypeVar(p.name.clone()))
                .collect(),
        }
    }

    /// Superclass followed by interfaces, as declared.
    pub fn declared_supertypes(&self) -> impl Iterator<Item = &JavaType> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodSig> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSig> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn with_type_params(mut self, params: Vec<TypeParamDecl>) -> Self {
        self.type_params = params;
        self
    }

    pub fn extends(mut self, superclass: JavaType) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: JavaType) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(mut self, field: FieldSig) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: MethodSig) -> Self {
        self.constructors.push(constructor);
        self
    }
}

/// A declared method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    /// Method name; [`MethodType::CONSTRUCTOR`] for constructors.
    pub name: String,
    /// Method-level type parameters (`<T extends Comparable<T>>`).
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<JavaType>,
    pub return_type: JavaType,
    pub is_static: bool,
    /// The last parameter is variable-arity (its type is an array).
    pub is_varargs: bool,
    /// An interface method with a body.
    pub is_default: bool,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<JavaType>, return_type: JavaType) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            params,
            return_type,
            is_static: false,
            is_varargs: false,
            is_default: false,
        }
    }

    pub fn constructor(params: Vec<JavaType>) -> Self {
        Self::new(MethodType::CONSTRUCTOR, params, JavaType::Primitive(PrimitiveKind::Void))
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_type_params(mut self, params: Vec<TypeParamDecl>) -> Self {
        self.type_params = params;
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Whether an implementation must provide this method.
    pub fn is_abstract(&self) -> bool {
        !self.is_static && !self.is_default
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSig {
    pub name: String,
    pub ty: JavaType,
    pub is_static: bool,
}

impl FieldSig {
    pub fn new(name: impl Into<String>, ty: JavaType, is_static: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_extend_object_by_default() {
        let info = ClassInfo::new("com.example.Foo", ClassKind::Class);
        assert_eq!(info.superclass, Some(JavaType::object()));
        assert_eq!(info.simple_name(), "Foo");

        let object = ClassInfo::new(OBJECT, ClassKind::Class);
        assert_eq!(object.superclass, None);

        let iface = ClassInfo::new("java.lang.Runnable", ClassKind::Interface);
        assert!(iface.superclass.is_none());
        assert!(iface.is_interface());
    }

    #[test]
    fn this_type_uses_type_variables() {
        let info = ClassInfo::new("java.util.Map", ClassKind::Interface)
            .with_type_params(vec![TypeParamDecl::new("K", vec![]), TypeParamDecl::new("V", vec![])]);
        assert_eq!(info.this_type().to_string(), "java.util.Map<K, V>");
    }

    #[test]
    fn method_lookup_by_name() {
        let info = ClassInfo::new("Foo", ClassKind::Class)
            .with_method(MethodSig::new("a", vec![], JavaType::object()))
            .with_method(MethodSig::new("b", vec![], JavaType::object()))
            .with_method(MethodSig::new("a", vec![JavaType::string()], JavaType::object()));
        assert_eq!(info.methods_named("a").count(), 2);
    }
}
