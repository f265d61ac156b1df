//! Lexical scope during attribution.
//!
//! Tracks local variables and parameters in nested frames, the type
//! variables in scope, and the chain of enclosing classes.

use jtemplate_core::{ClassType, JavaType, TypeParamDecl};
use rustc_hash::FxHashMap;

/// A variable visible at some point in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: String,
    pub ty: JavaType,
}

/// An enclosing class together with whether the current code is in a static
/// context of it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnclosingClass {
    pub ty: ClassType,
    pub is_static: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Innermost frame last.
    frames: Vec<FxHashMap<String, JavaType>>,
    /// Type variables per declaration level, innermost last.
    type_params: Vec<Vec<TypeParamDecl>>,
    classes: Vec<EnclosingClass>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
            type_params: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Declare a variable in the innermost frame, shadowing outer ones.
    pub fn declare(&mut self, name: impl Into<String>, ty: JavaType) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), ty);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&JavaType> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// All visible variables, inner declarations hiding outer ones.
    pub fn locals(&self) -> Vec<LocalVar> {
        let mut seen = FxHashMap::default();
        for frame in self.frames.iter().rev() {
            for (name, ty) in frame {
                seen.entry(name.clone()).or_insert_with(|| ty.clone());
            }
        }
        let mut out: Vec<LocalVar> = seen.into_iter().map(|(name, ty)| LocalVar { name, ty }).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn push_type_params(&mut self, params: Vec<TypeParamDecl>) {
        self.type_params.push(params);
    }

    pub fn pop_type_params(&mut self) {
        self.type_params.pop();
    }

    /// Every type variable in scope; inner declarations come last.
    pub fn type_params(&self) -> Vec<TypeParamDecl> {
        self.type_params.iter().flatten().cloned().collect()
    }

    pub fn find_type_param(&self, name: &str) -> Option<&TypeParamDecl> {
        self.type_params.iter().rev().flatten().find(|p| p.name == name)
    }

    pub fn push_class(&mut self, ty: ClassType, is_static: bool) {
        self.classes.push(EnclosingClass { ty, is_static });
    }

    pub fn pop_class(&mut self) {
        self.classes.pop();
    }

    pub fn enclosing_class(&self) -> Option<&EnclosingClass> {
        self.classes.last()
    }

    /// Enclosing classes, innermost first.
    pub fn enclosing_classes(&self) -> impl Iterator<Item = &EnclosingClass> {
        self.classes.iter().rev()
    }

    /// Mark the innermost class context as static (inside a static method or
    /// initializer) or not.
    pub fn set_static(&mut self, is_static: bool) -> bool {
        match self.classes.last_mut() {
            Some(class) => std::mem::replace(&mut class.is_static, is_static),
            None => false,
        }
    }

    /// A type variable's upper bound for member lookup.
    pub fn upper_bound(&self, ty: &JavaType) -> JavaType {
        match ty {
            JavaType::TypeVar(name) => match self.find_type_param(name).and_then(|p| p.bounds.first()) {
                Some(bound) if bound != ty => self.upper_bound(bound),
                _ => JavaType::object(),
            },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_and_frames() {
        let mut scope = Scope::new();
        scope.declare("a", JavaType::string());
        scope.push_frame();
        scope.declare("a", JavaType::object());
        assert_eq!(scope.lookup("a"), Some(&JavaType::object()));
        assert_eq!(scope.locals().len(), 1);
        scope.pop_frame();
        assert_eq!(scope.lookup("a"), Some(&JavaType::string()));
        scope.pop_frame();
        assert_eq!(scope.lookup("a"), Some(&JavaType::string()));
    }

    #[test]
    fn type_variable_bounds() {
        let mut scope = Scope::new();
        scope.push_type_params(vec![TypeParamDecl::new("T", vec![JavaType::class("java.lang.Number")])]);
        scope.push_type_params(vec![TypeParamDecl::new("U", vec![JavaType::TypeVar("T".into())])]);
        assert_eq!(
            scope.upper_bound(&JavaType::TypeVar("U".into())),
            JavaType::class("java.lang.Number")
        );
        assert_eq!(scope.type_params().len(), 2);
        scope.pop_type_params();
        assert!(scope.find_type_param("U").is_none());
    }
}
