//! Sharing compiled templates between call sites.

use std::sync::{Arc, RwLock};

use jtemplate_core::TemplateSyntaxError;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::template::{JavaTemplate, JavaTemplateBuilder};

/// Compiled templates keyed by a hash of their options.
///
/// Two builders with equal options share one [`JavaTemplate`], so its
/// snippet and per-table patterns are computed once per process.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RwLock<FxHashMap<u64, Arc<JavaTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached template for `builder`, compiling it on first request.
    ///
    /// Templates that fail to compile are not cached.
    pub fn get_or_compile(&self, builder: JavaTemplateBuilder) -> Result<Arc<JavaTemplate>, TemplateSyntaxError> {
        let key = builder.fingerprint();
        let cached = self
            .templates
            .read()
            .ok()
            .and_then(|templates| templates.get(&key).cloned());
        if let Some(template) = cached {
            if template.options() == &builder {
                trace!(key, "template cache hit");
                return Ok(template);
            }
            // Hash collision with different options.
            return builder.build().map(Arc::new);
        }

        let template = Arc::new(builder.build()?);
        match self.templates.write() {
            Ok(mut templates) => Ok(templates.entry(key).or_insert(template).clone()),
            Err(_) => Ok(template),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.read().map(|templates| templates.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut templates) = self.templates.write() {
            templates.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_options_share_a_template() {
        let cache = TemplateCache::new();
        let a = cache.get_or_compile(JavaTemplate::builder("#{any(int)} + 1")).unwrap();
        let b = cache.get_or_compile(JavaTemplate::builder("#{any(int)} + 1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = cache
            .get_or_compile(JavaTemplate::builder("#{any(int)} + 1").imports(["java.util.List"]))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = TemplateCache::new();
        assert!(cache.get_or_compile(JavaTemplate::builder("#{any(int)")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn option_order_changes_the_key() {
        let a = JavaTemplate::builder("x").imports(["a.B", "c.D"]);
        let b = JavaTemplate::builder("x").imports(["c.D", "a.B"]);
        let c = JavaTemplate::builder("x").static_imports(["a.B", "c.D"]);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }
}
