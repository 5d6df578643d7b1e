//! Where template and fragment text comes from.
//!
//! The compiler only needs lookups by logical name; [`FileSource`] discovers
//! `*.template.*` / `*.fragment.*` files with glob patterns and caches their
//! content, [`MemorySource`] holds text registered in code.

mod file;

pub use file::{FileSource, SourceConfig};

use crate::error::{TemplateError, TemplateResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Lookup of raw template and fragment text by logical name.
pub trait TemplateSource {
    fn has_template(&self, name: &str) -> bool;

    fn has_fragment(&self, name: &str) -> bool;

    /// Template text; [`TemplateError::NotFound`] if `name` is unknown.
    fn template(&self, name: &str) -> TemplateResult<Arc<str>>;

    /// Fragment text; [`TemplateError::NotFound`] if `name` is unknown.
    fn fragment(&self, name: &str) -> TemplateResult<Arc<str>>;

    /// Logical names of all templates, sorted.
    fn template_names(&self) -> Vec<String>;

    /// Logical names of all fragments, sorted.
    fn fragment_names(&self) -> Vec<String>;
}

impl<S: TemplateSource + ?Sized> TemplateSource for &S {
    fn has_template(&self, name: &str) -> bool {
        (**self).has_template(name)
    }

    fn has_fragment(&self, name: &str) -> bool {
        (**self).has_fragment(name)
    }

    fn template(&self, name: &str) -> TemplateResult<Arc<str>> {
        (**self).template(name)
    }

    fn fragment(&self, name: &str) -> TemplateResult<Arc<str>> {
        (**self).fragment(name)
    }

    fn template_names(&self) -> Vec<String> {
        (**self).template_names()
    }

    fn fragment_names(&self) -> Vec<String> {
        (**self).fragment_names()
    }
}

/// In-memory [`TemplateSource`].
///
/// # Example
/// ```ignore
/// let source = MemorySource::new()
///     .with_template("by_ids", "SELECT * FROM t WHERE {{#or_loop ids}} #by_id {{/or_loop}}")
///     .with_fragment("by_id", "id = {{ id }}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: BTreeMap<String, Arc<str>>,
    fragments: BTreeMap<String, Arc<str>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: &str, sql: &str) -> Self {
        self.templates.insert(name.to_string(), Arc::from(sql));
        self
    }

    pub fn with_fragment(mut self, name: &str, sql: &str) -> Self {
        self.fragments.insert(name.to_string(), Arc::from(sql));
        self
    }
}

impl TemplateSource for MemorySource {
    fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn has_fragment(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    fn template(&self, name: &str) -> TemplateResult<Arc<str>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::not_found(format!("template \"{name}\"")))
    }

    fn fragment(&self, name: &str) -> TemplateResult<Arc<str>> {
        self.fragments
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::not_found(format!("fragment \"{name}\"")))
    }

    fn template_names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn fragment_names(&self) -> Vec<String> {
        self.fragments.keys().cloned().collect()
    }
}
