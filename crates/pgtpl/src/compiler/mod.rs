//! Template compiler.
//!
//! A template is SQL with three kinds of tags:
//!
//! | Tag | Meaning |
//! |---|---|
//! | `{{ name }}` | named parameter |
//! | `{{# name }}` | registered fragment |
//! | `{{#or_loop array}} body {{/or_loop}}` | one OR-joined clause per element of `array` |
//!
//! `build` runs three stages in order (loop expansion, fragment substitution,
//! parameter binding) and returns SQL with `$1, $2, ...` markers plus the
//! matching argument list.
//!
//! # Example
//!
//! ```ignore
//! use pgtpl::{params, template};
//!
//! let (sql, args) = template("SELECT id FROM videos WHERE {{#or_loop ids}} #by_id {{/or_loop}}")
//!     .add_fragment("by_id", "(id = {{ id }} AND alias = {{ alias }})")
//!     .add_params(params! { "ids" => vec![1, 2], "alias" => "a" })
//!     .build()?
//!     .into_parts();
//!
//! assert_eq!(sql, "SELECT id FROM videos WHERE (id = $1 AND alias = $2) OR (id = $3 AND alias = $4)");
//! ```

mod bind;
mod context;
mod fragments;
mod loops;
mod syntax;

#[cfg(test)]
mod tests;

use crate::error::TemplateResult;
use crate::fragment::Fragments;
use crate::query::CompiledQuery;
use crate::source::TemplateSource;
use crate::value::{Params, Value};
use context::CompileContext;
use serde::Deserialize;

/// Substituted for a loop over an empty array when no fallback fragment exists.
pub const EMPTY_LOOP_SQL: &str = "TRUE = TRUE";

/// Placeholder name bound to the current element inside a loop body.
pub const LOOP_ITEM: &str = "id";

/// Suffix marking a source fragment as the loop fallback of another fragment.
pub const FALLBACK_SUFFIX: &str = "_fallback";

/// What to do with a reference to a fragment that was never registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFragment {
    /// Fail the build with [`TemplateError::UnknownFragment`](crate::TemplateError::UnknownFragment).
    #[default]
    Error,
    /// Substitute empty text and log a warning.
    Empty,
}

/// Compilation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompileOptions {
    /// Fail on placeholders with no registered parameter instead of binding `NULL`.
    #[serde(default)]
    pub strict_params: bool,
    #[serde(default)]
    pub missing_fragment: MissingFragment,
}

/// Start compiling a SQL template.
pub fn template(sql: &str) -> Compiler {
    let mut compiler = Compiler::new();
    compiler.set_sql(sql);
    compiler
}

/// Builder holding a template, its fragments and its parameters.
///
/// Use one instance per statement.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    sql: String,
    fragments: Fragments,
    params: Params,
    options: CompileOptions,
    tag: Option<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load template `name` from a [`TemplateSource`].
    pub fn from_source(source: &impl TemplateSource, name: &str) -> TemplateResult<Self> {
        let sql = source.template(name)?;
        Ok(template(&sql))
    }

    /// Set the template text (trimmed).
    pub fn set_sql(&mut self, sql: &str) -> &mut Self {
        self.sql = sql.trim().to_string();
        self
    }

    /// The template text as registered.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Register fragment `name`, replacing any earlier text.
    pub fn add_fragment(&mut self, name: &str, sql: &str) -> &mut Self {
        self.fragments.insert(name, sql);
        self
    }

    /// Register fragment `name` together with the text used when it is the body
    /// of a loop over an empty array.
    pub fn add_fragment_with_fallback(&mut self, name: &str, sql: &str, fallback: &str) -> &mut Self {
        self.fragments.insert(name, sql);
        self.fragments.insert_fallback(name, fallback);
        self
    }

    /// Register only the empty-loop fallback of fragment `name`.
    pub fn add_fallback_fragment(&mut self, name: &str, fallback: &str) -> &mut Self {
        self.fragments.insert_fallback(name, fallback);
        self
    }

    /// Load fragment `name` from a source; `<name>_fallback`, when present in
    /// the source, becomes its fallback.
    pub fn add_fragment_from(
        &mut self,
        source: &impl TemplateSource,
        name: &str,
    ) -> TemplateResult<&mut Self> {
        let sql = source.fragment(name)?;
        self.fragments.insert(name, &sql);

        let fallback_name = format!("{name}{FALLBACK_SUFFIX}");
        if source.has_fragment(&fallback_name) {
            let fallback = source.fragment(&fallback_name)?;
            self.fragments.insert_fallback(name, &fallback);
        }
        Ok(self)
    }

    /// Register every fragment a source knows about.
    ///
    /// A fragment named `<x>_fallback` is also registered as the fallback of
    /// `x` when the source has a fragment `x`.
    pub fn add_fragments_from(&mut self, source: &impl TemplateSource) -> TemplateResult<&mut Self> {
        for name in source.fragment_names() {
            let sql = source.fragment(&name)?;
            self.fragments.insert(&name, &sql);

            if let Some(base) = name.strip_suffix(FALLBACK_SUFFIX)
                && source.has_fragment(base)
            {
                self.fragments.insert_fallback(base, &sql);
            }
        }
        Ok(self)
    }

    /// Merge parameters; later values win for names already registered.
    pub fn add_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.params.merge(params);
        self
    }

    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(name, value);
        self
    }

    pub fn param_value(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn fragment_sql(&self, name: &str) -> Option<&str> {
        self.fragments.primary(name)
    }

    pub fn fallback_fragment_sql(&self, name: &str) -> Option<&str> {
        self.fragments.fallback(name)
    }

    pub fn options(&mut self, options: CompileOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn strict_params(&mut self, strict: bool) -> &mut Self {
        self.options.strict_params = strict;
        self
    }

    pub fn missing_fragment(&mut self, policy: MissingFragment) -> &mut Self {
        self.options.missing_fragment = policy;
        self
    }

    /// Associate a tag carried into execution logs.
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Compile into positional SQL and its ordered arguments.
    ///
    /// Loop parameters are bound in a per-build scope, so building twice
    /// yields the same result.
    pub fn build(&self) -> TemplateResult<CompiledQuery> {
        let mut ctx = CompileContext::new(&self.sql, &self.params, &self.fragments, &self.options);

        loops::expand_loops(&mut ctx)?;
        fragments::inline_fragments(&mut ctx)?;
        bind::bind_params(&mut ctx)?;

        Ok(CompiledQuery::new(ctx.sql, ctx.args, self.tag.clone()))
    }
}
