//! # pgtpl
//!
//! SQL templates with named placeholders, reusable fragments and OR-loops,
//! compiled to positional Postgres queries.
//!
//! ## Features
//!
//! - **Named placeholders**: write `{{ name }}`, get `$1, $2, ...` plus an ordered argument list
//! - **Fragments**: `{{# name }}` inlines a registered SQL snippet
//! - **OR-loops**: `{{#or_loop ids}} (id = {{ id }}) {{/or_loop}}` expands to one clause per element
//! - **Empty-array fallbacks**: a loop over `[]` becomes `TRUE = TRUE` or the fragment's fallback
//! - **File discovery**: `*.template.sql` / `*.fragment.sql` files found by glob, read once
//!
//! ## Example
//!
//! ```ignore
//! use pgtpl::{params, template};
//!
//! let query = template("SELECT id FROM videos WHERE {{#or_loop ids}} (id = {{ id }}) {{/or_loop}}")
//!     .add_params(params! { "ids" => vec![1, 2, 3] })
//!     .build()?;
//!
//! assert_eq!(query.sql(), "SELECT id FROM videos WHERE (id = $1) OR (id = $2) OR (id = $3)");
//! let rows = query.fetch_all(&client).await?;
//! ```

pub mod client;
pub mod compiler;
pub mod error;
pub mod fragment;
pub mod query;
pub mod source;
pub mod value;

pub use client::GenericClient;
pub use compiler::{
    CompileOptions, Compiler, EMPTY_LOOP_SQL, FALLBACK_SUFFIX, LOOP_ITEM, MissingFragment,
    template,
};
pub use error::{TemplateError, TemplateResult};
pub use fragment::{FragmentKey, Fragments};
pub use query::CompiledQuery;
pub use source::{FileSource, MemorySource, SourceConfig, TemplateSource};
pub use value::{Params, Value};
