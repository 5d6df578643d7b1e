use super::{CompileOptions, MissingFragment};
use crate::error::{TemplateError, TemplateResult};
use crate::fragment::Fragments;
use crate::value::{Params, Value};

/// State threaded through the pipeline stages of one `build`.
///
/// Loop expansion binds per-element parameters into `loop_params`; parameter
/// binding reads them back before falling through to the caller's parameters.
pub(super) struct CompileContext<'a> {
    pub(super) sql: String,
    pub(super) args: Vec<Value>,
    params: &'a Params,
    loop_params: Params,
    fragments: &'a Fragments,
    pub(super) options: &'a CompileOptions,
}

impl<'a> CompileContext<'a> {
    pub(super) fn new(
        sql: &str,
        params: &'a Params,
        fragments: &'a Fragments,
        options: &'a CompileOptions,
    ) -> Self {
        Self {
            sql: sql.to_string(),
            args: Vec::new(),
            params,
            loop_params: Params::new(),
            fragments,
            options,
        }
    }

    pub(super) fn param(&self, name: &str) -> Option<&Value> {
        self.loop_params
            .get(name)
            .or_else(|| self.params.get(name))
    }

    pub(super) fn bind_loop_param(&mut self, name: String, value: Value) {
        self.loop_params.insert(name, value);
    }

    /// Primary text of fragment `name`, subject to the missing-fragment policy.
    pub(super) fn fragment(&self, name: &str) -> TemplateResult<&'a str> {
        match self.fragments.primary(name) {
            Some(sql) => Ok(sql),
            None => match self.options.missing_fragment {
                MissingFragment::Error => Err(TemplateError::UnknownFragment(name.to_string())),
                MissingFragment::Empty => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(target: "pgtpl.compile", fragment = name, "fragment not registered, substituting empty text");
                    Ok("")
                }
            },
        }
    }

    pub(super) fn fallback(&self, name: &str) -> Option<&'a str> {
        self.fragments.fallback(name)
    }

    pub(super) fn trace_stage(&self, stage: &'static str) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "pgtpl.compile", stage, sql = %self.sql);
        #[cfg(not(feature = "tracing"))]
        let _ = stage;
    }
}
