//! Stage 3: `{{ name }}` → `$n`.

use super::context::CompileContext;
use super::syntax::{placeholder_re, required_name, try_replace_all};
use crate::error::{TemplateError, TemplateResult};
use crate::value::Value;

/// Replace each placeholder with the next positional marker and append its
/// value to the argument list, so `$k` always binds `args[k - 1]`.
///
/// An unregistered name still gets a marker and binds `NULL`, unless
/// `strict_params` is set.
pub(super) fn bind_params(ctx: &mut CompileContext<'_>) -> TemplateResult<()> {
    let sql = std::mem::take(&mut ctx.sql);
    let mut args: Vec<Value> = Vec::new();

    let bound = try_replace_all(placeholder_re(), &sql, |caps| {
        let name = required_name(caps, 1, "parameter")?;
        let value = match ctx.param(name) {
            Some(value) => value.clone(),
            None if ctx.options.strict_params => {
                return Err(TemplateError::MissingParameter(name.to_string()));
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(target: "pgtpl.compile", param = name, "parameter not registered, binding NULL");
                Value::Null
            }
        };

        args.push(value);
        Ok(format!("${}", args.len()))
    })?;

    ctx.sql = bound;
    ctx.args = args;
    ctx.trace_stage("params");
    Ok(())
}
