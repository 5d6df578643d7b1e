//! Stage 1: `{{#or_loop array}} body {{/or_loop}}` expansion.
//!
//! Each block becomes the body repeated once per array element and joined with
//! ` OR `. Inside every copy, `{{ id }}` placeholders are renamed to
//! `array-i_k` and bound to the element, so each clause gets its own
//! positional argument. Other placeholders are left for parameter binding.

use super::context::CompileContext;
use super::syntax::{
    loop_block_re, loop_tag_re, placeholder, placeholder_re, required_name, try_replace_all,
};
use super::{EMPTY_LOOP_SQL, LOOP_ITEM};
use crate::error::{TemplateError, TemplateResult};
use crate::value::Value;

const OR: &str = " OR ";

#[derive(Clone, Copy)]
enum LoopBody<'t> {
    /// `#fragment_name`
    Fragment(&'t str),
    /// Inline SQL.
    Literal(&'t str),
}

impl<'t> LoopBody<'t> {
    fn parse(body: &'t str, block: &str) -> TemplateResult<Self> {
        let body = body.trim();
        if body.is_empty() {
            return Err(TemplateError::invalid_template("loop body is empty", block));
        }
        if loop_tag_re().is_match(body) {
            return Err(TemplateError::invalid_template(
                "nested or_loop blocks are not supported",
                block,
            ));
        }
        match body.strip_prefix('#') {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::invalid_template(
                        "loop body fragment name is empty",
                        block,
                    ));
                }
                Ok(LoopBody::Fragment(name))
            }
            None => Ok(LoopBody::Literal(body)),
        }
    }
}

pub(super) fn expand_loops(ctx: &mut CompileContext<'_>) -> TemplateResult<()> {
    let sql = std::mem::take(&mut ctx.sql);

    let outside_blocks = loop_block_re().replace_all(&sql, "");
    if let Some(stray) = loop_tag_re().find(&outside_blocks) {
        return Err(TemplateError::invalid_template(
            "or_loop tag without a matching opener or closer",
            stray.as_str(),
        ));
    }

    let expanded = try_replace_all(loop_block_re(), &sql, |caps| {
        let array_name = required_name(caps, 1, "loop array")?;
        let body = LoopBody::parse(&caps[2], &caps[0])?;

        let items = match ctx.param(array_name) {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(TemplateError::TypeMismatch {
                    name: array_name.to_string(),
                    expected: "array",
                    actual: other.type_name(),
                });
            }
            None => return Err(TemplateError::MissingParameter(array_name.to_string())),
        };

        if items.is_empty() {
            let fallback = match body {
                LoopBody::Fragment(name) => ctx.fallback(name),
                LoopBody::Literal(_) => None,
            };
            return Ok(fallback.unwrap_or(EMPTY_LOOP_SQL).to_string());
        }

        let body_sql = match body {
            LoopBody::Fragment(name) => ctx.fragment(name)?,
            LoopBody::Literal(sql) => sql,
        };

        let mut clauses = Vec::with_capacity(items.len());
        for (index, value) in items.into_iter().enumerate() {
            clauses.push(expand_element(ctx, array_name, index, value, body_sql)?);
        }
        Ok(clauses.join(OR))
    })?;

    ctx.sql = expanded;
    ctx.trace_stage("loops");
    Ok(())
}

fn expand_element(
    ctx: &mut CompileContext<'_>,
    array_name: &str,
    index: usize,
    value: Value,
    body_sql: &str,
) -> TemplateResult<String> {
    let element_key = format!("{array_name}-{index}");
    ctx.bind_loop_param(element_key.clone(), value.clone());

    let mut next_id = 0usize;
    try_replace_all(placeholder_re(), body_sql, |caps| {
        let name = required_name(caps, 1, "loop parameter")?;
        if name != LOOP_ITEM {
            return Ok(placeholder(name));
        }

        let key = format!("{element_key}_{next_id}");
        next_id += 1;
        let rendered = placeholder(&key);
        ctx.bind_loop_param(key, value.clone());
        Ok(rendered)
    })
}
