//! Stage 2: `{{# name }}` substitution.
//!
//! Fragment text is inserted verbatim; placeholders inside it are left for
//! parameter binding.

use super::context::CompileContext;
use super::syntax::{fragment_re, required_name, try_replace_all};
use crate::error::TemplateResult;

pub(super) fn inline_fragments(ctx: &mut CompileContext<'_>) -> TemplateResult<()> {
    let sql = std::mem::take(&mut ctx.sql);

    let inlined = try_replace_all(fragment_re(), &sql, |caps| {
        let name = required_name(caps, 1, "fragment")?;
        ctx.fragment(name).map(str::to_string)
    })?;

    ctx.sql = inlined;
    ctx.trace_stage("fragments");
    Ok(())
}
