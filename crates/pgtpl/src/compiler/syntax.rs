//! Tag grammar shared by the pipeline stages.

use crate::error::{TemplateError, TemplateResult};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `{{ name }}`. Excludes `#` so fragment references and loop tags never match.
pub(super) fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([^#{}]*?)\s*\}\}").expect("invalid built-in placeholder regex")
    })
}

/// `{{# name }}`.
pub(super) fn fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*#\s*([^{}]*?)\s*\}\}").expect("invalid built-in fragment regex")
    })
}

/// `{{#or_loop array}} body {{/or_loop}}`; the body match is lazy, so the
/// first closer ends the block.
pub(super) fn loop_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*#or_loop\b([^{}]*)\}\}((?s:.*?))\{\{\s*/or_loop\s*\}\}")
            .expect("invalid built-in loop regex")
    })
}

/// A single loop opener or closer.
pub(super) fn loop_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*[#/]or_loop\b[^{}]*\}\}").expect("invalid built-in loop tag regex")
    })
}

/// Replace every match of `re` in `text`, stopping at the first error.
pub(super) fn try_replace_all(
    re: &Regex,
    text: &str,
    mut replacement: impl FnMut(&Captures<'_>) -> TemplateResult<String>,
) -> TemplateResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacement(&caps)?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

/// The trimmed name in capture `group`; empty names are rejected with the raw tag text.
pub(super) fn required_name<'h>(
    caps: &Captures<'h>,
    group: usize,
    what: &str,
) -> TemplateResult<&'h str> {
    caps.get(group)
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            TemplateError::invalid_template(format!("{what} name is empty"), &caps[0])
        })
}

/// Re-emit a placeholder in canonical form.
pub(super) fn placeholder(name: &str) -> String {
    format!("{{{{ {name} }}}}")
}
