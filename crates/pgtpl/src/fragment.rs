//! Named SQL fragments and their loop fallbacks.

use std::collections::HashMap;

/// Key of a registered fragment.
///
/// Fallbacks live under their own variant, so a fragment that happens to be
/// named `status_fallback` never shadows the fallback of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FragmentKey {
    Primary(String),
    Fallback(String),
}

impl FragmentKey {
    pub fn name(&self) -> &str {
        match self {
            FragmentKey::Primary(name) | FragmentKey::Fallback(name) => name,
        }
    }
}

/// Registry of fragment texts.
///
/// Names and texts are trimmed on insert; the last registration for a key wins.
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    texts: HashMap<FragmentKey, String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, sql: &str) {
        self.texts.insert(
            FragmentKey::Primary(name.trim().to_string()),
            sql.trim().to_string(),
        );
    }

    /// Register the text used in place of an `{{#or_loop}}` over an empty array
    /// whose body references fragment `name`.
    ///
    /// Blank text registers nothing, so such a loop still falls back to
    /// `TRUE = TRUE`.
    pub fn insert_fallback(&mut self, name: &str, sql: &str) {
        let sql = sql.trim();
        if sql.is_empty() {
            return;
        }
        self.texts.insert(
            FragmentKey::Fallback(name.trim().to_string()),
            sql.to_string(),
        );
    }

    pub fn get(&self, key: &FragmentKey) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    pub fn primary(&self, name: &str) -> Option<&str> {
        self.get(&FragmentKey::Primary(name.to_string()))
    }

    pub fn fallback(&self, name: &str) -> Option<&str> {
        self.get(&FragmentKey::Fallback(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
