use super::TemplateSource;
use crate::error::{TemplateError, TemplateResult};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Glob patterns for template and fragment files.
///
/// Every template pattern must contain `.template.` and every fragment
/// pattern `.fragment.`, e.g. `sql/**/*.template.sql`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub fragments: Vec<String>,
}

impl SourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(mut self, pattern: impl Into<String>) -> Self {
        self.templates.push(pattern.into());
        self
    }

    pub fn fragments(mut self, pattern: impl Into<String>) -> Self {
        self.fragments.push(pattern.into());
        self
    }

    /// Reject patterns that do not carry their kind's marker segment.
    pub fn validate(&self) -> TemplateResult<()> {
        for (kind, patterns) in [
            (FileKind::Template, &self.templates),
            (FileKind::Fragment, &self.fragments),
        ] {
            let required = format!("{}.", kind.marker());
            if let Some(bad) = patterns.iter().find(|p| !p.contains(&required)) {
                return Err(TemplateError::invalid_config(format!(
                    "{} path \"{bad}\" must include \"{required}\" in the file name, e.g. \"my-query{required}sql\"",
                    kind.label()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FileKind {
    Template,
    Fragment,
}

impl FileKind {
    fn marker(self) -> &'static str {
        match self {
            FileKind::Template => ".template",
            FileKind::Fragment => ".fragment",
        }
    }

    fn label(self) -> &'static str {
        match self {
            FileKind::Template => "template",
            FileKind::Fragment => "fragment",
        }
    }
}

/// [`TemplateSource`] backed by files on disk.
///
/// Files are discovered once, at construction. Their content is read on first
/// access and cached for the lifetime of the source.
#[derive(Debug)]
pub struct FileSource {
    template_paths: BTreeMap<String, PathBuf>,
    fragment_paths: BTreeMap<String, PathBuf>,
    cache: RwLock<HashMap<(FileKind, String), Arc<str>>>,
}

impl FileSource {
    pub fn new(config: &SourceConfig) -> TemplateResult<Self> {
        config.validate()?;

        let template_paths = discover(&config.templates, FileKind::Template)?;
        let fragment_paths = discover(&config.fragments, FileKind::Fragment)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgtpl.source",
            templates = template_paths.len(),
            fragments = fragment_paths.len(),
            "discovered template files"
        );

        Ok(Self {
            template_paths,
            fragment_paths,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn templates_count(&self) -> usize {
        self.template_paths.len()
    }

    pub fn fragments_count(&self) -> usize {
        self.fragment_paths.len()
    }

    pub fn template_path(&self, name: &str) -> Option<&Path> {
        self.template_paths.get(name).map(PathBuf::as_path)
    }

    pub fn fragment_path(&self, name: &str) -> Option<&Path> {
        self.fragment_paths.get(name).map(PathBuf::as_path)
    }

    fn paths(&self, kind: FileKind) -> &BTreeMap<String, PathBuf> {
        match kind {
            FileKind::Template => &self.template_paths,
            FileKind::Fragment => &self.fragment_paths,
        }
    }

    fn load(&self, kind: FileKind, name: &str) -> TemplateResult<Arc<str>> {
        let path = self
            .paths(kind)
            .get(name)
            .ok_or_else(|| TemplateError::not_found(format!("{} \"{name}\"", kind.label())))?;

        let key = (kind, name.to_string());
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(text) = cached {
            return Ok(text);
        }

        let text: Arc<str> = std::fs::read_to_string(path)
            .map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?
            .into();

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(key).or_insert(text).clone())
    }
}

impl TemplateSource for FileSource {
    fn has_template(&self, name: &str) -> bool {
        self.template_paths.contains_key(name)
    }

    fn has_fragment(&self, name: &str) -> bool {
        self.fragment_paths.contains_key(name)
    }

    fn template(&self, name: &str) -> TemplateResult<Arc<str>> {
        self.load(FileKind::Template, name)
    }

    fn fragment(&self, name: &str) -> TemplateResult<Arc<str>> {
        self.load(FileKind::Fragment, name)
    }

    fn template_names(&self) -> Vec<String> {
        self.template_paths.keys().cloned().collect()
    }

    fn fragment_names(&self) -> Vec<String> {
        self.fragment_paths.keys().cloned().collect()
    }
}

fn discover(patterns: &[String], kind: FileKind) -> TemplateResult<BTreeMap<String, PathBuf>> {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| {
            TemplateError::invalid_config(format!("invalid glob \"{pattern}\": {e}"))
        })?;
        for entry in entries {
            let path = entry.map_err(|e| TemplateError::Io {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if path.is_file() {
                files.insert(path);
            }
        }
    }

    let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in files {
        let name = logical_name(&path, kind).ok_or_else(|| {
            TemplateError::invalid_config(format!("invalid file name: {}", path.display()))
        })?;
        if let Some(existing) = by_name.get(&name) {
            return Err(TemplateError::invalid_config(format!(
                "{} name collision: {name} ({} and {})",
                kind.label(),
                existing.display(),
                path.display()
            )));
        }
        by_name.insert(name, path);
    }
    Ok(by_name)
}

/// File name without its extension and without the kind marker:
/// `queries/by-ids.template.sql` → `by-ids`.
fn logical_name(path: &Path, kind: FileKind) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.replacen(kind.marker(), "", 1);
    if name.is_empty() { None } else { Some(name) }
}
