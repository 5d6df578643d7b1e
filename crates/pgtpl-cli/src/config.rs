use pgtpl::{CompileOptions, SourceConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.expand_env()?;
        file.validate()?;

        Ok(Self {
            config_path,
            config_dir,
            file,
        })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// Glob patterns with relative entries anchored at the config directory.
    pub fn source_config(&self) -> SourceConfig {
        let resolve = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| self.resolve_path(p).to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        };

        SourceConfig {
            templates: resolve(&self.file.source.templates),
            fragments: resolve(&self.file.source.fragments),
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        self.file.compile.clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    pub source: SourceConfig,

    #[serde(default)]
    pub compile: CompileOptions,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for p in &mut self.source.templates {
            *p = expand_env_vars(p)?;
        }
        for p in &mut self.source.fragments {
            *p = expand_env_vars(p)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        if self.source.templates.is_empty() {
            anyhow::bail!("source.templates must not be empty");
        }
        if let Some(p) = self
            .source
            .templates
            .iter()
            .chain(&self.source.fragments)
            .find(|p| p.trim().is_empty())
        {
            anyhow::bail!("source patterns must not be empty: {p:?}");
        }

        self.source
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid [source] section: {e}"))?;

        Ok(())
    }
}

/// Replace `${NAME}` references in a source pattern with `lookup(NAME)`.
fn expand_vars(pattern: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 2..];

        let Some(close) = tail.find('}') else {
            anyhow::bail!("unterminated ${{..}} reference in source pattern {pattern:?}");
        };
        let name = &tail[..close];
        if name.trim().is_empty() {
            anyhow::bail!("empty ${{}} reference in source pattern {pattern:?}");
        }

        let value = lookup(name).ok_or_else(|| {
            anyhow::anyhow!("source pattern {pattern:?} references unset variable {name}")
        })?;
        out.push_str(&value);
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn expand_env_vars(pattern: &str) -> anyhow::Result<String> {
    expand_vars(pattern, |name| std::env::var(name).ok())
}
