use crate::cli::ListArgs;
use crate::config::ProjectConfig;
use anyhow::Context;
use pgtpl::{FALLBACK_SUFFIX, FileSource, TemplateSource};

pub fn run(args: ListArgs) -> anyhow::Result<()> {
    print!("{}", list(&args)?);
    Ok(())
}

pub fn list(args: &ListArgs) -> anyhow::Result<String> {
    let project = ProjectConfig::load(args.config.clone())?;
    let source = FileSource::new(&project.source_config())
        .with_context(|| format!("failed to load sources from {}", project.config_path.display()))?;

    let mut out = format!("templates ({}):\n", source.templates_count());
    for name in source.template_names() {
        push_entry(&mut out, &name, args.verbose.then(|| source.template_path(&name)).flatten());
    }

    out.push_str(&format!("fragments ({}):\n", source.fragments_count()));
    for name in source.fragment_names() {
        let mut label = name.clone();
        if let Some(base) = name.strip_suffix(FALLBACK_SUFFIX)
            && source.has_fragment(base)
        {
            label.push_str(&format!(" (fallback of {base})"));
        }
        push_entry(&mut out, &label, args.verbose.then(|| source.fragment_path(&name)).flatten());
    }

    Ok(out)
}

fn push_entry(out: &mut String, label: &str, path: Option<&std::path::Path>) {
    match path {
        Some(path) => out.push_str(&format!("  {label}  {}\n", path.display())),
        None => out.push_str(&format!("  {label}\n")),
    }
}
