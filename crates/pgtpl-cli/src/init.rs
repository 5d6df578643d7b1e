use crate::cli::InitArgs;
use anyhow::Context;
use std::path::Path;

const STARTER_CONFIG: &str = r#"version = "1"

[source]
# Every template file name must contain ".template.", every fragment ".fragment.".
templates = ["sql/**/*.template.sql"]
fragments = ["sql/fragments/*.fragment.sql"]

[compile]
strict_params = false
missing_fragment = "error" # error | empty
"#;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_starter(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn write_starter(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
