use crate::cli::{OutputFormat, RenderArgs};
use crate::config::ProjectConfig;
use anyhow::Context;
use pgtpl::{CompiledQuery, Compiler, FileSource, Params, Value};
use std::path::Path;

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    print!("{}", render(&args)?);
    Ok(())
}

/// Compile `args.template` and format the result for stdout.
pub fn render(args: &RenderArgs) -> anyhow::Result<String> {
    let project = ProjectConfig::load(args.config.clone())?;
    let source = FileSource::new(&project.source_config())
        .with_context(|| format!("failed to load sources from {}", project.config_path.display()))?;

    let mut compiler = Compiler::from_source(&source, &args.template)?;
    compiler.options(project.compile_options()).tag(args.template.as_str());

    if args.fragments.is_empty() {
        compiler.add_fragments_from(&source)?;
    } else {
        for name in &args.fragments {
            compiler.add_fragment_from(&source, name)?;
        }
    }

    let mut params = match &args.params_file {
        Some(path) => load_params_file(path)?,
        None => Params::new(),
    };
    params.merge(args.params.iter().map(|(k, v)| (k.as_str(), parse_param_value(v))));
    compiler.add_params(params);

    let query = compiler
        .build()
        .with_context(|| format!("failed to compile template {}", args.template))?;

    tracing::debug!(
        template = %args.template,
        params = query.placeholder_count(),
        "rendered template"
    );

    format_query(&query, args.format)
}

fn format_query(query: &CompiledQuery, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = format!("{}\n", query.sql());
            for (i, arg) in query.args().iter().enumerate() {
                out.push_str(&format!("-- ${} = {arg}\n", i + 1));
            }
            Ok(out)
        }
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "template": query.tag(),
                "sql": query.sql(),
                "args": query.args(),
            });
            Ok(format!("{}\n", serde_json::to_string_pretty(&doc)?))
        }
    }
}

/// JSON when it parses, plain text otherwise: `7` is a number, `[1,2]` an
/// array, `intro` a string.
fn parse_param_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::Text(raw.to_string()))
}

fn load_params_file(path: &Path) -> anyhow::Result<Params> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;

    let doc: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse params file {}: {e}", path.display()))?,
        _ => serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse params file {}: {e}", path.display()))?,
    };

    let serde_json::Value::Object(entries) = doc else {
        anyhow::bail!(
            "params file {} must contain a table of name => value",
            path.display()
        );
    };

    Ok(entries.into_iter().collect())
}
