use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Render,
    List,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Render(RenderArgs),
    List(ListArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: PathBuf,
    pub template: String,
    pub params_file: Option<PathBuf>,
    /// `key=value` pairs in command-line order.
    pub params: Vec<(String, String)>,
    /// When non-empty, only these fragments (and their fallbacks) are registered.
    pub fragments: Vec<String>,
    pub format: OutputFormat,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct ListArgs {
    pub config: PathBuf,
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

const DEFAULT_CONFIG: &str = "pgtpl.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(match it.next().map(String::as_str) {
            None => HelpTopic::Root,
            Some("render") => HelpTopic::Render,
            Some("list") => HelpTopic::List,
            Some("init") => HelpTopic::Init,
            Some(other) => anyhow::bail!("unknown command: {other}"),
        })),
        "render" => parse_render(it.map(|s| s.as_str())),
        "list" => parse_list(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut template: Option<String> = None;
    let mut params_file: Option<PathBuf> = None;
    let mut params: Vec<(String, String)> = Vec::new();
    let mut fragments: Vec<String> = Vec::new();
    let mut format = OutputFormat::Text;
    let mut verbose = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Render)),
            "--config" => config = PathBuf::from(required_value(&mut it, "--config")?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--params" => params_file = Some(PathBuf::from(required_value(&mut it, "--params")?)),
            _ if token.starts_with("--params=") => {
                params_file = Some(PathBuf::from(token.trim_start_matches("--params=")));
            }
            "--param" => params.push(parse_key_value(required_value(&mut it, "--param")?)?),
            _ if token.starts_with("--param=") => {
                params.push(parse_key_value(token.trim_start_matches("--param="))?);
            }
            "--fragment" => fragments.push(required_value(&mut it, "--fragment")?.to_string()),
            _ if token.starts_with("--fragment=") => {
                fragments.push(token.trim_start_matches("--fragment=").to_string());
            }
            "--format" => format = parse_format(required_value(&mut it, "--format")?)?,
            _ if token.starts_with("--format=") => {
                format = parse_format(token.trim_start_matches("--format="))?;
            }
            "-v" | "--verbose" => verbose = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            name if template.is_none() => template = Some(name.to_string()),
            other => anyhow::bail!("unexpected argument: {other}"),
        }
    }

    let Some(template) = template else {
        anyhow::bail!("render requires a template name");
    };

    Ok(Command::Render(RenderArgs {
        config,
        template,
        params_file,
        params,
        fragments,
        format,
        verbose,
    }))
}

fn parse_list<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut verbose = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::List)),
            "--config" => config = PathBuf::from(required_value(&mut it, "--config")?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "-v" | "--verbose" => verbose = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::List(ListArgs { config, verbose }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => config = PathBuf::from(required_value(&mut it, "--config")?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

fn required_value<'a>(it: &mut impl Iterator<Item = &'a str>, flag: &str) -> anyhow::Result<&'a str> {
    it.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

fn parse_key_value(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        anyhow::bail!("--param expects key=value, got: {raw}");
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("--param key must not be empty: {raw}");
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_format(raw: &str) -> anyhow::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => anyhow::bail!("unsupported --format: {other} (expected text or json)"),
    }
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgtpl - render SQL templates to positional Postgres queries

USAGE:
  pgtpl <COMMAND> [OPTIONS]

COMMANDS:
  render        Compile a template and print its SQL and arguments
  list          List discovered templates and fragments
  init          Write a starter pgtpl.toml
  help          Print help for a command

Run `pgtpl <command> --help` for more."
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  pgtpl render <TEMPLATE> [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgtpl.toml)
  --params <FILE>       Parameters from a .json or .toml file
  --param <KEY=VALUE>   Single parameter; VALUE is parsed as JSON, else taken as text
  --fragment <NAME>     Register only the named fragments (repeatable)
  --format <FORMAT>     Output format: text | json (default: text)
  -v, --verbose         Log compiler stages to stderr
  -h, --help            Print help"
            );
        }
        HelpTopic::List => {
            println!(
                "\
USAGE:
  pgtpl list [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgtpl.toml)
  -v, --verbose         Also print file paths
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  pgtpl init [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: pgtpl.toml)
  -h, --help            Print help"
            );
        }
    }
}
