mod cli;
mod config;
mod init;
mod list;
mod render;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Render(args) => {
            init_logging(args.verbose);
            render::run(args)
        }
        cli::Command::List(args) => {
            init_logging(args.verbose);
            list::run(args)
        }
        cli::Command::Init(args) => init::run(args),
    }
}

/// Diagnostics go to stderr so rendered SQL on stdout stays pipeable.
/// `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose { "pgtpl=debug,pgtpl_cli=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
