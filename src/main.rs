//! embedplay - player core for embed-URL video sources
//!
//! # Usage
//!
//! ```bash
//! embedplay sources
//! embedplay resolve 1396 -t tv -s 2 -e 5 -p vidsrc
//! embedplay script --interval-ms 250
//! embedplay walk 1396 --seasons 1:7,2:13 -s 1 -e 7 next next prev source:1 fail
//! ```

mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedplay::cli::{Cli, Command, ExitCode, Output};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run_cli(&cli).await.into()
}

/// Run CLI command and return exit code
async fn run_cli(cli: &Cli) -> ExitCode {
    let output = Output::new(cli);

    match &cli.command {
        Command::Sources(_) => commands::sources_cmd(cli, &output).await,

        Command::Resolve(cmd) => commands::resolve_cmd(cmd, cli, &output).await,

        Command::Script(cmd) => commands::script_cmd(cmd, cli, &output),

        Command::Walk(cmd) => commands::walk_cmd(cmd, cli, &output).await,
    }
}
