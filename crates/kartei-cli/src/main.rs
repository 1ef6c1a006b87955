//! Kartei CLI - retry failed card extractions and reconcile the results.

use anyhow::Context;
use clap::Parser;
use kartei_cli::commands::{self, Completion};
use kartei_cli::{AppConfig, Cli, Command, Formatter};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(completion) => std::process::exit(completion.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<Completion> {
    let (config, source) =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    match &source {
        Some(path) => debug!(path = %path.display(), "Configuration loaded"),
        None => debug!("No configuration file found, using defaults"),
    }

    let formatter = Formatter::new(!cli.no_color);

    match cli.command {
        Command::Retry(args) => Ok(commands::execute_retry(args, config, &formatter).await?),
        Command::Merge(args) => {
            commands::execute_merge(args, config, &formatter)?;
            Ok(Completion::Done)
        }
        Command::Combine(args) => {
            commands::execute_combine(args, &config, &formatter)?;
            Ok(Completion::Done)
        }
    }
}
