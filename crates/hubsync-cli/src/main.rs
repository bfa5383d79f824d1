//! hubsync - keep installed H5P content types current

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hubsync_cli::cmd;
use hubsync_cli::{Cli, Commands, ConfigCommands};

const DEFAULT_LOG_FILTER: &str = "hubsync_core=info,hubsync_cli=info";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays clean.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let endpoint = cli.endpoint.as_deref();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Sync => cmd::sync::sync(endpoint, quiet).await,
        Commands::Schedule { now } => cmd::schedule::schedule(endpoint, quiet, now).await,
        Commands::Catalog => cmd::catalog::catalog(endpoint, quiet).await,
        Commands::List => cmd::list::list(),
        Commands::Restrict { machine_name, line } => cmd::restrict::restrict(&machine_name, &line),
        Commands::Unrestrict { machine_name, line } => {
            cmd::restrict::unrestrict(&machine_name, &line)
        }
        Commands::Register {
            machine_name,
            version,
        } => cmd::register::register(&machine_name, &version),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd::config::show(endpoint),
            ConfigCommands::SetEndpoint { url } => cmd::config::set_endpoint(&url),
            ConfigCommands::SetSchedule { schedule } => cmd::config::set_schedule(&schedule),
        },
    }
}
