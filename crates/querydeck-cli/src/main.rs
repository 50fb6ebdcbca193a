//! querydeck CLI - offline access to persisted query state
//!
//! Reads the call logs and result archives an editor session left in the
//! state directory: list history, re-export archived results, purge them.

mod commands;
mod format;

use clap::{Parser, Subcommand};
use commands::{ConnectionsCommand, ExportCommand, HistoryCommand, PurgeCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "warn",
        env = "QUERYDECK_LOG_LEVEL",
        global = true
    )]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "QUERYDECK_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connections that have a call history
    Connections(ConnectionsCommand),
    /// List the calls logged for a connection
    History(HistoryCommand),
    /// Write an archived result as JSON or CSV
    Export(ExportCommand),
    /// Delete an archived result and forget its call
    Purge(PurgeCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise apply the level to our crates
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "querydeck_cli={level},\
             querydeck_engine={level},\
             querydeck_core={level}",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {}", e))?;

    match cli.command {
        Commands::Connections(cmd) => cmd.execute(),
        Commands::History(cmd) => cmd.execute(),
        Commands::Export(cmd) => cmd.execute(),
        Commands::Purge(cmd) => cmd.execute(),
    }
}
