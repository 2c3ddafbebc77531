mod cli;
mod commands;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use commands::{aggregate, preprocess};

/// Initialize logging from the `-v` count.
fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Aggregate(args) => aggregate::run(&cli, args),
        Commands::Preprocess(args) => preprocess::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
