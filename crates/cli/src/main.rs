// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay - event bus harness CLI

mod commands;
mod input;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{ingest, pattern, query, replay};
use relay_core::{BusConfig, EventBus};

#[derive(Parser)]
#[command(
    name = "relay",
    version,
    about = "Relay - feed JSON-lines events through an in-process event bus"
)]
struct Cli {
    /// Bus configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Exit non-zero if any input line is malformed or rejected
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit every event in a file and print bus statistics
    Ingest(ingest::IngestArgs),
    /// Emit a file, then print stored events matching a query
    Query(query::QueryArgs),
    /// Emit a file, then replay stored events
    Replay(replay::ReplayArgs),
    /// Check whether a pattern matches an event type
    Match(pattern::MatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Pattern checks don't need a bus
    if let Commands::Match(args) = cli.command {
        pattern::check(args);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let bus = EventBus::with_config(config)?;

    match cli.command {
        Commands::Ingest(args) => ingest::ingest(args, &bus, cli.strict)?,
        Commands::Query(args) => query::query(args, &bus, cli.strict)?,
        Commands::Replay(args) => replay::replay(args, &bus, cli.strict)?,
        Commands::Match(_) => {}
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BusConfig> {
    match path {
        Some(path) => BusConfig::load(path)
            .with_context(|| format!("invalid configuration in {}", path.display())),
        None => Ok(BusConfig::default()),
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
