// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay replay <file>` - Ingest a file, then replay stored events

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use relay_core::EventBus;

use crate::input;

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON-lines file, one event per line
    pub file: PathBuf,

    /// Only replay events of this exact type
    #[arg(long = "type", value_name = "TYPE")]
    pub event_type: Option<String>,

    /// Only replay events in this correlation chain
    #[arg(long)]
    pub correlation: Option<String>,
}

pub fn replay(args: ReplayArgs, bus: &EventBus, strict: bool) -> Result<()> {
    input::ingest_file(bus, &args.file, strict)?;

    let count = bus.replay(args.correlation.as_deref(), args.event_type.as_deref());
    println!("replayed: {}", count);
    Ok(())
}
