// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay ingest <file>` - Emit every event in a JSON-lines file

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use relay_core::EventBus;

use crate::input;

#[derive(Args)]
pub struct IngestArgs {
    /// JSON-lines file, one event per line
    pub file: PathBuf,
}

pub fn ingest(args: IngestArgs, bus: &EventBus, strict: bool) -> Result<()> {
    input::ingest_file(bus, &args.file, strict)?;
    println!("{}", serde_json::to_string_pretty(&bus.get_stats())?);
    Ok(())
}
