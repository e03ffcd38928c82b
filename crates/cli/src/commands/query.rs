// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay query <file>` - Ingest a file, then print matching stored events

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use relay_core::events::DEFAULT_QUERY_LIMIT;
use relay_core::{EventBus, EventQuery};

use crate::input;

#[derive(Args)]
pub struct QueryArgs {
    /// JSON-lines file, one event per line
    pub file: PathBuf,

    /// Only events of this exact type
    #[arg(long = "type", value_name = "TYPE")]
    pub event_type: Option<String>,

    /// Only events in this correlation chain
    #[arg(long)]
    pub correlation: Option<String>,

    /// Only events from this source
    #[arg(long)]
    pub source: Option<String>,

    /// Print at most this many of the most recent matches
    #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
    pub limit: usize,
}

impl QueryArgs {
    fn to_query(&self) -> EventQuery {
        EventQuery {
            event_type: self.event_type.clone(),
            correlation_id: self.correlation.clone(),
            source: self.source.clone(),
            limit: self.limit,
        }
    }
}

pub fn query(args: QueryArgs, bus: &EventBus, strict: bool) -> Result<()> {
    input::ingest_file(bus, &args.file, strict)?;

    let store = bus
        .get_event_store()
        .ok_or_else(|| anyhow::anyhow!("event store is disabled in configuration"))?;

    for event in store.query(&args.to_query()) {
        println!("{}", event.to_json()?);
    }
    Ok(())
}
