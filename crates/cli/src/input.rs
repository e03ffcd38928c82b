// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines event input
//!
//! Each non-blank line holds one serialized event. Lines that don't decode or
//! that the bus rejects are reported on stderr with their 1-based line number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use relay_core::{Clock, Event, EventBus, IdGen};
use tracing::debug;

/// A line that could not be emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: usize,
    pub reason: String,
}

/// Outcome of feeding one file through a bus
#[derive(Debug, Default)]
pub struct IngestReport {
    pub emitted: usize,
    pub rejected: Vec<RejectedLine>,
}

/// Emit every event in `reader`, collecting the lines that failed
pub fn ingest<C: Clock, I: IdGen>(
    bus: &EventBus<C, I>,
    reader: impl BufRead,
) -> std::io::Result<IngestReport> {
    let mut report = IngestReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = Event::from_json(&line)
            .map_err(|e| format!("malformed event: {}", e))
            .and_then(|event| bus.emit(event).map_err(|e| e.to_string()));
        match outcome {
            Ok(()) => report.emitted += 1,
            Err(reason) => report.rejected.push(RejectedLine {
                line: number,
                reason,
            }),
        }
    }

    debug!(
        emitted = report.emitted,
        rejected = report.rejected.len(),
        "input consumed"
    );
    Ok(report)
}

/// Ingest a file, warning about bad lines; with `strict`, any bad line is an
/// error once the whole file has been processed.
pub fn ingest_file<C: Clock, I: IdGen>(
    bus: &EventBus<C, I>,
    path: &Path,
    strict: bool,
) -> Result<IngestReport> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let report = ingest(bus, BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;

    for rejected in &report.rejected {
        eprintln!(
            "warning: {}:{}: {}",
            path.display(),
            rejected.line,
            rejected.reason
        );
    }

    if strict && !report.rejected.is_empty() {
        anyhow::bail!(
            "{} invalid line(s) in {}",
            report.rejected.len(),
            path.display()
        );
    }
    Ok(report)
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
