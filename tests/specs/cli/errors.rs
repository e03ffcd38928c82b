//! CLI error specs

use crate::prelude::*;

#[test]
fn no_command_shows_usage() {
    Project::empty().relay().fails().stderr_has("Usage");
}

#[test]
fn unknown_command_fails() {
    Project::empty()
        .relay()
        .args(&["publish"])
        .fails()
        .stderr_has("unrecognized subcommand");
}

#[test]
fn missing_input_file_fails() {
    Project::empty()
        .relay()
        .args(&["ingest", "missing.jsonl"])
        .fails()
        .stderr_has("failed to open missing.jsonl");
}
