//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    Project::empty()
        .relay()
        .args(&["--help"])
        .passes()
        .stdout_has("ingest")
        .stdout_has("query")
        .stdout_has("replay")
        .stdout_has("match");
}

#[test]
fn query_help_lists_filters() {
    Project::empty()
        .relay()
        .args(&["query", "--help"])
        .passes()
        .stdout_has("--type")
        .stdout_has("--correlation")
        .stdout_has("--source")
        .stdout_has("--limit");
}

#[test]
fn version_flag() {
    Project::empty()
        .relay()
        .args(&["--version"])
        .passes()
        .stdout_has("relay");
}
