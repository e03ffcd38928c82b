//! `relay ingest` specs

use crate::prelude::*;

#[test]
fn ingest_prints_stats() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["ingest", "events.jsonl"])
        .passes()
        .stdout_has("\"events_emitted\": 4")
        .stdout_has("\"stored_events\": 4")
        .stdout_has("\"events_dropped\": 4")
        .stdout_has("\"middleware\": 3");
}

#[test]
fn ingest_skips_blank_lines() {
    let temp = Project::empty();
    temp.file("events.jsonl", &format!("\n{}\n", sample_events()));

    temp.relay()
        .args(&["ingest", "events.jsonl"])
        .passes()
        .stdout_has("\"events_emitted\": 4");
}

#[test]
fn bad_lines_are_skipped_with_a_warning() {
    let temp = Project::empty();
    let content = format!(
        "{}\nnot json\n{}\n",
        event_line("e-1", "input:cli:received", "cli", "req-1"),
        event_line("e-2", "input:cli:received", "", "req-1"),
    );
    temp.file("events.jsonl", &content);

    temp.relay()
        .args(&["ingest", "events.jsonl"])
        .passes()
        .stdout_has("\"events_emitted\": 1")
        .stderr_has("events.jsonl:2: malformed event")
        .stderr_has("events.jsonl:3: invalid event: event source is required");
}

#[test]
fn strict_mode_fails_on_bad_lines() {
    let temp = Project::empty();
    let content = format!(
        "{}\n{{\n",
        event_line("e-1", "input:cli:received", "cli", "req-1")
    );
    temp.file("events.jsonl", &content);

    temp.relay()
        .args(&["--strict", "ingest", "events.jsonl"])
        .fails()
        .stderr_has("events.jsonl:2: malformed event")
        .stderr_has("1 invalid line(s)");
}

#[test]
fn strict_mode_passes_clean_input() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["ingest", "--strict", "events.jsonl"])
        .passes()
        .stdout_has("\"handler_errors\": 0");
}
