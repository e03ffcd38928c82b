//! `--config` specs

use crate::prelude::*;

#[test]
fn store_capacity_from_config() {
    let temp = Project::empty();
    temp.file("relay.toml", "[store]\nmax_events = 2\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "ingest", "events.jsonl"])
        .passes()
        .stdout_has("\"events_emitted\": 4")
        .stdout_has("\"stored_events\": 2");
}

#[test]
fn disabled_store_replays_nothing() {
    let temp = Project::empty();
    temp.file("relay.toml", "[store]\nenabled = false\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "replay", "events.jsonl"])
        .passes()
        .stdout_eq("replayed: 0\n");
}

#[test]
fn disabled_store_cannot_be_queried() {
    let temp = Project::empty();
    temp.file("relay.toml", "[store]\nenabled = false\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "query", "events.jsonl"])
        .fails()
        .stderr_has("event store is disabled");
}

#[test]
fn middleware_can_be_turned_off() {
    let temp = Project::empty();
    temp.file("relay.toml", "[middleware]\ndefaults = false\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "query", "events.jsonl"])
        .passes()
        .stdout_lacks("processed_at");
}

#[test]
fn zero_capacity_is_rejected() {
    let temp = Project::empty();
    temp.file("relay.toml", "[store]\nmax_events = 0\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "ingest", "events.jsonl"])
        .fails()
        .stderr_has("invalid configuration in relay.toml")
        .stderr_has("max_events must be at least 1");
}

#[test]
fn unknown_keys_are_rejected() {
    let temp = Project::empty();
    temp.file("relay.toml", "[store]\ncapacity = 10\n");
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["--config", "relay.toml", "ingest", "events.jsonl"])
        .fails()
        .stderr_has("invalid configuration");
}

#[test]
fn verbose_logs_to_stderr() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["-v", "ingest", "events.jsonl"])
        .passes()
        .stderr_has("no subscribers");
}
