//! `relay replay` specs

use crate::prelude::*;

#[test]
fn replay_correlation_chain() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["replay", "events.jsonl", "--correlation", "req-1"])
        .passes()
        .stdout_eq("replayed: 3\n");
}

#[test]
fn replay_by_type() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["replay", "events.jsonl", "--type", "input:api:received"])
        .passes()
        .stdout_eq("replayed: 1\n");
}

#[test]
fn replay_everything() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["replay", "events.jsonl"])
        .passes()
        .stdout_eq("replayed: 4\n");
}

#[test]
fn replay_unknown_correlation() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["replay", "events.jsonl", "--correlation", "req-9"])
        .passes()
        .stdout_eq("replayed: 0\n");
}
