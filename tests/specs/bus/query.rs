//! `relay query` specs

use crate::prelude::*;

fn ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let start = line.find("\"event_id\":\"")? + "\"event_id\":\"".len();
            let end = line[start..].find('"')?;
            Some(line[start..start + end].to_string())
        })
        .collect()
}

#[test]
fn query_by_correlation_returns_chain_in_order() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    let run = temp
        .relay()
        .args(&["query", "events.jsonl", "--correlation", "req-1"])
        .passes();
    assert_eq!(ids(&run.stdout()), vec!["e-1", "e-2", "e-3"]);
}

#[test]
fn query_by_type_and_source() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    let run = temp
        .relay()
        .args(&[
            "query",
            "events.jsonl",
            "--type",
            "input:api:received",
            "--source",
            "api",
        ])
        .passes();
    assert_eq!(ids(&run.stdout()), vec!["e-4"]);
}

#[test]
fn query_limit_keeps_most_recent() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    let run = temp
        .relay()
        .args(&["query", "events.jsonl", "--limit", "2"])
        .passes();
    assert_eq!(ids(&run.stdout()), vec!["e-3", "e-4"]);
}

#[test]
fn query_output_carries_middleware_metadata() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["query", "events.jsonl", "--type", "rag:index:done"])
        .passes()
        .stdout_has("\"processed_at\"")
        .stdout_has("\"age_ms\"")
        .stdout_has("\"priority\":1");
}

#[test]
fn query_with_no_matches_prints_nothing() {
    let temp = Project::empty();
    temp.file("events.jsonl", &sample_events());

    temp.relay()
        .args(&["query", "events.jsonl", "--correlation", "req-9"])
        .passes()
        .stdout_eq("");
}
