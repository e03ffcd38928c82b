//! `relay match` specs

use crate::prelude::*;

fn check(pattern: &str, event_type: &str) -> String {
    Project::empty()
        .relay()
        .args(&["match", pattern, event_type])
        .passes()
        .stdout()
}

#[test]
fn trailing_wildcard() {
    similar_asserts::assert_eq!(check("input:*", "input:cli:received"), "match\n");
    similar_asserts::assert_eq!(check("input:*", "input:api"), "match\n");
    similar_asserts::assert_eq!(check("input:*", "output:cli"), "no match\n");
}

#[test]
fn segment_wildcard() {
    similar_asserts::assert_eq!(check("input:*:received", "input:api:received"), "match\n");
    similar_asserts::assert_eq!(
        check("input:*:received", "input:cli:sub:received"),
        "no match\n"
    );
}

#[test]
fn exact_pattern() {
    similar_asserts::assert_eq!(check("rag:index:done", "rag:index:done"), "match\n");
    similar_asserts::assert_eq!(check("rag:index:done", "rag:index"), "no match\n");
}

#[test]
fn match_ignores_config() {
    Project::empty()
        .relay()
        .args(&["--config", "missing.toml", "match", "a", "a"])
        .passes()
        .stdout_eq("match\n");
}
