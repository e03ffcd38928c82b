// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay match <pattern> <event-type>` - Check a subscription pattern

use clap::Args;
use relay_core::EventPattern;

#[derive(Args)]
pub struct MatchArgs {
    /// Subscription pattern, e.g. `input:*` or `input:*:received`
    pub pattern: String,

    /// Event type to test against the pattern
    pub event_type: String,
}

pub fn check(args: MatchArgs) {
    if EventPattern::new(args.pattern).matches(&args.event_type) {
        println!("match");
    } else {
        println!("no match");
    }
}
