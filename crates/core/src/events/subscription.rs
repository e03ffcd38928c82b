// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event pattern matching and subscriptions

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::{Event, Priority};

/// Pattern for matching event types
/// Supports:
///   - Exact: "input:cli:received"
///   - Trailing wildcard: "input:*" matches anything starting with "input:"
///   - Segment wildcard: "input:*:received" matches "input:api:received" but
///     not "input:cli:sub:received" (segment counts must agree)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventPattern(String);

impl EventPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Check if this pattern matches an event type
    pub fn matches(&self, event_type: &str) -> bool {
        if self.0 == event_type {
            return true;
        }

        if let Some(prefix) = self.0.strip_suffix('*') {
            return event_type.starts_with(prefix);
        }

        if !self.0.contains('*') {
            return false;
        }

        let pattern_parts: Vec<&str> = self.0.split(':').collect();
        let event_parts: Vec<&str> = event_type.split(':').collect();

        pattern_parts.len() == event_parts.len()
            && pattern_parts
                .iter()
                .zip(&event_parts)
                .all(|(p, e)| *p == "*" || p == e)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscription handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub String);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by a failing handler
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
/// Outcome of one handler invocation
pub type HandlerResult = Result<(), HandlerError>;
/// Callback invoked with each delivered event
pub type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;
/// Extra predicate evaluated after the pattern matches
pub type EventFilter = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Optional settings for [`EventBus::subscribe`](super::EventBus::subscribe)
#[derive(Clone, Default)]
pub struct SubscribeOptions {
    pub priority: Priority,
    /// Remove the subscription after its first delivery
    pub once: bool,
    pub filter: Option<EventFilter>,
}

impl SubscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("priority", &self.priority)
            .field("once", &self.once)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Why a handler invocation did not succeed
#[derive(Debug, Error)]
pub enum HandlerFailure {
    #[error("{0}")]
    Returned(HandlerError),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerFailure::Returned(_) => "returned",
            HandlerFailure::Panicked(_) => "panicked",
        }
    }
}

/// A standing interest in events matching one pattern
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) pattern: EventPattern,
    pub(crate) priority: Priority,
    pub(crate) once: bool,
    /// Registration order; breaks priority ties
    pub(crate) sequence: u64,
    handler: Handler,
    filter: Option<EventFilter>,
    created_at: DateTime<Utc>,
    call_count: AtomicU64,
    claimed: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        pattern: EventPattern,
        handler: Handler,
        options: SubscribeOptions,
        sequence: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pattern,
            priority: options.priority,
            once: options.once,
            sequence,
            handler,
            filter: options.filter,
            created_at,
            call_count: AtomicU64::new(0),
            claimed: AtomicBool::new(false),
        }
    }

    /// Run the filter, if any
    pub(crate) fn accepts(&self, event: &Event) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(event))
    }

    /// Reserve the single delivery of a `once` subscription.
    ///
    /// Always true for ordinary subscriptions; true exactly once otherwise,
    /// even across concurrent emits.
    pub(crate) fn claim(&self) -> bool {
        !self.once || !self.claimed.swap(true, Ordering::SeqCst)
    }

    /// Call the handler, converting errors and panics into a failure value
    pub(crate) fn invoke(&self, event: &Event) -> Result<(), HandlerFailure> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.handler)(event)));
        match outcome {
            Ok(Ok(())) => {
                self.call_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Ok(Err(e)) => Err(HandlerFailure::Returned(e)),
            Err(payload) => Err(HandlerFailure::Panicked(panic_message(payload.as_ref()))),
        }
    }

    pub(crate) fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            id: self.id.clone(),
            pattern: self.pattern.clone(),
            priority: self.priority,
            once: self.once,
            has_filter: self.filter.is_some(),
            created_at: self.created_at,
            call_count: self.call_count.load(Ordering::SeqCst),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Read-only snapshot of a subscription
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub pattern: EventPattern,
    pub priority: Priority,
    pub once: bool,
    pub has_filter: bool,
    pub created_at: DateTime<Utc>,
    /// Successful deliveries so far
    pub call_count: u64,
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
