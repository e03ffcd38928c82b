// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event record carried by the bus
//!
//! An [`Event`] is built once by a producer and never mutated by consumers.
//! Middleware may enrich `metadata` on the way in; everything else is fixed at
//! construction. Events that share a `correlation_id` form one causal tree,
//! linked parent-to-child through `causation_id`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::id;

/// Opaque key/value payload owned by producers and consumers
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Schema tag given to events that don't set one
pub const DEFAULT_VERSION: &str = "1.0";

/// Delivery priority. Higher priorities are dispatched first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Integer that does not name a [`Priority`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid priority value: {0}")]
pub struct InvalidPriority(pub u8);

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Normal),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Critical),
            other => Err(InvalidPriority(other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// One occurrence in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    event_id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Payload,
    source: String,
    timestamp: DateTime<Utc>,
    /// Empty only for events decoded without one; validation fills it in.
    #[serde(default)]
    correlation_id: String,
    #[serde(default)]
    causation_id: Option<String>,
    #[serde(default)]
    metadata: Payload,
    #[serde(default)]
    priority: Priority,
    #[serde(default = "default_version")]
    version: String,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl Event {
    /// Create an event with fresh identity and a new correlation chain.
    ///
    /// Construction never fails; empty `event_type` or `source` are rejected
    /// later by the validation middleware.
    pub fn new(event_type: impl Into<String>, data: Payload, source: impl Into<String>) -> Self {
        Self {
            event_id: id::fresh(),
            event_type: event_type.into(),
            data,
            source: source.into(),
            timestamp: Utc::now(),
            correlation_id: id::fresh(),
            causation_id: None,
            metadata: Payload::new(),
            priority: Priority::default(),
            version: default_version(),
        }
    }

    /// Join an existing correlation chain
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set one metadata entry, replacing any previous value
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Copy of this event with `causation_id` set; `self` is left untouched
    pub fn with_causation(&self, causation_id: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.causation_id = Some(causation_id.into());
        copy
    }

    /// Build a new event caused by this one.
    ///
    /// The child shares the correlation chain, points back at this event, and
    /// inherits its priority.
    pub fn spawn_child(
        &self,
        event_type: impl Into<String>,
        data: Payload,
        source: impl Into<String>,
    ) -> Self {
        let mut child = Event::new(event_type, data, source)
            .with_correlation_id(self.correlation_id.clone())
            .with_priority(self.priority);
        child.causation_id = Some(self.event_id.clone());
        child
    }

    /// Wall-clock time elapsed since the event was created
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Time elapsed between creation and `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn metadata(&self) -> &Payload {
        &self.metadata
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn has_correlation_id(&self) -> bool {
        !self.correlation_id.is_empty()
    }

    pub(crate) fn assign_correlation_id(&mut self) {
        self.correlation_id = id::fresh();
    }

    /// Canonical JSON shape used for logging and replay files
    pub fn to_value(&self) -> serde_json::Value {
        // Every field serializes infallibly: string keys, chrono timestamps,
        // and values that are already JSON.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild an event from its canonical shape, keeping its identity as given
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.event_type, self.event_id)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
