// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory event store with correlation and type indices
//!
//! Every appended event gets a store sequence number. The indices map a key to
//! the sequence numbers filed under it, oldest first, so FIFO eviction only
//! ever has to drop the front entry of two index lists. Sequence numbers are
//! contiguous over the live window, which makes resolving one an O(1) offset
//! into the deque.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::event::Event;

/// Default capacity of a store
pub const DEFAULT_MAX_EVENTS: usize = 10_000;
/// Default result limit for [`EventQuery`]
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Filter for [`EventStore::query`]. Unset fields match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub correlation_id: Option<String>,
    pub source: Option<String>,
    /// Keep at most this many of the most recent matches
    pub limit: usize,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            event_type: None,
            correlation_id: None,
            source: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, event: &Event) -> bool {
        self.event_type
            .as_deref()
            .is_none_or(|t| event.event_type() == t)
            && self
                .correlation_id
                .as_deref()
                .is_none_or(|c| event.correlation_id() == c)
            && self.source.as_deref().is_none_or(|s| event.source() == s)
    }
}

#[derive(Default)]
struct StoreInner {
    events: VecDeque<Event>,
    /// Sequence number of `events[0]`; `first_seq + events.len() == next_seq`
    first_seq: u64,
    next_seq: u64,
    by_correlation: HashMap<String, VecDeque<u64>>,
    by_type: HashMap<String, VecDeque<u64>>,
}

impl StoreInner {
    fn get(&self, seq: u64) -> Option<&Event> {
        let offset = seq.checked_sub(self.first_seq)?;
        self.events.get(usize::try_from(offset).ok()?)
    }

    fn resolve(&self, seqs: Option<&VecDeque<u64>>) -> Vec<&Event> {
        seqs.map(|seqs| seqs.iter().filter_map(|seq| self.get(*seq)).collect())
            .unwrap_or_default()
    }

    fn evict_oldest(&mut self) {
        let Some(oldest) = self.events.pop_front() else {
            return;
        };
        let seq = self.first_seq;
        self.first_seq += 1;
        unindex(&mut self.by_correlation, oldest.correlation_id(), seq);
        unindex(&mut self.by_type, oldest.event_type(), seq);
    }
}

fn unindex(index: &mut HashMap<String, VecDeque<u64>>, key: &str, seq: u64) {
    let Some(seqs) = index.get_mut(key) else {
        return;
    };
    if seqs.front() == Some(&seq) {
        seqs.pop_front();
    } else {
        seqs.retain(|s| *s != seq);
    }
    if seqs.is_empty() {
        index.remove(key);
    }
}

/// Bounded append-only event log
pub struct EventStore {
    max_events: usize,
    inner: RwLock<StoreInner>,
}

impl EventStore {
    /// Create a store holding at most `max_events` events (at least one)
    pub fn new(max_events: usize) -> Self {
        Self {
            max_events: max_events.max(1),
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Append an event, evicting the oldest one when full
    pub fn append(&self, event: Event) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        while inner.events.len() >= self.max_events {
            inner.evict_oldest();
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .by_correlation
            .entry(event.correlation_id().to_string())
            .or_default()
            .push_back(seq);
        inner
            .by_type
            .entry(event.event_type().to_string())
            .or_default()
            .push_back(seq);
        inner.events.push_back(event);
    }

    /// Events in one correlation chain, oldest first
    pub fn get_by_correlation(&self, correlation_id: &str) -> Vec<Event> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .resolve(inner.by_correlation.get(correlation_id))
            .into_iter()
            .cloned()
            .collect()
    }

    /// Events of exactly this type, oldest first
    pub fn get_by_type(&self, event_type: &str) -> Vec<Event> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .resolve(inner.by_type.get(event_type))
            .into_iter()
            .cloned()
            .collect()
    }

    /// Events created within `[start, end]`
    pub fn get_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Event> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .events
            .iter()
            .filter(|e| e.timestamp() >= start && e.timestamp() <= end)
            .cloned()
            .collect()
    }

    /// The `count` most recently appended events, oldest first
    pub fn get_recent(&self, count: usize) -> Vec<Event> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let skip = inner.events.len().saturating_sub(count);
        inner.events.iter().skip(skip).cloned().collect()
    }

    /// Events matching every set field of `query`, keeping the last `limit`
    pub fn query(&self, query: &EventQuery) -> Vec<Event> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());

        // Narrow through an index when one applies
        let candidates: Vec<&Event> = if let Some(correlation_id) = &query.correlation_id {
            inner.resolve(inner.by_correlation.get(correlation_id))
        } else if let Some(event_type) = &query.event_type {
            inner.resolve(inner.by_type.get(event_type))
        } else {
            inner.events.iter().collect()
        };

        let matched: Vec<&Event> = candidates
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        let skip = matched.len().saturating_sub(query.limit);
        matched.into_iter().skip(skip).cloned().collect()
    }

    /// Distinct correlation ids currently indexed, sorted
    pub fn correlation_ids(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = inner.by_correlation.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Distinct event types currently indexed, sorted
    pub fn event_types(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut types: Vec<String> = inner.by_type.keys().cloned().collect();
        types.sort();
        types
    }

    /// Drop every event and index entry
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.events.clear();
        inner.by_correlation.clear();
        inner.by_type.clear();
        let next_seq = inner.next_seq;
        inner.first_seq = next_seq;
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_events
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EVENTS)
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("len", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
