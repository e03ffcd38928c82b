// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for routing events to subscribers
//!
//! `emit` runs on the caller's thread: middleware, then the store, then every
//! matching handler in priority order. The subscription table lock is only
//! held while the dispatch list is copied out, so handlers are free to
//! subscribe and unsubscribe (themselves included).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::middleware::{Middleware, MiddlewarePipeline, ValidationError};
use super::store::EventStore;
use super::subscription::{
    EventPattern, HandlerFailure, HandlerResult, SubscribeOptions, Subscription, SubscriptionId,
    SubscriptionInfo,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{BusConfig, ConfigError};
use crate::event::{Event, Payload};
use crate::id::{IdGen, UuidIdGen};

/// Type of the synthetic event recorded when a handler fails
pub const HANDLER_FAILED_EVENT: &str = "system:error:handler_failed";
/// Source stamped on events the bus creates itself
pub const BUS_SOURCE: &str = "event_bus";
/// Metadata flag set on replayed events
pub const REPLAYED_KEY: &str = "replayed";
/// Metadata key holding the replay time
pub const REPLAYED_AT_KEY: &str = "replayed_at";

/// Errors surfaced to the caller of `emit`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    #[error("emit_async called outside a Tokio runtime")]
    NoRuntime,
}

/// Point-in-time bus statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub events_emitted: u64,
    pub events_delivered: u64,
    /// Emits that matched no subscription
    pub events_dropped: u64,
    pub handler_errors: u64,
    pub events_replayed: u64,
    pub subscriptions: usize,
    pub patterns: usize,
    pub stored_events: usize,
    pub middleware: usize,
}

#[derive(Default)]
struct Counters {
    emitted: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
    replayed: AtomicU64,
}

#[derive(Default)]
struct SubscriptionTable {
    by_id: HashMap<SubscriptionId, Arc<Subscription>>,
    /// Pattern bucket: every id registered under one literal pattern
    by_pattern: HashMap<EventPattern, Vec<SubscriptionId>>,
    next_seq: u64,
}

impl SubscriptionTable {
    /// Live subscriptions matching `event_type`, highest priority first,
    /// registration order within a priority
    fn matching(&self, event_type: &str) -> Vec<Arc<Subscription>> {
        let mut matched: Vec<Arc<Subscription>> = self
            .by_pattern
            .iter()
            .filter(|(pattern, _)| pattern.matches(event_type))
            .flat_map(|(_, ids)| ids.iter().filter_map(|id| self.by_id.get(id)).cloned())
            .collect();
        matched.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.sequence.cmp(&b.sequence))
        });
        matched
    }
}

struct BusInner<C: Clock, I: IdGen> {
    subscriptions: RwLock<SubscriptionTable>,
    middleware: RwLock<MiddlewarePipeline>,
    store: Option<Arc<EventStore>>,
    counters: Counters,
    clock: C,
    id_gen: I,
}

/// The event bus routes events to matching subscribers
pub struct EventBus<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    inner: Arc<BusInner<C, I>>,
}

impl EventBus {
    /// Bus with a store, the standard middleware and default capacity
    pub fn new() -> Self {
        EventBusBuilder::new().build()
    }

    /// Bus from a validated configuration
    pub fn with_config(config: BusConfig) -> Result<Self, ConfigError> {
        EventBusBuilder::new().config(config).try_build()
    }

    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, I: IdGen> EventBus<C, I> {
    /// Register `handler` for events whose type matches `pattern`.
    ///
    /// Never fails; a pattern that can't match anything is simply inert.
    pub fn subscribe<H>(
        &self,
        pattern: impl Into<String>,
        handler: H,
        options: SubscribeOptions,
    ) -> SubscriptionId
    where
        H: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.id_gen.next());
        let pattern = EventPattern::new(pattern);
        let created_at = self.inner.clock.now();

        let mut table = self.write_table();
        let sequence = table.next_seq;
        table.next_seq += 1;

        let subscription = Subscription::new(
            id.clone(),
            pattern.clone(),
            Arc::new(handler),
            options,
            sequence,
            created_at,
        );
        debug!(
            subscription_id = %id,
            pattern = %pattern,
            priority = %subscription.priority,
            once = subscription.once,
            "subscribed"
        );
        table
            .by_pattern
            .entry(pattern)
            .or_default()
            .push(id.clone());
        table.by_id.insert(id.clone(), Arc::new(subscription));
        id
    }

    /// Subscribe with default options
    pub fn on<H>(&self, pattern: impl Into<String>, handler: H) -> SubscriptionId
    where
        H: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(pattern, handler, SubscribeOptions::new())
    }

    /// Subscribe for a single delivery
    pub fn once<H>(&self, pattern: impl Into<String>, handler: H) -> SubscriptionId
    where
        H: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(pattern, handler, SubscribeOptions::new().once())
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut table = self.write_table();
        let Some(subscription) = table.by_id.remove(id) else {
            return false;
        };

        let bucket_empty = match table.by_pattern.get_mut(&subscription.pattern) {
            Some(ids) => {
                ids.retain(|other| other != id);
                ids.is_empty()
            }
            None => false,
        };
        if bucket_empty {
            table.by_pattern.remove(&subscription.pattern);
        }

        debug!(subscription_id = %id, "unsubscribed");
        true
    }

    /// Append a middleware step. Events already stored are not reprocessed.
    pub fn add_middleware(&self, step: impl Middleware + 'static) {
        let mut pipeline = self
            .inner
            .middleware
            .write()
            .unwrap_or_else(|e| e.into_inner());
        debug!(step = step.name(), "middleware added");
        pipeline.push(step);
    }

    /// Process, store and dispatch an event.
    ///
    /// Only validation failures are returned. Handler failures are counted,
    /// logged and recorded as `system:error:handler_failed` events in the
    /// store; they never reach the caller or block other handlers.
    pub fn emit(&self, event: Event) -> Result<(), EmitError> {
        let pipeline = self
            .inner
            .middleware
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let event = pipeline.run(event).map_err(|e| {
            warn!(error = %e, "event rejected by middleware");
            EmitError::from(e)
        })?;
        self.inner.counters.emitted.fetch_add(1, Ordering::SeqCst);

        if let Some(store) = &self.inner.store {
            store.append(event.clone());
        }

        let matched = self.read_table().matching(event.event_type());
        if matched.is_empty() {
            self.inner.counters.dropped.fetch_add(1, Ordering::SeqCst);
            debug!(event_type = event.event_type(), "no subscribers");
            return Ok(());
        }

        // Every matched `once` subscription is spent by this pass, whether or
        // not its filter accepted the event.
        let spent_once: Vec<SubscriptionId> = matched
            .iter()
            .filter(|s| s.once)
            .map(|s| s.id.clone())
            .collect();

        for subscription in &matched {
            if !subscription.accepts(&event) || !subscription.claim() {
                continue;
            }

            match subscription.invoke(&event) {
                Ok(()) => {
                    self.inner.counters.delivered.fetch_add(1, Ordering::SeqCst);
                }
                Err(failure) => self.record_failure(subscription, &event, failure),
            }
        }

        for id in &spent_once {
            self.unsubscribe(id);
        }
        Ok(())
    }

    /// Run `emit` on the blocking thread pool of the current Tokio runtime.
    ///
    /// Fails with [`EmitError::NoRuntime`] when no runtime is entered. No
    /// ordering is guaranteed relative to other emits.
    pub fn emit_async(
        &self,
        event: Event,
    ) -> Result<JoinHandle<Result<(), EmitError>>, EmitError> {
        let runtime = Handle::try_current().map_err(|_| EmitError::NoRuntime)?;
        let bus = self.clone();
        Ok(runtime.spawn_blocking(move || bus.emit(event)))
    }

    /// Re-emit stored events, filtered by correlation id and/or type.
    ///
    /// Each copy carries `metadata.replayed = true`. Synthetic handler
    /// failure records are skipped. Returns the number of events re-emitted;
    /// 0 when the bus has no store.
    pub fn replay(&self, correlation_id: Option<&str>, event_type: Option<&str>) -> usize {
        let Some(store) = &self.inner.store else {
            return 0;
        };

        let events: Vec<Event> = match (correlation_id, event_type) {
            (Some(correlation_id), event_type) => store
                .get_by_correlation(correlation_id)
                .into_iter()
                .filter(|e| event_type.is_none_or(|t| e.event_type() == t))
                .collect(),
            (None, Some(event_type)) => store.get_by_type(event_type),
            (None, None) => store.get_recent(store.len()),
        };

        let replayed_at = self.inner.clock.now().to_rfc3339();
        let mut count = 0;
        for event in events.into_iter().filter(|e| !is_handler_failure(e)) {
            let event = event
                .with_metadata(REPLAYED_KEY, true)
                .with_metadata(REPLAYED_AT_KEY, replayed_at.clone());
            match self.emit(event) {
                Ok(()) => count += 1,
                Err(e) => warn!(error = %e, "replayed event rejected"),
            }
        }

        self.inner
            .counters
            .replayed
            .fetch_add(count as u64, Ordering::SeqCst);
        info!(
            count,
            correlation_id = correlation_id.unwrap_or("*"),
            event_type = event_type.unwrap_or("*"),
            "replay complete"
        );
        count
    }

    pub fn get_stats(&self) -> BusStats {
        let (subscriptions, patterns) = {
            let table = self.read_table();
            (table.by_id.len(), table.by_pattern.len())
        };
        let middleware = self
            .inner
            .middleware
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        let counters = &self.inner.counters;

        BusStats {
            events_emitted: counters.emitted.load(Ordering::SeqCst),
            events_delivered: counters.delivered.load(Ordering::SeqCst),
            events_dropped: counters.dropped.load(Ordering::SeqCst),
            handler_errors: counters.errors.load(Ordering::SeqCst),
            events_replayed: counters.replayed.load(Ordering::SeqCst),
            subscriptions,
            patterns,
            stored_events: self.inner.store.as_ref().map_or(0, |s| s.len()),
            middleware,
        }
    }

    /// The attached store, if storage is enabled
    pub fn get_event_store(&self) -> Option<Arc<EventStore>> {
        self.inner.store.clone()
    }

    /// Drop every subscription and clear the store
    pub fn clear(&self) {
        {
            let mut table = self.write_table();
            table.by_id.clear();
            table.by_pattern.clear();
        }
        if let Some(store) = &self.inner.store {
            store.clear();
        }
        info!("event bus cleared");
    }

    /// Get count of active subscriptions
    pub fn subscription_count(&self) -> usize {
        self.read_table().by_id.len()
    }

    /// Snapshots of all subscriptions in registration order
    pub fn list_subscriptions(&self) -> Vec<SubscriptionInfo> {
        let table = self.read_table();
        let mut subscriptions: Vec<&Arc<Subscription>> = table.by_id.values().collect();
        subscriptions.sort_by_key(|s| s.sequence);
        subscriptions.into_iter().map(|s| s.info()).collect()
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Option<SubscriptionInfo> {
        self.read_table().by_id.get(id).map(|s| s.info())
    }

    /// Names of the middleware steps in execution order
    pub fn middleware_names(&self) -> Vec<String> {
        self.inner
            .middleware
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .names()
    }

    fn record_failure(&self, subscription: &Subscription, event: &Event, failure: HandlerFailure) {
        self.inner.counters.errors.fetch_add(1, Ordering::SeqCst);
        error!(
            subscription_id = %subscription.id,
            pattern = %subscription.pattern,
            event_type = event.event_type(),
            event_id = event.event_id(),
            error = %failure,
            "event handler failed"
        );

        let Some(store) = &self.inner.store else {
            return;
        };
        let data = match json!({
            "subscription_id": subscription.id.0,
            "pattern": subscription.pattern.as_str(),
            "event_id": event.event_id(),
            "event_type": event.event_type(),
            "error": failure.to_string(),
            "error_kind": failure.kind(),
        }) {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        };
        // Stored for inspection only; dispatching it could loop forever.
        store.append(event.spawn_child(HANDLER_FAILED_EVENT, data, BUS_SOURCE));
    }

    fn read_table(&self) -> std::sync::RwLockReadGuard<'_, SubscriptionTable> {
        self.inner
            .subscriptions
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn write_table(&self) -> std::sync::RwLockWriteGuard<'_, SubscriptionTable> {
        self.inner
            .subscriptions
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Failure records the bus stored itself
fn is_handler_failure(event: &Event) -> bool {
    event.event_type() == HANDLER_FAILED_EVENT && event.source() == BUS_SOURCE
}

impl<C: Clock, I: IdGen> Clone for EventBus<C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock, I: IdGen> std::fmt::Debug for EventBus<C, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscription_count())
            .field("store", &self.inner.store)
            .field("middleware", &self.middleware_names())
            .finish()
    }
}

/// Event bus builder
pub struct EventBusBuilder<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    config: BusConfig,
    clock: C,
    id_gen: I,
}

impl EventBusBuilder {
    pub fn new() -> Self {
        Self {
            config: BusConfig::default(),
            clock: SystemClock,
            id_gen: UuidIdGen,
        }
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, I: IdGen> EventBusBuilder<C, I> {
    /// Replace the whole configuration
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable the event store
    pub fn store(mut self, enabled: bool) -> Self {
        self.config.store.enabled = enabled;
        self
    }

    pub fn max_events(mut self, max_events: usize) -> Self {
        self.config.store.max_events = max_events;
        self
    }

    /// Install validation, timing and logging middleware
    pub fn default_middleware(mut self, enabled: bool) -> Self {
        self.config.middleware.defaults = enabled;
        self
    }

    pub fn clock<C2: Clock>(self, clock: C2) -> EventBusBuilder<C2, I> {
        EventBusBuilder {
            config: self.config,
            clock,
            id_gen: self.id_gen,
        }
    }

    pub fn id_gen<I2: IdGen>(self, id_gen: I2) -> EventBusBuilder<C, I2> {
        EventBusBuilder {
            config: self.config,
            clock: self.clock,
            id_gen,
        }
    }

    /// Validate the configuration, then build
    pub fn try_build(self) -> Result<EventBus<C, I>, ConfigError> {
        self.config.validate()?;
        Ok(self.build())
    }

    /// Build without validating; a zero `max_events` is raised to 1
    pub fn build(self) -> EventBus<C, I> {
        let pipeline = if self.config.middleware.defaults {
            MiddlewarePipeline::standard(self.clock.clone())
        } else {
            MiddlewarePipeline::new()
        };
        let store = self
            .config
            .store
            .enabled
            .then(|| Arc::new(EventStore::new(self.config.store.max_events)));

        EventBus {
            inner: Arc::new(BusInner {
                subscriptions: RwLock::new(SubscriptionTable::default()),
                middleware: RwLock::new(pipeline),
                store,
                counters: Counters::default(),
                clock: self.clock,
                id_gen: self.id_gen,
            }),
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
