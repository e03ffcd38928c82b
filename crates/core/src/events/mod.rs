// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events system for loose coupling and observability
//!
//! This module provides:
//! - `EventBus` - Route events to matching subscribers using patterns
//! - `EventStore` - Bounded, indexed history of emitted events
//! - `MiddlewarePipeline` - Ordered transforms applied before storage and dispatch
//! - `EventPattern` - Pattern matching for event subscriptions

mod bus;
mod middleware;
mod store;
mod subscription;

pub use bus::{
    BusStats, EmitError, EventBus, EventBusBuilder, BUS_SOURCE, HANDLER_FAILED_EVENT,
    REPLAYED_AT_KEY, REPLAYED_KEY,
};
pub use middleware::{
    LoggingMiddleware, Middleware, MiddlewarePipeline, TimingMiddleware, ValidationError,
    ValidationMiddleware, AGE_MS_KEY, PROCESSED_AT_KEY,
};
pub use store::{EventQuery, EventStore, DEFAULT_MAX_EVENTS, DEFAULT_QUERY_LIMIT};
pub use subscription::{
    EventFilter, EventPattern, Handler, HandlerError, HandlerFailure, HandlerResult,
    SubscribeOptions, SubscriptionId, SubscriptionInfo,
};
