// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: in-process event bus
//!
//! This crate provides:
//! - The `Event` envelope with correlation and causation lineage
//! - Pattern-routed, prioritized dispatch with handler isolation
//! - A middleware pipeline applied before storage and dispatch
//! - A bounded, indexed event store with replay
//! - TOML configuration

pub mod clock;
pub mod config;
pub mod event;
pub mod events;
pub mod id;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BusConfig, ConfigError};
pub use event::{Event, InvalidPriority, Payload, Priority};
pub use events::{
    BusStats, EmitError, EventBus, EventBusBuilder, EventPattern, EventQuery, EventStore,
    HandlerResult, Middleware, MiddlewarePipeline, SubscribeOptions, SubscriptionId,
    SubscriptionInfo, ValidationError,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
