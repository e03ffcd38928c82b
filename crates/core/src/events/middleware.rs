// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Middleware pipeline applied to every event before storage and dispatch
//!
//! Steps run in registration order. Only a [`ValidationError`] can abort an
//! emit; every other step must be total. A step that panics is a wiring bug
//! and is not caught here.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::event::Event;

/// Metadata key written by [`TimingMiddleware`]
pub const PROCESSED_AT_KEY: &str = "processed_at";
/// Metadata key written by [`TimingMiddleware`]
pub const AGE_MS_KEY: &str = "age_ms";

/// Structural problems that make an event unfit for the bus
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event type is required")]
    MissingType,
    #[error("event source is required (type: {event_type})")]
    MissingSource { event_type: String },
}

/// One step of the pipeline
pub trait Middleware: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }

    fn process(&self, event: Event) -> Result<Event, ValidationError>;
}

impl<F> Middleware for F
where
    F: Fn(Event) -> Result<Event, ValidationError> + Send + Sync,
{
    fn process(&self, event: Event) -> Result<Event, ValidationError> {
        self(event)
    }
}

/// Rejects events without a type or source and repairs a missing correlation id
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMiddleware;

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &str {
        "validation"
    }

    fn process(&self, mut event: Event) -> Result<Event, ValidationError> {
        if event.event_type().is_empty() {
            return Err(ValidationError::MissingType);
        }
        if event.source().is_empty() {
            return Err(ValidationError::MissingSource {
                event_type: event.event_type().to_string(),
            });
        }
        if !event.has_correlation_id() {
            event.assign_correlation_id();
        }
        Ok(event)
    }
}

/// Stamps ingestion time and event age into metadata
#[derive(Debug, Clone, Default)]
pub struct TimingMiddleware<C: Clock> {
    clock: C,
}

impl<C: Clock> TimingMiddleware<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> Middleware for TimingMiddleware<C> {
    fn name(&self) -> &str {
        "timing"
    }

    fn process(&self, event: Event) -> Result<Event, ValidationError> {
        let now = self.clock.now();
        let age_ms = event.age_at(now).num_milliseconds();
        Ok(event
            .with_metadata(PROCESSED_AT_KEY, now.to_rfc3339())
            .with_metadata(AGE_MS_KEY, age_ms))
    }
}

/// Emits a debug record per event; never touches the event
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn process(&self, event: Event) -> Result<Event, ValidationError> {
        debug!(
            event_type = event.event_type(),
            event_id = event.event_id(),
            correlation_id = event.correlation_id(),
            source = event.source(),
            priority = %event.priority(),
            "event received"
        );
        Ok(event)
    }
}

/// Ordered list of middleware steps
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    steps: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation, timing, then logging
    pub fn standard<C: Clock>(clock: C) -> Self {
        let mut pipeline = Self::new();
        pipeline.push(ValidationMiddleware);
        pipeline.push(TimingMiddleware::new(clock));
        pipeline.push(LoggingMiddleware);
        pipeline
    }

    /// Append a step
    pub fn push(&mut self, step: impl Middleware + 'static) {
        self.steps.push(Arc::new(step));
    }

    /// Insert a step at `index`, or at the end if `index` is past it
    pub fn insert(&mut self, index: usize, step: impl Middleware + 'static) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, Arc::new(step));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run every step in order, stopping at the first validation failure
    pub fn run(&self, event: Event) -> Result<Event, ValidationError> {
        self.steps
            .iter()
            .try_fold(event, |event, step| step.process(event))
    }
}

impl fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("steps", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
