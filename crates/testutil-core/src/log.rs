// crates/testutil-core/src/log.rs
// ============================================================================
// Module: Test Event Logging
// Description: Structured events for readiness waits, crash checks, and fixtures.
// Purpose: Emit JSON-line diagnostics without forcing a logging framework on tests.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Helpers record [`TestEvent`] values through a [`TestEventSink`]. Sinks are
//! deliberately small so a test suite can route events to stderr, keep them
//! in memory for assertions, or drop them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Structured test-support event.
///
/// # Invariants
/// - `event` is a stable snake_case identifier.
/// - Optional fields are `None` when they do not apply to the event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Service name, test selector, or probe label the event concerns.
    pub subject: String,
    /// Outcome label.
    pub outcome: &'static str,
    /// Probe attempts for readiness events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Elapsed wall-clock time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u128>,
    /// Free-form detail such as an exit status or an error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TestEvent {
    /// Creates an event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(event: &'static str, subject: impl Into<String>, outcome: &'static str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            subject: subject.into(),
            outcome,
            attempts: None,
            elapsed_ms: None,
            detail: None,
        }
    }

    /// Attaches attempt and elapsed-time counters.
    #[must_use]
    pub fn with_timing(mut self, attempts: u32, elapsed: Duration) -> Self {
        self.attempts = Some(attempts);
        self.elapsed_ms = Some(elapsed.as_millis());
        self
    }

    /// Attaches a detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for test-support events.
pub trait TestEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &TestEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that drops every event.
pub struct NoopEventSink;

impl TestEventSink for NoopEventSink {
    fn record(&self, _event: &TestEvent) {}
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl TestEventSink for StderrEventSink {
    fn record(&self, event: &TestEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that keeps events in memory.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<TestEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<TestEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events with the given identifier.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<TestEvent> {
        self.events().into_iter().filter(|recorded| recorded.event == event).collect()
    }
}

impl TestEventSink for MemoryEventSink {
    fn record(&self, event: &TestEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test-only assertions favor expect for clarity.")]

    use std::time::Duration;

    use super::MemoryEventSink;
    use super::TestEvent;
    use super::TestEventSink;

    #[test]
    fn memory_sink_keeps_arrival_order() {
        let sink = MemoryEventSink::new();
        sink.record(&TestEvent::new("readiness_wait", "redis", "ready"));
        sink.record(&TestEvent::new("crash_child_exit", "boom", "crashed"));
        let names: Vec<_> = sink.events().iter().map(|event| event.event).collect();
        assert_eq!(names, vec!["readiness_wait", "crash_child_exit"]);
        assert_eq!(sink.events_named("crash_child_exit").len(), 1);
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let event = TestEvent::new("fixture_ready", "s3", "ok");
        let json = serde_json::to_value(&event).expect("serialize");
        assert!(json.get("attempts").is_none());
        assert!(json.get("detail").is_none());

        let timed = event.with_timing(3, Duration::from_millis(42)).with_detail("bucket=b");
        let json = serde_json::to_value(&timed).expect("serialize");
        assert_eq!(json["attempts"], 3);
        assert_eq!(json["elapsed_ms"], 42);
        assert_eq!(json["detail"], "bucket=b");
    }
}
