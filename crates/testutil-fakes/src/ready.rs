// crates/testutil-fakes/src/ready.rs
// ============================================================================
// Module: Fixture Readiness
// Description: Bridge the callback-based readiness waiter into fixture errors.
// Purpose: Let fixtures wait for services and fail with a typed error.
// Dependencies: testutil-core
// ============================================================================

//! ## Overview
//! The core waiter reports a timeout only by calling `on_timeout`. Fixtures
//! use that callback to record a `readiness_timeout` event, then turn the
//! outcome into [`FixtureError::NotReady`]. Every wait also records a
//! `readiness_wait` event with attempt and timing counters.

use std::future::Future;
use std::time::Duration;

use testutil_core::TestEvent;
use testutil_core::TestEventSink;
use testutil_core::WaitOutcome;
use testutil_core::wait_for_async;
use testutil_core::wait_for_outcome;

use crate::error::FixtureError;

/// Waits for `probe` to succeed within `timeout`.
///
/// # Errors
///
/// Returns [`FixtureError::NotReady`] when the timeout elapses first.
pub fn await_ready<P>(
    service: &'static str,
    probe: P,
    timeout: Duration,
    sink: &dyn TestEventSink,
) -> Result<(), FixtureError>
where
    P: FnMut() -> bool,
{
    let outcome = wait_for_outcome(probe, || record_timeout(service, sink), timeout);
    finish(service, outcome, timeout, sink)
}

/// Async form of [`await_ready`].
///
/// # Errors
///
/// Returns [`FixtureError::NotReady`] when the timeout elapses first.
pub async fn await_ready_async<P, Fut>(
    service: &'static str,
    probe: P,
    timeout: Duration,
    sink: &dyn TestEventSink,
) -> Result<(), FixtureError>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let outcome = wait_for_async(probe, || record_timeout(service, sink), timeout).await;
    finish(service, outcome, timeout, sink)
}

/// Records the timeout callback event.
fn record_timeout(service: &'static str, sink: &dyn TestEventSink) {
    sink.record(&TestEvent::new("readiness_timeout", service, "timed_out"));
}

/// Records the wait summary and maps a timeout to an error.
fn finish(
    service: &'static str,
    outcome: WaitOutcome,
    timeout: Duration,
    sink: &dyn TestEventSink,
) -> Result<(), FixtureError> {
    sink.record(
        &TestEvent::new("readiness_wait", service, outcome.label())
            .with_timing(outcome.attempts(), outcome.elapsed()),
    );
    if outcome.is_ready() {
        Ok(())
    } else {
        Err(FixtureError::NotReady {
            service,
            timeout,
        })
    }
}
