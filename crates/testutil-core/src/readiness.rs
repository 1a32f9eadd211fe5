// crates/testutil-core/src/readiness.rs
// ============================================================================
// Module: Readiness Waiter
// Description: Busy-poll a readiness probe until it succeeds or a deadline passes.
// Purpose: Synchronize tests with fakes that start asynchronously.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! A probe is a zero-argument function returning `true` once the awaited
//! condition holds. The waiter calls it back-to-back, with no sleep between
//! attempts, until it succeeds or the deadline computed on entry has passed.
//! On timeout the caller's `on_timeout` callback runs exactly once and the
//! waiter returns; it never terminates the test itself.
//!
//! Invariants:
//! - The deadline is computed once, on entry.
//! - A probe returning `true` on its first call returns without touching
//!   `on_timeout`.
//! - Probe panics propagate to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WaitOutcome {
    /// The probe reported ready.
    Ready {
        /// Probe calls made, including the successful one.
        attempts: u32,
        /// Time from entry until the successful probe returned.
        elapsed: Duration,
    },
    /// The deadline passed and `on_timeout` was invoked.
    TimedOut {
        /// Probe calls made before giving up.
        attempts: u32,
        /// Time from entry until the timeout was detected.
        elapsed: Duration,
    },
}

impl WaitOutcome {
    /// Returns true when the probe reported ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns the number of probe calls made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Returns the time spent waiting.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Ready { elapsed, .. } | Self::TimedOut { elapsed, .. } => *elapsed,
        }
    }

    /// Returns a stable label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}

/// Deadline fixed at the start of a wait.
struct Deadline {
    /// Entry time.
    start: Instant,
    /// Entry time plus timeout; `None` when the sum overflows `Instant`.
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Starts a deadline `timeout` from now.
    fn start(timeout: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            expires_at: start.checked_add(timeout),
        }
    }

    /// Returns true once the current time is past the deadline.
    fn passed(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Instant::now() > expires_at)
    }

    /// Time since the wait started.
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// ============================================================================
// SECTION: Waiters
// ============================================================================

/// Calls `probe` until it returns `true`; calls `on_timeout` once if
/// `timeout` elapses first.
///
/// Intended for tests, where probes are cheap and waits are a few seconds at
/// most. The loop spins without sleeping.
pub fn wait_for<P, F>(probe: P, on_timeout: F, timeout: Duration)
where
    P: FnMut() -> bool,
    F: FnOnce(),
{
    let _ = wait_for_outcome(probe, on_timeout, timeout);
}

/// Same as [`wait_for`], reporting attempts and elapsed time.
pub fn wait_for_outcome<P, F>(mut probe: P, on_timeout: F, timeout: Duration) -> WaitOutcome
where
    P: FnMut() -> bool,
    F: FnOnce(),
{
    let deadline = Deadline::start(timeout);
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        if probe() {
            return WaitOutcome::Ready {
                attempts,
                elapsed: deadline.elapsed(),
            };
        }
        if deadline.passed() {
            on_timeout();
            return WaitOutcome::TimedOut {
                attempts,
                elapsed: deadline.elapsed(),
            };
        }
        std::hint::spin_loop();
    }
}

/// Async form of [`wait_for_outcome`] for probes that must await.
///
/// Failed attempts yield to the tokio scheduler instead of sleeping, so the
/// first successful probe is still observed immediately.
pub async fn wait_for_async<P, Fut, F>(mut probe: P, on_timeout: F, timeout: Duration) -> WaitOutcome
where
    P: FnMut() -> Fut,
    Fut: Future<Output = bool>,
    F: FnOnce(),
{
    let deadline = Deadline::start(timeout);
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        if probe().await {
            return WaitOutcome::Ready {
                attempts,
                elapsed: deadline.elapsed(),
            };
        }
        if deadline.passed() {
            on_timeout();
            return WaitOutcome::TimedOut {
                attempts,
                elapsed: deadline.elapsed(),
            };
        }
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// SECTION: Probes
// ============================================================================

/// Builds a probe that succeeds once a TCP connection to `addr` opens.
///
/// Resolution and connection errors count as "not ready". The connection is
/// closed immediately.
pub fn tcp_probe(addr: impl Into<String>, connect_timeout: Duration) -> impl FnMut() -> bool {
    let addr = addr.into();
    move || {
        addr.to_socket_addrs().is_ok_and(|mut candidates| {
            candidates.any(|candidate| TcpStream::connect_timeout(&candidate, connect_timeout).is_ok())
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
