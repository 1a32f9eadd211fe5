// crates/testutil-core/src/lib.rs
// ============================================================================
// Module: Testutil Core Library
// Description: Readiness polling, crash assertion, and output capture helpers.
// Purpose: Synchronize tests with asynchronously-starting fakes and verify fatal exits.
// Dependencies: serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Test-support building blocks shared by integration-style tests:
//! - [`wait_for`] and [`wait_for_async`] poll a probe until it reports ready or
//!   a deadline passes, then hand control to a caller-supplied timeout callback.
//! - [`assert_crashes`] re-executes the current test binary to prove that the
//!   code under test terminates the process abnormally.
//! - [`capture_output`] collects what a print function writes.
//!
//! Invariants:
//! - Timeouts and failed crash assertions surface only through callbacks.
//! - A readiness deadline is computed once per wait and never recomputed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capture;
pub mod config;
pub mod crash;
pub mod log;
pub mod readiness;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use capture::CaptureError;
pub use capture::SharedOutput;
pub use capture::capture_output;
pub use config::FixtureConfig;
pub use config::FixtureEnv;
pub use crash::CRASH_MARKER_ENV;
pub use crash::ChildExit;
pub use crash::ChildReport;
pub use crash::CrashAsserter;
pub use crash::CrashVerdict;
pub use crash::CurrentExeLauncher;
pub use crash::FakeLauncher;
pub use crash::LaunchError;
pub use crash::ProcessLauncher;
pub use crash::Role;
pub use crash::RoleMarker;
pub use crash::assert_crashes;
pub use crash::check_crash;
pub use log::MemoryEventSink;
pub use log::NoopEventSink;
pub use log::StderrEventSink;
pub use log::TestEvent;
pub use log::TestEventSink;
pub use readiness::WaitOutcome;
pub use readiness::tcp_probe;
pub use readiness::wait_for;
pub use readiness::wait_for_async;
pub use readiness::wait_for_outcome;
