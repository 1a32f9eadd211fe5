// crates/testutil-core/src/crash.rs
// ============================================================================
// Module: Crash Asserter
// Description: Re-execute a single test in a child process and inspect its exit.
// Purpose: Verify that code under test terminates the process abnormally.
// Dependencies: std::process, thiserror
// ============================================================================

//! ## Overview
//! Code that ends the process (for example via `std::process::exit(1)` or an
//! uncaught panic in a test) cannot be observed from inside the same process.
//! [`assert_crashes`] therefore runs in two roles:
//! - **Parent**: re-executes the current test binary filtered to one test,
//!   with the role marker set, waits for it, and classifies its exit.
//! - **Child**: runs the code under test; if it returns, exits with code 0.
//!
//! The role is decided once, from the marker, by [`Role::from_env`]. The
//! decide-then-act core ([`CrashAsserter::check`]) takes the role and a
//! [`ProcessLauncher`] as values, so it can be driven by [`FakeLauncher`]
//! without spawning anything.
//!
//! Preconditions:
//! - Call at most once per test. A second call in the same test would run in
//!   the child role for the first call's child and never be checked.
//! - The test binary must accept a libtest-style name filter and the child
//!   inherits the parent's environment.
//! - The child is awaited without a timeout; a hung child hangs the parent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::log::NoopEventSink;
use crate::log::TestEvent;
use crate::log::TestEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable marking a re-executed child test binary.
pub const CRASH_MARKER_ENV: &str = "TESTUTIL_SHOULD_CRASH";

/// libtest arguments appended after the test selector.
const LIBTEST_CHILD_ARGS: [&str; 3] = ["--exact", "--nocapture", "--test-threads=1"];

// ============================================================================
// SECTION: Role
// ============================================================================

/// Environment variable and value that mark the child role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMarker {
    /// Variable name.
    pub name: &'static str,
    /// Value signalling the child role.
    pub value: &'static str,
}

impl RoleMarker {
    /// Marker used by [`assert_crashes`].
    pub const DEFAULT: Self = Self {
        name: CRASH_MARKER_ENV,
        value: "1",
    };

    /// Reads the marker from the process environment.
    #[must_use]
    pub fn role_from_env(self) -> Role {
        match std::env::var_os(self.name) {
            Some(value) if value == self.value => Role::Child,
            _ => Role::Parent,
        }
    }
}

impl Default for RoleMarker {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which side of the re-exec boundary the current process is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Original test process; launches the child and judges its exit.
    Parent,
    /// Re-executed test process; runs the code under test.
    Child,
}

impl Role {
    /// Reads the role from [`RoleMarker::DEFAULT`].
    #[must_use]
    pub fn from_env() -> Self {
        RoleMarker::DEFAULT.role_from_env()
    }
}

// ============================================================================
// SECTION: Child Exit
// ============================================================================

/// Classified exit of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Exited with status zero.
    Success,
    /// Exited with a status code.
    Code(i32),
    /// Terminated by a signal.
    Signal(i32),
    /// Exit could not be classified.
    Unknown,
}

impl ChildExit {
    /// Classifies a process exit status.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return Self::Success;
        }
        if let Some(code) = status.code() {
            return Self::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }
        Self::Unknown
    }

    /// Returns true when the exit is distinguishable as abnormal.
    #[must_use]
    pub const fn is_abnormal(self) -> bool {
        match self {
            Self::Code(code) => code != 0,
            Self::Signal(_) => true,
            Self::Success | Self::Unknown => false,
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "exit code 0"),
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "signal {signal}"),
            Self::Unknown => write!(f, "unknown termination"),
        }
    }
}

/// What the parent observed from a finished child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildReport {
    /// Classified exit.
    pub exit: ChildExit,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
}

impl ChildReport {
    /// Builds a report with no captured output.
    #[must_use]
    pub const fn from_exit(exit: ChildExit) -> Self {
        Self {
            exit,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Outcome of a crash check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashVerdict {
    /// Parent role: the child terminated abnormally.
    Crashed(ChildExit),
    /// Parent role: the child did not crash; `on_fail` was invoked.
    Survived(ChildExit),
    /// Child role: the code under test returned; the process must now exit 0.
    ChildCompleted,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to start the child process.
///
/// This is not an assertion failure: the crash check could not run at all.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The current executable path could not be resolved.
    #[error("cannot resolve current test binary: {0}")]
    CurrentExe(#[source] io::Error),
    /// The child process could not be spawned or awaited.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Launchers
// ============================================================================

/// Capability to run one named test as a child process.
pub trait ProcessLauncher {
    /// Runs the test named `selector` with `marker` set and waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the child cannot be started.
    fn run_as_child(&self, selector: &str, marker: RoleMarker) -> Result<ChildReport, LaunchError>;
}

/// Launcher that re-executes a test binary through libtest name filtering.
#[derive(Debug, Clone, Default)]
pub struct CurrentExeLauncher {
    /// Program override; `None` uses `std::env::current_exe()`.
    program: Option<PathBuf>,
}

impl CurrentExeLauncher {
    /// Creates a launcher for the running test binary.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            program: None,
        }
    }

    /// Creates a launcher for an explicit binary.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    /// Resolves the binary to launch.
    fn program(&self) -> Result<PathBuf, LaunchError> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe().map_err(LaunchError::CurrentExe),
        }
    }
}

impl ProcessLauncher for CurrentExeLauncher {
    fn run_as_child(&self, selector: &str, marker: RoleMarker) -> Result<ChildReport, LaunchError> {
        let program = self.program()?;
        let output = Command::new(&program)
            .arg(selector)
            .args(LIBTEST_CHILD_ARGS)
            .env(marker.name, marker.value)
            .output()
            .map_err(|source| LaunchError::Spawn {
                program: program.display().to_string(),
                source,
            })?;
        Ok(ChildReport {
            exit: ChildExit::from_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl<L: ProcessLauncher + ?Sized> ProcessLauncher for &L {
    fn run_as_child(&self, selector: &str, marker: RoleMarker) -> Result<ChildReport, LaunchError> {
        (**self).run_as_child(selector, marker)
    }
}

/// Scripted launcher that never spawns a process.
#[derive(Debug, Default)]
pub struct FakeLauncher {
    /// Exit to report; `None` simulates a launch failure.
    exit: Option<ChildExit>,
    /// Selector and marker of every launch request.
    calls: Mutex<Vec<(String, RoleMarker)>>,
}

impl FakeLauncher {
    /// Creates a launcher whose children all end with `exit`.
    #[must_use]
    pub fn exiting(exit: ChildExit) -> Self {
        Self {
            exit: Some(exit),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a launcher whose children never start.
    #[must_use]
    pub fn failing_to_launch() -> Self {
        Self::default()
    }

    /// Returns the launch requests seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, RoleMarker)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn run_as_child(&self, selector: &str, marker: RoleMarker) -> Result<ChildReport, LaunchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((selector.to_string(), marker));
        }
        self.exit.map(ChildReport::from_exit).ok_or_else(|| LaunchError::Spawn {
            program: "fake".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "scripted launch failure"),
        })
    }
}

// ============================================================================
// SECTION: Asserter
// ============================================================================

/// Crash asserter bound to a launcher, a role marker, and an event sink.
pub struct CrashAsserter<L = CurrentExeLauncher> {
    /// Launcher used in the parent role.
    launcher: L,
    /// Marker handed to the child.
    marker: RoleMarker,
    /// Event destination.
    sink: Arc<dyn TestEventSink>,
}

impl CrashAsserter<CurrentExeLauncher> {
    /// Creates an asserter that re-executes the running test binary.
    #[must_use]
    pub fn current_exe() -> Self {
        Self::new(CurrentExeLauncher::new(), Arc::new(NoopEventSink))
    }
}

impl<L: ProcessLauncher> CrashAsserter<L> {
    /// Creates an asserter with the default role marker.
    #[must_use]
    pub fn new(launcher: L, sink: Arc<dyn TestEventSink>) -> Self {
        Self {
            launcher,
            marker: RoleMarker::DEFAULT,
            sink,
        }
    }

    /// Replaces the role marker.
    #[must_use]
    pub fn with_marker(mut self, marker: RoleMarker) -> Self {
        self.marker = marker;
        self
    }

    /// Returns the launcher.
    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Runs the crash check for an explicit role.
    ///
    /// In the child role `under_test` runs and, if it returns,
    /// [`CrashVerdict::ChildCompleted`] tells the caller to exit with code 0.
    /// In the parent role the child is launched and `on_fail` runs exactly
    /// once if it did not terminate abnormally.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the parent cannot start the child.
    pub fn check<T, F>(
        &self,
        role: Role,
        selector: &str,
        under_test: T,
        on_fail: F,
    ) -> Result<CrashVerdict, LaunchError>
    where
        T: FnOnce(),
        F: FnOnce(),
    {
        match role {
            Role::Child => {
                under_test();
                Ok(CrashVerdict::ChildCompleted)
            }
            Role::Parent => {
                let report = match self.launcher.run_as_child(selector, self.marker) {
                    Ok(report) => report,
                    Err(err) => {
                        self.sink.record(
                            &TestEvent::new("crash_child_launch", selector, "error")
                                .with_detail(err.to_string()),
                        );
                        return Err(err);
                    }
                };
                if report.exit.is_abnormal() {
                    self.sink.record(
                        &TestEvent::new("crash_child_exit", selector, "crashed")
                            .with_detail(report.exit.to_string()),
                    );
                    return Ok(CrashVerdict::Crashed(report.exit));
                }
                self.sink.record(
                    &TestEvent::new("crash_child_exit", selector, "survived")
                        .with_detail(survivor_detail(&report)),
                );
                on_fail();
                Ok(CrashVerdict::Survived(report.exit))
            }
        }
    }

    /// Asserts that `under_test` terminates the process abnormally.
    ///
    /// Reads the role from the environment, then delegates to [`Self::check`].
    /// In the child role this never returns.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the parent cannot start the child.
    pub fn assert_crashes<T, F>(
        &self,
        selector: &str,
        under_test: T,
        on_fail: F,
    ) -> Result<(), LaunchError>
    where
        T: FnOnce(),
        F: FnOnce(),
    {
        let role = self.marker.role_from_env();
        match self.check(role, selector, under_test, on_fail)? {
            CrashVerdict::ChildCompleted => exit_child(),
            CrashVerdict::Crashed(_) | CrashVerdict::Survived(_) => Ok(()),
        }
    }
}

/// Asserts that `under_test` terminates the process abnormally.
///
/// `selector` is the libtest name of the calling test (the full module path
/// for unit tests, the function name for integration tests). `on_fail` runs
/// once if the re-executed test exits normally. See the module docs for the
/// one-call-per-test precondition.
///
/// # Errors
///
/// Returns [`LaunchError`] when the child test binary cannot be started.
pub fn assert_crashes<T, F>(selector: &str, under_test: T, on_fail: F) -> Result<(), LaunchError>
where
    T: FnOnce(),
    F: FnOnce(),
{
    CrashAsserter::current_exe().assert_crashes(selector, under_test, on_fail)
}

/// Runs the decide-then-act core with the default marker and no events.
///
/// # Errors
///
/// Returns [`LaunchError`] when the launcher cannot start the child.
pub fn check_crash<L, T, F>(
    role: Role,
    launcher: &L,
    selector: &str,
    under_test: T,
    on_fail: F,
) -> Result<CrashVerdict, LaunchError>
where
    L: ProcessLauncher,
    T: FnOnce(),
    F: FnOnce(),
{
    CrashAsserter::new(launcher, Arc::new(NoopEventSink)).check(role, selector, under_test, on_fail)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Summarizes a surviving child for the event log.
fn survivor_detail(report: &ChildReport) -> String {
    let stderr = report.stderr.trim();
    if stderr.is_empty() {
        report.exit.to_string()
    } else {
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(5)..].join("\n");
        format!("{}; stderr: {tail}", report.exit)
    }
}

/// Ends the child role after the code under test returned.
#[allow(clippy::exit, reason = "The re-executed child reports a normal return through exit code 0.")]
fn exit_child() -> ! {
    std::process::exit(0)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
