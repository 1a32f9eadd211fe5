// crates/testutil-fakes/src/error.rs
// ============================================================================
// Module: Fixture Errors
// Description: Error type shared by the fake-service fixtures.
// Purpose: Report configuration, readiness, and setup failures uniformly.
// Dependencies: thiserror
// ============================================================================

//! Error type shared by the fake-service fixtures.

use std::time::Duration;

use thiserror::Error;

/// Fixture setup failure.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Fixture configuration could not be loaded.
    #[error("fixture config invalid: {0}")]
    Config(String),
    /// Service endpoint could not be parsed.
    #[error("invalid endpoint {endpoint}: {reason}")]
    Endpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Parse failure.
        reason: String,
    },
    /// Service did not answer its readiness probe in time.
    #[error("{service} failed to become ready within {}s", .timeout.as_secs_f64())]
    NotReady {
        /// Service label.
        service: &'static str,
        /// Effective timeout.
        timeout: Duration,
    },
    /// Redis command or connection failure.
    #[error("redis failure: {0}")]
    Redis(String),
    /// Connection pool failure.
    #[error("connection pool failure: {0}")]
    Pool(String),
    /// Queue creation failed.
    #[error("create queue {queue} failed: {message}")]
    CreateQueue {
        /// Queue name.
        queue: String,
        /// Service error message.
        message: String,
    },
    /// Bucket creation failed.
    #[error("create bucket {bucket} failed: {message}")]
    CreateBucket {
        /// Bucket name.
        bucket: String,
        /// Service error message.
        message: String,
    },
}
