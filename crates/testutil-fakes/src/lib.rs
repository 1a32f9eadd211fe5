// crates/testutil-fakes/src/lib.rs
// ============================================================================
// Module: Testutil Fakes Library
// Description: Pre-configured clients for fake redis, queue, and object stores.
// Purpose: Give integration tests ready-to-use handles to local fake services.
// Dependencies: testutil-core, thiserror, url, redis, r2d2, aws-sdk-s3, aws-sdk-sqs
// ============================================================================

//! ## Overview
//! Each fixture connects to a fake service that is already running (a local
//! redis server, an SQS-compatible queue, an S3-compatible object store),
//! waits for it with the readiness waiter from `testutil-core`, prepares a
//! test namespace, and returns a usable client. Fixtures never start or stop
//! the services themselves.
//!
//! Service fixtures are feature-gated: `redis`, `sqs`, `s3`.
//!
//! Invariants:
//! - No fixture returns before its service answered a readiness probe.
//! - Readiness timeouts surface as [`FixtureError::NotReady`].

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(any(feature = "sqs", feature = "s3"))]
pub mod aws;
pub mod endpoint;
pub mod error;
pub mod ready;
#[cfg(feature = "redis")]
pub mod kv;
#[cfg(feature = "s3")]
pub mod object_store;
#[cfg(feature = "sqs")]
pub mod queue;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

#[cfg(any(feature = "sqs", feature = "s3"))]
pub use aws::fake_aws_config;
pub use endpoint::endpoint_authority;
pub use error::FixtureError;
pub use ready::await_ready;
pub use ready::await_ready_async;
#[cfg(feature = "redis")]
pub use kv::FakeRedis;
#[cfg(feature = "s3")]
pub use object_store::FakeS3;
#[cfg(feature = "sqs")]
pub use queue::FakeSqs;
