// crates/testutil-core/src/config/mod.rs
// ============================================================================
// Module: Fixture Configuration
// Description: Centralized configuration for fake-service fixtures.
// Purpose: Provide typed access to test environment settings and defaults.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Fixture configuration is read from environment variables and mapped into a
//! small typed structure shared by the readiness waits and the fake-service
//! fixtures. Unset variables fall back to the conventional local endpoints.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod env_tests;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::DEFAULT_REDIS_DB;
pub use env::DEFAULT_REDIS_URL;
pub use env::DEFAULT_S3_ENDPOINT;
pub use env::DEFAULT_SQS_ENDPOINT;
pub use env::FixtureConfig;
pub use env::FixtureEnv;
pub use env::read_env_strict;
