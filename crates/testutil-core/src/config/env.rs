// crates/testutil-core/src/config/env.rs
// ============================================================================
// Module: Fixture Environment
// Description: Environment-backed configuration for fake-service fixtures.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid or empty values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::log::NoopEventSink;
use crate::log::StderrEventSink;
use crate::log::TestEventSink;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default redis server URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
/// Default redis database reserved for tests; it is flushed on use.
pub const DEFAULT_REDIS_DB: i64 = 9;
/// Default fake queue-service endpoint.
pub const DEFAULT_SQS_ENDPOINT: &str = "http://0.0.0.0:4568";
/// Default fake object-store endpoint.
pub const DEFAULT_S3_ENDPOINT: &str = "http://0.0.0.0:4569";

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for fixture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureEnv {
    /// Redis server URL.
    RedisUrl,
    /// Redis database index used for tests (non-negative integer).
    RedisDb,
    /// Fake queue-service endpoint.
    SqsEndpoint,
    /// Fake object-store endpoint.
    S3Endpoint,
    /// Minimum readiness timeout in seconds (positive integer).
    ReadinessTimeoutSeconds,
    /// Emit JSON events to stderr (`true`/`false` or `1`/`0`).
    LogEvents,
}

impl FixtureEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RedisUrl => "TESTUTIL_REDIS_URL",
            Self::RedisDb => "TESTUTIL_REDIS_DB",
            Self::SqsEndpoint => "TESTUTIL_SQS_ENDPOINT",
            Self::S3Endpoint => "TESTUTIL_S3_ENDPOINT",
            Self::ReadinessTimeoutSeconds => "TESTUTIL_READINESS_TIMEOUT_SEC",
            Self::LogEvents => "TESTUTIL_LOG_EVENTS",
        }
    }

    /// All keys, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::RedisUrl,
        Self::RedisDb,
        Self::SqsEndpoint,
        Self::S3Endpoint,
        Self::ReadinessTimeoutSeconds,
        Self::LogEvents,
    ];
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed fixture configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Redis server URL.
    pub redis_url: String,
    /// Redis database index used for tests.
    pub redis_db: i64,
    /// Fake queue-service endpoint.
    pub sqs_endpoint: String,
    /// Fake object-store endpoint.
    pub s3_endpoint: String,
    /// Optional minimum readiness timeout.
    pub readiness_timeout: Option<Duration>,
    /// Emit JSON events to stderr.
    pub log_events: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            redis_db: DEFAULT_REDIS_DB,
            sqs_endpoint: DEFAULT_SQS_ENDPOINT.to_string(),
            s3_endpoint: DEFAULT_S3_ENDPOINT.to_string(),
            readiness_timeout: None,
            log_events: false,
        }
    }
}

impl FixtureConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or boolean value).
    pub fn load() -> Result<Self, String> {
        let defaults = Self::default();
        let redis_url =
            read_env_nonempty(FixtureEnv::RedisUrl.as_str())?.unwrap_or(defaults.redis_url);
        let redis_db = read_env_nonempty(FixtureEnv::RedisDb.as_str())?
            .map(|value| parse_redis_db(FixtureEnv::RedisDb.as_str(), &value))
            .transpose()?
            .unwrap_or(defaults.redis_db);
        let sqs_endpoint =
            read_env_nonempty(FixtureEnv::SqsEndpoint.as_str())?.unwrap_or(defaults.sqs_endpoint);
        let s3_endpoint =
            read_env_nonempty(FixtureEnv::S3Endpoint.as_str())?.unwrap_or(defaults.s3_endpoint);
        let readiness_timeout = read_env_nonempty(FixtureEnv::ReadinessTimeoutSeconds.as_str())?
            .map(|value| {
                parse_timeout_seconds(FixtureEnv::ReadinessTimeoutSeconds.as_str(), &value)
            })
            .transpose()?;
        let log_events = parse_bool_env(
            FixtureEnv::LogEvents.as_str(),
            read_env_nonempty(FixtureEnv::LogEvents.as_str())?,
        )?;
        Ok(Self {
            redis_url,
            redis_db,
            sqs_endpoint,
            s3_endpoint,
            readiness_timeout,
            log_events,
        })
    }

    /// Returns the effective readiness timeout.
    ///
    /// The configured override acts as a minimum so explicitly longer waits
    /// are never shortened.
    #[must_use]
    pub fn resolve_timeout(&self, requested: Duration) -> Duration {
        self.readiness_timeout.map_or(requested, |minimum| requested.max(minimum))
    }

    /// Returns the event sink selected by [`FixtureEnv::LogEvents`].
    #[must_use]
    pub fn event_sink(&self) -> Arc<dyn TestEventSink> {
        if self.log_events { Arc::new(StderrEventSink) } else { Arc::new(NoopEventSink) }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
pub(super) fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a non-negative redis database index.
///
/// # Errors
///
/// Returns an error when the value is not a non-negative integer.
pub(super) fn parse_redis_db(name: &str, raw: &str) -> Result<i64, String> {
    let db: i64 = raw.trim().parse().map_err(|_| format!("{name} must be a non-negative integer"))?;
    if db < 0 {
        return Err(format!("{name} must be a non-negative integer"));
    }
    Ok(db)
}

/// Parses a boolean environment variable, defaulting to `false` when unset.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, String> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
