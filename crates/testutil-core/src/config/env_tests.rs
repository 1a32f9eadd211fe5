// crates/testutil-core/src/config/env_tests.rs
// ============================================================================
// Module: Fixture Env Unit Tests
// Description: Unit coverage for strict environment parsing of fixture config.
// Purpose: Ensure configuration parsing fails closed on invalid inputs.
// Dependencies: std, proptest
// ============================================================================

//! ## Overview
//! Unit coverage for strict environment parsing of fixture configuration.
//! Invariants:
//! - Environment parsing rejects invalid or empty values.
//! - Tests restore environment state after each run.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

use proptest::prelude::*;

use super::DEFAULT_REDIS_DB;
use super::DEFAULT_REDIS_URL;
use super::DEFAULT_S3_ENDPOINT;
use super::DEFAULT_SQS_ENDPOINT;
use super::FixtureConfig;
use super::FixtureEnv;
use super::env::parse_redis_db;
use super::env::parse_timeout_seconds;

mod env_mut {
    #![allow(unsafe_code, reason = "Tests mutate process env vars in a controlled scope.")]

    /// Sets an environment variable for the current process.
    pub fn set_var(key: &str, value: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Removes an environment variable from the current process.
    pub fn remove_var(key: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::remove_var(key);
        }
    }
}

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().expect("env lock poisoned")
}

struct EnvGuard {
    entries: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let entries = FixtureEnv::ALL
            .iter()
            .map(|key| (key.as_str(), std::env::var(key.as_str()).ok()))
            .collect();
        for key in FixtureEnv::ALL {
            env_mut::remove_var(key.as_str());
        }
        Self {
            entries,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.entries.drain(..) {
            match value {
                Some(value) => env_mut::set_var(name, &value),
                None => env_mut::remove_var(name),
            }
        }
    }
}

#[test]
fn unset_environment_uses_defaults() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    let config = FixtureConfig::load().expect("config should load");
    assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
    assert_eq!(config.redis_db, DEFAULT_REDIS_DB);
    assert_eq!(config.sqs_endpoint, DEFAULT_SQS_ENDPOINT);
    assert_eq!(config.s3_endpoint, DEFAULT_S3_ENDPOINT);
    assert_eq!(config.readiness_timeout, None);
    assert!(!config.log_events);
    assert_eq!(config, FixtureConfig::default());
}

#[test]
fn endpoints_are_overridable() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::RedisUrl.as_str(), "redis://10.0.0.5:6380");
    env_mut::set_var(FixtureEnv::RedisDb.as_str(), "3");
    env_mut::set_var(FixtureEnv::SqsEndpoint.as_str(), " http://localhost:9324 ");
    env_mut::set_var(FixtureEnv::S3Endpoint.as_str(), "http://localhost:9000");
    let config = FixtureConfig::load().expect("config should load");
    assert_eq!(config.redis_url, "redis://10.0.0.5:6380");
    assert_eq!(config.redis_db, 3);
    assert_eq!(config.sqs_endpoint, "http://localhost:9324");
    assert_eq!(config.s3_endpoint, "http://localhost:9000");
}

#[test]
fn timeout_rejects_invalid_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::ReadinessTimeoutSeconds.as_str(), "0");
    assert!(FixtureConfig::load().is_err());

    env_mut::set_var(FixtureEnv::ReadinessTimeoutSeconds.as_str(), "not-a-number");
    assert!(FixtureConfig::load().is_err());

    env_mut::set_var(FixtureEnv::ReadinessTimeoutSeconds.as_str(), "   ");
    assert!(FixtureConfig::load().is_err());
}

#[test]
fn timeout_override_acts_as_minimum() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::ReadinessTimeoutSeconds.as_str(), "5");
    let config = FixtureConfig::load().expect("config should load");
    assert_eq!(config.readiness_timeout, Some(Duration::from_secs(5)));
    assert_eq!(config.resolve_timeout(Duration::from_secs(3)), Duration::from_secs(5));
    assert_eq!(config.resolve_timeout(Duration::from_secs(10)), Duration::from_secs(10));
}

#[test]
fn resolve_timeout_without_override_is_identity() {
    let config = FixtureConfig::default();
    assert_eq!(config.resolve_timeout(Duration::from_millis(250)), Duration::from_millis(250));
}

#[test]
fn redis_db_rejects_negative_and_garbage() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::RedisDb.as_str(), "-1");
    assert!(FixtureConfig::load().is_err());

    env_mut::set_var(FixtureEnv::RedisDb.as_str(), "nine");
    assert!(FixtureConfig::load().is_err());
}

#[test]
fn log_events_parses_bool_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::LogEvents.as_str(), "1");
    let config = FixtureConfig::load().expect("config should load");
    assert!(config.log_events);

    env_mut::set_var(FixtureEnv::LogEvents.as_str(), "FALSE");
    let config = FixtureConfig::load().expect("config should load");
    assert!(!config.log_events);

    env_mut::set_var(FixtureEnv::LogEvents.as_str(), "maybe");
    assert!(FixtureConfig::load().is_err());
}

#[test]
fn empty_values_fail_closed() {
    let _lock = env_lock();
    let _guard = EnvGuard::new();

    env_mut::set_var(FixtureEnv::S3Endpoint.as_str(), "");
    assert!(FixtureConfig::load().is_err());
}

proptest! {
    #[test]
    fn positive_timeouts_round_trip(secs in 1u64..=86_400) {
        let parsed = parse_timeout_seconds("T", &secs.to_string()).unwrap();
        prop_assert_eq!(parsed, Duration::from_secs(secs));
    }

    #[test]
    fn redis_db_accepts_non_negative(db in 0i64..=i64::from(u16::MAX)) {
        prop_assert_eq!(parse_redis_db("D", &format!(" {db} ")).unwrap(), db);
    }

    #[test]
    fn redis_db_rejects_negative(db in i64::MIN..0) {
        prop_assert!(parse_redis_db("D", &db.to_string()).is_err());
    }
}
