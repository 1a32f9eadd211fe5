// crates/testutil-fakes/src/kv.rs
// ============================================================================
// Module: Fake Redis Fixture
// Description: Connection pool bound to a flushed redis test database.
// Purpose: Give tests an isolated key-value store on a local redis server.
// Dependencies: redis, r2d2, testutil-core
// ============================================================================

//! ## Overview
//! [`FakeRedis`] connects to a running redis server, selects the configured
//! test database (9 unless overridden), and flushes it before handing out a
//! pool. [`FakeRedis::close`] flushes it again.
//!
//! Do not point this at a server whose test database holds data you need.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use r2d2::Pool;
use r2d2::PooledConnection;
use redis::Client;
use redis::IntoConnectionInfo;
use testutil_core::FixtureConfig;
use testutil_core::TestEvent;
use testutil_core::TestEventSink;

use crate::error::FixtureError;
use crate::ready::await_ready;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service label used in events and errors.
const SERVICE: &str = "redis";
/// Readiness timeout before config overrides.
const READY_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-attempt connection timeout for the readiness probe.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);
/// Maximum pooled connections.
const POOL_SIZE: u32 = 4;

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Redis pool bound to a flushed test database.
pub struct FakeRedis {
    /// Client for dedicated (pub/sub) connections.
    client: Client,
    /// Shared connection pool.
    pool: Pool<Client>,
    /// Event destination.
    sink: Arc<dyn TestEventSink>,
}

impl FakeRedis {
    /// Connects using configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when configuration is invalid or the server is
    /// not reachable.
    pub fn start() -> Result<Self, FixtureError> {
        let config = FixtureConfig::load().map_err(FixtureError::Config)?;
        let sink = config.event_sink();
        Self::connect(&config, sink)
    }

    /// Connects to `config.redis_url`, selects `config.redis_db`, and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the URL is invalid, the server does not
    /// answer `PING` within the readiness timeout, or the flush fails.
    pub fn connect(
        config: &FixtureConfig,
        sink: Arc<dyn TestEventSink>,
    ) -> Result<Self, FixtureError> {
        let mut info = config
            .redis_url
            .as_str()
            .into_connection_info()
            .map_err(|err| FixtureError::Redis(err.to_string()))?;
        info.redis.db = config.redis_db;
        let client = Client::open(info).map_err(|err| FixtureError::Redis(err.to_string()))?;

        await_ready(SERVICE, || ping(&client), config.resolve_timeout(READY_TIMEOUT), &*sink)?;

        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .build(client.clone())
            .map_err(|err| FixtureError::Pool(err.to_string()))?;
        let fixture = Self {
            client,
            pool,
            sink,
        };
        fixture.flush()?;
        fixture.sink.record(
            &TestEvent::new("fixture_ready", SERVICE, "ok")
                .with_detail(format!("db={}", config.redis_db)),
        );
        Ok(fixture)
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &Pool<Client> {
        &self.pool
    }

    /// Checks a connection out of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Pool`] when no connection is available.
    pub fn connection(&self) -> Result<PooledConnection<Client>, FixtureError> {
        self.pool.get().map_err(|err| FixtureError::Pool(err.to_string()))
    }

    /// Removes every key from the test database.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the flush fails.
    pub fn flush(&self) -> Result<(), FixtureError> {
        let mut conn = self.connection()?;
        redis::cmd("FLUSHDB")
            .query::<()>(&mut *conn)
            .map_err(|err| FixtureError::Redis(err.to_string()))
    }

    /// Flushes the test database and drops the pool.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the final flush fails.
    pub fn close(self) -> Result<(), FixtureError> {
        self.flush()
    }

    /// Subscribes to `channel` and signals the returned receiver once per
    /// message.
    ///
    /// The subscription runs on its own thread with a dedicated connection. It
    /// ends, disconnecting the receiver, when the connection fails or the
    /// receiver is dropped and another message arrives.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Redis`] when the subscription cannot be
    /// established.
    pub fn listen_channel(&self, channel: &str) -> Result<mpsc::Receiver<()>, FixtureError> {
        let mut conn =
            self.client.get_connection().map_err(|err| FixtureError::Redis(err.to_string()))?;
        let (subscribed_tx, subscribed_rx) = mpsc::channel::<Result<(), String>>();
        let (sender, receiver) = mpsc::channel();
        let sink = Arc::clone(&self.sink);
        let channel = channel.to_string();
        // The subscription lives as long as the `PubSub` handle, so it is
        // created on the listener thread.
        thread::spawn(move || {
            let mut pubsub = conn.as_pubsub();
            if let Err(err) = pubsub.subscribe(channel.as_str()) {
                let _ = subscribed_tx.send(Err(err.to_string()));
                return;
            }
            let _ = subscribed_tx.send(Ok(()));
            loop {
                match pubsub.get_message() {
                    Ok(_) => {
                        if sender.send(()).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        sink.record(
                            &TestEvent::new("redis_subscription", channel.as_str(), "error")
                                .with_detail(err.to_string()),
                        );
                        break;
                    }
                }
            }
        });
        subscribed_rx
            .recv()
            .map_err(|_| FixtureError::Redis("subscription thread exited".to_string()))?
            .map_err(FixtureError::Redis)?;
        Ok(receiver)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Readiness probe: open a connection and expect `PONG`.
fn ping(client: &Client) -> bool {
    client
        .get_connection_with_timeout(CONNECT_TIMEOUT)
        .and_then(|mut conn| redis::cmd("PING").query::<String>(&mut conn))
        .is_ok_and(|reply| reply == "PONG")
}
