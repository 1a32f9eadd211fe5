// crates/testutil-fakes/src/queue.rs
// ============================================================================
// Module: Fake SQS Fixture
// Description: SQS client bound to a queue on a local fake queue service.
// Purpose: Give tests a ready queue with send/receive access.
// Dependencies: aws-sdk-sqs, testutil-core
// ============================================================================

//! ## Overview
//! The fake queue service accepts connections before it can serve requests,
//! so readiness is probed with the queue creation call itself. `CreateQueue`
//! is idempotent for an unchanged name, which makes the probe safe to repeat.

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use testutil_core::FixtureConfig;
use testutil_core::TestEvent;
use testutil_core::TestEventSink;

use crate::aws::fake_aws_config;
use crate::error::FixtureError;
use crate::ready::await_ready_async;

/// Service label used in events and errors.
const SERVICE: &str = "sqs";
/// Readiness timeout before config overrides.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQS client with a created queue.
#[derive(Debug, Clone)]
pub struct FakeSqs {
    /// Client targeting the fake endpoint.
    client: Client,
    /// URL of the created queue.
    queue_url: String,
}

impl FakeSqs {
    /// Connects using configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when configuration is invalid, the service is
    /// not ready in time, or the queue cannot be created.
    pub async fn start(queue_name: &str) -> Result<Self, FixtureError> {
        let config = FixtureConfig::load().map_err(FixtureError::Config)?;
        let sink = config.event_sink();
        Self::connect(&config, queue_name, sink).await
    }

    /// Waits for `config.sqs_endpoint` and creates `queue_name`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NotReady`] when queue creation keeps failing
    /// for the readiness timeout, or [`FixtureError::CreateQueue`] when the
    /// final creation call fails.
    pub async fn connect(
        config: &FixtureConfig,
        queue_name: &str,
        sink: Arc<dyn TestEventSink>,
    ) -> Result<Self, FixtureError> {
        let sdk = fake_aws_config(&config.sqs_endpoint).await;
        let client = Client::new(&sdk);

        await_ready_async(
            SERVICE,
            || {
                let client = client.clone();
                let queue_name = queue_name.to_string();
                async move { client.create_queue().queue_name(queue_name).send().await.is_ok() }
            },
            config.resolve_timeout(READY_TIMEOUT),
            &*sink,
        )
        .await?;

        let created = client.create_queue().queue_name(queue_name).send().await.map_err(|err| {
            FixtureError::CreateQueue {
                queue: queue_name.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            }
        })?;
        let queue_url = created.queue_url().map_or_else(
            || format!("{}/{queue_name}", config.sqs_endpoint.trim_end_matches('/')),
            str::to_string,
        );
        sink.record(&TestEvent::new("fixture_ready", SERVICE, "ok").with_detail(queue_url.clone()));
        Ok(Self {
            client,
            queue_url,
        })
    }

    /// Returns the SQS client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the queue URL.
    #[must_use]
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}
