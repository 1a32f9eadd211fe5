// crates/testutil-fakes/src/object_store.rs
// ============================================================================
// Module: Fake S3 Fixture
// Description: S3 client bound to a bucket on a local fake object store.
// Purpose: Give tests a ready bucket with put/get access.
// Dependencies: aws-sdk-s3, tokio, testutil-core
// ============================================================================

//! ## Overview
//! Readiness is a plain TCP connect to the configured endpoint. The client
//! uses path-style addressing because the fake store does not serve
//! virtual-hosted bucket names.

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use testutil_core::FixtureConfig;
use testutil_core::TestEvent;
use testutil_core::TestEventSink;
use tokio::net::TcpStream;

use crate::aws::fake_aws_config;
use crate::endpoint::endpoint_authority;
use crate::error::FixtureError;
use crate::ready::await_ready_async;

/// Service label used in events and errors.
const SERVICE: &str = "s3";
/// Readiness timeout before config overrides.
const READY_TIMEOUT: Duration = Duration::from_secs(3);
/// Per-attempt connect timeout for the readiness probe.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// S3 client with a created bucket.
#[derive(Debug, Clone)]
pub struct FakeS3 {
    /// Client targeting the fake endpoint.
    client: Client,
    /// Created bucket name.
    bucket: String,
}

impl FakeS3 {
    /// Connects using configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when configuration is invalid, the store is
    /// not reachable in time, or the bucket cannot be created.
    pub async fn start(bucket: &str) -> Result<Self, FixtureError> {
        let config = FixtureConfig::load().map_err(FixtureError::Config)?;
        let sink = config.event_sink();
        Self::connect(&config, bucket, sink).await
    }

    /// Waits for `config.s3_endpoint` to accept connections and creates
    /// `bucket`. A bucket this client already owns is reused.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Endpoint`] for an unparseable endpoint,
    /// [`FixtureError::NotReady`] when no connection succeeds in time, or
    /// [`FixtureError::CreateBucket`] when bucket creation fails.
    pub async fn connect(
        config: &FixtureConfig,
        bucket: &str,
        sink: Arc<dyn TestEventSink>,
    ) -> Result<Self, FixtureError> {
        let authority = endpoint_authority(&config.s3_endpoint)?;
        await_ready_async(
            SERVICE,
            || tcp_ready(authority.clone()),
            config.resolve_timeout(READY_TIMEOUT),
            &*sink,
        )
        .await?;

        let sdk = fake_aws_config(&config.s3_endpoint).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk).force_path_style(true).build();
        let client = Client::from_conf(s3_config);

        if let Err(err) = client.create_bucket().bucket(bucket).send().await {
            let already_owned =
                err.as_service_error().is_some_and(|service| service.is_bucket_already_owned_by_you());
            if !already_owned {
                return Err(FixtureError::CreateBucket {
                    bucket: bucket.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                });
            }
        }
        sink.record(&TestEvent::new("fixture_ready", SERVICE, "ok").with_detail(bucket));
        Ok(Self {
            client,
            bucket: bucket.to_string(),
        })
    }

    /// Returns the S3 client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Readiness probe: one bounded TCP connect.
async fn tcp_ready(authority: String) -> bool {
    matches!(
        tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(authority.as_str())).await,
        Ok(Ok(_))
    )
}
