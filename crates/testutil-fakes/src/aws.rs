// crates/testutil-fakes/src/aws.rs
// ============================================================================
// Module: Fake AWS Configuration
// Description: Shared SDK configuration pointing at local fake services.
// Purpose: Build SQS and S3 clients without real credentials or metadata lookups.
// Dependencies: aws-config, aws-credential-types
// ============================================================================

//! ## Overview
//! The SDK refuses to sign requests without credentials even though the fake
//! services ignore them, so a static dummy pair is supplied explicitly. An
//! explicit region and credentials also keep the SDK from probing instance
//! metadata.

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;

/// Region reported to the fake services.
pub const FAKE_REGION: &str = "us-east-1";
/// Dummy access key accepted by the fake services.
pub const FAKE_ACCESS_KEY: &str = "abc123";
/// Dummy secret key accepted by the fake services.
pub const FAKE_SECRET_KEY: &str = "SEKRIT";

/// Returns SDK configuration targeting `endpoint` with dummy credentials.
pub async fn fake_aws_config(endpoint: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(FAKE_REGION))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new(
            FAKE_ACCESS_KEY,
            FAKE_SECRET_KEY,
            None,
            None,
            "testutil-fakes",
        ))
        .load()
        .await
}
