// crates/testutil-fakes/src/endpoint.rs
// ============================================================================
// Module: Endpoint Helpers
// Description: Derive socket authorities from service endpoint URLs.
// Purpose: Feed TCP readiness probes from configured HTTP endpoints.
// Dependencies: url
// ============================================================================

//! Derive socket authorities from service endpoint URLs.

use url::Url;

use crate::error::FixtureError;

/// Returns the `host:port` authority of an endpoint URL.
///
/// The scheme's default port is used when the URL has none. IPv6 hosts keep
/// their brackets.
///
/// # Errors
///
/// Returns [`FixtureError::Endpoint`] when the URL does not parse or lacks a
/// host or port.
pub fn endpoint_authority(endpoint: &str) -> Result<String, FixtureError> {
    let invalid = |reason: &str| FixtureError::Endpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(endpoint).map_err(|err| invalid(&err.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let port = url.port_or_known_default().ok_or_else(|| invalid("missing port"))?;
    Ok(format!("{host}:{port}"))
}
