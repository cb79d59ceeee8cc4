//! Authorization server discovery
//!
//! PDS `/.well-known/oauth-protected-resource` names the authorization
//! server; its `/.well-known/oauth-authorization-server` document lists the
//! endpoints.

use crate::error::{CliError, CliResult};
use crate::models::{AuthServerMetadata, ProtectedResourceMetadata};
use reqwest::Client;
use tracing::debug;

const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";
const AUTH_SERVER_PATH: &str = "/.well-known/oauth-authorization-server";

/// Find the authorization server protecting `pds_url`
pub async fn discover(http: &Client, pds_url: &str) -> CliResult<AuthServerMetadata> {
    let issuer = protected_resource_issuer(http, pds_url).await?;
    let metadata = authorization_server_metadata(http, &issuer).await?;
    validate(&metadata, &issuer)?;
    debug!(issuer = %metadata.issuer, "Authorization server discovered");
    Ok(metadata)
}

async fn protected_resource_issuer(http: &Client, pds_url: &str) -> CliResult<String> {
    let url = format!("{}{}", pds_url.trim_end_matches('/'), PROTECTED_RESOURCE_PATH);
    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(CliError::AuthenticationFailed(format!(
            "PDS does not advertise an authorization server (HTTP {})",
            response.status()
        )));
    }

    let resource: ProtectedResourceMetadata = response.json().await?;
    resource
        .authorization_servers
        .into_iter()
        .next()
        .ok_or_else(|| {
            CliError::AuthenticationFailed("PDS lists no authorization servers".to_string())
        })
}

async fn authorization_server_metadata(
    http: &Client,
    issuer: &str,
) -> CliResult<AuthServerMetadata> {
    let url = format!("{}{}", issuer.trim_end_matches('/'), AUTH_SERVER_PATH);
    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(CliError::AuthenticationFailed(format!(
            "Authorization server metadata unavailable (HTTP {})",
            response.status()
        )));
    }
    Ok(response.json().await?)
}

/// Check the metadata describes `expected_issuer` and supports this client
pub fn validate(metadata: &AuthServerMetadata, expected_issuer: &str) -> CliResult<()> {
    if metadata.issuer.trim_end_matches('/') != expected_issuer.trim_end_matches('/') {
        return Err(CliError::AuthenticationFailed(format!(
            "Issuer mismatch: expected {expected_issuer}, got {}",
            metadata.issuer
        )));
    }
    if metadata.pushed_authorization_request_endpoint.is_none() {
        return Err(CliError::AuthenticationFailed(
            "Authorization server does not support pushed authorization requests".to_string(),
        ));
    }
    if !metadata.dpop_signing_alg_values_supported.is_empty()
        && !metadata
            .dpop_signing_alg_values_supported
            .iter()
            .any(|alg| alg == "ES256")
    {
        return Err(CliError::AuthenticationFailed(
            "Authorization server does not accept ES256 DPoP proofs".to_string(),
        ));
    }
    Ok(())
}
