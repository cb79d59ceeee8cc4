//! Authenticated XRPC client for the user's PDS

use crate::error::{CliError, CliResult};
use crate::models::XrpcErrorBody;
use crate::oauth::dpop::{wants_nonce, NonceCache, DPOP_HEADER};
use crate::oauth::AuthSession;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

/// Header asking the PDS to forward a call to another service
pub const PROXY_HEADER: &str = "atproto-proxy";

/// API client bound to one session.
///
/// The session is read-only here: an expired token surfaces as an error and
/// the user logs in again.
pub struct XrpcClient {
    http: Client,
    session: AuthSession,
    appview: String,
    nonces: NonceCache,
}

impl XrpcClient {
    /// Create a client for `session`; `app.bsky.*` calls are proxied to `appview`
    pub fn new(http: Client, session: AuthSession, appview: impl Into<String>) -> Self {
        Self {
            http,
            session,
            appview: appview.into(),
            nonces: NonceCache::new(),
        }
    }

    /// The session requests are made for
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Call a query method and decode its JSON output
    pub async fn query<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> CliResult<T> {
        let url = self.method_url(nsid, params)?;

        let response = self.send(nsid, &url).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED
            && wants_nonce(response.headers())
            && self.nonces.update_from(url.as_str(), response.headers())
        {
            debug!(nsid, "Retrying with server DPoP nonce");
            let retried = self.send(nsid, &url).await?;
            self.nonces.update_from(url.as_str(), retried.headers());
            retried
        } else {
            self.nonces.update_from(url.as_str(), response.headers());
            response
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: XrpcErrorBody = response.json().await.unwrap_or_default();
        Err(error_from_status(nsid, status, &body))
    }

    fn method_url(&self, nsid: &str, params: &[(&str, &str)]) -> CliResult<Url> {
        let base = format!("{}/xrpc/{nsid}", self.session.pds_url().trim_end_matches('/'));
        Url::parse_with_params(&base, params)
            .map_err(|e| CliError::Config(format!("Invalid PDS URL '{base}': {e}")))
    }

    async fn send(&self, nsid: &str, url: &Url) -> CliResult<reqwest::Response> {
        let nonce = self.nonces.get(url.as_str());
        let proof = self.session.dpop_key().proof(
            "GET",
            url.as_str(),
            nonce.as_deref(),
            Some(self.session.access_token()),
        )?;

        let mut request = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, format!("DPoP {}", self.session.access_token()))
            .header(DPOP_HEADER, proof);
        if nsid.starts_with("app.bsky.") {
            request = request.header(PROXY_HEADER, &self.appview);
        }

        trace!(nsid, "XRPC request");
        Ok(request.send().await?)
    }
}

fn error_from_status(nsid: &str, status: StatusCode, body: &XrpcErrorBody) -> CliError {
    let message = body.describe(&format!("{nsid} failed"));
    match status {
        StatusCode::UNAUTHORIZED if body.error.as_deref() == Some("ExpiredToken") => {
            CliError::TokenExpired
        }
        StatusCode::NOT_FOUND => CliError::NotFound(message),
        StatusCode::BAD_REQUEST
            if body
                .message
                .as_deref()
                .is_some_and(|m| m.to_ascii_lowercase().contains("not found")) =>
        {
            CliError::NotFound(message)
        }
        _ => CliError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
