//! Authorization server requests: PAR, code exchange, refresh, revocation
//!
//! All requests are DPoP-bound form posts. The server answers the first
//! request of a session with `400 use_dpop_nonce` and a `DPoP-Nonce` header;
//! the request is repeated once with that nonce.

use crate::error::{CliError, CliResult};
use crate::models::{AuthServerMetadata, OAuthError, ParResponse, TokenResponse};
use crate::oauth::dpop::{DpopKey, NonceCache, DPOP_HEADER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

/// Parameters of one pushed authorization request
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub redirect_uri: &'a str,
    pub scope: &'a str,
    pub state: &'a str,
    pub code_challenge: &'a str,
    /// Handle or DID the user typed, pre-filled on the sign-in page
    pub login_hint: Option<&'a str>,
}

/// Client for one authorization server, bound to a `client_id`
#[derive(Debug)]
pub struct OAuthClient {
    http: Client,
    client_id: String,
    nonces: NonceCache,
}

impl OAuthClient {
    /// Create a client posting as `client_id`
    pub fn new(http: Client, client_id: impl Into<String>) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            nonces: NonceCache::new(),
        }
    }

    /// The `client_id` sent with every request
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Push the authorization parameters; returns the `request_uri` handle
    #[instrument(skip_all)]
    pub async fn push_authorization(
        &self,
        metadata: &AuthServerMetadata,
        request: &AuthorizationRequest<'_>,
        key: &DpopKey,
    ) -> CliResult<ParResponse> {
        let endpoint = metadata
            .pushed_authorization_request_endpoint
            .as_deref()
            .ok_or_else(|| {
                CliError::AuthenticationFailed(
                    "Authorization server does not support pushed authorization requests"
                        .to_string(),
                )
            })?;

        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", request.redirect_uri),
            ("scope", request.scope),
            ("state", request.state),
            ("code_challenge", request.code_challenge),
            ("code_challenge_method", "S256"),
        ];
        if let Some(hint) = request.login_hint {
            form.push(("login_hint", hint));
        }

        self.post_json(endpoint, &form, key).await
    }

    /// Browser URL continuing a pushed request
    pub fn authorization_url(
        &self,
        metadata: &AuthServerMetadata,
        request_uri: &str,
    ) -> CliResult<String> {
        let mut url = Url::parse(&metadata.authorization_endpoint).map_err(|e| {
            CliError::AuthenticationFailed(format!("Invalid authorization endpoint: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("request_uri", request_uri);
        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        token_endpoint: &str,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
        key: &DpopKey,
    ) -> CliResult<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", code_verifier),
        ];
        self.post_json(token_endpoint, &form, key).await
    }

    /// Obtain a new access token with a refresh token
    #[instrument(skip_all)]
    pub async fn refresh(
        &self,
        token_endpoint: &str,
        refresh_token: &str,
        key: &DpopKey,
    ) -> CliResult<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.post_json(token_endpoint, &form, key)
            .await
            .map_err(|e| match e {
                CliError::AuthenticationFailed(_) => CliError::TokenExpired,
                other => other,
            })
    }

    /// Revoke a token. Failures are reported, never fatal to the caller.
    #[instrument(skip_all)]
    pub async fn revoke(&self, revocation_endpoint: &str, token: &str, key: &DpopKey) -> bool {
        let form = [("client_id", self.client_id.as_str()), ("token", token)];
        match self.post(revocation_endpoint, &form, key).await {
            Ok((status, _)) if status.is_success() => true,
            Ok((status, _)) => {
                warn!(%status, "Token revocation rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "Token revocation failed");
                false
            }
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
        key: &DpopKey,
    ) -> CliResult<T> {
        let (status, body) = self.post(url, form, key).await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                CliError::AuthenticationFailed(format!("Invalid response from {url}: {e}"))
            });
        }

        Err(error_from_response(status, &body))
    }

    /// Form post with a DPoP proof, retried once when the server hands out a nonce
    async fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
        key: &DpopKey,
    ) -> CliResult<(StatusCode, Vec<u8>)> {
        let (status, fresh_nonce, body) = self.post_once(url, form, key).await?;

        if status == StatusCode::BAD_REQUEST && fresh_nonce && is_nonce_challenge(&body) {
            debug!(url, "Retrying with server DPoP nonce");
            let (status, _, body) = self.post_once(url, form, key).await?;
            return Ok((status, body));
        }

        Ok((status, body))
    }

    async fn post_once(
        &self,
        url: &str,
        form: &[(&str, &str)],
        key: &DpopKey,
    ) -> CliResult<(StatusCode, bool, Vec<u8>)> {
        let nonce = self.nonces.get(url);
        let proof = key.proof("POST", url, nonce.as_deref(), None)?;

        let response = self
            .http
            .post(url)
            .header(DPOP_HEADER, proof)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let fresh_nonce = self.nonces.update_from(url, response.headers());
        let body = response.bytes().await?.to_vec();
        Ok((status, fresh_nonce, body))
    }
}

fn is_nonce_challenge(body: &[u8]) -> bool {
    serde_json::from_slice::<OAuthError>(body)
        .map(|e| e.is_use_dpop_nonce())
        .unwrap_or(false)
}

fn error_from_response(status: StatusCode, body: &[u8]) -> CliError {
    if status.is_server_error() {
        return CliError::Server(format!("Authorization server error: HTTP {status}"));
    }

    match serde_json::from_slice::<OAuthError>(body) {
        Ok(error) if error.is_access_denied() => {
            CliError::AuthorizationDenied(error.message().to_string())
        }
        Ok(error) => CliError::AuthenticationFailed(error.message().to_string()),
        Err(_) => CliError::AuthenticationFailed(format!(
            "Authorization server returned HTTP {status}"
        )),
    }
}
