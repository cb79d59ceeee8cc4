//! Stored credentials model

use crate::models::TokenResponse;
use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Longest lifetime accepted from the token endpoint (one year)
const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 3600;

/// Secret session material, kept in the credential store
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// DPoP-bound access token
    pub access_token: String,

    /// OAuth refresh token (empty when none was issued)
    #[serde(default)]
    pub refresh_token: String,

    /// Access token expiration time
    pub expires_at: DateTime<Utc>,

    /// Token type ("DPoP")
    pub token_type: String,

    /// Granted scopes
    #[serde(default)]
    pub scope: Option<String>,

    /// DPoP private key, base64 PKCS#8
    pub dpop_key: String,
}

impl Credentials {
    /// Create credentials from a token response and the key it is bound to
    pub fn from_token_response(response: TokenResponse, dpop_key: String) -> Self {
        let expires_in = response.expires_in.map_or(DEFAULT_EXPIRES_IN_SECS, |secs| {
            i64::try_from(secs).map_or(MAX_EXPIRES_IN_SECS, |secs| secs.min(MAX_EXPIRES_IN_SECS))
        });
        let now = Utc::now();
        let expires_at = TimeDelta::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.unwrap_or_default(),
            expires_at,
            token_type: response.token_type,
            scope: response.scope,
            dpop_key,
        }
    }

    /// Check if the access token expires within `window`
    pub fn expires_within(&self, window: Duration) -> bool {
        self.expires_at <= Utc::now() + window
    }

    /// Whether a refresh token was issued
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("dpop_key", &"[REDACTED]")
            .finish()
    }
}
