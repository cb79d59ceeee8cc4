//! Token endpoint models

use serde::{Deserialize, Serialize};

/// Response from the token endpoint (code exchange or refresh)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token, bound to the DPoP key
    pub access_token: String,

    /// Token type ("DPoP")
    pub token_type: String,

    /// Seconds until the access token expires
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Refresh token for obtaining new access tokens
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Granted scopes
    #[serde(default)]
    pub scope: Option<String>,

    /// DID of the account the token was issued for
    pub sub: String,
}

/// OAuth error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthError {
    /// Error code
    pub error: String,

    /// Human-readable error description
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthError {
    /// Check if the server wants the request repeated with its DPoP nonce
    pub fn is_use_dpop_nonce(&self) -> bool {
        self.error == "use_dpop_nonce"
    }

    /// Check if this is an `access_denied` error
    pub fn is_access_denied(&self) -> bool {
        self.error == "access_denied"
    }

    /// Description when present, otherwise the code
    pub fn message(&self) -> &str {
        self.error_description.as_deref().unwrap_or(&self.error)
    }
}
