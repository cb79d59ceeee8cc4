//! OAuth discovery documents

use serde::{Deserialize, Serialize};

/// `/.well-known/oauth-protected-resource` on the PDS
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource URL
    #[serde(default)]
    pub resource: Option<String>,

    /// Authorization servers trusted by this resource
    #[serde(default)]
    pub authorization_servers: Vec<String>,
}

/// `/.well-known/oauth-authorization-server` on the issuer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthServerMetadata {
    /// Issuer identifier
    pub issuer: String,

    /// Browser authorization endpoint
    pub authorization_endpoint: String,

    /// Token endpoint
    pub token_endpoint: String,

    /// Pushed authorization request endpoint
    #[serde(default)]
    pub pushed_authorization_request_endpoint: Option<String>,

    /// Token revocation endpoint
    #[serde(default)]
    pub revocation_endpoint: Option<String>,

    /// DPoP signing algorithms the server accepts
    #[serde(default)]
    pub dpop_signing_alg_values_supported: Vec<String>,

    /// Scopes the server knows about
    #[serde(default)]
    pub scopes_supported: Vec<String>,
}

/// Pushed authorization request response
#[derive(Debug, Clone, Deserialize)]
pub struct ParResponse {
    /// Reference to pass to the authorization endpoint
    pub request_uri: String,

    /// Seconds the reference stays valid
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_server_metadata_minimal() {
        let meta: AuthServerMetadata = serde_json::from_str(
            r#"{
                "issuer": "https://auth.example",
                "authorization_endpoint": "https://auth.example/oauth/authorize",
                "token_endpoint": "https://auth.example/oauth/token"
            }"#,
        )
        .unwrap();
        assert!(meta.pushed_authorization_request_endpoint.is_none());
        assert!(meta.dpop_signing_alg_values_supported.is_empty());
    }

    #[test]
    fn test_protected_resource_metadata() {
        let meta: ProtectedResourceMetadata = serde_json::from_str(
            r#"{"resource": "https://pds.example", "authorization_servers": ["https://auth.example"]}"#,
        )
        .unwrap();
        assert_eq!(meta.authorization_servers, vec!["https://auth.example"]);
    }
}
