//! OAuth client identity and the client-metadata document
//!
//! A hosted deployment publishes its metadata document at
//! `<origin>/api/client-metadata`; that URL is its `client_id`. Local
//! development needs no document: the authorization server accepts the
//! special `http://localhost?...` client id.

use crate::config::{CLIENT_NAME, OAUTH_SCOPE};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::form_urlencoded;

/// Path of the metadata document on a hosted origin
pub const METADATA_PATH: &str = "/api/client-metadata";

/// Alternate path served for local development setups
pub const METADATA_ALT_PATH: &str = "/client-metadata.json";

/// The published OAuth client-metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub client_id: String,
    pub client_name: String,
    pub client_uri: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scope: String,
    pub token_endpoint_auth_method: String,
    pub dpop_bound_access_tokens: bool,
    pub application_type: String,
}

impl ClientMetadata {
    /// Document for a deployment served at `origin`.
    ///
    /// With `loopback_port`, the loopback redirect used by `followlist login`
    /// is listed too and the client registers as a native application.
    pub fn for_origin(origin: &str, loopback_port: Option<u16>) -> Self {
        let origin = origin.trim_end_matches('/');
        let mut redirect_uris = vec![format!("{origin}/")];
        if let Some(port) = loopback_port {
            redirect_uris.push(loopback_redirect_uri(port));
        }

        Self {
            client_id: format!("{origin}{METADATA_PATH}"),
            client_name: CLIENT_NAME.to_string(),
            client_uri: origin.to_string(),
            redirect_uris,
            grant_types: vec!["authorization_code".to_string(), "refresh_token".to_string()],
            response_types: vec!["code".to_string()],
            scope: OAUTH_SCOPE.to_string(),
            token_endpoint_auth_method: "none".to_string(),
            dpop_bound_access_tokens: true,
            application_type: if loopback_port.is_some() { "native" } else { "web" }.to_string(),
        }
    }
}

/// Redirect URI of the loopback listener
pub fn loopback_redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}/")
}

/// Client id and redirect used for one login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// `client_id` sent to the authorization server
    pub client_id: String,
    /// Where the browser is sent back to
    pub redirect_uri: String,
    /// Requested scope
    pub scope: String,
}

impl ClientIdentity {
    /// Identity for a loopback login.
    ///
    /// Uses `hosted_client_id` when configured, otherwise the local
    /// development client id.
    pub fn loopback(port: u16, hosted_client_id: Option<&str>) -> Self {
        let redirect_uri = loopback_redirect_uri(port);
        let client_id = match hosted_client_id {
            Some(id) => id.to_string(),
            None => local_client_id(&redirect_uri, OAUTH_SCOPE),
        };
        Self {
            client_id,
            redirect_uri,
            scope: OAUTH_SCOPE.to_string(),
        }
    }
}

/// `http://localhost?redirect_uri=..&scope=..`
pub fn local_client_id(redirect_uri: &str, scope: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", scope)
        .finish();
    format!("http://localhost?{query}")
}

#[derive(Clone)]
struct MetadataState {
    fixed_origin: Option<String>,
    loopback_port: Option<u16>,
}

/// Router serving the metadata document.
///
/// When `fixed_origin` is `None` the origin is taken from each request's
/// forwarding headers.
pub fn metadata_router(fixed_origin: Option<String>, loopback_port: Option<u16>) -> Router {
    let state = Arc::new(MetadataState {
        fixed_origin,
        loopback_port,
    });
    Router::new()
        .route(METADATA_PATH, get(serve_metadata))
        .route(METADATA_ALT_PATH, get(serve_metadata))
        .with_state(state)
}

async fn serve_metadata(
    State(state): State<Arc<MetadataState>>,
    headers: HeaderMap,
) -> Json<ClientMetadata> {
    let origin = match &state.fixed_origin {
        Some(origin) => origin.clone(),
        None => request_origin(&headers),
    };
    Json(ClientMetadata::for_origin(&origin, state.loopback_port))
}

/// `<x-forwarded-proto or https>://<x-forwarded-host or host>`
pub fn request_origin(headers: &HeaderMap) -> String {
    let proto = first_value(headers, "x-forwarded-proto").unwrap_or("https");
    let host = first_value(headers, "x-forwarded-host")
        .or_else(|| first_value(headers, "host"))
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}

fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_document_for_hosted_origin() {
        let doc = ClientMetadata::for_origin("https://followlist.example/", None);
        assert_eq!(doc.client_id, "https://followlist.example/api/client-metadata");
        assert_eq!(doc.client_uri, "https://followlist.example");
        assert_eq!(doc.redirect_uris, vec!["https://followlist.example/"]);
        assert_eq!(doc.application_type, "web");
        assert_eq!(doc.scope, "atproto transition:generic");
        assert!(doc.dpop_bound_access_tokens);
    }

    #[test]
    fn test_document_with_loopback() {
        let doc = ClientMetadata::for_origin("https://followlist.example", Some(5173));
        assert_eq!(
            doc.redirect_uris,
            vec!["https://followlist.example/", "http://127.0.0.1:5173/"]
        );
        assert_eq!(doc.application_type, "native");
    }

    #[test]
    fn test_local_client_id_encoding() {
        assert_eq!(
            local_client_id("http://127.0.0.1:5173/", "atproto transition:generic"),
            "http://localhost?redirect_uri=http%3A%2F%2F127.0.0.1%3A5173%2F&scope=atproto+transition%3Ageneric"
        );
    }

    #[test]
    fn test_loopback_identity() {
        let local = ClientIdentity::loopback(8080, None);
        assert!(local.client_id.starts_with("http://localhost?"));
        assert_eq!(local.redirect_uri, "http://127.0.0.1:8080/");

        let hosted = ClientIdentity::loopback(8080, Some("https://app.example/api/client-metadata"));
        assert_eq!(hosted.client_id, "https://app.example/api/client-metadata");
        assert_eq!(hosted.redirect_uri, "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_request_origin_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:3000"));
        assert_eq!(request_origin(&headers), "https://internal:3000");

        headers.insert("x-forwarded-host", HeaderValue::from_static("app.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert_eq!(request_origin(&headers), "http://app.example");
    }
}
