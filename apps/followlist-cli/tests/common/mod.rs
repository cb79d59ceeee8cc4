//! Shared fixtures for followlist integration tests
//!
//! A [`TestContext`] owns one wiremock server that plays every remote role
//! (handle resolver, PLC directory, PDS and authorization server) and a
//! temporary config directory.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use followlist_cli::config::{Config, ConfigPaths};
use followlist_cli::credentials::{CredentialStore, FileCredentialStore};
use followlist_cli::models::{Credentials, Session, TokenResponse};
use followlist_cli::oauth::{DpopKey, SessionManager};
use followlist_core::{Did, Handle};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const ALICE_DID: &str = "did:plc:alice";
pub const ALICE_HANDLE: &str = "alice.test";

pub fn alice_did() -> Did {
    Did::new(ALICE_DID).unwrap()
}

pub struct TestContext {
    pub server: MockServer,
    pub temp: TempDir,
    pub paths: ConfigPaths,
}

impl TestContext {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let temp = TempDir::new().expect("Failed to create temp dir");
        let paths = ConfigPaths::in_dir(temp.path());
        Self {
            server,
            temp,
            paths,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Config pointing every service at the mock server, without page delay
    pub fn config(&self) -> Config {
        Config {
            handle_resolver: self.base_url(),
            plc_directory: self.base_url(),
            page_delay_ms: 0,
            timeout_secs: 5,
            ..Config::default()
        }
    }

    pub fn store(&self) -> FileCredentialStore {
        FileCredentialStore::new(self.paths.credentials_file.clone())
    }

    pub fn manager(&self) -> SessionManager {
        SessionManager::new(self.config(), self.paths.clone(), Box::new(self.store()))
            .expect("Failed to create session manager")
    }

    /// Persist a session for Alice whose tokens expire in `expires_in` seconds
    pub fn write_session(&self, expires_in: u64) -> DpopKey {
        let key = DpopKey::generate().expect("Failed to generate key");
        let session = Session {
            did: Did::new(ALICE_DID).unwrap(),
            handle: Some(Handle::normalize(ALICE_HANDLE).unwrap()),
            pds_url: self.base_url(),
            issuer: self.base_url(),
            token_endpoint: format!("{}/oauth/token", self.base_url()),
            revocation_endpoint: Some(format!("{}/oauth/revoke", self.base_url())),
            client_id: "http://localhost".to_string(),
            created_at: Utc::now(),
        };
        session.save(&self.paths).expect("Failed to save session");

        let credentials = Credentials::from_token_response(
            token_response(ALICE_DID, "access-1", expires_in),
            key.to_base64(),
        );
        self.store()
            .store(&alice_did(), &credentials)
            .expect("Failed to store credentials");
        key
    }

    /// Mount handle resolution, DID document and OAuth discovery for Alice
    pub async fn mount_identity_and_discovery(&self) {
        Mock::given(method("GET"))
            .and(path("/xrpc/com.atproto.identity.resolveHandle"))
            .and(query_param("handle", ALICE_HANDLE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "did": ALICE_DID })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/{ALICE_DID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(did_document(
                ALICE_DID,
                ALICE_HANDLE,
                &self.base_url(),
            )))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-protected-resource"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resource": self.base_url(),
                "authorization_servers": [self.base_url()],
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-authorization-server"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_server_metadata(
                &self.base_url(),
            )))
            .mount(&self.server)
            .await;
    }
}

pub fn token_response(sub: &str, access_token: &str, expires_in: u64) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        token_type: "DPoP".to_string(),
        expires_in: Some(expires_in),
        refresh_token: Some("refresh-1".to_string()),
        scope: Some("atproto transition:generic".to_string()),
        sub: sub.to_string(),
    }
}

pub fn token_json(sub: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "DPoP",
        "expires_in": 3600,
        "refresh_token": "refresh-2",
        "scope": "atproto transition:generic",
        "sub": sub,
    })
}

pub fn did_document(did: &str, handle: &str, pds: &str) -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": did,
        "alsoKnownAs": [format!("at://{handle}")],
        "service": [{
            "id": "#atproto_pds",
            "type": "AtprotoPersonalDataServer",
            "serviceEndpoint": pds,
        }],
    })
}

pub fn auth_server_metadata(issuer: &str) -> Value {
    json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "pushed_authorization_request_endpoint": format!("{issuer}/oauth/par"),
        "revocation_endpoint": format!("{issuer}/oauth/revoke"),
        "dpop_signing_alg_values_supported": ["ES256"],
        "scopes_supported": ["atproto", "transition:generic"],
    })
}

pub fn profile(name: &str) -> Value {
    json!({
        "did": format!("did:plc:{name}"),
        "handle": format!("{name}.test"),
        "displayName": name.to_uppercase(),
    })
}

pub fn follows_page(names: &[&str], cursor: Option<&str>) -> Value {
    let follows: Vec<Value> = names.iter().map(|n| profile(n)).collect();
    json!({ "subject": profile("alice"), "follows": follows, "cursor": cursor })
}

pub fn list_page(names: &[&str], cursor: Option<&str>) -> Value {
    let items: Vec<Value> = names
        .iter()
        .map(|n| json!({ "uri": format!("at://did:plc:owner/app.bsky.graph.listitem/{n}"), "subject": profile(n) }))
        .collect();
    json!({
        "list": { "uri": "at://did:plc:owner/app.bsky.graph.list/3kabc", "name": "Test list" },
        "items": items,
        "cursor": cursor,
    })
}

/// Claims of the DPoP proof a request carried
pub fn dpop_claims(request: &Request) -> Option<Value> {
    let proof = request.headers.get("DPoP")?.to_str().ok()?;
    let payload = proof.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Matches requests whose DPoP proof carries exactly this nonce (or none)
pub struct DpopNonce(pub Option<&'static str>);

impl Match for DpopNonce {
    fn matches(&self, request: &Request) -> bool {
        let Some(claims) = dpop_claims(request) else {
            return false;
        };
        claims.get("nonce").and_then(Value::as_str) == self.0
    }
}
