//! Integration tests for the OAuth session lifecycle
//!
//! Tests cover:
//! - Identity resolution (handle, DID document, PDS)
//! - Authorization server discovery
//! - Login: PAR with DPoP nonce retry, redirect checks, code exchange
//! - Session resume and token refresh
//! - Logout with token revocation

mod common;

use common::{
    auth_server_metadata, token_json, DpopNonce, TestContext, ALICE_DID, ALICE_HANDLE,
};
use followlist_cli::credentials::CredentialStore;
use followlist_cli::error::CliError;
use followlist_cli::models::Session;
use followlist_cli::oauth::discovery::discover;
use followlist_cli::oauth::{CallbackParams, CallbackServer, PendingLogin};
use followlist_cli::recent::load_recent;
use followlist_core::Actor;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_par(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/oauth/par"))
        .and(DpopNonce(None))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("DPoP-Nonce", "n1")
                .set_body_json(json!({
                    "error": "use_dpop_nonce",
                    "error_description": "Authorization server requires nonce in DPoP proof",
                })),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/par"))
        .and(DpopNonce(Some("n1")))
        .and(body_string_contains("code_challenge_method=S256"))
        .and(body_string_contains("login_hint=alice.test"))
        .and(body_string_contains("response_type=code"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "request_uri": "urn:ietf:params:oauth:request_uri:req-1",
            "expires_in": 299,
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;
}

fn redirect_for(pending: &PendingLogin, code: &str) -> CallbackParams {
    CallbackParams {
        code: Some(code.to_string()),
        state: Some(pending.state().to_string()),
        iss: Some(pending.issuer().to_string()),
        ..CallbackParams::default()
    }
}

// =========================================================================
// Resolution and discovery
// =========================================================================

#[tokio::test]
async fn test_resolve_handle_to_pds() {
    let ctx = TestContext::new().await;
    ctx.mount_identity_and_discovery().await;
    let manager = ctx.manager();

    let identity = manager
        .resolver()
        .resolve_actor(&Actor::parse("@Alice.Test").unwrap())
        .await
        .unwrap();

    assert_eq!(identity.did.as_str(), ALICE_DID);
    assert_eq!(identity.handle.unwrap().as_str(), ALICE_HANDLE);
    assert_eq!(identity.pds_url, ctx.base_url());
}

#[tokio::test]
async fn test_unknown_handle_is_a_resolution_error() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/xrpc/com.atproto.identity.resolveHandle"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "InvalidRequest",
            "message": "Unable to resolve handle",
        })))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .manager()
        .resolver()
        .resolve_actor(&Actor::parse("nobody.test").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Resolution(_)));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_discovery_follows_protected_resource() {
    let ctx = TestContext::new().await;
    ctx.mount_identity_and_discovery().await;

    let metadata = discover(ctx.manager().http(), &ctx.base_url()).await.unwrap();
    assert_eq!(metadata.issuer, ctx.base_url());
    assert_eq!(
        metadata.pushed_authorization_request_endpoint,
        Some(format!("{}/oauth/par", ctx.base_url()))
    );
}

#[tokio::test]
async fn test_discovery_rejects_issuer_mismatch() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-protected-resource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_servers": [ctx.base_url()],
        })))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/.well-known/oauth-authorization-server"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(auth_server_metadata("https://impostor.example")),
        )
        .mount(&ctx.server)
        .await;

    let err = discover(ctx.manager().http(), &ctx.base_url())
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::AuthenticationFailed(_)));
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_persists_session() {
    let ctx = TestContext::new().await;
    ctx.mount_identity_and_discovery().await;
    mount_par(&ctx).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(DpopNonce(Some("n1")))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=code-1"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json(ALICE_DID, "access-new")))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let manager = ctx.manager();
    let pending = manager.begin_login("@alice.test", 5173).await.unwrap();

    let expected_prefix = format!("{}/oauth/authorize?client_id=http%3A%2F%2Flocalhost", ctx.base_url());
    assert!(pending.authorization_url.starts_with(&expected_prefix));
    assert!(pending
        .authorization_url
        .ends_with("request_uri=urn%3Aietf%3Aparams%3Aoauth%3Arequest_uri%3Areq-1"));

    let params = redirect_for(&pending, "code-1");
    let auth = manager.complete_login(pending, params).await.unwrap();
    assert_eq!(auth.did().as_str(), ALICE_DID);
    assert_eq!(auth.access_token(), "access-new");

    let session = Session::load(&ctx.paths).unwrap().unwrap();
    assert_eq!(session.did.as_str(), ALICE_DID);
    assert_eq!(session.pds_url, ctx.base_url());
    assert!(session.client_id.starts_with("http://localhost?redirect_uri="));

    let recent = load_recent(&ctx.paths, 5);
    assert_eq!(recent.latest().map(|h| h.as_str()), Some(ALICE_HANDLE));

    let resumed = manager.resume_session().await.unwrap();
    assert_eq!(resumed.access_token(), "access-new");
}

#[tokio::test]
async fn test_login_rejects_token_for_other_account() {
    let ctx = TestContext::new().await;
    ctx.mount_identity_and_discovery().await;
    mount_par(&ctx).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_json("did:plc:mallory", "access-x")),
        )
        .mount(&ctx.server)
        .await;

    let manager = ctx.manager();
    let pending = manager.begin_login("alice.test", 5173).await.unwrap();
    let params = redirect_for(&pending, "code-1");

    let err = manager.complete_login(pending, params).await.unwrap_err();
    assert!(matches!(err, CliError::AuthenticationFailed(_)));
    assert!(Session::load(&ctx.paths).unwrap().is_none());
    assert!(!ctx.store().exists(&common::alice_did()));
}

#[tokio::test]
async fn test_login_denied_in_browser() {
    let ctx = TestContext::new().await;
    ctx.mount_identity_and_discovery().await;
    mount_par(&ctx).await;

    let manager = ctx.manager();
    let pending = manager.begin_login("alice.test", 5173).await.unwrap();
    let params = CallbackParams {
        state: Some(pending.state().to_string()),
        error: Some("access_denied".to_string()),
        error_description: Some("User rejected the request".to_string()),
        ..CallbackParams::default()
    };

    let err = manager.complete_login(pending, params).await.unwrap_err();
    assert!(matches!(err, CliError::AuthorizationDenied(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_login_rejects_empty_handle() {
    let ctx = TestContext::new().await;
    let err = ctx.manager().begin_login("  @ ", 5173).await.unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
    assert!(ctx.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_server_receives_redirect() {
    let server = CallbackServer::bind(0).await.unwrap();
    let port = server.port().unwrap();
    let waiting = tokio::spawn(server.wait(Duration::from_secs(5)));

    let response = reqwest::get(format!(
        "http://127.0.0.1:{port}/?code=abc&state=s1&iss=https%3A%2F%2Fauth.example"
    ))
    .await
    .unwrap();
    assert!(response.status().is_success());

    let params = waiting.await.unwrap().unwrap();
    assert_eq!(params.code.as_deref(), Some("abc"));
    assert_eq!(params.state.as_deref(), Some("s1"));
    assert_eq!(params.iss.as_deref(), Some("https://auth.example"));
}

// =========================================================================
// Resume and refresh
// =========================================================================

#[tokio::test]
async fn test_resume_refreshes_expiring_token() {
    let ctx = TestContext::new().await;
    ctx.write_session(60);
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json(ALICE_DID, "access-2")))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let manager = ctx.manager();
    let auth = manager.resume_session().await.unwrap();
    assert_eq!(auth.access_token(), "access-2");

    let stored = ctx.store().load(&common::alice_did()).unwrap().unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_resume_with_rejected_refresh_is_no_session() {
    let ctx = TestContext::new().await;
    ctx.write_session(60);
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token expired",
        })))
        .mount(&ctx.server)
        .await;

    let manager = ctx.manager();
    assert!(manager.resume_session().await.is_none());
    assert!(matches!(
        manager.require_session().await,
        Err(CliError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_resume_valid_token_makes_no_requests() {
    let ctx = TestContext::new().await;
    ctx.write_session(3600);

    let auth = ctx.manager().resume_session().await.unwrap();
    assert_eq!(auth.access_token(), "access-1");
    assert!(ctx.server.received_requests().await.unwrap().is_empty());
}

// =========================================================================
// Logout
// =========================================================================

#[tokio::test]
async fn test_logout_revokes_and_clears() {
    let ctx = TestContext::new().await;
    ctx.write_session(3600);
    followlist_cli::recent::record_recent(
        &ctx.paths,
        5,
        followlist_core::Handle::normalize(ALICE_HANDLE).unwrap(),
    )
    .unwrap();
    Mock::given(method("POST"))
        .and(path("/oauth/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&ctx.server)
        .await;

    let manager = ctx.manager();
    assert!(manager.terminate_session().await.unwrap());

    assert!(!ctx.paths.session_file.exists());
    assert!(!ctx.paths.recent_handles_file.exists());
    assert!(!ctx.store().exists(&common::alice_did()));
    assert!(manager.resume_session().await.is_none());
}

#[tokio::test]
async fn test_logout_survives_revocation_failure() {
    let ctx = TestContext::new().await;
    ctx.write_session(3600);
    Mock::given(method("POST"))
        .and(path("/oauth/revoke"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;

    assert!(ctx.manager().terminate_session().await.unwrap());
    assert!(!ctx.paths.session_file.exists());
}
