//! Loopback listener for the authorization redirect

use crate::error::{CliError, CliResult};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info};

const SUCCESS_PAGE: &str = "<!doctype html><html><head><title>followlist</title></head>\
<body><h1>Signed in</h1><p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<!doctype html><html><head><title>followlist</title></head>\
<body><h1>Sign-in failed</h1><p>Return to the terminal for details.</p></body></html>";

/// Query parameters of the redirect
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub iss: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// A checked, successful redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
}

impl CallbackParams {
    /// Check the redirect belongs to this login and carries a code
    pub fn into_code(
        self,
        expected_state: &str,
        expected_issuer: &str,
    ) -> CliResult<AuthorizationCode> {
        if self.state.as_deref() != Some(expected_state) {
            return Err(CliError::AuthenticationFailed(
                "State mismatch in authorization response".to_string(),
            ));
        }

        if let Some(error) = self.error {
            let detail = self.error_description.unwrap_or_else(|| error.clone());
            return Err(if error == "access_denied" {
                CliError::AuthorizationDenied(detail)
            } else {
                CliError::AuthenticationFailed(detail)
            });
        }

        match self.iss.as_deref() {
            Some(iss) if iss.trim_end_matches('/') == expected_issuer.trim_end_matches('/') => {}
            Some(iss) => {
                return Err(CliError::AuthenticationFailed(format!(
                    "Unexpected issuer in authorization response: {iss}"
                )))
            }
            None => {
                return Err(CliError::AuthenticationFailed(
                    "Authorization response is missing the issuer".to_string(),
                ))
            }
        }

        self.code
            .filter(|c| !c.is_empty())
            .map(|code| AuthorizationCode { code })
            .ok_or_else(|| {
                CliError::AuthenticationFailed(
                    "Authorization response is missing the code".to_string(),
                )
            })
    }
}

type Sender = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// Router answering the redirect at `/`; the first request is forwarded to `sender`
pub fn callback_router(sender: oneshot::Sender<CallbackParams>) -> Router {
    let state: Sender = Arc::new(Mutex::new(Some(sender)));
    Router::new()
        .route("/", get(handle_redirect))
        .with_state(state)
}

async fn handle_redirect(
    State(sender): State<Sender>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let page = if params.error.is_some() {
        (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
    } else {
        (StatusCode::OK, Html(SUCCESS_PAGE))
    };

    match sender.lock().await.take() {
        Some(tx) => {
            let _ = tx.send(params);
        }
        None => debug!("Ignoring repeated redirect"),
    }
    page
}

/// Bound loopback listener waiting for one redirect
pub struct CallbackServer {
    listener: TcpListener,
}

impl CallbackServer {
    /// Bind `127.0.0.1:<port>` (port 0 picks a free one)
    pub async fn bind(port: u16) -> CliResult<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            CliError::Config(format!(
                "Cannot listen on {addr} for the sign-in redirect: {e}"
            ))
        })?;
        Ok(Self { listener })
    }

    /// Port actually bound
    pub fn port(&self) -> CliResult<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Serve until the redirect arrives or `timeout` elapses
    pub async fn wait(self, timeout: Duration) -> CliResult<CallbackParams> {
        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        info!(port = self.port()?, "Waiting for authorization redirect");
        let server = tokio::spawn(
            axum::serve(self.listener, callback_router(tx))
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .into_future(),
        );

        let outcome = tokio::time::timeout(timeout, rx).await;
        let _ = shutdown_tx.send(());
        let _ = server.await;

        match outcome {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(CliError::AuthenticationFailed(
                "Callback listener stopped unexpectedly".to_string(),
            )),
            Err(_) => Err(CliError::LoginTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: &str, state: &str, iss: &str) -> CallbackParams {
        CallbackParams {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            iss: Some(iss.to_string()),
            ..CallbackParams::default()
        }
    }

    #[test]
    fn test_valid_redirect() {
        let code = params("abc", "s1", "https://auth.example")
            .into_code("s1", "https://auth.example/")
            .unwrap();
        assert_eq!(code.code, "abc");
    }

    #[test]
    fn test_state_mismatch() {
        let err = params("abc", "s2", "https://auth.example")
            .into_code("s1", "https://auth.example")
            .unwrap_err();
        assert!(matches!(err, CliError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_issuer_mismatch() {
        let err = params("abc", "s1", "https://evil.example")
            .into_code("s1", "https://auth.example")
            .unwrap_err();
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_access_denied() {
        let denied = CallbackParams {
            state: Some("s1".to_string()),
            error: Some("access_denied".to_string()),
            error_description: Some("User declined".to_string()),
            ..CallbackParams::default()
        };
        assert!(matches!(
            denied.into_code("s1", "https://auth.example"),
            Err(CliError::AuthorizationDenied(ref d)) if d == "User declined"
        ));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let server = CallbackServer::bind(0).await.unwrap();
        let result = server.wait(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(CliError::LoginTimeout)));
    }
}
