//! Session lifecycle: login, resume, logout
//!
//! A session is the pair of [`Session`] (who, where, which server) and
//! [`Credentials`] (DPoP-bound tokens and their key). Commands receive a live
//! [`AuthSession`] from [`SessionManager`]; nothing else reads the stores.

use crate::config::{Config, ConfigPaths};
use crate::credentials::{get_credential_store, CredentialStore};
use crate::error::{CliError, CliResult};
use crate::models::{AuthServerMetadata, Credentials, Session, TokenResponse};
use crate::oauth::callback::{CallbackParams, CallbackServer};
use crate::oauth::client::{AuthorizationRequest, OAuthClient};
use crate::oauth::client_metadata::ClientIdentity;
use crate::oauth::discovery::discover;
use crate::oauth::dpop::DpopKey;
use crate::oauth::pkce::{random_token, PkcePair};
use crate::oauth::resolver::{IdentityResolver, ResolvedIdentity};
use crate::recent::{clear_recent, record_recent};
use chrono::Utc;
use followlist_core::{Actor, Did, Handle};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

/// Refresh tokens this close to expiry
const REFRESH_WINDOW_MINUTES: i64 = 5;

/// Length of the random `state` value
const STATE_LENGTH: usize = 24;

/// An authenticated account, ready for API calls
#[derive(Debug)]
pub struct AuthSession {
    pub session: Session,
    pub credentials: Credentials,
    dpop: DpopKey,
}

impl AuthSession {
    /// Account DID
    pub fn did(&self) -> &Did {
        &self.session.did
    }

    /// Account handle, when known
    pub fn handle(&self) -> Option<&Handle> {
        self.session.handle.as_ref()
    }

    /// PDS base URL
    pub fn pds_url(&self) -> &str {
        &self.session.pds_url
    }

    /// Current access token
    pub fn access_token(&self) -> &str {
        &self.credentials.access_token
    }

    /// Key the access token is bound to
    pub fn dpop_key(&self) -> &DpopKey {
        &self.dpop
    }
}

/// A login waiting for the browser redirect
#[derive(Debug)]
pub struct PendingLogin {
    /// URL the user must open
    pub authorization_url: String,
    identity: ResolvedIdentity,
    metadata: AuthServerMetadata,
    client: OAuthClient,
    redirect_uri: String,
    pkce: PkcePair,
    state: String,
    dpop: DpopKey,
}

impl PendingLogin {
    /// `state` value the redirect must echo
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Authorization server issuer
    pub fn issuer(&self) -> &str {
        &self.metadata.issuer
    }
}

/// Owns configuration, the credential store and HTTP access for sessions
pub struct SessionManager {
    config: Config,
    paths: ConfigPaths,
    store: Box<dyn CredentialStore>,
    http: Client,
    resolver: IdentityResolver,
}

impl SessionManager {
    /// Manager using the default config directory and platform store
    pub fn from_defaults() -> CliResult<Self> {
        let paths = ConfigPaths::new()?;
        let config = Config::load(&paths)?;
        let store = get_credential_store(&paths);
        Self::new(config, paths, store)
    }

    /// Manager with explicit configuration and store
    pub fn new(
        config: Config,
        paths: ConfigPaths,
        store: Box<dyn CredentialStore>,
    ) -> CliResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("followlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CliError::Network(format!("Failed to create HTTP client: {e}")))?;

        let resolver = IdentityResolver::new(
            http.clone(),
            &config.handle_resolver,
            &config.plc_directory,
        );

        Ok(Self {
            config,
            paths,
            store,
            http,
            resolver,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Shared HTTP client
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Unauthenticated identity resolver
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Run a full interactive login for `input` (handle or DID).
    ///
    /// Binds the loopback listener on `port` (0 for any), hands the
    /// authorization URL to `present`, and waits for the redirect.
    pub async fn initiate_login<F>(&self, input: &str, port: u16, present: F) -> CliResult<AuthSession>
    where
        F: FnOnce(&str),
    {
        let server = CallbackServer::bind(port).await?;
        let pending = self.begin_login(input, server.port()?).await?;

        present(&pending.authorization_url);

        let params = server.wait(self.config.login_timeout()).await?;
        self.complete_login(pending, params).await
    }

    /// Resolve the account, discover its authorization server and push the request
    #[instrument(skip(self))]
    pub async fn begin_login(&self, input: &str, redirect_port: u16) -> CliResult<PendingLogin> {
        let actor = Actor::parse(input)?;
        let identity = self.resolver.resolve_actor(&actor).await?;
        let metadata = discover(&self.http, &identity.pds_url).await?;

        let client_identity =
            ClientIdentity::loopback(redirect_port, self.config.client_id.as_deref());
        let client = OAuthClient::new(self.http.clone(), client_identity.client_id.clone());

        let dpop = DpopKey::generate()?;
        let pkce = PkcePair::generate();
        let state = random_token(STATE_LENGTH);

        let par = client
            .push_authorization(
                &metadata,
                &AuthorizationRequest {
                    redirect_uri: &client_identity.redirect_uri,
                    scope: &client_identity.scope,
                    state: &state,
                    code_challenge: &pkce.challenge,
                    login_hint: Some(input.trim().trim_start_matches('@')),
                },
                &dpop,
            )
            .await?;

        let authorization_url = client.authorization_url(&metadata, &par.request_uri)?;
        debug!(issuer = %metadata.issuer, "Authorization request pushed");

        Ok(PendingLogin {
            authorization_url,
            identity,
            metadata,
            client,
            redirect_uri: client_identity.redirect_uri,
            pkce,
            state,
            dpop,
        })
    }

    /// Finish a login with the redirect parameters and persist the session
    #[instrument(skip_all)]
    pub async fn complete_login(
        &self,
        pending: PendingLogin,
        params: CallbackParams,
    ) -> CliResult<AuthSession> {
        let code = params.into_code(&pending.state, &pending.metadata.issuer)?;

        let token = pending
            .client
            .exchange_code(
                &pending.metadata.token_endpoint,
                &code.code,
                &pending.redirect_uri,
                &pending.pkce.verifier,
                &pending.dpop,
            )
            .await?;
        check_token(&token, &pending.identity.did)?;

        let session = Session {
            did: pending.identity.did,
            handle: pending.identity.handle,
            pds_url: pending.identity.pds_url,
            issuer: pending.metadata.issuer,
            token_endpoint: pending.metadata.token_endpoint,
            revocation_endpoint: pending.metadata.revocation_endpoint,
            client_id: pending.client.client_id().to_string(),
            created_at: Utc::now(),
        };
        let credentials = Credentials::from_token_response(token, pending.dpop.to_base64());

        self.store.store(&session.did, &credentials)?;
        session.save(&self.paths)?;

        if let Some(handle) = &session.handle {
            if let Err(e) = record_recent(
                &self.paths,
                self.config.recent_handles_limit,
                handle.clone(),
            ) {
                warn!(error = %e, "Could not update recent handles");
            }
        }

        info!(did = %session.did, "Signed in");
        Ok(AuthSession {
            session,
            credentials,
            dpop: pending.dpop,
        })
    }

    /// Restore the stored session, refreshing tokens near expiry.
    ///
    /// Returns `None` when there is no usable session; problems are logged.
    pub async fn resume_session(&self) -> Option<AuthSession> {
        match self.try_resume().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Stored session is not usable");
                None
            }
        }
    }

    /// The stored session, or [`CliError::NotAuthenticated`]
    pub async fn require_session(&self) -> CliResult<AuthSession> {
        self.resume_session()
            .await
            .ok_or(CliError::NotAuthenticated)
    }

    async fn try_resume(&self) -> CliResult<Option<AuthSession>> {
        let Some(session) = Session::load(&self.paths)? else {
            return Ok(None);
        };
        let Some(credentials) = self.store.load(&session.did)? else {
            debug!("Session file present without credentials");
            return Ok(None);
        };
        let dpop = DpopKey::from_base64(&credentials.dpop_key)?;

        if !credentials.expires_within(chrono::Duration::minutes(REFRESH_WINDOW_MINUTES)) {
            return Ok(Some(AuthSession {
                session,
                credentials,
                dpop,
            }));
        }

        if !credentials.can_refresh() {
            return Err(CliError::TokenExpired);
        }

        debug!("Refreshing access token");
        let client = OAuthClient::new(self.http.clone(), session.client_id.clone());
        let token = client
            .refresh(&session.token_endpoint, &credentials.refresh_token, &dpop)
            .await?;
        check_token(&token, &session.did)?;

        let mut refreshed = Credentials::from_token_response(token, credentials.dpop_key.clone());
        if !refreshed.can_refresh() {
            refreshed.refresh_token = credentials.refresh_token;
        }
        self.store.store(&session.did, &refreshed)?;

        Ok(Some(AuthSession {
            session,
            credentials: refreshed,
            dpop,
        }))
    }

    /// Revoke and forget the stored session. Returns whether one existed.
    ///
    /// Every local artifact is removed even when an earlier removal fails;
    /// the first failure is returned afterwards.
    pub async fn terminate_session(&self) -> CliResult<bool> {
        let existed = self.paths.session_file.exists();
        let session = Session::load(&self.paths).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable session file");
            None
        });

        if let Some(session) = &session {
            match self.store.load(&session.did) {
                Ok(Some(credentials)) => self.revoke(session, &credentials).await,
                Ok(None) => debug!(did = %session.did, "No credentials to revoke"),
                Err(e) => warn!(error = %e, "Ignoring unreadable credentials"),
            }
        }

        let results = [
            session
                .as_ref()
                .map_or(Ok(()), |session| self.store.delete(&session.did)),
            Session::delete(&self.paths),
            clear_recent(&self.paths),
        ];
        for result in &results {
            if let Err(e) = result {
                warn!(error = %e, "Failed to remove stored session data");
            }
        }
        results.into_iter().collect::<CliResult<()>>()?;

        Ok(existed)
    }

    /// Name of the backend holding credentials
    pub fn credential_backend(&self) -> &'static str {
        self.store.backend()
    }

    async fn revoke(&self, session: &Session, credentials: &Credentials) {
        let Some(endpoint) = session.revocation_endpoint.as_deref() else {
            return;
        };
        let dpop = match DpopKey::from_base64(&credentials.dpop_key) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Skipping token revocation");
                return;
            }
        };

        let client = OAuthClient::new(self.http.clone(), session.client_id.clone());
        if credentials.can_refresh() {
            client.revoke(endpoint, &credentials.refresh_token, &dpop).await;
        }
        client.revoke(endpoint, &credentials.access_token, &dpop).await;
    }
}

/// Tokens must belong to the account that signed in
fn check_token(token: &TokenResponse, did: &Did) -> CliResult<()> {
    if token.sub != did.as_str() {
        return Err(CliError::AuthenticationFailed(format!(
            "Token issued for {} instead of {did}",
            token.sub
        )));
    }
    let has_atproto = token
        .scope
        .as_deref()
        .map_or(true, |scope| scope.split_whitespace().any(|s| s == "atproto"));
    if !has_atproto {
        return Err(CliError::AuthenticationFailed(
            "Token was not granted the atproto scope".to_string(),
        ));
    }
    Ok(())
}
