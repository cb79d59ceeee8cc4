//! Account identity resolution
//!
//! handle → DID through `com.atproto.identity.resolveHandle`, then
//! DID → DID document through the PLC directory or `did:web`, which names
//! the account's PDS.

use crate::error::{CliError, CliResult};
use crate::models::{DidDocument, ResolveHandleResponse, XrpcErrorBody};
use async_trait::async_trait;
use followlist_core::{Actor, Did, Handle, HandleResolver};
use reqwest::Client;
use tracing::{debug, instrument};

/// Where an account lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Account DID
    pub did: Did,
    /// Handle claimed by the DID document
    pub handle: Option<Handle>,
    /// PDS base URL
    pub pds_url: String,
}

/// Unauthenticated identity resolver
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    http: Client,
    handle_resolver: String,
    plc_directory: String,
}

impl IdentityResolver {
    /// Create a resolver against the given services
    pub fn new(http: Client, handle_resolver: &str, plc_directory: &str) -> Self {
        Self {
            http,
            handle_resolver: handle_resolver.trim_end_matches('/').to_string(),
            plc_directory: plc_directory.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a handle to its current DID
    #[instrument(skip_all, fields(handle = %handle))]
    pub async fn resolve_handle(&self, handle: &Handle) -> CliResult<Did> {
        let url = format!(
            "{}/xrpc/com.atproto.identity.resolveHandle",
            self.handle_resolver
        );
        let response = self
            .http
            .get(&url)
            .query(&[("handle", handle.as_str())])
            .send()
            .await?;

        if response.status().is_success() {
            let body: ResolveHandleResponse = response.json().await?;
            debug!(did = %body.did, "Handle resolved");
            Ok(body.did)
        } else {
            let status = response.status();
            let body: XrpcErrorBody = response.json().await.unwrap_or_default();
            Err(CliError::Resolution(format!(
                "{handle}: {}",
                body.describe(&format!("HTTP {status}"))
            )))
        }
    }

    /// Fetch the DID document for `did`
    #[instrument(skip_all, fields(did = %did))]
    pub async fn resolve_did(&self, did: &Did) -> CliResult<DidDocument> {
        let url = self.document_url(did)?;
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CliError::Resolution(format!(
                "{did}: DID document lookup returned HTTP {}",
                response.status()
            )));
        }

        let document: DidDocument = response.json().await?;
        if &document.id != did {
            return Err(CliError::Resolution(format!(
                "{did}: DID document is for {}",
                document.id
            )));
        }
        Ok(document)
    }

    /// Resolve a handle or DID to its DID, handle and PDS
    pub async fn resolve_actor(&self, actor: &Actor) -> CliResult<ResolvedIdentity> {
        let did = match actor {
            Actor::Did(did) => did.clone(),
            Actor::Handle(handle) => self.resolve_handle(handle).await?,
        };

        let document = self.resolve_did(&did).await?;
        let pds_url = document
            .pds_endpoint()
            .ok_or_else(|| CliError::Resolution(format!("{did}: no PDS in DID document")))?
            .to_string();

        // Only trust the handle if the document claims it back
        let handle = match actor {
            Actor::Handle(handle) if document.handle().as_ref() == Some(handle) => {
                Some(handle.clone())
            }
            Actor::Handle(_) => document.handle(),
            Actor::Did(_) => document.handle(),
        };

        debug!(did = %did, pds = %pds_url, "Identity resolved");
        Ok(ResolvedIdentity {
            did,
            handle,
            pds_url,
        })
    }

    fn document_url(&self, did: &Did) -> CliResult<String> {
        match did.method() {
            "plc" => Ok(format!("{}/{}", self.plc_directory, did)),
            "web" => {
                let id = did.method_specific_id();
                if id.contains(':') {
                    return Err(CliError::Resolution(format!(
                        "{did}: did:web with a path is not supported"
                    )));
                }
                let host = id.replace("%3A", ":").replace("%3a", ":");
                Ok(format!("https://{host}/.well-known/did.json"))
            }
            other => Err(CliError::Resolution(format!(
                "{did}: unsupported DID method '{other}'"
            ))),
        }
    }
}

#[async_trait]
impl HandleResolver for IdentityResolver {
    type Error = CliError;

    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, CliError> {
        IdentityResolver::resolve_handle(self, handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(
            Client::new(),
            "https://resolver.example/",
            "https://plc.example",
        )
    }

    #[test]
    fn test_document_url_plc() {
        let did = Did::new("did:plc:abc123").unwrap();
        assert_eq!(
            resolver().document_url(&did).unwrap(),
            "https://plc.example/did:plc:abc123"
        );
    }

    #[test]
    fn test_document_url_web() {
        let did = Did::new("did:web:example.com").unwrap();
        assert_eq!(
            resolver().document_url(&did).unwrap(),
            "https://example.com/.well-known/did.json"
        );
    }

    #[test]
    fn test_document_url_unsupported() {
        let did = Did::new("did:key:zQ3shabc").unwrap();
        assert!(matches!(
            resolver().document_url(&did),
            Err(CliError::Resolution(_))
        ));
    }
}
