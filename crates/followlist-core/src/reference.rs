//! List references
//!
//! A list can be named two ways:
//!
//! - a web URL, `https://bsky.app/profile/<owner>/lists/<rkey>`, where the
//!   owner is either a DID or a handle;
//! - the canonical resource identifier, `at://<did>/app.bsky.graph.list/<rkey>`.
//!
//! Parsing is purely syntactic and never touches the network. Resolving a
//! web reference whose owner is a handle performs exactly one handle lookup,
//! because the canonical form only accepts DIDs.

use crate::ids::{Actor, Did, Handle};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Collection NSID of list records
pub const LIST_COLLECTION: &str = "app.bsky.graph.list";

/// Web hosts whose profile URLs are accepted as list references
pub const DEFAULT_WEB_HOSTS: &[&str] = &["bsky.app", "www.bsky.app"];

const AT_SCHEME: &str = "at://";
const MAX_RKEY_LEN: usize = 512;

/// Error raised when a list reference cannot be understood
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid list reference '{input}': {reason}")]
pub struct ReferenceError {
    /// The input as given
    pub input: String,
    /// What was wrong with it
    pub reason: &'static str,
}

impl ReferenceError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Looks up the DID currently behind a handle
#[async_trait]
pub trait HandleResolver: Send + Sync {
    /// Error produced by the lookup
    type Error: Send;

    /// Resolve `handle` to its DID
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, Self::Error>;
}

/// Canonical `at://<did>/<collection>/<rkey>` identifier of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    authority: Did,
    collection: String,
    rkey: String,
}

impl AtUri {
    /// Identifier of the list record `rkey` owned by `owner`
    pub fn list(owner: Did, rkey: impl Into<String>) -> Self {
        Self {
            authority: owner,
            collection: LIST_COLLECTION.to_string(),
            rkey: rkey.into(),
        }
    }

    /// Parse a canonical identifier.
    ///
    /// The authority must be a DID; handles are rejected because the
    /// canonical form is only stable when keyed by identity.
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let rest = input
            .strip_prefix(AT_SCHEME)
            .ok_or_else(|| ReferenceError::new(input, "expected an at:// identifier"))?;

        if rest.contains(|c| c == '?' || c == '#') {
            return Err(ReferenceError::new(input, "query or fragment not allowed"));
        }

        let segments: Vec<&str> = rest.split('/').collect();
        let [authority, collection, rkey] = segments.as_slice() else {
            return Err(ReferenceError::new(
                input,
                "expected at://<did>/<collection>/<record-key>",
            ));
        };

        let authority = Did::new(*authority)
            .map_err(|_| ReferenceError::new(input, "owner must be a DID"))?;
        if collection.is_empty() {
            return Err(ReferenceError::new(input, "missing collection"));
        }
        if !is_valid_rkey(rkey) {
            return Err(ReferenceError::new(input, "missing or malformed record key"));
        }

        Ok(Self {
            authority,
            collection: (*collection).to_string(),
            rkey: (*rkey).to_string(),
        })
    }

    /// The owning DID
    pub fn authority(&self) -> &Did {
        &self.authority
    }

    /// The collection NSID
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The record key
    pub fn rkey(&self) -> &str {
        &self.rkey
    }
}

impl Display for AtUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{AT_SCHEME}{}/{}/{}",
            self.authority, self.collection, self.rkey
        )
    }
}

/// A parsed, not yet resolved, list reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListReference {
    /// Already canonical; passes through unchanged
    Canonical(AtUri),
    /// Taken from a web URL; the owner may still need resolving
    Web {
        /// Profile segment of the URL
        owner: Actor,
        /// List record key
        rkey: String,
    },
}

impl ListReference {
    /// Parse user input, accepting web URLs on [`DEFAULT_WEB_HOSTS`].
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        Self::parse_with_hosts(input, DEFAULT_WEB_HOSTS)
    }

    /// Parse user input, accepting web URLs on the given hosts.
    pub fn parse_with_hosts<S: AsRef<str>>(
        input: &str,
        web_hosts: &[S],
    ) -> Result<Self, ReferenceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::new(input, "empty input"));
        }

        if trimmed.starts_with(AT_SCHEME) {
            let uri = AtUri::parse(trimmed)?;
            if uri.collection() != LIST_COLLECTION {
                return Err(ReferenceError::new(input, "record is not a list"));
            }
            return Ok(Self::Canonical(uri));
        }

        if trimmed.starts_with("https://") {
            return Self::parse_web(trimmed, web_hosts);
        }

        Err(ReferenceError::new(
            input,
            "expected a list URL or an at:// identifier",
        ))
    }

    fn parse_web<S: AsRef<str>>(input: &str, web_hosts: &[S]) -> Result<Self, ReferenceError> {
        let url = Url::parse(input).map_err(|_| ReferenceError::new(input, "malformed URL"))?;

        let host = url.host_str().unwrap_or_default();
        if !web_hosts
            .iter()
            .any(|known| known.as_ref().eq_ignore_ascii_case(host))
        {
            return Err(ReferenceError::new(input, "unrecognized host"));
        }

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.collect())
            .unwrap_or_default();
        if segments.last() == Some(&"") {
            segments.pop();
        }

        let ["profile", owner, "lists", rkey] = segments.as_slice() else {
            return Err(ReferenceError::new(
                input,
                "expected /profile/<owner>/lists/<record-key>",
            ));
        };

        let owner = decode_owner(owner);
        let owner =
            Actor::parse(&owner).map_err(|_| ReferenceError::new(input, "malformed list owner"))?;
        if !is_valid_rkey(rkey) {
            return Err(ReferenceError::new(input, "missing or malformed record key"));
        }

        Ok(Self::Web {
            owner,
            rkey: (*rkey).to_string(),
        })
    }

    /// Produce the canonical identifier, resolving a handle owner if needed.
    pub async fn resolve<R>(self, resolver: &R) -> Result<AtUri, R::Error>
    where
        R: HandleResolver + ?Sized,
    {
        match self {
            ListReference::Canonical(uri) => Ok(uri),
            ListReference::Web {
                owner: Actor::Did(did),
                rkey,
            } => Ok(AtUri::list(did, rkey)),
            ListReference::Web {
                owner: Actor::Handle(handle),
                rkey,
            } => {
                debug!(handle = %handle, "Resolving list owner handle");
                let did = resolver.resolve_handle(&handle).await?;
                Ok(AtUri::list(did, rkey))
            }
        }
    }
}

fn decode_owner(segment: &str) -> String {
    segment.replace("%3A", ":").replace("%3a", ":")
}

fn is_valid_rkey(rkey: &str) -> bool {
    !rkey.is_empty()
        && rkey.len() <= MAX_RKEY_LEN
        && rkey != "."
        && rkey != ".."
        && rkey
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '~'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_uri_display_round_trip() {
        let uri = AtUri::list(Did::new("did:plc:abc123").unwrap(), "xyz789");
        assert_eq!(uri.to_string(), "at://did:plc:abc123/app.bsky.graph.list/xyz789");
        assert_eq!(AtUri::parse(&uri.to_string()).unwrap(), uri);
    }

    #[test]
    fn test_at_uri_rejects_handle_authority() {
        let err = AtUri::parse("at://alice.example/app.bsky.graph.list/xyz").unwrap_err();
        assert_eq!(err.reason, "owner must be a DID");
    }

    #[test]
    fn test_at_uri_rejects_wrong_segment_count() {
        assert!(AtUri::parse("at://did:plc:abc/app.bsky.graph.list").is_err());
        assert!(AtUri::parse("at://did:plc:abc/app.bsky.graph.list/a/b").is_err());
        assert!(AtUri::parse("at://did:plc:abc/app.bsky.graph.list/").is_err());
    }

    #[test]
    fn test_parse_canonical_passes_through() {
        let input = "at://did:plc:abc123/app.bsky.graph.list/xyz789";
        let ListReference::Canonical(uri) = ListReference::parse(input).unwrap() else {
            panic!("expected canonical reference");
        };
        assert_eq!(uri.to_string(), input);
    }

    #[test]
    fn test_parse_canonical_rejects_other_collections() {
        let err =
            ListReference::parse("at://did:plc:abc/app.bsky.feed.post/xyz").unwrap_err();
        assert_eq!(err.reason, "record is not a list");
    }

    #[test]
    fn test_parse_web_with_did_owner() {
        let reference =
            ListReference::parse("https://bsky.app/profile/did:plc:abc123/lists/xyz789").unwrap();
        assert_eq!(
            reference,
            ListReference::Web {
                owner: Actor::Did(Did::new("did:plc:abc123").unwrap()),
                rkey: "xyz789".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_web_with_handle_owner_and_trailing_slash() {
        let reference =
            ListReference::parse("https://bsky.app/profile/Alice.Example/lists/xyz789/").unwrap();
        assert_eq!(
            reference,
            ListReference::Web {
                owner: Actor::Handle(Handle::normalize("alice.example").unwrap()),
                rkey: "xyz789".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_web_with_encoded_did() {
        let reference =
            ListReference::parse("https://bsky.app/profile/did%3Aplc%3Aabc/lists/xyz").unwrap();
        assert!(matches!(reference, ListReference::Web { owner: Actor::Did(_), .. }));
    }

    #[test]
    fn test_parse_web_missing_rkey() {
        let err = ListReference::parse("https://bsky.app/profile/alice.example/lists").unwrap_err();
        assert_eq!(err.reason, "expected /profile/<owner>/lists/<record-key>");

        assert!(ListReference::parse("https://bsky.app/profile/alice.example/lists/").is_err());
    }

    #[test]
    fn test_parse_web_unknown_host() {
        let err =
            ListReference::parse("https://example.com/profile/alice.example/lists/xyz").unwrap_err();
        assert_eq!(err.reason, "unrecognized host");
    }

    #[test]
    fn test_parse_web_custom_hosts() {
        let hosts = ["staging.bsky.dev"];
        assert!(ListReference::parse_with_hosts(
            "https://staging.bsky.dev/profile/alice.example/lists/xyz",
            &hosts
        )
        .is_ok());
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(ListReference::parse("").is_err());
        assert!(ListReference::parse("xyz789").is_err());
        assert!(ListReference::parse("http://bsky.app/profile/a.b/lists/x").is_err());
        assert!(ListReference::parse("https://bsky.app/profile/a.b/feed/x").is_err());
    }
}
