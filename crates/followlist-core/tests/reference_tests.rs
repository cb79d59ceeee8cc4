//! Integration tests for list reference normalization
//!
//! Tests cover:
//! - DID-owned web URLs canonicalize without a lookup
//! - Handle-owned web URLs trigger exactly one lookup
//! - Canonical identifiers pass through
//! - Malformed references fail before any lookup

use async_trait::async_trait;
use followlist_core::{Did, Handle, HandleResolver, ListReference};
use std::sync::Mutex;

/// Resolver that records every handle it is asked about
#[derive(Default)]
struct RecordingResolver {
    calls: Mutex<Vec<String>>,
}

impl RecordingResolver {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandleResolver for RecordingResolver {
    type Error = String;

    async fn resolve_handle(&self, handle: &Handle) -> Result<Did, String> {
        self.calls.lock().unwrap().push(handle.to_string());
        if handle.as_str() == "unknown.example" {
            return Err("Unable to resolve handle".to_string());
        }
        Ok(Did::new("did:plc:resolved999").unwrap())
    }
}

#[tokio::test]
async fn test_did_owner_needs_no_lookup() {
    let resolver = RecordingResolver::default();

    let uri = ListReference::parse("https://bsky.app/profile/did:plc:abc123/lists/xyz789")
        .unwrap()
        .resolve(&resolver)
        .await
        .unwrap();

    assert_eq!(uri.to_string(), "at://did:plc:abc123/app.bsky.graph.list/xyz789");
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_handle_owner_resolved_once() {
    let resolver = RecordingResolver::default();

    let uri = ListReference::parse("https://bsky.app/profile/alice.example/lists/xyz789")
        .unwrap()
        .resolve(&resolver)
        .await
        .unwrap();

    assert_eq!(
        uri.to_string(),
        "at://did:plc:resolved999/app.bsky.graph.list/xyz789"
    );
    assert_eq!(resolver.calls(), vec!["alice.example".to_string()]);
}

#[tokio::test]
async fn test_canonical_reference_passes_through() {
    let resolver = RecordingResolver::default();
    let input = "at://did:plc:abc123/app.bsky.graph.list/xyz789";

    let uri = ListReference::parse(input)
        .unwrap()
        .resolve(&resolver)
        .await
        .unwrap();

    assert_eq!(uri.to_string(), input);
    assert!(resolver.calls().is_empty());
}

#[tokio::test]
async fn test_resolution_failure_propagates() {
    let resolver = RecordingResolver::default();

    let err = ListReference::parse("https://bsky.app/profile/unknown.example/lists/xyz789")
        .unwrap()
        .resolve(&resolver)
        .await
        .unwrap_err();

    assert_eq!(err, "Unable to resolve handle");
}

#[test]
fn test_malformed_reference_fails_without_lookup() {
    // Parsing happens before any resolver is involved; a failure here means
    // no network call can have been made.
    let err = ListReference::parse("https://bsky.app/profile/alice.example/lists").unwrap_err();
    assert!(err.to_string().contains("invalid list reference"));

    assert!(ListReference::parse("https://bsky.app/profile/did:plc:abc123").is_err());
    assert!(ListReference::parse("at://did:plc:abc123/app.bsky.graph.list").is_err());
}
