//! Identity resolution models

use followlist_core::{Did, Handle};
use serde::{Deserialize, Serialize};

/// Service id fragment of the personal data server entry
pub const PDS_SERVICE_ID: &str = "#atproto_pds";

/// Service type of the personal data server entry
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// `com.atproto.identity.resolveHandle` output
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveHandleResponse {
    /// DID the handle currently points to
    pub did: Did,
}

/// A DID document, reduced to the fields the CLI reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// Subject DID
    pub id: Did,

    /// Aliases; the handle appears as `at://<handle>`
    #[serde(default)]
    pub also_known_as: Vec<String>,

    /// Service endpoints
    #[serde(default)]
    pub service: Vec<DidService>,
}

/// A service entry in a DID document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    /// Entry id, absolute or a `#fragment`
    pub id: String,

    /// Service type
    #[serde(rename = "type")]
    pub service_type: String,

    /// Endpoint URL
    pub service_endpoint: String,
}

impl DidDocument {
    /// Personal data server endpoint, without a trailing slash
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| s.id.ends_with(PDS_SERVICE_ID) && s.service_type == PDS_SERVICE_TYPE)
            .map(|s| s.service_endpoint.trim_end_matches('/'))
    }

    /// First well-formed handle alias
    pub fn handle(&self) -> Option<Handle> {
        self.also_known_as
            .iter()
            .filter_map(|aka| aka.strip_prefix("at://"))
            .find_map(|h| Handle::normalize(h).ok())
    }
}
