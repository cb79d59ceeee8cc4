//! Account snapshots and list membership

use crate::ids::{Did, Handle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Snapshot of an account as returned by a graph collection
///
/// Field names follow the network's profile view so a page item can be
/// deserialized directly; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Permanent identity
    pub did: Did,

    /// Handle at fetch time
    pub handle: Handle,

    /// Display name, if the account set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl AccountSummary {
    /// Create a summary with only the required fields
    pub fn new(did: Did, handle: Handle) -> Self {
        Self {
            did,
            handle,
            display_name: None,
            avatar: None,
        }
    }

    /// Display name when present and non-blank, otherwise the handle
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.handle.as_str(),
        }
    }
}

/// Everyone currently on a list, keyed by DID
///
/// Membership tests are O(1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    members: HashSet<Did>,
}

impl MembershipSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `did` is on the list
    pub fn contains(&self, did: &Did) -> bool {
        self.members.contains(did)
    }

    /// Number of distinct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the list has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<Did> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = Did>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
