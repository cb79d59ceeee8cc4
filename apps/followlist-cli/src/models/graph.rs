//! Graph XRPC response models

use followlist_core::AccountSummary;
use serde::Deserialize;

/// `app.bsky.graph.getFollows` output
#[derive(Debug, Clone, Deserialize)]
pub struct FollowsResponse {
    /// Accounts followed, in server order
    pub follows: Vec<AccountSummary>,

    /// Continuation cursor
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `app.bsky.graph.getFollowers` output
#[derive(Debug, Clone, Deserialize)]
pub struct FollowersResponse {
    /// Followers, in server order
    pub followers: Vec<AccountSummary>,

    /// Continuation cursor
    #[serde(default)]
    pub cursor: Option<String>,
}

/// `app.bsky.graph.getList` output
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    /// Membership records
    pub items: Vec<ListItem>,

    /// Continuation cursor
    #[serde(default)]
    pub cursor: Option<String>,
}

/// One list membership record
#[derive(Debug, Clone, Deserialize)]
pub struct ListItem {
    /// The member
    pub subject: AccountSummary,
}

/// XRPC error body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XrpcErrorBody {
    /// Error name
    #[serde(default)]
    pub error: Option<String>,

    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

impl XrpcErrorBody {
    /// Best available description
    pub fn describe(&self, fallback: &str) -> String {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) => format!("{error}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(error), None) => error.clone(),
            (None, None) => fallback.to_string(),
        }
    }
}
