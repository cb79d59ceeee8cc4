//! Recently used handles
//!
//! A small most-recent-first list kept for convenience when logging in again.
//! It plays no part in reconciliation.

use crate::ids::Handle;
use serde::{Deserialize, Serialize};

/// Default number of handles remembered
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Most-recent-first, de-duplicated, capped list of handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentHandles {
    #[serde(skip, default = "default_limit")]
    limit: usize,
    handles: Vec<Handle>,
}

fn default_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl RecentHandles {
    /// Empty list holding at most `limit` handles
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            handles: Vec::new(),
        }
    }

    /// Change the cap, dropping the oldest entries if needed
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self.handles.truncate(limit);
        self
    }

    /// Move `handle` to the front, dropping the oldest entry past the cap
    pub fn record(&mut self, handle: Handle) {
        self.handles.retain(|h| h != &handle);
        self.handles.insert(0, handle);
        self.handles.truncate(self.limit);
    }

    /// Handles, most recent first
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// The most recently used handle
    pub fn latest(&self) -> Option<&Handle> {
        self.handles.first()
    }

    /// Whether nothing is remembered
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for RecentHandles {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LIMIT)
    }
}
