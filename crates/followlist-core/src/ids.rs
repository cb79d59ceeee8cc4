//! Account identifiers
//!
//! Two kinds of names point at an account on the network:
//!
//! - [`Did`] - the permanent, globally unique identity. This is the join key
//!   used when matching follows against list membership.
//! - [`Handle`] - the mutable, human-readable domain alias. Only used for
//!   display and for one-time resolution to a [`Did`].
//!
//! # Example
//!
//! ```
//! use followlist_core::{Actor, Did, Handle};
//!
//! let did: Did = "did:plc:abc123".parse().unwrap();
//! let handle = Handle::normalize("@Alice.Example").unwrap();
//! assert_eq!(handle.as_str(), "alice.example");
//!
//! assert!(matches!(Actor::parse("did:plc:abc123"), Ok(Actor::Did(d)) if d == did));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const MAX_HANDLE_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Error type for identifier parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Input was empty after normalization
    #[error("{kind} must not be empty")]
    Empty {
        /// The kind of identifier ("handle", "DID", ...)
        kind: &'static str,
    },

    /// Input was not a well-formed DID
    #[error("invalid DID '{0}'")]
    InvalidDid(String),

    /// Input was not a well-formed handle
    #[error("invalid handle '{0}'")]
    InvalidHandle(String),
}

/// Permanent account identity (`did:<method>:<id>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty { kind: "DID" });
        }
        if !Self::is_well_formed(trimmed) {
            return Err(IdentifierError::InvalidDid(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns true if the value looks like a DID (has the `did:` prefix).
    ///
    /// This is the shape check used to tell a DID apart from a handle, it
    /// does not validate the rest of the string.
    pub fn looks_like(value: &str) -> bool {
        value.starts_with("did:")
    }

    /// The DID method, e.g. `plc` or `web`.
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// The method-specific part, e.g. the host for `did:web`.
    pub fn method_specific_id(&self) -> &str {
        self.0
            .splitn(3, ':')
            .nth(2)
            .unwrap_or_default()
    }

    /// Borrow the DID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(value: &str) -> bool {
        let mut parts = value.splitn(3, ':');
        let (Some("did"), Some(method), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        !method.is_empty()
            && method.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && !id.is_empty()
            && !id.ends_with(':')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '%' | '-'))
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Human-readable account alias (a domain name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Normalize user input into a handle.
    ///
    /// Trims whitespace, strips one leading `@` and lowercases the result.
    pub fn normalize(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        if stripped.is_empty() {
            return Err(IdentifierError::Empty { kind: "handle" });
        }

        let lowered = stripped.to_ascii_lowercase();
        if !Self::is_well_formed(&lowered) {
            return Err(IdentifierError::InvalidHandle(stripped.to_string()));
        }
        Ok(Self(lowered))
    }

    /// Borrow the handle as a string slice (without `@`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(value: &str) -> bool {
        if value.len() > MAX_HANDLE_LEN {
            return false;
        }
        let labels: Vec<&str> = value.split('.').collect();
        labels.len() >= 2
            && labels.iter().all(|label| {
                !label.is_empty()
                    && label.len() <= MAX_LABEL_LEN
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// Either form of account reference, as typed by a user or found in a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Actor {
    /// Already a permanent identity, needs no resolution
    Did(Did),
    /// An alias that must be resolved before it can be used as a key
    Handle(Handle),
}

impl Actor {
    /// Parse a single token as either a DID or a handle.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if Did::looks_like(stripped) {
            Did::new(stripped).map(Self::Did)
        } else {
            Handle::normalize(stripped).map(Self::Handle)
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Did(did) => Display::fmt(did, f),
            Actor::Handle(handle) => Display::fmt(handle, f),
        }
    }
}
