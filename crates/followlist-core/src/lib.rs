//! followlist Core Library
//!
//! Network-independent logic for checking which accounts a user follows
//! (or is followed by) are members of a list.
//!
//! # Modules
//!
//! - [`ids`] - Account identifiers (Did, Handle, Actor)
//! - [`account`] - Account snapshots and list membership sets
//! - [`reference`] - List reference parsing and canonicalization
//! - [`fetch`] - Bounded cursor-pagination drain
//! - [`reconcile`] - Order-preserving intersection
//! - [`workflow`] - Login / fetch / compare state machine
//! - [`recent`] - Recently used handles
//!
//! # Example
//!
//! ```
//! use followlist_core::{reconcile, AccountSummary, Did, Handle, MembershipSet};
//!
//! let follows = vec![
//!     AccountSummary::new(Did::new("did:plc:a").unwrap(), Handle::normalize("a.test").unwrap()),
//!     AccountSummary::new(Did::new("did:plc:b").unwrap(), Handle::normalize("b.test").unwrap()),
//! ];
//! let list: MembershipSet = [Did::new("did:plc:b").unwrap()].into_iter().collect();
//!
//! let matches = reconcile(&follows, &list);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].handle.as_str(), "b.test");
//! ```

pub mod account;
pub mod fetch;
pub mod ids;
pub mod recent;
pub mod reconcile;
pub mod reference;
pub mod workflow;

pub use account::{AccountSummary, MembershipSet};
pub use fetch::{
    fetch_all, fetch_all_with_progress, FetchError, FetchProgress, LimitsError, Page, PageSource,
    PaginationLimits,
};
pub use ids::{Actor, Did, Handle, IdentifierError};
pub use recent::RecentHandles;
pub use reconcile::reconcile;
pub use reference::{AtUri, HandleResolver, ListReference, ReferenceError};
pub use workflow::{Matches, Workflow, WorkflowAction, WorkflowError, WorkflowState};
