//! Check workflow state machine
//!
//! The check runs as four user actions: log in, fetch follows, fetch the
//! list, compare. [`Workflow`] holds the data produced so far and rejects any
//! action taken out of order instead of relying on the caller to hide it.
//!
//! ```text
//! Unauthenticated --login--> Authenticated --fetch_follows--> FollowsFetched
//!     --fetch_list--> ListFetched --compare--> Reconciled
//! ```
//!
//! Re-fetching follows from any later state restarts at `FollowsFetched`;
//! re-fetching the list keeps the follows. `logout` returns to
//! `Unauthenticated` from anywhere.

use crate::account::{AccountSummary, MembershipSet};
use crate::ids::Did;
use crate::reconcile::reconcile;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use tracing::debug;

/// Where the workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// No session
    Unauthenticated,
    /// Session present, nothing fetched
    Authenticated,
    /// Subject collections fetched
    FollowsFetched,
    /// Subjects and list membership fetched
    ListFetched,
    /// Matches computed
    Reconciled,
}

impl Display for WorkflowState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Unauthenticated => write!(f, "unauthenticated"),
            WorkflowState::Authenticated => write!(f, "authenticated"),
            WorkflowState::FollowsFetched => write!(f, "follows fetched"),
            WorkflowState::ListFetched => write!(f, "list fetched"),
            WorkflowState::Reconciled => write!(f, "reconciled"),
        }
    }
}

/// The user-facing actions that drive the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Establish a session
    Login,
    /// Fetch the subject collections
    FetchFollows,
    /// Fetch list membership
    FetchList,
    /// Compute matches
    Compare,
}

impl Display for WorkflowAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowAction::Login => write!(f, "login"),
            WorkflowAction::FetchFollows => write!(f, "fetch follows"),
            WorkflowAction::FetchList => write!(f, "fetch list"),
            WorkflowAction::Compare => write!(f, "compare"),
        }
    }
}

/// An action was attempted in a state that does not allow it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The action needs a session and there is none
    #[error("cannot {action}: not logged in")]
    NotAuthenticated {
        /// The rejected action
        action: WorkflowAction,
    },

    /// The action's prerequisites have not run yet
    #[error("cannot {action} while {state}")]
    OutOfOrder {
        /// The rejected action
        action: WorkflowAction,
        /// State at the time
        state: WorkflowState,
    },
}

/// Matches for one subject collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    /// Matched accounts the user follows
    pub follows: Vec<AccountSummary>,
    /// Matched followers, when followers were fetched
    pub followers: Option<Vec<AccountSummary>>,
}

impl Matches {
    /// Total matched accounts across collections
    pub fn total(&self) -> usize {
        self.follows.len() + self.followers.as_ref().map_or(0, Vec::len)
    }
}

/// Data carried between workflow steps
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    account: Option<Did>,
    follows: Option<Vec<AccountSummary>>,
    followers: Option<Vec<AccountSummary>>,
    membership: Option<MembershipSet>,
    matches: Option<Matches>,
}

impl Workflow {
    /// A workflow with no session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, derived from the data held
    pub fn state(&self) -> WorkflowState {
        match (
            &self.account,
            &self.follows,
            &self.membership,
            &self.matches,
        ) {
            (None, ..) => WorkflowState::Unauthenticated,
            (Some(_), None, ..) => WorkflowState::Authenticated,
            (Some(_), Some(_), None, _) => WorkflowState::FollowsFetched,
            (Some(_), Some(_), Some(_), None) => WorkflowState::ListFetched,
            (Some(_), Some(_), Some(_), Some(_)) => WorkflowState::Reconciled,
        }
    }

    /// The logged-in account
    pub fn account(&self) -> Option<&Did> {
        self.account.as_ref()
    }

    /// Fetched follows, if any
    pub fn follows(&self) -> Option<&[AccountSummary]> {
        self.follows.as_deref()
    }

    /// Fetched followers, if requested
    pub fn followers(&self) -> Option<&[AccountSummary]> {
        self.followers.as_deref()
    }

    /// Fetched list membership
    pub fn membership(&self) -> Option<&MembershipSet> {
        self.membership.as_ref()
    }

    /// Computed matches
    pub fn matches(&self) -> Option<&Matches> {
        self.matches.as_ref()
    }

    /// Unauthenticated -> Authenticated
    pub fn login(&mut self, account: Did) -> Result<(), WorkflowError> {
        self.expect(WorkflowAction::Login, &[WorkflowState::Unauthenticated])?;
        debug!(did = %account, "Workflow: logged in");
        self.account = Some(account);
        Ok(())
    }

    /// Any authenticated state -> FollowsFetched
    pub fn fetch_follows(
        &mut self,
        follows: Vec<AccountSummary>,
        followers: Option<Vec<AccountSummary>>,
    ) -> Result<(), WorkflowError> {
        self.expect(
            WorkflowAction::FetchFollows,
            &[
                WorkflowState::Authenticated,
                WorkflowState::FollowsFetched,
                WorkflowState::ListFetched,
                WorkflowState::Reconciled,
            ],
        )?;
        debug!(
            follows = follows.len(),
            followers = followers.as_ref().map(Vec::len),
            "Workflow: follows fetched"
        );
        self.follows = Some(follows);
        self.followers = followers;
        self.membership = None;
        self.matches = None;
        Ok(())
    }

    /// FollowsFetched | ListFetched | Reconciled -> ListFetched
    pub fn fetch_list(&mut self, membership: MembershipSet) -> Result<(), WorkflowError> {
        self.expect(
            WorkflowAction::FetchList,
            &[
                WorkflowState::FollowsFetched,
                WorkflowState::ListFetched,
                WorkflowState::Reconciled,
            ],
        )?;
        debug!(members = membership.len(), "Workflow: list fetched");
        self.membership = Some(membership);
        self.matches = None;
        Ok(())
    }

    /// ListFetched | Reconciled -> Reconciled
    pub fn compare(&mut self) -> Result<&Matches, WorkflowError> {
        self.expect(
            WorkflowAction::Compare,
            &[WorkflowState::ListFetched, WorkflowState::Reconciled],
        )?;

        let (Some(follows), Some(membership)) = (&self.follows, &self.membership) else {
            return Err(WorkflowError::OutOfOrder {
                action: WorkflowAction::Compare,
                state: self.state(),
            });
        };

        let matches = Matches {
            follows: reconcile(follows, membership),
            followers: self
                .followers
                .as_deref()
                .map(|followers| reconcile(followers, membership)),
        };
        debug!(matches = matches.total(), "Workflow: compared");
        Ok(self.matches.insert(matches))
    }

    /// Any state -> Unauthenticated, dropping all data
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    fn expect(
        &self,
        action: WorkflowAction,
        allowed: &[WorkflowState],
    ) -> Result<(), WorkflowError> {
        let state = self.state();
        if allowed.contains(&state) {
            return Ok(());
        }
        if state == WorkflowState::Unauthenticated {
            return Err(WorkflowError::NotAuthenticated { action });
        }
        Err(WorkflowError::OutOfOrder { action, state })
    }
}
