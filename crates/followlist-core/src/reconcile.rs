//! Follow/list reconciliation

use crate::account::{AccountSummary, MembershipSet};

/// Keep the subjects whose DID is on the list.
///
/// Single pass over `subjects`; the relative order of retained items is the
/// order they had in `subjects`. Duplicates in `subjects` are evaluated
/// independently and all matching copies are kept.
pub fn reconcile(subjects: &[AccountSummary], membership: &MembershipSet) -> Vec<AccountSummary> {
    if membership.is_empty() {
        return Vec::new();
    }

    subjects
        .iter()
        .filter(|account| membership.contains(&account.did))
        .cloned()
        .collect()
}
