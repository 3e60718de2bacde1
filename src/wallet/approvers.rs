// Approver set and quorum threshold, both fixed at wallet construction

use crate::identity::AccountId;
use crate::wallet::WalletError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, duplicate-free, non-empty list of approvers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverSet {
    approvers: Vec<AccountId>,
}

impl ApproverSet {
    /// Validate and build an approver set
    pub fn new(approvers: Vec<AccountId>) -> Result<Self, WalletError> {
        if approvers.is_empty() {
            return Err(WalletError::InvalidConfig(
                "approver list cannot be empty".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(approvers.len());
        for approver in &approvers {
            if !seen.insert(approver) {
                return Err(WalletError::InvalidConfig(format!(
                    "duplicate approver {}",
                    approver
                )));
            }
        }

        Ok(Self { approvers })
    }

    pub fn as_slice(&self) -> &[AccountId] {
        &self.approvers
    }

    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.position(account).is_some()
    }

    /// Index of `account` in construction order; this is its bit in an [`ApprovalMask`]
    ///
    /// [`ApprovalMask`]: crate::wallet::ApprovalMask
    pub fn position(&self, account: &AccountId) -> Option<usize> {
        self.approvers.iter().position(|a| a == account)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.approvers.iter()
    }
}

/// Minimum number of distinct approvals that releases a transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quorum(usize);

impl Quorum {
    /// A quorum must lie in `1..=approvers.len()`
    pub fn new(threshold: usize, approvers: &ApproverSet) -> Result<Self, WalletError> {
        if threshold == 0 || threshold > approvers.len() {
            return Err(WalletError::InvalidConfig(format!(
                "quorum {} outside 1..={}",
                threshold,
                approvers.len()
            )));
        }
        Ok(Self(threshold))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn is_reached(&self, approvals: usize) -> bool {
        approvals >= self.0
    }
}
