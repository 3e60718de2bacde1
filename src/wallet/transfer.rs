// Transfers and the append-only transfer log

use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential transfer index, starting at 0 and never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferId(u64);

impl TransferId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl From<u64> for TransferId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which approvers have voted on a transfer, one bit per approver position
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalMask {
    words: Vec<u64>,
}

impl ApprovalMask {
    /// Empty mask wide enough for `approvers` positions
    pub fn with_width(approvers: usize) -> Self {
        Self {
            words: vec![0; approvers.div_ceil(64)],
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.words
            .get(position / 64)
            .map(|word| word & (1u64 << (position % 64)) != 0)
            .unwrap_or(false)
    }

    /// Set the bit for `position`; returns false if it was already set
    pub fn insert(&mut self, position: usize) -> bool {
        let Some(word) = self.words.get_mut(position / 64) else {
            return false;
        };
        let bit = 1u64 << (position % 64);
        if *word & bit != 0 {
            return false;
        }
        *word |= bit;
        true
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when the mask was built for `approvers` positions and has no bits past them
    pub fn fits(&self, approvers: usize) -> bool {
        if self.words.len() != approvers.div_ceil(64) {
            return false;
        }
        (approvers..self.words.len() * 64).all(|p| !self.contains(p))
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.words.len() * 64).filter(|p| self.contains(*p))
    }
}

/// Lifecycle stage of a transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    Created,
    PartiallyApproved,
    Sent,
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Created => "created",
            TransferStatus::PartiallyApproved => "partially-approved",
            TransferStatus::Sent => "sent",
        };
        f.write_str(s)
    }
}

/// A request to move `amount` from the pool to `to`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    id: TransferId,
    amount: u64,
    to: AccountId,
    approved_by: ApprovalMask,
    sent: bool,
}

impl Transfer {
    fn new(id: TransferId, amount: u64, to: AccountId, approvers: usize) -> Self {
        Self {
            id,
            amount,
            to,
            approved_by: ApprovalMask::with_width(approvers),
            sent: false,
        }
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn to(&self) -> &AccountId {
        &self.to
    }

    /// Number of distinct approvers who voted
    pub fn approvals(&self) -> usize {
        self.approved_by.count()
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn approved_by(&self) -> &ApprovalMask {
        &self.approved_by
    }

    pub fn status(&self) -> TransferStatus {
        if self.sent {
            TransferStatus::Sent
        } else if self.approvals() == 0 {
            TransferStatus::Created
        } else {
            TransferStatus::PartiallyApproved
        }
    }

    pub(crate) fn has_vote_from(&self, position: usize) -> bool {
        self.approved_by.contains(position)
    }

    pub(crate) fn record_vote(&mut self, position: usize) -> bool {
        self.approved_by.insert(position)
    }

    pub(crate) fn mark_sent(&mut self) {
        self.sent = true;
    }
}

/// Append-only arena of transfers indexed by id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLog {
    transfers: Vec<Transfer>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh transfer and return its id
    pub fn append(&mut self, amount: u64, to: AccountId, approvers: usize) -> TransferId {
        let id = TransferId(self.transfers.len() as u64);
        self.transfers.push(Transfer::new(id, amount, to, approvers));
        id
    }

    pub fn get(&self, id: TransferId) -> Option<&Transfer> {
        self.transfers.get(id.index()?)
    }

    pub(crate) fn get_mut(&mut self, id: TransferId) -> Option<&mut Transfer> {
        self.transfers.get_mut(id.index()?)
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn as_slice(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    /// Transfers still waiting for quorum
    pub fn pending(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter().filter(|t| !t.sent)
    }
}
