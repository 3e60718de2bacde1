// Wallet - the approval/quorum state machine guarding the pooled balance

use crate::identity::AccountId;
use crate::wallet::approvers::{ApproverSet, Quorum};
use crate::wallet::id::{fresh_salt, WalletId};
use crate::wallet::transfer::{Transfer, TransferId, TransferLog};
use crate::wallet::transport::{TransportError, ValueTransport};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that reject a wallet call; none of them leave partial state behind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid wallet configuration: {0}")]
    InvalidConfig(String),

    #[error("Unauthorized: only approver allowed")]
    Unauthorized,

    #[error("Transfer {0} not found")]
    NotFound(TransferId),

    #[error("Transfer {0} has already been sent")]
    AlreadySent(TransferId),

    #[error("Cannot approve transfer {0} twice")]
    DuplicateApproval(TransferId),

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Release failed: {0}")]
    TransportFailed(#[from] TransportError),

    #[error("Wallet balance would overflow")]
    BalanceOverflow,

    #[error("Corrupted wallet state: {0}")]
    Corrupted(String),
}

/// Result of a successful `approve_transfer`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Vote recorded, quorum not reached yet
    Approved { id: TransferId, approvals: usize },
    /// Vote reached quorum and the funds were released
    Released {
        id: TransferId,
        approvals: usize,
        amount: u64,
        to: AccountId,
    },
}

impl ApprovalOutcome {
    pub fn approvals(&self) -> usize {
        match self {
            ApprovalOutcome::Approved { approvals, .. } => *approvals,
            ApprovalOutcome::Released { approvals, .. } => *approvals,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self, ApprovalOutcome::Released { .. })
    }
}

/// Multi-approver custody wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    salt: [u8; 16],
    approvers: ApproverSet,
    quorum: Quorum,
    transfers: TransferLog,
    balance: u64,
}

impl Wallet {
    /// Create an empty wallet. Fails on an empty or duplicated approver list
    /// or a quorum outside `1..=approvers.len()`.
    pub fn new(approvers: Vec<AccountId>, quorum: usize) -> Result<Self, WalletError> {
        Self::with_balance(approvers, quorum, 0)
    }

    /// Create a wallet whose pool starts at `balance`
    pub fn with_balance(
        approvers: Vec<AccountId>,
        quorum: usize,
        balance: u64,
    ) -> Result<Self, WalletError> {
        let approvers = ApproverSet::new(approvers)?;
        let quorum = Quorum::new(quorum, &approvers)?;
        let salt = fresh_salt();

        info!(
            id = %WalletId::derive(approvers.as_slice(), quorum.get(), &salt),
            approvers = approvers.len(),
            quorum = quorum.get(),
            balance,
            "wallet created"
        );

        Ok(Self {
            salt,
            approvers,
            quorum,
            transfers: TransferLog::new(),
            balance,
        })
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Identity that signed calls for this wallet commit to
    pub fn id(&self) -> WalletId {
        WalletId::derive(self.approvers.as_slice(), self.quorum.get(), &self.salt)
    }

    /// Approvers in construction order
    pub fn approvers(&self) -> &[AccountId] {
        self.approvers.as_slice()
    }

    pub fn approver_set(&self) -> &ApproverSet {
        &self.approvers
    }

    pub fn quorum(&self) -> usize {
        self.quorum.get()
    }

    /// Pooled value currently held
    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn is_approver(&self, account: &AccountId) -> bool {
        self.approvers.contains(account)
    }

    /// Every transfer ever created, in creation order
    pub fn transfers(&self) -> &[Transfer] {
        self.transfers.as_slice()
    }

    pub fn transfer(&self, id: TransferId) -> Option<&Transfer> {
        self.transfers.get(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.pending()
    }

    /// Whether `account` already voted on transfer `id`
    pub fn has_approved(&self, id: TransferId, account: &AccountId) -> bool {
        match (self.transfers.get(id), self.approvers.position(account)) {
            (Some(transfer), Some(position)) => transfer.has_vote_from(position),
            _ => false,
        }
    }

    /// Accounts that voted on a transfer, in approver order
    pub fn voters(&self, id: TransferId) -> Vec<AccountId> {
        let Some(transfer) = self.transfers.get(id) else {
            return Vec::new();
        };
        self.approvers
            .iter()
            .enumerate()
            .filter(|(position, _)| transfer.has_vote_from(*position))
            .map(|(_, account)| *account)
            .collect()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Top up the pool. Returns the new balance.
    pub fn deposit(&mut self, amount: u64) -> Result<u64, WalletError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow)?;
        debug!(amount, balance = self.balance, "deposit received");
        Ok(self.balance)
    }

    /// Register a pending transfer. Funds are not checked until release.
    pub fn create_transfer(
        &mut self,
        caller: &AccountId,
        amount: u64,
        to: AccountId,
    ) -> Result<TransferId, WalletError> {
        if !self.approvers.contains(caller) {
            warn!(%caller, "create_transfer rejected: not an approver");
            return Err(WalletError::Unauthorized);
        }

        let id = self.transfers.append(amount, to, self.approvers.len());
        info!(%id, amount, %to, %caller, "transfer created");
        Ok(id)
    }

    /// Cast `caller`'s vote on transfer `id`.
    ///
    /// When the vote brings the transfer to quorum the amount is released
    /// through `transport` in the same call. Nothing is written until every
    /// check and the release itself have succeeded, so a failed release keeps
    /// the vote unrecorded and the transfer pending.
    pub fn approve_transfer<T>(
        &mut self,
        caller: &AccountId,
        id: TransferId,
        transport: &mut T,
    ) -> Result<ApprovalOutcome, WalletError>
    where
        T: ValueTransport + ?Sized,
    {
        let Some(position) = self.approvers.position(caller) else {
            warn!(%caller, %id, "approve_transfer rejected: not an approver");
            return Err(WalletError::Unauthorized);
        };

        let transfer = self
            .transfers
            .get_mut(id)
            .ok_or(WalletError::NotFound(id))?;

        if transfer.is_sent() {
            return Err(WalletError::AlreadySent(id));
        }
        if transfer.has_vote_from(position) {
            return Err(WalletError::DuplicateApproval(id));
        }

        let approvals = transfer.approvals() + 1;

        if !self.quorum.is_reached(approvals) {
            transfer.record_vote(position);
            debug!(%id, %caller, approvals, quorum = self.quorum.get(), "approval recorded");
            return Ok(ApprovalOutcome::Approved { id, approvals });
        }

        let amount = transfer.amount();
        let to = *transfer.to();

        if self.balance < amount {
            warn!(%id, available = self.balance, required = amount, "release blocked: insufficient funds");
            return Err(WalletError::InsufficientFunds {
                available: self.balance,
                required: amount,
            });
        }

        if let Err(e) = transport.send(&to, amount) {
            warn!(%id, %to, amount, error = %e, "release failed, approval not recorded");
            return Err(e.into());
        }

        self.balance -= amount;
        transfer.record_vote(position);
        transfer.mark_sent();

        info!(%id, %to, amount, approvals, balance = self.balance, "transfer released");
        Ok(ApprovalOutcome::Released {
            id,
            approvals,
            amount,
            to,
        })
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Decode and re-check every invariant a live wallet maintains
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let wallet: Wallet =
            postcard::from_bytes(bytes).map_err(|e| WalletError::Corrupted(e.to_string()))?;
        wallet.validate()?;
        Ok(wallet)
    }

    pub(crate) fn validate(&self) -> Result<(), WalletError> {
        let approvers = ApproverSet::new(self.approvers.as_slice().to_vec())?;
        Quorum::new(self.quorum.get(), &approvers)?;

        for (index, transfer) in self.transfers.iter().enumerate() {
            if transfer.id().value() != index as u64 {
                return Err(WalletError::Corrupted(format!(
                    "transfer at index {} has id {}",
                    index,
                    transfer.id()
                )));
            }
            if !transfer.approved_by().fits(approvers.len()) {
                return Err(WalletError::Corrupted(format!(
                    "transfer {} has an approval mask of the wrong width",
                    transfer.id()
                )));
            }
            if transfer.is_sent() != self.quorum.is_reached(transfer.approvals()) {
                return Err(WalletError::Corrupted(format!(
                    "transfer {} sent flag disagrees with its approvals",
                    transfer.id()
                )));
            }
        }
        Ok(())
    }
}
