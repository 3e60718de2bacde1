// Ledger - account balances of the hosting environment
//
// Plays the external balance book the wallet lives in:
// - minting genesis balances
// - debiting depositors
// - crediting recipients when a wallet releases a transfer

use crate::identity::AccountId;
use crate::wallet::{TransportError, ValueTransport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance on {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: AccountId,
        available: u64,
        required: u64,
    },

    #[error("Balance of {0} would overflow")]
    Overflow(AccountId),

    #[error("Account {0} is frozen")]
    Frozen(AccountId),
}

/// Balances keyed by account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<AccountId, u64>,
    /// Accounts that refuse incoming value
    frozen: BTreeSet<AccountId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account (0 if never seen)
    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Create value out of nothing, e.g. a faucet or genesis allocation
    pub fn mint(&mut self, account: AccountId, amount: u64) -> Result<u64, LedgerError> {
        let balance = self.credit(account, amount)?;
        debug!(%account, amount, balance, "minted");
        Ok(balance)
    }

    /// Add `amount` to `account`. Frozen accounts and overflow are rejected.
    pub fn credit(&mut self, account: AccountId, amount: u64) -> Result<u64, LedgerError> {
        if self.frozen.contains(&account) {
            return Err(LedgerError::Frozen(account));
        }
        let current = self.balance_of(&account);
        let updated = current
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        self.balances.insert(account, updated);
        Ok(updated)
    }

    /// Remove `amount` from `account`
    pub fn debit(&mut self, account: &AccountId, amount: u64) -> Result<u64, LedgerError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *account,
                available,
                required: amount,
            });
        }
        let updated = available - amount;
        self.balances.insert(*account, updated);
        Ok(updated)
    }

    pub fn freeze(&mut self, account: AccountId) {
        self.frozen.insert(account);
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    pub fn is_frozen(&self, account: &AccountId) -> bool {
        self.frozen.contains(account)
    }

    /// Sum of every account balance
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, u64)> {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }
}

impl ValueTransport for Ledger {
    fn send(&mut self, to: &AccountId, amount: u64) -> Result<(), TransportError> {
        self.credit(*to, amount).map(|_| ()).map_err(|e| match e {
            LedgerError::Overflow(_) => TransportError::Overflow,
            other => TransportError::Rejected(other.to_string()),
        })
    }
}
