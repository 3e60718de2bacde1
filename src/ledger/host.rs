// WalletHost - runs one wallet for concurrent callers
//
// All mutating calls take the wallet lock first and hold it across the full
// check-mutate-release sequence, then the ledger lock. That lock order is
// the same everywhere, so calls on one wallet form a strict total order.

use crate::config::HostConfig;
use crate::identity::AccountId;
use crate::ledger::accounts::{Ledger, LedgerError};
use crate::ledger::call::{SignedCall, WalletCall};
use crate::wallet::{ApprovalOutcome, Transfer, TransferId, Wallet, WalletError, WalletId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid signature on call")]
    InvalidSignature,

    #[error("Stale nonce for {account}: last accepted {last}, got {got}")]
    StaleNonce {
        account: AccountId,
        last: u64,
        got: u64,
    },

    #[error("Nonce {got} for {account} is out of range; nonces must stay below u64::MAX")]
    NonceOutOfRange { account: AccountId, got: u64 },

    #[error("Host lock poisoned")]
    LockPoisoned,

    #[error("Snapshot decode failed: {0}")]
    SnapshotCorrupted(String),
}

/// What a dispatched call produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    Created(TransferId),
    Approved(ApprovalOutcome),
    Deposited { balance: u64 },
}

/// State guarded by the per-wallet lock
#[derive(Debug)]
struct HostInner {
    wallet: Wallet,
    /// Last accepted nonce per signing account
    nonces: BTreeMap<AccountId, u64>,
}

/// Everything a host needs to resume after a restart
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub wallet: Wallet,
    pub ledger: Ledger,
    pub nonces: BTreeMap<AccountId, u64>,
}

impl HostSnapshot {
    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HostError> {
        let snapshot: HostSnapshot = postcard::from_bytes(bytes)
            .map_err(|e| HostError::SnapshotCorrupted(e.to_string()))?;
        snapshot.wallet.validate()?;
        Ok(snapshot)
    }

    /// Swap in a new wallet and keep the ledger balances
    ///
    /// Nonces start over: calls signed for the old wallet do not verify
    /// against the new wallet's id.
    pub fn replace_wallet(self, wallet: Wallet) -> Self {
        Self {
            wallet,
            ledger: self.ledger,
            nonces: BTreeMap::new(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, HostError> {
    mutex.lock().map_err(|_| HostError::LockPoisoned)
}

/// A wallet plus the ledger it settles against
pub struct WalletHost {
    inner: Mutex<HostInner>,
    ledger: Arc<Mutex<Ledger>>,
    config: HostConfig,
}

impl WalletHost {
    pub fn new(wallet: Wallet, ledger: Arc<Mutex<Ledger>>, config: HostConfig) -> Self {
        Self {
            inner: Mutex::new(HostInner {
                wallet,
                nonces: BTreeMap::new(),
            }),
            ledger,
            config,
        }
    }

    /// Rebuild a host from a snapshot, with its own ledger
    pub fn from_snapshot(snapshot: HostSnapshot, config: HostConfig) -> Self {
        Self {
            inner: Mutex::new(HostInner {
                wallet: snapshot.wallet,
                nonces: snapshot.nonces,
            }),
            ledger: Arc::new(Mutex::new(snapshot.ledger)),
            config,
        }
    }

    pub fn snapshot(&self) -> Result<HostSnapshot, HostError> {
        let inner = lock(&self.inner)?;
        let ledger = lock(&self.ledger)?;
        Ok(HostSnapshot {
            wallet: inner.wallet.clone(),
            ledger: ledger.clone(),
            nonces: inner.nonces.clone(),
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Run `f` against a consistent view of the wallet
    pub fn with_wallet<R>(&self, f: impl FnOnce(&Wallet) -> R) -> Result<R, HostError> {
        let inner = lock(&self.inner)?;
        Ok(f(&inner.wallet))
    }

    pub fn wallet_id(&self) -> Result<WalletId, HostError> {
        self.with_wallet(|w| w.id())
    }

    pub fn approvers(&self) -> Result<Vec<AccountId>, HostError> {
        self.with_wallet(|w| w.approvers().to_vec())
    }

    pub fn quorum(&self) -> Result<usize, HostError> {
        self.with_wallet(|w| w.quorum())
    }

    pub fn transfers(&self) -> Result<Vec<Transfer>, HostError> {
        self.with_wallet(|w| w.transfers().to_vec())
    }

    pub fn wallet_balance(&self) -> Result<u64, HostError> {
        self.with_wallet(|w| w.balance())
    }

    pub fn balance_of(&self, account: &AccountId) -> Result<u64, HostError> {
        Ok(lock(&self.ledger)?.balance_of(account))
    }

    /// Nonce the next signed call from `account` should carry
    ///
    /// Nonces must stay below `u64::MAX`; once the last accepted nonce is
    /// `u64::MAX - 1` the account has no nonce left on this wallet.
    pub fn next_nonce(&self, account: &AccountId) -> Result<u64, HostError> {
        let inner = lock(&self.inner)?;
        Ok(inner.nonces.get(account).map_or(1, |n| n.saturating_add(1)))
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub fn create_transfer(
        &self,
        caller: &AccountId,
        amount: u64,
        to: AccountId,
    ) -> Result<TransferId, HostError> {
        let mut inner = lock(&self.inner)?;
        Ok(inner.wallet.create_transfer(caller, amount, to)?)
    }

    pub fn approve_transfer(
        &self,
        caller: &AccountId,
        id: TransferId,
    ) -> Result<ApprovalOutcome, HostError> {
        let mut inner = lock(&self.inner)?;
        let mut ledger = lock(&self.ledger)?;
        Ok(inner.wallet.approve_transfer(caller, id, &mut *ledger)?)
    }

    /// Move `amount` from the ledger account `from` into the wallet pool
    pub fn deposit(&self, from: &AccountId, amount: u64) -> Result<u64, HostError> {
        let mut inner = lock(&self.inner)?;
        let mut ledger = lock(&self.ledger)?;
        Self::deposit_locked(&mut inner.wallet, &mut ledger, from, amount)
    }

    fn deposit_locked(
        wallet: &mut Wallet,
        ledger: &mut Ledger,
        from: &AccountId,
        amount: u64,
    ) -> Result<u64, HostError> {
        // Pool overflow must be known before the ledger is touched
        if wallet.balance().checked_add(amount).is_none() {
            return Err(WalletError::BalanceOverflow.into());
        }
        ledger.debit(from, amount)?;
        let balance = wallet.deposit(amount)?;
        info!(%from, amount, balance, "deposit into wallet");
        Ok(balance)
    }

    /// Authenticate and run a signed call
    ///
    /// The caller is the account of the signing key. The signature must cover
    /// this wallet's id. The nonce is consumed only if the call succeeds, so a
    /// rejected call can be retried as is.
    pub fn submit(&self, signed: &SignedCall) -> Result<CallOutcome, HostError> {
        let mut inner = lock(&self.inner)?;

        if !signed.verify(&inner.wallet.id()) {
            warn!(signer = %signed.caller(), "signed call rejected: bad signature");
            return Err(HostError::InvalidSignature);
        }
        let caller = signed.caller();

        if signed.nonce() == u64::MAX {
            warn!(%caller, "signed call rejected: nonce out of range");
            return Err(HostError::NonceOutOfRange {
                account: caller,
                got: signed.nonce(),
            });
        }

        if self.config.enforce_nonces {
            if let Some(&last) = inner.nonces.get(&caller) {
                if signed.nonce() <= last {
                    warn!(%caller, last, got = signed.nonce(), "signed call rejected: stale nonce");
                    return Err(HostError::StaleNonce {
                        account: caller,
                        last,
                        got: signed.nonce(),
                    });
                }
            }
        }

        let outcome = match signed.call() {
            WalletCall::CreateTransfer { amount, to } => {
                CallOutcome::Created(inner.wallet.create_transfer(&caller, *amount, *to)?)
            }
            WalletCall::ApproveTransfer { id } => {
                let mut ledger = lock(&self.ledger)?;
                CallOutcome::Approved(inner.wallet.approve_transfer(&caller, *id, &mut *ledger)?)
            }
            WalletCall::Deposit { amount } => {
                let mut ledger = lock(&self.ledger)?;
                let balance = Self::deposit_locked(&mut inner.wallet, &mut ledger, &caller, *amount)?;
                CallOutcome::Deposited { balance }
            }
        };

        inner.nonces.insert(caller, signed.nonce());
        Ok(outcome)
    }
}
