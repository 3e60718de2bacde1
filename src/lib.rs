//! Multi-approver custody wallet.
//!
//! A pooled balance that releases a transfer only once a quorum of
//! designated approvers has voted for it. [`wallet::Wallet`] is the state
//! machine; [`ledger::WalletHost`] runs it for concurrent, signed callers
//! against an in-process [`ledger::Ledger`].

pub mod config;
pub mod identity;
pub mod ledger;
pub mod storage;
pub mod wallet;

pub use config::HostConfig;
pub use identity::{AccountId, Keypair};
pub use ledger::{Ledger, WalletHost};
pub use wallet::{ApprovalOutcome, Transfer, TransferId, Wallet, WalletError, WalletId};
