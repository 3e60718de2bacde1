// Ledger module - THE HOSTING ENVIRONMENT
// Account balances, authenticated calls, and the serialized wallet host

mod accounts;
mod call;
mod host;

pub use accounts::{Ledger, LedgerError};
pub use call::{CallError, SignedCall, WalletCall};
pub use host::{CallOutcome, HostError, HostSnapshot, WalletHost};
