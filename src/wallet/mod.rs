// Wallet module - THE CORE
// Approver set, quorum, transfer log, and the approval/release state machine

mod approvers;
mod id;
mod transfer;
mod transport;
mod state;

pub use approvers::{ApproverSet, Quorum};
pub use id::WalletId;
pub use transfer::{ApprovalMask, Transfer, TransferId, TransferLog, TransferStatus};
pub use transport::{TransportError, ValueTransport};
pub use state::{ApprovalOutcome, Wallet, WalletError};
