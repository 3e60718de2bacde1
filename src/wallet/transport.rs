// Value transport - how released funds leave the pool

use crate::identity::AccountId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Recipient rejected the transfer: {0}")]
    Rejected(String),

    #[error("Recipient balance would overflow")]
    Overflow,

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of the wallet to a recipient account.
///
/// Must be all-or-nothing: on `Ok` the value has arrived, on `Err` nothing
/// moved. The wallet commits its own state only after `send` returns `Ok`.
pub trait ValueTransport {
    fn send(&mut self, to: &AccountId, amount: u64) -> Result<(), TransportError>;
}

impl<T: ValueTransport + ?Sized> ValueTransport for &mut T {
    fn send(&mut self, to: &AccountId, amount: u64) -> Result<(), TransportError> {
        (**self).send(to, amount)
    }
}

impl<T: ValueTransport + ?Sized> ValueTransport for Box<T> {
    fn send(&mut self, to: &AccountId, amount: u64) -> Result<(), TransportError> {
        (**self).send(to, amount)
    }
}
