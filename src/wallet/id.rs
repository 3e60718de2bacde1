// Wallet identity used to bind signed calls to one wallet

use crate::identity::AccountId;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const WALLET_PREFIX: &str = "wallet:";

/// Random salt mixed into a wallet's id at construction
pub(crate) fn fresh_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// `sha256("wallet:" || approvers || quorum || salt)`
///
/// Two wallets with the same approvers and quorum still get different ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletId([u8; 32]);

impl WalletId {
    pub(crate) fn derive(approvers: &[AccountId], quorum: usize, salt: &[u8; 16]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(WALLET_PREFIX.as_bytes());
        hasher.update((approvers.len() as u64).to_le_bytes());
        for approver in approvers {
            hasher.update(approver.as_bytes());
        }
        hasher.update((quorum as u64).to_le_bytes());
        hasher.update(salt);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", WALLET_PREFIX, bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", self)
    }
}
