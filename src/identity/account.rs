use crate::identity::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ACCOUNT_PREFIX: &str = "acct:";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid account format: {0}")]
    InvalidFormat(String),

    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid account length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Account reference: `acct:<base58 of 32 bytes>`
///
/// Approvers, recipients and ledger holders are all identified this way.
/// Accounts backed by a key use `sha256("account:" || public key)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"account:");
        hasher.update(public_key.as_bytes());
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

    pub fn parse(s: &str) -> Result<Self, AccountIdError> {
        let encoded = s.strip_prefix(ACCOUNT_PREFIX).ok_or_else(|| {
            AccountIdError::InvalidFormat(format!("expected '{}' prefix", ACCOUNT_PREFIX))
        })?;
        if encoded.is_empty() {
            return Err(AccountIdError::InvalidFormat("empty key part".into()));
        }

        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| AccountIdError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AccountIdError::InvalidLength(bytes.len()))?;

        Ok(Self(bytes))
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ACCOUNT_PREFIX, bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}
