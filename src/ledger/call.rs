// Wallet calls and their signed envelope
//
// The host establishes the caller of a mutating call from the ed25519 key
// that signed it, never from a field the caller fills in. The signature also
// commits to the target wallet's id, so a call only verifies on that wallet.

use crate::identity::{AccountId, Keypair, PublicKey, Signature};
use crate::wallet::{TransferId, WalletId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CALL_DOMAIN: &[u8] = b"custody:call:v2";

#[derive(Error, Debug)]
pub enum CallError {
    #[error("Failed to decode call: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

/// A state-changing wallet operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletCall {
    CreateTransfer { amount: u64, to: AccountId },
    ApproveTransfer { id: TransferId },
    Deposit { amount: u64 },
}

impl WalletCall {
    fn write_signing_bytes(&self, bytes: &mut Vec<u8>) {
        match self {
            WalletCall::CreateTransfer { amount, to } => {
                bytes.push(0);
                bytes.extend_from_slice(&amount.to_le_bytes());
                bytes.extend_from_slice(to.as_bytes());
            }
            WalletCall::ApproveTransfer { id } => {
                bytes.push(1);
                bytes.extend_from_slice(&id.value().to_le_bytes());
            }
            WalletCall::Deposit { amount } => {
                bytes.push(2);
                bytes.extend_from_slice(&amount.to_le_bytes());
            }
        }
    }
}

/// A call signed by the account that makes it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    call: WalletCall,
    signer: PublicKey,
    nonce: u64,
    signature: Signature,
}

impl SignedCall {
    /// Sign `call` for `wallet` with `keypair`. `nonce` must grow with every
    /// call from the same key.
    pub fn sign(keypair: &Keypair, wallet: &WalletId, call: WalletCall, nonce: u64) -> Self {
        let signer = keypair.public_key();
        let bytes = Self::signing_bytes(wallet, &call, &signer, nonce);
        let signature = keypair.sign(&bytes);
        Self {
            call,
            signer,
            nonce,
            signature,
        }
    }

    /// Deterministic encoding covered by the signature
    fn signing_bytes(
        wallet: &WalletId,
        call: &WalletCall,
        signer: &PublicKey,
        nonce: u64,
    ) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(CALL_DOMAIN.len() + 32 + 32 + 8 + 41);
        bytes.extend_from_slice(CALL_DOMAIN);
        bytes.extend_from_slice(wallet.as_bytes());
        bytes.extend_from_slice(signer.as_bytes());
        bytes.extend_from_slice(&nonce.to_le_bytes());
        call.write_signing_bytes(&mut bytes);
        bytes
    }

    /// True when the signature covers this call on `wallet`
    pub fn verify(&self, wallet: &WalletId) -> bool {
        let bytes = Self::signing_bytes(wallet, &self.call, &self.signer, self.nonce);
        self.signer.verify(&bytes, &self.signature)
    }

    /// Account the call acts as
    pub fn caller(&self) -> AccountId {
        self.signer.account_id()
    }

    pub fn call(&self) -> &WalletCall {
        &self.call
    }

    pub fn signer(&self) -> &PublicKey {
        &self.signer
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn encode(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CallError> {
        postcard::from_bytes(bytes).map_err(|e| CallError::DecodeError(e.to_string()))
    }

    pub fn encode_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn decode_hex(s: &str) -> Result<Self, CallError> {
        let bytes = hex::decode(s.trim()).map_err(|e| CallError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }
}
