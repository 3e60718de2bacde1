use crate::identity::{AccountId, Signature};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32], KeypairError> {
    bytes.try_into().map_err(|_| KeypairError::InvalidLength {
        expected: 32,
        got: bytes.len(),
    })
}

/// Ed25519 public key of an account holder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;
        VerifyingKey::from_bytes(&bytes)
            .map(PublicKey)
            .map_err(|e| serde::de::Error::custom(format!("invalid public key: {}", e)))
    }
}

impl PublicKey {
    /// Raw 32-byte encoding
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Parse a public key from its 32-byte encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes = to_array(bytes)?;
        VerifyingKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|e| KeypairError::InvalidBytes(e.to_string()))
    }

    /// The account reference controlled by this key
    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(self)
    }

    /// Check `signature` over `message`
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify(message, signature.inner()).is_ok()
    }
}

/// Ed25519 signing keypair
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    pub fn account_id(&self) -> AccountId {
        self.public_key().account_id()
    }

    /// Sign an arbitrary message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_inner(self.signing_key.sign(message))
    }

    /// Secret key bytes, used for persistence
    pub fn to_bytes(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }

    /// Restore a keypair from its secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes = to_array(bytes)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("account", &self.account_id())
            .finish_non_exhaustive()
    }
}
