// CustodyStore - persistent key-value storage using sled
//
// Provides typed access for storing:
// - Labelled identity keypairs
// - The wallet host snapshot (wallet, ledger, nonces)

use crate::identity::Keypair;
use crate::ledger::HostSnapshot;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const KEYPAIR_PREFIX: &[u8] = b"identity:keypair:";
    pub const HOST_SNAPSHOT: &[u8] = b"host:snapshot";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Persistent store for keys and host state
///
/// Writes are atomic per key and durable after `flush`.
pub struct CustodyStore {
    db: sled::Db,
}

impl CustodyStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    fn keypair_key(label: &str) -> Vec<u8> {
        [keys::KEYPAIR_PREFIX, label.as_bytes()].concat()
    }

    // ========================================================================
    // IDENTITY
    // ========================================================================

    pub fn save_keypair(&self, label: &str, keypair: &Keypair) -> Result<(), StoreError> {
        self.db.insert(Self::keypair_key(label), keypair.to_bytes())?;
        Ok(())
    }

    pub fn load_keypair(&self, label: &str) -> Result<Option<Keypair>, StoreError> {
        match self.db.get(Self::keypair_key(label))? {
            Some(bytes) => {
                let keypair = Keypair::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(keypair))
            }
            None => Ok(None),
        }
    }

    /// Labels of every stored keypair, sorted
    pub fn list_labels(&self) -> Result<Vec<String>, StoreError> {
        let mut labels = Vec::new();
        for result in self.db.scan_prefix(keys::KEYPAIR_PREFIX) {
            let (key, _) = result?;
            let label = &key[keys::KEYPAIR_PREFIX.len()..];
            labels.push(String::from_utf8_lossy(label).into_owned());
        }
        Ok(labels)
    }

    // ========================================================================
    // HOST STATE
    // ========================================================================

    pub fn save_snapshot(&self, snapshot: &HostSnapshot) -> Result<(), StoreError> {
        self.db.insert(keys::HOST_SNAPSHOT, snapshot.to_bytes())?;
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<Option<HostSnapshot>, StoreError> {
        match self.db.get(keys::HOST_SNAPSHOT)? {
            Some(bytes) => {
                let snapshot = HostSnapshot::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }
}
