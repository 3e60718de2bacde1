// Host configuration

use std::path::PathBuf;

/// Settings for a wallet host and the CLI that drives it
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Directory of the sled database
    pub data_dir: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Reject signed calls whose nonce is not above the signer's last accepted one
    pub enforce_nonces: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".custody"),
            log_filter: "info".to_string(),
            enforce_nonces: true,
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn with_nonce_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_nonces = enforce;
        self
    }
}
