// Identity module - who is calling
// ed25519 keys, signatures, and the account references derived from them

mod account;
mod keypair;
mod signature;

pub use account::{AccountId, AccountIdError};
pub use keypair::{Keypair, KeypairError, PublicKey};
pub use signature::{Signature, SignatureError};
