// Storage module - PERSISTENCE
// Keys and host snapshots in sled

mod store;

pub use store::{CustodyStore, StoreError};
