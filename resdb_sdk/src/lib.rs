pub mod client;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod memory;
pub mod transaction;
pub mod types;

pub use client::ResdbClient;
pub use error::{Result, SdkError};
pub use keys::generate_keypair;
pub use ledger::Ledger;
pub use memory::MemoryLedger;
pub use types::*;

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::ResdbClient;
    pub use crate::error::{Result, SdkError};
    pub use crate::keys::generate_keypair;
    pub use crate::ledger::Ledger;
    pub use crate::memory::MemoryLedger;
    pub use crate::types::*;
}
