pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod literal;
pub mod path;
pub mod record;
pub mod service;
pub mod update;
pub mod wire;
pub mod workflow;

pub use config::{GatewayConfig, LedgerMode};
pub use error::{GatewayError, Result};
pub use filter::FilterCriteria;
pub use record::{ExternalRecord, LedgerTransaction};
pub use service::Gateway;
pub use update::UpdateRequest;
pub use workflow::PrepareRequest;

use resdb_sdk::{Ledger, MemoryLedger, ResdbClient, SdkError};
use std::sync::Arc;
use tracing::info;

/// Construct the ledger the configuration asks for
pub fn build_ledger(config: &GatewayConfig) -> std::result::Result<Arc<dyn Ledger>, SdkError> {
    match config.ledger_mode {
        LedgerMode::Http => {
            let client = ResdbClient::with_timeout(&config.resdb_url, config.http_timeout)?;
            info!("using ResilientDB at {}", client.base_url());
            Ok(Arc::new(client))
        }
        LedgerMode::Memory => {
            info!("using in-memory ledger");
            Ok(Arc::new(MemoryLedger::new()))
        }
    }
}
