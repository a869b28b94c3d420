use crate::error::Result;
use crate::transaction;
use crate::types::{FulfilledTransaction, PrepareParams, PreparedTransaction};
use async_trait::async_trait;
use serde_json::Value;

/// Operations a ResilientDB-style ledger offers to its clients.
///
/// `prepare` and `fulfill` run locally by default; `send_commit`,
/// `retrieve` and `history` talk to the ledger. Raw transactions come back
/// as untyped JSON because documents on the ledger are not guaranteed to
/// be complete.
#[async_trait]
pub trait Ledger: Send + Sync {
    fn prepare(&self, params: PrepareParams) -> Result<PreparedTransaction> {
        transaction::prepare(params)
    }

    fn fulfill(
        &self,
        prepared: &PreparedTransaction,
        private_key: &str,
    ) -> Result<FulfilledTransaction> {
        transaction::fulfill(prepared, private_key)
    }

    /// Submit a signed transaction. Returns the ledger's raw receipt
    /// (`"id: <txid>"`).
    async fn send_commit(&self, tx: &FulfilledTransaction) -> Result<String>;

    /// Fetch one committed transaction by id.
    async fn retrieve(&self, id: &str) -> Result<Value>;

    /// Fetch the complete transaction history in ledger order.
    ///
    /// There is no pagination: cost grows linearly with the ledger.
    async fn history(&self) -> Result<Vec<Value>>;
}
