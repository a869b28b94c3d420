//! Query and mutation surface, independent of transport.

use crate::error::Result;
use crate::filter::{self, FilterCriteria};
use crate::record::{self, ExternalRecord, LedgerTransaction};
use crate::update::{self, UpdateRequest};
use crate::workflow::{self, PrepareRequest, TransactionRequest};
use resdb_sdk::{KeyPair, Ledger};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Result of `post_transaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keys {
    pub public_key: String,
    pub private_key: String,
}

impl From<KeyPair> for Keys {
    fn from(pair: KeyPair) -> Self {
        Keys {
            public_key: pair.public_key,
            private_key: pair.private_key,
        }
    }
}

/// Entry point for every API operation. Holds no per-request state.
#[derive(Clone)]
pub struct Gateway {
    ledger: Arc<dyn Ledger>,
}

impl Gateway {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    async fn fetch_one(&self, id: &str) -> Result<ExternalRecord> {
        let raw = self.ledger.retrieve(id).await?;
        record::map(&LedgerTransaction(raw))
    }

    /// getTransaction
    pub async fn get_transaction(&self, id: &str) -> Result<ExternalRecord> {
        self.fetch_one(id).await
    }

    /// fetchElectionById
    pub async fn fetch_election_by_id(&self, id: &str) -> Result<ExternalRecord> {
        self.fetch_one(id).await
    }

    /// getFilteredTransactions
    ///
    /// Reads the whole ledger history on every call.
    pub async fn get_filtered_transactions(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<ExternalRecord>> {
        let history = self.ledger.history().await?;
        let total = history.len();
        let records = filter::by_keys(history, criteria)?;
        info!("filtered {} of {} transactions", records.len(), total);
        Ok(records)
    }

    /// getSpecificDataStructure
    ///
    /// Searches the full history. `_criteria` is accepted for API
    /// compatibility and does not narrow the search.
    pub async fn get_specific_data_structure(
        &self,
        _criteria: &FilterCriteria,
        required_keys: &[String],
    ) -> Result<Vec<ExternalRecord>> {
        let records = self.get_filtered_transactions(&FilterCriteria::default()).await?;
        filter::with_required_keys(records, required_keys)
    }

    /// getTransactionsByElectionId
    ///
    /// Searches the full history, like `get_specific_data_structure`.
    pub async fn get_transactions_by_election_id(
        &self,
        _criteria: &FilterCriteria,
        election_id: &str,
    ) -> Result<Vec<ExternalRecord>> {
        let records = self.get_filtered_transactions(&FilterCriteria::default()).await?;
        filter::by_election_id(records, election_id)
    }

    /// postTransaction
    pub async fn post_transaction(&self, request: PrepareRequest) -> Result<CommitReceipt> {
        let request = TransactionRequest::try_from(request)?;
        let committed = workflow::submit(self.ledger(), &request).await?;
        Ok(CommitReceipt {
            id: committed.into_id(),
        })
    }

    /// updateTransaction
    pub async fn update_transaction(&self, changes: UpdateRequest) -> Result<ExternalRecord> {
        let prior = LedgerTransaction(self.ledger.retrieve(&changes.id).await?);
        let prior_id = changes.id.clone();
        let request = update::resolve(&prior, changes)?;
        let record = workflow::submit_and_confirm(self.ledger(), &request).await?;
        info!("updated {} -> {}", prior_id, record.id);
        Ok(record)
    }

    /// updateMultipleTransaction
    ///
    /// Applied in order; the first failure stops the batch and is returned.
    /// Updates committed before the failure stay on the ledger.
    pub async fn update_multiple_transactions(
        &self,
        batch: Vec<UpdateRequest>,
    ) -> Result<Vec<ExternalRecord>> {
        let total = batch.len();
        let mut out = Vec::with_capacity(total);
        for changes in batch {
            let id = changes.id.clone();
            match self.update_transaction(changes).await {
                Ok(record) => out.push(record),
                Err(e) => {
                    error!(
                        "batch update stopped at {} ({} of {} already committed): {}",
                        id,
                        out.len(),
                        total,
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    /// generateKeys
    pub fn generate_keys(&self) -> Keys {
        resdb_sdk::generate_keypair().into()
    }
}
