use crate::error::{Result, SdkError};
use crate::ledger::Ledger;
use crate::transaction;
use crate::types::FulfilledTransaction;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// In-process ledger: append-only list of committed documents.
///
/// Commits are signature-checked like the real service does. Cheap to
/// clone; clones share the same history.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<Vec<Value>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger with raw documents, bypassing validation.
    pub fn with_transactions(docs: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(docs)),
        }
    }

    /// Append a raw document without validation
    pub fn insert_raw(&self, doc: Value) {
        self.inner.write().push(doc);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn send_commit(&self, tx: &FulfilledTransaction) -> Result<String> {
        transaction::verify(tx)?;

        let id = tx.id().to_string();
        let doc = serde_json::to_value(tx)?;

        let mut guard = self.inner.write();
        let existing = guard
            .iter()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()));
        match existing {
            // re-committing the same document is a no-op, as on the key/value store
            Some(stored) if *stored == doc => {
                debug!("{} already committed", id);
                return Ok(format!("id: {}", id));
            }
            Some(_) => {
                return Err(SdkError::InvalidTransaction(format!(
                    "conflicting transaction {}",
                    id
                )));
            }
            None => {}
        }
        guard.push(doc);
        debug!("committed {} ({} transactions)", id, guard.len());

        Ok(format!("id: {}", id))
    }

    async fn retrieve(&self, id: &str) -> Result<Value> {
        self.inner
            .read()
            .iter()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
            .ok_or_else(|| SdkError::NotFound(id.to_string()))
    }

    async fn history(&self) -> Result<Vec<Value>> {
        Ok(self.inner.read().clone())
    }
}
