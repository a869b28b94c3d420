//! Write protocol against the ledger.
//!
//! Each stage is its own type, so the only way to reach a confirmed
//! record is `prepare -> fulfill -> commit -> confirm`. Nothing is retried;
//! the first failing stage aborts the whole chain.

use crate::error::{GatewayError, Result};
use crate::literal;
use crate::record::{self, ExternalRecord, LedgerTransaction};
use resdb_sdk::{FulfilledTransaction, Ledger, PrepareParams, PreparedTransaction, Recipient};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Receipt prefix the ledger puts in front of a committed id
pub const COMMIT_MARKER: &str = "id: ";

/// Fully resolved input of the write protocol
#[derive(Clone, PartialEq)]
pub struct TransactionRequest {
    pub operation: String,
    pub amount: u64,
    pub recipient_public_key: String,
    pub asset: Value,
    pub signer_public_key: String,
    pub signer_private_key: String,
}

impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("operation", &self.operation)
            .field("amount", &self.amount)
            .field("recipient_public_key", &self.recipient_public_key)
            .field("asset", &self.asset)
            .field("signer_public_key", &self.signer_public_key)
            .finish_non_exhaustive()
    }
}

impl TransactionRequest {
    pub fn prepare_params(&self) -> PrepareParams {
        PrepareParams {
            operation: self.operation.clone(),
            signer: self.signer_public_key.clone(),
            recipients: vec![Recipient {
                public_key: self.recipient_public_key.clone(),
                amount: self.amount,
            }],
            asset: self.asset.clone(),
            metadata: None,
        }
    }
}

/// Body of a create request (`postTransaction`)
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub operation: String,
    pub amount: u64,
    pub signer_public_key: String,
    pub signer_private_key: String,
    pub recipient_public_key: String,
    /// Asset in literal notation or JSON
    pub asset: String,
}

impl fmt::Debug for PrepareRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareRequest")
            .field("operation", &self.operation)
            .field("amount", &self.amount)
            .field("signer_public_key", &self.signer_public_key)
            .field("recipient_public_key", &self.recipient_public_key)
            .field("asset", &self.asset)
            .finish_non_exhaustive()
    }
}

impl TryFrom<PrepareRequest> for TransactionRequest {
    type Error = GatewayError;

    fn try_from(req: PrepareRequest) -> Result<Self> {
        let asset = literal::parse(&req.asset)
            .map_err(|e| GatewayError::InvalidAssetPayload(e.to_string()))?;
        Ok(TransactionRequest {
            operation: req.operation,
            amount: req.amount,
            recipient_public_key: req.recipient_public_key,
            asset,
            signer_public_key: req.signer_public_key,
            signer_private_key: req.signer_private_key,
        })
    }
}

pub struct Prepared<'l> {
    ledger: &'l dyn Ledger,
    tx: PreparedTransaction,
}

pub struct Fulfilled<'l> {
    ledger: &'l dyn Ledger,
    tx: FulfilledTransaction,
}

pub struct Committed<'l> {
    ledger: &'l dyn Ledger,
    id: String,
}

/// Build the unsigned transaction.
pub fn prepare<'l>(ledger: &'l dyn Ledger, request: &TransactionRequest) -> Result<Prepared<'l>> {
    let tx = ledger.prepare(request.prepare_params())?;
    debug!(operation = %request.operation, "prepared transaction");
    Ok(Prepared { ledger, tx })
}

impl<'l> Prepared<'l> {
    pub fn transaction(&self) -> &PreparedTransaction {
        &self.tx
    }

    /// Sign with the owner's private key.
    pub fn fulfill(self, private_key: &str) -> Result<Fulfilled<'l>> {
        let tx = self
            .ledger
            .fulfill(&self.tx, private_key)
            .map_err(|e| GatewayError::FulfillmentError(e.to_string()))?;
        debug!("fulfilled transaction {}", tx.id());
        Ok(Fulfilled {
            ledger: self.ledger,
            tx,
        })
    }
}

impl<'l> Fulfilled<'l> {
    pub fn transaction(&self) -> &FulfilledTransaction {
        &self.tx
    }

    /// Submit to the ledger and keep the canonical id from its receipt.
    pub async fn commit(self) -> Result<Committed<'l>> {
        let receipt = self.ledger.send_commit(&self.tx).await?;
        let id = commit_id(&receipt)?;
        info!("committed transaction {}", id);
        Ok(Committed {
            ledger: self.ledger,
            id,
        })
    }
}

impl<'l> Committed<'l> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn into_id(self) -> String {
        self.id
    }

    /// Read the committed transaction back so the result mirrors ledger state.
    pub async fn confirm(self) -> Result<ExternalRecord> {
        let raw = self.ledger.retrieve(&self.id).await?;
        record::map(&LedgerTransaction(raw))
    }
}

/// Strip the receipt marker, leaving the transaction id
pub fn commit_id(receipt: &str) -> Result<String> {
    receipt
        .trim()
        .strip_prefix(COMMIT_MARKER)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::LedgerUnavailable(format!("unexpected commit receipt '{}'", receipt))
        })
}

/// prepare -> fulfill -> commit
pub async fn submit<'l>(ledger: &'l dyn Ledger, request: &TransactionRequest) -> Result<Committed<'l>> {
    prepare(ledger, request)?
        .fulfill(&request.signer_private_key)?
        .commit()
        .await
}

/// prepare -> fulfill -> commit -> confirm
pub async fn submit_and_confirm(
    ledger: &dyn Ledger,
    request: &TransactionRequest,
) -> Result<ExternalRecord> {
    submit(ledger, request).await?.confirm().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use resdb_sdk::{generate_keypair, KeyPair, MemoryLedger};
    use serde_json::json;

    fn request(signer: &KeyPair, recipient: &KeyPair) -> TransactionRequest {
        TransactionRequest {
            operation: "CREATE".into(),
            amount: 5,
            recipient_public_key: recipient.public_key.clone(),
            asset: json!({"data": {}}),
            signer_public_key: signer.public_key.clone(),
            signer_private_key: signer.private_key.clone(),
        }
    }

    #[test]
    fn commit_id_strips_marker() {
        assert_eq!(commit_id("id: abc123").unwrap(), "abc123");
        assert_eq!(commit_id(" id: abc123\n").unwrap(), "abc123");
        assert!(matches!(
            commit_id("abc123"),
            Err(GatewayError::LedgerUnavailable(_))
        ));
        assert!(commit_id("id: ").is_err());
    }

    #[test]
    fn prepare_request_parses_literal_asset() {
        let req: PrepareRequest = serde_json::from_value(json!({
            "operation": "CREATE",
            "amount": 5,
            "signerPublicKey": "PK1",
            "signerPrivateKey": "SK1",
            "recipientPublicKey": "PK2",
            "asset": "{'data':{}}"
        }))
        .unwrap();
        let resolved = TransactionRequest::try_from(req).unwrap();
        assert_eq!(resolved.asset, json!({"data": {}}));
        assert!(!format!("{:?}", resolved).contains("SK1"));
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let ledger = MemoryLedger::new();
        let alice = generate_keypair();
        let bob = generate_keypair();
        let req = request(&alice, &bob);

        let prepared = prepare(&ledger, &req).unwrap();
        assert_eq!(prepared.transaction().0.id, None);
        let fulfilled = prepared.fulfill(&alice.private_key).unwrap();
        let expected_id = fulfilled.transaction().id().to_string();
        let committed = fulfilled.commit().await.unwrap();
        assert_eq!(committed.id(), expected_id);

        let record = committed.confirm().await.unwrap();
        assert_eq!(record.id, expected_id);
        assert_eq!(record.amount, 5);
        assert_eq!(record.public_key, bob.public_key);
    }

    #[tokio::test]
    async fn wrong_private_key_is_fulfillment_error() {
        let ledger = MemoryLedger::new();
        let alice = generate_keypair();
        let mut req = request(&alice, &alice);
        req.signer_private_key = generate_keypair().private_key;

        let err = submit(&ledger, &req).await.err().unwrap();
        assert!(matches!(err, GatewayError::FulfillmentError(_)));
        assert!(ledger.is_empty());

        req.signer_private_key = "not-a-key".into();
        let err = submit(&ledger, &req).await.err().unwrap();
        assert!(matches!(err, GatewayError::FulfillmentError(_)));
    }
}
