//! Partial updates: fill every unset field from the latest committed version.

use crate::error::{GatewayError, Result};
use crate::literal;
use crate::record::LedgerTransaction;
use crate::wire::{amount_or_blank, blank_as_none};
use crate::workflow::TransactionRequest;
use serde::Deserialize;

/// Change-set for one record. `None` keeps the prior value.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub id: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub operation: Option<String>,
    #[serde(default, deserialize_with = "amount_or_blank")]
    pub amount: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub recipient_public_key: Option<String>,
    /// Asset in literal notation or JSON
    #[serde(default, deserialize_with = "blank_as_none")]
    pub asset: Option<String>,
    pub signer_public_key: String,
    pub signer_private_key: String,
}

impl std::fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("amount", &self.amount)
            .field("recipient_public_key", &self.recipient_public_key)
            .field("asset", &self.asset)
            .field("signer_public_key", &self.signer_public_key)
            .finish_non_exhaustive()
    }
}

/// Resolve `changes` against `prior` into a complete transaction request.
///
/// Signer keys always come from the request.
pub fn resolve(prior: &LedgerTransaction, changes: UpdateRequest) -> Result<TransactionRequest> {
    let operation = match changes.operation {
        Some(op) => op,
        None => prior.operation()?.to_string(),
    };

    let recipient_public_key = match changes.recipient_public_key {
        Some(pk) => pk,
        None => prior
            .recipient()
            .ok_or_else(|| {
                GatewayError::malformed(
                    prior.label(),
                    "missing outputs.0.condition.details.public_key",
                )
            })?
            .to_string(),
    };

    let amount = match changes.amount {
        Some(amount) => amount,
        None => prior.amount()?,
    };

    let asset = match changes.asset {
        Some(text) => {
            literal::parse(&text).map_err(|e| GatewayError::InvalidAssetPayload(e.to_string()))?
        }
        None => prior.asset().clone(),
    };

    Ok(TransactionRequest {
        operation,
        amount,
        recipient_public_key,
        asset,
        signer_public_key: changes.signer_public_key,
        signer_private_key: changes.signer_private_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample;
    use serde_json::json;

    fn prior() -> LedgerTransaction {
        LedgerTransaction(sample(
            "t1",
            "PK1",
            "PK2",
            json!({"data": {"currentElectionId": "E1"}}),
        ))
    }

    fn unset() -> UpdateRequest {
        UpdateRequest {
            id: "t1".into(),
            operation: None,
            amount: None,
            recipient_public_key: None,
            asset: None,
            signer_public_key: "PK1".into(),
            signer_private_key: "SK1".into(),
        }
    }

    #[test]
    fn all_unset_is_a_no_op() {
        let resolved = resolve(&prior(), unset()).unwrap();
        assert_eq!(
            resolved,
            TransactionRequest {
                operation: "CREATE".into(),
                amount: 5,
                recipient_public_key: "PK2".into(),
                asset: json!({"data": {"currentElectionId": "E1"}}),
                signer_public_key: "PK1".into(),
                signer_private_key: "SK1".into(),
            }
        );
    }

    #[test]
    fn only_amount_changes() {
        let mut changes = unset();
        changes.amount = Some(10);
        let resolved = resolve(&prior(), changes).unwrap();
        assert_eq!(resolved.amount, 10);
        assert_eq!(resolved.operation, "CREATE");
        assert_eq!(resolved.recipient_public_key, "PK2");
    }

    #[test]
    fn set_fields_override_prior() {
        let mut changes = unset();
        changes.operation = Some("TRANSFER".into());
        changes.recipient_public_key = Some("PK3".into());
        changes.asset = Some("{'data': {'currentElectionId': 'E2'}}".into());
        let resolved = resolve(&prior(), changes).unwrap();
        assert_eq!(resolved.operation, "TRANSFER");
        assert_eq!(resolved.recipient_public_key, "PK3");
        assert_eq!(resolved.asset, json!({"data": {"currentElectionId": "E2"}}));
    }

    #[test]
    fn unparsable_asset_is_rejected() {
        let mut changes = unset();
        changes.asset = Some("{'data': ".into());
        assert!(matches!(
            resolve(&prior(), changes),
            Err(GatewayError::InvalidAssetPayload(_))
        ));
    }

    #[test]
    fn fallback_from_incomplete_prior_is_malformed() {
        let mut doc = sample("t1", "PK1", "PK2", json!({}));
        doc["outputs"] = json!([]);
        assert!(matches!(
            resolve(&LedgerTransaction(doc), unset()),
            Err(GatewayError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn decodes_legacy_blank_fields() {
        let changes: UpdateRequest = serde_json::from_value(json!({
            "id": "t1",
            "operation": "",
            "amount": 10,
            "recipientPublicKey": "",
            "asset": "",
            "signerPublicKey": "PK1",
            "signerPrivateKey": "SK1"
        }))
        .unwrap();
        assert_eq!(changes.operation, None);
        assert_eq!(changes.recipient_public_key, None);
        assert_eq!(changes.asset, None);
        assert_eq!(changes.amount, Some(10));
        assert!(!format!("{:?}", changes).contains("SK1"));
    }
}
