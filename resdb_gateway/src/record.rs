//! Raw ledger documents and their external record shape.

use crate::error::{GatewayError, Result};
use crate::literal;
use crate::path::{lookup, Lookup, Step};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ID: [Step<'static>; 1] = [Step::Key("id")];
const VERSION: [Step<'static>; 1] = [Step::Key("version")];
const OPERATION: [Step<'static>; 1] = [Step::Key("operation")];
const AMOUNT: [Step<'static>; 3] = [Step::Key("outputs"), Step::Index(0), Step::Key("amount")];
const CONDITION_URI: [Step<'static>; 4] = [
    Step::Key("outputs"),
    Step::Index(0),
    Step::Key("condition"),
    Step::Key("uri"),
];
const CONDITION_TYPE: [Step<'static>; 5] = [
    Step::Key("outputs"),
    Step::Index(0),
    Step::Key("condition"),
    Step::Key("details"),
    Step::Key("type"),
];
const RECIPIENT: [Step<'static>; 5] = [
    Step::Key("outputs"),
    Step::Index(0),
    Step::Key("condition"),
    Step::Key("details"),
    Step::Key("public_key"),
];
const RECIPIENT_FALLBACK: [Step<'static>; 4] = [
    Step::Key("outputs"),
    Step::Index(0),
    Step::Key("public_keys"),
    Step::Index(0),
];
const OWNER: [Step<'static>; 4] = [
    Step::Key("inputs"),
    Step::Index(0),
    Step::Key("owners_before"),
    Step::Index(0),
];

/// A transaction exactly as the ledger returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerTransaction(pub Value);

impl LedgerTransaction {
    pub fn id(&self) -> Option<&str> {
        lookup(&self.0, &ID).found().and_then(Value::as_str)
    }

    /// Id for log and error messages
    pub fn label(&self) -> String {
        self.id().unwrap_or("<unknown>").to_string()
    }

    /// Public key of the first signer
    pub fn owner(&self) -> Option<&str> {
        lookup(&self.0, &OWNER).found().and_then(Value::as_str)
    }

    /// Public key the first output is locked to
    pub fn recipient(&self) -> Option<&str> {
        lookup(&self.0, &RECIPIENT)
            .found()
            .or_else(|| lookup(&self.0, &RECIPIENT_FALLBACK).found())
            .and_then(Value::as_str)
    }

    pub fn operation(&self) -> Result<&str> {
        self.required(&OPERATION)?
            .as_str()
            .ok_or_else(|| GatewayError::malformed(self.label(), "operation is not a string"))
    }

    /// Amount of the first output; the ledger may encode it as a decimal string
    pub fn amount(&self) -> Result<u64> {
        let raw = self.required(&AMOUNT)?;
        let parsed = match raw {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            GatewayError::malformed(self.label(), format!("amount {} is not a whole number", raw))
        })
    }

    /// Structured asset; absent assets read as `null`
    pub fn asset(&self) -> &Value {
        self.0.get("asset").unwrap_or(&Value::Null)
    }

    fn required(&self, path: &[Step<'_>]) -> Result<&Value> {
        match lookup(&self.0, path) {
            Lookup::Found(v) => Ok(v),
            Lookup::Missing(at) => Err(GatewayError::malformed(
                self.label(),
                format!("missing {}", at),
            )),
        }
    }

    fn required_text(&self, path: &[Step<'_>]) -> Result<String> {
        match self.required(path)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(GatewayError::malformed(
                self.label(),
                format!("{} is not a scalar: {}", crate::path::dotted(path), other),
            )),
        }
    }
}

/// Record shape served to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRecord {
    pub id: String,
    pub version: String,
    pub amount: u64,
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
    pub operation: String,
    pub metadata: Option<String>,
    /// Asset payload in literal notation, see [`crate::literal`]
    pub asset: String,
}

/// Convert a raw ledger transaction into an [`ExternalRecord`].
///
/// Fails with `MalformedRecord` when the first output, its spending
/// condition or any scalar field is missing.
pub fn map(tx: &LedgerTransaction) -> Result<ExternalRecord> {
    let public_key = tx.required_text(&RECIPIENT)?;

    Ok(ExternalRecord {
        id: tx.required_text(&ID)?,
        version: tx.required_text(&VERSION)?,
        amount: tx.amount()?,
        uri: tx.required_text(&CONDITION_URI)?,
        kind: tx.required_text(&CONDITION_TYPE)?,
        public_key,
        operation: tx.operation()?.to_string(),
        metadata: metadata_text(tx.0.get("metadata")),
        asset: literal::serialize(tx.asset()),
    })
}

fn metadata_text(metadata: Option<&Value>) -> Option<String> {
    match metadata? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(literal::serialize(other)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample(id: &str, owner: &str, recipient: &str, asset: Value) -> Value {
        json!({
            "id": id,
            "version": "2.0",
            "operation": "CREATE",
            "inputs": [{"owners_before": [owner], "fulfills": null, "fulfillment": "sig"}],
            "outputs": [{
                "amount": "5",
                "condition": {
                    "details": {"type": "ed25519-sha-256", "public_key": recipient},
                    "uri": "ni:///sha-256;abc?fpt=ed25519-sha-256&cost=131072"
                },
                "public_keys": [recipient]
            }],
            "metadata": null,
            "asset": asset
        })
    }

    #[test]
    fn maps_complete_transaction() {
        let tx = LedgerTransaction(sample("t1", "PK1", "PK2", json!({"data": {"a": 1}})));
        let record = map(&tx).unwrap();
        assert_eq!(
            record,
            ExternalRecord {
                id: "t1".into(),
                version: "2.0".into(),
                amount: 5,
                uri: "ni:///sha-256;abc?fpt=ed25519-sha-256&cost=131072".into(),
                kind: "ed25519-sha-256".into(),
                public_key: "PK2".into(),
                operation: "CREATE".into(),
                metadata: None,
                asset: "{'data': {'a': 1}}".into(),
            }
        );
        assert_eq!(tx.owner(), Some("PK1"));
    }

    #[test]
    fn missing_condition_path_is_malformed() {
        let mut doc = sample("t1", "PK1", "PK2", json!({}));
        doc["outputs"][0]["condition"]["details"]
            .as_object_mut()
            .unwrap()
            .remove("public_key");
        match map(&LedgerTransaction(doc)) {
            Err(GatewayError::MalformedRecord { id, reason }) => {
                assert_eq!(id, "t1");
                assert!(reason.contains("outputs.0.condition.details.public_key"));
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn missing_outputs_or_scalars_are_malformed() {
        let mut no_outputs = sample("t1", "PK1", "PK2", json!({}));
        no_outputs["outputs"] = json!([]);
        assert!(matches!(
            map(&LedgerTransaction(no_outputs)),
            Err(GatewayError::MalformedRecord { .. })
        ));

        let mut no_version = sample("t1", "PK1", "PK2", json!({}));
        no_version.as_object_mut().unwrap().remove("version");
        assert!(matches!(
            map(&LedgerTransaction(no_version)),
            Err(GatewayError::MalformedRecord { .. })
        ));

        let mut bad_amount = sample("t1", "PK1", "PK2", json!({}));
        bad_amount["outputs"][0]["amount"] = json!("five");
        assert!(matches!(
            map(&LedgerTransaction(bad_amount)),
            Err(GatewayError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn metadata_and_numeric_amount() {
        let mut doc = sample("t1", "PK1", "PK2", json!(null));
        doc["metadata"] = json!({"note": "x"});
        doc["outputs"][0]["amount"] = json!(12);
        let record = map(&LedgerTransaction(doc)).unwrap();
        assert_eq!(record.metadata.as_deref(), Some("{'note': 'x'}"));
        assert_eq!(record.amount, 12);
        assert_eq!(record.asset, "None");
    }

    #[test]
    fn recipient_falls_back_to_public_keys() {
        let mut doc = sample("t1", "PK1", "PK2", json!({}));
        doc["outputs"][0]["condition"] = json!({});
        assert_eq!(LedgerTransaction(doc).recipient(), Some("PK2"));
    }

    #[test]
    fn serializes_camel_case() {
        let tx = LedgerTransaction(sample("t1", "PK1", "PK2", json!({})));
        let out = serde_json::to_value(map(&tx).unwrap()).unwrap();
        assert_eq!(out["publicKey"], "PK2");
        assert_eq!(out["type"], "ed25519-sha-256");
        assert!(out.get("metadata").unwrap().is_null());
    }
}
