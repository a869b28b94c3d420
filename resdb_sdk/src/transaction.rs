//! Local half of the write protocol: build (prepare) and sign (fulfill).

use crate::error::{Result, SdkError};
use crate::keys::{signing_key_from_base58, verifying_key_from_base58};
use crate::types::*;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, Verifier};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub const TX_VERSION: &str = "2.0";
pub const CONDITION_TYPE: &str = "ed25519-sha-256";
const CONDITION_COST: u32 = 131072;

/// Build an unsigned transaction from the given parameters.
pub fn prepare(params: PrepareParams) -> Result<PreparedTransaction> {
    if params.operation.trim().is_empty() {
        return Err(SdkError::InvalidTransaction("operation required".into()));
    }
    if params.recipients.is_empty() {
        return Err(SdkError::InvalidTransaction(
            "at least one recipient required".into(),
        ));
    }
    verifying_key_from_base58(&params.signer)?;

    let mut outputs = Vec::with_capacity(params.recipients.len());
    for recipient in &params.recipients {
        let key = verifying_key_from_base58(&recipient.public_key)?;
        outputs.push(Output {
            amount: recipient.amount.to_string(),
            condition: Condition {
                details: ConditionDetails {
                    kind: CONDITION_TYPE.to_string(),
                    public_key: recipient.public_key.clone(),
                },
                uri: condition_uri(key.as_bytes()),
            },
            public_keys: vec![recipient.public_key.clone()],
        });
    }

    Ok(PreparedTransaction(Transaction {
        id: None,
        version: TX_VERSION.to_string(),
        operation: params.operation,
        asset: params.asset,
        metadata: params.metadata.unwrap_or(Value::Null),
        inputs: vec![Input {
            owners_before: vec![params.signer],
            fulfills: None,
            fulfillment: None,
        }],
        outputs,
    }))
}

/// Sign every input with `private_key` and stamp the transaction id.
///
/// The key must belong to the owner named on each input.
pub fn fulfill(prepared: &PreparedTransaction, private_key: &str) -> Result<FulfilledTransaction> {
    let signing_key = signing_key_from_base58(private_key)?;
    let signer = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();

    let mut tx = prepared.0.clone();
    tx.id = None;
    for input in &tx.inputs {
        if input.owners_before.first() != Some(&signer) {
            let owner = input.owners_before.first().cloned().unwrap_or_default();
            return Err(SdkError::KeyMismatch(owner));
        }
    }

    let message = signing_message(&tx)?;
    let signature = signing_key.sign(&message);
    let fulfillment = bs58::encode(signature.to_bytes()).into_string();
    for input in tx.inputs.iter_mut() {
        input.fulfillment = Some(fulfillment.clone());
    }

    tx.id = Some(transaction_id(&tx)?);
    Ok(FulfilledTransaction(tx))
}

/// Check signatures and id of a fulfilled transaction.
pub fn verify(fulfilled: &FulfilledTransaction) -> Result<()> {
    let tx = &fulfilled.0;
    let message = signing_message(tx)?;

    for input in &tx.inputs {
        let owner = input
            .owners_before
            .first()
            .ok_or_else(|| SdkError::InvalidTransaction("input without owner".into()))?;
        let key = verifying_key_from_base58(owner)?;
        let fulfillment = input
            .fulfillment
            .as_deref()
            .ok_or_else(|| SdkError::InvalidTransaction("input is not fulfilled".into()))?;
        let sig_bytes: [u8; 64] = bs58::decode(fulfillment)
            .into_vec()
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| SdkError::InvalidTransaction("malformed fulfillment".into()))?;

        key.verify(&message, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| SdkError::InvalidTransaction("signature invalid".into()))?;
    }

    let mut unstamped = tx.clone();
    unstamped.id = None;
    if tx.id.as_deref() != Some(transaction_id(&unstamped)?.as_str()) {
        return Err(SdkError::InvalidTransaction("id does not match body".into()));
    }
    Ok(())
}

/// Crypto-condition URI for a single Ed25519 key
pub fn condition_uri(public_key: &[u8; 32]) -> String {
    let fingerprint = Sha256::digest(public_key);
    format!(
        "ni:///sha-256;{}?fpt={}&cost={}",
        URL_SAFE_NO_PAD.encode(fingerprint),
        CONDITION_TYPE,
        CONDITION_COST
    )
}

// Object keys are sorted at every level; callers may build maps in any order.
fn canonical_bytes(tx: &Transaction) -> Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(tx)?);
    Ok(serde_json::to_vec(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn signing_message(tx: &Transaction) -> Result<Vec<u8>> {
    let mut body = tx.clone();
    body.id = None;
    for input in body.inputs.iter_mut() {
        input.fulfillment = None;
    }
    canonical_bytes(&body)
}

fn transaction_id(tx: &Transaction) -> Result<String> {
    Ok(hex::encode(Sha256::digest(canonical_bytes(tx)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;
    use serde_json::json;

    fn params(signer: &str, recipient: &str) -> PrepareParams {
        PrepareParams {
            operation: "CREATE".into(),
            signer: signer.into(),
            recipients: vec![Recipient {
                public_key: recipient.into(),
                amount: 5,
            }],
            asset: json!({"data": {"currentElectionId": "E1"}}),
            metadata: None,
        }
    }

    #[test]
    fn prepare_builds_single_output() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let prepared = prepare(params(&alice.public_key, &bob.public_key)).unwrap();

        let tx = &prepared.0;
        assert_eq!(tx.id, None);
        assert_eq!(tx.version, TX_VERSION);
        assert_eq!(tx.inputs[0].owners_before, vec![alice.public_key.clone()]);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].amount, "5");
        assert_eq!(tx.outputs[0].condition.details.public_key, bob.public_key);
        assert_eq!(tx.outputs[0].condition.details.kind, CONDITION_TYPE);
        assert!(tx.outputs[0].condition.uri.starts_with("ni:///sha-256;"));
    }

    #[test]
    fn prepare_rejects_missing_recipients() {
        let alice = generate_keypair();
        let mut p = params(&alice.public_key, &alice.public_key);
        p.recipients.clear();
        assert!(matches!(prepare(p), Err(SdkError::InvalidTransaction(_))));
    }

    #[test]
    fn fulfill_signs_and_stamps_id() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let prepared = prepare(params(&alice.public_key, &bob.public_key)).unwrap();
        let fulfilled = fulfill(&prepared, &alice.private_key).unwrap();

        assert_eq!(fulfilled.id().len(), 64);
        assert!(fulfilled.0.inputs[0].fulfillment.is_some());
        verify(&fulfilled).unwrap();
    }

    #[test]
    fn fulfill_with_foreign_key_fails() {
        let alice = generate_keypair();
        let mallory = generate_keypair();
        let prepared = prepare(params(&alice.public_key, &alice.public_key)).unwrap();
        assert!(matches!(
            fulfill(&prepared, &mallory.private_key),
            Err(SdkError::KeyMismatch(_))
        ));
    }

    #[test]
    fn asset_key_order_does_not_change_id() {
        let alice = generate_keypair();
        let mut forward = Map::new();
        forward.insert("b".into(), json!(1));
        forward.insert("a".into(), json!(2));
        let mut backward = Map::new();
        backward.insert("a".into(), json!(2));
        backward.insert("b".into(), json!(1));

        let id_of = |data: Map<String, Value>| {
            let mut p = params(&alice.public_key, &alice.public_key);
            p.asset = json!({ "data": Value::Object(data) });
            let prepared = prepare(p).unwrap();
            fulfill(&prepared, &alice.private_key).unwrap().id().to_string()
        };
        assert_eq!(id_of(forward.clone()), id_of(backward));

        let mut p = params(&alice.public_key, &alice.public_key);
        p.asset = json!({ "data": Value::Object(forward) });
        let bytes = canonical_bytes(&prepare(p).unwrap().0).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#"{"data":{"a":2,"b":1}}"#));
    }

    #[test]
    fn tampered_transaction_fails_verification() {
        let alice = generate_keypair();
        let prepared = prepare(params(&alice.public_key, &alice.public_key)).unwrap();
        let mut fulfilled = fulfill(&prepared, &alice.private_key).unwrap();
        fulfilled.0.outputs[0].amount = "500".into();
        assert!(verify(&fulfilled).is_err());
    }
}
