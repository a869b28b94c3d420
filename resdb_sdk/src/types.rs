use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spending condition details: who may claim an output and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub details: ConditionDetails,
    pub uri: String,
}

/// A single transaction output. Amounts travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub amount: String,
    pub condition: Condition,
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub owners_before: Vec<String>,
    pub fulfills: Option<Value>,
    pub fulfillment: Option<String>,
}

/// Ledger transaction body shared by every stage of the write protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub version: String,
    pub operation: String,
    pub asset: Value,
    pub metadata: Value,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

/// Transaction built locally but not yet signed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreparedTransaction(pub Transaction);

/// Signed transaction carrying its final id, ready to commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FulfilledTransaction(pub Transaction);

impl FulfilledTransaction {
    pub fn id(&self) -> &str {
        self.0.id.as_deref().unwrap_or_default()
    }
}

/// One recipient of a prepared transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub public_key: String,
    pub amount: u64,
}

/// Parameters for `prepare`
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareParams {
    pub operation: String,
    pub signer: String,
    pub recipients: Vec<Recipient>,
    pub asset: Value,
    pub metadata: Option<Value>,
}

/// Base58-encoded Ed25519 key pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}
