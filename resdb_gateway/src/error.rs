use resdb_sdk::SdkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("invalid asset payload: {0}")]
    InvalidAssetPayload(String),

    #[error("fulfillment failed: {0}")]
    FulfillmentError(String),

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Errors a bulk listing absorbs per record instead of failing
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            GatewayError::MalformedRecord { .. } | GatewayError::InvalidAssetPayload(_)
        )
    }
}

impl From<SdkError> for GatewayError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::NotFound(id) => GatewayError::NotFound(id),
            SdkError::InvalidKey(_) | SdkError::KeyMismatch(_) => {
                GatewayError::FulfillmentError(e.to_string())
            }
            SdkError::InvalidTransaction(reason) => GatewayError::InvalidRequest(reason),
            other => GatewayError::LedgerUnavailable(other.to_string()),
        }
    }
}
