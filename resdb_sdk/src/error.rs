use thiserror::Error;

/// Errors raised by the ResilientDB client
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("private key does not belong to signer {0}")]
    KeyMismatch(String),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("ledger returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected ledger response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, SdkError>;
