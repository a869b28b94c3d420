use crate::error::{Result, SdkError};
use crate::ledger::Ledger;
use crate::types::FulfilledTransaction;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const TRANSACTIONS_ENDPOINT: &str = "/v1/transactions";
const COMMIT_ENDPOINT: &str = "/v1/transactions/commit";

/// HTTP client for a ResilientDB key/value service
#[derive(Clone)]
pub struct ResdbClient {
    base_url: String,
    client: Client,
}

impl ResdbClient {
    /// Create a new client. A missing scheme defaults to `http://`.
    pub fn new(node_url: impl Into<String>) -> Self {
        Self::with_client(node_url, Client::new())
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(node_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(node_url, client))
    }

    /// Create a client with custom reqwest client
    pub fn with_client(node_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_url(node_url.into()),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check node health
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}{}", self.base_url, TRANSACTIONS_ENDPOINT);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Ledger for ResdbClient {
    async fn send_commit(&self, tx: &FulfilledTransaction) -> Result<String> {
        let url = format!("{}{}", self.base_url, COMMIT_ENDPOINT);
        debug!("committing transaction {}", tx.id());
        let response = check_status(self.client.post(&url).json(tx).send().await?).await?;
        let receipt = response.text().await?;
        Ok(receipt.trim().to_string())
    }

    async fn retrieve(&self, id: &str) -> Result<Value> {
        let url = format!("{}{}/{}", self.base_url, TRANSACTIONS_ENDPOINT, id);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SdkError::NotFound(id.to_string()));
        }
        let body: Value = check_status(response).await?.json().await?;

        // the service answers unknown ids with an empty document
        let empty = match &body {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(SdkError::NotFound(id.to_string()));
        }
        Ok(body)
    }

    async fn history(&self) -> Result<Vec<Value>> {
        let url = format!("{}{}", self.base_url, TRANSACTIONS_ENDPOINT);
        let body: Value = check_status(self.client.get(&url).send().await?)
            .await?
            .json()
            .await?;

        match body {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected a transaction list, got {}",
                kind_of(&other)
            ))),
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SdkError::Status { status, body })
}

fn normalize_url(url: String) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ResdbClient::new("http://localhost:18000");
        assert_eq!(client.base_url(), "http://localhost:18000");
    }

    #[test]
    fn test_url_normalization() {
        let client = ResdbClient::new("http://localhost:18000/");
        assert_eq!(client.base_url(), "http://localhost:18000");
    }

    #[test]
    fn bare_host_gets_http_scheme() {
        let client = ResdbClient::new("localhost:18000");
        assert_eq!(client.base_url(), "http://localhost:18000");
    }
}
