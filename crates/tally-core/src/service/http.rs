//! HTTP transaction service client
//!
//! JSON client for the REST transaction backend. Response bodies are treated
//! as untrusted input: they deserialize into `RawTransactionInput` and pass
//! through the validator like every other payload source.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ListFilters, RawTransactionInput, TransactionRecord};
use crate::validate::validate;

use super::TransactionService;

/// HTTP client for the transaction service
#[derive(Clone)]
pub struct HttpTransactionService {
    http_client: Client,
    base_url: String,
}

impl HttpTransactionService {
    /// Create a new client for the given base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from the `TALLY_API_URL` environment variable
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TALLY_API_URL").ok()?;
        Some(Self::new(&base_url))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response into a service error with the body text
    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Service(format!("{}: {}", status, body.trim()))
    }
}

#[async_trait]
impl TransactionService for HttpTransactionService {
    async fn create_transaction(&self, payload: &TransactionRecord) -> Result<TransactionRecord> {
        debug!(amount = payload.amount, kind = %payload.kind, "POST /api/transactions");
        let response = self
            .http_client
            .post(self.endpoint("/api/transactions"))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let raw: RawTransactionInput = response.json().await?;
        Ok(validate(&raw))
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &RawTransactionInput,
    ) -> Result<TransactionRecord> {
        let response = self
            .http_client
            .put(self.endpoint(&format!("/api/transactions/{}", id)))
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let raw: RawTransactionInput = response.json().await?;
        Ok(validate(&raw))
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.endpoint(&format!("/api/transactions/{}", id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn list_transactions(&self, filters: &ListFilters) -> Result<Vec<TransactionRecord>> {
        let response = self
            .http_client
            .get(self.endpoint("/api/transactions"))
            .query(filters)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let raw: Vec<RawTransactionInput> = response.json().await?;
        Ok(raw.iter().map(validate).collect())
    }
}
