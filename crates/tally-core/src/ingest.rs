//! Document ingestion service boundary
//!
//! Uploaded receipt images and bank-statement PDFs are handed to an external
//! ingestion service (OCR + AI parsing happen over there); what comes back
//! is zero or more raw transaction candidates with a per-candidate
//! manual-review flag. The coordinator validates and merges them - clean
//! candidates bypass the optimistic phase entirely, flagged ones wait in the
//! review queue.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RawTransactionInput;

/// What kind of document was uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Receipt,
    BankStatement,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::BankStatement => "bank_statement",
        }
    }
}

impl std::str::FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" => Ok(Self::Receipt),
            "bank_statement" => Ok(Self::BankStatement),
            _ => Err(format!("Unknown upload kind: {}", s)),
        }
    }
}

impl std::fmt::Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extracted transaction candidate from an uploaded document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Raw extracted fields, untrusted like every other payload
    #[serde(flatten)]
    pub input: RawTransactionInput,
    /// Low extraction confidence on amount/category; route to manual review
    #[serde(default)]
    pub needs_manual_review: bool,
    /// Extraction confidence (0.0-1.0) when the service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Abstract contract of the external document ingestion service
#[async_trait]
pub trait DocumentIngestionService: Send + Sync {
    /// Submit a document; resolves once extraction has completed
    async fn submit_document(
        &self,
        data: &[u8],
        kind: UploadKind,
    ) -> Result<Vec<CandidateTransaction>>;
}

/// Concrete ingestion client wrapper
#[derive(Clone)]
pub enum IngestionClient {
    Http(HttpIngestionService),
    Mock(MockIngestionService),
}

impl IngestionClient {
    /// Create from the `TALLY_INGEST_URL` environment variable
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TALLY_INGEST_URL").ok()?;
        Some(Self::Http(HttpIngestionService::new(&base_url)))
    }
}

#[async_trait]
impl DocumentIngestionService for IngestionClient {
    async fn submit_document(
        &self,
        data: &[u8],
        kind: UploadKind,
    ) -> Result<Vec<CandidateTransaction>> {
        match self {
            Self::Http(s) => s.submit_document(data, kind).await,
            Self::Mock(s) => s.submit_document(data, kind).await,
        }
    }
}

/// Wire request for the HTTP ingestion endpoint
#[derive(Serialize)]
struct UploadRequest<'a> {
    kind: &'a str,
    /// Document bytes, base64-encoded
    data: String,
}

/// Wire response from the HTTP ingestion endpoint
#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    candidates: Vec<CandidateTransaction>,
}

/// HTTP client for the document ingestion service
#[derive(Clone)]
pub struct HttpIngestionService {
    http_client: Client,
    base_url: String,
}

impl HttpIngestionService {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TALLY_INGEST_URL").ok()?;
        Some(Self::new(&base_url))
    }
}

#[async_trait]
impl DocumentIngestionService for HttpIngestionService {
    async fn submit_document(
        &self,
        data: &[u8],
        kind: UploadKind,
    ) -> Result<Vec<CandidateTransaction>> {
        debug!(kind = %kind, bytes = data.len(), "POST /api/uploads");
        let request = UploadRequest {
            kind: kind.as_str(),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        };

        let response = self
            .http_client
            .post(format!("{}/api/uploads", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!("{}: {}", status, body.trim())));
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.candidates)
    }
}

/// Mock ingestion service returning preconfigured candidates
#[derive(Clone, Default)]
pub struct MockIngestionService {
    candidates: Vec<CandidateTransaction>,
    fail: bool,
}

impl MockIngestionService {
    pub fn new(candidates: Vec<CandidateTransaction>) -> Self {
        Self {
            candidates,
            fail: false,
        }
    }

    /// A mock that fails every submission
    pub fn failing() -> Self {
        Self {
            candidates: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DocumentIngestionService for MockIngestionService {
    async fn submit_document(
        &self,
        _data: &[u8],
        _kind: UploadKind,
    ) -> Result<Vec<CandidateTransaction>> {
        if self.fail {
            return Err(Error::Service("mock ingestion service failure".into()));
        }
        Ok(self.candidates.clone())
    }
}
