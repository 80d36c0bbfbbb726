//! Transport to the ingestion gateway.
//!
//! One attempt per call, no internal retry. The timeout error is kept
//! distinct from network errors so callers can apply their own backoff.

use crate::error::TransportError;
use crate::signer::SignedEnvelope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Path of the ingestion endpoint under the configured API URL.
pub const INGEST_PATH: &str = "/api/v1/ingest";

/// Gateway acknowledgement of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    #[serde(alias = "sessionId")]
    pub session_id: String,
    #[serde(alias = "isNew")]
    pub is_new: bool,
    /// Server timestamp (RFC 3339)
    pub timestamp: String,
}

/// Delivers a signed envelope.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: &SignedEnvelope) -> Result<IngestReceipt, TransportError>;
}

/// HTTPS transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    ingest_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("scrybe-collector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            ingest_url: ingest_url(api_url),
            timeout,
        })
    }

    pub fn ingest_url(&self) -> &str {
        &self.ingest_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn post(&self, envelope: &SignedEnvelope) -> Result<IngestReceipt, TransportError> {
        let mut request = self
            .client
            .post(&self.ingest_url)
            .header("Content-Type", "application/json");
        for (name, value) in envelope.headers() {
            request = request.header(name, value);
        }

        let response = request
            .body(envelope.body.clone())
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<IngestReceipt>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: &SignedEnvelope) -> Result<IngestReceipt, TransportError> {
        debug!(url = %self.ingest_url, bytes = envelope.body.len(), "Sending payload");
        match tokio::time::timeout(self.timeout, self.post(envelope)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Submission timed out after {:?}", self.timeout);
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

/// `<api_url>/api/v1/ingest`, tolerating a trailing slash on the base.
pub fn ingest_url(api_url: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), INGEST_PATH)
}

/// Page-unload notification shared between the host and in-flight sends.
#[derive(Clone)]
pub struct UnloadSignal {
    sender: watch::Sender<bool>,
}

impl UnloadSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Mark the page as unloading. Idempotent.
    pub fn fire(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`fire`](Self::fire) has been called.
    pub async fn fired(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for UnloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// How a submission attempt ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Delivered(IngestReceipt),
    /// Abandoned because the page unloaded first.
    Aborted,
}

/// Send `envelope`, abandoning the call if `unload` fires first.
pub async fn submit(
    transport: &dyn Transport,
    envelope: &SignedEnvelope,
    unload: &UnloadSignal,
) -> Result<SubmissionOutcome, TransportError> {
    if unload.is_fired() {
        return Ok(SubmissionOutcome::Aborted);
    }

    tokio::select! {
        result = transport.send(envelope) => match result {
            Ok(receipt) => Ok(SubmissionOutcome::Delivered(receipt)),
            Err(TransportError::Aborted) => Ok(SubmissionOutcome::Aborted),
            Err(e) => Err(e),
        },
        _ = unload.fired() => {
            debug!("Submission aborted by unload");
            Ok(SubmissionOutcome::Aborted)
        }
    }
}
