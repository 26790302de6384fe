use super::{ProviderRequest, ProviderResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Failure taxonomy for a single provider call.
///
/// Connection problems, timeouts and 5xx responses are transient and
/// retryable; 4xx responses are authoritative client rejections and are
/// neither retried nor counted against the circuit.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider returned status {status}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connection(_) | TransportError::Timeout => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Malformed(_) => false,
        }
    }

    pub fn is_client_rejection(&self) -> bool {
        matches!(self, TransportError::Status { status, .. } if (400..500).contains(status))
    }
}

/// Protocol-level call to a provider endpoint. Implementations must not
/// retry internally; the resilience policy owns that decision.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, TransportError>;
}

/// HTTP transport speaking JSON to provider endpoints.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, TransportError> {
        tracing::debug!(endpoint, payment_id = %request.payment_id, "sending provider request");

        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ProviderResponse>()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
