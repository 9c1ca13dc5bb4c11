//! Delivery: POST a rendered body to a Google Chat endpoint.

use super::payload::RenderPayload;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no delivery endpoint")]
    MissingEndpoint,
    #[error("google chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("google chat rejected message: {status} {detail}")]
    Status { status: StatusCode, detail: String },
}

/// Client for outbound messages. One POST per call, no retries.
#[derive(Clone, Default)]
pub struct DeliveryClient {
    client: reqwest::Client,
}

impl DeliveryClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// POST `payload` as JSON to `endpoint`. Only HTTP 200 counts as delivered.
    pub async fn deliver(&self, endpoint: &str, payload: &RenderPayload) -> Result<(), DeliveryError> {
        if endpoint.trim().is_empty() {
            return Err(DeliveryError::MissingEndpoint);
        }
        let res = self.client.post(endpoint).json(payload).send().await?;
        let status = res.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let detail = match res.text().await {
            Ok(body) if !body.is_empty() => body,
            _ => status.as_u16().to_string(),
        };
        Err(DeliveryError::Status { status, detail })
    }
}
