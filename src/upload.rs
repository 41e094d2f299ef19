//! Posting parsed scans to a collection endpoint.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// How long a single POST may take before it is abandoned.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where scans go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub endpoint: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("POST {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("POST {endpoint} returned status {status}")]
    Status { endpoint: String, status: StatusCode },
}

/// A successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: StatusCode,
    pub bytes: usize,
}

/// JSON uploader for one target. Failed uploads are not retried.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    target: UploadTarget,
}

impl Uploader {
    pub fn new(target: UploadTarget) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(UploadError::Client)?;
        Ok(Self { client, target })
    }

    pub fn target(&self) -> &UploadTarget {
        &self.target
    }

    fn request(&self, payload: Vec<u8>) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(&self.target.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);

        match &self.target.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// POST a serialized scan. Any 2xx counts as delivered.
    pub async fn post(&self, payload: Vec<u8>) -> Result<UploadReceipt, UploadError> {
        let bytes = payload.len();
        let response = self
            .request(payload)
            .send()
            .await
            .map_err(|source| UploadError::Transport {
                endpoint: self.target.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status {
                endpoint: self.target.endpoint.clone(),
                status,
            });
        }

        Ok(UploadReceipt { status, bytes })
    }
}
