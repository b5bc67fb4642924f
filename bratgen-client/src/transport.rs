//! Render server transport
//!
//! [`JobTransport`] is the seam between job tracking and the network: the
//! tracker only ever submits a request and reads a job's status. The HTTP
//! implementation talks JSON to the render server with reqwest.

use crate::api::{GenerateRequestBody, JobSnapshot, SubmitResponse};
use crate::error::TransportError;
use async_trait::async_trait;
use bratgen_common::config::ClientConfig;
use reqwest::Url;
use std::time::Duration;

const USER_AGENT: &str = concat!("bratgen/", env!("CARGO_PKG_VERSION"));

/// Access to the render server's job endpoints
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Submit a generation request; returns the server's raw answer
    async fn submit(&self, body: &GenerateRequestBody) -> Result<SubmitResponse, TransportError>;

    /// Read the current status of a job
    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, TransportError>;
}

/// reqwest-backed transport
pub struct HttpJobTransport {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpJobTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url =
            Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.server_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TransportError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }
}

#[async_trait]
impl JobTransport for HttpJobTransport {
    async fn submit(&self, body: &GenerateRequestBody) -> Result<SubmitResponse, TransportError> {
        let url = self.endpoint(&["generate"])?;
        tracing::debug!(url = %url, song = %body.song, "Submitting generation request");

        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobSnapshot, TransportError> {
        let url = self.endpoint(&["status", job_id])?;
        tracing::trace!(url = %url, "Polling job status");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Self::read_json(response).await
    }
}
