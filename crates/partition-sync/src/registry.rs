//! Client for the identity provider's admin client registry.

use std::fmt;
use std::time::Duration;

use partition_core::error::PartitionResult;
use serde_json::Value;
use tracing::debug;

use crate::error::SyncError;

/// HTTP methods used against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Raw registry response. Any status is returned; interpreting it is
/// the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RegistryResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to issue a single JSON call against the registry.
pub trait RegistryClient: Send + Sync {
    fn invoke(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> impl Future<Output = PartitionResult<RegistryResponse>> + Send;
}

/// [`RegistryClient`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
}

impl HttpRegistryClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> PartitionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl RegistryClient for HttpRegistryClient {
    async fn invoke(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> PartitionResult<RegistryResponse> {
        let mut request = self
            .client
            .request(method.into(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?
            .to_vec();

        debug!(%method, url, status, "Registry call completed");
        Ok(RegistryResponse { status, body })
    }
}
