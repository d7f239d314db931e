//! HTTP client for the full node's JSON-RPC endpoint

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::dto::{JsonRpcRequest, JsonRpcResponse};
use crate::types::{FetchError, ValidatorError};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Full-node JSON-RPC URL
    pub url: String,
    /// Per-call timeout. `None` waits for the node indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9334".to_string(),
            timeout: None,
        }
    }
}

/// JSON-RPC client bound to a single full-node endpoint
#[derive(Debug, Clone)]
pub struct NodeRpcClient {
    inner: Client,
    url: String,
}

impl NodeRpcClient {
    /// Build a client from configuration
    pub fn new(config: RpcConfig) -> Result<Self, ValidatorError> {
        if config.url.trim().is_empty() {
            return Err(ValidatorError::Config("RPC URL is empty".to_string()));
        }

        let mut builder = Client::builder().user_agent("validator-dashboard/0.1");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|e| ValidatorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            url: config.url,
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.url
    }

    /// Issue a call and return the raw `Result` value, or `None` when the
    /// node answered with neither a result nor an error.
    pub async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<Value>, FetchError> {
        debug!(method = %method, "Calling full node");

        let payload = JsonRpcRequest::new(method, params);
        let response = self.inner.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let envelope: JsonRpcResponse = response.json().await?;
        if let Some(error) = envelope.error.filter(|e| !e.is_blank()) {
            return Err(FetchError::Rpc(error.message()));
        }

        Ok(envelope.result.filter(|v| !v.is_null()))
    }

    /// Issue a call that may legitimately return nothing
    pub async fn call_optional<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<R>, FetchError> {
        match self.request(method, params).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Issue a call whose missing result is a failure
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R, FetchError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| FetchError::NoResponse(method.to_string()))
    }
}
