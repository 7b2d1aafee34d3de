use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::error::BackendError;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the body is empty or not JSON.
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_value(self.body.clone()).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[async_trait]
pub trait SignupTransport: Send + Sync {
    async fn post_json(&self, path: &str, body: Value) -> Result<TransportResponse, BackendError>;
}

pub(crate) fn encode_body<T: Serialize>(body: &T) -> Result<Value, BackendError> {
    serde_json::to_value(body).map_err(|err| BackendError::Decode(err.to_string()))
}

pub struct MissingTransport;

#[async_trait]
impl SignupTransport for MissingTransport {
    async fn post_json(&self, path: &str, _body: Value) -> Result<TransportResponse, BackendError> {
        Err(BackendError::Unavailable(format!(
            "no backend configured for {path}"
        )))
    }
}

pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SignupTransport for HttpTransport {
    async fn post_json(&self, path: &str, body: Value) -> Result<TransportResponse, BackendError> {
        let url = format!("{}{path}", self.base_url);
        let res = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let status = res.status().as_u16();
        let bytes = res
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        tracing::debug!(%url, status, "signup backend responded");
        Ok(TransportResponse { status, body })
    }
}
