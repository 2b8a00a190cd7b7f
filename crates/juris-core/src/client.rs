use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::config::Config;
use crate::error::ClientError;
use crate::models::{ChatRequest, ChatResponse, Mode};

/// Sends one query to the answering service and decodes the reply.
#[async_trait]
pub trait AnswerClient: Send + Sync {
    async fn send(&self, query: &str, mode: Mode) -> Result<ChatResponse, ClientError>;
}

#[derive(Clone)]
pub struct HttpAnswerClient {
    client: Client,
    base_url: String,
}

impl HttpAnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config, api_url: &str) -> Result<Self> {
        match config.request_timeout() {
            Some(timeout) => Self::with_timeout(api_url, timeout),
            None => Ok(Self::new(api_url)),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/message", self.base_url)
    }
}

#[async_trait]
impl AnswerClient for HttpAnswerClient {
    async fn send(&self, query: &str, mode: Mode) -> Result<ChatResponse, ClientError> {
        let url = self.endpoint();

        let request = ChatRequest {
            query: query.to_string(),
            mode,
        };

        tracing::debug!(%url, %mode, "sending query");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| ClientError::Network { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Network { url, source })?;

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
