//! HTTP client for the generation service.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use crate::backend::{ChunkStream, GenerationBackend};
use crate::envelope::text_from_body;
use crate::error::ClientError;
use crate::lines::{idle_timeout, line_chunks, raw_chunks};
use crate::message::{GenerationRequest, TokenField};
use crate::{DEFAULT_ENDPOINT, DEFAULT_MODEL_NAME};

/// Client for a local generation endpoint.
pub struct GenerationClient {
    client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
    token_field: TokenField,
}

impl GenerationClient {
    /// Create a new client for the default local endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a new client for a custom endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: Some(DEFAULT_MODEL_NAME.to_string()),
            token_field: TokenField::default(),
        }
    }

    /// Set the model name sent with each request (`None` omits the field).
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Set the name of the token budget field.
    pub fn with_token_field(mut self, token_field: TokenField) -> Self {
        self.token_field = token_field;
        self
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the model name.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get the token budget field.
    pub fn token_field(&self) -> TokenField {
        self.token_field
    }

    /// Check that the service answers on its root route.
    pub async fn check_health(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.endpoint)
            .and_then(|u| u.join("/"))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|_| ClientError::ServerNotRunning(self.endpoint.clone()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::ServerNotRunning(self.endpoint.clone()))
        }
    }

    fn post(&self, request: &GenerationRequest) -> reqwest::RequestBuilder {
        let body = request.to_body(self.token_field, self.model.as_deref());
        debug!(
            "POST {} ({} messages, {} tokens, stream={})",
            self.endpoint,
            request.messages.len(),
            request.max_tokens,
            request.stream
        );
        self.client.post(&self.endpoint).json(&body)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, &self.endpoint, timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(response)
    }
}

impl Default for GenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    async fn complete(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        // The whole exchange, body included, must fit in `timeout`.
        let builder = self.post(request).timeout(timeout);
        let response = self.send(builder, timeout).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(e, &self.endpoint, timeout))?;

        text_from_body(&body).ok_or(ClientError::EmptyResponse)
    }

    async fn stream(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<ChunkStream, ClientError> {
        // `timeout` bounds opening the response and each wait for more bytes,
        // never the whole stream.
        let response = tokio::time::timeout(timeout, self.send(self.post(request), timeout))
            .await
            .map_err(|_| ClientError::Timeout(timeout))??;
        let framed = is_line_framed(response.headers().get(CONTENT_TYPE));
        let endpoint = self.endpoint.clone();
        let bytes = response
            .bytes_stream()
            .map(move |r| r.map_err(|e| ClientError::from_transport(e, &endpoint, timeout)));
        let bytes = idle_timeout(Box::pin(bytes), timeout);

        if framed {
            Ok(line_chunks(bytes))
        } else {
            debug!("Response is not line framed, streaming raw text");
            Ok(raw_chunks(bytes))
        }
    }
}

/// Whether a response with this content type is sent as lines.
///
/// SSE and JSON bodies are line framed. Plain text bodies stream raw tokens.
fn is_line_framed(content_type: Option<&HeaderValue>) -> bool {
    let content_type = match content_type.and_then(|v| v.to_str().ok()) {
        Some(ct) => ct.to_ascii_lowercase(),
        None => return true,
    };
    !content_type.starts_with("text/plain")
}
