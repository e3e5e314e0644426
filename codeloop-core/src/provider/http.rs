//! HTTP chat-completion client
//!
//! Works with Ollama's `/api/chat` and any OpenAI-compatible
//! `/v1/chat/completions` endpoint. The reply shape is taken from
//! configuration.

use super::*;
use crate::config::EndpointConfig;
use crate::{Error, Result};
use reqwest::Client;
use serde::Serialize;

/// Chat client over plain HTTP
pub struct HttpChatClient {
    client: Client,
    url: String,
    shape: ResponseShape,
    api_key: Option<String>,
    timeout_retries: usize,
}

impl HttpChatClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                Error::config_invalid("failed to create HTTP client")
                    .with_operation("HttpChatClient::new")
                    .set_source(e)
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            shape: config.response_shape,
            api_key: config.api_key(),
            timeout_retries: config.timeout_retries,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn body<'a>(&self, request: &'a CompletionRequest) -> ChatRequestBody<'a> {
        ChatRequestBody {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        }
    }
}

impl ChatTransport for HttpChatClient {
    fn name(&self) -> &str {
        "http"
    }

    fn timeout_retries(&self) -> usize {
        self.timeout_retries
    }

    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, ProviderError> {
        let mut req = self.client.post(&self.url).json(&self.body(request));

        if let Some(api_key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        tracing::debug!(
            url = %self.url,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        let response = req.send().await.map_err(classify_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_reqwest)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), body = %text, "chat endpoint rejected request");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_reply(self.shape, &text)
    }
}

fn classify_reqwest(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Decode a reply body and pull the text out at the configured path
pub fn parse_reply(shape: ResponseShape, body: &str) -> std::result::Result<String, ProviderError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    shape
        .extract(&value)
        .map(str::to_string)
        .ok_or(ProviderError::MissingContent(shape.content_pointer()))
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}
