//! # Chat Transport
//!
//! A trait-based abstraction for talking to chat-completion backends.
//!
//! ## Design
//! - `ChatTransport` defines a single non-streaming `complete` call
//! - `send` wraps it with the timeout retry policy (fixed budget, no backoff)
//! - `respond` collapses every failure into the "no response" sentinel
//! - `HttpChatClient` speaks both Ollama-style and OpenAI-style reply shapes

pub mod http;

pub use http::HttpChatClient;

use serde::{Deserialize, Serialize};

/// Timeout retries per `send` when a transport does not override it
pub const DEFAULT_TIMEOUT_RETRIES: usize = 3;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Pretty print the message to stdout
    pub fn pretty_print(&self) {
        println!("[{}]", self.role.as_str().to_uppercase());
        println!("{}", self.content);
        println!();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Sampling knobs sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub options: SamplingOptions,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.options.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.options.max_tokens = Some(max);
        self
    }
}

/// Where the generated text lives in a reply body.
///
/// Chosen by configuration; the client never probes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `message.content` (Ollama `/api/chat`)
    #[default]
    Ollama,
    /// `choices[0].message.content` (OpenAI `/v1/chat/completions`)
    OpenAI,
}

impl ResponseShape {
    /// JSON pointer to the generated text
    pub fn content_pointer(&self) -> &'static str {
        match self {
            ResponseShape::Ollama => "/message/content",
            ResponseShape::OpenAI => "/choices/0/message/content",
        }
    }

    /// Pull the generated text out of a parsed reply body
    pub fn extract<'a>(&self, body: &'a serde_json::Value) -> Option<&'a str> {
        body.pointer(self.content_pointer()).and_then(|v| v.as_str())
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Error type for transport operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// The request did not finish within the client timeout
    Timeout,
    /// API returned a non-success status
    Api { status: u16, message: String },
    /// Failed to parse response body
    Parse(String),
    /// Body parsed but the configured content path was absent
    MissingContent(&'static str),
    /// Every attempt timed out
    RetriesExhausted { attempts: usize },
}

impl ProviderError {
    /// Lift into the unified error type
    pub fn into_error(self) -> crate::Error {
        use crate::{Error, ErrorKind};

        let err = match &self {
            Self::Network(e) => Error::new(ErrorKind::NetworkFailed, e.clone()),
            Self::Timeout => Error::new(ErrorKind::TransportTimeout, "request timed out"),
            Self::Api { status, message } => Error::transport_rejected(*status, message.clone()),
            Self::Parse(e) => Error::response_malformed(e.clone()),
            Self::MissingContent(path) => {
                Error::response_malformed("reply has no generated text").with_context("path", *path)
            }
            Self::RetriesExhausted { attempts } => {
                Error::new(ErrorKind::TransportTimeout, "timeout retries exhausted")
                    .with_context("attempts", attempts.to_string())
                    .persist()
            }
        };
        err.with_operation("transport::send")
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::MissingContent(path) => write!(f, "No content at {}", path),
            Self::RetriesExhausted { attempts } => {
                write!(f, "Timed out {} times, giving up", attempts)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// A chat-completion backend.
///
/// Implementations do a single network round-trip in `complete`. They never
/// touch conversation state; callers append prompts and replies themselves.
#[allow(async_fn_in_trait)]
pub trait ChatTransport: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// How many attempts `send` makes when every attempt times out
    fn timeout_retries(&self) -> usize {
        DEFAULT_TIMEOUT_RETRIES
    }

    /// One request, one reply
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// `complete`, retried immediately on timeout only.
    ///
    /// Non-success statuses and malformed bodies are returned on the first
    /// occurrence so the caller can decide what to do.
    async fn send(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let attempts = self.timeout_retries().max(1);
        for attempt in 1..=attempts {
            match self.complete(request).await {
                Err(ProviderError::Timeout) => {
                    tracing::warn!(
                        transport = self.name(),
                        model = %request.model,
                        attempt,
                        attempts,
                        "chat request timed out, retrying"
                    );
                }
                other => return other,
            }
        }
        tracing::warn!(transport = self.name(), attempts, "max retries reached");
        Err(ProviderError::RetriesExhausted { attempts })
    }

    /// `send`, with every failure reported and turned into `None`
    async fn respond(&self, request: &CompletionRequest) -> Option<String> {
        match self.send(request).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(transport = self.name(), error = %e, "no response from model");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
