//! Per-agent message ledger.
//!
//! A conversation belongs to exactly one agent and is replayed verbatim to
//! the model on every call, so insertion order matters.

use crate::export;
use crate::provider::{ChatMessage, CompletionRequest, Role, SamplingOptions};
use crate::Result;
use std::path::Path;

/// Ordered, append-only message history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// A ledger opened by a single system message
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Drop everything after the opening system message
    pub fn reset(&mut self) {
        let keep = usize::from(matches!(self.messages.first(), Some(m) if m.role == Role::System));
        self.messages.truncate(keep);
    }

    /// Build a request that replays the whole ledger
    pub fn request(&self, model: &str, options: SamplingOptions) -> CompletionRequest {
        CompletionRequest::new(self.messages.clone())
            .with_model(model)
            .with_options(options)
    }

    /// Write `role,content` rows, replacing `path`
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let rows: Vec<Vec<&str>> = self
            .messages
            .iter()
            .map(|m| vec![m.role.as_str(), m.content.as_str()])
            .collect();
        export::write_csv(path, &["role", "content"], &rows)
    }

    pub fn pretty_print(&self) {
        for message in &self.messages {
            message.pretty_print();
        }
    }
}
