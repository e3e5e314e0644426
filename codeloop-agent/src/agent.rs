//! The uniform prompt/response contract shared by every agent

use codeloop_core::{Conversation, EndpointConfig, SamplingOptions};
use serde::Serialize;
use std::fmt;

/// Which seat an agent occupies in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Designer,
    Programmer,
    Fixer,
    Analyzer,
    Human,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Designer => "designer",
            AgentRole::Programmer => "programmer",
            AgentRole::Fixer => "fixer",
            AgentRole::Analyzer => "analyzer",
            AgentRole::Human => "human",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that answers a prompt with text.
///
/// `respond` never fails: transport or input problems come back as an empty
/// string or a failure report, and are logged where they happen.
#[allow(async_fn_in_trait)]
pub trait Agent {
    fn role(&self) -> AgentRole;

    /// The agent's own ledger
    fn conversation(&self) -> &Conversation;

    async fn respond(&mut self, prompt: &str) -> String;
}

/// What a model-backed agent sends along with its conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub options: SamplingOptions,
    pub system_prompt: String,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: SamplingOptions::default(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<&EndpointConfig> for ModelSettings {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            model: config.model.clone(),
            options: config.sampling(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}
