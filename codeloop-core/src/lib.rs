//! # Codeloop Core
//!
//! The pieces every compile-repair agent is built from.
//!
//! ## Core Concepts
//! - **Transport**: trait-based chat-completion client with timeout retries
//! - **Conversation**: per-agent, append-only message ledger
//! - **Extractor**: first fenced code block for a language tag
//! - **Sandbox**: scratch file + external toolchain + outcome classification
//! - **Analysis**: compile-gated static analyzer with an append-only log
//! - **Export**: CSV sinks for conversations and reports

pub mod analysis;
pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod extract;
pub mod language;
pub mod outcome;
pub mod provider;
pub mod sandbox;

pub use analysis::{AnalysisLog, AnalysisRecord, StaticAnalysis};
pub use config::{AnalysisConfig, CodeloopConfig, EndpointConfig, RepairConfig, SessionConfig};
pub use conversation::Conversation;
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use extract::{code_or_raw, extract, extract_code};
pub use language::{Language, Stage, Toolchain};
pub use outcome::ExecutionOutcome;
pub use provider::{
    ChatMessage, ChatTransport, CompletionRequest, HttpChatClient, ProviderError, ResponseShape,
    Role, SamplingOptions,
};
pub use sandbox::{
    CodeCheck, LaunchResult, ProcessLauncher, ProcessOutput, Sandbox, TokioLauncher,
};
