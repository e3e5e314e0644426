//! # Codeloop Agent
//!
//! Agents that talk to models, and the loop that keeps them honest:
//! 1. A coding agent asks the model for a solution
//! 2. The code is extracted and checked in a sandbox
//! 3. On failure the repair loop tells the model what went wrong
//! 4. Repeat until the check passes or the trial budget runs out
//! 5. The orchestrator passes results between designer, programmer and human
//!
//! Every failure below the orchestrator is data, never a panic.

mod agent;
mod chat;
mod coding;
mod fixer;
mod human;
mod orchestrator;
mod repair;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentRole, ModelSettings};
pub use chat::ChatAgent;
pub use coding::CodingAgent;
pub use fixer::{AnalyzerAgent, FixerAgent};
pub use human::HumanAgent;
pub use orchestrator::{Orchestrator, TurnRecord};
pub use repair::{repair_prompt, RepairLoop, RepairReport};
