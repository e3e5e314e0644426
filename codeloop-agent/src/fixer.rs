//! Compiler-fixer and analyzer seats.
//!
//! Both take code that already exists, either fenced or raw, and only run
//! the repair loop on it. They never ask for a fresh solution.

use crate::agent::{Agent, AgentRole};
use crate::repair::{RepairLoop, RepairReport};
use codeloop_core::{
    code_or_raw, ChatTransport, CodeCheck, Conversation, ProcessLauncher, Result, StaticAnalysis,
    TokioLauncher,
};
use std::path::Path;
use tracing::{info, warn};

/// Repairs the code it is handed until the check passes
pub struct FixerAgent<T: ChatTransport, C: CodeCheck> {
    role: AgentRole,
    transport: T,
    conversation: Conversation,
    repair: RepairLoop<C>,
    last_report: Option<RepairReport>,
}

/// A fixer whose check is the compile gate plus the static analyzer
pub type AnalyzerAgent<T, L = TokioLauncher> = FixerAgent<T, StaticAnalysis<L>>;

impl<T: ChatTransport, C: CodeCheck> FixerAgent<T, C> {
    pub fn new(transport: T, repair: RepairLoop<C>) -> Self {
        Self {
            role: AgentRole::Fixer,
            transport,
            conversation: Conversation::default(),
            repair,
            last_report: None,
        }
    }

    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    pub fn repair_loop(&self) -> &RepairLoop<C> {
        &self.repair
    }

    pub fn last_report(&self) -> Option<&RepairReport> {
        self.last_report.as_ref()
    }
}

impl<T: ChatTransport, L: ProcessLauncher> FixerAgent<T, StaticAnalysis<L>> {
    pub fn analyzer(transport: T, repair: RepairLoop<StaticAnalysis<L>>) -> Self {
        Self::new(transport, repair).with_role(AgentRole::Analyzer)
    }

    /// Append every analysis record so far to `path`
    pub fn export_analysis(&self, path: &Path) -> Result<()> {
        let log = self.repair.check().log();
        info!(records = log.len(), path = %path.display(), "exporting analysis log");
        log.export_csv(path)
    }
}

impl<T: ChatTransport, C: CodeCheck> Agent for FixerAgent<T, C> {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn respond(&mut self, prompt: &str) -> String {
        let code = code_or_raw(prompt, self.repair.language());
        if code.is_empty() {
            warn!(role = %self.role, "nothing to check in input");
        }

        self.conversation.push_user(prompt);
        let report = self.repair.run(&self.transport, code).await;
        let result = report.to_string();
        self.conversation.push_assistant(result.clone());
        self.last_report = Some(report);
        result
    }
}
