//! Programmer seat: generate, check, repair

use crate::agent::{Agent, AgentRole, ModelSettings};
use crate::repair::{RepairLoop, RepairReport};
use codeloop_core::{extract_code, ChatTransport, CodeCheck, Conversation};
use tracing::{info, warn};

/// Asks for a solution, then runs it through the repair loop.
///
/// The main conversation receives the prompt and the final result only. The
/// raw model reply and every repair exchange stay out of it.
pub struct CodingAgent<T: ChatTransport, C: CodeCheck> {
    transport: T,
    settings: ModelSettings,
    conversation: Conversation,
    repair: RepairLoop<C>,
    last_report: Option<RepairReport>,
}

impl<T: ChatTransport, C: CodeCheck> CodingAgent<T, C> {
    pub fn new(transport: T, settings: ModelSettings, repair: RepairLoop<C>) -> Self {
        let conversation = Conversation::new(settings.system_prompt.clone());
        Self {
            transport,
            settings,
            conversation,
            repair,
            last_report: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn repair_loop(&self) -> &RepairLoop<C> {
        &self.repair
    }

    /// Report of the most recent `respond`
    pub fn last_report(&self) -> Option<&RepairReport> {
        self.last_report.as_ref()
    }
}

impl<T: ChatTransport, C: CodeCheck> Agent for CodingAgent<T, C> {
    fn role(&self) -> AgentRole {
        AgentRole::Programmer
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn respond(&mut self, prompt: &str) -> String {
        self.conversation.push_user(prompt);
        let request = self
            .conversation
            .request(&self.settings.model, self.settings.options);

        let code = match self.transport.respond(&request).await {
            Some(reply) => extract_code(&reply, self.repair.language()),
            None => {
                warn!("no solution from model, repairing from empty code");
                String::new()
            }
        };

        let report = self.repair.run(&self.transport, code).await;
        info!(
            fixed = report.is_fixed(),
            attempts = report.attempts(),
            "programmer turn finished"
        );

        let result = report.to_string();
        self.conversation.push_assistant(result.clone());
        self.last_report = Some(report);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile_error, fenced, ScriptedCheck, ScriptedTransport};
    use codeloop_core::{ExecutionOutcome, Role};

    fn programmer(
        transport: ScriptedTransport,
        check: ScriptedCheck,
        budget: usize,
    ) -> CodingAgent<ScriptedTransport, ScriptedCheck> {
        CodingAgent::new(
            transport,
            ModelSettings::new("llama3.2:3b", "You are a C Programmer."),
            RepairLoop::new(check, "You are a C Programmer.", budget),
        )
    }

    #[tokio::test]
    async fn test_clean_solution_is_returned_as_code() {
        let transport = ScriptedTransport::replying([fenced("int main(){return 0;}")]);
        let mut agent = programmer(transport, ScriptedCheck::new([ExecutionOutcome::Success]), 3);

        let result = agent.respond("Write a program that exits with 0").await;

        assert_eq!(result, "int main(){return 0;}");
        assert_eq!(agent.last_report().unwrap().attempts(), 0);
        assert_eq!(agent.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_main_conversation_gets_one_entry_per_call() {
        let transport = ScriptedTransport::replying([
            fenced("int main(){return 0}"),
            fenced("int main(){return 0}"),
            fenced("int main(){return 0}"),
        ]);
        let check = ScriptedCheck::always(compile_error("error: expected ';'"));
        let mut agent = programmer(transport, check, 2);

        let result = agent.respond("Write a program").await;

        assert!(result.starts_with("Compilation failed after 2 attempts."));
        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, result);
        assert_eq!(agent.repair_loop().conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_no_solution_still_enters_repair() {
        let transport = ScriptedTransport::with_results([
            Err(codeloop_core::ProviderError::Timeout),
            Err(codeloop_core::ProviderError::Timeout),
            Err(codeloop_core::ProviderError::Timeout),
            Ok(fenced("int main(){return 0;}")),
        ]);
        let mut agent = programmer(transport, ScriptedCheck::new([ExecutionOutcome::Success]), 3);

        let result = agent.respond("Write a program").await;

        assert_eq!(result, "int main(){return 0;}");
        assert_eq!(agent.last_report().unwrap().attempts(), 1);
    }
}
