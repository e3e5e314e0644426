//! Plain conversational agent, used for the designer seat

use crate::agent::{Agent, AgentRole, ModelSettings};
use codeloop_core::{ChatTransport, Conversation};
use tracing::warn;

/// Appends the prompt, replays the ledger, appends the reply
pub struct ChatAgent<T: ChatTransport> {
    role: AgentRole,
    transport: T,
    settings: ModelSettings,
    conversation: Conversation,
}

impl<T: ChatTransport> ChatAgent<T> {
    pub fn new(role: AgentRole, transport: T, settings: ModelSettings) -> Self {
        let conversation = Conversation::new(settings.system_prompt.clone());
        Self {
            role,
            transport,
            settings,
            conversation,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ChatTransport> Agent for ChatAgent<T> {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn respond(&mut self, prompt: &str) -> String {
        self.conversation.push_user(prompt);
        let request = self
            .conversation
            .request(&self.settings.model, self.settings.options);

        match self.transport.respond(&request).await {
            Some(reply) => {
                self.conversation.push_assistant(reply.clone());
                reply
            }
            None => {
                warn!(role = %self.role, "no reply, answering with empty text");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use codeloop_core::Role;

    fn designer(transport: ScriptedTransport) -> ChatAgent<ScriptedTransport> {
        ChatAgent::new(
            AgentRole::Designer,
            transport,
            ModelSettings::new("llama3.2:3b", "You are a software designer."),
        )
    }

    #[tokio::test]
    async fn test_reply_is_appended() {
        let mut agent = designer(ScriptedTransport::replying(["Use a hash map."]));

        let reply = agent.respond("How can I improve this?").await;

        assert_eq!(reply, "Use a hash map.");
        let roles: Vec<Role> = agent.conversation().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_ledger_is_replayed() {
        let mut agent = designer(ScriptedTransport::replying(["one", "two"]));

        agent.respond("first").await;
        agent.respond("second").await;

        let requests = agent.transport().requests();
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[2].content, "one");
    }

    #[tokio::test]
    async fn test_transport_failure_is_empty_reply() {
        let mut agent = designer(ScriptedTransport::default());

        assert_eq!(agent.respond("anyone there?").await, "");
        // prompt stays, no assistant entry
        assert_eq!(agent.conversation().len(), 2);
        assert_eq!(agent.conversation().last().unwrap().role, Role::User);
    }
}
