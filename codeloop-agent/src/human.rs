//! Human seat: the same contract as a model, answered from a console

use crate::agent::{Agent, AgentRole};
use codeloop_core::{Conversation, Error};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tracing::{debug, warn};

const BANNER: &str = "===================== HUMAN INPUT =====================";

/// Reads one line per prompt. Blocks until the line arrives; there is no
/// timeout and no retry.
pub struct HumanAgent<R, W> {
    input: R,
    output: W,
    prompt_file: Option<PathBuf>,
    conversation: Conversation,
}

impl HumanAgent<BufReader<Stdin>, Stdout> {
    /// Prompts on stdout, answers from stdin
    pub fn console() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> HumanAgent<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            prompt_file: None,
            conversation: Conversation::default(),
        }
    }

    /// Write each prompt to `path` before asking
    pub fn with_prompt_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_file = Some(path.into());
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    async fn persist_prompt(path: &Path, prompt: &str) {
        if let Err(e) = tokio::fs::write(path, prompt).await {
            let err = Error::from(e)
                .with_operation("human::persist_prompt")
                .with_context("path", path.display().to_string());
            warn!(error = %err, "could not save human prompt");
        }
    }

    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let text = format!("\n{BANNER}\n{prompt}\n\nYour response (one line): ");
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R, W> Agent for HumanAgent<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn role(&self) -> AgentRole {
        AgentRole::Human
    }

    fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    async fn respond(&mut self, prompt: &str) -> String {
        if let Some(path) = &self.prompt_file {
            Self::persist_prompt(path, prompt).await;
        }
        self.conversation.push_user(prompt);

        let reply = match self.ask(prompt).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                warn!("input closed, answering with empty text");
                String::new()
            }
            Err(e) => {
                let err = Error::from(e).with_operation("human::respond");
                warn!(error = %err, "could not read human input");
                String::new()
            }
        };

        debug!(chars = reply.len(), "human replied");
        self.conversation.push_assistant(reply.clone());
        reply
    }
}
