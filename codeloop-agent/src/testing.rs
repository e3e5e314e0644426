//! Scripted stand-ins for the model and the sandbox

use codeloop_core::{
    ChatTransport, CodeCheck, CompletionRequest, ExecutionOutcome, Language, LaunchResult,
    ProcessLauncher, ProcessOutput, ProviderError, Stage,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Replays canned replies in order; fails with a network error once empty
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedTransport {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn with_results(
        results: impl IntoIterator<Item = std::result::Result<String, ProviderError>>,
    ) -> Self {
        Self {
            replies: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
    }
}

/// Replays canned outcomes and remembers every code snapshot it was shown.
/// Repeats the last outcome once the script runs out.
pub struct ScriptedCheck {
    language: Language,
    outcomes: VecDeque<ExecutionOutcome>,
    last: ExecutionOutcome,
    pub seen: Vec<String>,
}

impl ScriptedCheck {
    pub fn new(outcomes: impl IntoIterator<Item = ExecutionOutcome>) -> Self {
        Self {
            language: Language::C,
            outcomes: outcomes.into_iter().collect(),
            last: ExecutionOutcome::Success,
            seen: Vec::new(),
        }
    }

    pub fn always(outcome: ExecutionOutcome) -> Self {
        let mut check = Self::new([]);
        check.last = outcome;
        check
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

impl CodeCheck for ScriptedCheck {
    fn language(&self) -> Language {
        self.language
    }

    fn stage(&self) -> Stage {
        match self.language {
            Language::C => Stage::Compile,
            Language::Python => Stage::Execute,
        }
    }

    async fn check(&mut self, code: &str) -> ExecutionOutcome {
        self.seen.push(code.to_string());
        if code.trim().is_empty() {
            return ExecutionOutcome::NoCodeFound;
        }
        if let Some(next) = self.outcomes.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}

pub fn compile_error(text: &str) -> ExecutionOutcome {
    ExecutionOutcome::CompileError(text.to_string())
}

pub fn fenced(code: &str) -> String {
    format!("Here you go:\n```c\n{}\n```\nLet me know.", code)
}

/// Every toolchain run finishes with the same stderr
pub struct FixedLauncher(pub &'static str);

impl ProcessLauncher for FixedLauncher {
    async fn launch(
        &self,
        _program: &str,
        _args: &[String],
        _workdir: &Path,
        _timeout: Duration,
    ) -> codeloop_core::Result<LaunchResult> {
        Ok(LaunchResult::Finished(ProcessOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: self.0.to_string(),
        }))
    }
}
