//! The compile-repair loop.
//!
//! `Running(attempt)` is the body of a `while` over the current outcome:
//! prompt with the code and what went wrong, ask, re-extract, re-check.
//! It ends on the first `Success` or once `attempt == budget`.
//!
//! The loop talks through its own repair-scoped conversation. That ledger is
//! cut back to its single persona message when an invocation starts and again
//! when it ends, so two independent problems never see each other.

use codeloop_core::{
    extract_code, ChatTransport, CodeCheck, Conversation, ExecutionOutcome, SamplingOptions, Stage,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Prompt asking the model to fix `code` given what the check at `stage` reported
pub fn repair_prompt(
    code: &str,
    outcome: &ExecutionOutcome,
    stage: Stage,
    language: &str,
) -> String {
    let problem = match stage {
        Stage::Compile => "compilation error",
        Stage::Execute => "interpretation error",
        Stage::Analyze => "static analyzer issue",
    };
    format!(
        "For this program {code}, I got the following {problem}: {outcome}. \
         Please fix the code and return the fixed code in a ```{language} markdown code block."
    )
}

/// How a repair invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairReport {
    /// The check passed; `attempts` is 0 when the first draft was fine
    Fixed { code: String, attempts: usize },
    /// The budget ran out with the check still failing
    Exhausted {
        code: String,
        outcome: ExecutionOutcome,
        attempts: usize,
        stage: Stage,
    },
}

impl RepairReport {
    pub fn is_fixed(&self) -> bool {
        matches!(self, RepairReport::Fixed { .. })
    }

    /// The last code snapshot
    pub fn code(&self) -> &str {
        match self {
            RepairReport::Fixed { code, .. } | RepairReport::Exhausted { code, .. } => code,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            RepairReport::Fixed { attempts, .. } | RepairReport::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// `Success` for fixed code, otherwise the last failing outcome
    pub fn outcome(&self) -> ExecutionOutcome {
        match self {
            RepairReport::Fixed { .. } => ExecutionOutcome::Success,
            RepairReport::Exhausted { outcome, .. } => outcome.clone(),
        }
    }
}

/// The code alone when fixed, a one-line failure report otherwise
impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairReport::Fixed { code, .. } => write!(f, "{}", code),
            RepairReport::Exhausted {
                code,
                outcome,
                attempts,
                stage,
            } => write!(
                f,
                "{} failed after {} attempts. Code: {}, the last error was: {}",
                stage.subject(),
                attempts,
                code,
                outcome
            ),
        }
    }
}

/// Bounded repair of one code snapshot against one check
pub struct RepairLoop<C: CodeCheck> {
    check: C,
    budget: usize,
    model: String,
    options: SamplingOptions,
    conversation: Conversation,
}

impl<C: CodeCheck> RepairLoop<C> {
    pub fn new(check: C, persona: impl Into<String>, budget: usize) -> Self {
        Self {
            check,
            budget,
            model: String::new(),
            options: SamplingOptions::default(),
            conversation: Conversation::new(persona),
        }
    }

    /// Model and sampling used for repair requests
    pub fn with_model(mut self, model: impl Into<String>, options: SamplingOptions) -> Self {
        self.model = model.into();
        self.options = options;
        self
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn check(&self) -> &C {
        &self.check
    }

    pub fn check_mut(&mut self) -> &mut C {
        &mut self.check
    }

    pub fn language(&self) -> codeloop_core::Language {
        self.check.language()
    }

    /// The repair-scoped ledger; only the persona message between invocations
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Check `code` once, then repair it if needed
    pub async fn run<T: ChatTransport>(&mut self, transport: &T, code: String) -> RepairReport {
        let outcome = self.check.check(&code).await;
        self.repair(transport, code, outcome).await
    }

    /// Repair starting from a code snapshot whose outcome is already known
    pub async fn repair<T: ChatTransport>(
        &mut self,
        transport: &T,
        code: String,
        outcome: ExecutionOutcome,
    ) -> RepairReport {
        self.conversation.reset();

        let language = self.check.language();
        let tag = language.fence_tags().first().copied().unwrap_or("c");
        let stage = self.check.stage();
        let mut code = code;
        let mut outcome = outcome;
        let mut attempt = 0;

        if !outcome.is_success() {
            info!(
                language = %language,
                budget = self.budget,
                outcome = outcome.label(),
                "starting repair loop"
            );
        }

        while !outcome.is_success() && attempt < self.budget {
            self.conversation.push_user(repair_prompt(&code, &outcome, stage, tag));
            let request = self.conversation.request(&self.model, self.options);

            match transport.respond(&request).await {
                Some(reply) => {
                    code = extract_code(&reply, language);
                    self.conversation.push_assistant(reply);
                    outcome = self.check.check(&code).await;
                }
                None => {
                    warn!(attempt = attempt + 1, "no repair reply, keeping previous code");
                }
            }

            attempt += 1;
            debug!(attempt, budget = self.budget, outcome = outcome.label(), "repair attempt");
        }

        self.conversation.reset();

        if outcome.is_success() {
            if attempt > 0 {
                info!(attempts = attempt, "repair succeeded");
            }
            RepairReport::Fixed {
                code,
                attempts: attempt,
            }
        } else {
            warn!(attempts = attempt, outcome = outcome.label(), "repair budget exhausted");
            RepairReport::Exhausted {
                code,
                outcome,
                attempts: attempt,
                stage,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile_error, fenced, ScriptedCheck, ScriptedTransport};
    use codeloop_core::{Language, ProviderError, Role};

    const PERSONA: &str = "You are a C Programmer.";

    #[tokio::test]
    async fn test_first_success_needs_no_repair() {
        let transport = ScriptedTransport::default();
        let mut repair = RepairLoop::new(ScriptedCheck::new([ExecutionOutcome::Success]), PERSONA, 3);

        let report = repair.run(&transport, "int main(){return 0;}".into()).await;

        assert_eq!(
            report,
            RepairReport::Fixed {
                code: "int main(){return 0;}".into(),
                attempts: 0
            }
        );
        assert_eq!(transport.calls(), 0);
        assert_eq!(report.to_string(), "int main(){return 0;}");
    }

    #[tokio::test]
    async fn test_exhausts_after_budget() {
        let transport = ScriptedTransport::replying([
            fenced("int main(){return 1}"),
            fenced("int main(){return 2}"),
            fenced("int main(){return 3}"),
        ]);
        let check = ScriptedCheck::always(compile_error("error: expected ';'"));
        let mut repair = RepairLoop::new(check, PERSONA, 3);

        let report = repair.run(&transport, "int main(){return 0}".into()).await;

        assert_eq!(report.attempts(), 3);
        assert!(!report.is_fixed());
        assert_eq!(report.code(), "int main(){return 3}");
        assert_eq!(transport.calls(), 3);
        // initial check plus one per attempt
        assert_eq!(repair.check().seen.len(), 4);
        assert_eq!(
            report.to_string(),
            "Compilation failed after 3 attempts. Code: int main(){return 3}, \
             the last error was: Compilation error: error: expected ';'"
        );
    }

    #[tokio::test]
    async fn test_fixed_on_second_attempt() {
        let transport = ScriptedTransport::replying([
            fenced("int main(){return 0"),
            fenced("int main(){return 0;}"),
        ]);
        let check = ScriptedCheck::new([
            compile_error("error: expected ';'"),
            compile_error("error: expected '}'"),
            ExecutionOutcome::Success,
        ]);
        let mut repair = RepairLoop::new(check, PERSONA, 5);

        let report = repair.run(&transport, "int main(){return 0}".into()).await;

        assert_eq!(
            report,
            RepairReport::Fixed {
                code: "int main(){return 0;}".into(),
                attempts: 2
            }
        );
    }

    #[tokio::test]
    async fn test_conversation_is_reset_between_invocations() {
        let transport = ScriptedTransport::replying([fenced("a"), fenced("b"), fenced("c")]);
        let check = ScriptedCheck::always(compile_error("error"));
        let mut repair = RepairLoop::new(check, PERSONA, 1).with_model(
            "llama3.2:3b",
            SamplingOptions {
                temperature: 0.0,
                max_tokens: None,
            },
        );

        repair.run(&transport, "x".into()).await;
        assert_eq!(repair.conversation().len(), 1);

        repair.run(&transport, "y".into()).await;
        assert_eq!(repair.conversation().len(), 1);
        assert_eq!(repair.conversation().messages()[0].role, Role::System);

        // each request carried only the persona and the current repair prompt
        for request in transport.requests() {
            assert_eq!(request.messages.len(), 2);
            assert_eq!(request.messages[0].content, PERSONA);
            assert_eq!(request.model, "llama3.2:3b");
        }
        assert!(transport.requests()[1].messages[1].content.contains("For this program y,"));
    }

    #[tokio::test]
    async fn test_transport_failure_counts_as_attempt() {
        let transport = ScriptedTransport::with_results([
            Err(ProviderError::RetriesExhausted { attempts: 3 }),
            Ok(fenced("int main(){return 0;}")),
        ]);
        let check = ScriptedCheck::new([compile_error("error: oops"), ExecutionOutcome::Success]);
        let mut repair = RepairLoop::new(check, PERSONA, 3);

        let report = repair.run(&transport, "int main(){".into()).await;

        assert_eq!(report.attempts(), 2);
        assert!(report.is_fixed());
        // the failed attempt did not re-run the check
        assert_eq!(repair.check().seen.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_extraction_becomes_no_code_found() {
        let transport = ScriptedTransport::replying(["I cannot help with that."]);
        let check = ScriptedCheck::always(compile_error("error"));
        let mut repair = RepairLoop::new(check, PERSONA, 1);

        let report = repair.run(&transport, "int main(){".into()).await;

        match report {
            RepairReport::Exhausted { code, outcome, .. } => {
                assert_eq!(code, "");
                assert_eq!(outcome, ExecutionOutcome::NoCodeFound);
            }
            other => panic!("expected exhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_repair_prompt_wording() {
        let prompt = repair_prompt(
            "print(x)",
            &ExecutionOutcome::RuntimeError("NameError".into()),
            Stage::Execute,
            "python",
        );
        assert!(prompt.starts_with("For this program print(x), I got the following interpretation error: "));
        assert!(prompt.contains("```python markdown code block"));

        let prompt = repair_prompt("int main(){", &compile_error("error"), Stage::Compile, "c");
        assert!(prompt.contains("I got the following compilation error: "));
    }

    #[tokio::test]
    async fn test_interpreted_timeout_is_not_called_a_compilation_error() {
        let transport = ScriptedTransport::replying(["no code here", "still none"]);
        let check = ScriptedCheck::always(ExecutionOutcome::Timeout).with_language(Language::Python);
        let mut repair = RepairLoop::new(check, PERSONA, 2);

        repair.run(&transport, "while True: pass".into()).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        // first prompt reports the timeout, second the missing code block
        for request in &requests {
            let prompt = &request.messages[1].content;
            assert!(prompt.contains("I got the following interpretation error: "));
            assert!(!prompt.contains("compilation error"));
            assert!(prompt.contains("```python markdown code block"));
        }
    }

    #[test]
    fn test_zero_budget_reports_without_asking() {
        let transport = ScriptedTransport::default();
        let mut repair = RepairLoop::new(ScriptedCheck::always(ExecutionOutcome::Timeout), PERSONA, 0);

        let report = tokio_test::block_on(repair.run(&transport, "while(1);".into()));

        assert_eq!(report.attempts(), 0);
        assert_eq!(report.outcome(), ExecutionOutcome::Timeout);
        assert_eq!(transport.calls(), 0);
    }
}
