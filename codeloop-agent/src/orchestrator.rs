//! Round sequencing between programmer, designer and an optional human

use crate::agent::{Agent, AgentRole};
use codeloop_core::export;
use codeloop_core::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One prompt/response exchange in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub iteration: usize,
    pub role: AgentRole,
    pub prompt: String,
    pub response: String,
}

fn first_review_prompt(task: &str, code: &str) -> String {
    format!("Here is my solution to this problem {task}, how can I improve it: {code}?")
}

fn review_prompt(code: &str) -> String {
    format!("Here is my solution, how can I improve it {code}?")
}

fn human_prompt(iteration: usize, code: &str) -> String {
    format!(
        "Iteration {iteration}: Here is the latest suggestion from the programmer: {code}. \
         Please provide your feedback or improvements."
    )
}

fn revision_prompt(design: &str, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) => format!(
            "For your program, the designer suggested: {design}. \n The human provided feedback: \
             {feedback}. Address these points in your next solution."
        ),
        None => format!(
            "For your program, the designer suggested: {design}. Address these points in your next solution."
        ),
    }
}

async fn take_turn<A: Agent>(
    agent: &mut A,
    log: &mut Vec<TurnRecord>,
    iteration: usize,
    prompt: String,
) -> String {
    let response = agent.respond(&prompt).await;
    info!(iteration, role = %agent.role(), chars = response.len(), "turn finished");
    log.push(TurnRecord {
        iteration,
        role: agent.role(),
        prompt,
        response: response.clone(),
    });
    response
}

/// Drives a fixed number of programmer/designer rounds.
///
/// Round 0 hands the task to the programmer and its answer to the designer.
/// Each later round feeds the designer's suggestion (and the human's
/// feedback, if a human takes part) back to the programmer.
pub struct Orchestrator<P: Agent, D: Agent, H: Agent> {
    programmer: P,
    designer: D,
    human: Option<H>,
    rounds: usize,
    log: Vec<TurnRecord>,
    export_path: Option<PathBuf>,
}

impl<P: Agent, D: Agent, H: Agent> Orchestrator<P, D, H> {
    pub fn new(programmer: P, designer: D, human: Option<H>) -> Self {
        Self {
            programmer,
            designer,
            human,
            rounds: 3,
            log: Vec::new(),
            export_path: None,
        }
    }

    /// Rounds after the opening exchange
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Rewrite the turn log to `path` after every round
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn log(&self) -> &[TurnRecord] {
        &self.log
    }

    pub fn programmer(&self) -> &P {
        &self.programmer
    }

    pub fn designer(&self) -> &D {
        &self.designer
    }

    /// Run the whole session and return the programmer's final answer
    pub async fn run(&mut self, task: &str) -> String {
        info!(rounds = self.rounds, human = self.human.is_some(), "session started");

        let mut code = take_turn(&mut self.programmer, &mut self.log, 0, task.to_string()).await;
        let mut design = take_turn(
            &mut self.designer,
            &mut self.log,
            0,
            first_review_prompt(task, &code),
        )
        .await;
        let mut feedback = self.ask_human(0, &code).await;
        self.checkpoint();

        for iteration in 1..=self.rounds {
            let prompt = revision_prompt(&design, feedback.as_deref());
            code = take_turn(&mut self.programmer, &mut self.log, iteration, prompt).await;
            design = take_turn(&mut self.designer, &mut self.log, iteration, review_prompt(&code)).await;
            feedback = self.ask_human(iteration, &code).await;
            self.checkpoint();
        }

        info!(turns = self.log.len(), "session finished");
        code
    }

    async fn ask_human(&mut self, iteration: usize, code: &str) -> Option<String> {
        let human = self.human.as_mut()?;
        Some(take_turn(human, &mut self.log, iteration, human_prompt(iteration, code)).await)
    }

    fn checkpoint(&self) {
        if let Some(path) = &self.export_path {
            if let Err(e) = self.export_log(path) {
                warn!(error = %e, "could not export turn log");
            }
        }
    }

    /// Write the turn log as `iteration,role,prompt,response`, replacing `path`
    pub fn export_log(&self, path: &Path) -> Result<()> {
        let rows: Vec<Vec<String>> = self
            .log
            .iter()
            .map(|t| {
                vec![
                    t.iteration.to_string(),
                    t.role.to_string(),
                    t.prompt.clone(),
                    t.response.clone(),
                ]
            })
            .collect();
        export::write_csv(path, &["iteration", "role", "prompt", "response"], &rows)
    }
}
