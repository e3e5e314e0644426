//! # Sandbox Runner
//!
//! Writes code to a per-language scratch file and hands it to an external
//! toolchain with a timeout.
//!
//! Classification looks for the literal substring `error` in the child's
//! stderr, not at the exit status. A quiet non-zero exit counts as success
//! and a program that legitimately prints "error" counts as a failure.
//!
//! Each `Sandbox` owns its scratch directory and serializes runs on it with
//! a mutex, so concurrent callers never race on the scratch file. Children
//! run with the caller's privileges; there is no container or seccomp
//! boundary around generated code.

use crate::language::{Language, Stage, Toolchain};
use crate::outcome::ExecutionOutcome;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

/// Default wall-clock limit for one toolchain run
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured streams of a finished child
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchResult {
    Finished(ProcessOutput),
    TimedOut,
}

/// Starts toolchain processes. Swapped out in tests.
#[allow(async_fn_in_trait)]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(
        &self,
        program: &str,
        args: &[String],
        workdir: &Path,
        timeout: Duration,
    ) -> Result<LaunchResult>;
}

/// Launches real child processes through tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    async fn launch(
        &self,
        program: &str,
        args: &[String],
        workdir: &Path,
        timeout: Duration,
    ) -> Result<LaunchResult> {
        let started_at = std::time::Instant::now();
        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::toolchain_unavailable(program, format!("failed to start '{}'", program))
                    .with_operation("sandbox::launch")
                    .set_source(e)
            })?;

        // dropping the wait future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                Error::sandbox_failed(format!("failed waiting for '{}'", program))
                    .with_operation("sandbox::launch")
                    .set_source(e)
            })?,
            Err(_) => {
                tracing::debug!(program, timeout_ms = timeout.as_millis(), "toolchain timed out");
                return Ok(LaunchResult::TimedOut);
            }
        };

        tracing::debug!(
            program,
            duration_ms = started_at.elapsed().as_millis(),
            status = %output.status,
            stderr_bytes = output.stderr.len(),
            "toolchain finished"
        );

        Ok(LaunchResult::Finished(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }))
    }
}

/// Something that can judge a code snapshot
#[allow(async_fn_in_trait)]
pub trait CodeCheck {
    fn language(&self) -> Language;

    fn stage(&self) -> Stage;

    async fn check(&mut self, code: &str) -> ExecutionOutcome;
}

/// Lines of analyzer output that count as findings
pub fn meaningful_diagnostics(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with("nofile:"))
        .collect()
}

/// Turn a finished run into an outcome for the given stage
pub fn classify(stage: Stage, output: &ProcessOutput) -> ExecutionOutcome {
    match stage {
        Stage::Compile if output.stderr.contains("error") => {
            ExecutionOutcome::CompileError(output.stderr.clone())
        }
        Stage::Execute if output.stderr.contains("error") => {
            ExecutionOutcome::RuntimeError(output.stderr.clone())
        }
        Stage::Analyze if !meaningful_diagnostics(&output.stderr).is_empty() => {
            ExecutionOutcome::AnalysisFindings(output.stderr.clone())
        }
        _ => ExecutionOutcome::Success,
    }
}

/// Outcome used when the sandbox itself could not do its job
fn infrastructure_failure(stage: Stage, err: &Error) -> ExecutionOutcome {
    let text = format!("error: {}", err);
    match stage {
        Stage::Compile => ExecutionOutcome::CompileError(text),
        Stage::Execute => ExecutionOutcome::RuntimeError(text),
        Stage::Analyze => ExecutionOutcome::AnalysisFindings(text),
    }
}

enum ScratchDir {
    Owned(TempDir),
    Shared(PathBuf),
}

impl ScratchDir {
    fn path(&self) -> &Path {
        match self {
            ScratchDir::Owned(dir) => dir.path(),
            ScratchDir::Shared(path) => path,
        }
    }
}

/// Runs one toolchain against one scratch file
pub struct Sandbox<L: ProcessLauncher = TokioLauncher> {
    language: Language,
    toolchain: Toolchain,
    launcher: L,
    scratch: ScratchDir,
    timeout: Duration,
    lock: Mutex<()>,
}

impl Sandbox<TokioLauncher> {
    /// A sandbox for the language's default toolchain in a fresh temp dir
    pub fn new(language: Language) -> Result<Self> {
        Self::with_launcher(language, TokioLauncher)
    }
}

impl<L: ProcessLauncher> Sandbox<L> {
    pub fn with_launcher(language: Language, launcher: L) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("codeloop-")
            .tempdir()
            .map_err(|e| Error::from(e).with_operation("sandbox::new"))?;

        Ok(Self {
            language,
            toolchain: language.toolchain(),
            launcher,
            scratch: ScratchDir::Owned(dir),
            timeout: DEFAULT_RUN_TIMEOUT,
            lock: Mutex::new(()),
        })
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a caller-managed scratch directory instead of a private one
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::from(e)
                .with_operation("sandbox::with_scratch_dir")
                .with_context("dir", dir.display().to_string())
        })?;
        self.scratch = ScratchDir::Shared(dir);
        Ok(self)
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.scratch.path().join(self.language.scratch_file())
    }

    /// Write, launch, classify. Empty code never reaches a process.
    pub async fn run(&self, code: &str) -> ExecutionOutcome {
        if code.trim().is_empty() {
            return ExecutionOutcome::NoCodeFound;
        }

        let _guard = self.lock.lock().await;
        let stage = self.toolchain.stage;
        let source = self.scratch_path();

        if let Err(e) = tokio::fs::write(&source, code).await {
            let err = Error::from(e)
                .with_operation("sandbox::write_scratch")
                .with_context("path", source.display().to_string());
            tracing::warn!(error = %err, "could not write scratch file");
            return infrastructure_failure(stage, &err);
        }

        let args = self.toolchain.args_for(&source);
        let launched = self
            .launcher
            .launch(&self.toolchain.program, &args, self.scratch.path(), self.timeout)
            .await;

        let outcome = match launched {
            Ok(LaunchResult::Finished(output)) => classify(stage, &output),
            Ok(LaunchResult::TimedOut) => ExecutionOutcome::Timeout,
            Err(err) => {
                tracing::warn!(error = %err, "toolchain launch failed");
                infrastructure_failure(stage, &err)
            }
        };

        tracing::debug!(
            language = %self.language,
            program = %self.toolchain.program,
            outcome = outcome.label(),
            "sandbox run finished"
        );
        outcome
    }
}

impl<L: ProcessLauncher> CodeCheck for Sandbox<L> {
    fn language(&self) -> Language {
        self.language
    }

    fn stage(&self) -> Stage {
        self.toolchain.stage
    }

    async fn check(&mut self, code: &str) -> ExecutionOutcome {
        self.run(code).await
    }
}
