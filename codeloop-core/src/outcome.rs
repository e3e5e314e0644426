//! Result of one sandboxed check

use std::fmt;

/// What happened when generated code was built, run or analyzed.
///
/// Drives the repair loop: anything but `Success` earns another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    CompileError(String),
    RuntimeError(String),
    Timeout,
    /// Extraction produced nothing; no process was started
    NoCodeFound,
    /// The static analyzer reported diagnostics
    AnalysisFindings(String),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    /// Short tag for logs and exported tables
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::CompileError(_) => "compile_error",
            ExecutionOutcome::RuntimeError(_) => "runtime_error",
            ExecutionOutcome::Timeout => "timeout",
            ExecutionOutcome::NoCodeFound => "no_code_found",
            ExecutionOutcome::AnalysisFindings(_) => "analysis_findings",
        }
    }

    /// Diagnostic text captured from the toolchain, if any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::CompileError(text)
            | ExecutionOutcome::RuntimeError(text)
            | ExecutionOutcome::AnalysisFindings(text) => Some(text),
            _ => None,
        }
    }
}

/// Human-readable description, embedded in repair prompts
impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Success => write!(f, "Compilation successful"),
            ExecutionOutcome::CompileError(text) => write!(f, "Compilation error: {}", text),
            ExecutionOutcome::RuntimeError(text) => write!(f, "Interpretation error: {}", text),
            ExecutionOutcome::Timeout => write!(f, "Timeout"),
            ExecutionOutcome::NoCodeFound => write!(f, "No code found"),
            ExecutionOutcome::AnalysisFindings(text) => {
                write!(f, "Static Analyzer Issue: {}", text)
            }
        }
    }
}
