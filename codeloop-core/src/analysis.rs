//! Static analysis gated on a successful build.
//!
//! Code that does not compile is never handed to the analyzer. Every check
//! is recorded in an [`AnalysisLog`] that only grows.

use crate::export;
use crate::language::{Language, Stage, Toolchain};
use crate::outcome::ExecutionOutcome;
use crate::sandbox::{CodeCheck, ProcessLauncher, Sandbox, TokioLauncher};
use crate::Result;
use std::path::Path;

/// Verdict text recorded for a clean check
pub const VERDICT_CLEAN: &str = "Static Analysis successful";
/// Verdict text recorded when the analyzer complained
pub const VERDICT_ISSUE: &str = "Static Analyzer Issue";
/// Verdict text recorded when the compile gate failed
pub const VERDICT_NOT_BUILT: &str = "Compilation failed";

/// One analyzed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub code: String,
    /// Outcome description (diagnostics included)
    pub issue: String,
    pub verdict: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisLog {
    records: Vec<AnalysisRecord>,
}

impl AnalysisLog {
    pub fn push(&mut self, record: AnalysisRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append every record to `path` as `code,issue,result`
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let rows: Vec<Vec<&str>> = self
            .records
            .iter()
            .map(|r| vec![r.code.as_str(), r.issue.as_str(), r.verdict])
            .collect();
        export::append_csv(path, &["code", "issue", "result"], &rows)
    }
}

/// Compile gate followed by the analyzer
pub struct StaticAnalysis<L: ProcessLauncher = TokioLauncher> {
    compile: Sandbox<L>,
    analyzer: Sandbox<L>,
    log: AnalysisLog,
}

impl StaticAnalysis<TokioLauncher> {
    /// gcc gate plus cppcheck, each in its own scratch directory
    pub fn for_c() -> Result<Self> {
        Ok(Self::new(
            Sandbox::new(Language::C)?,
            Sandbox::new(Language::C)?.with_toolchain(Toolchain::cppcheck()),
        ))
    }
}

impl<L: ProcessLauncher> StaticAnalysis<L> {
    pub fn new(compile: Sandbox<L>, analyzer: Sandbox<L>) -> Self {
        Self {
            compile,
            analyzer,
            log: AnalysisLog::default(),
        }
    }

    pub fn log(&self) -> &AnalysisLog {
        &self.log
    }

    pub fn compile_sandbox(&self) -> &Sandbox<L> {
        &self.compile
    }

    pub fn analyzer_sandbox(&self) -> &Sandbox<L> {
        &self.analyzer
    }

    pub async fn analyze(&mut self, code: &str) -> ExecutionOutcome {
        let gate = self.compile.run(code).await;
        let (outcome, verdict) = if gate.is_success() {
            let outcome = self.analyzer.run(code).await;
            let verdict = if outcome.is_success() {
                VERDICT_CLEAN
            } else {
                VERDICT_ISSUE
            };
            (outcome, verdict)
        } else {
            tracing::debug!(outcome = gate.label(), "compile gate failed, analyzer skipped");
            (gate, VERDICT_NOT_BUILT)
        };

        self.log.push(AnalysisRecord {
            code: code.to_string(),
            issue: outcome.to_string(),
            verdict,
        });
        outcome
    }
}

impl<L: ProcessLauncher> CodeCheck for StaticAnalysis<L> {
    fn language(&self) -> Language {
        self.compile.language()
    }

    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    async fn check(&mut self, code: &str) -> ExecutionOutcome {
        self.analyze(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::testing::{stderr, CountingLauncher};

    fn analysis(compile: CountingLauncher, analyzer: CountingLauncher) -> StaticAnalysis<CountingLauncher> {
        StaticAnalysis::new(
            Sandbox::with_launcher(Language::C, compile).unwrap(),
            Sandbox::with_launcher(Language::C, analyzer)
                .unwrap()
                .with_toolchain(Toolchain::cppcheck()),
        )
    }

    #[tokio::test]
    async fn test_clean_code() {
        let mut sa = analysis(
            CountingLauncher::default(),
            CountingLauncher::replying(vec![stderr("nofile:0:0: information: too many configs\n", 0)]),
        );

        assert_eq!(sa.analyze("int main(void){return 0;}").await, ExecutionOutcome::Success);
        assert_eq!(sa.log().len(), 1);
        assert_eq!(sa.log().records()[0].verdict, VERDICT_CLEAN);
    }

    #[tokio::test]
    async fn test_compile_gate_blocks_analyzer() {
        let mut sa = analysis(
            CountingLauncher::replying(vec![stderr("error: expected ';'", 1)]),
            CountingLauncher::default(),
        );

        let outcome = sa.analyze("int main(){return 0}").await;
        assert!(matches!(outcome, ExecutionOutcome::CompileError(_)));
        assert_eq!(sa.analyzer_sandbox().launcher().spawns(), 0);
        assert_eq!(sa.log().records()[0].verdict, VERDICT_NOT_BUILT);
    }

    #[tokio::test]
    async fn test_findings_and_log_growth() {
        let finding = "code_temp.c:2:9: style: The scope of the variable 'i' can be reduced.";
        let mut sa = analysis(
            CountingLauncher::default(),
            CountingLauncher::replying(vec![stderr(finding, 0)]),
        );

        let outcome = sa.analyze("int main(){int i; return 0;}").await;
        assert_eq!(outcome, ExecutionOutcome::AnalysisFindings(finding.into()));
        assert_eq!(sa.analyze("").await, ExecutionOutcome::NoCodeFound);

        assert_eq!(sa.log().len(), 2);
        assert_eq!(sa.log().records()[0].verdict, VERDICT_ISSUE);
        assert!(sa.log().records()[0].issue.starts_with("Static Analyzer Issue: "));
    }

    #[test]
    fn test_log_export_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.csv");
        let mut log = AnalysisLog::default();
        log.push(AnalysisRecord {
            code: "int x;".into(),
            issue: "Compilation successful".into(),
            verdict: VERDICT_CLEAN,
        });

        log.export_csv(&path).unwrap();
        log.export_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("code,issue,result\n"));
    }
}
