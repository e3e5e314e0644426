//! Languages and the external toolchains that build or run them

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A language the agents can generate and check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    C,
    Python,
}

impl Language {
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Python => "Python",
        }
    }

    /// Fence tags tried in order by the extractor
    pub fn fence_tags(&self) -> &'static [&'static str] {
        match self {
            Language::C => &["c"],
            // models often label Python blocks as markdown
            Language::Python => &["python", "markdown"],
        }
    }

    pub fn fence_case_insensitive(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Scratch source file name inside the sandbox directory
    pub fn scratch_file(&self) -> &'static str {
        match self {
            Language::C => "code_temp.c",
            Language::Python => "code_temp.py",
        }
    }

    /// The toolchain that decides whether generated code is acceptable
    pub fn toolchain(&self) -> Toolchain {
        match self {
            Language::C => Toolchain::gcc(),
            Language::Python => Toolchain::python3(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What a toolchain run proves about the code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Builds it; failures are compile errors
    Compile,
    /// Runs it; failures are runtime errors
    Execute,
    /// Lints it; findings are analysis failures
    Analyze,
}

impl Stage {
    /// Subject of the failure report, e.g. "Compilation failed after 3 attempts"
    pub fn subject(&self) -> &'static str {
        match self {
            Stage::Compile => "Compilation",
            Stage::Execute => "Interpretation",
            Stage::Analyze => "Static analysis",
        }
    }
}

/// An external program invoked as `[program, leading.., source, trailing..]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub program: String,
    pub leading_args: Vec<String>,
    pub trailing_args: Vec<String>,
    pub stage: Stage,
}

impl Toolchain {
    pub fn new(program: impl Into<String>, stage: Stage) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            trailing_args: Vec::new(),
            stage,
        }
    }

    pub fn with_leading(mut self, args: &[&str]) -> Self {
        self.leading_args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn with_trailing(mut self, args: &[&str]) -> Self {
        self.trailing_args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    /// `gcc -w <src> -o a.out -lm`
    pub fn gcc() -> Self {
        Self::new("gcc", Stage::Compile)
            .with_leading(&["-w"])
            .with_trailing(&["-o", "a.out", "-lm"])
    }

    /// `python3 <src>`
    pub fn python3() -> Self {
        Self::new("python3", Stage::Execute)
    }

    /// `cppcheck --enable=all --std=c11 --quiet --suppress=missingIncludeSystem <src>`
    pub fn cppcheck() -> Self {
        Self::new("cppcheck", Stage::Analyze).with_leading(&[
            "--enable=all",
            "--std=c11",
            "--quiet",
            "--suppress=missingIncludeSystem",
        ])
    }

    /// Arguments following the program name
    pub fn args_for(&self, source: &Path) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(source.display().to_string());
        args.extend(self.trailing_args.iter().cloned());
        args
    }
}
