//! # Configuration
//!
//! Everything is optional: a missing file, section or field falls back to the
//! defaults below. Files are TOML.
//!
//! ```toml
//! [programmer]
//! url = "http://localhost:11434/api/chat"
//! model = "deepseek-r1:14b"
//! max_tokens = 16000
//!
//! [repair]
//! language = "python"
//! trial_budget = 5
//! ```

use crate::language::Language;
use crate::provider::{ResponseShape, SamplingOptions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "codeloop.toml";

/// Persona of the repair-scoped conversation
pub const DEFAULT_REPAIR_PERSONA: &str =
    "You are a {language} Programmer. You solve problems with {language} programs, no comments or explanations. ";

/// Persona of the designer seat
pub const DEFAULT_DESIGNER_PERSONA: &str = "You are an experienced {language} software designer. \
You must help the programmer to solve their task. You respond with suggestions, not solutions.";

/// Persona of the programmer seat
pub const DEFAULT_PROGRAMMER_PERSONA: &str = "You are an experienced {language} programmer. \
You must solve the task given by the designer and follow the instructions from the designer. \
You respond with solutions, not suggestions, with the code in a ```{fence} markdown code block.";

/// Replace `{language}` and `{fence}` in a persona template
pub fn fill_persona(template: &str, language: Language) -> String {
    let fence = language.fence_tags().first().copied().unwrap_or_default();
    template
        .replace("{language}", language.display_name())
        .replace("{fence}", fence)
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeloopConfig {
    pub designer: EndpointConfig,
    pub programmer: EndpointConfig,
    pub fixer: EndpointConfig,
    pub repair: RepairConfig,
    pub analysis: AnalysisConfig,
    pub session: SessionConfig,
}

impl Default for CodeloopConfig {
    fn default() -> Self {
        Self {
            designer: EndpointConfig::default().with_system_prompt(DEFAULT_DESIGNER_PERSONA),
            programmer: EndpointConfig::default().with_system_prompt(DEFAULT_PROGRAMMER_PERSONA),
            fixer: EndpointConfig::default(),
            repair: RepairConfig::default(),
            analysis: AnalysisConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl CodeloopConfig {
    /// Designer system message; the default persona when none is configured
    pub fn designer_persona(&self) -> String {
        self.seat_persona(&self.designer, DEFAULT_DESIGNER_PERSONA)
    }

    /// Programmer system message; the default persona when none is configured
    pub fn programmer_persona(&self) -> String {
        self.seat_persona(&self.programmer, DEFAULT_PROGRAMMER_PERSONA)
    }

    fn seat_persona(&self, endpoint: &EndpointConfig, fallback: &str) -> String {
        let template = if endpoint.system_prompt.trim().is_empty() {
            fallback
        } else {
            &endpoint.system_prompt
        };
        fill_persona(template, self.repair.language)
    }

    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| {
            Error::config_invalid(e.to_string()).with_operation("config::from_toml")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    /// Load `path` if given, else `./codeloop.toml` if present, else defaults
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    tracing::debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repair.trial_budget == 0 {
            return Err(Error::config_invalid("repair.trial_budget must be at least 1"));
        }
        if self.analysis.trial_budget == 0 {
            return Err(Error::config_invalid("analysis.trial_budget must be at least 1"));
        }
        for (name, endpoint) in [
            ("designer", &self.designer),
            ("programmer", &self.programmer),
            ("fixer", &self.fixer),
        ] {
            if endpoint.url.is_empty() || endpoint.model.is_empty() {
                return Err(Error::config_invalid("endpoint needs both url and model")
                    .with_context("endpoint", name));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// One chat backend plus the persona and sampling used against it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URL of the chat endpoint
    pub url: String,
    pub model: String,
    pub response_shape: ResponseShape,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub timeout_secs: u64,
    pub timeout_retries: usize,
    /// Environment variable holding the bearer credential
    pub api_key_env: String,
    /// System message that opens this agent's conversation
    pub system_prompt: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::ollama("http://localhost:11434/api/chat", "llama3.2:3b")
    }
}

impl EndpointConfig {
    pub fn ollama(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            model: model.into(),
            response_shape: ResponseShape::Ollama,
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: 300,
            timeout_retries: crate::provider::DEFAULT_TIMEOUT_RETRIES,
            api_key_env: "OPENAI_API_KEY".into(),
            system_prompt: String::new(),
        }
    }

    pub fn openai(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            response_shape: ResponseShape::OpenAI,
            ..Self::ollama(url, model)
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    /// The bearer credential, if the configured variable is set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

// ============================================================================
// Repair / analysis / session
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub language: Language,
    /// Maximum repair attempts per invocation
    pub trial_budget: usize,
    /// Repair persona; `{language}` is replaced by the language name
    pub persona: String,
    /// Applies to compilation and interpretation alike
    pub run_timeout_secs: u64,
    /// Scratch directory; a private temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            language: Language::C,
            trial_budget: 3,
            persona: DEFAULT_REPAIR_PERSONA.into(),
            run_timeout_secs: 10,
            scratch_dir: None,
        }
    }
}

impl RepairConfig {
    pub fn persona_for(&self, language: Language) -> String {
        fill_persona(&self.persona, language)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    pub trial_budget: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trial_budget: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rounds after the opening exchange
    pub rounds: usize,
    pub human_in_loop: bool,
    /// Where the human agent writes each prompt before asking
    pub human_prompt_file: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            human_in_loop: false,
            human_prompt_file: PathBuf::from("human_prompt.txt"),
            export_dir: PathBuf::from("results"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodeloopConfig::default();
        assert_eq!(config.repair.trial_budget, 3);
        assert_eq!(config.repair.run_timeout_secs, 10);
        assert_eq!(config.programmer.timeout_secs, 300);
        assert_eq!(config.programmer.response_shape, ResponseShape::Ollama);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = CodeloopConfig::from_toml(
            r#"
            [programmer]
            url = "http://lazythought:8000/v1/chat/completions"
            model = "deepseek-r1:14b"
            response_shape = "openai"
            max_tokens = 16000

            [repair]
            language = "python"
            trial_budget = 5

            [session]
            human_in_loop = true
            "#,
        )
        .unwrap();

        assert_eq!(config.programmer.model, "deepseek-r1:14b");
        assert_eq!(config.programmer.response_shape, ResponseShape::OpenAI);
        assert_eq!(config.programmer.sampling().max_tokens, Some(16000));
        assert_eq!(config.programmer.timeout_secs, 300);
        assert_eq!(config.repair.language, Language::Python);
        assert_eq!(config.repair.trial_budget, 5);
        assert!(config.session.human_in_loop);
        assert_eq!(config.session.rounds, 3);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = CodeloopConfig::from_toml("[repair]\ntrial_budget = 0\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_bad_toml() {
        let err = CodeloopConfig::from_toml("[repair\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CodeloopConfig::load("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::FileNotFound);
    }

    #[test]
    fn test_persona_substitution() {
        let repair = RepairConfig::default();
        assert_eq!(
            repair.persona_for(Language::Python),
            "You are a Python Programmer. You solve problems with Python programs, no comments or explanations. "
        );
    }

    #[test]
    fn test_default_seat_personas() {
        let config = CodeloopConfig::default();
        let designer = config.designer_persona();
        let programmer = config.programmer_persona();

        assert!(!designer.is_empty());
        assert!(!programmer.is_empty());
        assert_ne!(designer, programmer);
        assert!(designer.starts_with("You are an experienced C software designer."));
        assert!(designer.ends_with("You respond with suggestions, not solutions."));
        assert!(programmer.contains("```c markdown code block"));
        assert!(!config.designer.system_prompt.is_empty());
    }

    #[test]
    fn test_seat_personas_follow_language() {
        // a [designer] section without system_prompt still gets a persona
        let config = CodeloopConfig::from_toml(
            r#"
            [designer]
            model = "llama3.2:1b"

            [programmer]
            system_prompt = "You write {language} only."

            [repair]
            language = "python"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.designer_persona(),
            "You are an experienced Python software designer. You must help the programmer \
             to solve their task. You respond with suggestions, not solutions."
        );
        assert_eq!(config.programmer_persona(), "You write Python only.");
    }

    #[test]
    fn test_api_key_from_env() {
        let endpoint = EndpointConfig::default().with_api_key_env("CODELOOP_TEST_KEY_UNSET_1");
        assert_eq!(endpoint.api_key(), None);
    }
}
