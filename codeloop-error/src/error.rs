//! The error value passed around every codeloop crate

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// A failure with enough attached to act on it and to find where it came from.
///
/// `status` starts out as `Temporary` for retryable kinds and `Permanent` for
/// the rest. `operation` names the innermost step that failed; wrapping it in
/// another operation pushes the old name into `context` under `called`.
///
/// ```rust
/// use codeloop_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::TransportTimeout, "no reply within 300s")
///     .with_operation("transport::send")
///     .with_context("model", "llama3.2:3b");
///
/// assert!(err.is_retryable());
/// assert_eq!(err.persist().is_retryable(), false);
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: if kind.is_retryable() {
                ErrorStatus::Temporary
            } else {
                ErrorStatus::Permanent
            },
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Innermost failing step, empty when never set
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn temporary(self) -> Self {
        self.with_status(ErrorStatus::Temporary)
    }

    pub fn permanent(self) -> Self {
        self.with_status(ErrorStatus::Permanent)
    }

    /// Name the failing step; a previous name moves to `called`
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            let inner = std::mem::replace(&mut self.operation, operation);
            self.context.push(("called", inner.to_string()));
        } else {
            self.operation = operation;
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Only one source is kept; setting a second
    /// one is a bug and trips a debug assertion.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// Retries ran out: `Temporary` becomes `Persistent`
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

/// One line for logs: `Kind (status) at op, context { k: v } => message`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect();
            write!(f, ", context {{ {} }}", pairs.join(", "))?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

/// Multi-line form for `{:?}` and panics in tests
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;
        if !self.message.is_empty() {
            writeln!(f, "\n    message: {}", self.message)?;
        }
        if !self.context.is_empty() {
            writeln!(f, "\n    context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f, "\n    source: {:?}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::UnexpectedEof => ErrorKind::InputClosed,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

impl Error {
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// The endpoint at `url` did not answer in time
    pub fn transport_timeout(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(ErrorKind::TransportTimeout, format!("request to '{}' timed out", url))
            .with_context("url", url)
    }

    /// Non-success status; `body` is what the endpoint sent back
    pub fn transport_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportRejected, body)
            .with_context("status", status.to_string())
    }

    pub fn response_malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseMalformed, message)
    }

    pub fn toolchain_unavailable(program: impl Into<String>, reason: impl Into<String>) -> Self {
        let program = program.into();
        Self::new(ErrorKind::ToolchainUnavailable, reason)
            .with_context("program", program)
    }

    pub fn sandbox_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SandboxFailed, message)
    }

    pub fn export_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(ErrorKind::ExportFailed, reason)
            .with_context("path", path)
    }
}
