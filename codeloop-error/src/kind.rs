//! Error kinds for codeloop operations

use std::fmt;

/// What went wrong, grouped by the layer that noticed it.
///
/// Match on this to decide what to do; the message is for humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A config file or field failed validation
    ConfigInvalid,

    /// Could not reach the chat endpoint
    NetworkFailed,

    /// The chat endpoint did not answer within the configured timeout
    TransportTimeout,

    /// The chat endpoint answered with a non-success status
    TransportRejected,

    /// The reply body was not valid JSON or lacked the content field
    ResponseMalformed,

    /// Compiler, interpreter or analyzer could not be launched
    ToolchainUnavailable,

    /// Scratch file handling or child supervision failed
    SandboxFailed,

    FileNotFound,
    PermissionDenied,
    /// Any other filesystem or stream failure
    IoFailed,

    /// Writing a report or conversation export failed
    ExportFailed,

    /// Console input reached end of stream
    InputClosed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::TransportTimeout => "TransportTimeout",
            ErrorKind::TransportRejected => "TransportRejected",
            ErrorKind::ResponseMalformed => "ResponseMalformed",

            ErrorKind::ToolchainUnavailable => "ToolchainUnavailable",
            ErrorKind::SandboxFailed => "SandboxFailed",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::ExportFailed => "ExportFailed",
            ErrorKind::InputClosed => "InputClosed",
        }
    }

    /// Kinds that start out `Temporary`
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::NetworkFailed | ErrorKind::TransportTimeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
