//! Error taxonomy for the prompt dispatch pipeline.

use thiserror::Error;

/// Errors that end the current prompt.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The matcher answer could not be unwrapped or parsed.
    #[error("malformed matcher response: {0}")]
    MalformedResponse(String),

    /// No alias matched and the backend rejected the operation.
    #[error("unknown function '{operation}': {message}")]
    UnknownFunction { operation: String, message: String },

    /// Transport failure or timeout talking to a collaborator.
    #[error("{target} unavailable: {message}")]
    BackendUnavailable { target: String, message: String },

    /// The collaborator ran but answered with an explicit error.
    #[error("error from {operation}: {message}")]
    BackendError { operation: String, message: String },

    /// The matcher found nothing in the catalog for the prompt.
    #[error("no matching function for this request")]
    NoMatch,
}

impl DispatchError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn unknown_function(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnknownFunction {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Stable identifier used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedResponse(_) => "malformed_response",
            Self::UnknownFunction { .. } => "unknown_function",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::BackendError { .. } => "backend_error",
            Self::NoMatch => "no_match",
        }
    }
}
