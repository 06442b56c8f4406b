//! Application-level failures carried inside replies
//!
//! These are not bridge errors: they originate in workflow or activity code
//! (or in the engine) on one side of the boundary and must reach the waiting
//! caller on the other side unchanged.

use serde::{Deserialize, Serialize};

/// Classification of an application failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationErrorKind {
    /// User-defined failure raised by workflow or activity code
    Custom,
    /// The execution was cancelled
    Cancelled,
    /// Unclassified failure
    Generic,
    /// The executing code panicked
    Panic,
    /// The execution was terminated externally
    Terminated,
    /// The execution exceeded one of its timeouts
    Timeout,
}

/// Structured failure payload transported as JSON in the `Error` property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationError {
    pub message: String,
    pub kind: ApplicationErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApplicationError {
    pub fn new(kind: ApplicationErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            details: None,
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(ApplicationErrorKind::Custom, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ApplicationErrorKind::Generic, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ApplicationErrorKind::Cancelled, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApplicationError {}
