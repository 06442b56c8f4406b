//! Error types for the bridge SDK

use std::time::Duration;

// Re-export core error types
pub use bridge_core::{ApplicationError, CoreError};

use bridge_core::MessageType;

/// Registry an id failed to resolve in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Operation,
    WorkflowContext,
    ActivityContext,
    Worker,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Operation => "operation",
            Self::WorkflowContext => "workflow context",
            Self::ActivityContext => "activity context",
            Self::Worker => "worker",
        };
        f.write_str(name)
    }
}

/// Main error type for the bridge SDK
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// Envelope or message could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A known message type arrived that this side does not handle
    #[error("Unhandled message type: {0}")]
    UnhandledMessage(MessageType),

    /// A reply carried a live request id but is not the reply its request expects
    #[error("Request {request_id} expects {expected}, got {actual}")]
    UnexpectedReply {
        request_id: i64,
        expected: MessageType,
        actual: MessageType,
    },

    /// A reply or request referenced an id that is not registered
    #[error("Entity does not exist: {entity} {id}")]
    EntityNotExist { entity: Entity, id: i64 },

    /// A context id is already live in its registry
    #[error("Duplicate {entity} {id}")]
    DuplicateContext { entity: Entity, id: i64 },

    /// A request id was registered twice
    #[error("Duplicate request id: {0}")]
    DuplicateRequest(i64),

    /// The counterpart reported an application failure
    #[error("Application error: {0}")]
    Application(ApplicationError),

    /// No reply arrived in time
    #[error("Request {request_id} timed out after {after:?}")]
    Timeout { request_id: i64, after: Duration },

    /// The completion slot was dropped without being resolved
    #[error("Request {request_id} was cancelled")]
    Cancelled { request_id: i64 },

    /// Sending an envelope failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The bridge is shutting down
    #[error("Bridge is shutting down")]
    ShuttingDown,
}

impl From<CoreError> for BridgeError {
    fn from(err: CoreError) -> Self {
        BridgeError::Protocol(err.to_string())
    }
}

impl From<ApplicationError> for BridgeError {
    fn from(err: ApplicationError) -> Self {
        BridgeError::Application(err)
    }
}

impl BridgeError {
    pub fn not_exist(entity: Entity, id: i64) -> Self {
        BridgeError::EntityNotExist { entity, id }
    }

    /// Unknown, malformed or unhandled message
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            BridgeError::Protocol(_)
                | BridgeError::UnhandledMessage(_)
                | BridgeError::UnexpectedReply { .. }
        )
    }

    /// Id did not resolve to a live entry
    pub fn is_correlation(&self) -> bool {
        matches!(self, BridgeError::EntityNotExist { .. })
    }

    /// Failure payload to send back across the boundary for this error
    pub fn to_application_error(&self) -> ApplicationError {
        match self {
            BridgeError::Application(err) => err.clone(),
            BridgeError::Timeout { .. } => ApplicationError::new(
                bridge_core::ApplicationErrorKind::Timeout,
                self.to_string(),
            ),
            BridgeError::Cancelled { .. } | BridgeError::ShuttingDown => {
                ApplicationError::cancelled(self.to_string())
            }
            _ => ApplicationError::generic(self.to_string()),
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
