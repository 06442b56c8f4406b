//! Core error types for the workflow proxy bridge
//!
//! These errors cover everything that can go wrong while turning bytes into
//! envelopes and envelopes into typed messages. Runtime errors (correlation,
//! timeouts, transport) live in the SDK crate and wrap these.

use crate::message::MessageType;

/// Core error type for envelope and message decoding
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The byte frame could not be decoded into an envelope
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The type discriminator does not name any known message
    #[error("Unknown message type: {0}")]
    UnknownMessageType(i32),

    /// The envelope was decoded as the wrong message variant
    #[error("Message type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: MessageType,
        actual: MessageType,
    },

    /// A property is present but cannot be parsed as the requested type
    #[error("Invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    /// JSON substructure serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid_property(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
