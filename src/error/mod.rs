//! Error types for Colloquy.

use thiserror::Error;

/// Primary error type for all Colloquy operations.
///
/// Variants carry owned detail strings so the error stays `Clone` and can be
/// embedded in [`crate::types::ChatEvent::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The provider adapter could not open a streaming request.
    #[error("streaming object is nil")]
    StreamingUnavailable,

    /// The provider stream stopped because of a transport or parse error.
    #[error("provider stream error: {0}")]
    Stream(String),

    /// `add_message` was called with a sender it does not translate.
    #[error("unsupported sender type")]
    UnsupportedSender,

    #[error("tool id cannot be empty")]
    EmptyToolId,

    #[error("tool with id \"{0}\" already exists")]
    ToolAlreadyExists(String),

    /// JSON-schema derivation failed for a tool handler's input type.
    #[error("schema derivation for tool \"{tool}\" failed: {detail}")]
    SchemaDerivation { tool: String, detail: String },

    /// Cancellation was observed. Never emitted on the outbound stream
    /// (closure signals it); available to adapter implementations.
    #[error("operation cancelled")]
    Cancelled,
}

impl ChatError {
    /// Create a stream error from any displayable cause.
    pub fn stream(detail: impl std::fmt::Display) -> Self {
        Self::Stream(detail.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
