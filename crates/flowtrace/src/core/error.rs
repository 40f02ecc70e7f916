//! Core error types for flow reconstruction
//!
//! Only failures that make a run meaningless are errors: unreadable input,
//! invalid JSON, or a model that violates the structural preconditions.
//! Everything the extractor can recover from is a [`Diagnostic`](super::Diagnostic).

use thiserror::Error;

/// Fatal errors raised while loading a model or producing output
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Invalid JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Unknown message type: {name}")]
    UnknownMessage { name: String },

    #[error("Type {name} is neither an event nor a command")]
    NotAMessage { name: String },

    #[error("Render error: {message}")]
    RenderError { message: String },
}

impl FlowError {
    /// Create a new malformed-input error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create a new unknown-message error
    pub fn unknown_message(name: impl Into<String>) -> Self {
        Self::UnknownMessage { name: name.into() }
    }

    /// Create a new not-a-message error
    pub fn not_a_message(name: impl Into<String>) -> Self {
        Self::NotAMessage { name: name.into() }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }
}
