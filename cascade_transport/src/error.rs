//! Transport error types.

use thiserror::Error;

/// Marshaling or remote-dispatch failure.
#[derive(Error, Debug)]
pub enum TransportError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// A transporter was handed an object of another value type.
    #[error("type mismatch: transporter for '{expected}' cannot handle this object")]
    TypeMismatch { expected: &'static str },

    #[error("no transporter registered for type '{0}'")]
    UnknownType(String),

    #[error("unknown method '{0}'")]
    UnknownMethod(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
