//! Error types for the line codec.

/// A line could not be decoded into an envelope.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid value for '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response op '{0}'")]
    UnexpectedOp(String),
}

impl DecodeError {
    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// An envelope could not be serialized.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize envelope: {0}")]
    Json(#[from] serde_json::Error),
}
