//! Response envelope types.

use serde_json::Value;

/// A response line emitted by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEnvelope {
    /// `{"rpc":{"op":"return"},"result":…}`
    Return(Value),
    /// `{"rpc":{"op":"error"},"message":"<kind>: <description>"}`
    Error(String),
}

impl ResponseEnvelope {
    /// Error envelope built from a kind label and a description.
    pub fn error(kind: &str, description: impl std::fmt::Display) -> Self {
        Self::Error(format!("{}: {}", kind, description))
    }

    /// Error envelope for a procedure name that is not registered.
    pub fn invalid_procedure(name: &str) -> Self {
        Self::error(crate::INVALID_PROCEDURE, name)
    }

    /// Whether this is a success envelope.
    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return(_))
    }

    /// Convert into the returned value, or the error message.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Self::Return(value) => Ok(value),
            Self::Error(message) => Err(message),
        }
    }
}
