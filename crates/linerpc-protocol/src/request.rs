//! Request envelope types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded request line.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEnvelope {
    /// `rpc.op == "call"`.
    Call(CallRequest),
    /// Any other op. Hosts take no action on these.
    Other {
        /// The op value as it appeared on the wire (non-strings are rendered
        /// as JSON).
        op: String,
    },
}

impl RequestEnvelope {
    /// The op name carried by this envelope.
    pub fn op(&self) -> &str {
        match self {
            Self::Call(_) => crate::ops::CALL,
            Self::Other { op } => op,
        }
    }
}

/// Body of a `call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Case-sensitive name of the procedure to invoke.
    pub procedure: String,
    /// Positional arguments, order preserved.
    pub args: Vec<Value>,
    /// Named arguments.
    pub kwargs: Map<String, Value>,
}

impl CallRequest {
    /// A call with no arguments.
    pub fn new(procedure: impl Into<String>) -> Self {
        Self {
            procedure: procedure.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Replace the positional arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Add one named argument.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }
}
