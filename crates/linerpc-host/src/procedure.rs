//! Procedure handlers.
//!
//! A procedure takes positional and named JSON arguments and returns one
//! JSON value, or fails with a [`ProcedureError`] carrying a kind label and a
//! description. The host reports such failures to the caller as
//! `"<kind>: <description>"` and keeps serving.

use std::any::Any;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Kind label used for handlers that panic.
pub const PANIC_KIND: &str = "Panic";

/// A callable registered under a procedure name.
///
/// Implemented for any `Fn(Vec<Value>, Map<String, Value>) -> Result<Value, ProcedureError>`.
pub trait Procedure: Send + Sync {
    /// Invoke the procedure.
    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, ProcedureError>;
}

impl<F> Procedure for F
where
    F: Fn(Vec<Value>, Map<String, Value>) -> Result<Value, ProcedureError> + Send + Sync,
{
    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
        self(args, kwargs)
    }
}

/// Failure signalled by a procedure.
#[derive(Debug, thiserror::Error)]
pub enum ProcedureError {
    /// The handler failed. Reported to the caller; the host keeps serving.
    #[error("{kind}: {description}")]
    Raised {
        kind: Cow<'static, str>,
        description: String,
    },

    /// The handler produced a result with no JSON form. Fatal for the host.
    #[error("result has no JSON representation: {0}")]
    Unrepresentable(#[source] serde_json::Error),
}

impl ProcedureError {
    /// A failure with an arbitrary kind label.
    pub fn new(kind: impl Into<Cow<'static, str>>, description: impl Into<String>) -> Self {
        Self::Raised {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// `ValueError: <description>`
    pub fn value_error(description: impl Into<String>) -> Self {
        Self::new("ValueError", description)
    }

    /// `TypeError: <description>`
    pub fn type_error(description: impl Into<String>) -> Self {
        Self::new("TypeError", description)
    }

    /// Wrap any error, using its unqualified type name as the kind.
    ///
    /// `"x".parse::<i64>()` fails with `ParseIntError: invalid digit found in string`.
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }

    /// Kind label, if this is a reportable failure.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Raised { kind, .. } => Some(kind.as_ref()),
            Self::Unrepresentable(_) => None,
        }
    }
}

/// Adapter for handlers with typed positional arguments and a typed result.
///
/// The positional arguments are deserialized as one JSON array into `A`, so a
/// tuple such as `(i64, i64)` binds `[2, 3]`. An empty argument list also
/// binds `()`. Named arguments are rejected.
pub(crate) struct TypedProcedure<F, A, R> {
    name: String,
    handler: F,
    _signature: PhantomData<fn(A) -> R>,
}

impl<F, A, R> TypedProcedure<F, A, R> {
    pub(crate) fn new(name: String, handler: F) -> Self {
        Self {
            name,
            handler,
            _signature: PhantomData,
        }
    }
}

impl<F, A, R> Procedure for TypedProcedure<F, A, R>
where
    F: Fn(A) -> Result<R, ProcedureError> + Send + Sync,
    A: DeserializeOwned,
    R: Serialize,
{
    fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
        if let Some(key) = kwargs.keys().next() {
            return Err(ProcedureError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                self.name, key
            )));
        }

        let no_args = args.is_empty();
        let args: A = serde_json::from_value(Value::Array(args))
            .or_else(|e| {
                if no_args {
                    serde_json::from_value(Value::Null).map_err(|_| e)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| ProcedureError::type_error(format!("{}(): {}", self.name, e)))?;

        let result = (self.handler)(args)?;
        serde_json::to_value(result).map_err(ProcedureError::Unrepresentable)
    }
}

/// Invoke `procedure`, converting a panic into a reportable failure.
pub fn invoke(
    procedure: &dyn Procedure,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
) -> Result<Value, ProcedureError> {
    match panic::catch_unwind(AssertUnwindSafe(|| procedure.call(args, kwargs))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(ProcedureError::new(PANIC_KIND, panic_message(payload.as_ref()))),
    }
}

/// `core::num::error::ParseIntError` -> `ParseIntError`
fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "procedure panicked".to_string()
    }
}
