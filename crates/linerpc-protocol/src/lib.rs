//! linerpc Protocol Types
//!
//! Defines the newline-delimited JSON envelope exchanged between a caller and
//! a procedure host, and the codec that turns lines into envelopes and back.
//!
//! One request line in, at most one response line out. There is no
//! correlation id; responses are matched to requests purely by order.

pub mod codec;
pub mod error;
pub mod request;
pub mod response;

pub use codec::{
    decode_request, decode_response, encode_error, encode_op, encode_request, encode_response,
    encode_success,
};
pub use error::{DecodeError, EncodeError};
pub use request::{CallRequest, RequestEnvelope};
pub use response::ResponseEnvelope;

/// Known values of the `rpc.op` field.
pub mod ops {
    /// Caller → host: invoke a procedure.
    pub const CALL: &str = "call";
    /// Host → caller: the procedure returned.
    pub const RETURN: &str = "return";
    /// Host → caller: the call could not be completed.
    pub const ERROR: &str = "error";
}

/// Error-kind label used when the named procedure is not registered.
pub const INVALID_PROCEDURE: &str = "invalid_procedure";

/// Error-kind label used when a malformed line is answered instead of
/// terminating the host.
pub const INVALID_REQUEST: &str = "invalid_request";
