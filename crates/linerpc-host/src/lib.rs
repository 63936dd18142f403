//! linerpc Procedure Host
//!
//! The host side of the protocol: a registry mapping procedure names to
//! handlers, and a dispatch loop that reads request lines, invokes the named
//! handler and writes one response line per call.
//!
//! The registry ships empty. Embedding applications register their
//! procedures, hand the registry to an [`RpcHost`] and run it over any
//! `BufRead`/`Write` pair (stdin/stdout in production, in-memory buffers in
//! tests).

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod procedure;
pub mod registry;
pub mod rpc;

pub use config::{HostConfig, MalformedLinePolicy};
pub use error::HostError;
pub use procedure::{Procedure, ProcedureError};
pub use registry::ProcedureRegistry;
pub use rpc::RpcHost;
