//! linerpc - line-delimited JSON-RPC
//!
//! A caller writes one JSON request per line to a procedure host; the host
//! answers each `call` with exactly one JSON line, in order. This crate ties
//! the protocol and host crates together and adds the caller side, the CLI
//! configuration file and a small set of demo procedures.

pub mod client;
pub mod config;
pub mod demo;

pub use client::{CallError, Caller, HostCommand, HostProcess};
pub use config::{CliConfig, ConfigError};
pub use linerpc_host::{
    HostConfig, HostError, MalformedLinePolicy, Procedure, ProcedureError, ProcedureRegistry,
    RpcHost,
};
pub use linerpc_protocol::{CallRequest, DecodeError, EncodeError, RequestEnvelope, ResponseEnvelope};
