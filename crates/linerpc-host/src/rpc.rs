//! Host RPC loop
//!
//! Reads newline-delimited requests, dispatches each one and writes the
//! response line before reading the next request. The loop ends cleanly when
//! the input is exhausted.
//!
//! Fatal conditions (I/O failure, a malformed line under
//! [`MalformedLinePolicy::Fail`], a result with no JSON form) end the loop
//! with a [`HostError`]. Unknown procedures and handler failures never do.

use std::io::{self, BufRead, Write};

use linerpc_protocol::{self as protocol, DecodeError, ResponseEnvelope, INVALID_REQUEST};
use tracing::{debug, info, trace, warn};

use crate::config::{HostConfig, MalformedLinePolicy};
use crate::dispatcher;
use crate::error::{HostError, HostResult};
use crate::registry::ProcedureRegistry;

/// Procedure host bound to a registry.
#[derive(Debug)]
pub struct RpcHost {
    registry: ProcedureRegistry,
    config: HostConfig,
}

impl RpcHost {
    /// Create a host with the default configuration.
    pub fn new(registry: ProcedureRegistry) -> Self {
        Self::with_config(registry, HostConfig::default())
    }

    /// Create a host with the given configuration.
    pub fn with_config(registry: ProcedureRegistry, config: HostConfig) -> Self {
        Self { registry, config }
    }

    /// Procedures this host serves.
    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Serve on stdin/stdout until stdin is exhausted.
    pub fn run(&self) -> HostResult<()> {
        self.run_with_io(&mut io::stdin().lock(), &mut io::stdout().lock())
    }

    /// Serve on custom I/O (for embedding and testing).
    pub fn run_with_io<R: BufRead, W: Write>(&self, reader: &mut R, writer: &mut W) -> HostResult<()> {
        info!(procedures = self.registry.len(), "Procedure host ready");

        let mut buf = Vec::new();
        let mut line_number: u64 = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                info!(lines = line_number, "Input exhausted, shutting down");
                return Ok(());
            }
            line_number += 1;

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    trace!(line = line_number, content = %line.trim_end(), "Received line");
                    self.handle_line(line, line_number)?
                }
                Err(e) => Some(self.reject_line(DecodeError::InvalidUtf8(e), line_number)?),
            };

            if let Some(response) = response {
                write_response(writer, &response)?;
            }
        }
    }

    /// Handle one input line, returning the response to emit, if any.
    pub fn handle_line(&self, line: &str, line_number: u64) -> HostResult<Option<ResponseEnvelope>> {
        if self.config.skip_blank_lines && line.trim().is_empty() {
            return Ok(None);
        }

        match protocol::decode_request(line) {
            Ok(request) => dispatcher::dispatch(&self.registry, request),
            Err(source) => self.reject_line(source, line_number).map(Some),
        }
    }

    /// Apply the malformed-line policy to a line that could not be decoded.
    fn reject_line(&self, source: DecodeError, line_number: u64) -> HostResult<ResponseEnvelope> {
        match self.config.malformed_lines {
            MalformedLinePolicy::Fail => Err(HostError::Decode {
                line: line_number,
                source,
            }),
            MalformedLinePolicy::Reply => {
                warn!(line = line_number, error = %source, "Answering malformed request");
                Ok(ResponseEnvelope::error(INVALID_REQUEST, source))
            }
        }
    }
}

/// Write one response line and flush it.
fn write_response<W: Write>(writer: &mut W, response: &ResponseEnvelope) -> HostResult<()> {
    let line = protocol::encode_response(response)?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    debug!(ok = response.is_return(), "Response sent");
    Ok(())
}
