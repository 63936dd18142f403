//! Caller side of the protocol.
//!
//! - `Caller`: drives any `BufRead`/`Write` pair, one request line out, one
//!   response line back
//! - `HostProcess`: spawns a host as a child process and wires a `Caller` to
//!   its stdin/stdout

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use linerpc_protocol::{self as protocol, CallRequest, DecodeError, EncodeError, ResponseEnvelope};
use serde_json::{Map, Value};
use tracing::debug;

/// Caller-side errors.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("failed to spawn host '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("malformed response: {0}")]
    Decode(#[from] DecodeError),

    #[error("host closed its output before replying")]
    Closed,

    #[error("remote error: {message}")]
    Remote { message: String },
}

impl CallError {
    /// Kind label of a remote error (`"ValueError"` for
    /// `"ValueError: bad input"`).
    pub fn remote_kind(&self) -> Option<&str> {
        match self {
            Self::Remote { message } => message.split_once(": ").map(|(kind, _)| kind),
            _ => None,
        }
    }
}

pub type CallResult<T> = Result<T, CallError>;

/// Issues calls over a line-delimited stream pair.
pub struct Caller<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Caller<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Send one call and wait for its response.
    pub fn call(&mut self, request: &CallRequest) -> CallResult<Value> {
        let line = protocol::encode_request(request)?;
        self.send_line(&line)?;
        debug!(procedure = %request.procedure, "Call sent");

        self.read_response()?
            .into_result()
            .map_err(|message| CallError::Remote { message })
    }

    /// Convenience wrapper around [`Caller::call`].
    pub fn call_with(
        &mut self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> CallResult<Value> {
        self.call(&CallRequest {
            procedure: procedure.to_string(),
            args,
            kwargs,
        })
    }

    /// Send a bare op line. Hosts do not answer ops other than `call`, so
    /// nothing is read back.
    pub fn send_op(&mut self, op: &str) -> CallResult<()> {
        let line = protocol::encode_op(op)?;
        self.send_line(&line)
    }

    /// Split back into the underlying reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn send_line(&mut self, line: &str) -> CallResult<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> CallResult<ResponseEnvelope> {
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Err(CallError::Closed);
        }
        let line = std::str::from_utf8(&buf).map_err(DecodeError::InvalidUtf8)?;
        Ok(protocol::decode_response(line)?)
    }
}

/// Program and arguments used to start a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build from `[program, args...]`. Returns `None` for an empty slice.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// A host running as a child process.
pub struct HostProcess {
    child: Child,
    caller: Caller<BufReader<ChildStdout>, ChildStdin>,
}

impl HostProcess {
    /// Spawn the host with piped stdin/stdout. Its stderr is inherited so
    /// host logs stay visible.
    pub fn spawn(command: &HostCommand) -> CallResult<Self> {
        let spawn_error = |source| CallError::Spawn {
            program: command.program.clone(),
            source,
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error(io::Error::new(io::ErrorKind::BrokenPipe, "stdin not captured")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured")))?;

        debug!(program = %command.program, pid = child.id(), "Host spawned");

        Ok(Self {
            child,
            caller: Caller::new(BufReader::new(stdout), stdin),
        })
    }

    pub fn caller(&mut self) -> &mut Caller<BufReader<ChildStdout>, ChildStdin> {
        &mut self.caller
    }

    /// Close the host's input and wait for it to exit.
    pub fn shutdown(self) -> CallResult<ExitStatus> {
        let Self { mut child, caller } = self;
        drop(caller);
        Ok(child.wait()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn caller_with_replies(replies: &str) -> Caller<Cursor<Vec<u8>>, Vec<u8>> {
        Caller::new(Cursor::new(replies.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_call_writes_request_and_reads_result() {
        let mut caller = caller_with_replies("{\"rpc\":{\"op\":\"return\"},\"result\":5}\n");

        let request = CallRequest::new("add").with_args([json!(2), json!(3)]);
        assert_eq!(caller.call(&request).unwrap(), json!(5));

        let (_, written) = caller.into_inner();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "{\"rpc\":{\"op\":\"call\"},\"procedure\":\"add\",\"args\":[2,3],\"kwargs\":{}}\n"
        );
    }

    #[test]
    fn test_remote_error() {
        let mut caller =
            caller_with_replies("{\"rpc\":{\"op\":\"error\"},\"message\":\"ValueError: bad input\"}\n");

        let err = caller.call_with("check", Vec::new(), Map::new()).unwrap_err();
        assert!(matches!(err, CallError::Remote { ref message } if message == "ValueError: bad input"));
        assert_eq!(err.remote_kind(), Some("ValueError"));
    }

    #[test]
    fn test_closed_stream() {
        let mut caller = caller_with_replies("");
        let err = caller.call(&CallRequest::new("echo")).unwrap_err();
        assert!(matches!(err, CallError::Closed));
        assert_eq!(err.remote_kind(), None);
    }

    #[test]
    fn test_malformed_reply() {
        let mut caller = caller_with_replies("{\"rpc\":{\"op\":\"return\"}}\n");
        let err = caller.call(&CallRequest::new("echo")).unwrap_err();
        assert!(matches!(err, CallError::Decode(DecodeError::MissingField { field: "result" })));
    }

    #[test]
    fn test_reply_not_utf8() {
        let mut caller = Caller::new(Cursor::new(b"\xff\xfe\n".to_vec()), Vec::new());
        let err = caller.call(&CallRequest::new("echo")).unwrap_err();
        assert!(matches!(err, CallError::Decode(DecodeError::InvalidUtf8(_))));
    }

    #[test]
    fn test_send_op_reads_nothing() {
        let mut caller = caller_with_replies("{\"rpc\":{\"op\":\"return\"},\"result\":1}\n");
        caller.send_op("ping").unwrap();
        assert_eq!(caller.call(&CallRequest::new("one")).unwrap(), json!(1));

        let (_, written) = caller.into_inner();
        let written = String::from_utf8(written).unwrap();
        assert!(written.starts_with("{\"rpc\":{\"op\":\"ping\"}}\n"));
    }

    #[test]
    fn test_host_command_from_argv() {
        assert_eq!(HostCommand::from_argv(&[]), None);

        let argv = vec!["linerpc".to_string(), "serve".to_string()];
        assert_eq!(
            HostCommand::from_argv(&argv),
            Some(HostCommand::new("linerpc").arg("serve"))
        );
    }

    #[test]
    fn test_spawn_missing_program() {
        let err = HostProcess::spawn(&HostCommand::new("/nonexistent/linerpc-host")).err().unwrap();
        assert!(matches!(err, CallError::Spawn { .. }));
    }
}
