//! Request dispatcher.
//!
//! Routes a decoded request to the registered procedure and builds the
//! response envelope.

use linerpc_protocol::{CallRequest, RequestEnvelope, ResponseEnvelope};
use tracing::{debug, warn};

use crate::error::{HostError, HostResult};
use crate::procedure::{self, ProcedureError};
use crate::registry::ProcedureRegistry;

/// Dispatch one request.
///
/// Returns `Ok(None)` for ops other than `call`, which get no response.
/// Unknown procedures and handler failures become error envelopes; only a
/// result with no JSON form is returned as an error.
pub fn dispatch(
    registry: &ProcedureRegistry,
    request: RequestEnvelope,
) -> HostResult<Option<ResponseEnvelope>> {
    match request {
        RequestEnvelope::Call(call) => call_procedure(registry, call).map(Some),
        RequestEnvelope::Other { op } => {
            debug!(op = %op, "Ignoring unsupported op");
            Ok(None)
        }
    }
}

fn call_procedure(registry: &ProcedureRegistry, call: CallRequest) -> HostResult<ResponseEnvelope> {
    let CallRequest {
        procedure: name,
        args,
        kwargs,
    } = call;

    let Some(handler) = registry.lookup(&name) else {
        debug!(procedure = %name, "Unknown procedure");
        return Ok(ResponseEnvelope::invalid_procedure(&name));
    };

    debug!(procedure = %name, args = args.len(), kwargs = kwargs.len(), "Invoking procedure");

    match procedure::invoke(handler, args, kwargs) {
        Ok(result) => Ok(ResponseEnvelope::Return(result)),
        Err(ProcedureError::Unrepresentable(source)) => Err(HostError::Unrepresentable {
            procedure: name,
            source,
        }),
        Err(err) => {
            warn!(procedure = %name, error = %err, "Procedure failed");
            Ok(ResponseEnvelope::Error(err.to_string()))
        }
    }
}
