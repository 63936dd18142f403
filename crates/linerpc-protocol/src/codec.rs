//! Line codec.
//!
//! Wire schema (key names and nesting are the compatibility contract):
//!
//! ```text
//! request:  {"rpc": {"op": "call"}, "procedure": "<name>", "args": [...], "kwargs": {...}}
//! success:  {"rpc": {"op": "return"}, "result": <value>}
//! error:    {"rpc": {"op": "error"}, "message": "<text>"}
//! ```
//!
//! Every encoded line ends with exactly one `\n`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::ops;
use crate::request::{CallRequest, RequestEnvelope};
use crate::response::ResponseEnvelope;

#[derive(Serialize)]
struct Rpc<'a> {
    op: &'a str,
}

#[derive(Serialize)]
struct ReturnLine<'a, T: ?Sized> {
    rpc: Rpc<'a>,
    result: &'a T,
}

#[derive(Serialize)]
struct ErrorLine<'a> {
    rpc: Rpc<'a>,
    message: &'a str,
}

#[derive(Serialize)]
struct CallLine<'a> {
    rpc: Rpc<'a>,
    procedure: &'a str,
    args: &'a [Value],
    kwargs: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct OpLine<'a> {
    rpc: Rpc<'a>,
}

fn finish_line(mut line: String) -> String {
    line.push('\n');
    line
}

/// Decode one input line into a request envelope.
///
/// `rpc.op` is always required. `procedure`, `args` and `kwargs` are only
/// required (and type-checked) when the op is `call`. Unknown keys are
/// ignored.
pub fn decode_request(line: &str) -> Result<RequestEnvelope, DecodeError> {
    let mut root = parse_object(line)?;
    let op = take_op(&root)?;

    if op.as_str() != Some(ops::CALL) {
        return Ok(RequestEnvelope::Other { op: op_label(&op) });
    }

    let procedure: String = take_field(&mut root, "procedure")?;
    let args: Vec<Value> = take_field(&mut root, "args")?;
    let kwargs: Map<String, Value> = take_field(&mut root, "kwargs")?;

    Ok(RequestEnvelope::Call(CallRequest {
        procedure,
        args,
        kwargs,
    }))
}

/// Decode one response line, as read by a caller.
pub fn decode_response(line: &str) -> Result<ResponseEnvelope, DecodeError> {
    let mut root = parse_object(line)?;
    let op = take_op(&root)?;

    match op.as_str() {
        Some(ops::RETURN) => {
            let result: Value = take_field(&mut root, "result")?;
            Ok(ResponseEnvelope::Return(result))
        }
        Some(ops::ERROR) => {
            let message: String = take_field(&mut root, "message")?;
            Ok(ResponseEnvelope::Error(message))
        }
        _ => Err(DecodeError::UnexpectedOp(op_label(&op))),
    }
}

/// Encode a success envelope carrying `result`.
///
/// Fails only when `result` has no JSON representation.
pub fn encode_success<T: Serialize + ?Sized>(result: &T) -> Result<String, EncodeError> {
    let line = serde_json::to_string(&ReturnLine {
        rpc: Rpc { op: ops::RETURN },
        result,
    })?;
    Ok(finish_line(line))
}

/// Encode an error envelope carrying `message`.
pub fn encode_error(message: &str) -> Result<String, EncodeError> {
    let line = serde_json::to_string(&ErrorLine {
        rpc: Rpc { op: ops::ERROR },
        message,
    })?;
    Ok(finish_line(line))
}

/// Encode either kind of response envelope.
pub fn encode_response(response: &ResponseEnvelope) -> Result<String, EncodeError> {
    match response {
        ResponseEnvelope::Return(result) => encode_success(result),
        ResponseEnvelope::Error(message) => encode_error(message),
    }
}

/// Encode a `call` request line.
pub fn encode_request(request: &CallRequest) -> Result<String, EncodeError> {
    let line = serde_json::to_string(&CallLine {
        rpc: Rpc { op: ops::CALL },
        procedure: &request.procedure,
        args: &request.args,
        kwargs: &request.kwargs,
    })?;
    Ok(finish_line(line))
}

/// Encode a bare `{"rpc":{"op":…}}` line for ops other than `call`.
pub fn encode_op(op: &str) -> Result<String, EncodeError> {
    let line = serde_json::to_string(&OpLine { rpc: Rpc { op } })?;
    Ok(finish_line(line))
}

fn parse_object(line: &str) -> Result<Map<String, Value>, DecodeError> {
    match serde_json::from_str(line).map_err(DecodeError::InvalidJson)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

fn take_op(root: &Map<String, Value>) -> Result<Value, DecodeError> {
    root.get("rpc")
        .ok_or(DecodeError::MissingField { field: "rpc" })?
        .get("op")
        .cloned()
        .ok_or(DecodeError::MissingField { field: "rpc.op" })
}

fn take_field<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    field: &'static str,
) -> Result<T, DecodeError> {
    let value = root
        .remove(field)
        .ok_or(DecodeError::MissingField { field })?;
    serde_json::from_value(value).map_err(|source| DecodeError::InvalidField { field, source })
}

fn op_label(op: &Value) -> String {
    match op {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_call() {
        let line = r#"{"rpc":{"op":"call"},"procedure":"echo","args":[1,2],"kwargs":{"x":true}}"#;
        let request = decode_request(line).unwrap();

        let RequestEnvelope::Call(call) = request else {
            panic!("expected a call envelope");
        };
        assert_eq!(call.procedure, "echo");
        assert_eq!(call.args, vec![json!(1), json!(2)]);
        assert_eq!(call.kwargs.get("x"), Some(&json!(true)));
    }

    #[test]
    fn test_decode_accepts_trailing_newline_and_extra_keys() {
        let line = "{\"rpc\":{\"op\":\"call\",\"v\":1},\"procedure\":\"p\",\"args\":[],\"kwargs\":{},\"id\":7}\n";
        let request = decode_request(line).unwrap();
        assert_eq!(request, RequestEnvelope::Call(CallRequest::new("p")));
    }

    #[test]
    fn test_decode_other_op_skips_call_fields() {
        let request = decode_request(r#"{"rpc":{"op":"ping"}}"#).unwrap();
        assert_eq!(request, RequestEnvelope::Other { op: "ping".to_string() });
        assert_eq!(request.op(), "ping");
    }

    #[test]
    fn test_decode_non_string_op_is_other() {
        let request = decode_request(r#"{"rpc":{"op":5},"procedure":"x"}"#).unwrap();
        assert_eq!(request, RequestEnvelope::Other { op: "5".to_string() });
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_request("not json").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
        assert!(err.field().is_none());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode_request("[1,2,3]").unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[test]
    fn test_decode_missing_rpc_and_op() {
        let err = decode_request(r#"{"procedure":"x","args":[],"kwargs":{}}"#).unwrap_err();
        assert_eq!(err.field(), Some("rpc"));

        let err = decode_request(r#"{"rpc":{},"procedure":"x","args":[],"kwargs":{}}"#).unwrap_err();
        assert_eq!(err.field(), Some("rpc.op"));
    }

    #[test]
    fn test_decode_call_requires_every_field() {
        let err = decode_request(r#"{"rpc":{"op":"call"},"args":[],"kwargs":{}}"#).unwrap_err();
        assert_eq!(err.field(), Some("procedure"));

        let err = decode_request(r#"{"rpc":{"op":"call"},"procedure":"x","kwargs":{}}"#).unwrap_err();
        assert_eq!(err.field(), Some("args"));

        let err = decode_request(r#"{"rpc":{"op":"call"},"procedure":"x","args":[]}"#).unwrap_err();
        assert_eq!(err.field(), Some("kwargs"));
    }

    #[test]
    fn test_decode_call_field_types() {
        let err = decode_request(r#"{"rpc":{"op":"call"},"procedure":1,"args":[],"kwargs":{}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "procedure", .. }));

        let err = decode_request(r#"{"rpc":{"op":"call"},"procedure":"x","args":{},"kwargs":{}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "args", .. }));

        let err = decode_request(r#"{"rpc":{"op":"call"},"procedure":"x","args":[],"kwargs":[]}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "kwargs", .. }));
    }

    #[test]
    fn test_encode_success_wire_format() {
        assert_eq!(
            encode_success(&json!([1, 2])).unwrap(),
            "{\"rpc\":{\"op\":\"return\"},\"result\":[1,2]}\n"
        );
        assert_eq!(
            encode_success(&5).unwrap(),
            "{\"rpc\":{\"op\":\"return\"},\"result\":5}\n"
        );
    }

    #[test]
    fn test_encode_error_wire_format() {
        assert_eq!(
            encode_error("invalid_procedure: X").unwrap(),
            "{\"rpc\":{\"op\":\"error\"},\"message\":\"invalid_procedure: X\"}\n"
        );
    }

    #[test]
    fn test_encoded_lines_stay_single_line() {
        let line = encode_error("first\nsecond").unwrap();
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_encode_success_unrepresentable() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys have no JSON form");
        assert!(encode_success(&map).is_err());
    }

    #[test]
    fn test_encode_request_wire_format() {
        let request = CallRequest::new("add").with_args([json!(2), json!(3)]);
        assert_eq!(
            encode_request(&request).unwrap(),
            "{\"rpc\":{\"op\":\"call\"},\"procedure\":\"add\",\"args\":[2,3],\"kwargs\":{}}\n"
        );
        assert_eq!(encode_op("ping").unwrap(), "{\"rpc\":{\"op\":\"ping\"}}\n");
    }

    #[test]
    fn test_decode_response() {
        let ok = decode_response(r#"{"rpc":{"op":"return"},"result":5}"#).unwrap();
        assert_eq!(ok, ResponseEnvelope::Return(json!(5)));

        let err = decode_response(r#"{"rpc":{"op":"error"},"message":"ValueError: bad input"}"#)
            .unwrap();
        assert_eq!(err.into_result(), Err("ValueError: bad input".to_string()));

        let null_result = decode_response(r#"{"rpc":{"op":"return"},"result":null}"#).unwrap();
        assert_eq!(null_result, ResponseEnvelope::Return(Value::Null));

        let unexpected = decode_response(r#"{"rpc":{"op":"call"}}"#).unwrap_err();
        assert!(matches!(unexpected, DecodeError::UnexpectedOp(op) if op == "call"));
    }

    #[test]
    fn test_response_envelope_helpers() {
        let response = ResponseEnvelope::invalid_procedure("missing");
        assert!(!response.is_return());
        assert_eq!(
            encode_response(&response).unwrap(),
            "{\"rpc\":{\"op\":\"error\"},\"message\":\"invalid_procedure: missing\"}\n"
        );
    }
}
