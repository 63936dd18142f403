//! Demo procedures served by `linerpc serve`.

use linerpc_host::{ProcedureError, ProcedureRegistry};
use serde_json::{Map, Number, Value};

/// Registry with the demo procedures:
///
/// - `echo(*args)` returns its positional arguments as an array
/// - `add(a, b)` adds two numbers (integers stay integers)
/// - `divide(a, b)` divides two numbers
/// - `concat(*parts, sep="")` joins strings
/// - `greet(name, greeting="Hello")`
/// - `parse_int(text)` parses a decimal integer
/// - `fail(kind, message)` fails with the given kind and message
pub fn demo_registry() -> ProcedureRegistry {
    let mut registry = ProcedureRegistry::new();
    registry.register("echo", echo);
    registry.register("add", add);
    registry.register_fn("divide", divide);
    registry.register("concat", concat);
    registry.register("greet", greet);
    registry.register_fn("parse_int", parse_int);
    registry.register_fn("fail", fail);
    registry
}

fn echo(args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
    reject_kwargs("echo", &kwargs)?;
    Ok(Value::Array(args))
}

fn add(args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
    reject_kwargs("add", &kwargs)?;
    let [a, b] = positional::<2>("add", args)?;

    if let (Some(x), Some(y)) = (as_integer(&a), as_integer(&b)) {
        let sum = x + y;
        return i64::try_from(sum)
            .map(Value::from)
            .or_else(|_| u64::try_from(sum).map(Value::from))
            .map_err(|_| ProcedureError::new("OverflowError", "integer addition overflowed"));
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Number::from_f64(x + y)
            .map(Value::Number)
            .ok_or_else(|| ProcedureError::new("OverflowError", "result is not a finite number")),
        _ => Err(ProcedureError::type_error(format!(
            "unsupported operand type(s) for +: '{}' and '{}'",
            type_name(&a),
            type_name(&b)
        ))),
    }
}

fn divide((a, b): (f64, f64)) -> Result<f64, ProcedureError> {
    if b == 0.0 {
        return Err(ProcedureError::new("ZeroDivisionError", "division by zero"));
    }
    Ok(a / b)
}

fn concat(args: Vec<Value>, mut kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
    let sep = match kwargs.remove("sep") {
        None => String::new(),
        Some(Value::String(sep)) => sep,
        Some(other) => {
            return Err(ProcedureError::type_error(format!(
                "sep must be str, not {}",
                type_name(&other)
            )))
        }
    };
    reject_kwargs("concat", &kwargs)?;

    let parts = args
        .iter()
        .map(|part| {
            part.as_str().ok_or_else(|| {
                ProcedureError::type_error(format!("expected str instance, {} found", type_name(part)))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::String(parts.join(&sep)))
}

fn greet(args: Vec<Value>, mut kwargs: Map<String, Value>) -> Result<Value, ProcedureError> {
    if args.len() > 2 {
        return Err(ProcedureError::type_error(format!(
            "greet() takes from 1 to 2 positional arguments but {} were given",
            args.len()
        )));
    }
    let mut args = args.into_iter();
    let name = bind_argument("greet", "name", args.next(), &mut kwargs)?;
    let greeting = bind_argument("greet", "greeting", args.next(), &mut kwargs)?
        .unwrap_or_else(|| Value::from("Hello"));
    let name = name.ok_or_else(|| {
        ProcedureError::type_error("greet() missing 1 required positional argument: 'name'")
    })?;
    reject_kwargs("greet", &kwargs)?;

    match (name.as_str(), greeting.as_str()) {
        (Some(name), Some(greeting)) => Ok(Value::String(format!("{}, {}!", greeting, name))),
        _ => Err(ProcedureError::type_error("greet() arguments must be strings")),
    }
}

fn parse_int((text,): (String,)) -> Result<i64, ProcedureError> {
    text.trim().parse::<i64>().map_err(|e| ProcedureError::from_error(&e))
}

fn fail((kind, message): (String, String)) -> Result<Value, ProcedureError> {
    Err(ProcedureError::new(kind, message))
}

fn positional<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], ProcedureError> {
    let given = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        ProcedureError::type_error(format!(
            "{}() takes {} positional arguments but {} were given",
            name, N, given
        ))
    })
}

/// Take parameter `param` from its positional slot or from `kwargs`, not both.
fn bind_argument(
    name: &str,
    param: &str,
    positional: Option<Value>,
    kwargs: &mut Map<String, Value>,
) -> Result<Option<Value>, ProcedureError> {
    match (positional, kwargs.remove(param)) {
        (Some(_), Some(_)) => Err(ProcedureError::type_error(format!(
            "{}() got multiple values for argument '{}'",
            name, param
        ))),
        (value, None) | (None, value) => Ok(value),
    }
}

fn reject_kwargs(name: &str, kwargs: &Map<String, Value>) -> Result<(), ProcedureError> {
    match kwargs.keys().next() {
        Some(key) => Err(ProcedureError::type_error(format!(
            "{}() got an unexpected keyword argument '{}'",
            name, key
        ))),
        None => Ok(()),
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
