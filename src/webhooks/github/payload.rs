//! Tolerant access to raw GitHub payloads.
//!
//! GitHub payloads are large and vary between event types and API versions, so instead of
//! deserializing them into strict structs we only pick the few fields we need, falling back to
//! a default whenever something along the way is missing.

use serde_json::Value;

use crate::webhooks::PayloadError;

/// Parses a delivery body. Empty documents (nothing at all, or a falsy value such as `null`,
/// `{}`, `[]`, `false`, `0` or `""`) are reported as missing rather than invalid.
pub fn parse(body: &[u8]) -> Result<Value, PayloadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PayloadError::Missing);
    }

    let payload: Value = serde_json::from_slice(body).map_err(PayloadError::InvalidJson)?;
    if is_empty(&payload) {
        return Err(PayloadError::Missing);
    }
    match payload {
        Value::Object(_) => Ok(payload),
        _ => Err(PayloadError::NotAnObject),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Follows `path` through nested objects.
///
/// Returns `None` as soon as a key is absent or the current value isn't an object. An explicit
/// `null` counts as absent.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
        .filter(|found| !found.is_null())
}

/// Like [`lookup`], rendering the value as text: strings as-is, anything else as its JSON form
/// (so a numeric id `42` becomes `"42"`).
pub fn text(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path).map(|found| match found {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub fn text_or(value: &Value, path: &[&str], default: &str) -> String {
    text(value, path).unwrap_or_else(|| default.to_owned())
}

/// `true` only if the value at `path` is the JSON boolean `true`.
pub fn flag(value: &Value, path: &[&str]) -> bool {
    lookup(value, path)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
